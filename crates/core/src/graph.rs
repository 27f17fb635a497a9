//! Curriculum graph - validated, immutable view of one degree program.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};
use crate::course::{Course, Prerequisite, PrerequisiteKind};
use crate::error::{CurriculumError, IntegrityError, Result};
use crate::id::{CourseId, SemesterTier};

/// Courses and prerequisite edges of one program.
///
/// Built only through [`CurriculumGraph::load`], so every instance has
/// resolved references, tier-ordered edges and no cycles. The default value
/// is the empty curriculum.
#[derive(Debug, Clone, Default)]
pub struct CurriculumGraph {
    /// Courses in declaration order
    courses: Vec<Course>,
    /// id -> position in `courses`
    index: HashMap<CourseId, usize>,
    /// position -> positions of courses that list it as a prerequisite
    dependents: Vec<Vec<usize>>,
}

impl CurriculumGraph {
    /// Validate a snapshot and build the graph.
    ///
    /// Fails with [`CurriculumError::EmptyCurriculum`] for zero courses and
    /// with [`CurriculumError::Integrity`] for blank or duplicate ids,
    /// zero-credit courses, unresolved or self references, edges that break
    /// tier ordering, cycles, and ordinary courses that depend on a
    /// whole-program course.
    pub fn load(courses: Vec<Course>) -> Result<Self> {
        if courses.is_empty() {
            warn!("curriculum snapshot has no courses");
            return Err(CurriculumError::EmptyCurriculum);
        }

        let graph = Self::build(courses).map_err(|err| {
            warn!(error = %err, "curriculum snapshot rejected");
            CurriculumError::Integrity(err)
        })?;

        debug!(
            courses = graph.len(),
            tiers = graph.tiers().len(),
            credits = graph.total_credits(),
            "curriculum loaded"
        );
        Ok(graph)
    }

    fn build(courses: Vec<Course>) -> std::result::Result<Self, IntegrityError> {
        let mut index = HashMap::with_capacity(courses.len());
        {
            let mut codes = HashSet::with_capacity(courses.len());
            for (pos, course) in courses.iter().enumerate() {
                if course.id.is_empty() {
                    return Err(IntegrityError::BlankId { code: course.code.clone() });
                }
                if index.insert(course.id.clone(), pos).is_some() {
                    return Err(IntegrityError::DuplicateCourse(course.id.clone()));
                }
                if !codes.insert(course.code.as_str()) {
                    return Err(IntegrityError::DuplicateCode(course.code.clone()));
                }
                if course.credits == 0 {
                    return Err(IntegrityError::InvalidCredits(course.id.clone()));
                }
            }
        }

        let mut dependents = vec![Vec::new(); courses.len()];
        for (pos, course) in courses.iter().enumerate() {
            for (prereq_id, kind) in course.course_prerequisites() {
                if prereq_id == &course.id {
                    return Err(IntegrityError::SelfPrerequisite(course.id.clone()));
                }
                let Some(&prereq_pos) = index.get(prereq_id) else {
                    return Err(IntegrityError::UnresolvedPrerequisite {
                        course: course.id.clone(),
                        prerequisite: prereq_id.clone(),
                    });
                };

                let prereq_tier = courses[prereq_pos].semester_tier;
                let in_order = match kind {
                    PrerequisiteKind::Mandatory => prereq_tier < course.semester_tier,
                    PrerequisiteKind::Corequisite => prereq_tier <= course.semester_tier,
                };
                if !in_order {
                    return Err(IntegrityError::TierOrder {
                        course: course.id.clone(),
                        course_tier: course.semester_tier,
                        prerequisite: prereq_id.clone(),
                        prerequisite_tier: prereq_tier,
                        kind,
                    });
                }

                if !dependents[prereq_pos].contains(&pos) {
                    dependents[prereq_pos].push(pos);
                }
            }
        }

        let graph = Self { courses, index, dependents };
        if let Some(cycle) = graph.find_any_cycle() {
            return Err(IntegrityError::Cycle(cycle));
        }
        graph.check_whole_program_dependents()?;
        Ok(graph)
    }

    /// Whole-program courses may only be required by other whole-program
    /// courses; anything else would count itself among the courses it waits on.
    fn check_whole_program_dependents(&self) -> std::result::Result<(), IntegrityError> {
        for course in self.courses.iter().filter(|c| c.requires_whole_program()) {
            let dependent = self
                .transitive_dependents(&course.id)
                .into_iter()
                .find_map(|id| self.course(id).filter(|c| !c.requires_whole_program()));
            if let Some(dependent) = dependent {
                return Err(IntegrityError::DependsOnWholeProgram {
                    course: dependent.id.clone(),
                    prerequisite: course.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Find a prerequisite cycle, visiting courses in declaration order.
    fn find_any_cycle(&self) -> Option<Vec<CourseId>> {
        let mut visited = vec![false; self.courses.len()];
        let mut on_stack = vec![false; self.courses.len()];
        let mut path = Vec::new();

        (0..self.courses.len()).find_map(|start| {
            if visited[start] {
                None
            } else {
                self.find_cycle(start, &mut visited, &mut on_stack, &mut path)
            }
        })
    }

    /// Depth-first search along prerequisite edges.
    fn find_cycle(
        &self,
        node: usize,
        visited: &mut [bool],
        on_stack: &mut [bool],
        path: &mut Vec<usize>,
    ) -> Option<Vec<CourseId>> {
        visited[node] = true;
        on_stack[node] = true;
        path.push(node);

        for (prereq_id, _) in self.courses[node].course_prerequisites() {
            let next = self.index[prereq_id];
            if !visited[next] {
                if let Some(cycle) = self.find_cycle(next, visited, on_stack, path) {
                    return Some(cycle);
                }
            } else if on_stack[next] {
                let start = path.iter().position(|&p| p == next).unwrap_or(0);
                return Some(path[start..].iter().map(|&p| self.courses[p].id.clone()).collect());
            }
        }

        path.pop();
        on_stack[node] = false;
        None
    }

    /// Number of courses.
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// Whether the curriculum has no courses.
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Courses in declaration order.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// Look up a course.
    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.index.get(id).map(|&pos| &self.courses[pos])
    }

    /// Whether the course belongs to this curriculum.
    pub fn contains(&self, id: &CourseId) -> bool {
        self.index.contains_key(id)
    }

    /// Declaration position of a course.
    pub fn position(&self, id: &CourseId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Distinct tiers, ascending.
    pub fn tiers(&self) -> Vec<SemesterTier> {
        let mut tiers: Vec<_> = self.courses.iter().map(|c| c.semester_tier).collect();
        tiers.sort_unstable();
        tiers.dedup();
        tiers
    }

    /// Courses grouped by tier, declaration order preserved within each tier.
    pub fn courses_by_semester(&self) -> BTreeMap<SemesterTier, Vec<&Course>> {
        let mut by_tier: BTreeMap<SemesterTier, Vec<&Course>> = BTreeMap::new();
        for course in &self.courses {
            by_tier.entry(course.semester_tier).or_default().push(course);
        }
        by_tier
    }

    /// Courses of one tier in declaration order.
    pub fn courses_in(&self, tier: SemesterTier) -> impl Iterator<Item = &Course> {
        self.courses.iter().filter(move |c| c.semester_tier == tier)
    }

    /// Prerequisites of a course; empty for unknown ids.
    pub fn prerequisites_of(&self, id: &CourseId) -> &[Prerequisite] {
        self.course(id).map(|c| c.prerequisites.as_slice()).unwrap_or(&[])
    }

    /// Courses that list `id` as a mandatory or corequisite prerequisite.
    pub fn dependents_of(&self, id: &CourseId) -> Vec<&Course> {
        self.index
            .get(id)
            .map(|&pos| self.dependents[pos].iter().map(|&d| &self.courses[d]).collect())
            .unwrap_or_default()
    }

    /// Courses that list `id` as a mandatory prerequisite.
    pub fn mandatory_dependents_of(&self, id: &CourseId) -> Vec<&Course> {
        self.dependents_of(id)
            .into_iter()
            .filter(|c| c.mandatory_prerequisites().any(|p| p == id))
            .collect()
    }

    /// Every course reachable by following prerequisite edges from `id`,
    /// in declaration order.
    pub fn transitive_prerequisites(&self, id: &CourseId) -> Vec<&CourseId> {
        self.reach(id, |pos| {
            self.courses[pos]
                .course_prerequisites()
                .map(|(p, _)| self.index[p])
                .collect()
        })
    }

    /// Every course that depends on `id`, directly or through other courses,
    /// in declaration order.
    pub fn transitive_dependents(&self, id: &CourseId) -> Vec<&CourseId> {
        self.reach(id, |pos| self.dependents[pos].clone())
    }

    fn reach(&self, id: &CourseId, next: impl Fn(usize) -> Vec<usize>) -> Vec<&CourseId> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut seen = vec![false; self.courses.len()];
        let mut stack = next(start);
        while let Some(pos) = stack.pop() {
            if !seen[pos] {
                seen[pos] = true;
                stack.extend(next(pos));
            }
        }
        seen[start] = false;
        seen.into_iter()
            .enumerate()
            .filter_map(|(pos, s)| s.then(|| &self.courses[pos].id))
            .collect()
    }

    /// Sum of credits over the whole curriculum.
    pub fn total_credits(&self) -> u32 {
        self.courses.iter().map(|c| c.credits).sum()
    }
}
