//! Eligibility resolution for courses.

use pensum_core::{
    Course, CourseId, CurriculumGraph, EnrollmentSnapshot, EnrollmentState, Prerequisite,
    PrerequisiteKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Result of checking one course against a student's history.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Every prerequisite satisfied, may be registered
    Available,
    /// Already approved or being taken
    Taken(EnrollmentState),
    /// Blocked by these prerequisites, in declaration order
    Blocked(Vec<Prerequisite>),
}

impl Resolution {
    /// Whether the course may be registered now.
    pub fn is_available(&self) -> bool {
        matches!(self, Resolution::Available)
    }
}

/// Courses a student may register for right now.
///
/// Iterates in curriculum declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CourseId>", into = "Vec<CourseId>")]
pub struct EligibilitySet {
    ids: Vec<CourseId>,
    members: HashSet<CourseId>,
}

impl EligibilitySet {
    /// Whether the course is available.
    pub fn contains(&self, id: &CourseId) -> bool {
        self.members.contains(id)
    }

    /// Number of available courses.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is available.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Available ids.
    pub fn iter(&self) -> impl Iterator<Item = &CourseId> {
        self.ids.iter()
    }

    /// Available ids as a plain set.
    pub fn to_set(&self) -> HashSet<CourseId> {
        self.members.clone()
    }

    fn insert(&mut self, id: CourseId) {
        if self.members.insert(id.clone()) {
            self.ids.push(id);
        }
    }
}

impl From<Vec<CourseId>> for EligibilitySet {
    fn from(ids: Vec<CourseId>) -> Self {
        let mut set = EligibilitySet::default();
        for id in ids {
            set.insert(id);
        }
        set
    }
}

impl From<EligibilitySet> for Vec<CourseId> {
    fn from(set: EligibilitySet) -> Self {
        set.ids
    }
}

impl<'a> IntoIterator for &'a EligibilitySet {
    type Item = &'a CourseId;
    type IntoIter = std::slice::Iter<'a, CourseId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// Resolves prerequisites against an enrollment snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityResolver;

impl EligibilityResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Check whether one course may be taken.
    pub fn check(
        &self,
        graph: &CurriculumGraph,
        enrollment: &EnrollmentSnapshot,
        course: &Course,
    ) -> Resolution {
        let whole_program_done = course.requires_whole_program()
            && Self::whole_program_approved(graph, enrollment, &course.id);
        self.check_with(enrollment, course, whole_program_done)
    }

    fn check_with(
        &self,
        enrollment: &EnrollmentSnapshot,
        course: &Course,
        whole_program_done: bool,
    ) -> Resolution {
        let state = enrollment.state_of(&course.id);
        if state.is_taken_or_taking() {
            return Resolution::Taken(state);
        }

        let unmet: Vec<Prerequisite> = course
            .prerequisites
            .iter()
            .filter(|p| !Self::is_satisfied(enrollment, p, whole_program_done))
            .cloned()
            .collect();

        if unmet.is_empty() {
            Resolution::Available
        } else {
            Resolution::Blocked(unmet)
        }
    }

    fn is_satisfied(
        enrollment: &EnrollmentSnapshot,
        prerequisite: &Prerequisite,
        whole_program_done: bool,
    ) -> bool {
        match prerequisite {
            Prerequisite::Course { id, kind: PrerequisiteKind::Mandatory } => {
                enrollment.state_of(id) == EnrollmentState::Approved
            }
            Prerequisite::Course { id, kind: PrerequisiteKind::Corequisite } => {
                enrollment.state_of(id).is_taken_or_taking()
            }
            Prerequisite::WholeProgram => whole_program_done,
        }
    }

    /// Every course other than `except` and the other whole-program courses is approved.
    fn whole_program_approved(
        graph: &CurriculumGraph,
        enrollment: &EnrollmentSnapshot,
        except: &CourseId,
    ) -> bool {
        graph
            .courses()
            .iter()
            .filter(|c| &c.id != except && !c.requires_whole_program())
            .all(|c| enrollment.state_of(&c.id) == EnrollmentState::Approved)
    }

    /// Compute every course currently available.
    pub fn compute_available(
        &self,
        graph: &CurriculumGraph,
        enrollment: &EnrollmentSnapshot,
    ) -> EligibilitySet {
        for record in enrollment.records() {
            if !graph.contains(&record.course_id) {
                warn!(course = %record.course_id, "enrollment record for a course outside the curriculum");
            }
        }

        // Only ordinary courses count toward the whole program, so one pass decides it.
        let whole_program_done = graph
            .courses()
            .iter()
            .filter(|c| !c.requires_whole_program())
            .all(|c| enrollment.state_of(&c.id) == EnrollmentState::Approved);

        let mut available = EligibilitySet::default();
        for course in graph.courses() {
            if self.check_with(enrollment, course, whole_program_done).is_available() {
                available.insert(course.id.clone());
            }
        }

        debug!(
            courses = graph.len(),
            available = available.len(),
            "eligibility computed"
        );
        available
    }
}

/// Compute the courses a student may register for now.
pub fn compute_available(graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> EligibilitySet {
    EligibilityResolver::new().compute_available(graph, enrollment)
}
