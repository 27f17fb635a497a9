//! Completion estimation.

use pensum_core::{Course, CourseId, CurriculumGraph, EnrollmentSnapshot, EnrollmentState, PrerequisiteKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Estimator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EstimatorConfig {
    /// Credit load a student may register per semester
    pub max_credits_per_semester: u32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_credits_per_semester: 21,
        }
    }
}

impl EstimatorConfig {
    /// Check the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_credits_per_semester == 0 {
            return Err("maxCreditsPerSemester must be positive".to_string());
        }
        Ok(())
    }
}

/// Estimated remaining effort for one student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEstimate {
    /// Courses not yet approved
    pub remaining_courses: usize,
    /// Credits not yet approved
    pub remaining_credits: u32,
    /// Semesters forced by the longest chain of pending mandatory prerequisites
    pub critical_path_semesters: u32,
    /// Semesters forced by the credit load limit
    pub credit_bound_semesters: u32,
    /// Larger of the two bounds
    pub estimated_semesters: u32,
    /// One longest pending chain, earliest course first
    pub critical_path: Vec<CourseId>,
}

/// Completion estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionEstimator {
    config: EstimatorConfig,
}

impl CompletionEstimator {
    /// Create an estimator with the given settings.
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Estimate how many semesters remain.
    pub fn estimate(&self, graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> CompletionEstimate {
        let pending: Vec<bool> = graph
            .courses()
            .iter()
            .map(|c| enrollment.state_of(&c.id) != EnrollmentState::Approved)
            .collect();

        let remaining_courses = pending.iter().filter(|p| **p).count();
        let remaining_credits: u32 = graph
            .courses()
            .iter()
            .zip(&pending)
            .filter(|(_, p)| **p)
            .map(|(c, _)| c.credits)
            .sum();

        let mut depth: Vec<Option<u32>> = vec![None; graph.len()];
        let mut via: Vec<Option<usize>> = vec![None; graph.len()];
        for pos in 0..graph.len() {
            self.depth_of(graph, &pending, pos, &mut depth, &mut via);
        }

        // First course in declaration order on ties.
        let deepest = depth
            .iter()
            .enumerate()
            .filter_map(|(pos, d)| d.map(|d| (pos, d)))
            .fold(None, |best: Option<(usize, u32)>, (pos, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((pos, d)),
            });

        let (critical_path_semesters, critical_path) = match deepest {
            Some((pos, d)) => {
                let mut path = vec![graph.courses()[pos].id.clone()];
                let mut cursor = via[pos];
                while let Some(prev) = cursor {
                    path.push(graph.courses()[prev].id.clone());
                    cursor = via[prev];
                }
                path.reverse();
                (d, path)
            }
            None => (0, Vec::new()),
        };

        let credit_bound_semesters = remaining_credits.div_ceil(self.config.max_credits_per_semester.max(1));
        let estimated_semesters = critical_path_semesters.max(credit_bound_semesters);

        debug!(
            remaining_courses,
            remaining_credits,
            critical_path_semesters,
            credit_bound_semesters,
            "completion estimated"
        );

        CompletionEstimate {
            remaining_courses,
            remaining_credits,
            critical_path_semesters,
            credit_bound_semesters,
            estimated_semesters,
            critical_path,
        }
    }

    /// Semester index (1-based) at which a pending course can be taken at the
    /// earliest, counting only pending prerequisites. `None` for approved courses.
    fn depth_of(
        &self,
        graph: &CurriculumGraph,
        pending: &[bool],
        pos: usize,
        depth: &mut [Option<u32>],
        via: &mut [Option<usize>],
    ) -> Option<u32> {
        if !pending[pos] {
            return None;
        }
        if let Some(d) = depth[pos] {
            return Some(d);
        }

        let course: &Course = &graph.courses()[pos];
        let mut best = 1;
        let mut best_via = None;

        for (prereq_id, kind) in course.course_prerequisites() {
            let Some(prereq_pos) = graph.position(prereq_id) else {
                continue;
            };
            if let Some(d) = self.depth_of(graph, pending, prereq_pos, depth, via) {
                let candidate = match kind {
                    PrerequisiteKind::Mandatory => d + 1,
                    PrerequisiteKind::Corequisite => d,
                };
                if candidate > best {
                    best = candidate;
                    best_via = Some(prereq_pos);
                }
            }
        }

        if course.requires_whole_program() {
            for other in 0..graph.len() {
                if other == pos || graph.courses()[other].requires_whole_program() {
                    continue;
                }
                if let Some(d) = self.depth_of(graph, pending, other, depth, via) {
                    if d + 1 > best {
                        best = d + 1;
                        best_via = Some(other);
                    }
                }
            }
        }

        depth[pos] = Some(best);
        via[pos] = best_via;
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pensum_core::{EnrollmentRecord, Prerequisite, SemesterTier};

    fn tier(n: u8) -> SemesterTier {
        SemesterTier::new(n).unwrap()
    }

    fn course(id: &str, semester: u8, credits: u32) -> Course {
        Course::new(id, id, format!("Course {id}"), credits, tier(semester))
    }

    fn program() -> CurriculumGraph {
        CurriculumGraph::load(vec![
            course("A", 1, 4),
            course("B", 1, 4),
            course("C", 2, 4).with_prerequisite(Prerequisite::mandatory("A")),
            course("L", 2, 2).with_prerequisite(Prerequisite::corequisite("C")),
            course("D", 3, 4).with_prerequisite(Prerequisite::mandatory("C")),
            course("TG", 4, 6).with_prerequisite(Prerequisite::WholeProgram),
        ])
        .unwrap()
    }

    fn path(estimate: &CompletionEstimate) -> Vec<&str> {
        estimate.critical_path.iter().map(CourseId::as_str).collect()
    }

    #[test]
    fn test_fresh_student() {
        let estimate = CompletionEstimator::default().estimate(&program(), &EnrollmentSnapshot::new());
        assert_eq!(estimate.remaining_courses, 6);
        assert_eq!(estimate.remaining_credits, 24);
        // A -> C -> D -> TG
        assert_eq!(estimate.critical_path_semesters, 4);
        assert_eq!(path(&estimate), vec!["A", "C", "D", "TG"]);
        assert_eq!(estimate.credit_bound_semesters, 2);
        assert_eq!(estimate.estimated_semesters, 4);
    }

    #[test]
    fn test_corequisite_does_not_add_a_semester() {
        let graph = CurriculumGraph::load(vec![
            course("A", 1, 3),
            course("C", 2, 3).with_prerequisite(Prerequisite::mandatory("A")),
            course("L", 2, 1).with_prerequisite(Prerequisite::corequisite("C")),
        ])
        .unwrap();
        let estimate = CompletionEstimator::default().estimate(&graph, &EnrollmentSnapshot::new());
        assert_eq!(estimate.critical_path_semesters, 2);
        assert_eq!(path(&estimate), vec!["A", "C"]);
    }

    #[test]
    fn test_whole_program_chain() {
        let graph = CurriculumGraph::load(vec![
            course("A", 1, 3),
            course("TG", 2, 6).with_prerequisite(Prerequisite::WholeProgram),
            course("GRADO", 3, 1)
                .with_prerequisite(Prerequisite::WholeProgram)
                .with_prerequisite(Prerequisite::mandatory("TG")),
        ])
        .unwrap();
        let estimate = CompletionEstimator::default().estimate(&graph, &EnrollmentSnapshot::new());
        assert_eq!(estimate.critical_path_semesters, 3);
        assert_eq!(path(&estimate), vec!["A", "TG", "GRADO"]);
    }

    #[test]
    fn test_credit_bound_dominates() {
        let estimator = CompletionEstimator::new(EstimatorConfig { max_credits_per_semester: 5 });
        let estimate = estimator.estimate(&program(), &EnrollmentSnapshot::new());
        assert_eq!(estimate.credit_bound_semesters, 5);
        assert_eq!(estimate.estimated_semesters, 5);
    }

    #[test]
    fn test_approved_courses_shorten_the_path() {
        let enrollment = EnrollmentSnapshot::new()
            .with(EnrollmentRecord::new("A", EnrollmentState::Approved))
            .with(EnrollmentRecord::new("C", EnrollmentState::Approved));
        let estimate = CompletionEstimator::default().estimate(&program(), &enrollment);
        assert_eq!(estimate.remaining_courses, 4);
        assert_eq!(estimate.critical_path_semesters, 2);
        assert_eq!(path(&estimate), vec!["B", "TG"]);
    }

    #[test]
    fn test_everything_approved() {
        let graph = program();
        let enrollment: EnrollmentSnapshot = graph
            .courses()
            .iter()
            .map(|c| EnrollmentRecord::new(c.id.clone(), EnrollmentState::Approved))
            .collect();
        let estimate = CompletionEstimator::default().estimate(&graph, &enrollment);
        assert_eq!(estimate, CompletionEstimate::default());
    }

    #[test]
    fn test_config_validation() {
        assert!(EstimatorConfig::default().validate().is_ok());
        assert!(EstimatorConfig { max_credits_per_semester: 0 }.validate().is_err());
        let parsed: EstimatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, EstimatorConfig::default());
    }
}
