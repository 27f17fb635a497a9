//! Error taxonomy for curriculum snapshots.

use crate::course::PrerequisiteKind;
use crate::id::{CourseId, SemesterTier};

/// Result type for curriculum operations.
pub type Result<T> = std::result::Result<T, CurriculumError>;

/// Errors raised while loading a curriculum snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurriculumError {
    /// The snapshot is structurally broken and no output may be derived from it
    #[error("curriculum integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// The snapshot has no courses; derived computations yield zero results
    #[error("curriculum has no courses")]
    EmptyCurriculum,
}

impl CurriculumError {
    /// Whether the snapshot must be refused outright.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CurriculumError::Integrity(_))
    }
}

/// Structural defects of a curriculum snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// A course has an empty id
    #[error("course '{code}' has a blank id")]
    BlankId {
        /// Code of the offending course
        code: String,
    },

    /// Two courses share an id
    #[error("duplicate course id '{0}'")]
    DuplicateCourse(CourseId),

    /// Two courses share a code
    #[error("duplicate course code '{0}'")]
    DuplicateCode(String),

    /// A course carries no credits
    #[error("course '{0}' has zero credits")]
    InvalidCredits(CourseId),

    /// A prerequisite points at a course that is not in the snapshot
    #[error("course '{course}' requires unknown course '{prerequisite}'")]
    UnresolvedPrerequisite {
        /// Dependent course
        course: CourseId,
        /// Missing reference
        prerequisite: CourseId,
    },

    /// A course lists itself as a prerequisite
    #[error("course '{0}' requires itself")]
    SelfPrerequisite(CourseId),

    /// A prerequisite is offered too late relative to the dependent course
    #[error(
        "course '{course}' ({course_tier}) cannot require '{prerequisite}' ({prerequisite_tier}) as {kind:?}"
    )]
    TierOrder {
        /// Dependent course
        course: CourseId,
        /// Tier of the dependent course
        course_tier: SemesterTier,
        /// Prerequisite course
        prerequisite: CourseId,
        /// Tier of the prerequisite
        prerequisite_tier: SemesterTier,
        /// Kind of the offending edge
        kind: PrerequisiteKind,
    },

    /// Prerequisite edges form a cycle
    #[error("prerequisite cycle: {}", join_cycle(.0))]
    Cycle(Vec<CourseId>),

    /// A course that does not itself require the whole program depends,
    /// directly or transitively, on one that does
    #[error("course {course} depends on whole-program course {prerequisite}")]
    DependsOnWholeProgram {
        /// Dependent course
        course: CourseId,
        /// Whole-program course it reaches
        prerequisite: CourseId,
    },
}

fn join_cycle(ids: &[CourseId]) -> String {
    let mut parts: Vec<&str> = ids.iter().map(CourseId::as_str).collect();
    if let Some(first) = ids.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}
