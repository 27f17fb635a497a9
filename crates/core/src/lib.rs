//! Pensum core data models.
//!
//! This crate defines the curriculum snapshot (courses, prerequisite edges,
//! semester tiers), the per-student enrollment snapshot, and the validated
//! [`CurriculumGraph`] that every other engine crate reads from.

#![warn(missing_docs)]

// Identities
mod id;

// Curriculum
mod course;
mod graph;
mod error;

// Student history
mod enrollment;

// Re-exports
pub use id::{CourseId, SemesterTier, InvalidTierLabel};
pub use course::{Course, Prerequisite, PrerequisiteKind, WHOLE_PROGRAM_SENTINEL};
pub use graph::CurriculumGraph;
pub use error::{CurriculumError, IntegrityError, Result};
pub use enrollment::{EnrollmentState, EnrollmentRecord, EnrollmentSnapshot};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
