//! Storage trait abstraction.

use async_trait::async_trait;
use pensum_core::{Course, CurriculumError, CurriculumGraph, EnrollmentSnapshot};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Program or student key that cannot name a file
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// Stored curriculum failed validation
    #[error("curriculum data unavailable: {0}")]
    Curriculum(#[from] CurriculumError),
}

/// Source of curriculum and enrollment snapshots.
///
/// Programs and students are addressed by plain string keys.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the raw course list of a program.
    async fn load_curriculum(&self, program: &str) -> Result<Vec<Course>>;

    /// Load a student's enrollment history. Unknown students have none.
    async fn load_enrollment(&self, student: &str) -> Result<EnrollmentSnapshot>;

    /// Persist a student's enrollment history.
    async fn save_enrollment(&self, student: &str, snapshot: &EnrollmentSnapshot) -> Result<()>;

    /// List known programs, sorted.
    async fn list_programs(&self) -> Result<Vec<String>>;

    /// Load and validate a program. A program with no courses loads as the
    /// empty graph; only integrity violations are errors.
    async fn load_graph(&self, program: &str) -> Result<CurriculumGraph> {
        let courses = self.load_curriculum(program).await?;
        match CurriculumGraph::load(courses) {
            Ok(graph) => Ok(graph),
            Err(err) if !err.is_fatal() => Ok(CurriculumGraph::default()),
            Err(err) => Err(err.into()),
        }
    }
}
