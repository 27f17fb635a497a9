//! JSON file storage implementation.
//!
//! Layout under the data root:
//!
//! ```text
//! curricula/<program>.json    array of course records
//! enrollments/<student>.json  array of enrollment records
//! ```

use std::path::{Path, PathBuf};
use pensum_core::{Course, EnrollmentSnapshot};
use super::{SnapshotStore, StorageError, Result};
use tokio::fs;
use tracing::{debug, info};

/// File-based JSON snapshot store.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    root: PathBuf,
}

impl JsonSnapshotStore {
    /// Open a store, creating the `curricula/` and `enrollments/` directories.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("curricula")).await?;
        fs::create_dir_all(root.join("enrollments")).await?;

        debug!(root = %root.display(), "snapshot store opened");
        Ok(Self { root })
    }

    /// Data root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn curriculum_path(&self, program: &str) -> Result<PathBuf> {
        Ok(self.root.join("curricula").join(format!("{}.json", checked_key(program)?)))
    }

    fn enrollment_path(&self, student: &str) -> Result<PathBuf> {
        Ok(self.root.join("enrollments").join(format!("{}.json", checked_key(student)?)))
    }

    /// Store a program's course list. Used to seed data directories.
    pub async fn save_curriculum(&self, program: &str, courses: &[Course]) -> Result<()> {
        let path = self.curriculum_path(program)?;
        write_json(&path, &courses).await?;
        info!(program, courses = courses.len(), "curriculum saved");
        Ok(())
    }
}

#[async_trait::async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn load_curriculum(&self, program: &str) -> Result<Vec<Course>> {
        let path = self.curriculum_path(program)?;
        let courses: Vec<Course> = read_json(&path)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("program {program}")))?;
        debug!(program, courses = courses.len(), "curriculum read");
        Ok(courses)
    }

    async fn load_enrollment(&self, student: &str) -> Result<EnrollmentSnapshot> {
        let path = self.enrollment_path(student)?;
        let snapshot: EnrollmentSnapshot = read_json(&path).await?.unwrap_or_default();
        debug!(student, records = snapshot.len(), "enrollment read");
        Ok(snapshot)
    }

    async fn save_enrollment(&self, student: &str, snapshot: &EnrollmentSnapshot) -> Result<()> {
        let path = self.enrollment_path(student)?;
        write_json(&path, snapshot).await?;
        info!(student, records = snapshot.len(), "enrollment saved");
        Ok(())
    }

    async fn list_programs(&self) -> Result<Vec<String>> {
        let mut programs = Vec::new();
        let mut rd = fs::read_dir(self.root.join("curricula")).await?;
        while let Some(entry) = rd.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                programs.push(stem.to_string());
            }
        }
        programs.sort();
        Ok(programs)
    }
}

/// Reject keys that would escape their directory.
fn checked_key(key: &str) -> Result<&str> {
    let key = key.trim();
    if key.is_empty() || key == "." || key.contains("..") || key.contains(['/', '\\']) {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(key)
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write through a sibling temp file so readers never see a partial file.
async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json.as_bytes()).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pensum_core::{
        CurriculumError, EnrollmentRecord, EnrollmentState, IntegrityError, Prerequisite, SemesterTier,
    };
    use tempfile::TempDir;

    fn course(id: &str, semester: u8) -> Course {
        Course::new(id, id, format!("Course {id}"), 3, SemesterTier::new(semester).unwrap())
    }

    async fn store() -> (TempDir, JsonSnapshotStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonSnapshotStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_curriculum_round_trip_and_graph() {
        let (_dir, store) = store().await;
        let courses = vec![
            course("C1", 1),
            course("C2", 2).with_prerequisite(Prerequisite::mandatory("C1")),
        ];
        store.save_curriculum("sistemas", &courses).await.unwrap();

        assert_eq!(store.load_curriculum("sistemas").await.unwrap(), courses);
        let graph = store.load_graph("sistemas").await.unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[tokio::test]
    async fn test_reads_hand_written_curriculum() {
        let (dir, store) = store().await;
        let json = r#"[
            {"id": "MAT1", "code": "MAT-101", "name": "Calculo I", "credits": 4, "semester": "S1"},
            {"id": "MAT2", "code": "MAT-102", "name": "Calculo II", "credits": 4, "semesterTier": "2",
             "prerequisites": [{"id": "MAT1", "type": "MANDATORY"}]},
            {"id": "TG", "code": "TG-900", "name": "Trabajo de grado", "credits": 6, "semester": "3",
             "prerequisites": [{"id": "TODAS_LAS_MATERIAS"}]}
        ]"#;
        std::fs::write(dir.path().join("curricula").join("ing.json"), json).unwrap();

        let graph = store.load_graph("ing").await.unwrap();
        assert_eq!(graph.len(), 3);
        let tg = graph.courses().iter().find(|c| c.id.as_str() == "TG").unwrap();
        assert!(tg.requires_whole_program());
    }

    #[tokio::test]
    async fn test_missing_curriculum_is_not_found() {
        let (_dir, store) = store().await;
        let err = store.load_curriculum("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_broken_curriculum_surfaces_integrity_error() {
        let (_dir, store) = store().await;
        let courses = vec![course("C2", 2).with_prerequisite(Prerequisite::mandatory("GHOST"))];
        store.save_curriculum("broken", &courses).await.unwrap();

        let err = store.load_graph("broken").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Curriculum(CurriculumError::Integrity(IntegrityError::UnresolvedPrerequisite { .. }))
        ));
        assert!(err.to_string().starts_with("curriculum data unavailable"));
    }

    #[tokio::test]
    async fn test_empty_curriculum_loads_as_empty_graph() {
        let (_dir, store) = store().await;
        store.save_curriculum("nueva", &[]).await.unwrap();

        let graph = store.load_graph("nueva").await.unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.total_credits(), 0);
    }

    #[tokio::test]
    async fn test_missing_enrollment_is_empty() {
        let (_dir, store) = store().await;
        let snapshot = store.load_enrollment("new-student").await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_enrollment_round_trip() {
        let (dir, store) = store().await;
        let snapshot = EnrollmentSnapshot::new()
            .with(EnrollmentRecord::new("C1", EnrollmentState::Approved).with_grade(4.2))
            .with(EnrollmentRecord::new("C2", EnrollmentState::InProgress));
        store.save_enrollment("ana", &snapshot).await.unwrap();

        let loaded = store.load_enrollment("ana").await.unwrap();
        assert_eq!(loaded, snapshot);
        assert!(!dir.path().join("enrollments").join("ana.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_list_programs_sorted() {
        let (dir, store) = store().await;
        store.save_curriculum("zootecnia", &[course("Z1", 1)]).await.unwrap();
        store.save_curriculum("arquitectura", &[course("A1", 1)]).await.unwrap();
        std::fs::write(dir.path().join("curricula").join("notes.txt"), "x").unwrap();

        assert_eq!(store.list_programs().await.unwrap(), vec!["arquitectura", "zootecnia"]);
    }

    #[tokio::test]
    async fn test_rejects_path_keys() {
        let (_dir, store) = store().await;
        for key in ["", "../etc", "a/b", "a\\b"] {
            let err = store.load_enrollment(key).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {key:?}");
        }
    }
}
