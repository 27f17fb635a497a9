//! Course model - a unit of curriculum with credits, hours and prerequisites.

use serde::{Deserialize, Serialize};
use crate::id::{CourseId, SemesterTier};

/// Prerequisite id used by curriculum authors to mean "every other course".
pub const WHOLE_PROGRAM_SENTINEL: &str = "TODAS_LAS_MATERIAS";

/// A course as authored in the curriculum snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Stable identifier
    pub id: CourseId,

    /// Short unique mnemonic
    pub code: String,

    /// Display name
    pub name: String,

    /// Credit count
    pub credits: u32,

    /// Semester tier at which the course is offered
    #[serde(alias = "semester")]
    pub semester_tier: SemesterTier,

    /// Weekly theory hours
    #[serde(default)]
    pub theory_hours: u32,

    /// Weekly practice hours
    #[serde(default)]
    pub practice_hours: u32,

    /// Prerequisites in authored order
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
}

impl Course {
    /// Create a course without prerequisites.
    pub fn new(
        id: impl Into<CourseId>,
        code: impl Into<String>,
        name: impl Into<String>,
        credits: u32,
        semester_tier: SemesterTier,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            credits,
            semester_tier,
            theory_hours: 0,
            practice_hours: 0,
            prerequisites: Vec::new(),
        }
    }

    /// Add a prerequisite.
    pub fn with_prerequisite(mut self, prerequisite: Prerequisite) -> Self {
        self.prerequisites.push(prerequisite);
        self
    }

    /// Set weekly hours.
    pub fn with_hours(mut self, theory: u32, practice: u32) -> Self {
        self.theory_hours = theory;
        self.practice_hours = practice;
        self
    }

    /// Total weekly hours.
    pub fn total_hours(&self) -> u32 {
        self.theory_hours + self.practice_hours
    }

    /// Course prerequisites (excluding the whole-program sentinel) with their kind.
    pub fn course_prerequisites(&self) -> impl Iterator<Item = (&CourseId, PrerequisiteKind)> {
        self.prerequisites.iter().filter_map(|p| match p {
            Prerequisite::Course { id, kind } => Some((id, *kind)),
            Prerequisite::WholeProgram => None,
        })
    }

    /// Mandatory course prerequisites.
    pub fn mandatory_prerequisites(&self) -> impl Iterator<Item = &CourseId> {
        self.course_prerequisites()
            .filter(|(_, kind)| *kind == PrerequisiteKind::Mandatory)
            .map(|(id, _)| id)
    }

    /// Whether the course can only be taken once the rest of the program is approved.
    pub fn requires_whole_program(&self) -> bool {
        self.prerequisites.iter().any(|p| matches!(p, Prerequisite::WholeProgram))
    }
}

/// How a prerequisite must be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrerequisiteKind {
    /// Must be approved before enrolling
    #[default]
    Mandatory,
    /// May be taken in the same semester
    Corequisite,
}

/// A dependency of a course.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PrerequisiteRecord", into = "PrerequisiteRecord")]
pub enum Prerequisite {
    /// Depends on a single course
    Course {
        /// Required course
        id: CourseId,
        /// Satisfaction rule
        kind: PrerequisiteKind,
    },
    /// Depends on completion of every other course in the program
    WholeProgram,
}

impl Prerequisite {
    /// Mandatory prerequisite on a course.
    pub fn mandatory(id: impl Into<CourseId>) -> Self {
        Self::Course { id: id.into(), kind: PrerequisiteKind::Mandatory }
    }

    /// Corequisite on a course.
    pub fn corequisite(id: impl Into<CourseId>) -> Self {
        Self::Course { id: id.into(), kind: PrerequisiteKind::Corequisite }
    }

    /// Referenced course, if any.
    pub fn course_id(&self) -> Option<&CourseId> {
        match self {
            Self::Course { id, .. } => Some(id),
            Self::WholeProgram => None,
        }
    }
}

impl std::fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Course { id, kind: PrerequisiteKind::Mandatory } => write!(f, "{id}"),
            Self::Course { id, kind: PrerequisiteKind::Corequisite } => write!(f, "{id} (corequisite)"),
            Self::WholeProgram => f.write_str("all other courses"),
        }
    }
}

/// Wire shape of a prerequisite: `{ "id": ..., "type": "MANDATORY" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PrerequisiteRecord {
    id: String,
    #[serde(rename = "type", default)]
    kind: PrerequisiteKind,
}

impl From<PrerequisiteRecord> for Prerequisite {
    fn from(record: PrerequisiteRecord) -> Self {
        if record.id.trim().eq_ignore_ascii_case(WHOLE_PROGRAM_SENTINEL) {
            Prerequisite::WholeProgram
        } else {
            Prerequisite::Course { id: CourseId::new(record.id), kind: record.kind }
        }
    }
}

impl From<Prerequisite> for PrerequisiteRecord {
    fn from(prerequisite: Prerequisite) -> Self {
        match prerequisite {
            Prerequisite::Course { id, kind } => PrerequisiteRecord { id: id.to_string(), kind },
            Prerequisite::WholeProgram => PrerequisiteRecord {
                id: WHOLE_PROGRAM_SENTINEL.to_string(),
                kind: PrerequisiteKind::Mandatory,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_from_json() {
        let json = r#"{
            "id": "C2",
            "code": "MAT-102",
            "name": "Cálculo II",
            "credits": 4,
            "semesterTier": "S2",
            "theoryHours": 4,
            "practiceHours": 2,
            "prerequisites": [
                { "id": "C1", "type": "MANDATORY" },
                { "id": "F1", "type": "COREQUISITE" }
            ]
        }"#;

        let course: Course = serde_json::from_str(json).unwrap();
        assert_eq!(course.id, CourseId::new("C2"));
        assert_eq!(course.semester_tier.ordinal(), 2);
        assert_eq!(course.total_hours(), 6);
        assert_eq!(
            course.prerequisites,
            vec![Prerequisite::mandatory("C1"), Prerequisite::corequisite("F1")]
        );
        assert_eq!(course.mandatory_prerequisites().count(), 1);
    }

    #[test]
    fn test_missing_type_defaults_to_mandatory() {
        let p: Prerequisite = serde_json::from_str(r#"{ "id": "C1" }"#).unwrap();
        assert_eq!(p, Prerequisite::mandatory("C1"));
    }

    #[test]
    fn test_whole_program_sentinel() {
        let p: Prerequisite =
            serde_json::from_str(r#"{ "id": "todas_las_materias", "type": "MANDATORY" }"#).unwrap();
        assert_eq!(p, Prerequisite::WholeProgram);
        assert!(p.course_id().is_none());

        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["id"], WHOLE_PROGRAM_SENTINEL);
    }

    #[test]
    fn test_semester_alias_and_defaults() {
        let json = r#"{ "id": "T1", "code": "TG", "name": "Trabajo de grado",
                        "credits": 6, "semester": "Semestre 10",
                        "prerequisites": [{ "id": "TODAS_LAS_MATERIAS" }] }"#;
        let course: Course = serde_json::from_str(json).unwrap();
        assert_eq!(course.semester_tier.ordinal(), 10);
        assert_eq!(course.total_hours(), 0);
        assert!(course.requires_whole_program());
        assert_eq!(course.course_prerequisites().count(), 0);
    }

    #[test]
    fn test_invalid_semester_is_rejected() {
        let json = r#"{ "id": "X", "code": "X", "name": "X", "credits": 1, "semesterTier": "electiva" }"#;
        assert!(serde_json::from_str::<Course>(json).is_err());
    }
}
