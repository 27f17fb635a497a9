//! Enrollment model - a student's per-course history.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::id::CourseId;
use crate::Time;

/// State of a course for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentState {
    /// Never taken (also implied by the absence of a record)
    #[default]
    NotTaken,
    /// Currently enrolled
    InProgress,
    /// Passed
    Approved,
    /// Evaluated and not passed
    Failed,
    /// Dropped before evaluation
    Withdrawn,
}

impl EnrollmentState {
    /// All states, in display order.
    pub const ALL: [EnrollmentState; 5] = [
        EnrollmentState::NotTaken,
        EnrollmentState::InProgress,
        EnrollmentState::Approved,
        EnrollmentState::Failed,
        EnrollmentState::Withdrawn,
    ];

    /// Whether this state implies an evaluation took place (and so may carry a grade).
    pub fn is_evaluated(self) -> bool {
        matches!(self, EnrollmentState::Approved | EnrollmentState::Failed)
    }

    /// Whether the course is settled or being taken, so it cannot be offered again.
    pub fn is_taken_or_taking(self) -> bool {
        matches!(self, EnrollmentState::Approved | EnrollmentState::InProgress)
    }

    /// Get string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentState::NotTaken => "NOT_TAKEN",
            EnrollmentState::InProgress => "IN_PROGRESS",
            EnrollmentState::Approved => "APPROVED",
            EnrollmentState::Failed => "FAILED",
            EnrollmentState::Withdrawn => "WITHDRAWN",
        }
    }
}

impl std::fmt::Display for EnrollmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnrollmentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        EnrollmentState::ALL
            .into_iter()
            .find(|state| state.as_str() == normalized)
            .ok_or_else(|| format!("unknown enrollment state '{s}'"))
    }
}

/// One student's record for one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
    /// Course the record refers to
    pub course_id: CourseId,

    /// Current state
    pub state: EnrollmentState,

    /// Grade, present only for evaluated states
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,

    /// Label of the semester in which the course was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester_taken: Option<String>,

    /// Last modification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Time>,
}

impl EnrollmentRecord {
    /// Create a record without grade.
    pub fn new(course_id: impl Into<CourseId>, state: EnrollmentState) -> Self {
        Self {
            course_id: course_id.into(),
            state,
            grade: None,
            semester_taken: None,
            updated_at: None,
        }
    }

    /// Attach a grade.
    pub fn with_grade(mut self, grade: f64) -> Self {
        self.grade = Some(grade);
        self
    }

    /// Attach the semester in which it was taken.
    pub fn with_semester_taken(mut self, label: impl Into<String>) -> Self {
        self.semester_taken = Some(label.into());
        self
    }

    /// Grade, ignored when the state carries no evaluation.
    pub fn effective_grade(&self) -> Option<f64> {
        self.grade.filter(|_| self.state.is_evaluated())
    }
}

/// Snapshot of every course record for one student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<EnrollmentRecord>", into = "Vec<EnrollmentRecord>")]
pub struct EnrollmentSnapshot {
    records: HashMap<CourseId, EnrollmentRecord>,
}

impl EnrollmentSnapshot {
    /// Empty snapshot (no course touched).
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a course; absence means `NotTaken`.
    pub fn state_of(&self, id: &CourseId) -> EnrollmentState {
        self.records.get(id).map(|r| r.state).unwrap_or_default()
    }

    /// Record for a course.
    pub fn record(&self, id: &CourseId) -> Option<&EnrollmentRecord> {
        self.records.get(id)
    }

    /// All records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &EnrollmentRecord> {
        self.records.values()
    }

    /// Number of touched courses.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no course was touched.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert or update a record. Records are never removed; a grade is kept
    /// only when the new state implies an evaluation.
    pub fn upsert(&mut self, mut record: EnrollmentRecord) {
        if !record.state.is_evaluated() {
            record.grade = None;
        }
        match self.records.get_mut(&record.course_id) {
            Some(existing) => {
                existing.state = record.state;
                existing.grade = record.grade;
                if record.semester_taken.is_some() {
                    existing.semester_taken = record.semester_taken;
                }
                existing.updated_at = record.updated_at.or(existing.updated_at);
            }
            None => {
                self.records.insert(record.course_id.clone(), record);
            }
        }
    }

    /// Builder-style upsert.
    pub fn with(mut self, record: EnrollmentRecord) -> Self {
        self.upsert(record);
        self
    }
}

impl From<Vec<EnrollmentRecord>> for EnrollmentSnapshot {
    fn from(records: Vec<EnrollmentRecord>) -> Self {
        let mut snapshot = EnrollmentSnapshot::new();
        for record in records {
            snapshot.upsert(record);
        }
        snapshot
    }
}

impl From<EnrollmentSnapshot> for Vec<EnrollmentRecord> {
    fn from(snapshot: EnrollmentSnapshot) -> Self {
        let mut records: Vec<_> = snapshot.records.into_values().collect();
        records.sort_by(|a, b| a.course_id.cmp(&b.course_id));
        records
    }
}

impl FromIterator<EnrollmentRecord> for EnrollmentSnapshot {
    fn from_iter<I: IntoIterator<Item = EnrollmentRecord>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_record_is_not_taken() {
        let snapshot = EnrollmentSnapshot::new();
        assert_eq!(snapshot.state_of(&CourseId::new("C1")), EnrollmentState::NotTaken);
        assert!(snapshot.record(&CourseId::new("C1")).is_none());
    }

    #[test]
    fn test_upsert_keeps_history_and_updates_state() {
        let mut snapshot = EnrollmentSnapshot::new();
        snapshot.upsert(
            EnrollmentRecord::new("C1", EnrollmentState::InProgress).with_semester_taken("2024-1"),
        );
        snapshot.upsert(EnrollmentRecord::new("C1", EnrollmentState::Approved).with_grade(15.0));

        assert_eq!(snapshot.len(), 1);
        let record = snapshot.record(&CourseId::new("C1")).unwrap();
        assert_eq!(record.state, EnrollmentState::Approved);
        assert_eq!(record.grade, Some(15.0));
        assert_eq!(record.semester_taken.as_deref(), Some("2024-1"));
    }

    #[test]
    fn test_upsert_drops_grade_for_unevaluated_state() {
        let mut snapshot = EnrollmentSnapshot::new();
        snapshot.upsert(EnrollmentRecord::new("C1", EnrollmentState::Failed).with_grade(8.0));
        snapshot.upsert(EnrollmentRecord::new("C1", EnrollmentState::InProgress).with_grade(12.0));

        let record = snapshot.record(&CourseId::new("C1")).unwrap();
        assert_eq!(record.state, EnrollmentState::InProgress);
        assert_eq!(record.grade, None);
    }

    #[test]
    fn test_effective_grade() {
        let mut record = EnrollmentRecord::new("C1", EnrollmentState::Failed).with_grade(8.0);
        assert_eq!(record.effective_grade(), Some(8.0));
        record.state = EnrollmentState::Withdrawn;
        assert_eq!(record.effective_grade(), None);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = r#"[
            { "courseId": "C1", "state": "APPROVED", "grade": 16.5, "semesterTaken": "2023-2" },
            { "courseId": "C2", "state": "IN_PROGRESS" }
        ]"#;
        let snapshot: EnrollmentSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.state_of(&CourseId::new("C2")), EnrollmentState::InProgress);

        let back = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(back[0]["courseId"], "C1");
        assert_eq!(back[1]["state"], "IN_PROGRESS");
        assert!(back[1].get("grade").is_none());
    }

    #[test]
    fn test_state_from_str() {
        assert_eq!("approved".parse::<EnrollmentState>(), Ok(EnrollmentState::Approved));
        assert_eq!("in progress".parse::<EnrollmentState>(), Ok(EnrollmentState::InProgress));
        assert_eq!("NOT-TAKEN".parse::<EnrollmentState>(), Ok(EnrollmentState::NotTaken));
        assert!("passed".parse::<EnrollmentState>().is_err());
    }
}
