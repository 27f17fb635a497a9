//! Course recommendation - ranks available courses into priority tiers.

use crate::eligibility::{EligibilityResolver, EligibilitySet};
use pensum_core::{Course, CurriculumGraph, EnrollmentSnapshot, EnrollmentState, SemesterTier};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Priority tier of a recommendation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Retake failed courses, unblock the critical path
    High,
    /// Courses of the semester right after the furthest approved one
    Medium,
    /// Everything else
    Low,
}

impl Priority {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

/// One recommendation bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Priority tier
    pub priority: Priority,
    /// Short heading
    pub title: String,
    /// Why these courses were grouped together
    pub description: String,
    /// Courses in tier then declaration order
    pub courses: Vec<Course>,
}

/// Full recommendation output for one student.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReport {
    /// Non-empty buckets in priority order
    pub buckets: Vec<Recommendation>,
    /// Suggested semester to register next
    pub next_semester: Option<SemesterTier>,
    /// Nothing is left to register
    pub curriculum_complete: bool,
}

impl RecommendationReport {
    /// Bucket of a given priority.
    pub fn bucket(&self, priority: Priority) -> Option<&Recommendation> {
        self.buckets.iter().find(|b| b.priority == priority)
    }

    /// Priority assigned to a course, if it was recommended.
    pub fn priority_of(&self, id: &pensum_core::CourseId) -> Option<Priority> {
        self.buckets
            .iter()
            .find(|b| b.courses.iter().any(|c| &c.id == id))
            .map(|b| b.priority)
    }
}

/// Strategy for turning a student's situation into recommendations.
pub trait Recommender: Send + Sync {
    /// Recommend from a precomputed eligibility set.
    fn recommend_from(
        &self,
        graph: &CurriculumGraph,
        enrollment: &EnrollmentSnapshot,
        available: &EligibilitySet,
    ) -> RecommendationReport;

    /// Resolve eligibility and recommend.
    fn recommend(&self, graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> RecommendationReport {
        let available = EligibilityResolver::new().compute_available(graph, enrollment);
        self.recommend_from(graph, enrollment, &available)
    }
}

/// Default recommender: failed-course remediation first, then bias to the
/// semester following the furthest approved one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredRecommender;

impl TieredRecommender {
    /// Create a new recommender.
    pub fn new() -> Self {
        Self
    }

    /// Tier right after the furthest approved one; the first tier when nothing is approved.
    pub fn next_tier(graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> Option<SemesterTier> {
        let furthest = graph
            .courses()
            .iter()
            .filter(|c| enrollment.state_of(&c.id) == EnrollmentState::Approved)
            .map(|c| c.semester_tier)
            .max();

        graph
            .tiers()
            .into_iter()
            .find(|t| furthest.map_or(true, |f| *t > f))
    }

    /// Classify one available course. First matching rule wins.
    fn classify(
        graph: &CurriculumGraph,
        enrollment: &EnrollmentSnapshot,
        next_tier: Option<SemesterTier>,
        course: &Course,
    ) -> Priority {
        if enrollment.state_of(&course.id) == EnrollmentState::Failed {
            return Priority::High;
        }

        let Some(next) = next_tier else {
            return Priority::Low;
        };

        let unblocks_next = graph
            .mandatory_dependents_of(&course.id)
            .iter()
            .any(|d| d.semester_tier == next);
        if unblocks_next {
            Priority::High
        } else if course.semester_tier == next {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    fn bucket_text(priority: Priority, next_tier: Option<SemesterTier>) -> (String, String) {
        let next = next_tier.map(|t| t.to_string()).unwrap_or_else(|| "the next semester".to_string());
        match priority {
            Priority::High => (
                "High priority".to_string(),
                format!("Failed courses to retake and courses required to unlock {next}"),
            ),
            Priority::Medium => (
                format!("Next semester ({next})"),
                format!("Courses of {next}, the semester after your furthest approved one"),
            ),
            Priority::Low => (
                "Further ahead".to_string(),
                "Electives and courses beyond the next semester".to_string(),
            ),
        }
    }
}

impl Recommender for TieredRecommender {
    fn recommend_from(
        &self,
        graph: &CurriculumGraph,
        enrollment: &EnrollmentSnapshot,
        available: &EligibilitySet,
    ) -> RecommendationReport {
        if graph.is_empty() {
            return RecommendationReport::default();
        }
        if available.is_empty() {
            debug!("no course available, curriculum complete");
            return RecommendationReport {
                buckets: Vec::new(),
                next_semester: None,
                curriculum_complete: true,
            };
        }

        let next_tier = Self::next_tier(graph, enrollment);

        let mut tiered: Vec<(Priority, &Course)> = available
            .iter()
            .filter_map(|id| graph.course(id))
            .map(|c| (Self::classify(graph, enrollment, next_tier, c), c))
            .collect();
        tiered.sort_by(|(pa, a), (pb, b)| {
            pa.cmp(pb)
                .then_with(|| a.semester_tier.cmp(&b.semester_tier))
                .then_with(|| graph.position(&a.id).cmp(&graph.position(&b.id)))
        });

        let next_semester = tiered
            .iter()
            .filter(|(p, _)| *p != Priority::Low)
            .map(|(_, c)| c.semester_tier)
            .min()
            .or_else(|| tiered.iter().map(|(_, c)| c.semester_tier).min());

        let mut buckets: Vec<Recommendation> = Vec::new();
        for priority in [Priority::High, Priority::Medium, Priority::Low] {
            let courses: Vec<Course> = tiered
                .iter()
                .filter(|(p, _)| *p == priority)
                .map(|(_, c)| (*c).clone())
                .collect();
            if courses.is_empty() {
                continue;
            }
            let (title, description) = Self::bucket_text(priority, next_tier);
            buckets.push(Recommendation { priority, title, description, courses });
        }

        debug!(
            available = available.len(),
            buckets = buckets.len(),
            next_semester = ?next_semester,
            "recommendations computed"
        );

        RecommendationReport {
            buckets,
            next_semester,
            curriculum_complete: false,
        }
    }
}
