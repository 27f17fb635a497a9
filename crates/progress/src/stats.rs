//! Academic progress statistics.

use pensum_core::{Course, CurriculumGraph, EnrollmentSnapshot, EnrollmentState, SemesterTier};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Course counts per enrollment state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateCounts {
    /// Never touched, or explicitly not taken
    pub not_taken: usize,
    /// Currently enrolled
    pub in_progress: usize,
    /// Passed
    pub approved: usize,
    /// Failed on last attempt
    pub failed: usize,
    /// Withdrawn
    pub withdrawn: usize,
}

impl StateCounts {
    /// Count one course in the given state.
    pub fn add(&mut self, state: EnrollmentState) {
        match state {
            EnrollmentState::NotTaken => self.not_taken += 1,
            EnrollmentState::InProgress => self.in_progress += 1,
            EnrollmentState::Approved => self.approved += 1,
            EnrollmentState::Failed => self.failed += 1,
            EnrollmentState::Withdrawn => self.withdrawn += 1,
        }
    }

    /// Count for one state.
    pub fn get(&self, state: EnrollmentState) -> usize {
        match state {
            EnrollmentState::NotTaken => self.not_taken,
            EnrollmentState::InProgress => self.in_progress,
            EnrollmentState::Approved => self.approved,
            EnrollmentState::Failed => self.failed,
            EnrollmentState::Withdrawn => self.withdrawn,
        }
    }

    /// Sum over all states.
    pub fn total(&self) -> usize {
        self.not_taken + self.in_progress + self.approved + self.failed + self.withdrawn
    }
}

/// Statistics of one semester tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterStats {
    /// Tier
    pub tier: SemesterTier,
    /// Courses in the tier
    pub course_count: usize,
    /// Credits in the tier
    pub credits: u32,
    /// Approved credits in the tier
    pub credits_approved: u32,
    /// Course counts per state
    pub by_state: StateCounts,
    /// Mean grade over approved and failed courses with a grade
    pub average_grade: Option<f64>,
    /// Weekly theory hours
    pub theory_hours: u32,
    /// Weekly practice hours
    pub practice_hours: u32,
}

/// Aggregate statistics for one student over one curriculum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Courses in the curriculum
    pub total_courses: usize,
    /// Course counts per state
    pub by_state: StateCounts,
    /// Approved credits
    pub credits_approved: u32,
    /// Credits currently being taken
    pub credits_in_progress: u32,
    /// Credits of the whole curriculum
    pub total_credits: u32,
    /// `credits_approved / total_credits * 100`, 0 for an empty curriculum
    pub progress_percentage: f64,
    /// Mean grade over all evaluated attempts
    pub average_grade: Option<f64>,
    /// Credit-weighted mean grade over all evaluated attempts
    pub weighted_average: Option<f64>,
    /// Per-tier breakdown, ascending
    pub semesters: Vec<SemesterStats>,
}

impl Stats {
    /// Progress rounded for display, e.g. `"42.9"`.
    pub fn progress_display(&self) -> String {
        format!("{:.1}", self.progress_percentage)
    }

    /// Statistics of one tier.
    pub fn semester(&self, tier: SemesterTier) -> Option<&SemesterStats> {
        self.semesters.iter().find(|s| s.tier == tier)
    }
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            total_courses: 0,
            by_state: StateCounts::default(),
            credits_approved: 0,
            credits_in_progress: 0,
            total_credits: 0,
            progress_percentage: 0.0,
            average_grade: None,
            weighted_average: None,
            semesters: Vec::new(),
        }
    }
}

/// Statistics aggregation service.
pub trait StatsAggregator: Send + Sync {
    /// Compute statistics for one student.
    fn aggregate(&self, graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> Stats;
}

/// Basic aggregator: recomputes everything from the two snapshots on each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAggregator;

impl BasicAggregator {
    /// Create a new aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Grade of a course attempt, counted only for approved and failed courses.
    fn graded<'a>(
        enrollment: &EnrollmentSnapshot,
        course: &'a Course,
    ) -> Option<(&'a Course, f64)> {
        enrollment
            .record(&course.id)
            .and_then(|r| r.effective_grade())
            .map(|g| (course, g))
    }

    fn mean(grades: &[f64]) -> Option<f64> {
        if grades.is_empty() {
            None
        } else {
            Some(grades.iter().sum::<f64>() / grades.len() as f64)
        }
    }

    fn semester_stats(
        tier: SemesterTier,
        courses: &[&Course],
        enrollment: &EnrollmentSnapshot,
    ) -> SemesterStats {
        let mut by_state = StateCounts::default();
        let mut credits_approved = 0;
        for course in courses {
            let state = enrollment.state_of(&course.id);
            by_state.add(state);
            if state == EnrollmentState::Approved {
                credits_approved += course.credits;
            }
        }

        let grades: Vec<f64> = courses
            .iter()
            .filter_map(|c| Self::graded(enrollment, c))
            .map(|(_, g)| g)
            .collect();

        SemesterStats {
            tier,
            course_count: courses.len(),
            credits: courses.iter().map(|c| c.credits).sum(),
            credits_approved,
            by_state,
            average_grade: Self::mean(&grades),
            theory_hours: courses.iter().map(|c| c.theory_hours).sum(),
            practice_hours: courses.iter().map(|c| c.practice_hours).sum(),
        }
    }
}

impl StatsAggregator for BasicAggregator {
    fn aggregate(&self, graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> Stats {
        if graph.is_empty() {
            return Stats::default();
        }

        let semesters: Vec<SemesterStats> = graph
            .courses_by_semester()
            .into_iter()
            .map(|(tier, courses)| Self::semester_stats(tier, &courses, enrollment))
            .collect();

        let mut by_state = StateCounts::default();
        let mut credits_approved = 0;
        let mut credits_in_progress = 0;
        for course in graph.courses() {
            let state = enrollment.state_of(&course.id);
            by_state.add(state);
            match state {
                EnrollmentState::Approved => credits_approved += course.credits,
                EnrollmentState::InProgress => credits_in_progress += course.credits,
                _ => {}
            }
        }

        let total_credits = graph.total_credits();
        let progress_percentage = if total_credits > 0 {
            (credits_approved as f64 / total_credits as f64 * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        let graded: Vec<(&Course, f64)> = graph
            .courses()
            .iter()
            .filter_map(|c| Self::graded(enrollment, c))
            .collect();
        let grades: Vec<f64> = graded.iter().map(|(_, g)| *g).collect();
        let graded_credits: u32 = graded.iter().map(|(c, _)| c.credits).sum();
        let weighted_average = (graded_credits > 0).then(|| {
            graded.iter().map(|(c, g)| c.credits as f64 * g).sum::<f64>() / graded_credits as f64
        });

        debug!(
            courses = graph.len(),
            approved = by_state.approved,
            progress = progress_percentage,
            "statistics aggregated"
        );

        Stats {
            total_courses: graph.len(),
            by_state,
            credits_approved,
            credits_in_progress,
            total_credits,
            progress_percentage,
            average_grade: Self::mean(&grades),
            weighted_average,
            semesters,
        }
    }
}

/// Compute statistics with the basic aggregator.
pub fn aggregate(graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> Stats {
    BasicAggregator::new().aggregate(graph, enrollment)
}
