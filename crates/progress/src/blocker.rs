//! Blocker detection.
//!
//! This module answers two questions about a student's history:
//! - which courses are locked, and by which unmet prerequisites
//! - which pending courses gate the most of the rest of the program

use pensum_core::{
    CourseId, CurriculumGraph, EnrollmentSnapshot, EnrollmentState, Prerequisite, SemesterTier,
};
use pensum_planner::{EligibilityResolver, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A course that cannot be registered yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedCourse {
    /// Locked course
    pub course_id: CourseId,
    /// Its tier
    pub tier: SemesterTier,
    /// Unmet prerequisites, in declaration order
    pub unmet: Vec<Prerequisite>,
}

/// A pending course ranked by how much of the program waits on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    /// Pending course
    pub course_id: CourseId,
    /// Not-yet-approved courses that depend on it, directly or transitively
    pub gated: usize,
}

/// Blocker statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockerStats {
    /// Locked courses
    pub total_blocked: usize,
    /// Locked courses per tier
    pub by_tier: BTreeMap<SemesterTier, usize>,
}

/// Result of blocker analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockerAnalysis {
    /// Locked courses, in declaration order
    pub blocked: Vec<BlockedCourse>,
    /// Pending courses ranked by gated count, descending
    pub bottlenecks: Vec<Bottleneck>,
    /// Summary
    pub stats: BlockerStats,
}

/// Detects what stands between a student and the rest of the program.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockerAnalyzer {
    resolver: EligibilityResolver,
}

impl BlockerAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the full analysis.
    pub fn analyze(&self, graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> BlockerAnalysis {
        let blocked = self.detect_blocked(graph, enrollment);
        let bottlenecks = self.rank_bottlenecks(graph, enrollment);
        let stats = self.calculate_stats(&blocked);

        debug!(
            blocked = stats.total_blocked,
            bottlenecks = bottlenecks.len(),
            "blocker analysis complete"
        );

        BlockerAnalysis { blocked, bottlenecks, stats }
    }

    /// Courses whose prerequisites are not met.
    fn detect_blocked(&self, graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> Vec<BlockedCourse> {
        graph
            .courses()
            .iter()
            .filter_map(|course| match self.resolver.check(graph, enrollment, course) {
                Resolution::Blocked(unmet) => Some(BlockedCourse {
                    course_id: course.id.clone(),
                    tier: course.semester_tier,
                    unmet,
                }),
                Resolution::Available | Resolution::Taken(_) => None,
            })
            .collect()
    }

    /// Pending courses that gate at least one other pending course.
    fn rank_bottlenecks(&self, graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> Vec<Bottleneck> {
        let approved = |id: &CourseId| enrollment.state_of(id) == EnrollmentState::Approved;

        let mut bottlenecks: Vec<Bottleneck> = graph
            .courses()
            .iter()
            .filter(|c| !approved(&c.id))
            .filter_map(|c| {
                let gated = graph
                    .transitive_dependents(&c.id)
                    .into_iter()
                    .filter(|d| !approved(d))
                    .count();
                (gated > 0).then(|| Bottleneck { course_id: c.id.clone(), gated })
            })
            .collect();

        // Stable: ties keep declaration order.
        bottlenecks.sort_by(|a, b| b.gated.cmp(&a.gated));
        bottlenecks
    }

    /// Calculate blocker statistics.
    fn calculate_stats(&self, blocked: &[BlockedCourse]) -> BlockerStats {
        let mut stats = BlockerStats {
            total_blocked: blocked.len(),
            ..Default::default()
        };
        for course in blocked {
            *stats.by_tier.entry(course.tier).or_insert(0) += 1;
        }
        stats
    }
}
