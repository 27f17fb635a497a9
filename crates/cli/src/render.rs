//! Plain-text rendering for `--text`.

use pensum_core::CurriculumGraph;
use pensum_layout::GraphLayout;
use pensum_planner::{EligibilitySet, RecommendationReport};
use pensum_progress::{BlockerAnalysis, CompletionEstimate, Stats};

/// Format an optional grade.
fn grade(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |g| format!("{g:.2}"))
}

pub fn check(program: &str, graph: &CurriculumGraph) -> String {
    let mut out = format!("{program}: {} courses, {} credits\n", graph.len(), graph.total_credits());
    for (tier, courses) in graph.courses_by_semester() {
        let credits: u32 = courses.iter().map(|c| c.credits).sum();
        out.push_str(&format!("  {tier}: {} courses, {credits} credits\n", courses.len()));
    }
    out
}

pub fn available(graph: &CurriculumGraph, set: &EligibilitySet) -> String {
    if set.is_empty() {
        return "No courses available.\n".to_string();
    }
    let mut out = format!("Available ({})\n", set.len());
    for course in set.iter().filter_map(|id| graph.course(id)) {
        out.push_str(&format!(
            "  {} | {} | {} | {} cr\n",
            course.semester_tier, course.code, course.name, course.credits
        ));
    }
    out
}

pub fn stats(stats: &Stats) -> String {
    let mut out = format!(
        "Progress: {}% ({}/{} credits, {} in progress)\n\
         Average: {}  Weighted: {}\n",
        stats.progress_display(),
        stats.credits_approved,
        stats.total_credits,
        stats.credits_in_progress,
        grade(stats.average_grade),
        grade(stats.weighted_average)
    );
    for s in &stats.semesters {
        out.push_str(&format!(
            "  {}: {}/{} credits, {} courses, avg {}\n",
            s.tier,
            s.credits_approved,
            s.credits,
            s.course_count,
            grade(s.average_grade)
        ));
    }
    out
}

pub fn recommendations(report: &RecommendationReport) -> String {
    if report.curriculum_complete {
        return "Curriculum complete: nothing left to register.\n".to_string();
    }
    let mut out = report
        .next_semester
        .map(|tier| format!("Suggested next semester: {tier}\n"))
        .unwrap_or_default();
    for bucket in &report.buckets {
        out.push_str(&format!("[{}] {}\n  {}\n", bucket.priority.as_str(), bucket.title, bucket.description));
        for course in &bucket.courses {
            out.push_str(&format!("    {} {} ({})\n", course.code, course.name, course.semester_tier));
        }
    }
    out
}

pub fn blockers(analysis: &BlockerAnalysis) -> String {
    let mut out = format!("Blocked courses: {}\n", analysis.stats.total_blocked);
    for blocked in &analysis.blocked {
        let unmet: Vec<String> = blocked.unmet.iter().map(ToString::to_string).collect();
        out.push_str(&format!("  {} ({}) needs {}\n", blocked.course_id, blocked.tier, unmet.join(", ")));
    }
    if !analysis.bottlenecks.is_empty() {
        out.push_str("Bottlenecks:\n");
        for b in &analysis.bottlenecks {
            out.push_str(&format!("  {} gates {}\n", b.course_id, b.gated));
        }
    }
    out
}

pub fn estimate(estimate: &CompletionEstimate) -> String {
    let path: Vec<&str> = estimate.critical_path.iter().map(|id| id.as_str()).collect();
    format!(
        "Remaining: {} courses, {} credits\n\
         Estimated semesters: {} (prerequisite chain {}, credit load {})\n\
         Critical path: {}\n",
        estimate.remaining_courses,
        estimate.remaining_credits,
        estimate.estimated_semesters,
        estimate.critical_path_semesters,
        estimate.credit_bound_semesters,
        if path.is_empty() { "-".to_string() } else { path.join(" -> ") },
    )
}

pub fn layout(layout: &GraphLayout) -> String {
    let mut out = format!(
        "Canvas {}x{}, {} nodes, {} edges\n",
        layout.width,
        layout.height,
        layout.nodes.len(),
        layout.edges.len()
    );
    for column in &layout.columns {
        out.push_str(&format!("{}:\n", column.tier));
        let mut nodes: Vec<_> = layout.nodes.iter().filter(|n| n.column == column.index).collect();
        nodes.sort_by_key(|n| n.row);
        for node in nodes {
            out.push_str(&format!("  {:>3} {} {:?}\n", node.row, node.course_id, node.state));
        }
    }
    out
}
