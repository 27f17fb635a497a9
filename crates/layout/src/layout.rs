//! Column layout of the prerequisite graph.

use pensum_core::{
    Course, CourseId, CurriculumGraph, EnrollmentSnapshot, EnrollmentState, PrerequisiteKind,
    Result, SemesterTier,
};
use pensum_planner::compute_available;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

// ── Configuration ────────────────────────────────────────────────────

/// Layout spacing parameters (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Horizontal distance between column centers
    pub column_width: f64,
    /// Vertical distance between row centers
    pub row_height: f64,
    /// Space reserved above the first row for tier labels
    pub header_height: f64,
    /// Rendered node box width
    pub node_width: f64,
    /// Rendered node box height
    pub node_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_width: 220.0,
            row_height: 90.0,
            header_height: 60.0,
            node_width: 180.0,
            node_height: 64.0,
        }
    }
}

impl LayoutConfig {
    /// Check that every size is a positive finite number and nodes fit their cells.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let sizes = [
            ("columnWidth", self.column_width),
            ("rowHeight", self.row_height),
            ("nodeWidth", self.node_width),
            ("nodeHeight", self.node_height),
        ];
        for (name, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be a positive number, got {value}"));
            }
        }
        if !(self.header_height.is_finite() && self.header_height >= 0.0) {
            return Err(format!("headerHeight must not be negative, got {}", self.header_height));
        }
        if self.node_width > self.column_width || self.node_height > self.row_height {
            return Err("node box must fit inside its column and row".to_string());
        }
        Ok(())
    }
}

// ── Output ───────────────────────────────────────────────────────────

/// Display state of a node, derived from the student's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeState {
    /// Passed
    Approved,
    /// Currently taking
    InProgress,
    /// Last attempt failed
    Failed,
    /// Can be registered now
    Available,
    /// Prerequisites unmet
    Locked,
}

/// A positioned course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    /// Course
    pub course_id: CourseId,
    /// Column index
    pub column: usize,
    /// Row index within the column
    pub row: usize,
    /// Center x
    pub x: f64,
    /// Center y
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
    /// Display state
    pub state: NodeState,
}

/// A drawn prerequisite link between adjacent tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    /// Prerequisite course
    pub from: CourseId,
    /// Dependent course
    pub to: CourseId,
    /// Link type
    pub kind: PrerequisiteKind,
}

/// One semester column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutColumn {
    /// Tier shown in the column header
    pub tier: SemesterTier,
    /// Column index
    pub index: usize,
    /// Center x
    pub x: f64,
    /// Courses in the column
    pub course_count: usize,
}

/// Complete layout result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLayout {
    /// Nodes, column by column, top to bottom
    pub nodes: Vec<LayoutNode>,
    /// Edges in declaration order of the dependent course
    pub edges: Vec<LayoutEdge>,
    /// Columns, ascending tier
    pub columns: Vec<LayoutColumn>,
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
}

impl GraphLayout {
    /// Find the node for a course.
    pub fn node(&self, id: &CourseId) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| &n.course_id == id)
    }
}

/// Courses related to a hovered node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    /// Hovered course
    pub course_id: CourseId,
    /// Everything it requires, directly or transitively
    pub prerequisites: Vec<CourseId>,
    /// Everything that requires it, directly or transitively
    pub dependents: Vec<CourseId>,
}

// ── Engine ───────────────────────────────────────────────────────────

/// Places courses into semester columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    /// Create an engine with the given spacing.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Spacing in use.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out a validated graph. Enrollment only affects node state.
    pub fn layout(&self, graph: &CurriculumGraph, enrollment: &EnrollmentSnapshot) -> GraphLayout {
        let columns = self.order_columns(graph);
        let available = compute_available(graph, enrollment);

        let cfg = &self.config;
        let mut nodes = Vec::with_capacity(graph.len());
        let mut layout_columns = Vec::with_capacity(columns.len());
        let mut max_rows = 0;

        for (index, (tier, courses)) in columns.iter().enumerate() {
            let x = index as f64 * cfg.column_width + cfg.column_width / 2.0;
            layout_columns.push(LayoutColumn {
                tier: *tier,
                index,
                x,
                course_count: courses.len(),
            });
            max_rows = max_rows.max(courses.len());

            for (row, course) in courses.iter().enumerate() {
                let state = match enrollment.state_of(&course.id) {
                    EnrollmentState::Approved => NodeState::Approved,
                    EnrollmentState::InProgress => NodeState::InProgress,
                    EnrollmentState::Failed => NodeState::Failed,
                    EnrollmentState::NotTaken | EnrollmentState::Withdrawn => {
                        if available.contains(&course.id) {
                            NodeState::Available
                        } else {
                            NodeState::Locked
                        }
                    }
                };
                nodes.push(LayoutNode {
                    course_id: course.id.clone(),
                    column: index,
                    row,
                    x,
                    y: cfg.header_height + row as f64 * cfg.row_height + cfg.row_height / 2.0,
                    width: cfg.node_width,
                    height: cfg.node_height,
                    state,
                });
            }
        }

        let edges = Self::adjacent_edges(graph);

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            columns = layout_columns.len(),
            "layout computed"
        );

        GraphLayout {
            nodes,
            edges,
            columns: layout_columns,
            width: columns.len() as f64 * cfg.column_width,
            height: cfg.header_height + max_rows as f64 * cfg.row_height,
        }
    }

    /// Transitive prerequisites and dependents of a course, for hover emphasis.
    pub fn highlight(graph: &CurriculumGraph, id: &CourseId) -> Option<Highlight> {
        let course = graph.course(id)?;
        Some(Highlight {
            course_id: course.id.clone(),
            prerequisites: graph.transitive_prerequisites(id).into_iter().cloned().collect(),
            dependents: graph.transitive_dependents(id).into_iter().cloned().collect(),
        })
    }

    /// Group by tier and align each column against the one before it.
    fn order_columns<'g>(&self, graph: &'g CurriculumGraph) -> Vec<(SemesterTier, Vec<&'g Course>)> {
        let mut columns: Vec<(SemesterTier, Vec<&Course>)> =
            graph.courses_by_semester().into_iter().collect();

        for i in 1..columns.len() {
            let mut keyed: Vec<(Option<usize>, &Course)> = {
                let (prev_tier, prev_courses) = &columns[i - 1];
                // Only a column one tier earlier counts as preceding.
                if !prev_tier.is_adjacent_to(columns[i].0) {
                    continue;
                }
                let prev_rows: HashMap<&CourseId, usize> = prev_courses
                    .iter()
                    .enumerate()
                    .map(|(row, c)| (&c.id, row))
                    .collect();

                columns[i]
                    .1
                    .iter()
                    .map(|course| {
                        let key = course
                            .mandatory_prerequisites()
                            .find_map(|p| prev_rows.get(p).copied());
                        (key, *course)
                    })
                    .collect()
            };

            // `sort_by_key` is stable; `None` sorts first.
            keyed.sort_by_key(|(key, _)| *key);
            columns[i].1 = keyed.into_iter().map(|(_, c)| c).collect();
        }

        columns
    }

    /// Prerequisite links whose tiers differ by exactly one.
    fn adjacent_edges(graph: &CurriculumGraph) -> Vec<LayoutEdge> {
        let mut edges = Vec::new();
        for course in graph.courses() {
            for (prereq_id, kind) in course.course_prerequisites() {
                let Some(prereq) = graph.course(prereq_id) else {
                    continue;
                };
                if prereq.semester_tier.is_adjacent_to(course.semester_tier) {
                    edges.push(LayoutEdge {
                        from: prereq.id.clone(),
                        to: course.id.clone(),
                        kind,
                    });
                }
            }
        }
        edges
    }
}

/// Validate a snapshot and lay it out in one step.
///
/// A broken snapshot fails exactly as [`CurriculumGraph::load`] does; no
/// partial layout is produced.
pub fn layout_snapshot(
    courses: Vec<Course>,
    enrollment: &EnrollmentSnapshot,
    config: LayoutConfig,
) -> Result<GraphLayout> {
    let graph = CurriculumGraph::load(courses)?;
    Ok(LayoutEngine::new(config).layout(&graph, enrollment))
}
