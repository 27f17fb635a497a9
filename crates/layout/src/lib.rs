//! Dependency graph presentation.
//!
//! [`LayoutEngine`] places courses into semester columns and keeps only the
//! edges between adjacent tiers. [`ViewportController`] owns the pan/zoom
//! state of whatever view renders that layout.

#![warn(missing_docs)]

pub mod layout;
pub mod viewport;

pub use layout::{
    layout_snapshot, GraphLayout, Highlight, LayoutColumn, LayoutConfig, LayoutEdge, LayoutEngine,
    LayoutNode, NodeState,
};
pub use viewport::{
    GestureState, IgnoreReason, Point, ViewportConfig, ViewportController, ViewportEvent,
    ViewportOutcome, ViewportTransform,
};
