//! Pan and zoom state machine for the graph view.
//!
//! ```text
//! Idle -> Dragging -> Idle                 (pointer press / move / release)
//! Idle -> TouchPanning <-> Pinching -> Idle (one or two touch points)
//! ```
//!
//! Wheel, trackpad and button zoom events are discrete and never leave the
//! current state. Every event yields a [`ViewportOutcome`], including an
//! explicit reason when the event is ignored.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Viewport limits and input scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportConfig {
    /// Smallest zoom factor
    pub min_zoom: f64,
    /// Largest zoom factor
    pub max_zoom: f64,
    /// Zoom change per button press
    pub zoom_step: f64,
    /// Factor applied to trackpad scroll deltas
    pub trackpad_damping: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 3.0,
            zoom_step: 0.1,
            trackpad_damping: 0.5,
        }
    }
}

impl ViewportConfig {
    /// Check zoom bounds and scaling factors.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            return Err(format!("minZoom must be positive, got {}", self.min_zoom));
        }
        if !(self.max_zoom.is_finite() && self.min_zoom <= self.max_zoom) {
            return Err(format!(
                "maxZoom ({}) must not be below minZoom ({})",
                self.max_zoom, self.min_zoom
            ));
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 0.0) {
            return Err(format!("zoomStep must be positive, got {}", self.zoom_step));
        }
        if !(self.trackpad_damping.is_finite() && self.trackpad_damping > 0.0) {
            return Err(format!("trackpadDamping must be positive, got {}", self.trackpad_damping));
        }
        Ok(())
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

/// A position in screen space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Current zoom and pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportTransform {
    /// Zoom factor
    pub zoom: f64,
    /// Horizontal pan
    pub pan_x: f64,
    /// Vertical pan
    pub pan_y: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

/// Gesture in progress. Dragging and pinching cannot overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GestureState {
    /// No gesture
    #[default]
    Idle,
    /// Pointer pressed on empty canvas
    Dragging {
        /// Last pointer position
        last: Point,
    },
    /// One touch point down
    TouchPanning {
        /// Last touch position
        last: Point,
    },
    /// Two touch points down
    Pinching {
        /// Distance between the touch points at the last event
        last_distance: f64,
    },
}

/// Input delivered to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewportEvent {
    /// Pointer button pressed
    PointerDown {
        /// Pointer position
        position: Point,
        /// Whether the press landed on a course node
        on_node: bool,
    },
    /// Pointer moved
    PointerMove {
        /// Pointer position
        position: Point,
    },
    /// Pointer button released
    PointerUp,
    /// Pointer left the view
    PointerLeave,
    /// Wheel or trackpad scroll
    Wheel {
        /// Horizontal delta, non-zero only for trackpads
        delta_x: f64,
        /// Vertical delta
        delta_y: f64,
        /// Whether a modifier key is held
        modifier: bool,
    },
    /// Touch points went down
    TouchStart {
        /// Active touch points
        touches: Vec<Point>,
    },
    /// Touch points moved
    TouchMove {
        /// Active touch points
        touches: Vec<Point>,
    },
    /// Touch points lifted
    TouchEnd {
        /// Touch points still down
        touches: Vec<Point>,
    },
    /// Zoom-in button
    ZoomIn,
    /// Zoom-out button
    ZoomOut,
    /// Reset button
    Reset,
}

/// Why an event did not change anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Press started on a node; nodes handle their own clicks
    PointerOnNode,
    /// Move or release without a matching gesture
    NoActiveGesture,
    /// Another gesture already owns the input
    GestureInProgress,
    /// Pinch started with coincident touch points
    ZeroDistance,
    /// Zoom already at its bound
    ZoomAtLimit,
    /// Scroll or move with no displacement
    EmptyDelta,
    /// Touch event with an unsupported number of points
    UnsupportedTouchCount,
}

/// Effect of one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ViewportOutcome {
    /// Pan changed
    Panned {
        /// Horizontal change
        dx: f64,
        /// Vertical change
        dy: f64,
    },
    /// Zoom changed
    Zoomed {
        /// New zoom factor
        zoom: f64,
    },
    /// A gesture began
    GestureStarted,
    /// A gesture finished
    GestureEnded,
    /// Transform restored to identity
    Reset,
    /// Nothing happened
    Ignored {
        /// Why
        reason: IgnoreReason,
    },
}

impl ViewportOutcome {
    fn ignored(reason: IgnoreReason) -> Self {
        Self::Ignored { reason }
    }
}

/// Owns the transform and the gesture state of one view.
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    config: ViewportConfig,
    transform: ViewportTransform,
    state: GestureState,
}

impl ViewportController {
    /// Create a controller at the identity transform.
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Current transform.
    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    /// Current gesture state.
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Back to identity, dropping any gesture.
    pub fn reset(&mut self) {
        self.transform = ViewportTransform::default();
        self.state = GestureState::Idle;
    }

    /// Process one event to completion.
    pub fn handle(&mut self, event: &ViewportEvent) -> ViewportOutcome {
        let outcome = match event {
            ViewportEvent::PointerDown { position, on_node } => self.pointer_down(*position, *on_node),
            ViewportEvent::PointerMove { position } => self.pointer_move(*position),
            ViewportEvent::PointerUp | ViewportEvent::PointerLeave => self.pointer_up(),
            ViewportEvent::Wheel {
                delta_x,
                delta_y,
                modifier,
            } => self.wheel(*delta_x, *delta_y, *modifier),
            ViewportEvent::TouchStart { touches } => self.touch_start(touches),
            ViewportEvent::TouchMove { touches } => self.touch_move(touches),
            ViewportEvent::TouchEnd { touches } => self.touch_end(touches),
            ViewportEvent::ZoomIn => self.zoom_to(self.transform.zoom + self.config.zoom_step),
            ViewportEvent::ZoomOut => self.zoom_to(self.transform.zoom - self.config.zoom_step),
            ViewportEvent::Reset => {
                self.reset();
                ViewportOutcome::Reset
            }
        };
        trace!(?event, ?outcome, state = ?self.state, "viewport event");
        outcome
    }

    fn pointer_down(&mut self, position: Point, on_node: bool) -> ViewportOutcome {
        if on_node {
            return ViewportOutcome::ignored(IgnoreReason::PointerOnNode);
        }
        match self.state {
            GestureState::Idle => {
                self.state = GestureState::Dragging { last: position };
                ViewportOutcome::GestureStarted
            }
            _ => ViewportOutcome::ignored(IgnoreReason::GestureInProgress),
        }
    }

    fn pointer_move(&mut self, position: Point) -> ViewportOutcome {
        match self.state {
            GestureState::Dragging { last } => {
                self.state = GestureState::Dragging { last: position };
                self.pan_by(position.x - last.x, position.y - last.y)
            }
            _ => ViewportOutcome::ignored(IgnoreReason::NoActiveGesture),
        }
    }

    fn pointer_up(&mut self) -> ViewportOutcome {
        match self.state {
            GestureState::Dragging { .. } => {
                self.state = GestureState::Idle;
                ViewportOutcome::GestureEnded
            }
            _ => ViewportOutcome::ignored(IgnoreReason::NoActiveGesture),
        }
    }

    fn wheel(&mut self, delta_x: f64, delta_y: f64, modifier: bool) -> ViewportOutcome {
        if delta_x != 0.0 {
            // Trackpads report both axes.
            let damping = self.config.trackpad_damping;
            self.pan_by(-delta_x * damping, -delta_y * damping)
        } else if modifier {
            self.pan_by(-delta_y, 0.0)
        } else {
            self.pan_by(0.0, -delta_y)
        }
    }

    fn touch_start(&mut self, touches: &[Point]) -> ViewportOutcome {
        if matches!(self.state, GestureState::Dragging { .. }) {
            return ViewportOutcome::ignored(IgnoreReason::GestureInProgress);
        }
        match touches {
            [one] => {
                self.state = GestureState::TouchPanning { last: *one };
                ViewportOutcome::GestureStarted
            }
            [a, b] => {
                self.state = GestureState::Pinching {
                    last_distance: a.distance_to(*b),
                };
                ViewportOutcome::GestureStarted
            }
            _ => ViewportOutcome::ignored(IgnoreReason::UnsupportedTouchCount),
        }
    }

    fn touch_move(&mut self, touches: &[Point]) -> ViewportOutcome {
        match (self.state, touches) {
            (GestureState::Pinching { last_distance }, [a, b]) => {
                let distance = a.distance_to(*b);
                self.state = GestureState::Pinching { last_distance: distance };
                if last_distance <= 0.0 || !last_distance.is_finite() {
                    return ViewportOutcome::ignored(IgnoreReason::ZeroDistance);
                }
                self.zoom_to(self.transform.zoom * (distance / last_distance))
            }
            (GestureState::TouchPanning { last }, [one]) => {
                self.state = GestureState::TouchPanning { last: *one };
                self.pan_by(one.x - last.x, one.y - last.y)
            }
            // A finger lifted without a touch-end: continue as a pan.
            (GestureState::Pinching { .. }, [one]) => {
                self.state = GestureState::TouchPanning { last: *one };
                ViewportOutcome::GestureStarted
            }
            (GestureState::TouchPanning { .. }, [a, b]) => {
                self.state = GestureState::Pinching {
                    last_distance: a.distance_to(*b),
                };
                ViewportOutcome::GestureStarted
            }
            (GestureState::Idle | GestureState::Dragging { .. }, _) => {
                ViewportOutcome::ignored(IgnoreReason::NoActiveGesture)
            }
            _ => ViewportOutcome::ignored(IgnoreReason::UnsupportedTouchCount),
        }
    }

    fn touch_end(&mut self, remaining: &[Point]) -> ViewportOutcome {
        match (self.state, remaining) {
            (GestureState::Pinching { .. } | GestureState::TouchPanning { .. }, []) => {
                self.state = GestureState::Idle;
                ViewportOutcome::GestureEnded
            }
            (GestureState::Pinching { .. }, [one]) => {
                self.state = GestureState::TouchPanning { last: *one };
                ViewportOutcome::GestureStarted
            }
            (GestureState::TouchPanning { .. } | GestureState::Pinching { .. }, _) => {
                ViewportOutcome::ignored(IgnoreReason::UnsupportedTouchCount)
            }
            (GestureState::Idle | GestureState::Dragging { .. }, _) => {
                ViewportOutcome::ignored(IgnoreReason::NoActiveGesture)
            }
        }
    }

    fn pan_by(&mut self, dx: f64, dy: f64) -> ViewportOutcome {
        if !(dx.is_finite() && dy.is_finite()) || (dx == 0.0 && dy == 0.0) {
            return ViewportOutcome::ignored(IgnoreReason::EmptyDelta);
        }
        self.transform.pan_x += dx;
        self.transform.pan_y += dy;
        ViewportOutcome::Panned { dx, dy }
    }

    fn zoom_to(&mut self, zoom: f64) -> ViewportOutcome {
        if !zoom.is_finite() {
            return ViewportOutcome::ignored(IgnoreReason::EmptyDelta);
        }
        let clamped = self.config.clamp_zoom(zoom);
        if clamped == self.transform.zoom {
            return ViewportOutcome::ignored(IgnoreReason::ZoomAtLimit);
        }
        self.transform.zoom = clamped;
        ViewportOutcome::Zoomed { zoom: clamped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn controller() -> ViewportController {
        ViewportController::new(ViewportConfig::default())
    }

    fn down(x: f64, y: f64) -> ViewportEvent {
        ViewportEvent::PointerDown {
            position: Point::new(x, y),
            on_node: false,
        }
    }

    fn moved(x: f64, y: f64) -> ViewportEvent {
        ViewportEvent::PointerMove {
            position: Point::new(x, y),
        }
    }

    fn touches(points: &[(f64, f64)]) -> Vec<Point> {
        points.iter().map(|(x, y)| Point::new(*x, *y)).collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_drag_pan() {
        let mut vp = controller();
        assert_eq!(vp.handle(&down(10.0, 10.0)), ViewportOutcome::GestureStarted);
        assert_eq!(vp.handle(&moved(15.0, 7.0)), ViewportOutcome::Panned { dx: 5.0, dy: -3.0 });
        assert_eq!(vp.handle(&moved(20.0, 7.0)), ViewportOutcome::Panned { dx: 5.0, dy: 0.0 });
        assert_eq!(vp.handle(&ViewportEvent::PointerUp), ViewportOutcome::GestureEnded);

        let t = vp.transform();
        assert_eq!((t.pan_x, t.pan_y), (10.0, -3.0));
        assert_eq!(vp.state(), GestureState::Idle);

        // Moves after release do nothing.
        assert_eq!(
            vp.handle(&moved(50.0, 50.0)),
            ViewportOutcome::Ignored { reason: IgnoreReason::NoActiveGesture }
        );
    }

    #[test]
    fn test_drag_on_node_ignored() {
        let mut vp = controller();
        let outcome = vp.handle(&ViewportEvent::PointerDown {
            position: Point::new(1.0, 1.0),
            on_node: true,
        });
        assert_eq!(outcome, ViewportOutcome::Ignored { reason: IgnoreReason::PointerOnNode });
        assert_eq!(vp.state(), GestureState::Idle);
    }

    #[test]
    fn test_pointer_leave_ends_drag() {
        let mut vp = controller();
        vp.handle(&down(0.0, 0.0));
        assert_eq!(vp.handle(&ViewportEvent::PointerLeave), ViewportOutcome::GestureEnded);
        assert_eq!(vp.state(), GestureState::Idle);
    }

    #[test]
    fn test_mouse_wheel() {
        let mut vp = controller();
        vp.handle(&ViewportEvent::Wheel { delta_x: 0.0, delta_y: 40.0, modifier: false });
        assert_eq!(vp.transform().pan_y, -40.0);

        vp.handle(&ViewportEvent::Wheel { delta_x: 0.0, delta_y: 40.0, modifier: true });
        assert_eq!(vp.transform().pan_x, -40.0);
        assert_eq!(vp.transform().pan_y, -40.0);
    }

    #[test]
    fn test_trackpad_scroll_is_damped() {
        let mut vp = controller();
        let outcome = vp.handle(&ViewportEvent::Wheel { delta_x: 10.0, delta_y: -20.0, modifier: false });
        assert_eq!(outcome, ViewportOutcome::Panned { dx: -5.0, dy: 10.0 });
    }

    #[test]
    fn test_empty_wheel_ignored() {
        let mut vp = controller();
        let outcome = vp.handle(&ViewportEvent::Wheel { delta_x: 0.0, delta_y: 0.0, modifier: false });
        assert_eq!(outcome, ViewportOutcome::Ignored { reason: IgnoreReason::EmptyDelta });
    }

    #[test]
    fn test_button_zoom_clamped() {
        let mut vp = controller();
        assert_eq!(vp.handle(&ViewportEvent::ZoomIn), ViewportOutcome::Zoomed { zoom: 1.1 });
        for _ in 0..40 {
            vp.handle(&ViewportEvent::ZoomIn);
        }
        assert_eq!(vp.transform().zoom, 3.0);
        assert_eq!(
            vp.handle(&ViewportEvent::ZoomIn),
            ViewportOutcome::Ignored { reason: IgnoreReason::ZoomAtLimit }
        );

        for _ in 0..60 {
            vp.handle(&ViewportEvent::ZoomOut);
        }
        assert_eq!(vp.transform().zoom, 0.5);
    }

    #[test]
    fn test_pinch_zoom() {
        let mut vp = controller();
        vp.handle(&ViewportEvent::TouchStart { touches: touches(&[(0.0, 0.0), (100.0, 0.0)]) });
        assert_eq!(vp.state(), GestureState::Pinching { last_distance: 100.0 });

        vp.handle(&ViewportEvent::TouchMove { touches: touches(&[(0.0, 0.0), (150.0, 0.0)]) });
        assert_close(vp.transform().zoom, 1.5);

        vp.handle(&ViewportEvent::TouchMove { touches: touches(&[(0.0, 0.0), (300.0, 0.0)]) });
        assert_close(vp.transform().zoom, 3.0);

        // Spreading further stays clamped.
        vp.handle(&ViewportEvent::TouchMove { touches: touches(&[(0.0, 0.0), (3000.0, 0.0)]) });
        assert_eq!(vp.transform().zoom, 3.0);
    }

    #[test]
    fn test_pinch_from_zero_distance_ignored() {
        let mut vp = controller();
        vp.handle(&ViewportEvent::TouchStart { touches: touches(&[(5.0, 5.0), (5.0, 5.0)]) });
        let outcome = vp.handle(&ViewportEvent::TouchMove { touches: touches(&[(0.0, 0.0), (80.0, 0.0)]) });
        assert_eq!(outcome, ViewportOutcome::Ignored { reason: IgnoreReason::ZeroDistance });
        assert_eq!(vp.transform().zoom, 1.0);

        // The next move has a usable baseline.
        vp.handle(&ViewportEvent::TouchMove { touches: touches(&[(0.0, 0.0), (40.0, 0.0)]) });
        assert_close(vp.transform().zoom, 0.5);
    }

    #[test]
    fn test_lifting_one_finger_switches_to_pan() {
        let mut vp = controller();
        vp.handle(&ViewportEvent::TouchStart { touches: touches(&[(0.0, 0.0), (100.0, 0.0)]) });
        assert_eq!(
            vp.handle(&ViewportEvent::TouchEnd { touches: touches(&[(100.0, 0.0)]) }),
            ViewportOutcome::GestureStarted
        );
        assert_eq!(vp.state(), GestureState::TouchPanning { last: Point::new(100.0, 0.0) });

        assert_eq!(
            vp.handle(&ViewportEvent::TouchMove { touches: touches(&[(110.0, 20.0)]) }),
            ViewportOutcome::Panned { dx: 10.0, dy: 20.0 }
        );
        assert_eq!(vp.transform().zoom, 1.0);

        assert_eq!(
            vp.handle(&ViewportEvent::TouchEnd { touches: Vec::new() }),
            ViewportOutcome::GestureEnded
        );
        assert_eq!(vp.state(), GestureState::Idle);
    }

    #[test]
    fn test_drag_and_pinch_do_not_overlap() {
        let mut vp = controller();
        vp.handle(&down(0.0, 0.0));
        let outcome = vp.handle(&ViewportEvent::TouchStart { touches: touches(&[(0.0, 0.0), (10.0, 0.0)]) });
        assert_eq!(outcome, ViewportOutcome::Ignored { reason: IgnoreReason::GestureInProgress });
        assert!(matches!(vp.state(), GestureState::Dragging { .. }));

        let mut vp = controller();
        vp.handle(&ViewportEvent::TouchStart { touches: touches(&[(0.0, 0.0), (10.0, 0.0)]) });
        let outcome = vp.handle(&down(0.0, 0.0));
        assert_eq!(outcome, ViewportOutcome::Ignored { reason: IgnoreReason::GestureInProgress });
    }

    #[test]
    fn test_reset() {
        let mut vp = controller();
        vp.handle(&ViewportEvent::ZoomIn);
        vp.handle(&down(0.0, 0.0));
        vp.handle(&moved(30.0, 30.0));
        assert_eq!(vp.handle(&ViewportEvent::Reset), ViewportOutcome::Reset);
        assert_eq!(vp.transform(), ViewportTransform::default());
        assert_eq!(vp.state(), GestureState::Idle);
    }

    #[test]
    fn test_config_validation() {
        assert!(ViewportConfig::default().validate().is_ok());
        let inverted = ViewportConfig { min_zoom: 2.0, max_zoom: 1.0, ..Default::default() };
        assert!(inverted.validate().is_err());
        let zero = ViewportConfig { min_zoom: 0.0, ..Default::default() };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_event_json_shape() {
        let event: ViewportEvent =
            serde_json::from_str(r#"{"event":"wheel","delta_x":0.0,"delta_y":12.0,"modifier":false}"#).unwrap();
        assert_eq!(event, ViewportEvent::Wheel { delta_x: 0.0, delta_y: 12.0, modifier: false });
    }

    fn arb_point() -> impl Strategy<Value = Point> {
        (-1e6f64..1e6, -1e6f64..1e6).prop_map(|(x, y)| Point::new(x, y))
    }

    fn arb_event() -> impl Strategy<Value = ViewportEvent> {
        prop_oneof![
            (arb_point(), any::<bool>()).prop_map(|(position, on_node)| ViewportEvent::PointerDown { position, on_node }),
            arb_point().prop_map(|position| ViewportEvent::PointerMove { position }),
            Just(ViewportEvent::PointerUp),
            (-1e4f64..1e4, -1e4f64..1e4, any::<bool>())
                .prop_map(|(delta_x, delta_y, modifier)| ViewportEvent::Wheel { delta_x, delta_y, modifier }),
            proptest::collection::vec(arb_point(), 0..3).prop_map(|touches| ViewportEvent::TouchStart { touches }),
            proptest::collection::vec(arb_point(), 0..3).prop_map(|touches| ViewportEvent::TouchMove { touches }),
            proptest::collection::vec(arb_point(), 0..2).prop_map(|touches| ViewportEvent::TouchEnd { touches }),
            Just(ViewportEvent::ZoomIn),
            Just(ViewportEvent::ZoomOut),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            .. ProptestConfig::default()
        })]

        /// PROPERTY: zoom stays within bounds under any event sequence.
        #[test]
        fn property_zoom_always_clamped(events in proptest::collection::vec(arb_event(), 1..64)) {
            let mut vp = controller();
            for event in &events {
                vp.handle(event);
                let zoom = vp.transform().zoom;
                prop_assert!((0.5..=3.0).contains(&zoom), "zoom {} out of range", zoom);
            }
        }
    }
}
