//! Connector geometry between rendered nodes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{instrument, trace};

use crate::domain::arena::TreeArena;
use crate::domain::view::ViewState;
use crate::domain::{NodeStatus, NodeStore};

/// Share of the dominant-axis distance used as control point offset.
const CURVE_TENSION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Undo a `origin + rect * zoom` transform.
    pub fn unscale(&self, origin: Point, zoom: f64) -> Rect {
        Rect::new(
            (self.x - origin.x) / zoom,
            (self.y - origin.y) / zoom,
            self.width / zoom,
            self.height / zoom,
        )
    }

    /// Midpoint of the side facing `towards`, along the dominant axis.
    fn anchor_facing(&self, towards: Point) -> Point {
        let c = self.center();
        let dx = towards.x - c.x;
        let dy = towards.y - c.y;
        if dx.abs() >= dy.abs() {
            let x = if dx >= 0.0 { self.right() } else { self.x };
            Point::new(x, c.y)
        } else {
            let y = if dy >= 0.0 { self.bottom() } else { self.y };
            Point::new(c.x, y)
        }
    }
}

/// Source of on-screen node positions.
///
/// Returns `None` for nodes that are not mounted or not measurable; their
/// connectors are skipped.
pub trait BoundsSource {
    fn bounds(&self, id: &str) -> Option<Rect>;
}

impl BoundsSource for HashMap<String, Rect> {
    fn bounds(&self, id: &str) -> Option<Rect> {
        self.get(id).copied()
    }
}

/// Smooth curve from a parent's anchor to a child's anchor, in unscaled layout coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub parent_id: String,
    pub child_id: String,
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
    /// Child is available or completed
    pub active: bool,
}

impl Connector {
    /// Cubic S-curve between two anchors; control offset follows the dominant axis.
    pub fn curve(parent_id: &str, child_id: &str, from: Point, to: Point, active: bool) -> Self {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let (ctrl1, ctrl2) = if dx.abs() >= dy.abs() {
            let k = dx * CURVE_TENSION;
            (Point::new(from.x + k, from.y), Point::new(to.x - k, to.y))
        } else {
            let k = dy * CURVE_TENSION;
            (Point::new(from.x, from.y + k), Point::new(to.x, to.y - k))
        };
        Self {
            parent_id: parent_id.to_string(),
            child_id: child_id.to_string(),
            from,
            ctrl1,
            ctrl2,
            to,
            active,
        }
    }

    /// SVG path data (`M ... C ...`).
    pub fn path_data(&self) -> String {
        format!(
            "M {:.1} {:.1} C {:.1} {:.1}, {:.1} {:.1}, {:.1} {:.1}",
            self.from.x,
            self.from.y,
            self.ctrl1.x,
            self.ctrl1.y,
            self.ctrl2.x,
            self.ctrl2.y,
            self.to.x,
            self.to.y
        )
    }
}

/// Connectors for every rendered, measurable parent/child pair.
///
/// `bounds` reports on-screen rectangles of the transformed container; they
/// are mapped back through the view's pan and zoom, so the result does not
/// depend on the current zoom factor.
#[instrument(level = "debug", skip_all)]
pub fn compute_connectors(
    store: &NodeStore,
    tree: &TreeArena,
    view: &ViewState,
    bounds: &dyn BoundsSource,
) -> Vec<Connector> {
    let zoom = view.zoom();
    let origin = view.pan();
    let mut connectors = Vec::new();

    for (id, _) in view.rendered_ids(tree) {
        let Some(parent_id) = tree.parent(&id) else {
            continue;
        };
        if !view.is_rendered(parent_id, tree) {
            continue;
        }
        let (Some(child_rect), Some(parent_rect)) = (bounds.bounds(&id), bounds.bounds(parent_id)) else {
            trace!("connector {} -> {} skipped: not measurable", parent_id, id);
            continue;
        };
        let child_rect = child_rect.unscale(origin, zoom);
        let parent_rect = parent_rect.unscale(origin, zoom);

        let from = parent_rect.anchor_facing(child_rect.center());
        let to = child_rect.anchor_facing(parent_rect.center());
        let active = store
            .get(&id)
            .is_some_and(|n| n.status != NodeStatus::Locked);
        connectors.push(Connector::curve(parent_id, &id, from, to, active));
    }
    connectors
}

/// Settle timer for deferred recomputation.
///
/// Every invalidation restarts the quiet period; [`Debounce::fire`] reports
/// `true` once the period has elapsed since the last invalidation.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl Debounce {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    pub fn invalidate(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    /// True exactly once per settled burst of invalidations.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.delay => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}
