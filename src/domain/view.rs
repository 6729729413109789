//! Collapse/zoom/pan state of the rendered map.
//!
//! Pure UI state. It never reads or writes node progress and lives only for
//! one loaded graph.

use std::collections::HashSet;

use tracing::trace;

use crate::domain::arena::TreeArena;
use crate::domain::geometry::Point;

pub const ZOOM_MIN: f64 = 0.4;
pub const ZOOM_MAX: f64 = 1.8;
pub const ZOOM_DEFAULT: f64 = 1.0;
/// Zoom change per keyboard/wheel step
pub const ZOOM_STEP: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    collapsed: HashSet<String>,
    zoom: f64,
    pan: Point,
    initial_pan: Point,
    drag_anchor: Option<Point>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Point::ORIGIN)
    }
}

impl ViewState {
    /// Fresh view centred at `initial_pan`.
    pub fn new(initial_pan: Point) -> Self {
        Self {
            collapsed: HashSet::new(),
            zoom: ZOOM_DEFAULT,
            pan: initial_pan,
            initial_pan,
            drag_anchor: None,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed.contains(id)
    }

    pub fn collapsed(&self) -> &HashSet<String> {
        &self.collapsed
    }

    /// Flip membership of `id` in the collapsed set. Returns the new collapsed state.
    pub fn toggle_collapse(&mut self, id: &str) -> bool {
        let collapsed = if self.collapsed.remove(id) {
            false
        } else {
            self.collapsed.insert(id.to_string());
            true
        };
        trace!("toggle_collapse: {} -> {}", id, collapsed);
        collapsed
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    pub fn collapse_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collapsed = ids.into_iter().map(Into::into).collect();
    }

    /// Add `delta` to the zoom factor, clamped to `[ZOOM_MIN, ZOOM_MAX]`.
    pub fn adjust_zoom(&mut self, delta: f64) -> f64 {
        let target = self.zoom + delta;
        self.zoom = if target.is_nan() {
            self.zoom
        } else {
            target.clamp(ZOOM_MIN, ZOOM_MAX)
        };
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.adjust_zoom(ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.adjust_zoom(-ZOOM_STEP)
    }

    /// Restore zoom 1.0 and the initial centring offset. The collapsed set is kept.
    pub fn reset_view(&mut self) {
        self.zoom = ZOOM_DEFAULT;
        self.pan = self.initial_pan;
        self.drag_anchor = None;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan = Point::new(self.pan.x + dx, self.pan.y + dy);
    }

    /// Pointer down on the canvas.
    pub fn begin_drag(&mut self, pointer: Point) {
        self.drag_anchor = Some(Point::new(pointer.x - self.pan.x, pointer.y - self.pan.y));
    }

    /// Pointer moved while pressed. Ignored when no drag is in progress.
    pub fn drag_to(&mut self, pointer: Point) {
        if let Some(anchor) = self.drag_anchor {
            self.pan = Point::new(pointer.x - anchor.x, pointer.y - anchor.y);
        }
    }

    /// Pointer released.
    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// A node is rendered iff none of its ancestors is collapsed.
    pub fn is_rendered(&self, id: &str, tree: &TreeArena) -> bool {
        tree.contains(id) && !tree.ancestors(id).iter().any(|a| self.collapsed.contains(*a))
    }

    /// Rendered node ids in pre-order, with their depth.
    pub fn rendered_ids(&self, tree: &TreeArena) -> Vec<(String, usize)> {
        let collapsed = self.collapsed.clone();
        tree.iter_pruned(move |id| !collapsed.contains(id))
            .map(|(_, node, depth)| (node.data.id.clone(), depth))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_collapse_flips() {
        let mut view = ViewState::default();
        assert!(view.toggle_collapse("a"));
        assert!(view.is_collapsed("a"));
        assert!(!view.toggle_collapse("a"));
        assert!(!view.is_collapsed("a"));
    }

    #[test]
    fn test_drag_moves_pan_by_pointer_delta() {
        let mut view = ViewState::new(Point::new(10.0, 10.0));
        view.begin_drag(Point::new(100.0, 100.0));
        view.drag_to(Point::new(130.0, 90.0));
        view.end_drag();
        view.drag_to(Point::new(500.0, 500.0));
        assert_eq!(view.pan(), Point::new(40.0, 0.0));
    }

    #[test]
    fn test_nan_delta_keeps_zoom() {
        let mut view = ViewState::default();
        assert_eq!(view.adjust_zoom(f64::NAN), ZOOM_DEFAULT);
    }
}
