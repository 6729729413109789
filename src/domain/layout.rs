//! Deterministic layout of the rendered hierarchy.
//!
//! Two styles: an indented outline (one row per node) and a radial map (hub
//! in the centre, one ring per depth, angular sectors proportional to the
//! number of visible leaves below each node). Collapsed subtrees are not
//! laid out. Rectangles are in unscaled layout coordinates.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::arena::TreeArena;
use crate::domain::geometry::{BoundsSource, Point, Rect};
use crate::domain::view::ViewState;

pub const NODE_WIDTH: f64 = 200.0;
pub const NODE_HEIGHT: f64 = 40.0;
const MARGIN: f64 = 24.0;
const ROW_HEIGHT: f64 = 56.0;
const INDENT: f64 = 48.0;
const RING_SPACING: f64 = 240.0;

/// Viewport assumed when none is configured, in screen pixels
pub const DEFAULT_VIEWPORT: (f64, f64) = (1280.0, 800.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStyle {
    #[default]
    Indented,
    Radial,
}

impl fmt::Display for LayoutStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutStyle::Indented => write!(f, "indented"),
            LayoutStyle::Radial => write!(f, "radial"),
        }
    }
}

impl FromStr for LayoutStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indented" => Ok(LayoutStyle::Indented),
            "radial" => Ok(LayoutStyle::Radial),
            other => Err(format!("unknown layout style: {other}")),
        }
    }
}

/// Layout rectangles of all rendered nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    rects: HashMap<String, Rect>,
    /// Render order (pre-order)
    order: Vec<String>,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    #[instrument(level = "debug", skip(tree, view))]
    pub fn compute(style: LayoutStyle, tree: &TreeArena, view: &ViewState) -> Self {
        let rendered = view.rendered_ids(tree);
        let rects = match style {
            LayoutStyle::Indented => indented(&rendered),
            LayoutStyle::Radial => radial(&rendered, tree, view),
        };
        let (width, height) = rects.values().fold((0.0_f64, 0.0_f64), |(w, h), r| {
            (w.max(r.right() + MARGIN), h.max(r.bottom() + MARGIN))
        });
        Self {
            rects,
            order: rendered.into_iter().map(|(id, _)| id).collect(),
            width,
            height,
        }
    }

    /// Pan that centres the whole layout in a `width` x `height` viewport at zoom 1.
    pub fn centring_offset(&self, width: f64, height: f64) -> Point {
        Point::new((width - self.width) / 2.0, (height - self.height) / 2.0)
    }

    pub fn rect(&self, id: &str) -> Option<Rect> {
        self.rects.get(id).copied()
    }

    /// Rendered ids in pre-order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn indented(rendered: &[(String, usize)]) -> HashMap<String, Rect> {
    rendered
        .iter()
        .enumerate()
        .map(|(row, (id, depth))| {
            let rect = Rect::new(
                MARGIN + *depth as f64 * INDENT,
                MARGIN + row as f64 * ROW_HEIGHT,
                NODE_WIDTH,
                NODE_HEIGHT,
            );
            (id.clone(), rect)
        })
        .collect()
}

fn radial(rendered: &[(String, usize)], tree: &TreeArena, view: &ViewState) -> HashMap<String, Rect> {
    if rendered.is_empty() {
        return HashMap::new();
    }
    let visible: HashMap<&str, usize> = rendered.iter().map(|(id, d)| (id.as_str(), *d)).collect();

    // Several roots orbit an empty hub one ring out
    let ring_offset = usize::from(tree.roots().len() > 1);

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut top: Vec<&str> = Vec::new();
    for (id, _) in rendered {
        match tree.parent(id).filter(|p| visible.contains_key(p)) {
            Some(parent) => children.entry(parent).or_default().push(id.as_str()),
            None => top.push(id.as_str()),
        }
    }

    let weight: HashMap<&str, f64> = rendered
        .iter()
        .map(|(id, _)| {
            let leaves = tree.leaf_count(id, |n| !view.is_collapsed(n));
            (id.as_str(), leaves.max(1) as f64)
        })
        .collect();

    let mut sector: HashMap<&str, (f64, f64)> = HashMap::new();
    assign_sectors(&top, 0.0, TAU, &weight, &mut sector);
    for (id, _) in rendered {
        if let (Some(&(start, span)), Some(cs)) = (sector.get(id.as_str()), children.get(id.as_str())) {
            assign_sectors(cs, start, span, &weight, &mut sector);
        }
    }

    let mut centers: Vec<(&str, f64, f64)> = Vec::with_capacity(rendered.len());
    for (id, depth) in rendered {
        let ring = (*depth + ring_offset) as f64;
        let (start, span) = sector.get(id.as_str()).copied().unwrap_or((0.0, TAU));
        let angle = start + span / 2.0;
        let radius = ring * RING_SPACING;
        centers.push((id.as_str(), radius * angle.cos(), radius * angle.sin()));
    }

    let min_x = centers.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
    let min_y = centers.iter().map(|c| c.2).fold(f64::INFINITY, f64::min);
    centers
        .into_iter()
        .map(|(id, cx, cy)| {
            let x = cx - min_x + MARGIN;
            let y = cy - min_y + MARGIN;
            (id.to_string(), Rect::new(x, y, NODE_WIDTH, NODE_HEIGHT))
        })
        .collect()
}

fn assign_sectors<'a>(
    ids: &[&'a str],
    start: f64,
    span: f64,
    weight: &HashMap<&str, f64>,
    sector: &mut HashMap<&'a str, (f64, f64)>,
) {
    let total: f64 = ids.iter().map(|id| weight.get(id).copied().unwrap_or(1.0)).sum();
    if total <= 0.0 {
        return;
    }
    let mut cursor = start;
    for &id in ids {
        let share = span * weight.get(id).copied().unwrap_or(1.0) / total;
        sector.insert(id, (cursor, share));
        cursor += share;
    }
}

/// On-screen positions of a layout under the current pan and zoom.
pub struct ScreenProjection<'a> {
    layout: &'a Layout,
    view: &'a ViewState,
}

impl<'a> ScreenProjection<'a> {
    pub fn new(layout: &'a Layout, view: &'a ViewState) -> Self {
        Self { layout, view }
    }
}

impl BoundsSource for ScreenProjection<'_> {
    fn bounds(&self, id: &str) -> Option<Rect> {
        let r = self.layout.rect(id)?;
        let zoom = self.view.zoom();
        let pan = self.view.pan();
        Some(Rect::new(
            pan.x + r.x * zoom,
            pan.y + r.y * zoom,
            r.width * zoom,
            r.height * zoom,
        ))
    }
}
