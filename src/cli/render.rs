//! Terminal tree and SVG rendering of a level.

use std::collections::HashSet;
use std::fmt::Write as _;

use colored::Colorize;
use termtree::Tree;

use crate::domain::{Connector, KnowledgeNode, Layout, NodeStatus, NodeStore, TreeArena, ViewState};

fn node_line(node: &KnowledgeNode, collapsed: bool) -> String {
    let marker = if collapsed { " ▸" } else { "" };
    let label = match node.status {
        NodeStatus::Locked => node.label.dimmed().to_string(),
        NodeStatus::Available => node.label.yellow().bold().to_string(),
        NodeStatus::Completed => node.label.green().to_string(),
    };
    let stars = match node.status {
        NodeStatus::Completed => format!(" {}", node.stars),
        _ => String::new(),
    };
    format!("{label} [{}]{stars}{marker}", node.id)
}

/// One termtree per root; collapsed subtrees are folded.
pub fn tree_view(store: &NodeStore, tree: &TreeArena, view: &ViewState) -> Vec<Tree<String>> {
    fn build(
        id: &str,
        store: &NodeStore,
        tree: &TreeArena,
        view: &ViewState,
        visited: &mut HashSet<String>,
    ) -> Option<Tree<String>> {
        if !visited.insert(id.to_string()) {
            return None;
        }
        let node = store.get(id)?;
        let collapsed = view.is_collapsed(id);
        let mut t = Tree::new(node_line(node, collapsed));
        if !collapsed {
            for child in tree.children(id) {
                if let Some(sub) = build(child, store, tree, view, visited) {
                    t.push(sub);
                }
            }
        }
        Some(t)
    }

    let mut visited = HashSet::new();
    tree.roots()
        .into_iter()
        .filter_map(|root| build(root, store, tree, view, &mut visited))
        .collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn fill(status: NodeStatus) -> &'static str {
    match status {
        NodeStatus::Locked => "#e5e7eb",
        NodeStatus::Available => "#fde68a",
        NodeStatus::Completed => "#bbf7d0",
    }
}

/// SVG document of the laid out map in unscaled layout coordinates.
pub fn svg(store: &NodeStore, layout: &Layout, connectors: &[Connector]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="sans-serif" font-size="13">"#,
        w = layout.width,
        h = layout.height
    );
    for c in connectors {
        let (stroke, width) = if c.active {
            ("#2563eb", 2.0)
        } else {
            ("#9ca3af", 1.0)
        };
        let _ = writeln!(
            out,
            r#"  <path d="{}" fill="none" stroke="{stroke}" stroke-width="{width}"/>"#,
            c.path_data()
        );
    }
    for id in layout.order() {
        let (Some(node), Some(r)) = (store.get(id), layout.rect(id)) else {
            continue;
        };
        let c = r.center();
        let _ = writeln!(
            out,
            r##"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="6" fill="{}" stroke="#374151"/>"##,
            r.x,
            r.y,
            r.width,
            r.height,
            fill(node.status)
        );
        let _ = writeln!(
            out,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            c.x,
            c.y,
            escape(&node.label)
        );
    }
    out.push_str("</svg>\n");
    out
}
