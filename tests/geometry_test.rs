//! Tests for layout engines and connector geometry

use std::collections::HashMap;

use rstest::rstest;

use quizmap::domain::{
    compute_connectors, Connector, KnowledgeNode, Layout, LayoutStyle, NodeKind, NodeStore, Rect,
    ScreenProjection, TreeArena, TreeBuilder, UnlockEngine, ViewState,
};

fn typed_level() -> (NodeStore, TreeArena) {
    let nodes = vec![
        KnowledgeNode::new("r", "Root").with_kind(NodeKind::Root),
        KnowledgeNode::new("b1", "Branch 1")
            .with_parent("r")
            .with_kind(NodeKind::Branch),
        KnowledgeNode::new("l1", "Leaf 1")
            .with_parent("b1")
            .with_kind(NodeKind::Leaf),
        KnowledgeNode::new("l2", "Leaf 2")
            .with_parent("b1")
            .with_kind(NodeKind::Leaf),
        KnowledgeNode::new("b2", "Branch 2")
            .with_parent("r")
            .with_kind(NodeKind::Branch),
        KnowledgeNode::new("l3", "Leaf 3")
            .with_parent("b2")
            .with_kind(NodeKind::Leaf),
    ];
    let mut store = NodeStore::new(nodes).unwrap();
    UnlockEngine::for_store(&store).seed(&mut store).unwrap();
    let tree = TreeBuilder::new().build(store.nodes());
    (store, tree)
}

fn connectors(style: LayoutStyle, store: &NodeStore, tree: &TreeArena, view: &ViewState) -> Vec<Connector> {
    let layout = Layout::compute(style, tree, view);
    let projection = ScreenProjection::new(&layout, view);
    compute_connectors(store, tree, view, &projection)
}

fn pairs(connectors: &[Connector]) -> Vec<(String, String)> {
    connectors
        .iter()
        .map(|c| (c.parent_id.clone(), c.child_id.clone()))
        .collect()
}

#[rstest]
#[case(LayoutStyle::Indented)]
#[case(LayoutStyle::Radial)]
fn given_expanded_tree_when_computing_then_one_connector_per_non_root(#[case] style: LayoutStyle) {
    // Arrange
    let (store, tree) = typed_level();
    let view = ViewState::default();

    // Act
    let result = connectors(style, &store, &tree, &view);

    // Assert
    assert_eq!(
        pairs(&result),
        vec![
            ("r".to_string(), "b1".to_string()),
            ("b1".to_string(), "l1".to_string()),
            ("b1".to_string(), "l2".to_string()),
            ("r".to_string(), "b2".to_string()),
            ("b2".to_string(), "l3".to_string()),
        ]
    );
}

#[rstest]
#[case(LayoutStyle::Indented)]
#[case(LayoutStyle::Radial)]
fn given_collapsed_branch_when_computing_then_no_connector_touches_hidden_nodes(
    #[case] style: LayoutStyle,
) {
    // Arrange
    let (store, tree) = typed_level();
    let mut view = ViewState::default();
    view.toggle_collapse("b1");

    // Act
    let result = connectors(style, &store, &tree, &view);

    // Assert
    for c in &result {
        assert!(view.is_rendered(&c.parent_id, &tree));
        assert!(view.is_rendered(&c.child_id, &tree));
    }
    assert!(!result.iter().any(|c| c.child_id == "l1" || c.child_id == "l2"));
    assert_eq!(result.len(), 3);
}

#[rstest]
#[case(LayoutStyle::Indented)]
#[case(LayoutStyle::Radial)]
fn given_zoom_and_pan_when_computing_then_connectors_stay_in_layout_coordinates(
    #[case] style: LayoutStyle,
) {
    // Arrange
    let (store, tree) = typed_level();
    let plain = ViewState::default();
    let mut moved = ViewState::default();
    moved.adjust_zoom(0.6);
    moved.pan_by(-120.0, 45.0);

    // Act
    let a = connectors(style, &store, &tree, &plain);
    let b = connectors(style, &store, &tree, &moved);

    // Assert
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        for (p, q) in [(x.from, y.from), (x.ctrl1, y.ctrl1), (x.ctrl2, y.ctrl2), (x.to, y.to)] {
            assert!((p.x - q.x).abs() < 1e-6 && (p.y - q.y).abs() < 1e-6);
        }
    }
}

#[test]
fn given_seeded_level_when_computing_then_active_iff_child_not_locked() {
    // Arrange
    let (store, tree) = typed_level();
    let view = ViewState::default();

    // Act
    let result = connectors(LayoutStyle::Indented, &store, &tree, &view);

    // Assert
    let active: HashMap<&str, bool> = result.iter().map(|c| (c.child_id.as_str(), c.active)).collect();
    assert!(active["b1"]);
    assert!(active["b2"]);
    assert!(active["l1"]);
    assert!(!active["l2"]);
    assert!(!active["l3"]);
}

#[test]
fn given_unmeasurable_node_when_computing_then_its_connector_is_skipped() {
    // Arrange
    let (store, tree) = typed_level();
    let view = ViewState::default();
    let layout = Layout::compute(LayoutStyle::Indented, &tree, &view);
    let mut bounds: HashMap<String, Rect> = layout
        .order()
        .iter()
        .filter_map(|id| layout.rect(id).map(|r| (id.clone(), r)))
        .collect();
    bounds.remove("l2");

    // Act
    let result = compute_connectors(&store, &tree, &view, &bounds);

    // Assert
    assert_eq!(result.len(), 4);
    assert!(!result.iter().any(|c| c.child_id == "l2"));
}

#[test]
fn given_indented_layout_when_computing_then_rows_follow_preorder_and_depth_indents() {
    // Arrange
    let (_, tree) = typed_level();
    let view = ViewState::default();

    // Act
    let layout = Layout::compute(LayoutStyle::Indented, &tree, &view);

    // Assert
    assert_eq!(layout.order(), ["r", "b1", "l1", "l2", "b2", "l3"]);
    let r = layout.rect("r").unwrap();
    let b1 = layout.rect("b1").unwrap();
    let l1 = layout.rect("l1").unwrap();
    assert!(b1.y > r.y && l1.y > b1.y);
    assert!(b1.x > r.x && l1.x > b1.x);
    assert!(layout.width >= l1.right());
}

#[test]
fn given_radial_layout_when_computing_then_rects_do_not_overlap() {
    // Arrange
    let (_, tree) = typed_level();
    let view = ViewState::default();

    // Act
    let layout = Layout::compute(LayoutStyle::Radial, &tree, &view);

    // Assert
    let rects: Vec<Rect> = layout.order().iter().filter_map(|id| layout.rect(id)).collect();
    assert_eq!(rects.len(), 6);
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            let overlap = a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom();
            assert!(!overlap, "{a:?} overlaps {b:?}");
        }
        assert!(a.x >= 0.0 && a.y >= 0.0);
    }
}

#[test]
fn given_collapsed_subtree_when_laying_out_then_hidden_nodes_have_no_rect() {
    // Arrange
    let (_, tree) = typed_level();
    let mut view = ViewState::default();
    view.toggle_collapse("r");

    // Act
    let layout = Layout::compute(LayoutStyle::Radial, &tree, &view);

    // Assert
    assert_eq!(layout.len(), 1);
    assert!(layout.rect("b1").is_none());
}
