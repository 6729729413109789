//! Tests for collapse, zoom and pan view state

use rstest::rstest;

use quizmap::domain::view::{ZOOM_MAX, ZOOM_MIN};
use quizmap::domain::{
    KnowledgeNode, NodeStatus, NodeStore, Point, TreeArena, TreeBuilder, UnlockEngine, ViewState,
};

fn level() -> (NodeStore, TreeArena) {
    let nodes = vec![
        KnowledgeNode::new("a", "A"),
        KnowledgeNode::new("b", "B").with_parent("a"),
        KnowledgeNode::new("c", "C").with_parent("b"),
        KnowledgeNode::new("d", "D").with_parent("c"),
        KnowledgeNode::new("e", "E").with_parent("a"),
    ];
    let mut store = NodeStore::new(nodes).unwrap();
    UnlockEngine::for_store(&store).seed(&mut store).unwrap();
    let tree = TreeBuilder::new().build(store.nodes());
    (store, tree)
}

fn rendered(view: &ViewState, tree: &TreeArena) -> Vec<String> {
    view.rendered_ids(tree).into_iter().map(|(id, _)| id).collect()
}

#[rstest]
#[case(2.5, ZOOM_MAX)]
#[case(-1.0, ZOOM_MIN)]
#[case(0.3, 1.3)]
#[case(-0.5, 0.5)]
fn given_zoom_request_when_adjusting_then_clamped_to_bounds(
    #[case] delta: f64,
    #[case] expected: f64,
) {
    // Arrange
    let mut view = ViewState::default();

    // Act
    let zoom = view.adjust_zoom(delta);

    // Assert
    assert!((zoom - expected).abs() < 1e-9);
    assert!((view.zoom() - expected).abs() < 1e-9);
}

#[test]
fn given_collapsed_node_when_rendering_then_all_descendants_hidden() {
    // Arrange
    let (_, tree) = level();
    let mut view = ViewState::default();

    // Act
    let collapsed = view.toggle_collapse("b");

    // Assert
    assert!(collapsed);
    assert_eq!(rendered(&view, &tree), vec!["a", "b", "e"]);
    assert!(view.is_rendered("b", &tree));
    assert!(!view.is_rendered("c", &tree));
    assert!(!view.is_rendered("d", &tree));
}

#[test]
fn given_collapsed_node_when_expanded_then_subtree_restored_with_status_unchanged() {
    // Arrange
    let (store, tree) = level();
    let before: Vec<(String, NodeStatus)> =
        store.iter().map(|n| (n.id.clone(), n.status)).collect();
    let mut view = ViewState::default();
    view.toggle_collapse("b");

    // Act
    let collapsed = view.toggle_collapse("b");

    // Assert
    assert!(!collapsed);
    assert_eq!(rendered(&view, &tree), vec!["a", "b", "c", "d", "e"]);
    let after: Vec<(String, NodeStatus)> =
        store.iter().map(|n| (n.id.clone(), n.status)).collect();
    assert_eq!(before, after);
}

#[test]
fn given_collapse_all_when_rendering_then_only_roots_visible_until_expand_all() {
    // Arrange
    let (store, tree) = level();
    let mut view = ViewState::default();

    // Act
    view.collapse_all(store.iter().map(|n| n.id.clone()));
    let folded = rendered(&view, &tree);
    view.expand_all();

    // Assert
    assert_eq!(folded, vec!["a"]);
    assert!(view.collapsed().is_empty());
    assert_eq!(rendered(&view, &tree).len(), 5);
}

#[test]
fn given_panned_and_zoomed_view_when_reset_then_initial_offset_restored_and_collapse_kept() {
    // Arrange
    let mut view = ViewState::new(Point::new(40.0, 20.0));
    view.toggle_collapse("b");
    view.adjust_zoom(0.5);
    view.pan_by(100.0, -30.0);

    // Act
    view.reset_view();

    // Assert
    assert_eq!(view.zoom(), 1.0);
    assert_eq!(view.pan(), Point::new(40.0, 20.0));
    assert!(view.is_collapsed("b"));
}

#[test]
fn given_pointer_drag_when_moving_then_pan_follows_pointer_until_release() {
    // Arrange
    let mut view = ViewState::default();

    // Act
    view.begin_drag(Point::new(10.0, 10.0));
    view.drag_to(Point::new(35.0, 5.0));
    view.end_drag();
    view.drag_to(Point::new(500.0, 500.0));

    // Assert
    assert!(!view.is_dragging());
    assert_eq!(view.pan(), Point::new(25.0, -5.0));
}
