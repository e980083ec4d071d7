//! Structural editing through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use xuk::{
    ChannelsProperty, Conflict, Error, NodeId, Presentation, PropertyCategory, TreeEvent,
    XmlProperty,
};

/// A presentation whose root has `n` children.
fn presentation_with_children(n: usize) -> (Presentation, NodeId, Vec<NodeId>) {
    let mut presentation = Presentation::new();
    let root = presentation.root();
    let children: Vec<_> = (0..n)
        .map(|_| {
            let child = presentation.create_node();
            presentation.tree_mut().append_child(root, child).unwrap();
            child
        })
        .collect();
    (presentation, root, children)
}

// ============================================================================
// Detach / remove
// ============================================================================

#[test]
fn test_detach_middle_child() {
    let (mut presentation, root, c) = presentation_with_children(3);
    let tree = presentation.tree_mut();

    assert_eq!(tree.detach(c[1]).unwrap(), c[1]);

    assert_eq!(tree.children(root), &[c[0], c[2]]);
    assert_eq!(tree.parent(c[1]), None);
    assert_eq!(tree.index_of(root, c[2]).unwrap(), 1);
}

#[test]
fn test_remove_child_by_handle_and_index() {
    let (mut presentation, root, c) = presentation_with_children(3);
    let tree = presentation.tree_mut();

    assert_eq!(tree.remove_child(root, c[2]).unwrap(), c[2]);
    assert_eq!(tree.remove_child_at(root, 0).unwrap(), c[0]);
    assert_eq!(tree.children(root), &[c[1]]);
    assert!(matches!(tree.remove_child(root, c[0]), Err(Error::NotFound(_))));
    assert!(matches!(
        tree.remove_child_at(root, 5),
        Err(Error::OutOfBounds { index: 5, len: 1 })
    ));
}

// ============================================================================
// Split
// ============================================================================

#[test]
fn test_split_children_carries_property_copy() {
    let (mut presentation, _, _) = presentation_with_children(0);
    let n = presentation.create_node();
    let kids: Vec<_> = (0..3).map(|_| presentation.create_node()).collect();
    let tree = presentation.tree_mut();
    tree.set_property(n, Box::new(XmlProperty::new("level1")))
        .unwrap();
    for &kid in &kids {
        tree.append_child(n, kid).unwrap();
    }

    let n2 = tree.split_children(n, 1, true).unwrap();

    assert_eq!(tree.children(n), &[kids[0]]);
    assert_eq!(tree.children(n2), &[kids[1], kids[2]]);
    assert_eq!(tree.parent(kids[1]), Some(n2));
    let original = tree.property(n, &PropertyCategory::XML).unwrap();
    let copied = tree.property(n2, &PropertyCategory::XML).unwrap();
    assert!(copied.value_equals(original));
    assert_eq!(copied.owner(), Some(n2));
}

#[test]
fn test_split_preserves_order() {
    let (mut presentation, root, c) = presentation_with_children(5);
    let tree = presentation.tree_mut();

    let split = tree.split_children(root, 2, false).unwrap();

    let joined: Vec<_> = tree
        .children(root)
        .iter()
        .chain(tree.children(split))
        .copied()
        .collect();
    assert_eq!(joined, c);
    assert!(tree.used_categories(split).is_empty());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_second_channels_property_replaces_first() {
    let (mut presentation, root, _) = presentation_with_children(0);
    let tree = presentation.tree_mut();

    tree.set_property(root, Box::new(ChannelsProperty::new()))
        .unwrap();
    let p1 = tree
        .set_property(root, Box::new(ChannelsProperty::new()))
        .unwrap()
        .expect("first property is returned");

    assert_eq!(p1.owner(), None);
    assert_eq!(
        tree.property(root, &PropertyCategory::CHANNELS)
            .unwrap()
            .owner(),
        Some(root)
    );
    assert_eq!(tree.used_categories(root), vec![PropertyCategory::CHANNELS]);
}

#[test]
fn test_host_category_does_not_collide() {
    let category = PropertyCategory::new("annotations");
    assert_ne!(category, PropertyCategory::XML);
    assert_eq!(category.as_str(), "annotations");
}

// ============================================================================
// Swap
// ============================================================================

#[test]
fn test_swap_with_descendant_is_rejected() {
    let (mut presentation, root, c) = presentation_with_children(2);
    let grandchild = presentation.create_node();
    let tree = presentation.tree_mut();
    tree.append_child(c[0], grandchild).unwrap();

    let result = tree.swap_with(c[0], grandchild);

    assert!(matches!(
        result,
        Err(Error::StructuralConflict(Conflict::Descendant))
    ));
    assert_eq!(tree.children(root), &[c[0], c[1]]);
    assert_eq!(tree.children(c[0]), &[grandchild]);

    assert!(matches!(
        tree.swap_with(grandchild, c[0]),
        Err(Error::StructuralConflict(Conflict::Ancestor))
    ));
}

#[test]
fn test_swap_with_sibling_helpers() {
    let (mut presentation, root, c) = presentation_with_children(3);
    let tree = presentation.tree_mut();

    assert!(!tree.swap_with_previous_sibling(c[0]));
    assert!(tree.swap_with_next_sibling(c[0]));
    assert_eq!(tree.children(root), &[c[1], c[0], c[2]]);
    assert!(tree.swap_with_previous_sibling(c[0]));
    assert_eq!(tree.children(root), &[c[0], c[1], c[2]]);
    assert!(!tree.swap_with_next_sibling(c[2]));
}

#[test]
fn test_cross_presentation_edit() {
    let (mut a, a_root, _) = presentation_with_children(0);
    let b = Presentation::new();

    let result = a.tree_mut().append_child(a_root, b.root());
    assert!(matches!(
        result,
        Err(Error::StructuralConflict(Conflict::DifferentPresentation))
    ));
}

#[test]
fn test_cross_presentation_move_and_swap() {
    let (mut a, a_root, a_children) = presentation_with_children(2);
    let (b, b_root, b_children) = presentation_with_children(2);
    let tree = a.tree_mut();

    assert!(matches!(
        tree.append_children_of(a_root, b_root),
        Err(Error::StructuralConflict(Conflict::DifferentPresentation))
    ));
    assert!(matches!(
        tree.append_children_of(b_root, a_root),
        Err(Error::StructuralConflict(Conflict::DifferentPresentation))
    ));
    assert!(matches!(
        tree.swap_with(a_children[0], b_children[1]),
        Err(Error::StructuralConflict(Conflict::DifferentPresentation))
    ));

    assert_eq!(tree.children(a_root), a_children.as_slice());
    assert_eq!(b.tree().children(b_root), b_children.as_slice());
}

#[test]
fn test_root_stays_parentless() {
    let (mut presentation, root, c) = presentation_with_children(1);
    let fresh = presentation.create_node();
    let tree = presentation.tree_mut();

    assert!(matches!(
        tree.append_child(fresh, root),
        Err(Error::StructuralConflict(Conflict::Root))
    ));
    assert!(matches!(
        tree.insert(c[0], root, 0),
        Err(Error::StructuralConflict(Conflict::Root))
    ));
    assert_eq!(tree.parent(root), None);
    assert_eq!(tree.child_count(fresh), 0);
}

#[test]
fn test_very_deep_tree() {
    const LEVELS: usize = 20_000;
    let (mut presentation, root, _) = presentation_with_children(0);
    let nodes: Vec<_> = (0..LEVELS).map(|_| presentation.create_node()).collect();
    let tree = presentation.tree_mut();
    // Bottom-up, so each insert only checks a detached parent.
    for pair in nodes.windows(2).rev() {
        tree.append_child(pair[0], pair[1]).unwrap();
    }
    tree.append_child(root, nodes[0]).unwrap();

    assert_eq!(tree.depth(root), LEVELS + 1);
    let copy = tree.copy(root).unwrap();
    let tree = presentation.tree();
    assert!(tree.value_equals(copy, tree, root));
    assert_eq!(tree.node_count(copy), LEVELS + 1);
}

// ============================================================================
// Notification
// ============================================================================

#[test]
fn test_event_order() {
    let (mut presentation, root, c) = presentation_with_children(2);
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    presentation.subscribe(move |event| sink.borrow_mut().push(*event));

    let fresh = presentation.create_node();
    presentation
        .tree_mut()
        .replace_child(root, fresh, c[0])
        .unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            TreeEvent::NodeAdded { node: fresh },
            TreeEvent::NodeChanged { node: fresh },
            TreeEvent::NodeRemoved {
                node: c[0],
                former_parent: root,
                former_index: 1,
            },
            TreeEvent::NodeChanged { node: c[0] },
        ]
    );
}

#[test]
fn test_every_edit_emits_one_change() {
    let (mut presentation, root, c) = presentation_with_children(3);
    let changes = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&changes);
    presentation.subscribe(move |event| {
        if let TreeEvent::NodeChanged { .. } = event {
            *counter.borrow_mut() += 1;
        }
    });

    let tree = presentation.tree_mut();
    tree.detach(c[0]).unwrap();
    tree.insert(root, c[0], 2).unwrap();

    assert_eq!(*changes.borrow(), 2);
}
