//! Arena-backed content tree.
//!
//! Every node of a presentation lives in one arena owned by that
//! presentation. Nodes refer to each other through [`NodeId`] handles:
//! a slot owns its children (downward) and only records a handle to its
//! parent (upward), so there is no ownership cycle.
//!
//! A handle also carries the id of the presentation that minted it. Pure
//! queries treat a foreign handle as a programmer error and panic;
//! structural edits report it as [`Conflict::DifferentPresentation`].

mod copy;
mod edit;
mod xuk;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Conflict, Error, Result};
use crate::events::{Notifier, SubscriptionId, TreeEvent};
use crate::factory::NodeTemplate;
use crate::property::{Property, PropertyCategory};
use crate::qname::QName;

/// Identity of one presentation (and of the arena it owns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresentationId(u32);

impl PresentationId {
    /// Mint a process-unique id.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        PresentationId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a node in a presentation's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    presentation: PresentationId,
    index: u32,
}

impl NodeId {
    pub(crate) fn new(presentation: PresentationId, index: u32) -> Self {
        Self {
            presentation,
            index,
        }
    }

    /// The presentation this node belongs to.
    pub fn presentation(&self) -> PresentationId {
        self.presentation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.presentation.0, self.index)
    }
}

/// One node's storage.
#[derive(Debug)]
pub(crate) struct NodeSlot {
    qname: QName,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub(crate) properties: BTreeMap<PropertyCategory, Box<dyn Property>>,
}

/// The node arena of one presentation, plus its change subscribers.
#[derive(Debug)]
pub struct Tree {
    id: PresentationId,
    nodes: Vec<NodeSlot>,
    /// The presentation root, which may never be inserted under another node.
    root: Option<NodeId>,
    notifier: Notifier,
}

impl Tree {
    pub(crate) fn new(id: PresentationId) -> Self {
        Self {
            id,
            nodes: Vec::new(),
            root: None,
            notifier: Notifier::default(),
        }
    }

    /// Id of the owning presentation.
    pub fn presentation_id(&self) -> PresentationId {
        self.id
    }

    /// Check whether a handle was minted by this tree.
    pub fn contains(&self, node: NodeId) -> bool {
        node.presentation == self.id && (node.index as usize) < self.nodes.len()
    }

    /// Number of allocated nodes, attached or not.
    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    /// Allocate a detached, property-less node.
    pub(crate) fn alloc(&mut self, qname: QName) -> NodeId {
        let id = NodeId::new(self.id, self.nodes.len() as u32);
        self.nodes.push(NodeSlot {
            qname,
            parent: None,
            children: Vec::new(),
            properties: BTreeMap::new(),
        });
        id
    }

    /// Allocate a detached node from a factory template.
    pub(crate) fn instantiate(&mut self, template: NodeTemplate) -> NodeId {
        let node = self.alloc(template.qname);
        for property in template.properties {
            self.attach_property(node, property);
        }
        node
    }

    /// Mark `node` as the presentation root. The caller checks that it is
    /// detached.
    pub(crate) fn mark_root(&mut self, node: NodeId) {
        self.root = Some(node);
    }

    /// True when `node` is the presentation root.
    pub fn is_root(&self, node: NodeId) -> bool {
        self.root == Some(node)
    }

    /// Append a freshly built node without notifying subscribers. Only for
    /// nodes no one outside the tree has seen yet.
    fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.slot_mut(child).parent = Some(parent);
        self.slot_mut(parent).children.push(child);
    }

    pub(crate) fn slot(&self, node: NodeId) -> &NodeSlot {
        assert!(
            self.contains(node),
            "node {node} does not belong to presentation #{}",
            self.id.0
        );
        &self.nodes[node.index as usize]
    }

    pub(crate) fn slot_mut(&mut self, node: NodeId) -> &mut NodeSlot {
        assert!(
            self.contains(node),
            "node {node} does not belong to presentation #{}",
            self.id.0
        );
        &mut self.nodes[node.index as usize]
    }

    pub(crate) fn ensure_owned(&self, node: NodeId) -> Result<()> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(Error::StructuralConflict(Conflict::DifferentPresentation))
        }
    }

    // ========================================================================
    // Subscribers
    // ========================================================================

    /// Register a handler for structural change events.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&TreeEvent) + 'static,
    {
        self.notifier.subscribe(Box::new(handler))
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The element name this node is persisted under.
    pub fn qname(&self, node: NodeId) -> &QName {
        &self.slot(node).qname
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.slot(node).children
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.slot(node).children.len()
    }

    /// The child at `index`.
    pub fn child(&self, node: NodeId, index: usize) -> Result<NodeId> {
        let children = &self.slot(node).children;
        children.get(index).copied().ok_or(Error::OutOfBounds {
            index,
            len: children.len(),
        })
    }

    /// Position of `child` among the children of `node`.
    pub fn index_of(&self, node: NodeId, child: NodeId) -> Result<usize> {
        self.slot(node)
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| Error::NotFound(format!("node {child} is not a child of {node}")))
    }

    fn position_in_parent(&self, node: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.slot(node).parent?;
        let index = self.slot(parent).children.iter().position(|&c| c == node)?;
        Some((parent, index))
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let (parent, index) = self.position_in_parent(node)?;
        self.slot(parent).children.get(index + 1).copied()
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let (parent, index) = self.position_in_parent(node)?;
        let index = index.checked_sub(1)?;
        self.slot(parent).children.get(index).copied()
    }

    /// True when both nodes are distinct children of the same parent.
    pub fn is_sibling_of(&self, node: NodeId, other: NodeId) -> bool {
        node != other
            && self
                .parent(node)
                .is_some_and(|parent| self.parent(other) == Some(parent))
    }

    /// True when `node` is a proper ancestor of `other`.
    pub fn is_ancestor_of(&self, node: NodeId, other: NodeId) -> bool {
        self.ancestors(other).any(|a| a == node)
    }

    /// True when `node` is a proper descendant of `other`.
    pub fn is_descendant_of(&self, node: NodeId, other: NodeId) -> bool {
        self.is_ancestor_of(other, node)
    }

    /// Proper ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: self.parent(node),
        }
    }

    /// Pre-order walk of `node` and its subtree.
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        // Validate up front so a foreign handle panics here, not mid-walk.
        let _ = self.slot(node);
        Descendants {
            tree: self,
            stack: vec![node],
        }
    }

    /// Height of the subtree rooted at `node` (a leaf has depth 1).
    pub fn depth(&self, node: NodeId) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(node, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(self.children(node).iter().map(|&child| (child, depth + 1)));
        }
        deepest
    }
}

/// Iterator over the proper ancestors of a node.
pub struct Ancestors<'a> {
    tree: &'a Tree,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        self.current = self.tree.parent(node);
        Some(node)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        self.stack
            .extend(self.tree.children(node).iter().rev().copied());
        Some(node)
    }
}
