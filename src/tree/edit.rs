//! Structural edits.
//!
//! Every public edit validates all of its arguments before touching the
//! arena, so a failed call leaves the tree exactly as it was. The two
//! primitives `link` and `unlink` do the actual work and fire events.

use tracing::trace;

use super::{NodeId, Tree};
use crate::error::{Conflict, Error, Result};
use crate::events::TreeEvent;

impl Tree {
    /// Attach a detached `node` under `parent` at `index`. No validation.
    pub(super) fn link(&mut self, parent: NodeId, node: NodeId, index: usize) {
        self.slot_mut(parent).children.insert(index, node);
        self.slot_mut(node).parent = Some(parent);
        trace!(%parent, %node, index, "node inserted");
        self.notifier
            .emit_with_change(TreeEvent::NodeAdded { node });
    }

    /// Detach an attached `node`. Returns its former parent and index.
    pub(super) fn unlink(&mut self, node: NodeId) -> Option<(NodeId, usize)> {
        let (parent, index) = self.position_in_parent(node)?;
        self.slot_mut(parent).children.remove(index);
        self.slot_mut(node).parent = None;
        trace!(%parent, %node, index, "node removed");
        self.notifier.emit_with_change(TreeEvent::NodeRemoved {
            node,
            former_parent: parent,
            former_index: index,
        });
        Some((parent, index))
    }

    /// Checks shared by `insert` and `replace_child_at`: `node` must be a
    /// detached node of this tree that is not the root, `parent` or one of
    /// its ancestors.
    fn check_insertable(&self, parent: NodeId, node: NodeId) -> Result<()> {
        self.ensure_owned(parent)?;
        self.ensure_owned(node)?;
        if self.is_root(node) {
            return Err(Error::StructuralConflict(Conflict::Root));
        }
        if self.slot(node).parent.is_some() {
            return Err(Error::NotDetached(node));
        }
        if node == parent {
            return Err(Error::StructuralConflict(Conflict::SameNode));
        }
        if self.is_ancestor_of(node, parent) {
            return Err(Error::StructuralConflict(Conflict::Ancestor));
        }
        Ok(())
    }

    /// Checks shared by `append_children_of` and `swap_with`.
    fn check_unrelated(&self, node: NodeId, other: NodeId) -> Result<()> {
        self.ensure_owned(node)?;
        self.ensure_owned(other)?;
        if node == other {
            return Err(Error::StructuralConflict(Conflict::SameNode));
        }
        if self.is_ancestor_of(other, node) {
            return Err(Error::StructuralConflict(Conflict::Ancestor));
        }
        if self.is_descendant_of(other, node) {
            return Err(Error::StructuralConflict(Conflict::Descendant));
        }
        Ok(())
    }

    /// Insert a detached `node` as the child of `parent` at `index`.
    ///
    /// Fails with `NotDetached` if `node` already has a parent and
    /// `OutOfBounds` unless `index <= child_count(parent)`.
    pub fn insert(&mut self, parent: NodeId, node: NodeId, index: usize) -> Result<()> {
        self.check_insertable(parent, node)?;
        let len = self.child_count(parent);
        if index > len {
            return Err(Error::OutOfBounds { index, len });
        }
        self.link(parent, node, index);
        Ok(())
    }

    /// Append a detached `node` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        self.ensure_owned(parent)?;
        let len = self.child_count(parent);
        self.insert(parent, node, len)
    }

    /// Insert `node` immediately before `anchor`, a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, node: NodeId, anchor: NodeId) -> Result<()> {
        self.ensure_owned(parent)?;
        let index = self.index_of(parent, anchor)?;
        self.insert(parent, node, index)
    }

    /// Insert `node` immediately after `anchor`, a child of `parent`.
    pub fn insert_after(&mut self, parent: NodeId, node: NodeId, anchor: NodeId) -> Result<()> {
        self.ensure_owned(parent)?;
        let index = self.index_of(parent, anchor)?;
        self.insert(parent, node, index + 1)
    }

    /// Remove `node` from its parent and return it.
    pub fn detach(&mut self, node: NodeId) -> Result<NodeId> {
        self.ensure_owned(node)?;
        match self.unlink(node) {
            Some(_) => Ok(node),
            None => Err(Error::NoParent(node)),
        }
    }

    /// Remove and return the child of `parent` at `index`.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Result<NodeId> {
        self.ensure_owned(parent)?;
        let child = self.child(parent, index)?;
        self.unlink(child);
        Ok(child)
    }

    /// Remove `child` from `parent` and return it.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.ensure_owned(parent)?;
        let index = self.index_of(parent, child)?;
        self.remove_child_at(parent, index)
    }

    /// Put a detached `node` at `index` and detach the child that was there.
    /// Returns the replaced child.
    pub fn replace_child_at(&mut self, parent: NodeId, node: NodeId, index: usize) -> Result<NodeId> {
        self.check_insertable(parent, node)?;
        let old = self.child(parent, index)?;
        self.link(parent, node, index);
        self.unlink(old);
        Ok(old)
    }

    /// Put a detached `node` where `old` is and detach `old`.
    pub fn replace_child(&mut self, parent: NodeId, node: NodeId, old: NodeId) -> Result<NodeId> {
        self.ensure_owned(parent)?;
        let index = self.index_of(parent, old)?;
        self.replace_child_at(parent, node, index)
    }

    /// Move all children of `source`, in order, to the end of `target`.
    pub fn append_children_of(&mut self, target: NodeId, source: NodeId) -> Result<()> {
        self.check_unrelated(target, source)?;
        let moved = self.slot(source).children.clone();
        for child in moved {
            self.unlink(child);
            let len = self.child_count(target);
            self.link(target, child, len);
        }
        Ok(())
    }

    /// Exchange the positions of two attached, unrelated nodes.
    ///
    /// Swapping the same pair twice restores the original tree.
    pub fn swap_with(&mut self, node: NodeId, other: NodeId) -> Result<()> {
        self.check_unrelated(node, other)?;
        let (node_parent, node_index) = self.position_in_parent(node).ok_or(Error::NoParent(node))?;
        let (other_parent, other_index) =
            self.position_in_parent(other).ok_or(Error::NoParent(other))?;
        self.exchange(
            (node, node_parent, node_index),
            (other, other_parent, other_index),
        );
        Ok(())
    }

    fn exchange(&mut self, a: (NodeId, NodeId, usize), b: (NodeId, NodeId, usize)) {
        // Order by index so removals never shift the slot still to be filled.
        let (first, second) = if a.2 <= b.2 { (a, b) } else { (b, a) };
        let (first_node, first_parent, first_index) = first;
        let (second_node, second_parent, second_index) = second;

        self.unlink(second_node);
        self.unlink(first_node);
        self.link(first_parent, second_node, first_index);
        self.link(second_parent, first_node, second_index);
    }

    /// Swap `node` with its previous sibling. Returns false if there is none.
    pub fn swap_with_previous_sibling(&mut self, node: NodeId) -> bool {
        match self.previous_sibling(node) {
            Some(sibling) => self.swap_with(node, sibling).is_ok(),
            None => false,
        }
    }

    /// Swap `node` with its next sibling. Returns false if there is none.
    pub fn swap_with_next_sibling(&mut self, node: NodeId) -> bool {
        match self.next_sibling(node) {
            Some(sibling) => self.swap_with(node, sibling).is_ok(),
            None => false,
        }
    }

    /// Move the children of `node` from `index` onwards to a new node.
    ///
    /// The new node is a shallow copy of `node` (carrying property copies
    /// when `copy_properties` is set) and is returned detached.
    pub fn split_children(&mut self, node: NodeId, index: usize, copy_properties: bool) -> Result<NodeId> {
        self.ensure_owned(node)?;
        let len = self.child_count(node);
        if index >= len {
            return Err(Error::OutOfBounds { index, len });
        }
        let split = self.copy_node(node, false, copy_properties)?;
        let moved = self.slot(node).children[index..].to_vec();
        for child in moved {
            self.unlink(child);
            let len = self.child_count(split);
            self.link(split, child, len);
        }
        Ok(split)
    }
}
