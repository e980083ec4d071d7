//! Subtree copies and content equality.

use super::{NodeId, Tree};
use crate::error::Result;

impl Tree {
    /// Copy `node` into a new detached node of the same variant.
    ///
    /// `include_properties` copies the node's own properties. `deep` also
    /// copies the whole subtree below it, descendants always with their
    /// properties.
    pub fn copy_node(&mut self, node: NodeId, deep: bool, include_properties: bool) -> Result<NodeId> {
        self.ensure_owned(node)?;
        Ok(self.copy_unchecked(node, deep, include_properties))
    }

    /// Deep copy of `node` with all properties.
    pub fn copy(&mut self, node: NodeId) -> Result<NodeId> {
        self.copy_node(node, true, true)
    }

    fn copy_unchecked(&mut self, node: NodeId, deep: bool, include_properties: bool) -> NodeId {
        let copy = self.copy_shallow(node, include_properties);
        if !deep {
            return copy;
        }
        // Each source node is paired with its copy; children are adopted
        // in order as soon as their parent's copy exists.
        let mut stack = vec![(node, copy)];
        while let Some((source, target)) = stack.pop() {
            let children = self.slot(source).children.clone();
            for child in children {
                let child_copy = self.copy_shallow(child, true);
                self.adopt(target, child_copy);
                stack.push((child, child_copy));
            }
        }
        copy
    }

    fn copy_shallow(&mut self, node: NodeId, include_properties: bool) -> NodeId {
        let source = self.slot(node);
        let qname = source.qname.clone();
        let properties: Vec<_> = if include_properties {
            source.properties.values().map(|p| p.copy_property()).collect()
        } else {
            Vec::new()
        };

        let copy = self.alloc(qname);
        for property in properties {
            self.attach_property(copy, property);
        }
        copy
    }

    /// Content equality of `node` and `other_node` in `other`, ignoring
    /// where either sits in its tree.
    ///
    /// Both nodes must have the same variant, the same property categories
    /// with value-equal properties, and pairwise value-equal children.
    pub fn value_equals(&self, node: NodeId, other: &Tree, other_node: NodeId) -> bool {
        let mut pending = vec![(node, other_node)];
        while let Some((node, other_node)) = pending.pop() {
            let a = self.slot(node);
            let b = other.slot(other_node);
            let same = a.qname == b.qname
                && a.properties.len() == b.properties.len()
                && a.properties.iter().zip(&b.properties).all(|((ca, pa), (cb, pb))| {
                    ca == cb && pa.value_equals(pb.as_ref())
                })
                && a.children.len() == b.children.len();
            if !same {
                return false;
            }
            pending.extend(a.children.iter().copied().zip(b.children.iter().copied()));
        }
        true
    }

    /// Number of nodes in the subtree rooted at `node`.
    pub fn node_count(&self, node: NodeId) -> usize {
        self.descendants(node).count()
    }
}
