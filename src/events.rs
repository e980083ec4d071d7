//! Structural change notification.
//!
//! Subscribers are plain closures held in an explicit list and called
//! synchronously, in subscription order, before the mutating call returns.
//! A handler only ever sees the event value, never the tree, so it cannot
//! start another edit from inside its callback.

use std::fmt;

use crate::tree::NodeId;

/// A change to the shape of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// `node` was inserted under a parent.
    NodeAdded { node: NodeId },
    /// `node` was removed from `former_parent`, where it sat at `former_index`.
    NodeRemoved {
        node: NodeId,
        former_parent: NodeId,
        former_index: usize,
    },
    /// Always follows `NodeAdded`/`NodeRemoved` for the same node.
    NodeChanged { node: NodeId },
}

impl TreeEvent {
    /// The node the event is about.
    pub fn node(&self) -> NodeId {
        match *self {
            TreeEvent::NodeAdded { node }
            | TreeEvent::NodeRemoved { node, .. }
            | TreeEvent::NodeChanged { node } => node,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&TreeEvent)>;

/// Subscriber list for one tree.
#[derive(Default)]
pub(crate) struct Notifier {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Handler)>,
}

impl Notifier {
    pub(crate) fn subscribe(&mut self, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, handler));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub(crate) fn emit(&mut self, event: TreeEvent) {
        for (_, handler) in &mut self.subscribers {
            handler(&event);
        }
    }

    /// Emit `event` and the `NodeChanged` that must follow it.
    pub(crate) fn emit_with_change(&mut self, event: TreeEvent) {
        let node = event.node();
        self.emit(event);
        self.emit(TreeEvent::NodeChanged { node });
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
