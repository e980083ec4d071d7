//! Node properties.
//!
//! A property is a swappable capability object attached to a tree node.
//! Each node holds at most one property per [`PropertyCategory`]; the
//! category names the capability slot and is independent of the concrete
//! type filling it, so two implementations of the same capability compete
//! for one slot and unrelated capabilities never shadow each other.

mod channels;
mod xml;

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

pub use channels::ChannelsProperty;
pub use xml::{XmlAttribute, XmlProperty};

use crate::error::Result;
use crate::tree::{NodeId, Tree};
use crate::xuk::XukAble;

/// The capability slot a property occupies on a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyCategory(Cow<'static, str>);

impl PropertyCategory {
    /// Channel-to-media mappings.
    pub const CHANNELS: PropertyCategory = PropertyCategory(Cow::Borrowed("channels"));
    /// XML structure metadata.
    pub const XML: PropertyCategory = PropertyCategory(Cow::Borrowed("xml"));

    /// A host-defined category.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        PropertyCategory(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Records which node a property is attached to.
///
/// Only the tree can set it. Cloning yields an empty slot, so a cloned
/// property always starts out unattached.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct OwnerSlot(Option<NodeId>);

impl OwnerSlot {
    pub fn get(&self) -> Option<NodeId> {
        self.0
    }

    pub(crate) fn set(&mut self, owner: Option<NodeId>) {
        self.0 = owner;
    }
}

impl Clone for OwnerSlot {
    fn clone(&self) -> Self {
        OwnerSlot(None)
    }
}

/// A capability attached to a tree node.
pub trait Property: XukAble + fmt::Debug + Any {
    /// The slot this property occupies.
    fn category(&self) -> PropertyCategory;

    fn owner_slot(&self) -> &OwnerSlot;

    fn owner_slot_mut(&mut self) -> &mut OwnerSlot;

    /// An independent deep copy with no owner.
    fn copy_property(&self) -> Box<dyn Property>;

    /// Content equality, ignoring ownership.
    fn value_equals(&self, other: &dyn Property) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The node this property is attached to, if any.
    fn owner(&self) -> Option<NodeId> {
        self.owner_slot().get()
    }
}

impl<'a> dyn Property + 'a {
    pub fn downcast_ref<T: Property>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Property>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

// ============================================================================
// Attachment
// ============================================================================

impl Tree {
    /// Store `property` on `node`, returning the one it displaced.
    pub(crate) fn attach_property(
        &mut self,
        node: NodeId,
        mut property: Box<dyn Property>,
    ) -> Option<Box<dyn Property>> {
        property.owner_slot_mut().set(Some(node));
        let category = property.category();
        let mut previous = self.slot_mut(node).properties.insert(category, property);
        if let Some(previous) = previous.as_mut() {
            previous.owner_slot_mut().set(None);
        }
        previous
    }

    /// The property of `category` on `node`.
    pub fn property(&self, node: NodeId, category: &PropertyCategory) -> Option<&dyn Property> {
        self.slot(node).properties.get(category).map(|p| p.as_ref())
    }

    pub fn property_mut(
        &mut self,
        node: NodeId,
        category: &PropertyCategory,
    ) -> Option<&mut dyn Property> {
        match self.slot_mut(node).properties.get_mut(category) {
            Some(property) => Some(property.as_mut()),
            None => None,
        }
    }

    /// The property of `category` on `node`, if it has concrete type `T`.
    pub fn property_as<T: Property>(&self, node: NodeId, category: &PropertyCategory) -> Option<&T> {
        self.property(node, category)?.downcast_ref()
    }

    pub fn property_as_mut<T: Property>(
        &mut self,
        node: NodeId,
        category: &PropertyCategory,
    ) -> Option<&mut T> {
        self.property_mut(node, category)?.downcast_mut()
    }

    /// Attach `property` to `node`, replacing any property of the same
    /// category. The replaced property is returned with its owner cleared.
    pub fn set_property(
        &mut self,
        node: NodeId,
        property: Box<dyn Property>,
    ) -> Result<Option<Box<dyn Property>>> {
        self.ensure_owned(node)?;
        Ok(self.attach_property(node, property))
    }

    /// Detach and return the property of `category`, owner cleared.
    /// Returns `None` if `node` has no property of that category.
    pub fn remove_property(
        &mut self,
        node: NodeId,
        category: &PropertyCategory,
    ) -> Result<Option<Box<dyn Property>>> {
        self.ensure_owned(node)?;
        let Some(mut property) = self.slot_mut(node).properties.remove(category) else {
            return Ok(None);
        };
        property.owner_slot_mut().set(None);
        Ok(Some(property))
    }

    /// Categories currently occupied on `node`, in sorted order.
    pub fn used_categories(&self, node: NodeId) -> Vec<PropertyCategory> {
        self.slot(node).properties.keys().cloned().collect()
    }

    /// All properties of `node`, ordered by category.
    pub fn properties(&self, node: NodeId) -> impl Iterator<Item = &dyn Property> {
        self.slot(node).properties.values().map(|p| p.as_ref())
    }
}
