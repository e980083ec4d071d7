//! # xuk
//!
//! Document-model core for DAISY talking-book authoring: a content tree
//! whose nodes carry swappable properties, and lossless persistence in the
//! XUK XML format.
//!
//! ## Features
//!
//! - Arena-backed tree with validated structural edits (insert, detach,
//!   replace, swap, split, copy) that either succeed fully or leave the tree
//!   untouched
//! - Per-node properties keyed by capability category
//! - Streaming XUK reader and writer that skip unknown elements, with pretty
//!   and compact element naming
//! - Factories so hosts can register their own node, property and media
//!   variants
//! - Synchronous change notification for undo logs and editors
//!
//! ## Quick Start
//!
//! ```
//! use xuk::{Presentation, TextMedia, ChannelsProperty, XukOptions};
//!
//! let mut presentation = Presentation::new();
//! let text = presentation.channels_mut().add_channel("text");
//!
//! let root = presentation.root();
//! let heading = presentation.create_node();
//! let mut mappings = ChannelsProperty::new();
//! mappings.set_media(&text, Box::new(TextMedia::new("Chapter 1")));
//!
//! let tree = presentation.tree_mut();
//! tree.set_property(heading, Box::new(mappings)).unwrap();
//! tree.append_child(root, heading).unwrap();
//!
//! let xml = presentation.to_xuk_string(&XukOptions::default()).unwrap();
//! let reloaded = Presentation::from_xuk_str(&xml).unwrap();
//! assert!(reloaded.value_equals(&presentation));
//! ```

pub mod channel;
pub mod error;
pub mod events;
pub mod factory;
pub mod media;
pub mod outline;
pub mod presentation;
pub mod property;
pub mod qname;
pub mod tree;
pub mod xuk;

pub use channel::{Channel, ChannelsManager};
pub use error::{Conflict, Error, Result};
pub use events::{SubscriptionId, TreeEvent};
pub use factory::{NodeFactory, NodeTemplate, PropertyFactory};
pub use media::{ExternalAudioMedia, Media, MediaFactory, TextMedia};
pub use outline::Outline;
pub use presentation::Presentation;
pub use property::{
    ChannelsProperty, OwnerSlot, Property, PropertyCategory, XmlAttribute, XmlProperty,
};
pub use qname::{QName, XUK_NS};
pub use tree::{NodeId, PresentationId, Tree};
pub use xuk::{XukAble, XukContext, XukNaming, XukOptions, XukReader, XukWriter};
