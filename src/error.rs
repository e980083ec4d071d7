//! Error types for tree, factory and XUK operations.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::qname::QName;
use crate::tree::NodeId;

/// Why a structural edit would corrupt the shape of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Both arguments are the same node.
    SameNode,
    /// The node is an ancestor of the node being edited.
    Ancestor,
    /// The node is a descendant of the node being edited.
    Descendant,
    /// The node belongs to another presentation.
    DifferentPresentation,
    /// The node is the presentation root, which never has a parent.
    Root,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Conflict::SameNode => "node is the same as the target",
            Conflict::Ancestor => "node is an ancestor of the target",
            Conflict::Descendant => "node is a descendant of the target",
            Conflict::DifferentPresentation => "node belongs to a different presentation",
            Conflict::Root => "node is the presentation root",
        };
        f.write_str(text)
    }
}

/// Errors that can occur while editing a tree or reading and writing XUK.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Empty value for required argument: {0}")]
    NullArgument(&'static str),

    #[error("Index {index} out of bounds (length {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Node {0} already has a parent")]
    NotDetached(NodeId),

    #[error("Node {0} has no parent")]
    NoParent(NodeId),

    #[error("Structural conflict: {0}")]
    StructuralConflict(Conflict),

    #[error("{0} is not bound to a presentation")]
    NotInitialized(&'static str),

    #[error("{0} is already bound to a presentation")]
    AlreadyInitialized(&'static str),

    #[error("Factory failed to construct {0}")]
    FactoryCannotCreate(QName),

    #[error("Clip begins at {begin:?}, after its end at {end:?}")]
    InvalidClip { begin: Duration, end: Duration },

    #[error("Duplicate channel id: {0}")]
    DuplicateChannel(String),

    #[error("Invalid XUK in <{element}>: {message}")]
    XukFormat { element: String, message: String },
}

impl Error {
    /// Build a format error for the named element.
    pub(crate) fn xuk(element: impl fmt::Display, message: impl Into<String>) -> Self {
        Error::XukFormat {
            element: element.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
