//! Qualified element names and the pretty/compact alias table.
//!
//! Every persisted type is identified by a (namespace, local-name) pair.
//! Built-in XUK elements have two spellings: a readable "pretty" name and a
//! short "compact" name. Reading always canonicalises to the pretty name so
//! dispatch only ever sees one spelling; writing picks a spelling from
//! [`XukNaming`](crate::xuk::XukNaming).

use std::borrow::Cow;
use std::fmt;

/// Namespace URI of all built-in XUK elements.
pub const XUK_NS: &str = "http://www.daisy.org/urakawa/xuk/2.0";

/// A (namespace-uri, local-name) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    pub namespace: Cow<'static, str>,
    pub local_name: Cow<'static, str>,
}

impl QName {
    /// Create a name in an arbitrary namespace.
    pub fn new(namespace: impl Into<Cow<'static, str>>, local_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// Create a name in the XUK namespace.
    pub const fn xuk(local_name: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(XUK_NS),
            local_name: Cow::Borrowed(local_name),
        }
    }

    /// Check whether this name lives in the XUK namespace.
    pub fn is_xuk(&self) -> bool {
        self.namespace == XUK_NS
    }

    /// Compare against a borrowed (local, namespace) pair.
    pub fn matches(&self, local_name: &str, namespace: &str) -> bool {
        self.local_name == local_name && self.namespace == namespace
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() || self.is_xuk() {
            write!(f, "{}", self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_name)
        }
    }
}

// ============================================================================
// Built-in element names
// ============================================================================

pub mod names {
    use super::QName;

    pub const PRESENTATION: QName = QName::xuk("Presentation");
    pub const ROOT_NODE: QName = QName::xuk("mRootNode");
    pub const CHANNELS_MANAGER_SLOT: QName = QName::xuk("mChannelsManager");
    pub const CHANNELS_MANAGER: QName = QName::xuk("ChannelsManager");
    pub const CHANNELS: QName = QName::xuk("mChannels");
    pub const CHANNEL: QName = QName::xuk("Channel");
    pub const TREE_NODE: QName = QName::xuk("TreeNode");
    pub const PROPERTIES: QName = QName::xuk("mProperties");
    pub const CHILDREN: QName = QName::xuk("mChildren");
    pub const CHANNELS_PROPERTY: QName = QName::xuk("ChannelsProperty");
    pub const CHANNEL_MAPPINGS: QName = QName::xuk("mChannelMappings");
    pub const CHANNEL_MAPPING: QName = QName::xuk("ChannelMapping");
    pub const XML_PROPERTY: QName = QName::xuk("XmlProperty");
    pub const XML_ATTRIBUTES: QName = QName::xuk("mXmlAttributes");
    pub const XML_ATTRIBUTE: QName = QName::xuk("XmlAttribute");
    pub const TEXT_MEDIA: QName = QName::xuk("TextMedia");
    pub const TEXT: QName = QName::xuk("mText");
    pub const EXTERNAL_AUDIO_MEDIA: QName = QName::xuk("ExternalAudioMedia");
}

/// Pretty name, compact name.
const ALIASES: &[(&str, &str)] = &[
    ("Presentation", "P"),
    ("mRootNode", "root"),
    ("mChannelsManager", "mChMgr"),
    ("ChannelsManager", "chMgr"),
    ("mChannels", "chs"),
    ("Channel", "ch"),
    ("TreeNode", "n"),
    ("mProperties", "ps"),
    ("mChildren", "cs"),
    ("ChannelsProperty", "chP"),
    ("mChannelMappings", "chMs"),
    ("ChannelMapping", "chM"),
    ("XmlProperty", "xP"),
    ("mXmlAttributes", "xAs"),
    ("XmlAttribute", "xA"),
    ("TextMedia", "tM"),
    ("mText", "t"),
    ("ExternalAudioMedia", "eAM"),
];

/// Map a compact local name to its pretty form. Unknown names pass through.
pub fn canonical_local_name(local_name: &str) -> &str {
    ALIASES
        .iter()
        .find(|(_, compact)| *compact == local_name)
        .map(|(pretty, _)| *pretty)
        .unwrap_or(local_name)
}

/// Map a pretty local name to its compact form. Unknown names pass through.
pub fn compact_local_name(local_name: &str) -> &str {
    ALIASES
        .iter()
        .find(|(pretty, _)| *pretty == local_name)
        .map(|(_, compact)| *compact)
        .unwrap_or(local_name)
}
