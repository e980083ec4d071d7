//! Read-only summary of a presentation's tree for display and tooling.

use crate::presentation::Presentation;
use crate::property::{ChannelsProperty, PropertyCategory, XmlProperty};
use crate::tree::{NodeId, Tree};

// ============================================================================
// Public Types
// ============================================================================

/// A document outline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Outline {
    pub node_count: usize,
    pub depth: usize,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub channels: Vec<ChannelSummary>,
    /// Nodes in document order, the root first.
    pub nodes: Vec<OutlineNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
}

/// One node of the outline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct OutlineNode {
    /// Distance from the root, which is at level 0.
    pub level: usize,
    /// Element name of the node variant.
    pub qname: String,
    /// Occupied property categories, sorted.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub properties: Vec<String>,
    /// Source XML element name, when the node carries XML metadata.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub xml_name: Option<String>,
    /// Ids of channels with media on this node.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub channels: Vec<String>,
}

// ============================================================================
// Extraction
// ============================================================================

impl Outline {
    pub fn of(presentation: &Presentation) -> Self {
        let tree = presentation.tree();
        let root = presentation.root();
        Self {
            node_count: tree.node_count(root),
            depth: tree.depth(root),
            channels: presentation
                .channels()
                .channels()
                .iter()
                .map(|c| ChannelSummary {
                    id: c.id.clone(),
                    name: c.name.clone(),
                })
                .collect(),
            nodes: OutlineNode::walk(tree, root),
        }
    }

    /// Indented text rendering, one node per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.render(&mut out);
        }
        out
    }
}

impl OutlineNode {
    /// Pre-order entries for the subtree of `root`.
    fn walk(tree: &Tree, root: NodeId) -> Vec<Self> {
        let mut nodes = Vec::new();
        let mut stack = vec![(root, 0)];
        while let Some((node, level)) = stack.pop() {
            nodes.push(Self::of(tree, node, level));
            stack.extend(tree.children(node).iter().rev().map(|&child| (child, level + 1)));
        }
        nodes
    }

    fn of(tree: &Tree, node: NodeId, level: usize) -> Self {
        Self {
            level,
            qname: tree.qname(node).to_string(),
            properties: tree
                .used_categories(node)
                .iter()
                .map(|c| c.to_string())
                .collect(),
            xml_name: tree
                .property_as::<XmlProperty>(node, &PropertyCategory::XML)
                .map(|p| p.local_name().to_string()),
            channels: tree
                .property_as::<ChannelsProperty>(node, &PropertyCategory::CHANNELS)
                .map(|p| p.used_channels().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    fn render(&self, out: &mut String) {
        out.push_str(&"  ".repeat(self.level));
        out.push_str(&self.qname);
        if let Some(name) = &self.xml_name {
            out.push_str(&format!(" <{name}>"));
        }
        if !self.channels.is_empty() {
            out.push_str(&format!(" [{}]", self.channels.join(", ")));
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TextMedia;

    #[test]
    fn test_outline() {
        let mut presentation = Presentation::new();
        let text = presentation.channels_mut().add_channel("text");
        let root = presentation.root();
        let child = presentation.create_node();
        let tree = presentation.tree_mut();
        tree.set_property(root, Box::new(XmlProperty::new("body")))
            .unwrap();
        let mut mappings = ChannelsProperty::new();
        mappings.set_media(&text, Box::new(TextMedia::new("Hello")));
        tree.set_property(child, Box::new(mappings)).unwrap();
        tree.append_child(root, child).unwrap();

        let outline = Outline::of(&presentation);

        assert_eq!(outline.node_count, 2);
        assert_eq!(outline.depth, 2);
        assert_eq!(outline.nodes[0].xml_name.as_deref(), Some("body"));
        assert_eq!(outline.nodes[1].level, 1);
        assert_eq!(outline.nodes[1].properties, vec!["channels"]);
        assert_eq!(outline.to_text(), "TreeNode <body>\n  TreeNode [CH0]\n");
    }
}
