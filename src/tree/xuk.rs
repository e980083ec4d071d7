//! XUK reading and writing for tree nodes.
//!
//! Nodes are arena handles rather than standalone values, so they follow
//! the [`XukAble`](crate::xuk::XukAble) protocol through these methods
//! instead of the trait.

use tracing::warn;

use super::{NodeId, Tree};
use crate::error::{Error, Result};
use crate::property::PropertyCategory;
use crate::qname::names;
use crate::xuk::{XukContext, XukElement, XukReader, XukWriter};

/// Open elements of the subtree being read, innermost last.
enum ReadFrame {
    /// Inside a node element, expecting its property and child lists.
    Node(NodeId, XukElement),
    /// Inside the child list of a node.
    Children(NodeId, XukElement),
}

/// Pending work while writing a subtree.
enum WriteStep {
    Open(NodeId),
    /// Close a child list and the node element around it.
    Close,
}

impl Tree {
    /// Read the content of `node` from `element`, whose start tag was just
    /// consumed. Properties and children are created through the factories
    /// in `ctx`; unrecognised elements are skipped.
    ///
    /// Nesting is tracked on an explicit stack, so document depth is not
    /// limited by the call stack.
    pub fn xuk_in_node(
        &mut self,
        node: NodeId,
        reader: &mut XukReader<'_>,
        element: &XukElement,
        ctx: &XukContext<'_>,
    ) -> Result<()> {
        self.ensure_owned(node)?;
        self.check_node_element(node, element)?;

        let mut stack = vec![ReadFrame::Node(node, element.clone())];
        while let Some(frame) = stack.pop() {
            match frame {
                ReadFrame::Node(node, element) => {
                    let Some(child) = reader.next_child(&element)? else {
                        continue;
                    };
                    if child.is(&names::PROPERTIES) {
                        self.read_properties(node, reader, &child, ctx)?;
                        stack.push(ReadFrame::Node(node, element));
                    } else if child.is(&names::CHILDREN) {
                        stack.push(ReadFrame::Node(node, element));
                        stack.push(ReadFrame::Children(node, child));
                    } else {
                        reader.skip_unrecognised(&element, &child)?;
                        stack.push(ReadFrame::Node(node, element));
                    }
                }
                ReadFrame::Children(parent, list) => {
                    let Some(child) = reader.next_child(&list)? else {
                        continue;
                    };
                    let template = {
                        let qname = child.qname();
                        ctx.nodes.create(&qname.local_name, &qname.namespace)?
                    };
                    match template {
                        Some(template) => {
                            let created = self.instantiate(template);
                            self.adopt(parent, created);
                            self.check_node_element(created, &child)?;
                            stack.push(ReadFrame::Children(parent, list));
                            stack.push(ReadFrame::Node(created, child));
                        }
                        None => {
                            reader.skip_unrecognised(&list, &child)?;
                            stack.push(ReadFrame::Children(parent, list));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn check_node_element(&self, node: NodeId, element: &XukElement) -> Result<()> {
        if element.is(self.qname(node)) {
            Ok(())
        } else {
            Err(Error::xuk(
                element.qname(),
                format!("expected <{}>", self.qname(node)),
            ))
        }
    }

    fn read_properties(
        &mut self,
        node: NodeId,
        reader: &mut XukReader<'_>,
        list: &XukElement,
        ctx: &XukContext<'_>,
    ) -> Result<()> {
        let mut seen: Vec<PropertyCategory> = Vec::new();
        reader.read_children(list, |reader, child| {
            let qname = child.qname();
            let Some(mut property) = ctx.properties.create(&qname.local_name, &qname.namespace)?
            else {
                return Ok(false);
            };
            property.xuk_in(reader, child, ctx)?;

            let category = property.category();
            if seen.contains(&category) {
                warn!(%node, %category, "property category appears twice, keeping the last");
            } else {
                seen.push(category);
            }
            self.attach_property(node, property);
            Ok(true)
        })
    }

    /// Write `node` and its subtree as one element.
    pub fn xuk_out_node(&self, node: NodeId, writer: &mut XukWriter) -> Result<()> {
        let mut stack = vec![WriteStep::Open(node)];
        while let Some(step) = stack.pop() {
            let node = match step {
                WriteStep::Open(node) => node,
                WriteStep::Close => {
                    writer.end()?;
                    writer.end()?;
                    continue;
                }
            };

            let slot = self.slot(node);
            writer.start(&slot.qname, &[])?;
            if !slot.properties.is_empty() {
                writer.start(&names::PROPERTIES, &[])?;
                for property in slot.properties.values() {
                    property.xuk_out(writer)?;
                }
                writer.end()?;
            }

            if slot.children.is_empty() {
                writer.end()?;
            } else {
                writer.start(&names::CHILDREN, &[])?;
                stack.push(WriteStep::Close);
                stack.extend(slot.children.iter().rev().map(|&child| WriteStep::Open(child)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{NodeFactory, PropertyFactory};
    use crate::media::MediaFactory;
    use crate::property::XmlProperty;
    use crate::tree::PresentationId;
    use crate::xuk::XukOptions;

    fn bound_factories() -> (NodeFactory, PropertyFactory, MediaFactory) {
        let id = PresentationId::next();
        let mut nodes = NodeFactory::new();
        nodes.bind(id).unwrap();
        let mut properties = PropertyFactory::new();
        properties.bind(id).unwrap();
        (nodes, properties, MediaFactory::new())
    }

    fn read_tree(xml: &str) -> Result<(Tree, NodeId)> {
        let (nodes, properties, media) = bound_factories();
        let ctx = XukContext {
            nodes: &nodes,
            properties: &properties,
            media: &media,
        };
        let mut tree = Tree::new(PresentationId::next());
        let root = tree.alloc(names::TREE_NODE);
        let mut reader = XukReader::from_str(xml);
        let element = reader.read_root()?;
        tree.xuk_in_node(root, &mut reader, &element, &ctx)?;
        Ok((tree, root))
    }

    #[test]
    fn test_read_nested_nodes() {
        let (tree, root) = read_tree(
            r#"<n xmlns="http://www.daisy.org/urakawa/xuk/2.0">
                <ps><xP localName="body"/></ps>
                <cs><n><cs><n/></cs></n><n/></cs>
            </n>"#,
        )
        .unwrap();

        assert_eq!(tree.child_count(root), 2);
        assert_eq!(tree.depth(root), 3);
        let first = tree.child(root, 0).unwrap();
        assert_eq!(tree.parent(first), Some(root));
        assert_eq!(
            tree.property_as::<XmlProperty>(root, &PropertyCategory::XML)
                .unwrap()
                .local_name(),
            "body"
        );
    }

    #[test]
    fn test_unknown_node_variant_is_skipped() {
        let (tree, root) = read_tree(
            r#"<n xmlns="http://www.daisy.org/urakawa/xuk/2.0" xmlns:x="urn:x">
                <cs><x:Future><cs><n/></cs></x:Future><n/></cs>
            </n>"#,
        )
        .unwrap();
        assert_eq!(tree.child_count(root), 1);
        assert_eq!(tree.node_count(root), 2);
    }

    #[test]
    fn test_wrong_element_for_node() {
        let result = read_tree(r#"<Presentation xmlns="http://www.daisy.org/urakawa/xuk/2.0"/>"#);
        assert!(matches!(result, Err(Error::XukFormat { .. })));
    }

    #[test]
    fn test_unknown_element_inside_node_is_skipped() {
        let (tree, root) = read_tree(
            r#"<n xmlns="http://www.daisy.org/urakawa/xuk/2.0">
                <mNotes><n/></mNotes>
                <cs><n/></cs>
            </n>"#,
        )
        .unwrap();
        assert_eq!(tree.node_count(root), 2);
    }

    #[test]
    fn test_deep_chain_round_trip() {
        const LEVELS: usize = 10_000;
        let mut tree = Tree::new(PresentationId::next());
        let mut top = tree.alloc(names::TREE_NODE);
        for _ in 1..LEVELS {
            let parent = tree.alloc(names::TREE_NODE);
            tree.append_child(parent, top).unwrap();
            top = parent;
        }

        let mut writer = XukWriter::new(&XukOptions::compact());
        tree.xuk_out_node(top, &mut writer).unwrap();
        let xml = String::from_utf8(writer.finish().unwrap()).unwrap();

        let (read, read_root) = read_tree(&xml).unwrap();
        assert_eq!(read.depth(read_root), LEVELS);
        assert!(read.value_equals(read_root, &tree, top));
    }

    #[test]
    fn test_write_read_back() {
        let mut tree = Tree::new(PresentationId::next());
        let root = tree.alloc(names::TREE_NODE);
        let child = tree.alloc(names::TREE_NODE);
        tree.set_property(child, Box::new(XmlProperty::new("p"))).unwrap();
        tree.append_child(root, child).unwrap();

        let mut writer = XukWriter::new(&XukOptions::compact());
        tree.xuk_out_node(root, &mut writer).unwrap();
        let xml = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(
            xml,
            r#"<n xmlns="http://www.daisy.org/urakawa/xuk/2.0"><cs><n><ps><xP localName="p"/></ps></n></cs></n>"#
        );

        let (read, read_root) = read_tree(&xml).unwrap();
        assert!(read.value_equals(read_root, &tree, root));
    }
}
