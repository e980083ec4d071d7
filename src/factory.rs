//! QName-keyed registries that turn element names into fresh objects.
//!
//! A factory answers "recognised → new instance, unrecognised → none".
//! Hosts extend the vocabulary by registering constructors for their own
//! names; the XUK reader consults the factories of the presentation it is
//! loading into.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::property::{ChannelsProperty, Property, XmlProperty};
use crate::qname::{QName, names};
use crate::tree::PresentationId;

/// Blueprint for a node variant: its element name and the properties a
/// freshly created node of that variant starts with.
#[derive(Debug)]
pub struct NodeTemplate {
    pub qname: QName,
    pub properties: Vec<Box<dyn Property>>,
}

impl NodeTemplate {
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: Box<dyn Property>) -> Self {
        self.properties.push(property);
        self
    }
}

pub type NodeConstructor = fn() -> NodeTemplate;

pub type PropertyConstructor = fn() -> Box<dyn Property>;

fn tree_node() -> NodeTemplate {
    NodeTemplate::new(names::TREE_NODE)
}

fn channels_property() -> Box<dyn Property> {
    Box::new(ChannelsProperty::new())
}

fn xml_property() -> Box<dyn Property> {
    Box::new(XmlProperty::default())
}

fn bind_once(
    slot: &mut Option<PresentationId>,
    presentation: PresentationId,
    what: &'static str,
) -> Result<()> {
    if slot.is_some() {
        return Err(Error::AlreadyInitialized(what));
    }
    *slot = Some(presentation);
    Ok(())
}

fn check_local_name(local_name: &str) -> Result<()> {
    if local_name.is_empty() {
        Err(Error::NullArgument("local_name"))
    } else {
        Ok(())
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// Creates tree-node variants by element name.
#[derive(Debug, Clone)]
pub struct NodeFactory {
    presentation: Option<PresentationId>,
    constructors: HashMap<QName, NodeConstructor>,
}

impl Default for NodeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeFactory {
    /// A factory that knows the base `TreeNode` variant.
    pub fn new() -> Self {
        let mut constructors = HashMap::new();
        constructors.insert(names::TREE_NODE, tree_node as NodeConstructor);
        Self {
            presentation: None,
            constructors,
        }
    }

    /// Register a node variant, replacing any constructor for the name.
    pub fn register(&mut self, qname: QName, constructor: NodeConstructor) {
        self.constructors.insert(qname, constructor);
    }

    /// The presentation this factory is bound to.
    pub fn presentation(&self) -> Option<PresentationId> {
        self.presentation
    }

    pub fn is_recognized(&self, local_name: &str, namespace: &str) -> bool {
        self.constructors
            .keys()
            .any(|qname| qname.matches(local_name, namespace))
    }

    /// Build a template for the named variant, or `None` if the name is
    /// not registered.
    pub fn create(&self, local_name: &str, namespace: &str) -> Result<Option<NodeTemplate>> {
        if self.presentation.is_none() {
            return Err(Error::NotInitialized("node factory"));
        }
        check_local_name(local_name)?;

        let Some((qname, constructor)) = self
            .constructors
            .iter()
            .find(|(qname, _)| qname.matches(local_name, namespace))
        else {
            return Ok(None);
        };

        let template = constructor();
        if &template.qname != qname {
            return Err(Error::FactoryCannotCreate(qname.clone()));
        }
        Ok(Some(template))
    }

    /// A template for the base `TreeNode` variant.
    pub fn create_default(&self) -> Result<NodeTemplate> {
        if self.presentation.is_none() {
            return Err(Error::NotInitialized("node factory"));
        }
        Ok(self.default_template())
    }

    pub(crate) fn default_template(&self) -> NodeTemplate {
        tree_node()
    }

    /// The built-in factory, already bound to `presentation`.
    pub(crate) fn bound_to(presentation: PresentationId) -> Self {
        Self {
            presentation: Some(presentation),
            ..Self::new()
        }
    }

    pub(crate) fn bind(&mut self, presentation: PresentationId) -> Result<()> {
        bind_once(&mut self.presentation, presentation, "node factory")
    }
}

// ============================================================================
// Properties
// ============================================================================

/// Creates properties by element name.
#[derive(Debug, Clone)]
pub struct PropertyFactory {
    presentation: Option<PresentationId>,
    constructors: HashMap<QName, PropertyConstructor>,
}

impl Default for PropertyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyFactory {
    /// A factory that knows `ChannelsProperty` and `XmlProperty`.
    pub fn new() -> Self {
        let mut constructors = HashMap::new();
        constructors.insert(names::CHANNELS_PROPERTY, channels_property as PropertyConstructor);
        constructors.insert(names::XML_PROPERTY, xml_property as PropertyConstructor);
        Self {
            presentation: None,
            constructors,
        }
    }

    pub fn register(&mut self, qname: QName, constructor: PropertyConstructor) {
        self.constructors.insert(qname, constructor);
    }

    pub fn presentation(&self) -> Option<PresentationId> {
        self.presentation
    }

    pub fn is_recognized(&self, local_name: &str, namespace: &str) -> bool {
        self.constructors
            .keys()
            .any(|qname| qname.matches(local_name, namespace))
    }

    /// A fresh, unowned property for the named element, or `None` if the
    /// name is not registered.
    pub fn create(&self, local_name: &str, namespace: &str) -> Result<Option<Box<dyn Property>>> {
        if self.presentation.is_none() {
            return Err(Error::NotInitialized("property factory"));
        }
        check_local_name(local_name)?;

        let Some((qname, constructor)) = self
            .constructors
            .iter()
            .find(|(qname, _)| qname.matches(local_name, namespace))
        else {
            return Ok(None);
        };

        let property = constructor();
        if &property.xuk_qname() != qname {
            return Err(Error::FactoryCannotCreate(qname.clone()));
        }
        Ok(Some(property))
    }

    pub(crate) fn bound_to(presentation: PresentationId) -> Self {
        Self {
            presentation: Some(presentation),
            ..Self::new()
        }
    }

    pub(crate) fn bind(&mut self, presentation: PresentationId) -> Result<()> {
        bind_once(&mut self.presentation, presentation, "property factory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyCategory;
    use crate::qname::XUK_NS;

    fn bound_nodes() -> NodeFactory {
        let mut factory = NodeFactory::new();
        factory.bind(PresentationId::next()).unwrap();
        factory
    }

    #[test]
    fn test_unbound_factory() {
        let factory = NodeFactory::new();
        assert!(matches!(
            factory.create("TreeNode", XUK_NS),
            Err(Error::NotInitialized(_))
        ));
        assert!(matches!(
            PropertyFactory::new().create("XmlProperty", XUK_NS),
            Err(Error::NotInitialized(_))
        ));
    }

    #[test]
    fn test_recognised_and_unrecognised() {
        let factory = bound_nodes();
        let template = factory.create("TreeNode", XUK_NS).unwrap().unwrap();
        assert_eq!(template.qname, names::TREE_NODE);
        assert!(factory.create("TreeNode", "urn:other").unwrap().is_none());
        assert!(factory.create("Paragraph", XUK_NS).unwrap().is_none());
        assert!(matches!(
            factory.create("", XUK_NS),
            Err(Error::NullArgument(_))
        ));
    }

    #[test]
    fn test_rebinding_rejected_even_for_clones() {
        let factory = bound_nodes();
        let mut clone = factory.clone();
        assert!(matches!(
            clone.bind(PresentationId::next()),
            Err(Error::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_mismatched_constructor() {
        let mut factory = bound_nodes();
        factory.register(QName::new("urn:host", "Heading"), || {
            NodeTemplate::new(QName::new("urn:host", "Paragraph"))
        });
        assert!(matches!(
            factory.create("Heading", "urn:host"),
            Err(Error::FactoryCannotCreate(_))
        ));
    }

    #[test]
    fn test_host_variant_with_initial_property() {
        let mut factory = bound_nodes();
        factory.register(QName::new("urn:host", "Heading"), || {
            NodeTemplate::new(QName::new("urn:host", "Heading"))
                .with_property(Box::new(XmlProperty::new("h1")))
        });
        let template = factory.create("Heading", "urn:host").unwrap().unwrap();
        assert_eq!(template.properties.len(), 1);
        assert_eq!(template.properties[0].category(), PropertyCategory::XML);
    }

    #[test]
    fn test_bound_to_rejects_rebinding() {
        let id = PresentationId::next();
        let mut nodes = NodeFactory::bound_to(id);
        assert_eq!(nodes.presentation(), Some(id));
        assert!(nodes.create("TreeNode", XUK_NS).unwrap().is_some());
        assert!(matches!(
            nodes.bind(PresentationId::next()),
            Err(Error::AlreadyInitialized(_))
        ));
        let mut properties = PropertyFactory::bound_to(id);
        assert!(matches!(
            properties.bind(id),
            Err(Error::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_builtin_properties() {
        let mut factory = PropertyFactory::new();
        factory.bind(PresentationId::next()).unwrap();
        let channels = factory.create("ChannelsProperty", XUK_NS).unwrap().unwrap();
        assert_eq!(channels.category(), PropertyCategory::CHANNELS);
        assert_eq!(channels.owner(), None);
        assert!(factory.is_recognized("XmlProperty", XUK_NS));
        assert!(factory.create("Nope", XUK_NS).unwrap().is_none());
    }
}
