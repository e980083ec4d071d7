use std::any::Any;

use super::{OwnerSlot, Property, PropertyCategory};
use crate::error::{Error, Result};
use crate::qname::{QName, names};
use crate::xuk::{XukAble, XukAttributes, XukContext, XukElement, XukReader, XukWriter};

/// One attribute of the source XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlAttribute {
    pub local_name: String,
    pub namespace_uri: String,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(
        local_name: impl Into<String>,
        namespace_uri: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            local_name: local_name.into(),
            namespace_uri: namespace_uri.into(),
            value: value.into(),
        }
    }

    fn read(element: &XukElement) -> Result<Self> {
        Ok(Self {
            local_name: element.required_attribute("localName")?.to_string(),
            namespace_uri: element.attribute("namespaceUri").unwrap_or_default().to_string(),
            value: element.attribute("value").unwrap_or_default().to_string(),
        })
    }
}

/// The XML element a node was built from: its name and attributes.
///
/// A property built by the factory has an empty local name until one is
/// set, and is persisted and read back that way.
#[derive(Debug, Clone, Default)]
pub struct XmlProperty {
    owner: OwnerSlot,
    local_name: String,
    namespace_uri: String,
    attributes: Vec<XmlAttribute>,
}

impl XmlProperty {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace_uri: impl Into<String>) -> Self {
        self.namespace_uri = namespace_uri.into();
        self
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    pub fn set_local_name(&mut self, local_name: impl Into<String>) -> Result<()> {
        let local_name = local_name.into();
        if local_name.is_empty() {
            return Err(Error::NullArgument("local_name"));
        }
        self.local_name = local_name;
        Ok(())
    }

    /// Add an attribute, replacing one with the same name. Returns the
    /// replaced attribute.
    pub fn set_attribute(&mut self, attribute: XmlAttribute) -> Option<XmlAttribute> {
        match self.position(&attribute.local_name, &attribute.namespace_uri) {
            Some(index) => Some(std::mem::replace(&mut self.attributes[index], attribute)),
            None => {
                self.attributes.push(attribute);
                None
            }
        }
    }

    pub fn attribute(&self, local_name: &str, namespace_uri: &str) -> Option<&XmlAttribute> {
        self.position(local_name, namespace_uri)
            .map(|index| &self.attributes[index])
    }

    pub fn remove_attribute(&mut self, local_name: &str, namespace_uri: &str) -> Option<XmlAttribute> {
        let index = self.position(local_name, namespace_uri)?;
        Some(self.attributes.remove(index))
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    fn position(&self, local_name: &str, namespace_uri: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| a.local_name == local_name && a.namespace_uri == namespace_uri)
    }

    fn read_attributes(&mut self, reader: &mut XukReader<'_>, list: &XukElement) -> Result<()> {
        reader.read_children(list, |reader, child| {
            if !child.is(&names::XML_ATTRIBUTE) {
                return Ok(false);
            }
            let attribute = XmlAttribute::read(child)?;
            reader.skip_element(child)?;
            self.set_attribute(attribute);
            Ok(true)
        })
    }
}

impl XukAble for XmlProperty {
    fn xuk_qname(&self) -> QName {
        names::XML_PROPERTY
    }

    fn xuk_in_attributes(&mut self, element: &XukElement) -> Result<()> {
        self.local_name = element.required_attribute("localName")?.to_string();
        self.namespace_uri = element.attribute("namespaceUri").unwrap_or_default().to_string();
        self.attributes.clear();
        Ok(())
    }

    fn xuk_in_child(
        &mut self,
        reader: &mut XukReader<'_>,
        child: &XukElement,
        _ctx: &XukContext<'_>,
    ) -> Result<bool> {
        if !child.is(&names::XML_ATTRIBUTES) {
            return Ok(false);
        }
        self.read_attributes(reader, child)?;
        Ok(true)
    }

    fn xuk_out_attributes(&self, attributes: &mut XukAttributes) {
        attributes.push(("localName", self.local_name.clone()));
        if !self.namespace_uri.is_empty() {
            attributes.push(("namespaceUri", self.namespace_uri.clone()));
        }
    }

    fn xuk_out_children(&self, writer: &mut XukWriter) -> Result<()> {
        if self.attributes.is_empty() {
            return Ok(());
        }
        writer.start(&names::XML_ATTRIBUTES, &[])?;
        for attribute in &self.attributes {
            let mut fields = vec![("localName", attribute.local_name.clone())];
            if !attribute.namespace_uri.is_empty() {
                fields.push(("namespaceUri", attribute.namespace_uri.clone()));
            }
            fields.push(("value", attribute.value.clone()));
            writer.start(&names::XML_ATTRIBUTE, &fields)?;
            writer.end()?;
        }
        writer.end()
    }
}

impl Property for XmlProperty {
    fn category(&self) -> PropertyCategory {
        PropertyCategory::XML
    }

    fn owner_slot(&self) -> &OwnerSlot {
        &self.owner
    }

    fn owner_slot_mut(&mut self) -> &mut OwnerSlot {
        &mut self.owner
    }

    fn copy_property(&self) -> Box<dyn Property> {
        Box::new(self.clone())
    }

    fn value_equals(&self, other: &dyn Property) -> bool {
        other.downcast_ref::<Self>().is_some_and(|other| {
            self.local_name == other.local_name
                && self.namespace_uri == other.namespace_uri
                && self.attributes == other.attributes
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{NodeFactory, PropertyFactory};
    use crate::media::MediaFactory;
    use crate::xuk::XukOptions;

    fn read(xml: &str) -> Result<XmlProperty> {
        let (nodes, properties, media) =
            (NodeFactory::new(), PropertyFactory::new(), MediaFactory::new());
        let ctx = XukContext {
            nodes: &nodes,
            properties: &properties,
            media: &media,
        };
        let mut reader = XukReader::from_str(xml);
        let element = reader.read_root()?;
        let mut property = XmlProperty::default();
        property.xuk_in(&mut reader, &element, &ctx)?;
        Ok(property)
    }

    #[test]
    fn test_attributes_replace_by_name() {
        let mut property = XmlProperty::new("p");
        assert!(property.set_attribute(XmlAttribute::new("id", "", "p1")).is_none());
        property.set_attribute(XmlAttribute::new("id", "urn:x", "other"));
        let replaced = property
            .set_attribute(XmlAttribute::new("id", "", "p2"))
            .unwrap();

        assert_eq!(replaced.value, "p1");
        assert_eq!(property.attributes().len(), 2);
        assert_eq!(property.attribute("id", "").unwrap().value, "p2");
        assert_eq!(property.remove_attribute("id", "urn:x").unwrap().value, "other");
        assert!(property.attribute("id", "urn:x").is_none());
    }

    #[test]
    fn test_read_compact() {
        let property = read(
            r#"<xP xmlns="http://www.daisy.org/urakawa/xuk/2.0" localName="h1" namespaceUri="http://www.w3.org/1999/xhtml">
                <xAs><xA localName="class" value="title"/><xA localName="id" value="c1"></xA></xAs>
            </xP>"#,
        )
        .unwrap();

        assert_eq!(property.local_name(), "h1");
        assert_eq!(property.namespace_uri(), "http://www.w3.org/1999/xhtml");
        assert_eq!(
            property.attributes(),
            &[
                XmlAttribute::new("class", "", "title"),
                XmlAttribute::new("id", "", "c1")
            ]
        );
    }

    #[test]
    fn test_local_name_required() {
        let result = read(r#"<XmlProperty xmlns="http://www.daisy.org/urakawa/xuk/2.0"/>"#);
        assert!(matches!(result, Err(Error::XukFormat { .. })));
        assert!(XmlProperty::new("p").set_local_name("").is_err());
    }

    #[test]
    fn test_unnamed_property_reads_back() {
        let property = XmlProperty::default();
        let mut writer = XukWriter::new(&XukOptions::compact());
        property.xuk_out(&mut writer).unwrap();
        let xml = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(xml.contains(r#"localName="""#));

        let read_back = read(&xml).unwrap();
        assert_eq!(read_back.local_name(), "");
        assert!(read_back.value_equals(&property));
    }

    #[test]
    fn test_write_and_compare() {
        let mut property = XmlProperty::new("p");
        property.set_attribute(XmlAttribute::new("lang", "http://www.w3.org/XML/1998/namespace", "en"));

        let mut writer = XukWriter::new(&XukOptions::default().with_indent(None));
        property.xuk_out(&mut writer).unwrap();
        let xml = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(xml.contains(r#"<XmlAttribute localName="lang" namespaceUri="http://www.w3.org/XML/1998/namespace" value="en"/>"#));

        let read_back = read(&xml).unwrap();
        assert!(read_back.value_equals(&property));
        assert!(!read_back.value_equals(&XmlProperty::new("p")));
    }
}
