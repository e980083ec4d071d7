//! Pull cursor over a XUK document.
//!
//! Wraps a quick-xml reader with the pieces the protocol needs: namespace
//! scope resolution, alias canonicalisation, entity resolution and a depth
//! counter that lets `read_children` verify that every handler left the
//! cursor exactly where it found it.

use std::io::BufRead;
use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::error::{Error, Result};
use crate::qname::{QName, XUK_NS, canonical_local_name};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A start tag that has just been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XukElement {
    qname: QName,
    attributes: Vec<(String, String)>,
    /// Reader depth once this element is open.
    depth: usize,
}

impl XukElement {
    pub fn qname(&self) -> &QName {
        &self.qname
    }

    /// Check the element name.
    pub fn is(&self, qname: &QName) -> bool {
        &self.qname == qname
    }

    /// An attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// An attribute that must be present.
    pub fn required_attribute(&self, name: &str) -> Result<&str> {
        self.attribute(name).ok_or_else(|| {
            Error::xuk(
                &self.qname,
                format!("missing required attribute '{name}'"),
            )
        })
    }

    /// An optional attribute parsed as `T`. Invalid literals are errors.
    pub fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        match self.attribute(name) {
            Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
                Error::xuk(
                    &self.qname,
                    format!("invalid value '{raw}' for attribute '{name}'"),
                )
            }),
            None => Ok(None),
        }
    }
}

enum Step {
    Start(XukElement),
    End,
    Text(String),
    Eof,
}

/// A namespace declaration in force from the element at `depth` down.
struct Binding {
    depth: usize,
    /// "" for the default namespace.
    prefix: String,
    uri: String,
}

/// Streaming reader positioned inside a XUK document.
pub struct XukReader<'r> {
    inner: Reader<Box<dyn BufRead + 'r>>,
    buf: Vec<u8>,
    bindings: Vec<Binding>,
    depth: usize,
}

impl<'r> XukReader<'r> {
    pub fn new<R: BufRead + 'r>(source: R) -> Self {
        let source: Box<dyn BufRead + 'r> = Box::new(source);
        let mut inner = Reader::from_reader(source);
        let config = inner.config_mut();
        config.expand_empty_elements = true;
        config.trim_text(false);
        Self {
            inner,
            buf: Vec::new(),
            bindings: Vec::new(),
            depth: 0,
        }
    }

    pub fn from_str(content: &'r str) -> Self {
        Self::new(content.as_bytes())
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn next_step(&mut self) -> Result<Step> {
        loop {
            self.buf.clear();
            let event = self.inner.read_event_into(&mut self.buf)?;
            match event {
                Event::Start(start) => {
                    let element = open_element(&mut self.bindings, &start, self.depth + 1)?;
                    self.depth += 1;
                    return Ok(Step::Start(element));
                }
                Event::End(_) => {
                    while self.bindings.last().is_some_and(|b| b.depth >= self.depth) {
                        self.bindings.pop();
                    }
                    self.depth = self.depth.saturating_sub(1);
                    return Ok(Step::End);
                }
                Event::Text(text) => {
                    return Ok(Step::Text(String::from_utf8_lossy(&text).into_owned()));
                }
                Event::CData(data) => {
                    return Ok(Step::Text(String::from_utf8_lossy(&data).into_owned()));
                }
                Event::GeneralRef(reference) => {
                    let entity = String::from_utf8_lossy(reference.as_ref()).into_owned();
                    return match resolve_entity(&entity) {
                        Some(resolved) => Ok(Step::Text(resolved)),
                        None => Err(Error::xuk(
                            "document",
                            format!("unknown entity reference '&{entity};'"),
                        )),
                    };
                }
                Event::Eof => return Ok(Step::Eof),
                // Self-closing tags arrive expanded; the rest is
                // declarations, comments, processing instructions, doctype
                _ => {}
            }
        }
    }

    /// Advance to the document element and return it.
    pub fn read_root(&mut self) -> Result<XukElement> {
        loop {
            match self.next_step()? {
                Step::Start(element) => return Ok(element),
                Step::Text(text) if text.trim().is_empty() => {}
                Step::Text(_) | Step::End => {
                    return Err(Error::xuk("document", "content before the root element"));
                }
                Step::Eof => return Err(Error::xuk("document", "no root element")),
            }
        }
    }

    /// Advance to the next child of `parent`, which must be the innermost
    /// open element. Returns `None` once the end tag of `parent` has been
    /// consumed. Text between children is ignored.
    pub fn next_child(&mut self, parent: &XukElement) -> Result<Option<XukElement>> {
        if self.depth != parent.depth {
            return Err(Error::xuk(
                &parent.qname,
                "cursor is not directly inside this element",
            ));
        }
        loop {
            match self.next_step()? {
                Step::Start(child) => return Ok(Some(child)),
                Step::End => return Ok(None),
                Step::Text(_) => {}
                Step::Eof => {
                    return Err(Error::xuk(&parent.qname, "unexpected end of document"));
                }
            }
        }
    }

    /// Walk the children of `parent`, which must be the innermost open
    /// element, up to and including its end tag.
    ///
    /// `handler` is called for each child start tag. It returns `Ok(true)`
    /// after consuming the child through its end tag, or `Ok(false)` to
    /// have the child skipped. Text between children is ignored.
    pub fn read_children<F>(&mut self, parent: &XukElement, mut handler: F) -> Result<()>
    where
        F: FnMut(&mut Self, &XukElement) -> Result<bool>,
    {
        while let Some(child) = self.next_child(parent)? {
            if handler(self, &child)? {
                if self.depth != parent.depth {
                    return Err(Error::xuk(
                        &child.qname,
                        "element was not consumed up to its end tag",
                    ));
                }
            } else {
                self.skip_unrecognised(parent, &child)?;
            }
        }
        Ok(())
    }

    /// Skip a child no handler claimed.
    pub fn skip_unrecognised(&mut self, parent: &XukElement, child: &XukElement) -> Result<()> {
        debug!(element = %child.qname, parent = %parent.qname, "skipping unrecognised element");
        self.skip_element(child)
    }

    /// Consume the rest of `element`, including any nested content.
    pub fn skip_element(&mut self, element: &XukElement) -> Result<()> {
        while self.depth >= element.depth {
            if let Step::Eof = self.next_step()? {
                return Err(Error::xuk(&element.qname, "unexpected end of document"));
            }
        }
        Ok(())
    }

    /// Collect the text content of `element` up to its end tag. Nested
    /// elements are skipped.
    pub fn read_text(&mut self, element: &XukElement) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next_step()? {
                Step::Start(child) => {
                    debug!(element = %child.qname, parent = %element.qname, "skipping element inside text");
                    self.skip_element(&child)?;
                }
                Step::Text(chunk) => text.push_str(&chunk),
                Step::End => return Ok(text),
                Step::Eof => {
                    return Err(Error::xuk(&element.qname, "unexpected end of document"));
                }
            }
        }
    }
}

/// Split `prefix:local` into its parts.
fn split_name(name: &str) -> (&str, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", name),
    }
}

fn resolve_prefix<'s>(bindings: &'s [Binding], prefix: &str) -> Option<&'s str> {
    if prefix == "xml" {
        return Some(XML_NS);
    }
    bindings
        .iter()
        .rev()
        .find(|b| b.prefix == prefix)
        .map(|b| b.uri.as_str())
}

/// Push the namespace declarations of `start` and build its element.
fn open_element(bindings: &mut Vec<Binding>, start: &BytesStart<'_>, depth: usize) -> Result<XukElement> {
    let raw_name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::xuk(&raw_name, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw_value = String::from_utf8_lossy(&attr.value);
        let value = unescape(&raw_value)
            .map_err(|e| Error::xuk(&raw_name, e.to_string()))?
            .into_owned();

        if key == "xmlns" {
            bindings.push(Binding {
                depth,
                prefix: String::new(),
                uri: value,
            });
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            bindings.push(Binding {
                depth,
                prefix: prefix.to_string(),
                uri: value,
            });
        } else {
            let (_, local) = split_name(&key);
            attributes.push((local.to_string(), value));
        }
    }

    let (prefix, local) = split_name(&raw_name);
    let namespace = match resolve_prefix(bindings, prefix) {
        Some(uri) => uri.to_string(),
        None if prefix.is_empty() => String::new(),
        None => {
            return Err(Error::xuk(
                &raw_name,
                format!("undeclared namespace prefix '{prefix}'"),
            ));
        }
    };
    let local = if namespace == XUK_NS {
        canonical_local_name(local)
    } else {
        local
    };

    Ok(XukElement {
        qname: QName::new(namespace, local.to_string()),
        attributes,
        depth,
    })
}

/// Resolve a predefined or numeric entity reference.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qname::names;

    const DOC: &str = r#"<?xml version="1.0"?>
<n xmlns="http://www.daisy.org/urakawa/xuk/2.0" xmlns:ext="http://example.org/ext">
  <ext:unknown a="1"><deep><deeper/></deep></ext:unknown>
  <mText>fish &amp; chips &#x41;</mText>
</n>"#;

    #[test]
    fn test_root_is_canonicalised() {
        let mut reader = XukReader::from_str(DOC);
        let root = reader.read_root().unwrap();
        assert!(root.is(&names::TREE_NODE));
        assert_eq!(reader.depth(), 1);
    }

    #[test]
    fn test_read_children_skips_declined() {
        let mut reader = XukReader::from_str(DOC);
        let root = reader.read_root().unwrap();
        let mut seen = Vec::new();
        let mut text = String::new();

        reader
            .read_children(&root, |reader, child| {
                seen.push(child.qname().clone());
                if child.is(&names::TEXT) {
                    text = reader.read_text(child)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            })
            .unwrap();

        assert_eq!(
            seen,
            vec![
                QName::new("http://example.org/ext", "unknown"),
                names::TEXT
            ]
        );
        assert_eq!(text, "fish & chips A");
        assert_eq!(reader.depth(), 0);
    }

    #[test]
    fn test_half_consumed_child_is_an_error() {
        let mut reader = XukReader::from_str(DOC);
        let root = reader.read_root().unwrap();

        let result = reader.read_children(&root, |reader, child| {
            // Claim the element after reading only its first nested tag.
            if child.attribute("a").is_some() {
                reader.next_step()?;
                return Ok(true);
            }
            Ok(false)
        });

        assert!(matches!(result, Err(Error::XukFormat { .. })));
    }

    #[test]
    fn test_next_child_pull_loop() {
        let mut reader = XukReader::from_str(DOC);
        let root = reader.read_root().unwrap();

        let first = reader.next_child(&root).unwrap().unwrap();
        assert_eq!(first.qname().namespace, "http://example.org/ext");
        // Still inside the first child, so the parent cannot be advanced.
        assert!(reader.next_child(&root).is_err());
        reader.skip_element(&first).unwrap();

        let second = reader.next_child(&root).unwrap().unwrap();
        assert_eq!(reader.read_text(&second).unwrap(), "fish & chips A");
        assert!(reader.next_child(&root).unwrap().is_none());
        assert_eq!(reader.depth(), 0);
    }

    #[test]
    fn test_namespace_declarations_go_out_of_scope() {
        let mut reader = XukReader::from_str(
            r#"<a xmlns="urn:a"><b xmlns="urn:b" xmlns:p="urn:p"><p:c/></b><d/></a>"#,
        );
        let a = reader.read_root().unwrap();
        let b = reader.next_child(&a).unwrap().unwrap();
        assert_eq!(b.qname(), &QName::new("urn:b", "b"));
        let c = reader.next_child(&b).unwrap().unwrap();
        assert_eq!(c.qname(), &QName::new("urn:p", "c"));
        reader.skip_element(&c).unwrap();
        assert!(reader.next_child(&b).unwrap().is_none());
        let d = reader.next_child(&a).unwrap().unwrap();
        assert_eq!(d.qname(), &QName::new("urn:a", "d"));
    }

    #[test]
    fn test_premature_end() {
        let mut reader = XukReader::from_str(r#"<n xmlns="http://www.daisy.org/urakawa/xuk/2.0"><ps>"#);
        let root = reader.read_root().unwrap();
        let result = reader.read_children(&root, |_, _| Ok(false));
        assert!(matches!(result, Err(Error::XukFormat { .. })));
    }

    #[test]
    fn test_attributes() {
        let mut reader =
            XukReader::from_str(r#"<a x="1" y="two &lt; three" xml:lang="en" z="oops"/>"#);
        let root = reader.read_root().unwrap();

        assert_eq!(root.attribute("y"), Some("two < three"));
        assert_eq!(root.attribute("lang"), Some("en"));
        assert_eq!(root.parse_attribute::<u32>("x").unwrap(), Some(1));
        assert_eq!(root.parse_attribute::<u32>("missing").unwrap(), None);
        assert!(root.parse_attribute::<u32>("z").is_err());
        assert!(root.required_attribute("missing").is_err());
    }

    #[test]
    fn test_undeclared_prefix() {
        let mut reader = XukReader::from_str("<p:a/>");
        assert!(matches!(
            reader.read_root(),
            Err(Error::XukFormat { .. })
        ));
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp"), Some("&".to_string()));
        assert_eq!(resolve_entity("#65"), Some("A".to_string()));
        assert_eq!(resolve_entity("#x2019"), Some("\u{2019}".to_string()));
        assert_eq!(resolve_entity("nbsp"), None);
    }
}
