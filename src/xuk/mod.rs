//! The XUK streaming serialization protocol.
//!
//! Every persisted type reads and writes itself with the same cursor
//! discipline:
//!
//! 1. On entry the reader has just consumed the type's own start tag, handed
//!    over as an [`XukElement`]. A QName mismatch is a format error.
//! 2. Attributes are read from the element, in any order; unknown ones are
//!    ignored.
//! 3. Child elements are dispatched by QName. A handler either consumes a
//!    child completely or declines it, in which case the reader skips the
//!    whole child subtree. Unknown children are therefore tolerated.
//! 4. On exit the reader has consumed the matching end tag.
//!
//! Writing mirrors this: start tag, attributes, each child's own
//! self-contained output, end tag.

mod document;
mod reader;
mod writer;

pub use reader::{XukElement, XukReader};
pub use writer::{XukAttributes, XukWriter};

use crate::error::{Error, Result};
use crate::factory::{NodeFactory, PropertyFactory};
use crate::media::MediaFactory;
use crate::qname::QName;

/// Which spelling of built-in element names to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XukNaming {
    /// Readable names such as `TreeNode`.
    #[default]
    Pretty,
    /// Short names such as `n`.
    Compact,
}

/// Output settings for XUK documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XukOptions {
    pub naming: XukNaming,
    /// Spaces per nesting level, or `None` for a single line.
    pub indent: Option<usize>,
}

impl Default for XukOptions {
    fn default() -> Self {
        Self {
            naming: XukNaming::Pretty,
            indent: Some(2),
        }
    }
}

impl XukOptions {
    /// Compact names, no indentation.
    pub fn compact() -> Self {
        Self {
            naming: XukNaming::Compact,
            indent: None,
        }
    }

    pub fn with_naming(mut self, naming: XukNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }
}

/// Factories consulted when a child element must be turned into an object.
#[derive(Debug, Clone, Copy)]
pub struct XukContext<'a> {
    pub nodes: &'a NodeFactory,
    pub properties: &'a PropertyFactory,
    pub media: &'a MediaFactory,
}

/// A type that reads and writes itself as one XUK element.
pub trait XukAble {
    /// The element name this value is persisted under.
    fn xuk_qname(&self) -> QName;

    fn xuk_in_attributes(&mut self, element: &XukElement) -> Result<()> {
        let _ = element;
        Ok(())
    }

    /// Handle one child element. Return `Ok(false)` without reading
    /// anything to have the child skipped.
    fn xuk_in_child(
        &mut self,
        reader: &mut XukReader<'_>,
        child: &XukElement,
        ctx: &XukContext<'_>,
    ) -> Result<bool> {
        let _ = (reader, child, ctx);
        Ok(false)
    }

    fn xuk_out_attributes(&self, attributes: &mut XukAttributes) {
        let _ = attributes;
    }

    fn xuk_out_children(&self, writer: &mut XukWriter) -> Result<()> {
        let _ = writer;
        Ok(())
    }

    /// Read this value from `element`, whose start tag was just consumed.
    fn xuk_in(
        &mut self,
        reader: &mut XukReader<'_>,
        element: &XukElement,
        ctx: &XukContext<'_>,
    ) -> Result<()> {
        let expected = self.xuk_qname();
        if !element.is(&expected) {
            return Err(Error::xuk(
                element.qname(),
                format!("expected <{expected}>"),
            ));
        }
        self.xuk_in_attributes(element)?;
        reader.read_children(element, |reader, child| self.xuk_in_child(reader, child, ctx))
    }

    /// Write this value as one complete element.
    fn xuk_out(&self, writer: &mut XukWriter) -> Result<()> {
        let mut attributes = XukAttributes::new();
        self.xuk_out_attributes(&mut attributes);
        writer.start(&self.xuk_qname(), &attributes)?;
        self.xuk_out_children(writer)?;
        writer.end()
    }
}
