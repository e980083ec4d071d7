//! Buffered XUK output.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{XukNaming, XukOptions};
use crate::error::{Error, Result};
use crate::qname::{QName, compact_local_name};

/// Attributes collected for one start tag, in output order.
pub type XukAttributes = Vec<(&'static str, String)>;

struct OpenElement {
    name: String,
    namespace: String,
}

/// Writes XUK elements into an in-memory buffer.
///
/// Start tags are held back until the element gets content, so an element
/// without children or text is written self-closing.
pub struct XukWriter {
    inner: Writer<Vec<u8>>,
    naming: XukNaming,
    open: Vec<OpenElement>,
    pending: Option<BytesStart<'static>>,
}

impl XukWriter {
    pub fn new(options: &XukOptions) -> Self {
        let inner = match options.indent {
            Some(width) => Writer::new_with_indent(Vec::new(), b' ', width),
            None => Writer::new(Vec::new()),
        };
        Self {
            inner,
            naming: options.naming,
            open: Vec::new(),
            pending: None,
        }
    }

    pub fn naming(&self) -> XukNaming {
        self.naming
    }

    /// Write the `<?xml?>` declaration.
    pub fn declaration(&mut self) -> Result<()> {
        self.inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.inner.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn element_name(&self, qname: &QName) -> String {
        match self.naming {
            XukNaming::Compact if qname.is_xuk() => {
                compact_local_name(&qname.local_name).to_string()
            }
            _ => qname.local_name.to_string(),
        }
    }

    /// Open an element. Its namespace becomes the default namespace when it
    /// differs from the enclosing one.
    pub fn start(&mut self, qname: &QName, attributes: &[(&str, String)]) -> Result<()> {
        self.flush_pending()?;

        let name = self.element_name(qname);
        let mut start = BytesStart::new(name.clone());
        let enclosing = self.open.last().map(|e| e.namespace.as_str()).unwrap_or("");
        if qname.namespace != enclosing {
            start.push_attribute(("xmlns", &*qname.namespace));
        }
        for (key, value) in attributes {
            start.push_attribute((*key, value.as_str()));
        }

        self.open.push(OpenElement {
            name,
            namespace: qname.namespace.to_string(),
        });
        self.pending = Some(start);
        Ok(())
    }

    /// Write character data inside the current element.
    pub fn text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.flush_pending()?;
        self.inner.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    /// Close the innermost open element.
    pub fn end(&mut self) -> Result<()> {
        let element = self
            .open
            .pop()
            .ok_or_else(|| Error::xuk("document", "end tag without an open element"))?;
        match self.pending.take() {
            Some(start) => self.inner.write_event(Event::Empty(start))?,
            None => self
                .inner
                .write_event(Event::End(BytesEnd::new(element.name)))?,
        }
        Ok(())
    }

    /// An element holding only text.
    pub fn text_element(&mut self, qname: &QName, text: &str) -> Result<()> {
        self.start(qname, &[])?;
        self.text(text)?;
        self.end()
    }

    /// Take the finished document.
    pub fn finish(self) -> Result<Vec<u8>> {
        if let Some(element) = self.open.last() {
            return Err(Error::xuk(&element.name, "element left open"));
        }
        Ok(self.inner.into_inner())
    }
}
