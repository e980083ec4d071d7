//! Whole-document reading and writing for a [`Presentation`].

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, info, instrument};

use super::{XukAble, XukContext, XukElement, XukOptions, XukReader, XukWriter};
use crate::error::{Error, Result};
use crate::factory::{NodeFactory, PropertyFactory};
use crate::presentation::Presentation;
use crate::property::{ChannelsProperty, PropertyCategory};
use crate::qname::names;

impl Presentation {
    /// Read a document using the built-in factories.
    pub fn load<R: BufRead>(source: R) -> Result<Self> {
        Self::load_with(source, NodeFactory::new(), PropertyFactory::new())
    }

    /// Read a document using host factories.
    pub fn load_with<R: BufRead>(
        source: R,
        node_factory: NodeFactory,
        property_factory: PropertyFactory,
    ) -> Result<Self> {
        let mut presentation = Self::with_factories(node_factory, property_factory)?;
        presentation.read_xuk(source)?;
        Ok(presentation)
    }

    pub fn from_xuk_str(content: &str) -> Result<Self> {
        Self::load(content.as_bytes())
    }

    /// Read a document file using the built-in factories.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::load(BufReader::new(file))
    }

    /// Replace the root and channels of this presentation with the content
    /// of a document. Any error leaves the presentation unusable and should
    /// abort the load as a whole.
    #[instrument(skip_all, fields(presentation = ?self.id()))]
    pub fn read_xuk<R: BufRead>(&mut self, source: R) -> Result<()> {
        let mut reader = XukReader::new(source);
        let element = reader.read_root()?;
        self.xuk_in(&mut reader, &element)?;
        info!(nodes = self.tree.node_count(self.root), channels = self.channels.len(), "loaded document");
        Ok(())
    }

    /// Read the `Presentation` element whose start tag was just consumed.
    pub fn xuk_in(&mut self, reader: &mut XukReader<'_>, element: &XukElement) -> Result<()> {
        if !element.is(&names::PRESENTATION) {
            return Err(Error::xuk(
                element.qname(),
                format!("expected <{}> as document element", names::PRESENTATION),
            ));
        }

        let Presentation {
            tree,
            root,
            node_factory,
            property_factory,
            media_factory,
            channels,
        } = self;
        let ctx = XukContext {
            nodes: node_factory,
            properties: property_factory,
            media: media_factory,
        };

        reader.read_children(element, |reader, child| {
            if child.is(&names::CHANNELS_MANAGER_SLOT) {
                reader.read_children(child, |reader, manager| {
                    if !manager.is(&names::CHANNELS_MANAGER) {
                        return Ok(false);
                    }
                    channels.xuk_in(reader, manager, &ctx)?;
                    Ok(true)
                })?;
                Ok(true)
            } else if child.is(&names::ROOT_NODE) {
                reader.read_children(child, |reader, node| {
                    let qname = node.qname();
                    let Some(template) = ctx.nodes.create(&qname.local_name, &qname.namespace)?
                    else {
                        return Ok(false);
                    };
                    let created = tree.instantiate(template);
                    tree.xuk_in_node(created, reader, node, &ctx)?;
                    tree.mark_root(created);
                    *root = created;
                    Ok(true)
                })?;
                Ok(true)
            } else {
                Ok(false)
            }
        })?;

        self.check_channel_references()
    }

    /// Every channel a reachable mapping refers to must exist.
    fn check_channel_references(&self) -> Result<()> {
        for node in self.tree.descendants(self.root) {
            if let Some(mappings) = self
                .tree
                .property_as::<ChannelsProperty>(node, &PropertyCategory::CHANNELS)
            {
                mappings.check_channels(|id| self.channels.resolve(id).is_some())?;
            }
        }
        Ok(())
    }

    /// Write the `Presentation` element.
    pub fn xuk_out(&self, writer: &mut XukWriter) -> Result<()> {
        writer.start(&names::PRESENTATION, &[])?;

        writer.start(&names::CHANNELS_MANAGER_SLOT, &[])?;
        self.channels.xuk_out(writer)?;
        writer.end()?;

        writer.start(&names::ROOT_NODE, &[])?;
        self.tree.xuk_out_node(self.root, writer)?;
        writer.end()?;

        writer.end()
    }

    /// Serialize the whole document, then hand it to `sink` in one piece.
    #[instrument(skip_all, fields(presentation = ?self.id()))]
    pub fn write_xuk<W: Write>(&self, mut sink: W, options: &XukOptions) -> Result<()> {
        let mut writer = XukWriter::new(options);
        writer.declaration()?;
        self.xuk_out(&mut writer)?;
        let bytes = writer.finish()?;
        debug!(bytes = bytes.len(), naming = ?options.naming, "serialized document");
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }

    pub fn to_xuk_string(&self, options: &XukOptions) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_xuk(&mut buffer, options)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Write the document to a file, creating or truncating it.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>, options: &XukOptions) -> Result<()> {
        // Serialize first so a failure never truncates an existing file.
        let mut buffer = Vec::new();
        self.write_xuk(&mut buffer, options)?;
        std::fs::write(path, buffer)?;
        Ok(())
    }
}
