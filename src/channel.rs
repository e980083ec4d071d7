//! Named output channels (audio, text, ...) and their registry.

use tracing::debug;

use crate::error::{Error, Result};
use crate::qname::{QName, names};
use crate::xuk::{XukAble, XukAttributes, XukContext, XukElement, XukReader, XukWriter};

/// A rendering channel, referenced from channel mappings by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl XukAble for Channel {
    fn xuk_qname(&self) -> QName {
        names::CHANNEL
    }

    fn xuk_in_attributes(&mut self, element: &XukElement) -> Result<()> {
        let id = element.required_attribute("uid")?;
        if id.is_empty() {
            return Err(Error::xuk(element.qname(), "empty channel uid"));
        }
        self.id = id.to_string();
        self.name = element.attribute("name").unwrap_or_default().to_string();
        Ok(())
    }

    fn xuk_out_attributes(&self, attributes: &mut XukAttributes) {
        attributes.push(("uid", self.id.clone()));
        attributes.push(("name", self.name.clone()));
    }
}

/// The channels of one presentation, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelsManager {
    channels: Vec<Channel>,
    next_index: usize,
}

impl ChannelsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel under a generated id (`CH0`, `CH1`, ...).
    pub fn add_channel(&mut self, name: impl Into<String>) -> Channel {
        let id = loop {
            let candidate = format!("CH{}", self.next_index);
            self.next_index += 1;
            if self.resolve(&candidate).is_none() {
                break candidate;
            }
        };
        let channel = Channel::new(id, name);
        self.channels.push(channel.clone());
        channel
    }

    /// Add a channel under an explicit id.
    pub fn add_channel_with_id(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Channel> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::NullArgument("channel id"));
        }
        if self.resolve(&id).is_some() {
            return Err(Error::DuplicateChannel(id));
        }
        let channel = Channel::new(id, name);
        self.channels.push(channel.clone());
        Ok(channel)
    }

    pub fn resolve(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// First channel with the given display name.
    pub fn channel_by_name(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn remove_channel(&mut self, id: &str) -> Option<Channel> {
        let index = self.channels.iter().position(|c| c.id == id)?;
        Some(self.channels.remove(index))
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn read_channels(&mut self, reader: &mut XukReader<'_>, list: &XukElement, ctx: &XukContext<'_>) -> Result<()> {
        reader.read_children(list, |reader, child| {
            if !child.is(&names::CHANNEL) {
                return Ok(false);
            }
            let mut channel = Channel::default();
            channel.xuk_in(reader, child, ctx)?;
            if self.resolve(&channel.id).is_some() {
                return Err(Error::xuk(
                    child.qname(),
                    format!("duplicate channel uid '{}'", channel.id),
                ));
            }
            debug!(id = %channel.id, name = %channel.name, "read channel");
            self.channels.push(channel);
            Ok(true)
        })
    }
}

impl XukAble for ChannelsManager {
    fn xuk_qname(&self) -> QName {
        names::CHANNELS_MANAGER
    }

    fn xuk_in_attributes(&mut self, _element: &XukElement) -> Result<()> {
        // Reading replaces the current content
        self.channels.clear();
        self.next_index = 0;
        Ok(())
    }

    fn xuk_in_child(
        &mut self,
        reader: &mut XukReader<'_>,
        child: &XukElement,
        ctx: &XukContext<'_>,
    ) -> Result<bool> {
        if !child.is(&names::CHANNELS) {
            return Ok(false);
        }
        self.read_channels(reader, child, ctx)?;
        Ok(true)
    }

    fn xuk_out_children(&self, writer: &mut XukWriter) -> Result<()> {
        writer.start(&names::CHANNELS, &[])?;
        for channel in &self.channels {
            channel.xuk_out(writer)?;
        }
        writer.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{NodeFactory, PropertyFactory};
    use crate::media::MediaFactory;
    use crate::xuk::XukOptions;

    fn read(xml: &str) -> Result<ChannelsManager> {
        let (nodes, properties, media) =
            (NodeFactory::new(), PropertyFactory::new(), MediaFactory::new());
        let ctx = XukContext {
            nodes: &nodes,
            properties: &properties,
            media: &media,
        };
        let mut reader = XukReader::from_str(xml);
        let element = reader.read_root()?;
        let mut manager = ChannelsManager::new();
        manager.xuk_in(&mut reader, &element, &ctx)?;
        Ok(manager)
    }

    #[test]
    fn test_generated_ids_skip_taken_ones() {
        let mut manager = ChannelsManager::new();
        manager.add_channel_with_id("CH1", "text").unwrap();
        assert_eq!(manager.add_channel("audio").id, "CH0");
        assert_eq!(manager.add_channel("video").id, "CH2");
        assert_eq!(manager.len(), 3);
        assert_eq!(manager.channel_by_name("video").unwrap().id, "CH2");
    }

    #[test]
    fn test_duplicate_and_empty_ids() {
        let mut manager = ChannelsManager::new();
        manager.add_channel_with_id("a", "audio").unwrap();
        assert!(matches!(
            manager.add_channel_with_id("a", "again"),
            Err(Error::DuplicateChannel(id)) if id == "a"
        ));
        assert!(matches!(
            manager.add_channel_with_id("", "x"),
            Err(Error::NullArgument(_))
        ));
    }

    #[test]
    fn test_remove_channel() {
        let mut manager = ChannelsManager::new();
        let audio = manager.add_channel("audio");
        assert_eq!(manager.remove_channel(&audio.id), Some(audio));
        assert!(manager.is_empty());
        assert!(manager.remove_channel("CH0").is_none());
    }

    #[test]
    fn test_xuk_round_trip() {
        let mut manager = ChannelsManager::new();
        manager.add_channel("audio");
        manager.add_channel("text");

        let mut writer = XukWriter::new(&XukOptions::default());
        manager.xuk_out(&mut writer).unwrap();
        let xml = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(xml.contains(r#"<Channel uid="CH1" name="text"/>"#));

        let read_back = read(&xml).unwrap();
        assert_eq!(read_back.channels(), manager.channels());
    }

    #[test]
    fn test_duplicate_in_document() {
        let xml = r#"<chMgr xmlns="http://www.daisy.org/urakawa/xuk/2.0"><chs>
            <ch uid="CH0" name="a"/><ch uid="CH0" name="b"/>
        </chs></chMgr>"#;
        assert!(matches!(read(xml), Err(Error::XukFormat { .. })));
    }
}
