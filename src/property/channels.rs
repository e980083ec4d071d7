use std::any::Any;
use std::collections::BTreeMap;

use tracing::warn;

use super::{OwnerSlot, Property, PropertyCategory};
use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::media::Media;
use crate::qname::{QName, names};
use crate::xuk::{XukAble, XukContext, XukElement, XukReader, XukWriter};

/// Maps channel ids to the media shown on each channel for one node.
#[derive(Debug, Default)]
pub struct ChannelsProperty {
    owner: OwnerSlot,
    mappings: BTreeMap<String, Box<dyn Media>>,
}

impl Clone for ChannelsProperty {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            mappings: self
                .mappings
                .iter()
                .map(|(id, media)| (id.clone(), media.copy_media()))
                .collect(),
        }
    }
}

impl ChannelsProperty {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `media` on `channel`, returning what was there before.
    pub fn set_media(&mut self, channel: &Channel, media: Box<dyn Media>) -> Option<Box<dyn Media>> {
        self.mappings.insert(channel.id.clone(), media)
    }

    pub fn media(&self, channel_id: &str) -> Option<&dyn Media> {
        self.mappings.get(channel_id).map(|m| m.as_ref())
    }

    pub fn remove_media(&mut self, channel_id: &str) -> Option<Box<dyn Media>> {
        self.mappings.remove(channel_id)
    }

    /// Ids of the channels that carry media, sorted.
    pub fn used_channels(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    /// Fail if any mapped channel is missing from `known`.
    pub(crate) fn check_channels(&self, mut known: impl FnMut(&str) -> bool) -> Result<()> {
        match self.used_channels().find(|id| !known(*id)) {
            Some(id) => Err(Error::xuk(
                names::CHANNELS_PROPERTY,
                format!("mapping refers to unknown channel '{id}'"),
            )),
            None => Ok(()),
        }
    }

    fn read_mapping(
        &mut self,
        reader: &mut XukReader<'_>,
        mapping: &XukElement,
        ctx: &XukContext<'_>,
    ) -> Result<()> {
        let channel = mapping.required_attribute("channel")?.to_string();
        let mut found: Option<Box<dyn Media>> = None;

        reader.read_children(mapping, |reader, child| {
            let qname = child.qname();
            let Some(mut media) = ctx.media.create(&qname.local_name, &qname.namespace)? else {
                return Ok(false);
            };
            media.xuk_in(reader, child, ctx)?;
            if found.is_some() {
                warn!(%channel, "channel mapping has more than one media object, keeping the last");
            }
            found = Some(media);
            Ok(true)
        })?;

        match found {
            Some(media) => {
                self.mappings.insert(channel, media);
            }
            None => warn!(%channel, "dropping channel mapping without recognised media"),
        }
        Ok(())
    }
}

impl XukAble for ChannelsProperty {
    fn xuk_qname(&self) -> QName {
        names::CHANNELS_PROPERTY
    }

    fn xuk_in_child(
        &mut self,
        reader: &mut XukReader<'_>,
        child: &XukElement,
        ctx: &XukContext<'_>,
    ) -> Result<bool> {
        if !child.is(&names::CHANNEL_MAPPINGS) {
            return Ok(false);
        }
        reader.read_children(child, |reader, mapping| {
            if !mapping.is(&names::CHANNEL_MAPPING) {
                return Ok(false);
            }
            self.read_mapping(reader, mapping, ctx)?;
            Ok(true)
        })?;
        Ok(true)
    }

    fn xuk_out_children(&self, writer: &mut XukWriter) -> Result<()> {
        writer.start(&names::CHANNEL_MAPPINGS, &[])?;
        for (channel, media) in &self.mappings {
            writer.start(&names::CHANNEL_MAPPING, &[("channel", channel.clone())])?;
            media.xuk_out(writer)?;
            writer.end()?;
        }
        writer.end()
    }
}

impl Property for ChannelsProperty {
    fn category(&self) -> PropertyCategory {
        PropertyCategory::CHANNELS
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
        let Some(other) = other.downcast_ref::<Self>() else {
            return false;
        };
        self.mappings.len() == other.mappings.len()
            && self
                .mappings
                .iter()
                .zip(&other.mappings)
                .all(|((a_id, a), (b_id, b))| a_id == b_id && a.value_equals(b.as_ref()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
