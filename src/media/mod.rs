//! Media objects carried by channel mappings.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::qname::{QName, names};
use crate::xuk::{XukAble, XukAttributes, XukContext, XukElement, XukReader, XukWriter};

/// A piece of content (text, audio, ...) rendered on a channel.
pub trait Media: XukAble + fmt::Debug + Any {
    /// An independent deep copy.
    fn copy_media(&self) -> Box<dyn Media>;

    fn value_equals(&self, other: &dyn Media) -> bool;

    /// True for time-based media.
    fn is_continuous(&self) -> bool;

    fn as_any(&self) -> &dyn Any;
}

impl<'a> dyn Media + 'a {
    pub fn downcast_ref<T: Media>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

// ============================================================================
// Text
// ============================================================================

/// Literal text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMedia {
    pub text: String,
}

impl TextMedia {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl XukAble for TextMedia {
    fn xuk_qname(&self) -> QName {
        names::TEXT_MEDIA
    }

    fn xuk_in_child(
        &mut self,
        reader: &mut XukReader<'_>,
        child: &XukElement,
        _ctx: &XukContext<'_>,
    ) -> Result<bool> {
        if !child.is(&names::TEXT) {
            return Ok(false);
        }
        self.text = reader.read_text(child)?;
        Ok(true)
    }

    fn xuk_out_children(&self, writer: &mut XukWriter) -> Result<()> {
        writer.text_element(&names::TEXT, &self.text)
    }
}

impl Media for TextMedia {
    fn copy_media(&self) -> Box<dyn Media> {
        Box::new(self.clone())
    }

    fn value_equals(&self, other: &dyn Media) -> bool {
        other.downcast_ref::<Self>() == Some(self)
    }

    fn is_continuous(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// External audio
// ============================================================================

/// A clip of an audio file referenced by location.
///
/// Clip times are kept in whole milliseconds, the resolution XUK stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalAudioMedia {
    pub src: String,
    clip_begin: Duration,
    /// `None` plays to the end of the file.
    clip_end: Option<Duration>,
}

fn whole_millis(time: Duration) -> Duration {
    Duration::new(time.as_secs(), time.subsec_millis() * 1_000_000)
}

fn check_clip(begin: Duration, end: Option<Duration>) -> Result<()> {
    match end {
        Some(end) if begin > end => Err(Error::InvalidClip { begin, end }),
        _ => Ok(()),
    }
}

impl ExternalAudioMedia {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Self::default()
        }
    }

    /// Set the clip, truncating both times to whole milliseconds. Fails
    /// with `InvalidClip` if the clip would begin after it ends.
    pub fn with_clip(mut self, begin: Duration, end: Option<Duration>) -> Result<Self> {
        let begin = whole_millis(begin);
        let end = end.map(whole_millis);
        check_clip(begin, end)?;
        self.clip_begin = begin;
        self.clip_end = end;
        Ok(self)
    }

    pub fn clip_begin(&self) -> Duration {
        self.clip_begin
    }

    pub fn clip_end(&self) -> Option<Duration> {
        self.clip_end
    }

    /// Length of the clip, if its end is known.
    pub fn duration(&self) -> Option<Duration> {
        self.clip_end
            .map(|end| end.saturating_sub(self.clip_begin))
    }
}

impl XukAble for ExternalAudioMedia {
    fn xuk_qname(&self) -> QName {
        names::EXTERNAL_AUDIO_MEDIA
    }

    fn xuk_in_attributes(&mut self, element: &XukElement) -> Result<()> {
        self.src = element.required_attribute("src")?.to_string();
        let begin = Duration::from_millis(element.parse_attribute::<u64>("clipBegin")?.unwrap_or(0));
        let end = element.parse_attribute::<u64>("clipEnd")?.map(Duration::from_millis);
        check_clip(begin, end).map_err(|e| Error::xuk(element.qname(), e.to_string()))?;
        self.clip_begin = begin;
        self.clip_end = end;
        Ok(())
    }

    fn xuk_out_attributes(&self, attributes: &mut XukAttributes) {
        attributes.push(("src", self.src.clone()));
        attributes.push(("clipBegin", self.clip_begin.as_millis().to_string()));
        if let Some(end) = self.clip_end {
            attributes.push(("clipEnd", end.as_millis().to_string()));
        }
    }
}

impl Media for ExternalAudioMedia {
    fn copy_media(&self) -> Box<dyn Media> {
        Box::new(self.clone())
    }

    fn value_equals(&self, other: &dyn Media) -> bool {
        other.downcast_ref::<Self>() == Some(self)
    }

    fn is_continuous(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Factory
// ============================================================================

pub type MediaConstructor = fn() -> Box<dyn Media>;

fn text_media() -> Box<dyn Media> {
    Box::new(TextMedia::default())
}

fn external_audio_media() -> Box<dyn Media> {
    Box::new(ExternalAudioMedia::default())
}

/// Creates media objects by element name.
#[derive(Debug, Clone)]
pub struct MediaFactory {
    constructors: HashMap<QName, MediaConstructor>,
}

impl Default for MediaFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaFactory {
    /// A factory that knows `TextMedia` and `ExternalAudioMedia`.
    pub fn new() -> Self {
        let mut constructors = HashMap::new();
        constructors.insert(names::TEXT_MEDIA, text_media as MediaConstructor);
        constructors.insert(names::EXTERNAL_AUDIO_MEDIA, external_audio_media as MediaConstructor);
        Self { constructors }
    }

    pub fn register(&mut self, qname: QName, constructor: MediaConstructor) {
        self.constructors.insert(qname, constructor);
    }

    pub fn is_recognized(&self, local_name: &str, namespace: &str) -> bool {
        self.constructors
            .keys()
            .any(|qname| qname.matches(local_name, namespace))
    }

    /// A fresh media object for the named element, or `None`.
    pub fn create(&self, local_name: &str, namespace: &str) -> Result<Option<Box<dyn Media>>> {
        if local_name.is_empty() {
            return Err(Error::NullArgument("local_name"));
        }
        let Some((qname, constructor)) = self
            .constructors
            .iter()
            .find(|(qname, _)| qname.matches(local_name, namespace))
        else {
            return Ok(None);
        };

        let media = constructor();
        if &media.xuk_qname() != qname {
            return Err(Error::FactoryCannotCreate(qname.clone()));
        }
        Ok(Some(media))
    }
}
