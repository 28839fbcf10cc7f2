//! Host document abstractions
//!
//! The engine never owns media elements: it observes elements owned by a
//! host document through these traits. The browser binding implements them
//! over `web-sys`, [`crate::headless`] implements them in memory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of one externally owned media element
///
/// Two handles to the same element instance always report the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of media-producing element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Tag name queried in a document
    pub fn tag_name(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

/// Handle to a media-producing element
pub trait MediaElement: Clone {
    /// Identity of the underlying element instance
    fn id(&self) -> ElementId;

    fn kind(&self) -> MediaKind;

    /// Current native playback rate
    fn playback_rate(&self) -> f64;

    /// Set the native playback rate
    ///
    /// Gain and pan stages cannot change speed, so speed is applied here.
    fn set_playback_rate(&self, rate: f64);
}

/// A document-like container that can be queried for media elements
pub trait DocumentScope: Sized {
    type Element: MediaElement;

    /// Query the scope's media elements: audio first, then video, each in
    /// document order. Every call performs a fresh query.
    fn media_elements(&self) -> Vec<Self::Element>;

    /// Embedded sub-documents reachable from this scope
    ///
    /// Scopes that cannot be entered (e.g. cross-origin frames) are skipped.
    fn embedded_scopes(&self) -> Vec<Self> {
        Vec::new()
    }
}
