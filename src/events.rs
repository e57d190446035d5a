//! Player events consumed and produced by the subtitle controller
//!
//! Inbound events are [`PlayerEvent`]s handed to the controller by the
//! host player. Outbound [`SubtitleEvent`]s go through an injected
//! [`EventSink`]; [`EventEmitter`] is the broadcast-channel implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::delivery::DeliveryDirectives;
use crate::types::{MediaType, PlaylistDetails, Track};

/// Events the host player forwards to the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// A new manifest starts loading
    ManifestLoading,
    /// The manifest was parsed
    ManifestParsed {
        #[serde(default)]
        subtitle_tracks: Vec<Track>,
    },
    /// A variant starts loading; carries its subtitle group
    VariantLoading {
        #[serde(default)]
        text_group_id: Option<String>,
    },
    /// A subtitle playlist finished loading
    TrackLoaded {
        id: usize,
        #[serde(default)]
        group_id: Option<String>,
        details: PlaylistDetails,
    },
    /// A subtitle playlist failed to load
    TrackLoadFailed { id: usize },
    /// The native text track list reported a change
    TextTracksChanged,
}

/// Events emitted by the controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SubtitleEvent {
    /// The tracks in scope for the active group changed
    TracksUpdated { tracks: Vec<Track> },
    /// The selected track changed; `id` is None when subtitles are off
    TrackSwitch {
        id: Option<usize>,
        group_id: Option<String>,
        name: Option<String>,
        #[serde(rename = "type")]
        media_type: Option<MediaType>,
        url: Option<String>,
    },
    /// A subtitle playlist should be (re)loaded
    TrackLoading {
        url: String,
        id: usize,
        group_id: String,
        delivery_directives: Option<DeliveryDirectives>,
    },
}

impl SubtitleEvent {
    pub(crate) fn switched_off() -> Self {
        SubtitleEvent::TrackSwitch {
            id: None,
            group_id: None,
            name: None,
            media_type: None,
            url: None,
        }
    }

    pub(crate) fn switched_to(id: usize, track: &Track) -> Self {
        SubtitleEvent::TrackSwitch {
            id: Some(id),
            group_id: Some(track.group_id.clone()),
            name: Some(track.name.clone()),
            media_type: Some(track.media_type),
            url: Some(track.url.clone()),
        }
    }
}

/// Dispatch capability the controller emits through
pub trait EventSink {
    fn emit(&self, event: SubtitleEvent);
}

/// Broadcast-channel event sink
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<SubtitleEvent>,
}

impl EventEmitter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(128);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SubtitleEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventEmitter {
    fn emit(&self, event: SubtitleEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}
