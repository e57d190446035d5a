//! Native text track bridge
//!
//! Keeps the `mode` of the playback surface's own text tracks in line with
//! the selected subtitle track, and reads user toggles made through the
//! surface back out of it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::scheduler::Scheduler;

/// Text track kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTrackKind {
    #[default]
    Subtitles,
    Captions,
    Descriptions,
    Chapters,
    Metadata,
}

/// Text track mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTrackMode {
    #[default]
    Disabled,
    Hidden,
    Showing,
}

/// A text track as the playback surface exposes it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeTextTrack {
    pub kind: TextTrackKind,
    pub label: String,
    pub language: String,
    /// Subtitle group the track was created for.
    ///
    /// Hosts must set it whenever the manifest uses subtitle groups: a
    /// track without one is only matched while no group is active.
    pub group_id: Option<String>,
    pub mode: TextTrackMode,
}

impl NativeTextTrack {
    pub fn new(kind: TextTrackKind, label: &str, language: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
            language: language.to_string(),
            group_id: None,
            mode: TextTrackMode::Disabled,
        }
    }

    pub fn with_group(mut self, group_id: &str) -> Self {
        self.group_id = Some(group_id.to_string());
        self
    }

    fn in_group(&self, group_id: Option<&str>) -> bool {
        self.group_id.as_deref() == group_id
    }
}

/// The narrow text track contract of a playback surface.
///
/// Tracks are addressed by their position in [`text_tracks`](Self::text_tracks).
pub trait TextTrackSurface: Send {
    fn text_tracks(&self) -> Vec<NativeTextTrack>;

    fn set_mode(&mut self, index: usize, mode: TextTrackMode);

    /// Subscribe to change notifications of the text track list.
    ///
    /// Returns false when the surface cannot notify; the bridge polls then.
    fn subscribe_changes(&mut self) -> bool;

    fn unsubscribe_changes(&mut self) {}

    fn clear_cues(&mut self, _index: usize) {}
}

/// Subtitle tracks with a label, paired with their surface position.
/// Everything else on the surface is not ours to correlate.
pub fn filter_subtitle_tracks(tracks: Vec<NativeTextTrack>) -> Vec<(usize, NativeTextTrack)> {
    tracks
        .into_iter()
        .enumerate()
        .filter(|(_, t)| t.kind == TextTrackKind::Subtitles && !t.label.is_empty())
        .collect()
}

pub struct NativeSyncBridge {
    surface: Option<Box<dyn TextTrackSurface>>,
    subscribed: bool,
    poll_interval: Duration,
}

impl NativeSyncBridge {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            surface: None,
            subscribed: false,
            poll_interval,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Whether the attached surface is being polled
    pub fn is_polling(&self) -> bool {
        self.surface.is_some() && !self.subscribed
    }

    /// Take over `surface`, subscribing to its changes or polling it.
    pub fn attach<S: Scheduler>(&mut self, mut surface: Box<dyn TextTrackSurface>, scheduler: &mut S) {
        self.release(scheduler);

        self.subscribed = surface.subscribe_changes();
        if self.subscribed {
            tracing::debug!("Text track change notifications available");
        } else {
            tracing::debug!(
                "No text track change notifications, polling every {:?}",
                self.poll_interval
            );
            scheduler.start_polling(self.poll_interval);
        }
        self.surface = Some(surface);
    }

    /// Stop watching the surface and hand it back
    pub fn detach<S: Scheduler>(&mut self, scheduler: &mut S) -> Option<Box<dyn TextTrackSurface>> {
        self.release(scheduler);
        self.surface.take()
    }

    fn release<S: Scheduler>(&mut self, scheduler: &mut S) {
        scheduler.stop_polling();
        if let Some(surface) = self.surface.as_mut() {
            if self.subscribed {
                surface.unsubscribe_changes();
            }
        }
        self.subscribed = false;
    }

    pub fn clear_cues(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        for (index, _) in filter_subtitle_tracks(surface.text_tracks()) {
            surface.clear_cues(index);
        }
    }

    /// Enable the `target`-th track of `group_id` and disable every other
    /// subtitle track. None disables them all.
    pub fn apply(&mut self, target: Option<usize>, group_id: Option<&str>, display: bool) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let tracks = filter_subtitle_tracks(surface.text_tracks());

        let target_index = target.and_then(|id| {
            tracks
                .iter()
                .filter(|(_, t)| t.in_group(group_id))
                .nth(id)
                .map(|(index, _)| *index)
        });

        for (index, track) in &tracks {
            if Some(*index) != target_index && track.mode != TextTrackMode::Disabled {
                surface.set_mode(*index, TextTrackMode::Disabled);
            }
        }
        if let Some(index) = target_index {
            let mode = if display {
                TextTrackMode::Showing
            } else {
                TextTrackMode::Hidden
            };
            surface.set_mode(index, mode);
        }
    }

    /// Track id the surface currently has enabled within `group_id`.
    ///
    /// A showing track wins over hidden ones; among hidden tracks the last
    /// one wins.
    pub fn observe(&self, group_id: Option<&str>) -> Option<usize> {
        let surface = self.surface.as_ref()?;
        let mut resolved = None;
        let tracks = filter_subtitle_tracks(surface.text_tracks());
        for (id, (_, track)) in tracks.iter().filter(|(_, t)| t.in_group(group_id)).enumerate() {
            match track.mode {
                TextTrackMode::Showing => return Some(id),
                TextTrackMode::Hidden => resolved = Some(id),
                TextTrackMode::Disabled => {}
            }
        }
        resolved
    }
}

/// In-memory surface whose tracks can be shared with the host side
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    tracks: Arc<Mutex<Vec<NativeTextTrack>>>,
    cleared: Arc<Mutex<Vec<usize>>>,
    change_events: bool,
}

impl MemorySurface {
    pub fn new(tracks: Vec<NativeTextTrack>, change_events: bool) -> Self {
        Self {
            tracks: Arc::new(Mutex::new(tracks)),
            cleared: Arc::new(Mutex::new(Vec::new())),
            change_events,
        }
    }

    pub fn has_change_events(&self) -> bool {
        self.change_events
    }

    /// Current modes, in surface order
    pub fn modes(&self) -> Vec<TextTrackMode> {
        self.tracks.lock().iter().map(|t| t.mode).collect()
    }

    pub fn mode(&self, index: usize) -> Option<TextTrackMode> {
        self.tracks.lock().get(index).map(|t| t.mode)
    }

    /// Positions whose cues were cleared
    pub fn cleared_cues(&self) -> Vec<usize> {
        self.cleared.lock().clone()
    }
}

impl TextTrackSurface for MemorySurface {
    fn text_tracks(&self) -> Vec<NativeTextTrack> {
        self.tracks.lock().clone()
    }

    fn set_mode(&mut self, index: usize, mode: TextTrackMode) {
        if let Some(track) = self.tracks.lock().get_mut(index) {
            track.mode = mode;
        }
    }

    fn subscribe_changes(&mut self) -> bool {
        self.change_events
    }

    fn clear_cues(&mut self, index: usize) {
        self.cleared.lock().push(index);
    }
}
