//! Replay scenarios for the `hls-subtitles` binary
//!
//! A scenario is a JSON document with a list of steps: player events, media
//! attach/detach, user actions on the controller, and toggles made by the
//! host directly on the native text tracks.

use serde::Deserialize;
use std::path::Path;

use crate::error::Result;
use crate::events::PlayerEvent;
use crate::native::{NativeTextTrack, TextTrackMode};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Forward a player event to the controller
    Event { event: PlayerEvent },
    /// Attach an in-memory surface with these text tracks
    Attach {
        #[serde(default)]
        text_tracks: Vec<NativeTextTrack>,
        #[serde(default)]
        change_events: bool,
    },
    Detach,
    /// User selection; null turns subtitles off
    SelectTrack { id: Option<usize> },
    SetDisplay { display: bool },
    /// Host-side mode change on the attached surface
    NativeMode { index: usize, mode: TextTrackMode },
    /// Let timers run
    Wait { ms: u64 },
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
