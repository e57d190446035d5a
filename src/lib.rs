//! HLS subtitle track controller
//!
//! Tracks the subtitle renditions of an HLS manifest, scopes them to the
//! active variant group, keeps one of them selected, mirrors the selection
//! onto the native text tracks of a playback surface (and back), and asks
//! an external loader for subtitle playlists, reloading live ones.
//!
//! [`SubtitleTrackController`] is the synchronous core. It emits through an
//! injected [`EventSink`] and arms timers through a [`Scheduler`], so it can
//! be driven directly. [`SubtitleService`] runs it on a tokio task.

pub mod config;
pub mod controller;
pub mod delivery;
pub mod error;
pub mod events;
pub mod loader;
pub mod native;
pub mod registry;
pub mod runtime;
pub mod scenario;
pub mod scheduler;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{LoggingConfig, SubtitleConfig};
pub use controller::SubtitleTrackController;
pub use delivery::{DeliveryDirectives, SkipDirective};
pub use error::{Result, SubtitleError};
pub use events::{EventEmitter, EventSink, PlayerEvent, SubtitleEvent};
pub use loader::{LivePlaylistPolicy, LoadRequest, PlaylistLoaderTrigger, ReloadPolicy};
pub use native::{
    MemorySurface, NativeSyncBridge, NativeTextTrack, TextTrackKind, TextTrackMode,
    TextTrackSurface,
};
pub use registry::TrackRegistry;
pub use runtime::{SubtitleHandle, SubtitleService};
pub use scenario::{Scenario, ScenarioStep};
pub use scheduler::{Scheduler, TimerState};
pub use types::{MediaType, PlaylistDetails, RenditionReport, Track};
