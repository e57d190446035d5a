//! Subtitle track controller
//!
//! Owns the selected subtitle track and is the only writer of it. Every
//! selection change, whether it comes from the host API, a group change,
//! a queued default or a toggle on the native text tracks, goes through
//! [`SubtitleTrackController::select`], so the no-op guard there is what
//! stops the native sync loop from oscillating.
//!
//! Ids are positions in the tracks of the active group; `None` means
//! subtitles are off.

use crate::config::SubtitleConfig;
use crate::delivery::{switch_params, DeliveryDirectives};
use crate::error::SubtitleError;
use crate::events::{EventSink, PlayerEvent, SubtitleEvent};
use crate::loader::{blocking_reload_directives, reload_interval, PlaylistLoaderTrigger};
use crate::native::{NativeSyncBridge, TextTrackSurface};
use crate::registry::TrackRegistry;
use crate::scheduler::Scheduler;
use crate::types::{PlaylistDetails, Track};

pub struct SubtitleTrackController<E, S> {
    config: SubtitleConfig,
    registry: TrackRegistry,
    bridge: NativeSyncBridge,
    loader: PlaylistLoaderTrigger,
    sink: E,
    scheduler: S,
    track_id: Option<usize>,
    /// Selection to apply on the next media attach
    queued_track_id: Option<usize>,
    select_default_track: bool,
    display: bool,
}

impl<E: EventSink, S: Scheduler> SubtitleTrackController<E, S> {
    pub fn new(config: SubtitleConfig, sink: E, scheduler: S) -> Self {
        Self {
            registry: TrackRegistry::new(),
            bridge: NativeSyncBridge::new(config.poll_interval()),
            loader: PlaylistLoaderTrigger::default(),
            sink,
            scheduler,
            track_id: None,
            queued_track_id: None,
            select_default_track: config.select_default_track,
            display: config.display,
            config,
        }
    }

    pub fn config(&self) -> &SubtitleConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Tracks of the active group
    pub fn tracks(&self) -> Vec<Track> {
        self.registry.snapshot()
    }

    /// Every track of the manifest
    pub fn all_tracks(&self) -> &[Track] {
        self.registry.all_tracks()
    }

    /// Replace the track list and re-derive the active group's scope
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        let last = self.selected_or_queued_track().cloned();
        self.registry.set_all_tracks(tracks);
        self.registry.rescope();
        self.tracks_rescoped(last);
    }

    pub fn track(&self) -> Option<usize> {
        self.track_id
    }

    pub fn queued_track(&self) -> Option<usize> {
        self.queued_track_id
    }

    /// Select a track on behalf of the user; `None` turns subtitles off.
    ///
    /// Turns off automatic DEFAULT track selection until the next manifest.
    pub fn set_track(&mut self, id: Option<usize>) {
        self.select_default_track = false;
        self.select(id);
    }

    pub fn display(&self) -> bool {
        self.display
    }

    /// Switch the selected native track between `showing` and `hidden`
    pub fn set_display(&mut self, display: bool) {
        self.display = display;
        if self.track_id.is_some() {
            self.bridge
                .apply(self.track_id, self.registry.group_id(), display);
        }
    }

    pub fn is_media_attached(&self) -> bool {
        self.bridge.is_attached()
    }

    pub fn handle(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::ManifestLoading => self.on_manifest_loading(),
            PlayerEvent::ManifestParsed { subtitle_tracks } => {
                self.on_manifest_parsed(subtitle_tracks)
            }
            PlayerEvent::VariantLoading { text_group_id } => {
                self.switch_group(text_group_id.as_deref())
            }
            PlayerEvent::TrackLoaded {
                id,
                group_id,
                details,
            } => self.on_track_loaded(id, group_id, details),
            PlayerEvent::TrackLoadFailed { id } => self.on_track_load_failed(id),
            PlayerEvent::TextTracksChanged => self.sync_from_native(),
        }
    }

    pub fn attach_media(&mut self, surface: Box<dyn TextTrackSurface>) {
        self.bridge.attach(surface, &mut self.scheduler);
        if self.track_id.is_some() {
            self.bridge
                .apply(self.track_id, self.registry.group_id(), self.display);
        }
        if let Some(id) = self.queued_track_id.take() {
            tracing::debug!("Applying queued subtitle track {}", id);
            self.select(Some(id));
        }
    }

    /// Disable every native track, remember the selection for the next
    /// attach and let go of the surface.
    pub fn detach_media(&mut self) -> Option<Box<dyn TextTrackSurface>> {
        if !self.bridge.is_attached() {
            return None;
        }
        if let Some(id) = self.track_id {
            self.queued_track_id = Some(id);
        }
        self.bridge.clear_cues();
        self.select(None);
        self.scheduler.cancel_reload();
        self.bridge.detach(&mut self.scheduler)
    }

    /// Poll interval tick
    pub fn poll_text_tracks(&mut self) {
        self.sync_from_native();
    }

    /// Live reload timer expiry
    pub fn reload_timer_fired(&mut self) {
        self.scheduler.cancel_reload();
        if let Some(id) = self.track_id {
            self.load_track(id, None);
        }
    }

    fn on_manifest_loading(&mut self) {
        self.scheduler.cancel_reload();
        self.registry.reset();
        self.track_id = None;
        self.queued_track_id = None;
        self.select_default_track = self.config.select_default_track;
    }

    fn on_manifest_parsed(&mut self, tracks: Vec<Track>) {
        tracing::debug!("{} subtitle track(s) in manifest", tracks.len());
        if self.track_id.is_some() || self.queued_track_id.is_some() {
            // no manifest loading came first: the selection indexes the old scope
            self.set_tracks(tracks);
        } else {
            self.registry.set_all_tracks(tracks);
        }
    }

    fn switch_group(&mut self, group_id: Option<&str>) {
        let last = self.selected_or_queued_track().cloned();
        if self.registry.set_group(group_id) {
            self.tracks_rescoped(last);
        }
    }

    /// Publish the new scope and pick a track in it. The old selection is
    /// an index into the old scope, so it is always replaced.
    fn tracks_rescoped(&mut self, last: Option<Track>) {
        let tracks = self.registry.snapshot();
        tracing::info!(
            "Updating subtitle tracks, {} track(s) found in {:?} group",
            tracks.len(),
            self.registry.group_id()
        );
        self.sink.emit(SubtitleEvent::TracksUpdated { tracks });
        if self.registry.is_empty() {
            tracing::debug!("No subtitle tracks to propose");
        }

        let proposal = self.registry.propose(
            last.as_ref().map(|t| t.name.as_str()),
            self.select_default_track,
        );
        if !self.bridge.is_attached() {
            self.queued_track_id = proposal;
            return;
        }
        match proposal {
            Some(id) => self.transition(Some(id), last.and_then(|t| t.details)),
            None if self.track_id.is_some() => self.transition(None, None),
            None => {}
        }
    }

    fn on_track_loaded(&mut self, id: usize, group_id: Option<String>, details: PlaylistDetails) {
        let Some(track) = self.registry.track(id) else {
            let err = SubtitleError::InvalidTrackId {
                id,
                len: self.registry.len(),
            };
            tracing::warn!("Ignoring loaded subtitle playlist: {}", err);
            return;
        };
        if let Some(group) = group_id {
            if track.group_id != group {
                let err = SubtitleError::TrackNotInGroup {
                    id,
                    group,
                    active: self.registry.group_id().map(str::to_string),
                };
                tracing::warn!("Ignoring loaded subtitle playlist: {}", err);
                return;
            }
        }

        let (start_sn, end_sn) = (details.start_sn, details.end_sn);
        if let Err(e) = self.registry.record_loaded(id, details) {
            tracing::warn!("Ignoring loaded subtitle playlist: {}", e);
            return;
        }
        tracing::debug!(
            "Subtitle track {} loaded [{}-{}]",
            id,
            start_sn,
            end_sn
        );

        if self.track_id == Some(id) {
            self.playlist_loaded(id);
        }
    }

    /// Follow up on a load of the selected track: live playlists are
    /// reloaded, by blocking request when the origin supports it.
    fn playlist_loaded(&mut self, id: usize) {
        let Some(details) = self.registry.track(id).and_then(|t| t.details.as_ref()) else {
            return;
        };
        if !details.live {
            self.scheduler.cancel_reload();
            return;
        }
        if details.can_block_reload {
            let directives = blocking_reload_directives(details, self.config.low_latency_mode);
            self.load_track(id, Some(directives));
        } else {
            let after = reload_interval(details);
            tracing::debug!("Live subtitle playlist {}, reloading in {:?}", id, after);
            self.scheduler.schedule_reload(after);
        }
    }

    fn on_track_load_failed(&mut self, id: usize) {
        if self.track_id == Some(id) {
            tracing::warn!("Failed to load subtitle track {}", id);
            self.scheduler.cancel_reload();
        } else {
            tracing::debug!("Ignoring load failure of unselected subtitle track {}", id);
        }
    }

    /// Pick up a track the user enabled through the surface
    fn sync_from_native(&mut self) {
        if !self.config.render_natively || !self.bridge.is_attached() {
            return;
        }
        let observed = self.bridge.observe(self.registry.group_id());
        if observed != self.track_id {
            tracing::debug!("Native text track change, selecting {:?}", observed);
            self.select_default_track = false;
            self.select(observed);
        }
    }

    /// The single selection entry point
    fn select(&mut self, id: Option<usize>) {
        if !self.bridge.is_attached() {
            tracing::debug!("No media attached, queueing subtitle track {:?}", id);
            self.queued_track_id = id;
            return;
        }
        if let Some(id) = id {
            if id >= self.registry.len() {
                tracing::debug!("Ignoring invalid subtitle track id {}", id);
                return;
            }
        }
        // Re-selecting a track is only useful while its playlist is missing
        let loaded = id
            .and_then(|id| self.registry.track(id))
            .map_or(true, Track::is_loaded);
        if id == self.track_id && loaded {
            return;
        }

        let last_details = self.selected_track().and_then(|t| t.details.clone());
        self.transition(id, last_details);
    }

    fn transition(&mut self, id: Option<usize>, last_details: Option<PlaylistDetails>) {
        self.scheduler.cancel_reload();
        self.bridge.apply(id, self.registry.group_id(), self.display);
        self.track_id = id;

        let Some((id, track)) = id.and_then(|id| self.registry.track(id).map(|t| (id, t))) else {
            tracing::info!("Disabling subtitle track");
            self.sink.emit(SubtitleEvent::switched_off());
            return;
        };
        tracing::info!("Switching to subtitle track {} \"{}\"", id, track.name);
        self.sink.emit(SubtitleEvent::switched_to(id, track));

        let directives = switch_params(
            &track.url,
            last_details.as_ref(),
            track.details.as_ref(),
            self.config.low_latency_mode,
        );
        self.load_track(id, directives);
    }

    fn load_track(&self, id: usize, directives: Option<DeliveryDirectives>) {
        let Some(track) = self.registry.track(id) else {
            return;
        };
        if let Some(request) = self.loader.maybe_load(id, track, directives) {
            self.sink.emit(request.into());
        }
    }

    fn selected_track(&self) -> Option<&Track> {
        self.track_id.and_then(|id| self.registry.track(id))
    }

    fn selected_or_queued_track(&self) -> Option<&Track> {
        self.track_id
            .or(self.queued_track_id)
            .and_then(|id| self.registry.track(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{subtitle_track, ManualScheduler, RecordingSink};

    fn controller() -> (SubtitleTrackController<RecordingSink, ManualScheduler>, RecordingSink) {
        let sink = RecordingSink::default();
        let controller = SubtitleTrackController::new(
            SubtitleConfig::default(),
            sink.clone(),
            ManualScheduler::default(),
        );
        (controller, sink)
    }

    #[test]
    fn test_new_controller_is_unselected() {
        let (controller, sink) = controller();
        assert_eq!(controller.track(), None);
        assert_eq!(controller.queued_track(), None);
        assert!(!controller.is_media_attached());
        assert!(controller.display());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_selection_without_media_is_queued() {
        let (mut controller, sink) = controller();
        controller.set_tracks(vec![subtitle_track(0, "subs", "English", false)]);
        sink.take();

        controller.set_track(Some(0));
        assert_eq!(controller.track(), None);
        assert_eq!(controller.queued_track(), Some(0));
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_set_tracks_publishes_scope() {
        let (mut controller, sink) = controller();
        controller.set_tracks(vec![
            subtitle_track(0, "subs", "English", false),
            subtitle_track(1, "subs", "Deutsch", false),
        ]);
        assert_eq!(controller.tracks().len(), 2);
        assert_eq!(controller.all_tracks().len(), 2);
        let events = sink.take();
        assert!(matches!(&events[..], [SubtitleEvent::TracksUpdated { tracks }] if tracks.len() == 2));
    }

    #[test]
    fn test_detach_without_media_is_noop() {
        let (mut controller, sink) = controller();
        assert!(controller.detach_media().is_none());
        assert!(sink.take().is_empty());
    }
}
