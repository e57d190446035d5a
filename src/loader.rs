//! Subtitle playlist load triggering

use std::time::Duration;

use crate::delivery::{skip_directive, DeliveryDirectives};
use crate::events::SubtitleEvent;
use crate::types::{PlaylistDetails, Track};

/// Decides whether a track's playlist needs a (re)load
pub trait ReloadPolicy {
    fn should_load(&self, track: &Track) -> bool;
}

/// Load playlists never loaded, and reload live ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct LivePlaylistPolicy;

impl ReloadPolicy for LivePlaylistPolicy {
    fn should_load(&self, track: &Track) -> bool {
        !track.url.is_empty() && (!track.is_loaded() || track.is_live())
    }
}

/// A playlist request for the external loader
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub url: String,
    pub id: usize,
    pub group_id: String,
    pub delivery_directives: Option<DeliveryDirectives>,
}

impl From<LoadRequest> for SubtitleEvent {
    fn from(request: LoadRequest) -> Self {
        SubtitleEvent::TrackLoading {
            url: request.url,
            id: request.id,
            group_id: request.group_id,
            delivery_directives: request.delivery_directives,
        }
    }
}

#[derive(Debug, Default)]
pub struct PlaylistLoaderTrigger<P = LivePlaylistPolicy> {
    policy: P,
}

impl<P: ReloadPolicy> PlaylistLoaderTrigger<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    /// Build the load request for `track`, in-group id `id`, if one is due.
    ///
    /// Directives that cannot be applied to the track URL are dropped from
    /// the URL with a warning; the request still goes out.
    pub fn maybe_load(
        &self,
        id: usize,
        track: &Track,
        directives: Option<DeliveryDirectives>,
    ) -> Option<LoadRequest> {
        if !self.policy.should_load(track) {
            return None;
        }

        let mut url = track.url.clone();
        if let Some(directives) = &directives {
            match directives.add_directives(&url) {
                Ok(with_directives) => url = with_directives,
                Err(e) => {
                    tracing::warn!(
                        "Could not construct new URL with HLS delivery directives: {}",
                        e
                    );
                }
            }
        }

        tracing::debug!("Loading subtitle playlist for id {}", id);
        Some(LoadRequest {
            url,
            id,
            group_id: track.group_id.clone(),
            delivery_directives: directives,
        })
    }
}

/// Delay before refreshing a live playlist that cannot block.
pub fn reload_interval(details: &PlaylistDetails) -> Duration {
    let mut interval_ms = details.target_duration * 1000.0;
    if details.updated {
        if let Some(last) = details.last_segment_duration {
            interval_ms = interval_ms.min(last * 1000.0);
        }
    } else {
        interval_ms /= 2.0;
    }
    Duration::from_millis(interval_ms.max(0.0).round() as u64)
}

/// Directives for a blocking request of the next playlist update.
pub fn blocking_reload_directives(
    details: &PlaylistDetails,
    low_latency: bool,
) -> DeliveryDirectives {
    let skip = skip_directive(details);
    match details.last_part_index {
        Some(part) if low_latency => {
            DeliveryDirectives::new(Some(details.last_part_sn), Some(part + 1), skip)
        }
        _ => DeliveryDirectives::new(Some(details.end_sn + 1), None, skip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::SkipDirective;

    fn track(details: Option<PlaylistDetails>) -> Track {
        Track {
            id: 2,
            group_id: "subs".to_string(),
            url: "https://cdn.example.com/subs/en.m3u8".to_string(),
            details,
            ..Default::default()
        }
    }

    fn live(updated: bool) -> PlaylistDetails {
        PlaylistDetails {
            live: true,
            updated,
            target_duration: 6.0,
            end_sn: 41,
            last_part_sn: 42,
            ..Default::default()
        }
    }

    #[test]
    fn test_policy() {
        let policy = LivePlaylistPolicy;
        assert!(policy.should_load(&track(None)));
        assert!(policy.should_load(&track(Some(live(true)))));
        assert!(!policy.should_load(&track(Some(PlaylistDetails::default()))));

        let mut no_url = track(None);
        no_url.url.clear();
        assert!(!policy.should_load(&no_url));
    }

    #[test]
    fn test_maybe_load_plain() {
        let trigger: PlaylistLoaderTrigger = PlaylistLoaderTrigger::default();
        let request = trigger.maybe_load(2, &track(None), None).unwrap();
        assert_eq!(request.url, "https://cdn.example.com/subs/en.m3u8");
        assert_eq!(request.id, 2);
        assert_eq!(request.group_id, "subs");
        assert!(request.delivery_directives.is_none());

        assert!(trigger
            .maybe_load(2, &track(Some(PlaylistDetails::default())), None)
            .is_none());
    }

    #[test]
    fn test_maybe_load_with_directives() {
        let trigger: PlaylistLoaderTrigger = PlaylistLoaderTrigger::default();
        let directives = DeliveryDirectives::new(Some(42), None, SkipDirective::No);
        let request = trigger.maybe_load(2, &track(None), Some(directives)).unwrap();
        assert_eq!(request.url, "https://cdn.example.com/subs/en.m3u8?_HLS_msn=42");
        assert_eq!(request.delivery_directives, Some(directives));

        let event = SubtitleEvent::from(request);
        assert!(matches!(event, SubtitleEvent::TrackLoading { id: 2, .. }));
    }

    #[test]
    fn test_maybe_load_bad_url_keeps_original() {
        let trigger: PlaylistLoaderTrigger = PlaylistLoaderTrigger::default();
        let mut relative = track(None);
        relative.url = "subs/en.m3u8".to_string();
        let directives = DeliveryDirectives::new(Some(42), None, SkipDirective::No);

        let request = trigger.maybe_load(2, &relative, Some(directives)).unwrap();
        assert_eq!(request.url, "subs/en.m3u8");
    }

    /// Refreshes finished playlists too
    struct AlwaysReload;

    impl ReloadPolicy for AlwaysReload {
        fn should_load(&self, track: &Track) -> bool {
            !track.url.is_empty()
        }
    }

    #[test]
    fn test_maybe_load_custom_policy() {
        let trigger = PlaylistLoaderTrigger::new(AlwaysReload);
        let vod = track(Some(PlaylistDetails::default()));
        let request = trigger.maybe_load(2, &vod, None).unwrap();
        assert_eq!(request.url, "https://cdn.example.com/subs/en.m3u8");

        let default_trigger = PlaylistLoaderTrigger::new(LivePlaylistPolicy);
        assert!(default_trigger.maybe_load(2, &vod, None).is_none());
    }

    #[test]
    fn test_reload_interval() {
        assert_eq!(reload_interval(&live(true)), Duration::from_secs(6));
        assert_eq!(reload_interval(&live(false)), Duration::from_secs(3));

        let mut details = live(true);
        details.last_segment_duration = Some(4.5);
        assert_eq!(reload_interval(&details), Duration::from_millis(4500));
    }

    #[test]
    fn test_blocking_reload_directives() {
        let details = live(true);
        assert_eq!(
            blocking_reload_directives(&details, true),
            DeliveryDirectives::new(Some(42), None, SkipDirective::No)
        );

        let mut details = live(true);
        details.last_part_index = Some(3);
        assert_eq!(
            blocking_reload_directives(&details, true),
            DeliveryDirectives::new(Some(42), Some(4), SkipDirective::No)
        );
        assert_eq!(
            blocking_reload_directives(&details, false),
            DeliveryDirectives::new(Some(42), None, SkipDirective::No)
        );
    }
}
