//! Subtitle track registry
//!
//! Holds every subtitle track the manifest declared and the subset in scope
//! for the active variant group. The scoped list stores positions into the
//! full list, so a loaded playlist recorded through either view is the same
//! track.

use crate::error::{Result, SubtitleError};
use crate::types::{PlaylistDetails, Track};

#[derive(Debug, Default)]
pub struct TrackRegistry {
    tracks: Vec<Track>,
    in_group: Vec<usize>,
    group_id: Option<String>,
    scoped: bool,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all tracks and the group scope
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.in_group.clear();
        self.group_id = None;
        self.scoped = false;
    }

    /// Replace the full track list.
    ///
    /// Scoped positions point into the old list, so the scope is dropped
    /// and the next [`set_group`](Self::set_group) re-derives it, even for
    /// the same group.
    pub fn set_all_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.in_group.clear();
        self.scoped = false;
    }

    pub fn all_tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    /// Scope the registry to `group_id`; an empty or absent group keeps
    /// every track in scope.
    ///
    /// Returns false when the group is already the scoped one.
    pub fn set_group(&mut self, group_id: Option<&str>) -> bool {
        let group_id = group_id.filter(|g| !g.is_empty());
        if self.scoped && self.group_id.as_deref() == group_id {
            return false;
        }
        self.group_id = group_id.map(str::to_string);
        self.rescope();
        true
    }

    /// Re-derive the in-group list for the current group
    pub fn rescope(&mut self) {
        let group_id = self.group_id.as_deref();
        self.in_group = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| group_id.map_or(true, |g| t.group_id == g))
            .map(|(i, _)| i)
            .collect();
        self.scoped = true;
    }

    pub fn len(&self) -> usize {
        self.in_group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_group.is_empty()
    }

    /// Track at `id` within the active group
    pub fn track(&self, id: usize) -> Option<&Track> {
        self.in_group.get(id).map(|&i| &self.tracks[i])
    }

    pub fn tracks_in_group(&self) -> impl Iterator<Item = &Track> + '_ {
        self.in_group.iter().map(move |&i| &self.tracks[i])
    }

    /// Owned copy of the in-group list, for publishing
    pub fn snapshot(&self) -> Vec<Track> {
        self.tracks_in_group().cloned().collect()
    }

    /// Attach freshly loaded playlist details to the in-group track `id`.
    ///
    /// Returns the details they replaced.
    pub fn record_loaded(
        &mut self,
        id: usize,
        details: PlaylistDetails,
    ) -> Result<Option<PlaylistDetails>> {
        let len = self.in_group.len();
        let index = *self
            .in_group
            .get(id)
            .ok_or(SubtitleError::InvalidTrackId { id, len })?;
        Ok(self.tracks[index].details.replace(details))
    }

    /// Selection candidate after a group change.
    ///
    /// A track named like the previously selected one is preferred, then
    /// the first DEFAULT track. With `defaults_only` set, name matches must
    /// be DEFAULT tracks too, and without it no DEFAULT fallback is made.
    pub fn propose(&self, last_name: Option<&str>, defaults_only: bool) -> Option<usize> {
        let by_name = last_name.and_then(|name| {
            self.tracks_in_group()
                .position(|t| t.name == name && (!defaults_only || t.default))
        });
        by_name.or_else(|| {
            if defaults_only {
                self.tracks_in_group().position(|t| t.default)
            } else {
                None
            }
        })
    }
}
