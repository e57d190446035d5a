use serde::{Deserialize, Serialize};

/// Rendition type of a manifest-declared text track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum MediaType {
    #[default]
    Subtitles,
    ClosedCaptions,
}

/// An `EXT-X-RENDITION-REPORT` entry of a live playlist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenditionReport {
    pub uri: String,
    pub last_msn: Option<u64>,
    pub last_part: Option<u64>,
}

/// The parts of a loaded media playlist the controller reads.
///
/// Durations are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistDetails {
    pub url: String,
    pub live: bool,
    /// The last reload changed the playlist
    pub updated: bool,
    pub target_duration: f64,
    pub part_target: Option<f64>,
    /// Seconds since the playlist was fetched
    pub age: f64,
    pub start_sn: u64,
    pub end_sn: u64,
    /// Media sequence number holding the last partial segment
    pub last_part_sn: u64,
    /// Index of the last partial segment, None without parts
    pub last_part_index: Option<u64>,
    pub can_block_reload: bool,
    /// `CAN-SKIP-UNTIL` in seconds, 0 when skipping is not offered
    pub can_skip_until: f64,
    pub can_skip_date_ranges: bool,
    pub rendition_reports: Vec<RenditionReport>,
    pub last_segment_duration: Option<f64>,
}

/// A subtitle track declared by the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    /// Index of the track within its group
    pub id: usize,
    pub group_id: String,
    pub name: String,
    pub lang: Option<String>,
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub default: bool,
    pub autoselect: bool,
    pub forced: bool,
    /// Last loaded playlist, None until the first load completes
    pub details: Option<PlaylistDetails>,
}

impl Track {
    pub fn is_loaded(&self) -> bool {
        self.details.is_some()
    }

    pub fn is_live(&self) -> bool {
        self.details.as_ref().map(|d| d.live).unwrap_or(false)
    }
}
