//! Low-latency HLS delivery directives
//!
//! `_HLS_msn`, `_HLS_part` and `_HLS_skip` query parameters that ask a live
//! origin for the playlist update following a known media sequence.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;
use crate::types::PlaylistDetails;

const MSN_PARAM: &str = "_HLS_msn";
const PART_PARAM: &str = "_HLS_part";
const SKIP_PARAM: &str = "_HLS_skip";

/// Playlist delta update request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipDirective {
    #[default]
    No,
    Yes,
    V2,
}

impl SkipDirective {
    /// Query parameter value, None when no skip is requested
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            SkipDirective::No => None,
            SkipDirective::Yes => Some("YES"),
            SkipDirective::V2 => Some("v2"),
        }
    }
}

/// Delivery directives appended to a playlist request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDirectives {
    pub msn: Option<u64>,
    pub part: Option<u64>,
    pub skip: SkipDirective,
}

impl DeliveryDirectives {
    pub fn new(msn: Option<u64>, part: Option<u64>, skip: SkipDirective) -> Self {
        Self { msn, part, skip }
    }

    /// Rewrite `uri` with these directives, replacing any already present.
    pub fn add_directives(&self, uri: &str) -> Result<String> {
        let mut url = Url::parse(uri)?;

        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != MSN_PARAM && key != PART_PARAM && key != SKIP_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        if let Some(msn) = self.msn {
            params.push((MSN_PARAM.to_string(), msn.to_string()));
        }
        if let Some(part) = self.part {
            params.push((PART_PARAM.to_string(), part.to_string()));
        }
        if let Some(skip) = self.skip.as_param() {
            params.push((SKIP_PARAM.to_string(), skip.to_string()));
        }

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
        Ok(url.into())
    }
}

/// Skip directive a playlist allows, given how old it is.
pub fn skip_directive(details: &PlaylistDetails) -> SkipDirective {
    let recent_enough = details.age < details.can_skip_until / 2.0;
    if details.can_skip_until > 0.0 && recent_enough {
        if details.can_skip_date_ranges {
            SkipDirective::V2
        } else {
            SkipDirective::Yes
        }
    } else {
        SkipDirective::No
    }
}

/// Directives for the first request of `playlist_uri` after switching away
/// from a rendition whose last playlist was `previous`.
///
/// The previous playlist's rendition reports tell where the target
/// rendition's live edge was. An exact URI match wins; otherwise the last
/// report whose URI prefixes the target is used.
pub fn switch_params(
    playlist_uri: &str,
    previous: Option<&PlaylistDetails>,
    current: Option<&PlaylistDetails>,
    low_latency: bool,
) -> Option<DeliveryDirectives> {
    let previous = previous?;
    let base = Url::parse(&previous.url).ok();

    let mut found = None;
    for (i, report) in previous.rendition_reports.iter().enumerate() {
        let uri = base
            .as_ref()
            .and_then(|base| base.join(&report.uri).ok())
            .map(String::from)
            .unwrap_or_else(|| report.uri.clone());
        if uri == playlist_uri {
            found = Some(i);
            break;
        }
        if playlist_uri.starts_with(&uri) {
            found = Some(i);
        }
    }
    let report = &previous.rendition_reports[found?];

    let msn = report.last_msn.unwrap_or(previous.last_part_sn);
    let mut part = report.last_part.or(previous.last_part_index);
    if low_latency {
        let part_target = previous.part_target.unwrap_or(0.0);
        let current_goal = (previous.age - part_target).min(previous.target_duration);
        if current_goal > part_target {
            part = part.map(|p| p + 1);
        }
    }
    let skip = current.map(skip_directive).unwrap_or_default();

    Some(DeliveryDirectives::new(Some(msn), part, skip))
}
