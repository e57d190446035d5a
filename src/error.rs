use thiserror::Error;

/// Main error type for the subtitle track controller
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A track id outside the tracks of the active group
    #[error("Invalid subtitle track id {id} ({len} track(s) in group)")]
    InvalidTrackId { id: usize, len: usize },

    /// A loaded playlist that belongs to a different group than the active one
    #[error("Subtitle track {id} of group {group:?} not found in active group {active:?}")]
    TrackNotInGroup {
        id: usize,
        group: String,
        active: Option<String>,
    },

    /// The playlist URL could not be rebuilt with delivery directives
    #[error("Could not construct URL with delivery directives: {0}")]
    Directives(#[from] url::ParseError),

    /// Configuration file could not be decoded
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration could not be encoded
    #[error("Configuration encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    /// A replay scenario could not be decoded
    #[error("Scenario error: {0}")]
    Scenario(#[from] serde_json::Error),

    /// The controller task is gone
    #[error("Subtitle service stopped")]
    ServiceStopped,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SubtitleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_track_id_message() {
        let err = SubtitleError::InvalidTrackId { id: 5, len: 2 };
        assert_eq!(
            err.to_string(),
            "Invalid subtitle track id 5 (2 track(s) in group)"
        );
    }

    #[test]
    fn test_directive_error_from_parse_error() {
        let err: SubtitleError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, SubtitleError::Directives(_)));
    }
}
