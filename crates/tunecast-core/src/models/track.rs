use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fields in a complete track-info read.
pub const TRACK_FIELD_COUNT: usize = 6;

/// Year value the player reports when the year is unknown.
pub const UNKNOWN_YEAR: &str = "0";

/// Metadata of the current track, valid for a single poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Raw year text; may be empty or [`UNKNOWN_YEAR`].
    pub year: String,
    /// Track length in seconds.
    pub duration: f64,
    /// Playback position in seconds.
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackInfoError {
    #[error("expected 6 track fields, got {0}")]
    FieldCount(usize),

    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

impl TrackInfo {
    /// Build from the ordered fields title, artist, album, year, duration,
    /// position. Any other field count is rejected before indexing.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, TrackInfoError> {
        let [title, artist, album, year, duration, position] = fields else {
            return Err(TrackInfoError::FieldCount(fields.len()));
        };

        Ok(Self {
            title: title.as_ref().to_string(),
            artist: artist.as_ref().to_string(),
            album: album.as_ref().to_string(),
            year: year.as_ref().trim().to_string(),
            duration: parse_seconds("duration", duration.as_ref())?,
            position: parse_seconds("position", position.as_ref())?,
        })
    }

    /// The year, unless it is empty or the unknown sentinel.
    pub fn year(&self) -> Option<&str> {
        let year = self.year.trim();
        (!year.is_empty() && year != UNKNOWN_YEAR).then_some(year)
    }

    /// Seconds left in the track, never negative.
    pub fn remaining(&self) -> f64 {
        (self.duration - self.position).max(0.0)
    }

    /// `" (year)"` or nothing.
    pub fn year_suffix(&self) -> String {
        self.year().map(|y| format!(" ({y})")).unwrap_or_default()
    }

    /// `"artist — album (year)"`, the year segment omitted when unknown.
    pub fn state_line(&self) -> String {
        format!("{} — {}{}", self.artist, self.album, self.year_suffix())
    }
}

fn parse_seconds(field: &'static str, value: &str) -> Result<f64, TrackInfoError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| TrackInfoError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(year: &str) -> Vec<String> {
        ["Song A", "Artist B", "Album C", year, "240", "60"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_from_fields() {
        let track = TrackInfo::from_fields(&fields("2020")).unwrap();
        assert_eq!(track.title, "Song A");
        assert_eq!(track.artist, "Artist B");
        assert_eq!(track.album, "Album C");
        assert_eq!(track.year(), Some("2020"));
        assert_eq!(track.duration, 240.0);
        assert_eq!(track.position, 60.0);
        assert_eq!(track.remaining(), 180.0);
    }

    #[test]
    fn test_state_line_with_year() {
        let track = TrackInfo::from_fields(&fields("2020")).unwrap();
        assert_eq!(track.state_line(), "Artist B — Album C (2020)");
    }

    #[test]
    fn test_state_line_unknown_year() {
        let track = TrackInfo::from_fields(&fields("0")).unwrap();
        assert_eq!(track.year(), None);
        assert_eq!(track.state_line(), "Artist B — Album C");

        let track = TrackInfo::from_fields(&fields("")).unwrap();
        assert_eq!(track.state_line(), "Artist B — Album C");
    }

    #[test]
    fn test_short_read_rejected() {
        let err = TrackInfo::from_fields(&["Song A", "Artist B"]).unwrap_err();
        assert_eq!(err, TrackInfoError::FieldCount(2));

        let empty: [&str; 0] = [];
        assert_eq!(
            TrackInfo::from_fields(&empty).unwrap_err(),
            TrackInfoError::FieldCount(0)
        );
    }

    #[test]
    fn test_extra_fields_rejected() {
        let err = TrackInfo::from_fields(&["Hello", "Goodbye", "A", "B", "C", "2020", "1", "0"])
            .unwrap_err();
        assert_eq!(err, TrackInfoError::FieldCount(8));
    }

    #[test]
    fn test_bad_numbers_rejected() {
        let err = TrackInfo::from_fields(&["a", "b", "c", "0", "missing value", "1"]).unwrap_err();
        assert!(matches!(err, TrackInfoError::InvalidNumber { field: "duration", .. }));

        let err = TrackInfo::from_fields(&["a", "b", "c", "0", "10", "-1"]).unwrap_err();
        assert!(matches!(err, TrackInfoError::InvalidNumber { field: "position", .. }));
    }

    #[test]
    fn test_remaining_never_negative() {
        let track = TrackInfo::from_fields(&["a", "b", "c", "0", "100", "120.5"]).unwrap();
        assert_eq!(track.remaining(), 0.0);
    }
}
