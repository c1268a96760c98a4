//! Apple Music state detection through the macOS automation bridge.
//!
//! Every query shells out to `osascript`. The bridge has no push channel,
//! so callers poll: [`AppleMusicBridge::poll_status`] for the coarse state
//! and [`AppleMusicBridge::poll_track_fields`] for the current track.

pub mod bridge;
pub mod error;
pub mod platform;
pub mod runner;
pub mod script;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use bridge::{parse_process_count, split_track_fields, AppleMusicBridge, TRACK_FIELD_DELIMITER};
pub use error::DetectError;
pub use runner::ScriptRunner;

/// Normalized playback status derived from one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Stopped,
    Paused,
    Playing,
}

impl PlaybackStatus {
    /// Lowercase identifier, also used as the small-image asset key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Paused => "paused",
            Self::Playing => "playing",
        }
    }

    /// Capitalized label for display text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Paused => "Paused",
            Self::Playing => "Playing",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw `player state` as reported by the Music app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
    FastForwarding,
    Rewinding,
}

impl From<PlayerState> for PlaybackStatus {
    fn from(state: PlayerState) -> Self {
        match state {
            PlayerState::Stopped => PlaybackStatus::Stopped,
            PlayerState::Paused => PlaybackStatus::Paused,
            // Seeking still advances toward the end of the track.
            PlayerState::Playing | PlayerState::FastForwarding | PlayerState::Rewinding => {
                PlaybackStatus::Playing
            }
        }
    }
}

impl FromStr for PlayerState {
    type Err = DetectError;

    /// Accepts the terminology names and the raw four-char constants that
    /// `osascript` prints when the app dictionary is unavailable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "stopped" | "«constant ****kPSS»" => Ok(Self::Stopped),
            "playing" | "«constant ****kPSP»" => Ok(Self::Playing),
            "paused" | "«constant ****kPSp»" => Ok(Self::Paused),
            "fast forwarding" | "«constant ****kPSF»" => Ok(Self::FastForwarding),
            "rewinding" | "«constant ****kPSR»" => Ok(Self::Rewinding),
            other => Err(DetectError::UnexpectedOutput(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_state_names() {
        assert_eq!("playing".parse::<PlayerState>().unwrap(), PlayerState::Playing);
        assert_eq!("paused\n".parse::<PlayerState>().unwrap(), PlayerState::Paused);
        assert_eq!("stopped".parse::<PlayerState>().unwrap(), PlayerState::Stopped);
        assert_eq!(
            "fast forwarding".parse::<PlayerState>().unwrap(),
            PlayerState::FastForwarding
        );
    }

    #[test]
    fn test_player_state_raw_constants() {
        assert_eq!(
            "«constant ****kPSP»".parse::<PlayerState>().unwrap(),
            PlayerState::Playing
        );
        assert_eq!(
            "«constant ****kPSp»".parse::<PlayerState>().unwrap(),
            PlayerState::Paused
        );
    }

    #[test]
    fn test_player_state_rejects_garbage() {
        let err = "".parse::<PlayerState>().unwrap_err();
        assert!(matches!(err, DetectError::UnexpectedOutput(_)));
        assert!("buffering".parse::<PlayerState>().is_err());
    }

    #[test]
    fn test_seeking_counts_as_playing() {
        assert_eq!(
            PlaybackStatus::from(PlayerState::Rewinding),
            PlaybackStatus::Playing
        );
        assert_eq!(
            PlaybackStatus::from(PlayerState::FastForwarding),
            PlaybackStatus::Playing
        );
        assert_eq!(PlaybackStatus::from(PlayerState::Paused), PlaybackStatus::Paused);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(PlaybackStatus::Playing.as_str(), "playing");
        assert_eq!(PlaybackStatus::Paused.label(), "Paused");
        assert_eq!(PlaybackStatus::Stopped.to_string(), "stopped");
    }
}
