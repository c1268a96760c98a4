use serde::{Deserialize, Serialize};

/// What the remote viewer should see after one update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub large_image: String,
    pub large_text: String,
    pub small_image: String,
    pub small_text: String,
    /// First text line.
    pub details: String,
    /// Second text line.
    pub state: Option<String>,
    /// Unix timestamp (seconds) when the track ends; drives the countdown.
    pub end: Option<i64>,
    pub buttons: Vec<PresenceButton>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceButton {
    pub label: String,
    pub url: String,
}
