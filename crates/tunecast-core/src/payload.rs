//! Pure mapping from observed player state to a presence payload.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;
use url::Url;

use crate::artwork::ArtworkInfo;
use crate::config::AppConfig;
use crate::models::{PlaybackStatus, PresenceButton, PresencePayload, TrackInfo};

/// Discord rejects text fields outside this range (in characters).
pub const TEXT_MIN_LEN: usize = 2;
pub const TEXT_MAX_LEN: usize = 128;

/// Shortest countdown ever shown, so the end stays in the future.
const MIN_COUNTDOWN_SECS: f64 = 1.0;

const STOPPED_DETAILS: &str = "Nothing is playing";
const UNAVAILABLE_STATE: &str = "Details unavailable";
const LISTEN_BUTTON_LABEL: &str = "Listen on Apple Music";
const SPOTIFY_BUTTON_LABEL: &str = "Search on Spotify";
const SPOTIFY_SEARCH_URL: &str = "https://open.spotify.com/search";
/// Discord rejects button URLs longer than this.
const MAX_BUTTON_URL_LEN: usize = 512;

/// Builds payloads from a fixed set of asset identifiers.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    large_image: String,
    large_text: String,
    app_label: String,
}

impl PayloadBuilder {
    pub fn new(
        large_image: impl Into<String>,
        large_text: impl Into<String>,
        app_label: impl Into<String>,
    ) -> Self {
        Self {
            large_image: large_image.into(),
            large_text: large_text.into(),
            app_label: app_label.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.presence.large_image,
            &config.presence.large_text,
            config.player.display_name(),
        )
    }

    /// Payload for `status` given the raw track fields, if any were read.
    ///
    /// Missing or malformed fields for a non-stopped status produce the
    /// degraded payload; fields are ignored when stopped.
    pub fn build<S: AsRef<str>>(
        &self,
        status: PlaybackStatus,
        fields: Option<&[S]>,
        now: SystemTime,
    ) -> PresencePayload {
        self.build_with_artwork(status, fields, None, now)
    }

    pub fn build_with_artwork<S: AsRef<str>>(
        &self,
        status: PlaybackStatus,
        fields: Option<&[S]>,
        artwork: Option<&ArtworkInfo>,
        now: SystemTime,
    ) -> PresencePayload {
        if status == PlaybackStatus::Stopped {
            return self.stopped();
        }

        let Some(fields) = fields else {
            return self.degraded(status);
        };

        match TrackInfo::from_fields(fields) {
            Ok(track) => self.for_track(status, &track, artwork, now),
            Err(e) => {
                debug!(error = %e, "Malformed track info, using fallback payload");
                self.degraded(status)
            }
        }
    }

    /// Payload for a valid track read.
    pub fn for_track(
        &self,
        status: PlaybackStatus,
        track: &TrackInfo,
        artwork: Option<&ArtworkInfo>,
        now: SystemTime,
    ) -> PresencePayload {
        if status == PlaybackStatus::Stopped {
            return self.stopped();
        }

        let mut payload = self.base(status);
        payload.details = clamp_text(&track.title);
        payload.state = Some(clamp_text(&track.state_line()));
        if status == PlaybackStatus::Playing {
            payload.end = Some(end_timestamp(now, track.remaining()));
        }

        if let Some(artwork) = artwork {
            if let Some(url) = &artwork.artwork_url {
                payload.large_image = url.clone();
                payload.large_text = clamp_text(&format!("{}{}", track.album, track.year_suffix()));
            }
            if let Some(url) = &artwork.collection_url {
                payload.buttons.push(PresenceButton {
                    label: LISTEN_BUTTON_LABEL.to_string(),
                    url: url.clone(),
                });
            }
        }

        if let Some(url) = spotify_search_url(track) {
            payload.buttons.push(PresenceButton {
                label: SPOTIFY_BUTTON_LABEL.to_string(),
                url,
            });
        }

        payload
    }

    /// Fixed payload shown while nothing plays.
    pub fn stopped(&self) -> PresencePayload {
        let mut payload = self.base(PlaybackStatus::Stopped);
        payload.details = STOPPED_DETAILS.to_string();
        payload
    }

    /// Fallback when the player is active but the track could not be read.
    pub fn degraded(&self, status: PlaybackStatus) -> PresencePayload {
        let mut payload = self.base(status);
        payload.details = clamp_text(&format!(
            "{} is {}",
            self.app_label,
            status.as_str()
        ));
        payload.state = Some(UNAVAILABLE_STATE.to_string());
        payload
    }

    fn base(&self, status: PlaybackStatus) -> PresencePayload {
        PresencePayload {
            large_image: self.large_image.clone(),
            large_text: clamp_text(&self.large_text),
            small_image: status.as_str().to_string(),
            small_text: status.label().to_string(),
            details: String::new(),
            state: None,
            end: None,
            buttons: Vec::new(),
        }
    }
}

/// Unix seconds at which a track with `remaining` seconds left ends.
pub fn end_timestamp(now: SystemTime, remaining: f64) -> i64 {
    let now = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    (now + remaining.max(MIN_COUNTDOWN_SECS)).ceil() as i64
}

/// Spotify search for the track, or `None` if the URL would be too long
/// for a button.
pub fn spotify_search_url(track: &TrackInfo) -> Option<String> {
    let mut url = Url::parse(SPOTIFY_SEARCH_URL).ok()?;
    url.path_segments_mut()
        .ok()?
        .push(&format!("artist:{} track:{}", track.artist, track.title));
    url.set_query(Some("si"));

    let url = String::from(url);
    (url.len() <= MAX_BUTTON_URL_LEN).then_some(url)
}

/// Fit `text` into Discord's length limits: pad short text with spaces,
/// truncate long text with an ellipsis.
pub fn clamp_text(text: &str) -> String {
    let len = text.chars().count();
    if len < TEXT_MIN_LEN {
        format!("{text:<TEXT_MIN_LEN$}")
    } else if len > TEXT_MAX_LEN {
        let mut truncated: String = text.chars().take(TEXT_MAX_LEN - 3).collect();
        truncated.push_str("...");
        truncated
    } else {
        text.to_string()
    }
}
