use std::time::Duration;

use tracing::debug;

use crate::error::DetectError;
use crate::runner::ScriptRunner;
use crate::{platform, script, PlaybackStatus, PlayerState};

/// Separator between fields of the track-info blob.
pub const TRACK_FIELD_DELIMITER: &str = ", ";

/// Queries one scriptable player application.
#[derive(Debug, Clone)]
pub struct AppleMusicBridge {
    runner: ScriptRunner,
    app_name: String,
}

impl AppleMusicBridge {
    pub fn new(app_name: impl Into<String>, timeout: Duration) -> Self {
        Self::with_runner(app_name, ScriptRunner::osascript(timeout))
    }

    pub fn with_runner(app_name: impl Into<String>, runner: ScriptRunner) -> Self {
        Self {
            runner,
            app_name: app_name.into(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Number of running processes named after the player. Zero means the
    /// player is not running.
    pub fn process_count(&self) -> Result<u32, DetectError> {
        platform::count_processes(&self.runner, &self.app_name)
    }

    /// The player's raw state. Only meaningful while the player runs;
    /// asking a closed app would launch it.
    pub fn player_state(&self) -> Result<PlayerState, DetectError> {
        self.runner
            .run_applescript(&script::player_state(&self.app_name))?
            .parse()
    }

    /// Poll the normalized status, short-circuiting to stopped when the
    /// player process is absent.
    pub fn poll_status(&self) -> Result<PlaybackStatus, DetectError> {
        if self.process_count()? == 0 {
            debug!(app = %self.app_name, "Player not running");
            return Ok(PlaybackStatus::Stopped);
        }
        Ok(self.player_state()?.into())
    }

    /// Fetch the current track as raw fields in one batched call:
    /// title, artist, album, year, duration, position.
    ///
    /// The field count is not validated here.
    pub fn poll_track_fields(&self) -> Result<Vec<String>, DetectError> {
        let output = self
            .runner
            .run_applescript(&script::track_info(&self.app_name))?;
        Ok(split_track_fields(&output))
    }
}

/// Split a track-info blob into fields. Empty output yields no fields.
pub fn split_track_fields(raw: &str) -> Vec<String> {
    let raw = raw.trim_end();
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(TRACK_FIELD_DELIMITER).map(str::to_string).collect()
}

/// Parse the output of a process-count query.
pub fn parse_process_count(raw: &str) -> Result<u32, DetectError> {
    raw.trim()
        .parse()
        .map_err(|_| DetectError::UnexpectedOutput(raw.to_string()))
}
