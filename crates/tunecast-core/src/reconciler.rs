//! Poll-driven reconciliation of player state into a presence session.
//!
//! The player offers no change notifications, so [`Reconciler::run_forever`]
//! polls on a fixed interval. The remote presence therefore lags the player
//! by at most one interval plus the time the queries take.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};
use tunecast_detect::{AppleMusicBridge, DetectError};

use crate::artwork::ArtworkLookup;
use crate::config::{AppConfig, SessionPolicy};
use crate::error::CoreError;
use crate::models::{PlaybackStatus, PresencePayload, TrackInfo};
use crate::payload::PayloadBuilder;

/// Source of player state.
pub trait PlayerSource {
    fn poll_status(&mut self) -> Result<PlaybackStatus, DetectError>;

    /// Raw track fields. Only called right after a non-stopped status.
    fn poll_track_fields(&mut self) -> Result<Vec<String>, DetectError>;
}

impl PlayerSource for AppleMusicBridge {
    fn poll_status(&mut self) -> Result<PlaybackStatus, DetectError> {
        AppleMusicBridge::poll_status(self)
    }

    fn poll_track_fields(&mut self) -> Result<Vec<String>, DetectError> {
        AppleMusicBridge::poll_track_fields(self)
    }
}

/// Remote presence session.
pub trait PresenceClient {
    /// Name of this provider (for logging).
    fn name(&self) -> &'static str;

    fn connect(&mut self) -> Result<(), CoreError>;

    /// Push a payload. Identical payloads are harmless.
    fn update(&mut self, payload: &PresencePayload) -> Result<(), CoreError>;

    /// Blank the displayed presence.
    fn clear(&mut self) -> Result<(), CoreError>;

    fn close(&mut self) -> Result<(), CoreError>;
}

/// Connection lifecycle as seen by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    /// Connected; the last payload sent says stopped.
    Idle,
    /// Connected; the last payload sent reflects playing or paused.
    Active,
}

pub struct Reconciler<S, P> {
    source: S,
    presence: P,
    builder: PayloadBuilder,
    policy: SessionPolicy,
    show_paused: bool,
    artwork: Option<ArtworkLookup>,
    state: SessionState,
}

impl<S: PlayerSource, P: PresenceClient> Reconciler<S, P> {
    pub fn new(source: S, presence: P, builder: PayloadBuilder, policy: SessionPolicy) -> Self {
        Self {
            source,
            presence,
            builder,
            policy,
            show_paused: true,
            artwork: None,
            state: SessionState::Disconnected,
        }
    }

    pub fn from_config(source: S, presence: P, config: &AppConfig) -> Result<Self, CoreError> {
        let mut reconciler = Self::new(
            source,
            presence,
            PayloadBuilder::from_config(config),
            config.presence.policy,
        )
        .show_paused(config.presence.show_paused);
        reconciler.artwork = ArtworkLookup::from_config(&config.artwork)?;
        Ok(reconciler)
    }

    /// When false, paused playback is reported as stopped.
    pub fn show_paused(mut self, show: bool) -> Self {
        self.show_paused = show;
        self
    }

    pub fn with_artwork(mut self, lookup: ArtworkLookup) -> Self {
        self.artwork = Some(lookup);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn presence(&self) -> &P {
        &self.presence
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one poll-build-drive step and return the resulting state.
    pub fn tick(&mut self, now: SystemTime) -> SessionState {
        let status = self.observe_status();
        debug!(%status, session = ?self.state, "Tick");

        if status == PlaybackStatus::Stopped {
            self.enter_stopped();
        } else {
            self.push_active(status, now);
        }
        self.state
    }

    /// Tick every `interval` until a message arrives on `shutdown` (or its
    /// sender is dropped), then close the session.
    pub fn run_forever(&mut self, interval: Duration, shutdown: &Receiver<()>) {
        info!(
            interval_secs = interval.as_secs(),
            policy = ?self.policy,
            provider = self.presence.name(),
            "Presence loop started"
        );

        loop {
            self.tick(SystemTime::now());
            match shutdown.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!("Presence loop stopping");
        self.shutdown();
    }

    /// Clear and close any open session.
    pub fn shutdown(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }
        if let Err(e) = self.presence.clear() {
            debug!(error = %e, "Failed to clear presence on shutdown");
        }
        self.drop_session();
    }

    fn observe_status(&mut self) -> PlaybackStatus {
        let status = match self.source.poll_status() {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Player query failed, treating as stopped");
                PlaybackStatus::Stopped
            }
        };

        if status == PlaybackStatus::Paused && !self.show_paused {
            PlaybackStatus::Stopped
        } else {
            status
        }
    }

    fn push_active(&mut self, status: PlaybackStatus, now: SystemTime) {
        if self.state == SessionState::Disconnected {
            if let Err(e) = self.presence.connect() {
                warn!(provider = self.presence.name(), error = %e, "Connect failed, retrying next tick");
                return;
            }
            info!(provider = self.presence.name(), "Presence session opened");
            self.state = SessionState::Idle;
        }

        let payload = self.payload_for(status, now);
        match self.presence.update(&payload) {
            Ok(()) => {
                debug!(details = %payload.details, end = ?payload.end, "Presence updated");
                self.state = SessionState::Active;
            }
            Err(e) => {
                warn!(provider = self.presence.name(), error = %e, "Update failed, reconnecting next tick");
                self.drop_session();
            }
        }
    }

    fn enter_stopped(&mut self) {
        if self.state != SessionState::Active {
            return;
        }

        match self.policy {
            SessionPolicy::PerSession => {
                if let Err(e) = self.presence.clear() {
                    debug!(error = %e, "Failed to clear presence");
                }
                self.drop_session();
                info!(provider = self.presence.name(), "Playback stopped, presence session closed");
            }
            SessionPolicy::Persistent => {
                let payload = self.builder.stopped();
                match self.presence.update(&payload) {
                    Ok(()) => {
                        info!("Playback stopped");
                        self.state = SessionState::Idle;
                    }
                    Err(e) => {
                        warn!(error = %e, "Stopped update failed, reconnecting next tick");
                        self.drop_session();
                    }
                }
            }
        }
    }

    fn payload_for(&mut self, status: PlaybackStatus, now: SystemTime) -> PresencePayload {
        let fields = match self.source.poll_track_fields() {
            Ok(fields) => fields,
            Err(e) => {
                warn!(error = %e, "Track query failed");
                return self.builder.degraded(status);
            }
        };

        let artwork = match (&mut self.artwork, TrackInfo::from_fields(&fields)) {
            (Some(lookup), Ok(track)) => lookup.lookup(&track),
            _ => None,
        };

        self.builder
            .build_with_artwork(status, Some(&fields[..]), artwork.as_ref(), now)
    }

    fn drop_session(&mut self) {
        if let Err(e) = self.presence.close() {
            debug!(error = %e, "Failed to close presence session");
        }
        self.state = SessionState::Disconnected;
    }
}
