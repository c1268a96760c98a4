//! Discord Rich Presence integration.
//!
//! Wraps a blocking `DiscordIpcClient`. The reconciler owns this adapter
//! and drives it from its own thread, so no actor or channel is needed.

use discord_rich_presence::{activity, DiscordIpc, DiscordIpcClient};
use tunecast_core::error::CoreError;
use tunecast_core::models::PresencePayload;
use tunecast_core::reconciler::PresenceClient;

/// Presence provider backed by the local Discord client's IPC socket.
pub struct DiscordPresence {
    client_id: String,
    client: Option<DiscordIpcClient>,
}

impl DiscordPresence {
    /// `client_id` is the registered Discord application whose assets
    /// (`appicon`, `playing`, `paused`, `stopped`) the payloads reference.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client: None,
        }
    }
}

impl PresenceClient for DiscordPresence {
    fn name(&self) -> &'static str {
        "Discord"
    }

    fn connect(&mut self) -> Result<(), CoreError> {
        let mut ipc = DiscordIpcClient::new(&self.client_id);
        ipc.connect().map_err(presence_error)?;
        self.client = Some(ipc);
        Ok(())
    }

    fn update(&mut self, payload: &PresencePayload) -> Result<(), CoreError> {
        let ipc = self
            .client
            .as_mut()
            .ok_or_else(|| CoreError::Presence("not connected".into()))?;

        let assets = activity::Assets::new()
            .large_image(&payload.large_image)
            .large_text(&payload.large_text)
            .small_image(&payload.small_image)
            .small_text(&payload.small_text);

        let mut presence = activity::Activity::new()
            .activity_type(activity::ActivityType::Listening)
            .details(&payload.details)
            .assets(assets);

        if let Some(state) = &payload.state {
            presence = presence.state(state);
        }
        if let Some(end) = payload.end {
            presence = presence.timestamps(activity::Timestamps::new().end(end));
        }
        if !payload.buttons.is_empty() {
            presence = presence.buttons(
                payload
                    .buttons
                    .iter()
                    .map(|b| activity::Button::new(&b.label, &b.url))
                    .collect(),
            );
        }

        ipc.set_activity(presence).map_err(presence_error)
    }

    fn clear(&mut self) -> Result<(), CoreError> {
        match self.client.as_mut() {
            Some(ipc) => ipc.clear_activity().map_err(presence_error),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<(), CoreError> {
        match self.client.take() {
            Some(mut ipc) => ipc.close().map_err(presence_error),
            None => Ok(()),
        }
    }
}

fn presence_error(e: impl std::fmt::Display) -> CoreError {
    CoreError::Presence(e.to_string())
}
