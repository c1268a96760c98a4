mod payload;
mod track;

pub use payload::{PresenceButton, PresencePayload};
pub use track::{TrackInfo, TrackInfoError, TRACK_FIELD_COUNT, UNKNOWN_YEAR};
pub use tunecast_detect::PlaybackStatus;
