use thiserror::Error;
use tunecast_detect::DetectError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("detection failed: {0}")]
    Detect(#[from] DetectError),

    #[error("config error: {0}")]
    Config(String),

    #[error("presence error: {0}")]
    Presence(String),

    #[error("artwork request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cache error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
