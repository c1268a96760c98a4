use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("script exited with status {status:?}: {stderr}")]
    Script { status: Option<i32>, stderr: String },

    #[error("unexpected script output: {0:?}")]
    UnexpectedOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
