//! Worker error types

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Worker pool has been terminated")]
    PoolTerminated,

    #[error("Search executor {0} panicked")]
    ExecutorPanicked(usize),

    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Chess error: {0}")]
    Chess(#[from] chess_core::ChessCoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
