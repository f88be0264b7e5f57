//! Error types for clipfetch

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Operation that handed work to the extraction engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOp {
    /// Single video or audio download
    Download,
    /// Metadata-only lookup
    Info,
    /// Whole playlist download
    Playlist,
}

impl fmt::Display for EngineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineOp::Download => write!(f, "Download"),
            EngineOp::Info => write!(f, "Info lookup"),
            EngineOp::Playlist => write!(f, "Playlist download"),
        }
    }
}

/// Main error type for clipfetch operations
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Any failure inside the extraction engine. The cause is the engine's own
    /// text; failures are not classified any further.
    #[error("{op} failed: {cause}")]
    Engine { op: EngineOp, cause: String },

    #[error(transparent)]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Browser setup failed: {0}")]
    BrowserSetup(String),

    #[error("Navigation did not finish within {}", humantime::format_duration(*.0))]
    NavigationTimeout(Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl FetchError {
    /// Wrap an engine failure, keeping the whole cause chain in the message
    pub fn engine(op: EngineOp, err: anyhow::Error) -> Self {
        FetchError::Engine {
            op,
            cause: format!("{:#}", err),
        }
    }

    /// Check if error came from the extraction engine
    pub fn is_engine_error(&self) -> bool {
        matches!(self, FetchError::Engine { .. })
    }

    /// Check if error came from browser automation
    pub fn is_browser_error(&self) -> bool {
        matches!(
            self,
            FetchError::Browser(_) | FetchError::BrowserSetup(_) | FetchError::NavigationTimeout(_)
        )
    }
}
