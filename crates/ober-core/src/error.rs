//! Error types for Ober Core

use crate::engine::EngineError;
use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned to integrators calling into a session before `setup`.
///
/// Kept in English on purpose: it is a programming error, not a viewer notice.
pub const NOT_SETUP_MESSAGE: &str = "Player has not been setup";

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Lifecycle errors
    #[error("{}", NOT_SETUP_MESSAGE)]
    NotSetup,

    #[error("A player is already set up on this host")]
    AlreadySetup,

    #[error("Provider has been destroyed")]
    ProviderDestroyed,

    #[error("No provider attached to the media element")]
    NoProvider,

    // Engine errors
    #[error("Streaming engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Browser is not supported by the streaming engine")]
    BrowserNotSupported,

    // Playback errors
    #[error("Playback request rejected by the media element")]
    PlayRejected,

    // Host collaborator errors
    #[error("Cannot load stylesheet {url}")]
    Stylesheet { url: String },

    #[error("Invalid chapters track: {0}")]
    InvalidChapters(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid DRM configuration: {0}")]
    InvalidDrm(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Returns true if the player keeps running after this error.
    ///
    /// Nothing here stops the event loop; a non-recoverable error only means
    /// the current entry cannot play until a new load.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Engine(e) => !e.is_user_visible(),
            Error::PlayRejected | Error::Stylesheet { .. } | Error::InvalidChapters(_) => true,
            _ => false,
        }
    }

    /// Returns the error code for logs and diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::NotSetup => "NOT_SETUP",
            Error::AlreadySetup => "ALREADY_SETUP",
            Error::ProviderDestroyed => "PROVIDER_DESTROYED",
            Error::NoProvider => "NO_PROVIDER",
            Error::Engine(_) => "ENGINE",
            Error::BrowserNotSupported => "BROWSER_UNSUPPORTED",
            Error::PlayRejected => "PLAY_REJECTED",
            Error::Stylesheet { .. } => "STYLESHEET",
            Error::InvalidChapters(_) => "INVALID_CHAPTERS",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidDrm(_) => "INVALID_DRM",
            Error::Json(_) => "JSON",
            Error::Url(_) => "URL",
            Error::Internal(_) => "INTERNAL",
        }
    }
}
