use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Badge errors
    #[error("Invalid badge UID: {0}")]
    InvalidUid(String),

    #[error("Unknown badge index: {0}")]
    UnknownBadgeIndex(usize),

    // Controller errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Peripheral errors
    #[error("Hardware operation failed: {0}")]
    Hardware(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid UID error.
    pub fn invalid_uid(message: impl Into<String>) -> Self {
        Self::InvalidUid(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
