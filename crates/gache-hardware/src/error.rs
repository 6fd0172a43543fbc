//! Error types for peripheral operations.
//!
//! Covers the ways a reader, strike output or display can fail at the
//! boundary. The controller never treats these as fatal: they are logged and
//! polling continues.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during peripheral operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }
}

impl From<HardwareError> for gache_core::Error {
    fn from(error: HardwareError) -> Self {
        gache_core::Error::Hardware(error.to_string())
    }
}
