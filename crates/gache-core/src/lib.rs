pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{BadgeConfig, ControllerConfig, DisplayMessages, LockPolicy};
pub use error::{Error, Result};
pub use types::*;

