//! Peripheral abstraction layer for the badge access endpoint.
//!
//! This crate defines the three capabilities the controller drives, a card
//! reader, the door strike output and a text display, together with mock
//! implementations for tests and terminal-backed ones for running without
//! hardware.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Narrow**: each trait exposes only the calls the controller makes.
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return [`Result<T>`][error::Result] with
//!   a [`HardwareError`] on failure.
//!
//! # Example
//!
//! ```no_run
//! use gache_core::LockState;
//! use gache_hardware::traits::{CardReader, DisplaySink, LockActuator};
//! use gache_hardware::Result;
//!
//! async fn greet<R, L, D>(reader: &mut R, lock: &mut L, display: &mut D) -> Result<()>
//! where
//!     R: CardReader,
//!     L: LockActuator,
//!     D: DisplaySink,
//! {
//!     if reader.card_present().await? {
//!         if let Some(uid) = reader.read_serial().await? {
//!             lock.set_lock(LockState::Closed).await?;
//!             display.set_text(&format!("Badge {uid}")).await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod mock;
pub mod terminal;
pub mod traits;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{CardReader, DisplaySink, LockActuator};
