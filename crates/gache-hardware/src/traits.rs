//! Peripheral capability traits.
//!
//! Each peripheral the controller talks to is reduced to the few calls it
//! actually needs. Real drivers and the in-memory mocks implement the same
//! traits, so the controller never knows which one it drives.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use gache_core::{BadgeUid, LockState};

use crate::error::Result;

/// Contactless card reader.
///
/// Polled at a fixed rate. `card_present` never blocks waiting for a card:
/// "no card" is an immediate `Ok(false)`.
///
/// # Object Safety
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use a generic type parameter:
///
/// ```no_run
/// use gache_hardware::traits::CardReader;
/// use gache_hardware::error::Result;
///
/// async fn poll_once<R: CardReader>(reader: &mut R) -> Result<Option<String>> {
///     if !reader.card_present().await? {
///         return Ok(None);
///     }
///     let uid = reader.read_serial().await?;
///     reader.halt().await?;
///     Ok(uid.map(|uid| uid.to_hex()))
/// }
/// ```
pub trait CardReader: Send + Sync {
    /// Check whether a new card entered the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader cannot be reached.
    async fn card_present(&mut self) -> Result<bool>;

    /// Read the serial number of the card reported by `card_present`.
    ///
    /// Only meaningful right after `card_present` returned `true`. Returns
    /// `Ok(None)` when the card left the field or the read failed its
    /// anticollision step.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader cannot be reached.
    async fn read_serial(&mut self) -> Result<Option<BadgeUid>>;

    /// End the current card session.
    ///
    /// Called once per accepted read before polling resumes.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader cannot be reached.
    async fn halt(&mut self) -> Result<()>;
}

/// Door strike output.
///
/// Setting the state it is already in is a no-op.
pub trait LockActuator: Send + Sync {
    /// Drive the strike output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be driven.
    async fn set_lock(&mut self, state: LockState) -> Result<()>;
}

/// Text display.
///
/// Every update replaces the whole text and re-centers it.
pub trait DisplaySink: Send + Sync {
    /// Replace the displayed text.
    ///
    /// # Errors
    ///
    /// Returns an error if the display cannot be written.
    async fn set_text(&mut self, text: &str) -> Result<()>;
}
