//! Core constants for the badge access endpoint.
//!
//! Timing defaults: a 200 ms reader poll, a 5 s
//! anti-replay cooldown and a 3 s (full) or 1 s (reduced) result dwell.
//! They are defaults only; every value can be overridden through
//! [`ControllerConfig`](crate::config::ControllerConfig).
//!
//! # Usage
//!
//! ```
//! use gache_core::constants::*;
//! use std::time::Duration;
//!
//! let poll = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
//! assert_eq!(poll.as_millis(), 200);
//! assert!(FULL_DWELL_MS < DEFAULT_COOLDOWN_MS);
//! ```

// ============================================================================
// Timing
// ============================================================================

/// Reader polling period in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// Minimum time between two accepted scans, in milliseconds.
///
/// Suppresses duplicate entry/exit toggles from a badge left near the reader.
pub const DEFAULT_COOLDOWN_MS: u64 = 5000;

/// Result dwell for the full deployment variant, in milliseconds.
pub const FULL_DWELL_MS: u64 = 3000;

/// Result dwell for the reduced deployment variant, in milliseconds.
pub const REDUCED_DWELL_MS: u64 = 1000;

// ============================================================================
// Badge UIDs
// ============================================================================

/// Minimum UID length in bytes.
pub const MIN_UID_LENGTH: usize = 1;

/// Maximum UID length in bytes (triple-size ISO 14443 UID).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Display messages
// ============================================================================

/// Idle prompt shown while waiting for a badge.
pub const IDLE_PROMPT: &str = "Approchez un badge RFID";

/// Idle prompt used by the English message preset.
pub const IDLE_PROMPT_EN: &str = "present a badge";

/// Message shown when a scanned UID matches no registered badge.
pub const UNKNOWN_BADGE: &str = "Badge inconnu !";

/// Greeting word placed before the display name on entry.
pub const GREETING: &str = "Bonjour";

/// Text following the display name on entry.
pub const ENTRY_NOTICE: &str = "decompte du temps d'entrer";

/// Farewell word placed before the display name on exit.
pub const FAREWELL: &str = "Au revoir";

/// Label placed before the elapsed presence time on exit.
pub const ELAPSED_LABEL: &str = "Temps ecoule";

// ============================================================================
// Time decomposition
// ============================================================================

/// Milliseconds in one second.
pub const MS_PER_SECOND: u64 = 1000;

/// Milliseconds in one minute.
pub const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;

/// Milliseconds in one hour.
pub const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dwell_variants_fit_inside_cooldown() {
        assert!(REDUCED_DWELL_MS < FULL_DWELL_MS);
        assert!(FULL_DWELL_MS < DEFAULT_COOLDOWN_MS);
    }

    #[test]
    fn test_uid_length_bounds() {
        assert!(MIN_UID_LENGTH >= 1);
        assert!(MIN_UID_LENGTH <= MAX_UID_LENGTH);
    }

    #[test]
    fn test_messages_are_ascii() {
        for message in [
            IDLE_PROMPT,
            IDLE_PROMPT_EN,
            UNKNOWN_BADGE,
            GREETING,
            ENTRY_NOTICE,
            FAREWELL,
            ELAPSED_LABEL,
        ] {
            assert!(message.is_ascii(), "{message:?} is not ASCII");
        }
    }
}
