//! Badge registry and per-badge presence table.
//!
//! The registry pairs every configured [`BadgeIdentity`] with its
//! [`BadgeState`], keyed by position. It is built once at startup and owned
//! by the controller; nothing else mutates it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use gache_core::{BadgeIdentity, BadgeState, BadgeUid, ElapsedTime, Error, Result};

/// Why a scanned UID was not resolved to a badge.
///
/// Both reasons are ordinary outcomes and are handled identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanRejection {
    /// UID has a plausible length but is not registered.
    UnknownBadge,

    /// UID length matches no registered badge at all.
    MalformedRead,
}

/// Result of looking up a UID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Index of the first registered badge with this UID.
    Known(usize),
    Rejected(ScanRejection),
}

/// Presence change applied by an accepted scan of a registered badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresenceChange {
    Entered,
    Exited { elapsed: ElapsedTime },
}

/// Registered identities with their presence states.
#[derive(Debug, Clone)]
pub struct PresenceRegistry {
    identities: Vec<BadgeIdentity>,
    states: Vec<BadgeState>,
}

impl PresenceRegistry {
    /// Build a registry with every badge absent.
    pub fn new(identities: Vec<BadgeIdentity>) -> Self {
        let states = vec![BadgeState::default(); identities.len()];
        Self { identities, states }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn identities(&self) -> &[BadgeIdentity] {
        &self.identities
    }

    pub fn identity(&self, index: usize) -> Option<&BadgeIdentity> {
        self.identities.get(index)
    }

    pub fn state(&self, index: usize) -> Option<&BadgeState> {
        self.states.get(index)
    }

    pub fn states(&self) -> &[BadgeState] {
        &self.states
    }

    /// Number of badges currently inside.
    pub fn present_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_present).count()
    }

    /// Find the first registered badge whose UID matches `uid` exactly.
    pub fn resolve(&self, uid: &BadgeUid) -> Resolution {
        if let Some(index) = self
            .identities
            .iter()
            .position(|identity| identity.uid().matches(uid.as_bytes()))
        {
            return Resolution::Known(index);
        }

        let plausible_length = self
            .identities
            .iter()
            .any(|identity| identity.uid().len() == uid.len());

        Resolution::Rejected(if plausible_length {
            ScanRejection::UnknownBadge
        } else {
            ScanRejection::MalformedRead
        })
    }

    /// Flip the presence of badge `index` at time `at`.
    ///
    /// An absent badge enters; a present badge exits and the time since its
    /// entry is returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownBadgeIndex` if `index` is out of range.
    pub fn toggle(&mut self, index: usize, at: Duration) -> Result<PresenceChange> {
        let state = self
            .states
            .get_mut(index)
            .ok_or(Error::UnknownBadgeIndex(index))?;

        if state.is_present {
            Ok(PresenceChange::Exited {
                elapsed: state.exit(at),
            })
        } else {
            state.enter(at);
            Ok(PresenceChange::Entered)
        }
    }
}
