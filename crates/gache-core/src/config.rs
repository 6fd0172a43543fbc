//! Static configuration of the access endpoint.
//!
//! The configuration is read once at startup, either from the built-in
//! presets ([`ControllerConfig::full`], [`ControllerConfig::reduced`]) or from
//! a JSON document. Missing fields fall back to the full preset.
//!
//! # Examples
//!
//! ```
//! use gache_core::config::{ControllerConfig, LockPolicy};
//!
//! let config = ControllerConfig::from_json_str(r#"{
//!     "badges": [{"uid": [10, 242, 99, 154], "display_name": "Mr Nanette"}],
//!     "cooldown_ms": null,
//!     "dwell_ms": 1000
//! }"#).unwrap();
//!
//! assert_eq!(config.cooldown(), None);
//! assert_eq!(config.dwell().as_millis(), 1000);
//! assert_eq!(config.lock_policy, LockPolicy::EveryAuthorized);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COOLDOWN_MS, DEFAULT_POLL_INTERVAL_MS, ELAPSED_LABEL, ENTRY_NOTICE, FAREWELL,
    FULL_DWELL_MS, GREETING, IDLE_PROMPT, IDLE_PROMPT_EN, REDUCED_DWELL_MS, UNKNOWN_BADGE,
};
use crate::{BadgeIdentity, BadgeUid, Error, Result};

/// One registry entry as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeConfig {
    pub uid: BadgeUid,
    pub display_name: String,
}

impl BadgeConfig {
    /// Build an entry from raw UID bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidUid` if the UID length is out of range.
    pub fn new(uid: impl Into<Vec<u8>>, display_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            uid: BadgeUid::new(uid)?,
            display_name: display_name.into(),
        })
    }
}

/// Which accepted scans drive the strike closed for the dwell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LockPolicy {
    /// Every registered badge closes the strike.
    #[default]
    EveryAuthorized,

    /// Only the listed badges close the strike.
    Designated { uids: Vec<BadgeUid> },

    /// The strike is never driven closed.
    Disabled,
}

impl LockPolicy {
    /// Whether a scan of the registered badge `uid` closes the strike.
    #[must_use]
    pub fn closes_for(&self, uid: &BadgeUid) -> bool {
        match self {
            LockPolicy::EveryAuthorized => true,
            LockPolicy::Designated { uids } => uids.iter().any(|d| d == uid),
            LockPolicy::Disabled => false,
        }
    }
}

/// Texts pushed to the display sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayMessages {
    pub idle_prompt: String,
    pub unknown_badge: String,
    pub greeting: String,
    pub entry_notice: String,
    pub farewell: String,
    pub elapsed_label: String,
}

impl DisplayMessages {
    /// English preset.
    pub fn english() -> Self {
        Self {
            idle_prompt: IDLE_PROMPT_EN.to_string(),
            unknown_badge: "Unknown badge!".to_string(),
            greeting: "Hello".to_string(),
            entry_notice: "presence timer started".to_string(),
            farewell: "Goodbye".to_string(),
            elapsed_label: "Time inside".to_string(),
        }
    }
}

impl Default for DisplayMessages {
    fn default() -> Self {
        Self {
            idle_prompt: IDLE_PROMPT.to_string(),
            unknown_badge: UNKNOWN_BADGE.to_string(),
            greeting: GREETING.to_string(),
            entry_notice: ENTRY_NOTICE.to_string(),
            farewell: FAREWELL.to_string(),
            elapsed_label: ELAPSED_LABEL.to_string(),
        }
    }
}

/// Full controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Ordered badge registry. The first matching entry wins.
    pub badges: Vec<BadgeConfig>,

    /// Anti-replay cooldown in milliseconds; `None` disables it.
    pub cooldown_ms: Option<u64>,

    /// Reader polling period in milliseconds.
    pub poll_interval_ms: u64,

    /// How long a result stays displayed, in milliseconds.
    pub dwell_ms: u64,

    pub lock_policy: LockPolicy,

    pub messages: DisplayMessages,
}

impl ControllerConfig {
    /// Full variant: 5 s cooldown, 3 s dwell.
    pub fn full() -> Self {
        Self {
            badges: default_badges(),
            cooldown_ms: Some(DEFAULT_COOLDOWN_MS),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            dwell_ms: FULL_DWELL_MS,
            lock_policy: LockPolicy::EveryAuthorized,
            messages: DisplayMessages::default(),
        }
    }

    /// Reduced variant: no cooldown, 1 s dwell.
    pub fn reduced() -> Self {
        Self {
            cooldown_ms: None,
            dwell_ms: REDUCED_DWELL_MS,
            ..Self::full()
        }
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// Returns `Error::ConfigFormat` on malformed JSON and `Error::Config`
    /// when validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, otherwise the same
    /// errors as [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the configuration for values the controller cannot run with.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.badges.is_empty() {
            return Err(Error::config("at least one badge is required"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::config("poll_interval_ms must be greater than 0"));
        }
        if let LockPolicy::Designated { uids } = &self.lock_policy {
            if let Some(missing) = uids
                .iter()
                .find(|uid| !self.badges.iter().any(|b| &b.uid == *uid))
            {
                return Err(Error::config(format!(
                    "designated badge {missing} is not registered"
                )));
            }
        }
        self.identities().map(|_| ())
    }

    /// Build the immutable registry entries, in configuration order.
    ///
    /// # Errors
    /// Returns `Error::Config` if a display name is blank.
    pub fn identities(&self) -> Result<Vec<BadgeIdentity>> {
        self.badges
            .iter()
            .map(|b| BadgeIdentity::new(b.uid.clone(), b.display_name.clone()))
            .collect()
    }

    /// UIDs registered more than once. Only the first entry is ever matched.
    pub fn duplicate_uids(&self) -> Vec<&BadgeUid> {
        self.badges
            .iter()
            .enumerate()
            .filter(|(i, b)| self.badges[..*i].iter().any(|prev| prev.uid == b.uid))
            .map(|(_, b)| &b.uid)
            .collect()
    }

    pub fn cooldown(&self) -> Option<Duration> {
        self.cooldown_ms.map(Duration::from_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::full()
    }
}

fn default_badges() -> Vec<BadgeConfig> {
    [
        (vec![10, 242, 99, 154], "Mr Nanette"),
        (vec![26, 162, 156, 154], "Mr Mevel"),
        (vec![233, 68, 32, 122], "Mr Bur"),
    ]
    .into_iter()
    .map(|(uid, name)| BadgeConfig {
        uid: BadgeUid(uid),
        display_name: name.to_string(),
    })
    .collect()
}
