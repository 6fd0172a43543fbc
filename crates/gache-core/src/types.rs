use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH, MS_PER_HOUR, MS_PER_MINUTE, MS_PER_SECOND},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use subtle::ConstantTimeEq;

/// Badge unique identifier (1-10 bytes).
///
/// # Security
/// Once lengths match, bytes are compared in constant time. A length mismatch
/// is a plain "no match", never an error.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct BadgeUid(pub(crate) Vec<u8>);

impl BadgeUid {
    /// Create a new UID with length validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidUid` if the UID is not between 1 and 10 bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&bytes.len()) {
            return Err(Error::invalid_uid(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(BadgeUid(bytes))
    }

    /// Raw UID bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UID length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the UID has no bytes. Never true for a validated UID.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact, order-sensitive comparison against raw bytes.
    ///
    /// Returns `false` on any length mismatch.
    #[must_use]
    pub fn matches(&self, other: &[u8]) -> bool {
        self.0.len() == other.len() && bool::from(self.0.as_slice().ct_eq(other))
    }

    /// Uppercase hex rendering without separators (e.g. `0AF2639A`).
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02X}")).collect()
    }

    /// Decimal byte rendering separated by spaces (e.g. `10 242 99 154`).
    #[must_use]
    pub fn to_decimal(&self) -> String {
        self.0
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl PartialEq for BadgeUid {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl fmt::Display for BadgeUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

impl TryFrom<Vec<u8>> for BadgeUid {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        BadgeUid::new(bytes)
    }
}

impl From<BadgeUid> for Vec<u8> {
    fn from(uid: BadgeUid) -> Self {
        uid.0
    }
}

impl std::str::FromStr for BadgeUid {
    type Err = Error;

    /// Parse either decimal bytes separated by whitespace or commas
    /// (`10 242 99 154`) or a single hex token (`0AF2639A`, `0x0af2639a`).
    fn from_str(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();

        let bytes = match tokens.as_slice() {
            [] => return Err(Error::invalid_uid("empty UID")),
            [single] => parse_hex(single)?,
            many => many
                .iter()
                .map(|t| {
                    t.parse::<u8>()
                        .map_err(|_| Error::invalid_uid(format!("invalid decimal byte: {t}")))
                })
                .collect::<Result<Vec<u8>>>()?,
        };

        BadgeUid::new(bytes)
    }
}

fn parse_hex(token: &str) -> Result<Vec<u8>> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);

    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::invalid_uid(format!("invalid hex UID: {token}")));
    }
    if digits.len() % 2 != 0 {
        return Err(Error::invalid_uid(format!(
            "hex UID must have an even number of digits: {token}"
        )));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| Error::invalid_uid(format!("invalid hex UID: {token}")))
        })
        .collect()
}

/// Registered badge: UID plus the name greeted on the display.
///
/// Built once at startup from configuration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeIdentity {
    uid: BadgeUid,
    display_name: String,
}

impl BadgeIdentity {
    /// Create a new identity.
    ///
    /// # Errors
    /// Returns `Error::Config` if the display name is blank.
    pub fn new(uid: BadgeUid, display_name: impl Into<String>) -> Result<Self> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(Error::config(format!(
                "badge {uid} has an empty display name"
            )));
        }
        Ok(Self { uid, display_name })
    }

    #[must_use]
    pub fn uid(&self) -> &BadgeUid {
        &self.uid
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Presence state of one registered badge.
///
/// `last_entry` is a monotonic timestamp (offset from controller start) and
/// is `None` whenever the badge is not present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeState {
    pub last_entry: Option<Duration>,
    pub is_present: bool,
}

impl BadgeState {
    /// Record an entry at `at`.
    pub fn enter(&mut self, at: Duration) {
        self.is_present = true;
        self.last_entry = Some(at);
    }

    /// Record an exit at `at` and return the time spent inside.
    ///
    /// A missing or later entry timestamp yields zero.
    pub fn exit(&mut self, at: Duration) -> ElapsedTime {
        let elapsed = self
            .last_entry
            .map(|entry| at.saturating_sub(entry))
            .unwrap_or_default();
        self.is_present = false;
        self.last_entry = None;
        ElapsedTime::from_duration(elapsed)
    }
}

/// One card read reported by the reader. Consumed immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub uid: BadgeUid,
    pub at: Duration,
}

impl ScanEvent {
    pub fn new(uid: BadgeUid, at: Duration) -> Self {
        Self { uid, at }
    }
}

/// Presence duration split into whole hours, minutes and seconds.
///
/// Decomposition truncates: sub-second remainders are dropped and nothing is
/// rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedTime {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl ElapsedTime {
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self {
            hours: ms / MS_PER_HOUR,
            minutes: (ms % MS_PER_HOUR) / MS_PER_MINUTE,
            seconds: (ms % MS_PER_MINUTE) / MS_PER_SECOND,
        }
    }

    #[must_use]
    pub fn from_duration(duration: Duration) -> Self {
        Self::from_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
    }
}

/// Strike output level.
///
/// Named after the physical strike: `Closed` energizes it and locks the
/// door, `Open` releases it. `Open` is the resting posture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    #[default]
    Open,
    Closed,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockState::Open => write!(f, "open"),
            LockState::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_uid_matches_exact_bytes() {
        let uid = BadgeUid::new(vec![10, 242, 99, 154]).unwrap();
        assert!(uid.matches(&[10, 242, 99, 154]));
        assert!(!uid.matches(&[10, 242, 99, 155]));
        assert!(!uid.matches(&[154, 99, 242, 10]));
    }

    #[test]
    fn test_uid_length_mismatch_is_no_match() {
        let uid = BadgeUid::new(vec![10, 242, 99, 154]).unwrap();
        assert!(!uid.matches(&[10, 242, 99]));
        assert!(!uid.matches(&[10, 242, 99, 154, 0, 0, 0]));
        assert!(!uid.matches(&[]));
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![0; 11])]
    fn test_uid_rejects_invalid_length(#[case] bytes: Vec<u8>) {
        assert!(matches!(BadgeUid::new(bytes), Err(Error::InvalidUid(_))));
    }

    #[test]
    fn test_uid_renderings() {
        let uid = BadgeUid::new(vec![10, 242, 99, 154]).unwrap();
        assert_eq!(uid.to_hex(), "0AF2639A");
        assert_eq!(uid.to_decimal(), "10 242 99 154");
        assert_eq!(uid.to_string(), "10 242 99 154");
    }

    #[rstest]
    #[case("10 242 99 154", vec![10, 242, 99, 154])]
    #[case("10, 242, 99, 154", vec![10, 242, 99, 154])]
    #[case("0AF2639A", vec![10, 242, 99, 154])]
    #[case("0x0af2639a", vec![10, 242, 99, 154])]
    #[case("  1 2 3 4  ", vec![1, 2, 3, 4])]
    fn test_uid_from_str(#[case] input: &str, #[case] expected: Vec<u8>) {
        let uid: BadgeUid = input.parse().unwrap();
        assert_eq!(uid.as_bytes(), expected.as_slice());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("0AF")]
    #[case("ZZZZ")]
    #[case("+A+B")]
    #[case("0x-A0B")]
    #[case("10 256 1")]
    #[case("1 2 3 4 5 6 7 8 9 10 11")]
    fn test_uid_from_str_rejects(#[case] input: &str) {
        assert!(input.parse::<BadgeUid>().is_err());
    }

    #[test]
    fn test_uid_serde_validates() {
        let uid: BadgeUid = serde_json::from_str("[26,162,156,154]").unwrap();
        assert_eq!(uid.as_bytes(), &[26, 162, 156, 154]);
        assert!(serde_json::from_str::<BadgeUid>("[]").is_err());
        assert_eq!(serde_json::to_string(&uid).unwrap(), "[26,162,156,154]");
    }

    #[test]
    fn test_identity_requires_name() {
        let uid = BadgeUid::new(vec![1, 2, 3, 4]).unwrap();
        assert!(BadgeIdentity::new(uid.clone(), "  ").is_err());
        let identity = BadgeIdentity::new(uid, "Mr Bur").unwrap();
        assert_eq!(identity.display_name(), "Mr Bur");
    }

    #[test]
    fn test_badge_state_enter_then_exit() {
        let mut state = BadgeState::default();
        assert!(!state.is_present);
        assert_eq!(state.last_entry, None);

        state.enter(Duration::from_millis(1_500));
        assert!(state.is_present);
        assert_eq!(state.last_entry, Some(Duration::from_millis(1_500)));

        let elapsed = state.exit(Duration::from_millis(11_500));
        assert_eq!(elapsed.to_string(), "0h 0m 10s");
        assert_eq!(state, BadgeState::default());
    }

    #[rstest]
    #[case(0, "0h 0m 0s")]
    #[case(999, "0h 0m 0s")]
    #[case(10_000, "0h 0m 10s")]
    #[case(59_999, "0h 0m 59s")]
    #[case(60_000, "0h 1m 0s")]
    #[case(3_599_999, "0h 59m 59s")]
    #[case(3_600_000, "1h 0m 0s")]
    #[case(90_061_000, "25h 1m 1s")]
    fn test_elapsed_time_display(#[case] ms: u64, #[case] expected: &str) {
        assert_eq!(ElapsedTime::from_millis(ms).to_string(), expected);
    }

    #[test]
    fn test_lock_state_defaults_open() {
        assert_eq!(LockState::default(), LockState::Open);
        assert_eq!(LockState::Closed.to_string(), "closed");
    }

    proptest! {
        #[test]
        fn prop_elapsed_time_recomposes(ms in 0u64..1_000_000_000_000) {
            let t = ElapsedTime::from_millis(ms);
            prop_assert!(t.minutes < 60);
            prop_assert!(t.seconds < 60);
            let whole = t.hours * MS_PER_HOUR + t.minutes * MS_PER_MINUTE + t.seconds * MS_PER_SECOND;
            prop_assert!(whole <= ms);
            prop_assert!(ms - whole < MS_PER_SECOND);
        }
    }
}
