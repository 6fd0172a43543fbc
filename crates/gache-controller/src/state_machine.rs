//! Controller state tracking.
//!
//! The access controller moves through four states on every accepted scan.
//! This module validates those moves and keeps a bounded history of them for
//! diagnostics.
//!
//! # States
//!
//! - `Idle`: polling the reader
//! - `Cooling`: polling suspended until the anti-replay cooldown elapses
//! - `ScanAccepted`: a card was read and is being resolved
//! - `DisplayingResult`: the result message is shown for the dwell period
//!
//! # Valid Transitions
//!
//! - Idle ⇄ Cooling
//! - Idle → ScanAccepted → DisplayingResult → Idle
//!
//! Timestamps are monotonic offsets from controller start, supplied by the
//! caller, so the machine never reads a clock itself.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use gache_controller::{ControllerState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! machine.transition_to(ControllerState::ScanAccepted, Duration::ZERO).unwrap();
//! machine.transition_to(ControllerState::DisplayingResult, Duration::ZERO).unwrap();
//!
//! assert!(machine.transition_to(ControllerState::Cooling, Duration::ZERO).is_err());
//! assert_eq!(machine.history().len(), 2);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use gache_core::{Error, Result};

/// Maximum number of state transitions to keep in history.
///
/// A full scan cycle is three transitions plus up to two for the cooldown,
/// so this covers roughly the last twenty scans.
const MAX_HISTORY_SIZE: usize = 100;

/// States of the access controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// Polling the reader for a new card.
    #[default]
    Idle,

    /// Cooldown since the last accepted scan has not elapsed yet.
    Cooling,

    /// A card serial was read and is being resolved.
    ScanAccepted,

    /// Result message on display, strike held for the dwell.
    DisplayingResult,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            ControllerState::Idle => "Idle",
            ControllerState::Cooling => "Cooling",
            ControllerState::ScanAccepted => "ScanAccepted",
            ControllerState::DisplayingResult => "DisplayingResult",
        };
        write!(f, "{}", state_str)
    }
}

impl ControllerState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use gache_controller::ControllerState;
    ///
    /// assert!(ControllerState::Idle.can_transition_to(&ControllerState::ScanAccepted));
    /// assert!(!ControllerState::Cooling.can_transition_to(&ControllerState::ScanAccepted));
    /// ```
    pub fn can_transition_to(&self, target: &ControllerState) -> bool {
        matches!(
            (self, target),
            // From Idle
            (ControllerState::Idle, ControllerState::Cooling | ControllerState::ScanAccepted)
            // From Cooling
            | (ControllerState::Cooling, ControllerState::Idle)
            // From ScanAccepted
            | (ControllerState::ScanAccepted, ControllerState::DisplayingResult)
            // From DisplayingResult
            | (ControllerState::DisplayingResult, ControllerState::Idle)
        )
    }

    /// Whether the reader is polled in this state.
    pub fn polls_reader(&self) -> bool {
        matches!(self, ControllerState::Idle)
    }
}

/// A single state transition with its monotonic timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: ControllerState,

    /// The state transitioned to.
    pub to: ControllerState,

    /// Offset from controller start at which the transition happened.
    pub at: Duration,
}

impl StateTransition {
    pub fn new(from: ControllerState, to: ControllerState, at: Duration) -> Self {
        Self { from, to, at }
    }
}

/// Validated controller state with bounded transition history.
#[derive(Debug, Default)]
pub struct StateMachine {
    /// Current controller state.
    current_state: ControllerState,

    /// History of state transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self {
            current_state: ControllerState::Idle,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> &ControllerState {
        &self.current_state
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the move is not allowed
    /// from the current state. The machine is left unchanged in that case.
    pub fn transition_to(
        &mut self,
        new_state: ControllerState,
        at: Duration,
    ) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state, at);
        self.current_state = new_state;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_new_machine_is_idle() {
        let machine = StateMachine::new();
        assert_eq!(machine.current_state(), &ControllerState::Idle);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_complete_scan_cycle() {
        let mut machine = StateMachine::new();
        machine
            .transition_to(ControllerState::ScanAccepted, ms(0))
            .unwrap();
        machine
            .transition_to(ControllerState::DisplayingResult, ms(0))
            .unwrap();
        machine.transition_to(ControllerState::Idle, ms(3000)).unwrap();
        machine
            .transition_to(ControllerState::Cooling, ms(3200))
            .unwrap();
        machine.transition_to(ControllerState::Idle, ms(5000)).unwrap();

        assert_eq!(machine.current_state(), &ControllerState::Idle);
        assert_eq!(machine.history().len(), 5);
        assert_eq!(machine.history().back().unwrap().at, ms(5000));
    }

    #[rstest]
    #[case(ControllerState::Idle, ControllerState::DisplayingResult)]
    #[case(ControllerState::Idle, ControllerState::Idle)]
    #[case(ControllerState::Cooling, ControllerState::ScanAccepted)]
    #[case(ControllerState::ScanAccepted, ControllerState::Idle)]
    #[case(ControllerState::DisplayingResult, ControllerState::Cooling)]
    #[case(ControllerState::DisplayingResult, ControllerState::ScanAccepted)]
    fn test_invalid_transitions(#[case] from: ControllerState, #[case] to: ControllerState) {
        assert!(!from.can_transition_to(&to));
    }

    #[test]
    fn test_invalid_transition_leaves_state_unchanged() {
        let mut machine = StateMachine::new();
        let result = machine.transition_to(ControllerState::DisplayingResult, ms(10));

        assert!(matches!(
            result,
            Err(Error::InvalidStateTransition { ref from, ref to })
                if from == "Idle" && to == "DisplayingResult"
        ));
        assert_eq!(machine.current_state(), &ControllerState::Idle);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_history_size_limit() {
        let mut machine = StateMachine::new();
        for i in 0..150 {
            machine
                .transition_to(ControllerState::Cooling, ms(i * 2))
                .unwrap();
            machine
                .transition_to(ControllerState::Idle, ms(i * 2 + 1))
                .unwrap();
        }
        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
        assert_eq!(machine.history().back().unwrap().at, ms(299));
    }

    #[test]
    fn test_only_idle_polls_reader() {
        assert!(ControllerState::Idle.polls_reader());
        assert!(!ControllerState::Cooling.polls_reader());
        assert!(!ControllerState::ScanAccepted.polls_reader());
        assert!(!ControllerState::DisplayingResult.polls_reader());
    }

    #[test]
    fn test_state_display_and_serialization() {
        assert_eq!(ControllerState::DisplayingResult.to_string(), "DisplayingResult");
        let json = serde_json::to_string(&ControllerState::ScanAccepted).unwrap();
        assert_eq!(json, "\"scan_accepted\"");
    }
}
