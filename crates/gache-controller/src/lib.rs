//! Badge presence and access control state machine.
//!
//! This crate contains the controller that turns card reads into entries and
//! exits, drives the door strike and keeps the display current, along with
//! the presence registry and state tracking it relies on.

pub mod controller;
pub mod message;
pub mod registry;
pub mod state_machine;

pub use controller::{AccessController, ScanOutcome, ScanReport, TickOutcome};
pub use registry::{PresenceChange, PresenceRegistry, Resolution, ScanRejection};
pub use state_machine::{ControllerState, StateMachine, StateTransition};
