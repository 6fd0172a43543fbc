//! Mock device implementations for testing and development.
//!
//! This module provides simulated peripherals that can be controlled and
//! inspected programmatically without requiring physical hardware.

pub mod display;
pub mod lock;
pub mod reader;

// Re-export commonly used types
pub use display::{MockDisplay, MockDisplayHandle};
pub use lock::{MockLock, MockLockHandle};
pub use reader::{MockReader, MockReaderHandle};
