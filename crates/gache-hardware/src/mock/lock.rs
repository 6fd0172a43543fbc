//! Mock door strike that records every output change.

use std::sync::{Arc, Mutex, PoisonError};

use gache_core::LockState;

use crate::{Result, traits::LockActuator};

#[derive(Debug, Default)]
struct LockRecord {
    state: LockState,
    history: Vec<LockState>,
}

/// Mock strike output.
///
/// Starts in the resting [`LockState::Open`] posture. Every `set_lock` call is
/// recorded, including repeated ones.
#[derive(Debug)]
pub struct MockLock {
    record: Arc<Mutex<LockRecord>>,
}

impl MockLock {
    /// Create a new mock strike and its inspection handle.
    pub fn new() -> (Self, MockLockHandle) {
        let record = Arc::new(Mutex::new(LockRecord::default()));
        (
            Self {
                record: Arc::clone(&record),
            },
            MockLockHandle { record },
        )
    }
}

impl LockActuator for MockLock {
    async fn set_lock(&mut self, state: LockState) -> Result<()> {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        record.state = state;
        record.history.push(state);
        Ok(())
    }
}

/// Read-only view of a [`MockLock`].
#[derive(Debug, Clone)]
pub struct MockLockHandle {
    record: Arc<Mutex<LockRecord>>,
}

impl MockLockHandle {
    /// Current strike output.
    pub fn state(&self) -> LockState {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    /// Every state driven so far, oldest first.
    pub fn history(&self) -> Vec<LockState> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .clone()
    }
}
