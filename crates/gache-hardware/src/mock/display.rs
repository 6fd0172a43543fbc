//! Mock display that keeps every text it was asked to show.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{Result, traits::DisplaySink};

/// Mock display sink.
#[derive(Debug)]
pub struct MockDisplay {
    texts: Arc<Mutex<Vec<String>>>,
}

impl MockDisplay {
    /// Create a new blank mock display and its inspection handle.
    pub fn new() -> (Self, MockDisplayHandle) {
        let texts = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                texts: Arc::clone(&texts),
            },
            MockDisplayHandle { texts },
        )
    }
}

impl DisplaySink for MockDisplay {
    async fn set_text(&mut self, text: &str) -> Result<()> {
        self.texts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
        Ok(())
    }
}

/// Read-only view of a [`MockDisplay`].
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    texts: Arc<Mutex<Vec<String>>>,
}

impl MockDisplayHandle {
    /// Text currently shown, `None` while nothing was ever displayed.
    pub fn text(&self) -> Option<String> {
        self.texts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Every text shown so far, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.texts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of display updates.
    pub fn update_count(&self) -> usize {
        self.texts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tracks_latest_text() {
        let (mut display, handle) = MockDisplay::new();
        assert_eq!(handle.text(), None);

        display.set_text("Approchez un badge RFID").await.unwrap();
        display.set_text("Badge inconnu !").await.unwrap();

        assert_eq!(handle.text().as_deref(), Some("Badge inconnu !"));
        assert_eq!(handle.update_count(), 2);
        assert_eq!(handle.history()[0], "Approchez un badge RFID");
    }
}
