//! Mock card reader for testing and development.
//!
//! Cards are put in the field through a [`MockReaderHandle`] and picked up by
//! the reader on a later poll, one card per poll. A tapped card only stays in
//! the field for the tap window: if no poll sees it in time it is gone, just
//! like a badge swiped past a reader that was busy. A held card stays until
//! it has been read or withdrawn.
//!
//! Tap expiry follows the Tokio clock, so paused-time tests control it with
//! `tokio::time::advance`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use gache_core::BadgeUid;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::Instant;

use crate::{HardwareError, Result, traits::CardReader};

/// How long a tapped card stays readable.
pub const DEFAULT_TAP_WINDOW: Duration = Duration::from_millis(500);

/// Mock contactless reader.
///
/// # Examples
///
/// ```
/// use gache_core::BadgeUid;
/// use gache_hardware::mock::MockReader;
/// use gache_hardware::traits::CardReader;
///
/// #[tokio::main]
/// async fn main() -> gache_hardware::Result<()> {
///     let (mut reader, handle) = MockReader::new();
///     assert!(!reader.card_present().await?);
///
///     handle.tap(BadgeUid::new(vec![10, 242, 99, 154]).unwrap()).await?;
///
///     assert!(reader.card_present().await?);
///     let uid = reader.read_serial().await?.unwrap();
///     assert_eq!(uid.to_hex(), "0AF2639A");
///     reader.halt().await?;
///     assert_eq!(handle.halt_count(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    /// Channel receiver for cards entering or leaving the field
    event_rx: mpsc::Receiver<CardEvent>,

    /// Cards in the field, oldest first
    field: VecDeque<Presentation>,

    /// Cards sent by the handle and not yet read, expired or withdrawn
    waiting: Arc<AtomicUsize>,

    halts: Arc<AtomicUsize>,
}

impl MockReader {
    /// Create a new mock reader with the default tap window.
    pub fn new() -> (Self, MockReaderHandle) {
        Self::with_tap_window(DEFAULT_TAP_WINDOW)
    }

    /// Create a new mock reader whose taps stay readable for `tap_window`.
    pub fn with_tap_window(tap_window: Duration) -> (Self, MockReaderHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let waiting = Arc::new(AtomicUsize::new(0));
        let halts = Arc::new(AtomicUsize::new(0));

        let reader = Self {
            event_rx,
            field: VecDeque::new(),
            waiting: Arc::clone(&waiting),
            halts: Arc::clone(&halts),
        };
        let handle = MockReaderHandle {
            event_tx,
            tap_window,
            waiting,
            halts,
        };

        (reader, handle)
    }

    fn forget(&self, count: usize) {
        if count > 0 {
            self.waiting.fetch_sub(count, Ordering::SeqCst);
        }
    }
}

impl CardReader for MockReader {
    async fn card_present(&mut self) -> Result<bool> {
        loop {
            match self.event_rx.try_recv() {
                Ok(CardEvent::Enter(card)) => self.field.push_back(card),
                Ok(CardEvent::Withdrawn) => {
                    let removed = self.field.len();
                    self.field.clear();
                    self.forget(removed);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) if self.field.is_empty() => {
                    return Err(HardwareError::disconnected("mock reader handle dropped"));
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }

        let now = Instant::now();
        let before = self.field.len();
        self.field
            .retain(|card| card.leaves_at.is_none_or(|leaves_at| now < leaves_at));
        self.forget(before - self.field.len());

        Ok(!self.field.is_empty())
    }

    async fn read_serial(&mut self) -> Result<Option<BadgeUid>> {
        let Some(card) = self.field.pop_front() else {
            return Ok(None);
        };
        self.forget(1);
        Ok(card.uid)
    }

    async fn halt(&mut self) -> Result<()> {
        self.halts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum CardEvent {
    Enter(Presentation),
    Withdrawn,
}

/// A card in the reader field.
#[derive(Debug, Clone)]
struct Presentation {
    /// `None` when the serial cannot be read.
    uid: Option<BadgeUid>,

    /// `None` for a card held until read.
    leaves_at: Option<Instant>,
}

/// Handle for putting cards on a [`MockReader`].
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    event_tx: mpsc::Sender<CardEvent>,
    tap_window: Duration,
    waiting: Arc<AtomicUsize>,
    halts: Arc<AtomicUsize>,
}

impl MockReaderHandle {
    /// Swipe a card carrying `uid` past the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn tap(&self, uid: BadgeUid) -> Result<()> {
        self.enter(Some(uid), Some(Instant::now() + self.tap_window))
            .await
    }

    /// Swipe a card whose serial cannot be read.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn tap_unreadable(&self) -> Result<()> {
        self.enter(None, Some(Instant::now() + self.tap_window))
            .await
    }

    /// Leave a card carrying `uid` on the reader until it has been read.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn hold(&self, uid: BadgeUid) -> Result<()> {
        self.enter(Some(uid), None).await
    }

    /// Take every card not read yet out of the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn withdraw(&self) -> Result<()> {
        self.send(CardEvent::Withdrawn).await
    }

    /// Cards handed to the reader that it has not read, expired or
    /// withdrawn yet.
    pub fn cards_waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Number of times the reader ended a card session.
    pub fn halt_count(&self) -> usize {
        self.halts.load(Ordering::SeqCst)
    }

    async fn enter(&self, uid: Option<BadgeUid>, leaves_at: Option<Instant>) -> Result<()> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let sent = self
            .send(CardEvent::Enter(Presentation { uid, leaves_at }))
            .await;
        if sent.is_err() {
            self.waiting.fetch_sub(1, Ordering::SeqCst);
        }
        sent
    }

    async fn send(&self, event: CardEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected("mock reader dropped"))
    }
}
