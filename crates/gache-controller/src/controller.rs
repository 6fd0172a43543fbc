//! Badge access controller.
//!
//! [`AccessController`] polls a card reader, toggles the presence of
//! registered badges, drives the door strike and keeps the display up to
//! date. It can be driven two ways:
//!
//! - [`tick`](AccessController::tick): a non-blocking step taking the current
//!   monotonic time, for callers that own their own timer;
//! - [`run_until`](AccessController::run_until): a Tokio loop that polls at
//!   the configured interval and sleeps through the result dwell.
//!
//! # Tick sequence
//!
//! ```text
//! DisplayingResult ──dwell not over──► Dwelling
//!        │ dwell over: strike open, idle prompt, reader halt
//!        ▼
//!      Idle ──cooldown running──► Cooling
//!        │ card present + serial read
//!        ▼
//!  ScanAccepted ── resolve, toggle presence, strike, message ──► DisplayingResult
//! ```
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use gache_core::{BadgeUid, ControllerConfig};
//! use gache_hardware::mock::{MockDisplay, MockLock, MockReader};
//! use gache_controller::{AccessController, TickOutcome};
//!
//! #[tokio::main]
//! async fn main() -> gache_core::Result<()> {
//!     let (reader, card) = MockReader::new();
//!     let (lock, _strike) = MockLock::new();
//!     let (display, screen) = MockDisplay::new();
//!
//!     let mut controller =
//!         AccessController::new(ControllerConfig::full(), reader, lock, display)?;
//!     controller.start().await;
//!
//!     card.tap(BadgeUid::new(vec![10, 242, 99, 154])?).await?;
//!     let outcome = controller.tick(Duration::ZERO).await?;
//!
//!     assert!(matches!(outcome, TickOutcome::Accepted(_)));
//!     assert_eq!(
//!         screen.text().as_deref(),
//!         Some("Bonjour Mr Nanette! decompte du temps d'entrer")
//!     );
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tracing::{debug, info, warn};

use gache_core::{
    BadgeState, BadgeUid, ControllerConfig, DisplayMessages, LockPolicy, LockState, Result,
    ScanEvent,
};
use gache_hardware::traits::{CardReader, DisplaySink, LockActuator};

use crate::message::presence_message;
use crate::registry::{PresenceChange, PresenceRegistry, Resolution, ScanRejection};
use crate::state_machine::{ControllerState, StateMachine};

/// What an accepted scan did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// A registered badge toggled its presence.
    Authorized {
        index: usize,
        display_name: String,
        change: PresenceChange,
    },

    /// The UID did not resolve to a registered badge.
    Rejected { reason: ScanRejection },
}

/// Full record of one accepted scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub event: ScanEvent,
    pub outcome: ScanOutcome,

    /// Text pushed to the display.
    pub message: String,

    /// Strike state held for the dwell.
    pub lock: LockState,
}

/// Result of one controller step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A result is on display and its dwell has not elapsed.
    Dwelling,

    /// The dwell elapsed: strike released, idle prompt back, reader halted.
    Restored,

    /// The cooldown since the last accepted scan is still running.
    Cooling,

    /// The reader reported no card.
    NoCard,

    /// A card was detected but its serial could not be read.
    Unreadable,

    /// A scan was accepted and processed.
    Accepted(ScanReport),
}

/// Polling badge access state machine.
///
/// Owns the presence registry and the cooldown timestamp. Timestamps passed
/// to [`tick`](Self::tick) must be monotonic offsets from a fixed origin.
#[derive(Debug)]
pub struct AccessController<R, L, D> {
    reader: R,
    lock: L,
    display: D,

    registry: PresenceRegistry,
    machine: StateMachine,

    cooldown: Option<Duration>,
    poll_interval: Duration,
    dwell: Duration,
    lock_policy: LockPolicy,
    messages: DisplayMessages,

    /// Time of the last accepted scan.
    last_accepted: Option<Duration>,

    /// End of the current result dwell.
    dwell_deadline: Option<Duration>,
}

impl<R, L, D> AccessController<R, L, D>
where
    R: CardReader,
    L: LockActuator,
    D: DisplaySink,
{
    /// Build a controller from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration fails validation.
    pub fn new(config: ControllerConfig, reader: R, lock: L, display: D) -> Result<Self> {
        config.validate()?;

        for uid in config.duplicate_uids() {
            warn!(uid = %uid, "Badge registered more than once, only the first entry is used");
        }

        let registry = PresenceRegistry::new(config.identities()?);
        info!(
            badges = registry.len(),
            cooldown_ms = config.cooldown_ms,
            dwell_ms = config.dwell_ms,
            poll_interval_ms = config.poll_interval_ms,
            "Access controller configured"
        );

        Ok(Self {
            reader,
            lock,
            display,
            registry,
            machine: StateMachine::new(),
            cooldown: config.cooldown(),
            poll_interval: config.poll_interval(),
            dwell: config.dwell(),
            lock_policy: config.lock_policy,
            messages: config.messages,
            last_accepted: None,
            dwell_deadline: None,
        })
    }

    /// Put the peripherals in their resting posture: strike open, idle prompt.
    pub async fn start(&mut self) {
        self.drive_lock(LockState::Open).await;
        let prompt = self.messages.idle_prompt.clone();
        self.show(&prompt).await;
        info!("System ready, waiting for a badge");
    }

    /// Advance the controller to time `now`.
    ///
    /// Never blocks beyond the peripheral calls themselves. Strike and display
    /// failures are logged and do not abort the step.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader cannot be polled.
    pub async fn tick(&mut self, now: Duration) -> Result<TickOutcome> {
        if let Some(deadline) = self.dwell_deadline {
            if now < deadline {
                return Ok(TickOutcome::Dwelling);
            }
            self.restore_idle(now).await?;
            return Ok(TickOutcome::Restored);
        }

        if self.cooling_down(now) {
            if self.machine.current_state().polls_reader() {
                self.machine.transition_to(ControllerState::Cooling, now)?;
            }
            return Ok(TickOutcome::Cooling);
        }

        if *self.machine.current_state() == ControllerState::Cooling {
            debug!("Cooldown elapsed, polling resumed");
            self.machine.transition_to(ControllerState::Idle, now)?;
        }

        if !self.reader.card_present().await? {
            return Ok(TickOutcome::NoCard);
        }

        let Some(uid) = self.reader.read_serial().await? else {
            debug!("Card detected but serial could not be read");
            return Ok(TickOutcome::Unreadable);
        };

        let report = self.accept(ScanEvent::new(uid, now)).await?;
        Ok(TickOutcome::Accepted(report))
    }

    /// Run the polling loop until `shutdown` turns `true` or its sender is
    /// dropped.
    ///
    /// Wakes at a fixed rate of one poll interval. After an accepted scan the
    /// loop sleeps until the dwell deadline, restores the idle display and
    /// resumes polling one interval later. Stopping during a dwell ends it
    /// early: the strike is released, the idle prompt shown and the reader
    /// halted before returning.
    ///
    /// # Errors
    ///
    /// Returns an error only if the controller reaches an inconsistent state.
    /// Peripheral failures are logged and polling continues.
    pub async fn run_until(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let epoch = Instant::now();
        self.start().await;

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            match self.tick(epoch.elapsed()).await {
                Ok(TickOutcome::Accepted(_)) => {
                    let Some(deadline) = self.dwell_deadline else {
                        continue;
                    };
                    tokio::select! {
                        _ = sleep_until(epoch + deadline) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                    if let Err(error) = self.tick(epoch.elapsed()).await {
                        warn!(%error, "Failed to restore idle display");
                    }
                    ticker.reset();
                }
                Ok(_) => {}
                Err(error) => warn!(%error, "Reader poll failed"),
            }
        }

        if self.dwell_deadline.is_some() {
            self.restore_idle(epoch.elapsed()).await?;
        }

        info!("Access controller stopped");
        Ok(())
    }

    /// Run the polling loop for the lifetime of the process.
    ///
    /// # Errors
    ///
    /// See [`run_until`](Self::run_until).
    pub async fn run(&mut self) -> Result<()> {
        let (_keep_alive, shutdown) = watch::channel(false);
        self.run_until(shutdown).await
    }

    pub fn state(&self) -> ControllerState {
        *self.machine.current_state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn registry(&self) -> &PresenceRegistry {
        &self.registry
    }

    /// Presence state of registered badge `index`.
    pub fn badge_state(&self, index: usize) -> Option<&BadgeState> {
        self.registry.state(index)
    }

    /// Time of the last accepted scan, `None` before the first one.
    pub fn last_accepted(&self) -> Option<Duration> {
        self.last_accepted
    }

    /// End of the current dwell, `None` when no result is on display.
    pub fn dwell_deadline(&self) -> Option<Duration> {
        self.dwell_deadline
    }

    fn cooling_down(&self, now: Duration) -> bool {
        match (self.cooldown, self.last_accepted) {
            (Some(cooldown), Some(last)) => now.saturating_sub(last) < cooldown,
            _ => false,
        }
    }

    async fn accept(&mut self, event: ScanEvent) -> Result<ScanReport> {
        let now = event.at;
        self.machine
            .transition_to(ControllerState::ScanAccepted, now)?;
        self.last_accepted = Some(now);
        info!(uid = %event.uid, hex = %event.uid.to_hex(), "Badge read");

        let (outcome, lock) = match self.registry.resolve(&event.uid) {
            Resolution::Known(index) => self.authorize(index, &event.uid, now).await?,
            Resolution::Rejected(reason) => {
                warn!(uid = %event.uid, ?reason, "Badge rejected");
                self.drive_lock(LockState::Open).await;
                (ScanOutcome::Rejected { reason }, LockState::Open)
            }
        };

        let message = match &outcome {
            ScanOutcome::Authorized {
                display_name,
                change,
                ..
            } => presence_message(&self.messages, display_name, *change),
            ScanOutcome::Rejected { .. } => self.messages.unknown_badge.clone(),
        };
        self.show(&message).await;

        self.dwell_deadline = Some(now + self.dwell);
        self.machine
            .transition_to(ControllerState::DisplayingResult, now)?;

        Ok(ScanReport {
            event,
            outcome,
            message,
            lock,
        })
    }

    async fn authorize(
        &mut self,
        index: usize,
        uid: &BadgeUid,
        now: Duration,
    ) -> Result<(ScanOutcome, LockState)> {
        let lock = if self.lock_policy.closes_for(uid) {
            LockState::Closed
        } else {
            LockState::Open
        };
        self.drive_lock(lock).await;

        let change = self.registry.toggle(index, now)?;
        let display_name = self
            .registry
            .identity(index)
            .map(|identity| identity.display_name().to_string())
            .unwrap_or_default();

        match change {
            PresenceChange::Entered => info!(badge = %display_name, "Badge entered"),
            PresenceChange::Exited { elapsed } => {
                info!(badge = %display_name, %elapsed, "Badge exited")
            }
        }

        Ok((
            ScanOutcome::Authorized {
                index,
                display_name,
                change,
            },
            lock,
        ))
    }

    async fn restore_idle(&mut self, now: Duration) -> Result<()> {
        self.drive_lock(LockState::Open).await;
        let prompt = self.messages.idle_prompt.clone();
        self.show(&prompt).await;
        if let Err(error) = self.reader.halt().await {
            warn!(%error, "Failed to halt card session");
        }

        self.dwell_deadline = None;
        self.machine.transition_to(ControllerState::Idle, now)?;
        debug!("Result dwell elapsed, idle prompt restored");
        Ok(())
    }

    async fn drive_lock(&mut self, state: LockState) {
        if let Err(error) = self.lock.set_lock(state).await {
            warn!(%error, %state, "Failed to drive strike");
        }
    }

    async fn show(&mut self, text: &str) {
        if let Err(error) = self.display.set_text(text).await {
            warn!(%error, "Failed to update display");
        }
    }
}
