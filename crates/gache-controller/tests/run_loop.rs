//! Tests of the Tokio polling loop on a paused clock.
//!
//! Run with: cargo test --package gache-controller --test run_loop

use std::time::Duration;

use gache_controller::{AccessController, ControllerState, PresenceChange, ScanOutcome};
use gache_core::{BadgeUid, ControllerConfig, ElapsedTime, LockState};
use gache_hardware::mock::{MockDisplay, MockLock, MockReader};
use tokio::sync::watch;
use tokio::time::{Instant, sleep};

const IDLE: &str = "Approchez un badge RFID";

fn nanette() -> BadgeUid {
    BadgeUid::new(vec![10, 242, 99, 154]).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_loop_runs_entry_and_exit() {
    let (reader, card) = MockReader::new();
    let (lock, strike) = MockLock::new();
    let (display, screen) = MockDisplay::new();
    let mut controller =
        AccessController::new(ControllerConfig::full(), reader, lock, display).unwrap();
    let (stop, shutdown) = watch::channel(false);

    let driver = async {
        card.tap(nanette()).await.unwrap();
        sleep(Duration::from_millis(10_100)).await;
        card.tap(nanette()).await.unwrap();
        sleep(Duration::from_secs(5)).await;
        stop.send(true).unwrap();
    };

    let (result, ()) = tokio::join!(controller.run_until(shutdown), driver);
    result.unwrap();

    let history = screen.history();
    assert_eq!(history.len(), 5, "unexpected display history: {history:?}");
    assert_eq!(history[0], IDLE);
    assert_eq!(history[1], "Bonjour Mr Nanette! decompte du temps d'entrer");
    assert_eq!(history[2], IDLE);
    assert!(
        history[3].starts_with("Au revoir Mr Nanette! Temps ecoule: 0h 0m "),
        "unexpected exit message: {}",
        history[3]
    );
    assert_eq!(history[4], IDLE);

    assert_eq!(
        strike.history(),
        vec![
            LockState::Open,
            LockState::Closed,
            LockState::Open,
            LockState::Closed,
            LockState::Open,
        ]
    );
    assert_eq!(card.halt_count(), 2);
    assert!(!controller.badge_state(0).unwrap().is_present);
    // Stopped at about 15.1 s, inside the cooldown of the exit at 10.2 s.
    assert_eq!(controller.state(), ControllerState::Cooling);
}

#[tokio::test(start_paused = true)]
async fn test_loop_keeps_result_on_screen_for_the_dwell() {
    let (reader, card) = MockReader::new();
    let (lock, _strike) = MockLock::new();
    let (display, screen) = MockDisplay::new();
    let mut controller =
        AccessController::new(ControllerConfig::full(), reader, lock, display).unwrap();
    let (stop, shutdown) = watch::channel(false);

    let driver = async {
        card.tap(nanette()).await.unwrap();
        sleep(Duration::from_millis(2_500)).await;
        let during_dwell = screen.text();
        sleep(Duration::from_millis(1_000)).await;
        let after_dwell = screen.text();
        stop.send(true).unwrap();
        (during_dwell, after_dwell)
    };

    let (result, (during_dwell, after_dwell)) =
        tokio::join!(controller.run_until(shutdown), driver);
    result.unwrap();

    assert_eq!(
        during_dwell.as_deref(),
        Some("Bonjour Mr Nanette! decompte du temps d'entrer")
    );
    assert_eq!(after_dwell.as_deref(), Some(IDLE));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_the_dwell() {
    let (reader, card) = MockReader::new();
    let (lock, strike) = MockLock::new();
    let (display, screen) = MockDisplay::new();
    let mut controller =
        AccessController::new(ControllerConfig::full(), reader, lock, display).unwrap();
    let (stop, shutdown) = watch::channel(false);

    let started = Instant::now();
    let driver = async {
        card.tap(nanette()).await.unwrap();
        sleep(Duration::from_secs(1)).await;
        stop.send(true).unwrap();
    };

    let (result, ()) = tokio::join!(controller.run_until(shutdown), driver);
    result.unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));

    // The dwell is cut short but the resting posture is restored.
    assert_eq!(controller.state(), ControllerState::Idle);
    assert_eq!(controller.dwell_deadline(), None);
    assert_eq!(strike.state(), LockState::Open);
    assert_eq!(
        strike.history(),
        vec![LockState::Open, LockState::Closed, LockState::Open]
    );
    assert_eq!(screen.text().as_deref(), Some(IDLE));
    assert_eq!(card.halt_count(), 1);
    assert!(controller.badge_state(0).unwrap().is_present);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_sender_stops_the_loop() {
    let (reader, _card) = MockReader::new();
    let (lock, _strike) = MockLock::new();
    let (display, screen) = MockDisplay::new();
    let mut controller =
        AccessController::new(ControllerConfig::reduced(), reader, lock, display).unwrap();
    let (stop, shutdown) = watch::channel(false);

    let driver = async {
        sleep(Duration::from_secs(1)).await;
        drop(stop);
    };

    let (result, ()) = tokio::join!(controller.run_until(shutdown), driver);
    result.unwrap();

    assert_eq!(screen.history(), vec![IDLE.to_string()]);
    assert!(controller.machine().history().is_empty());
}

#[test]
fn test_outcome_serialization() {
    let outcome = ScanOutcome::Authorized {
        index: 1,
        display_name: "Mr Mevel".to_string(),
        change: PresenceChange::Exited {
            elapsed: ElapsedTime::from_millis(10_000),
        },
    };

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["result"], "authorized");
    assert_eq!(json["display_name"], "Mr Mevel");
    assert_eq!(json["change"]["kind"], "exited");
    assert_eq!(json["change"]["elapsed"]["seconds"], 10);
}
