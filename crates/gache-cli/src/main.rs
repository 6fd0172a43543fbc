//! `gache` entry point.
//!
//! Runs the access controller against a terminal display and a logging
//! strike. Badges are read from stdin, one UID per line, either as decimal
//! bytes (`10 242 99 154`) or as hex (`0AF2639A`).
//!
//! A line typed at a terminal is a swipe: it is lost if the controller is
//! cooling down or showing a result. Piped lines are scripted badges, each
//! left on the reader until it has been read, so every line gets its turn.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use gache_controller::AccessController;
use gache_core::{BadgeUid, ControllerConfig, DisplayMessages};
use gache_hardware::mock::{MockReader, MockReaderHandle};
use gache_hardware::terminal::{LoggingLock, TerminalDisplay};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

/// Badge presence tracker for a single RFID door
#[derive(Parser, Debug)]
#[command(name = "gache", version)]
#[command(about = "Badge presence tracker driven from the terminal")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Timing preset; replaces the file's timings when both are given
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// Display width in columns, frame included
    #[arg(short, long, default_value_t = 48)]
    width: usize,

    /// Use English display texts
    #[arg(long)]
    english: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    /// 5 s cooldown, 3 s result dwell
    Full,
    /// No cooldown, 1 s result dwell
    Reduced,
}

impl Variant {
    fn preset(self) -> ControllerConfig {
        match self {
            Variant::Full => ControllerConfig::full(),
            Variant::Reduced => ControllerConfig::reduced(),
        }
    }
}

impl Args {
    fn controller_config(&self) -> anyhow::Result<ControllerConfig> {
        let mut config = match (&self.config, self.variant) {
            (Some(path), variant) => {
                let mut config = ControllerConfig::load(path)
                    .with_context(|| format!("loading {}", path.display()))?;
                if let Some(variant) = variant {
                    let preset = variant.preset();
                    config.cooldown_ms = preset.cooldown_ms;
                    config.dwell_ms = preset.dwell_ms;
                    config.poll_interval_ms = preset.poll_interval_ms;
                }
                config
            }
            (None, variant) => variant.unwrap_or(Variant::Full).preset(),
        };

        if self.english {
            config.messages = DisplayMessages::english();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = args.controller_config()?;
    let (poll, dwell) = (config.poll_interval(), config.dwell());
    let presentation = if std::io::stdin().is_terminal() {
        Presentation::Swipe
    } else {
        Presentation::Scripted
    };

    let (reader, card) = MockReader::new();
    let mut controller = AccessController::new(
        config,
        reader,
        LoggingLock::new(),
        TerminalDisplay::new(args.width),
    )?;

    let (stop, shutdown) = watch::channel(false);

    let control = async {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(error) = result {
                    warn!(%error, "Failed to listen for Ctrl-C");
                }
                info!("Interrupted, shutting down");
            }
            result = feed_scans(BufReader::new(tokio::io::stdin()), &card, presentation) => {
                match result {
                    Ok(()) => {
                        info!(waiting = card.cards_waiting(), "End of input, finishing pending scans");
                        finish_pending(&card, poll, dwell).await;
                    }
                    Err(error) => warn!(%error, "Stopped reading scans"),
                }
            }
        }
        // The receiver is gone only if the loop already stopped.
        let _ = stop.send(true);
    };

    let (result, ()) = tokio::join!(controller.run_until(shutdown), control);
    result.context("access controller failed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// How a line of input reaches the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presentation {
    /// Swiped past the reader, lost unless polled within the tap window.
    Swipe,
    /// Left on the reader until read.
    Scripted,
}

/// Hand every UID read from `input` to the reader until end of input.
async fn feed_scans<I>(
    input: I,
    card: &MockReaderHandle,
    presentation: Presentation,
) -> anyhow::Result<()>
where
    I: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let Some(uid) = parse_scan(&line) else {
            continue;
        };
        match (uid, presentation) {
            (Ok(uid), Presentation::Swipe) => card.tap(uid).await?,
            (Ok(uid), Presentation::Scripted) => card.hold(uid).await?,
            (Err(error), _) => warn!(input = line.trim(), %error, "Ignoring scan"),
        }
    }

    Ok(())
}

/// Wait until the reader has no card left and the last result dwell is over.
async fn finish_pending(card: &MockReaderHandle, poll: Duration, dwell: Duration) {
    while card.cards_waiting() > 0 {
        sleep(poll).await;
    }
    sleep(dwell + poll).await;
}

/// Parse one stdin line; blank lines and `#` comments yield `None`.
fn parse_scan(line: &str) -> Option<gache_core::Result<BadgeUid>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(line.parse())
}
