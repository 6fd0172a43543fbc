//! Terminal-backed peripherals for running the endpoint without hardware.
//!
//! [`TerminalDisplay`] draws each message centered inside a framed box,
//! wrapping on word boundaries. [`LoggingLock`] reports strike changes
//! through `tracing`.
//!
//! # Examples
//!
//! ```
//! use gache_hardware::terminal::TerminalDisplay;
//! use gache_hardware::traits::DisplaySink;
//!
//! #[tokio::main]
//! async fn main() -> gache_hardware::Result<()> {
//!     let mut display = TerminalDisplay::with_writer(20, Vec::new());
//!     display.set_text("Badge inconnu !").await?;
//!
//!     let screen = String::from_utf8(display.into_writer()).unwrap();
//!     assert!(screen.contains("| Badge inconnu !  |"));
//!     Ok(())
//! }
//! ```

use std::io::{self, Stdout, Write};

use gache_core::LockState;
use tracing::{debug, info};

use crate::{
    Result,
    traits::{DisplaySink, LockActuator},
};

/// Smallest width that still leaves room for text inside the frame.
const MIN_WIDTH: usize = 8;

/// Display drawn on a terminal (or any writer).
#[derive(Debug)]
pub struct TerminalDisplay<W = Stdout> {
    width: usize,
    out: W,
}

impl TerminalDisplay<Stdout> {
    /// Display of `width` columns (frame included) on standard output.
    pub fn new(width: usize) -> Self {
        Self::with_writer(width, io::stdout())
    }
}

impl<W: Write> TerminalDisplay<W> {
    /// Display of `width` columns (frame included) on `out`.
    pub fn with_writer(width: usize, out: W) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
            out,
        }
    }

    /// Consume the display and return the underlying writer.
    pub fn into_writer(self) -> W {
        self.out
    }

    /// Lines of the framed box for `text`.
    pub fn render(&self, text: &str) -> Vec<String> {
        let inner = self.width - 4;
        let border = format!("+{}+", "-".repeat(self.width - 2));

        let mut lines = vec![border.clone()];
        lines.extend(
            wrap_words(&sanitize_text(text), inner)
                .iter()
                .map(|line| format!("| {} |", center_text(line, inner))),
        );
        lines.push(border);
        lines
    }
}

impl<W: Write + Send + Sync> DisplaySink for TerminalDisplay<W> {
    async fn set_text(&mut self, text: &str) -> Result<()> {
        for line in self.render(text) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Strike output that only logs its transitions.
#[derive(Debug, Default)]
pub struct LoggingLock {
    state: LockState,
}

impl LoggingLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LockState {
        self.state
    }
}

impl LockActuator for LoggingLock {
    async fn set_lock(&mut self, state: LockState) -> Result<()> {
        if self.state == state {
            debug!(%state, "Strike already in requested state");
        } else {
            info!(from = %self.state, to = %state, "Strike output changed");
            self.state = state;
        }
        Ok(())
    }
}

/// Center text within a fixed width, truncating when it does not fit.
///
/// Odd padding leaves the extra space on the right.
fn center_text(text: &str, width: usize) -> String {
    let char_count = text.chars().count();

    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;
    let left_pad = padding / 2;
    let right_pad = padding - left_pad;
    format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
}

/// Keep at most `max_len` characters.
fn truncate_text(text: &str, max_len: usize) -> String {
    text.chars().take(max_len).collect()
}

/// Greedy word wrap. Words longer than `width` are cut.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word = truncate_text(word, width);
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Remove control characters and surrounding whitespace.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AB", 6, "  AB  ")]
    #[case("ABC", 6, " ABC  ")]
    #[case("ABCDEF", 6, "ABCDEF")]
    #[case("ABCDEFGH", 6, "ABCDEF")]
    fn test_center_text(#[case] text: &str, #[case] width: usize, #[case] expected: &str) {
        assert_eq!(center_text(text, width), expected);
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(
            wrap_words("Au revoir Mr Nanette! Temps ecoule: 0h 0m 10s", 22),
            vec!["Au revoir Mr Nanette!", "Temps ecoule: 0h 0m", "10s"]
        );
        assert_eq!(wrap_words("", 10), vec![""]);
        assert_eq!(wrap_words("ABCDEFGHIJ", 4), vec!["ABCD"]);
    }

    #[test]
    fn test_render_frames_and_centers() {
        let display = TerminalDisplay::with_writer(12, Vec::new());
        assert_eq!(
            display.render("Hi there"),
            vec![
                "+----------+".to_string(),
                "| Hi there |".to_string(),
                "+----------+".to_string(),
            ]
        );
    }

    #[test]
    fn test_render_strips_control_characters() {
        let display = TerminalDisplay::with_writer(12, Vec::new());
        assert_eq!(display.render("\x07ok\n")[1], "|    ok    |");
    }

    #[test]
    fn test_minimum_width() {
        let display = TerminalDisplay::with_writer(0, Vec::new());
        assert_eq!(display.render("x")[0].len(), MIN_WIDTH);
    }

    #[tokio::test]
    async fn test_set_text_writes_box() {
        let mut display = TerminalDisplay::with_writer(30, Vec::new());
        display.set_text("Approchez un badge RFID").await.unwrap();

        let screen = String::from_utf8(display.into_writer()).unwrap();
        let lines: Vec<&str> = screen.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "|  Approchez un badge RFID   |");
    }

    #[tokio::test]
    async fn test_logging_lock_tracks_state() {
        let mut lock = LoggingLock::new();
        assert_eq!(lock.state(), LockState::Open);
        lock.set_lock(LockState::Closed).await.unwrap();
        lock.set_lock(LockState::Closed).await.unwrap();
        assert_eq!(lock.state(), LockState::Closed);
    }
}
