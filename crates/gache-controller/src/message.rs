//! Display texts for scan results.

use gache_core::{DisplayMessages, ElapsedTime};

use crate::registry::PresenceChange;

/// Greeting shown when `name` enters.
pub fn entry_message(messages: &DisplayMessages, name: &str) -> String {
    format!("{} {}! {}", messages.greeting, name, messages.entry_notice)
}

/// Farewell shown when `name` leaves after `elapsed`.
pub fn exit_message(messages: &DisplayMessages, name: &str, elapsed: ElapsedTime) -> String {
    format!(
        "{} {}! {}: {}",
        messages.farewell, name, messages.elapsed_label, elapsed
    )
}

/// Text for a presence change of badge `name`.
pub fn presence_message(messages: &DisplayMessages, name: &str, change: PresenceChange) -> String {
    match change {
        PresenceChange::Entered => entry_message(messages, name),
        PresenceChange::Exited { elapsed } => exit_message(messages, name, elapsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_message() {
        assert_eq!(
            entry_message(&DisplayMessages::default(), "Mr Nanette"),
            "Bonjour Mr Nanette! decompte du temps d'entrer"
        );
    }

    #[test]
    fn test_exit_message() {
        assert_eq!(
            exit_message(
                &DisplayMessages::default(),
                "Mr Mevel",
                ElapsedTime::from_millis(10_000)
            ),
            "Au revoir Mr Mevel! Temps ecoule: 0h 0m 10s"
        );
    }

    #[test]
    fn test_english_preset() {
        let messages = DisplayMessages::english();
        assert_eq!(
            presence_message(&messages, "Mr Bur", PresenceChange::Entered),
            "Hello Mr Bur! presence timer started"
        );
        assert_eq!(
            presence_message(
                &messages,
                "Mr Bur",
                PresenceChange::Exited {
                    elapsed: ElapsedTime::from_millis(3_661_000)
                }
            ),
            "Goodbye Mr Bur! Time inside: 1h 1m 1s"
        );
    }
}
