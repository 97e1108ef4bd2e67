//! Platform connections.
//!
//! Each connection owns its socket, turns inbound chat into
//! [`InboundMessage`](crate::platform::InboundMessage)s for the [`Bot`](crate::bot::Bot),
//! and reconnects with backoff when the session drops.

pub mod discord;
pub mod twitch;

pub use discord::DiscordGateway;
pub use twitch::TwitchConnection;

use std::time::Duration;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Reconnect delay that doubles per failed session and resets after a clean one.
#[derive(Debug)]
struct Backoff {
    current: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            current: INITIAL_BACKOFF,
        }
    }

    fn reset(&mut self) {
        self.current = INITIAL_BACKOFF;
    }

    /// The delay to wait now; the following one is doubled.
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(MAX_BACKOFF);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = Backoff::new();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        for _ in 0..10 {
            backoff.next_delay();
        }
        assert_eq!(backoff.next_delay(), MAX_BACKOFF);

        backoff.reset();
        assert_eq!(backoff.next_delay(), INITIAL_BACKOFF);
    }
}
