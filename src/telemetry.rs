//! Telemetry utilities for command timing and spans.

use std::time::Instant;
use tracing::debug;

/// Guard for timing command execution.
///
/// Logs the command latency when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        debug!(command = %self.command, elapsed_ms, "Command finished");
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one command invocation.
    pub fn command(name: &str, platform: &str, channel: &str, user: &str) -> Span {
        info_span!("bot.command", command = %name, platform = %platform, channel = %channel, user = %user)
    }

    /// Span for a platform connection.
    pub fn connection(platform: &str) -> Span {
        info_span!("connection", platform = %platform)
    }
}
