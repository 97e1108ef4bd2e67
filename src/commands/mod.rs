//! Chat commands.
//!
//! Each command implements [`Command`] and is registered in the [`Registry`],
//! which parses incoming text and routes it. Handlers parse their own
//! arguments from [`Args`] and talk to the world only through the
//! [`CommandContext`](crate::context::CommandContext).

mod help;
mod pb;
mod qualify;
mod registry;
mod setpb;

pub use help::HelpCommand;
pub use pb::PbCommand;
pub use qualify::QualifyCommand;
pub use registry::{Dispatch, Registry};
pub use setpb::SetPbCommand;

use crate::context::CommandContext;
use crate::error::CommandResult;
use crate::platform::Platform;
use async_trait::async_trait;

/// Per-command routing options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOptions {
    /// Extra names the command answers to.
    pub aliases: &'static [&'static str],
    /// Platforms the command runs on; empty means all.
    pub platforms: &'static [Platform],
    /// Left out of `help` listings.
    pub hidden: bool,
    /// Argument synopsis shown after the command name in usage replies.
    pub usage: &'static str,
}

impl CommandOptions {
    /// Whether the command may run on `platform`.
    pub fn allows(&self, platform: Platform) -> bool {
        self.platforms.is_empty() || self.platforms.contains(&platform)
    }
}

/// Whitespace-split command arguments, with the raw text kept for commands
/// that take free-form input.
#[derive(Debug, Clone)]
pub struct Args<'a> {
    raw: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> Args<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let raw = raw.trim();
        Self {
            raw,
            tokens: raw.split_whitespace().collect(),
        }
    }

    /// Everything after the command name, trimmed.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.tokens.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A chat command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, lowercase, without prefix.
    fn name(&self) -> &'static str;

    fn options(&self) -> CommandOptions {
        CommandOptions::default()
    }

    async fn execute(&self, ctx: &dyn CommandContext, args: &Args<'_>) -> CommandResult;
}
