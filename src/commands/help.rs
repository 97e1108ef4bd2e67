//! `!help` - list the commands available on the invoking platform.

use super::{Args, Command, CommandOptions};
use crate::context::CommandContext;
use crate::error::CommandResult;
use async_trait::async_trait;

pub struct HelpCommand {
    prefix: String,
    listing: Vec<(&'static str, CommandOptions)>,
}

impl HelpCommand {
    /// `listing` is the visible commands registered before this one.
    pub fn new(prefix: impl Into<String>, listing: Vec<(&'static str, CommandOptions)>) -> Self {
        Self {
            prefix: prefix.into(),
            listing,
        }
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn options(&self) -> CommandOptions {
        CommandOptions {
            aliases: &["commands"],
            hidden: true,
            ..Default::default()
        }
    }

    async fn execute(&self, ctx: &dyn CommandContext, _args: &Args<'_>) -> CommandResult {
        let names: Vec<String> = self
            .listing
            .iter()
            .filter(|(_, options)| options.allows(ctx.platform()))
            .map(|(name, _)| format!("{}{}", self.prefix, name))
            .collect();

        ctx.reply(&format!("Commands: {}", names.join(", "))).await?;
        Ok(())
    }
}
