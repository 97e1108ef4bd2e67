//! `!qualify <event>` - check qualifying eligibility and link to the form.

use super::{Args, Command, CommandOptions};
use crate::context::CommandContext;
use crate::db::IneligibleReason;
use crate::error::{CommandError, CommandResult};
use crate::platform::Platform;
use async_trait::async_trait;

pub struct QualifyCommand {
    base_url: String,
}

impl QualifyCommand {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Command for QualifyCommand {
    fn name(&self) -> &'static str {
        "qualify"
    }

    fn options(&self) -> CommandOptions {
        CommandOptions {
            platforms: &[Platform::Discord],
            usage: "<event>",
            ..Default::default()
        }
    }

    async fn execute(&self, ctx: &dyn CommandContext, args: &Args<'_>) -> CommandResult {
        let Some(slug) = args.get(0) else {
            return Err(CommandError::Usage);
        };

        let events = ctx.db().events();
        let Some(event) = events.find_by_slug(slug).await? else {
            return Err(CommandError::NotFound(format!("No event found: {}", slug)));
        };

        // Nobody can qualify for a closed event, so don't create an account for it.
        if !event.qualifying_open {
            return Err(CommandError::Ineligible(IneligibleReason::Closed));
        }

        let account = ctx.resolve_user().await?;
        if let Some(reason) = events.user_ineligible_reason(&event, Some(&account)).await? {
            return Err(CommandError::Ineligible(reason));
        }

        ctx.reply_with_mention(&format!(
            "you can qualify for {} at {}",
            event.name,
            event.absolute_url(&self.base_url)
        ))
        .await?;
        Ok(())
    }
}
