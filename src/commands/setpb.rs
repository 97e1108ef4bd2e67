//! `!setpb <score> [NTSC|PAL] [level]` - record a new PB.

use super::{Args, Command, CommandOptions};
use crate::context::CommandContext;
use crate::error::CommandResult;
use crate::scores::{PbSubmission, format_score};
use async_trait::async_trait;

pub struct SetPbCommand;

#[async_trait]
impl Command for SetPbCommand {
    fn name(&self) -> &'static str {
        "setpb"
    }

    fn options(&self) -> CommandOptions {
        CommandOptions {
            usage: "<score> [NTSC|PAL] [level]",
            ..Default::default()
        }
    }

    async fn execute(&self, ctx: &dyn CommandContext, args: &Args<'_>) -> CommandResult {
        let submission = PbSubmission::parse(args.tokens())?;

        let user = ctx.platform_user().await?;
        let (_, record) = ctx.db().scores().add_pb_for(&user, &submission).await?;

        ctx.reply_with_mention(&format!(
            "has a new {} PB of {}!",
            submission.category(),
            format_score(record.score)
        ))
        .await?;
        Ok(())
    }
}
