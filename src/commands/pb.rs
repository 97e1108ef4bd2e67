//! `!pb [username]` - report current PBs.

use super::{Args, Command, CommandOptions};
use crate::context::{CommandContext, parse_discord_mention};
use crate::error::{CommandError, CommandResult};
use crate::platform::Platform;
use crate::scores::{NO_PB, describe_latest};
use async_trait::async_trait;

pub struct PbCommand;

impl PbCommand {
    /// Find the account and display name for a username argument.
    ///
    /// Never creates records; an unknown name is reported as having no PB.
    async fn lookup(
        ctx: &dyn CommandContext,
        target: &str,
    ) -> Result<(i64, String), CommandError> {
        let users = ctx.db().users();

        let identity = match parse_discord_mention(target) {
            Some(id) if ctx.platform() == Platform::Discord => {
                users.find_identity(Platform::Discord, id).await?
            }
            _ => users.any_platform_user_from_username(target).await?,
        };

        identity
            .map(|identity| (identity.user_id, identity.username))
            .ok_or_else(|| CommandError::NotFound(NO_PB.to_string()))
    }
}

#[async_trait]
impl Command for PbCommand {
    fn name(&self) -> &'static str {
        "pb"
    }

    fn options(&self) -> CommandOptions {
        CommandOptions {
            aliases: &["getpb"],
            usage: "[username]",
            ..Default::default()
        }
    }

    async fn execute(&self, ctx: &dyn CommandContext, args: &Args<'_>) -> CommandResult {
        let (user_id, name) = if args.is_empty() {
            let user = ctx.platform_user().await?;
            let account = ctx.db().users().resolve(&user).await?;
            (account.id, user.username)
        } else {
            Self::lookup(ctx, args.raw()).await?
        };

        let scores = ctx.db().scores();
        let description = match scores.current_pbs(user_id).await?.describe() {
            Some(description) => Some(description),
            None => {
                let history = scores.history(user_id).await?;
                describe_latest(
                    history
                        .iter()
                        .map(|pb| (pb.console, pb.starting_level, pb.score)),
                )
            }
        };
        let Some(description) = description else {
            return Err(CommandError::NotFound(NO_PB.to_string()));
        };

        ctx.reply(&format!("{} has {}.", name, description)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::scores::{ConsoleType, NO_PB};
    use crate::testing::CommandHarness;

    #[tokio::test]
    async fn test_discord_with_no_user() {
        let harness = CommandHarness::new().await;
        assert_eq!(harness.discord("!pb").await, vec![NO_PB.to_string()]);
    }

    #[tokio::test]
    async fn test_discord_with_no_pb() {
        let harness = CommandHarness::new().await;
        harness.discord_account().await;
        assert_eq!(harness.discord("!pb").await, vec![NO_PB.to_string()]);
    }

    #[tokio::test]
    async fn test_discord_with_ntsc_pb() {
        let harness = CommandHarness::new().await;
        let account = harness.discord_account().await;
        harness.add_pb(account.id, 100_000, ConsoleType::Ntsc, 18).await;

        assert_eq!(
            harness.discord("!pb").await,
            vec![format!("{} has an NTSC PB of 100,000.", harness.discord_user.username)]
        );
    }

    #[tokio::test]
    async fn test_discord_with_ntsc_18_and_19_pb() {
        let harness = CommandHarness::new().await;
        let account = harness.discord_account().await;
        harness.add_pb(account.id, 600_000, ConsoleType::Ntsc, 18).await;
        harness.add_pb(account.id, 100_000, ConsoleType::Ntsc, 19).await;

        assert_eq!(
            harness.discord("!pb").await,
            vec![format!(
                "{} has an NTSC PB of 600,000 (100,000 19 start).",
                harness.discord_user.username
            )]
        );
    }

    #[tokio::test]
    async fn test_discord_with_pal_pb() {
        let harness = CommandHarness::new().await;
        let account = harness.discord_account().await;
        harness.add_pb(account.id, 100_000, ConsoleType::Pal, 18).await;

        assert_eq!(
            harness.discord("!pb").await,
            vec![format!("{} has a PAL PB of 100,000.", harness.discord_user.username)]
        );
    }

    #[tokio::test]
    async fn test_discord_with_ntsc_and_pal_pb() {
        let harness = CommandHarness::new().await;
        let account = harness.discord_account().await;
        harness.add_pb(account.id, 200_000, ConsoleType::Ntsc, 18).await;
        harness.add_pb(account.id, 100_000, ConsoleType::Pal, 18).await;

        assert_eq!(
            harness.discord("!pb").await,
            vec![format!(
                "{} has an NTSC PB of 200,000 and a PAL PB of 100,000.",
                harness.discord_user.username
            )]
        );
    }

    #[tokio::test]
    async fn test_latest_submission_wins() {
        let harness = CommandHarness::new().await;
        let account = harness.discord_account().await;
        harness.add_pb(account.id, 300_000, ConsoleType::Ntsc, 18).await;
        harness.add_pb(account.id, 250_000, ConsoleType::Ntsc, 18).await;

        assert_eq!(
            harness.discord("!getpb").await,
            vec![format!("{} has an NTSC PB of 250,000.", harness.discord_user.username)]
        );
    }

    #[tokio::test]
    async fn test_pb_outside_report_categories() {
        let harness = CommandHarness::new().await;
        harness.discord("!setpb 100000 PAL 19").await;

        assert_eq!(
            harness.discord("!pb").await,
            vec![format!(
                "{} has a PAL level 19 PB of 100,000.",
                harness.discord_user.username
            )]
        );
    }

    #[tokio::test]
    async fn test_report_categories_take_precedence() {
        let harness = CommandHarness::new().await;
        let account = harness.discord_account().await;
        harness.add_pb(account.id, 90_000, ConsoleType::Ntsc, 12).await;
        harness.add_pb(account.id, 100_000, ConsoleType::Pal, 18).await;

        assert_eq!(
            harness.discord("!pb").await,
            vec![format!("{} has a PAL PB of 100,000.", harness.discord_user.username)]
        );
    }

    #[tokio::test]
    async fn test_discord_with_nonexistent_user() {
        let harness = CommandHarness::new().await;
        assert_eq!(harness.discord("!pb Other User").await, vec![NO_PB.to_string()]);
        assert_eq!(harness.db.users().count().await.unwrap(), 0);
        assert_eq!(harness.db.scores().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_discord_with_user_with_no_pb() {
        let harness = CommandHarness::new().await;
        harness.other_discord_user("3003", "Other User").await;
        assert_eq!(harness.discord("!pb Other User").await, vec![NO_PB.to_string()]);
    }

    #[tokio::test]
    async fn test_discord_with_user_with_pb() {
        let harness = CommandHarness::new().await;
        let other = harness.other_discord_user("3003", "Other User").await;
        harness.add_pb(other.id, 100_000, ConsoleType::Ntsc, 18).await;

        assert_eq!(
            harness.discord("!pb Other User").await,
            vec!["Other User has an NTSC PB of 100,000.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_discord_with_mention() {
        let harness = CommandHarness::new().await;
        let other = harness.other_discord_user("3003", "Other User").await;
        harness.add_pb(other.id, 100_000, ConsoleType::Ntsc, 18).await;

        assert_eq!(
            harness.discord("!pb <@!3003>").await,
            vec!["Other User has an NTSC PB of 100,000.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_lookup_finds_twitch_user_from_discord() {
        let harness = CommandHarness::new().await;
        let other = harness.other_twitch_user("4004", "other_user").await;
        harness.add_pb(other.id, 100_000, ConsoleType::Ntsc, 19).await;

        assert_eq!(
            harness.discord("!pb @Other_User").await,
            vec!["other_user has an NTSC level 19 PB of 100,000.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_twitch_with_no_user() {
        let harness = CommandHarness::new().await;
        assert_eq!(harness.twitch("!pb").await, vec![NO_PB.to_string()]);
    }

    #[tokio::test]
    async fn test_twitch_with_ntsc_pb() {
        let harness = CommandHarness::new().await;
        let account = harness.twitch_account().await;
        harness.add_pb(account.id, 100_000, ConsoleType::Ntsc, 18).await;

        assert_eq!(
            harness.twitch("!pb").await,
            vec![format!("{} has an NTSC PB of 100,000.", harness.twitch_user.username)]
        );
    }

    #[tokio::test]
    async fn test_twitch_with_nonexistent_user() {
        let harness = CommandHarness::new().await;
        assert_eq!(harness.twitch("!pb other_user").await, vec![NO_PB.to_string()]);
    }

    #[tokio::test]
    async fn test_twitch_with_user_with_pb() {
        let harness = CommandHarness::new().await;
        let other = harness.other_twitch_user("4004", "other_user").await;
        harness.add_pb(other.id, 100_000, ConsoleType::Ntsc, 18).await;

        assert_eq!(
            harness.twitch("!pb other_user").await,
            vec!["other_user has an NTSC PB of 100,000.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_mention_markup_is_a_username_on_twitch() {
        let harness = CommandHarness::new().await;
        let other = harness.other_discord_user("3003", "Other User").await;
        harness.add_pb(other.id, 100_000, ConsoleType::Ntsc, 18).await;

        assert_eq!(harness.twitch("!pb <@3003>").await, vec![NO_PB.to_string()]);
    }
}
