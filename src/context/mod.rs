//! Per-invocation command context.
//!
//! A context binds one platform, one channel and one invoking user. Handlers
//! only ever see the [`CommandContext`] trait; [`DiscordContext`] and
//! [`TwitchContext`] differ in mention formatting and in how a first-time
//! user is looked up.

mod discord;
mod twitch;

pub use discord::{DiscordContext, parse_mention as parse_discord_mention};
pub use twitch::TwitchContext;

use crate::db::{Account, Database};
use crate::error::CommandError;
use crate::platform::{ChatApi, ClientError, Platform, PlatformUser};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// A routed command, as recorded by [`CommandContext::log`].
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub command: &'a str,
    pub args: &'a str,
}

/// Discord channel that receives one line per invocation from every platform.
#[derive(Clone)]
pub struct AuditChannel {
    api: Arc<dyn ChatApi>,
    channel_id: String,
}

impl AuditChannel {
    pub fn new(api: Arc<dyn ChatApi>, channel_id: impl Into<String>) -> Self {
        Self {
            api,
            channel_id: channel_id.into(),
        }
    }

    async fn record(&self, platform: Platform, channel: &str, user: &str, invocation: &Invocation<'_>) {
        let line = if invocation.args.is_empty() {
            format!("[{}] {} in {}: {}", platform, user, channel, invocation.command)
        } else {
            format!(
                "[{}] {} in {}: {} {}",
                platform, user, channel, invocation.command, invocation.args
            )
        };
        if let Err(e) = self.api.send_message(&self.channel_id, &line).await {
            warn!(error = %e, channel = %self.channel_id, "Failed to write audit line");
        }
    }
}

/// Capability surface handlers run against.
#[async_trait]
pub trait CommandContext: Send + Sync {
    fn platform(&self) -> Platform;

    /// Channel the command arrived in.
    fn channel(&self) -> &str;

    /// The invoking user as reported by the platform.
    fn author(&self) -> &PlatformUser;

    fn db(&self) -> &Database;

    /// Platform-native mention of the invoking user.
    fn mention(&self) -> String;

    /// Deliver `text` to the originating channel.
    async fn send(&self, text: &str) -> Result<(), ClientError>;

    /// Answer in the originating channel.
    async fn reply(&self, text: &str) -> Result<(), ClientError> {
        self.send(text).await
    }

    /// Answer in the originating channel, addressed to the invoking user.
    async fn reply_with_mention(&self, text: &str) -> Result<(), ClientError> {
        self.send(&format!("{} {}", self.mention(), text)).await
    }

    /// The invoking user with their canonical platform username.
    async fn platform_user(&self) -> Result<PlatformUser, CommandError>;

    /// The invoking user's account, created on first contact.
    async fn resolve_user(&self) -> Result<Account, CommandError> {
        let user = self.platform_user().await?;
        Ok(self.db().users().resolve(&user).await?)
    }

    /// Record the invocation for audit.
    async fn log(&self, invocation: &Invocation<'_>);
}

/// Fields shared by every platform's context.
struct ContextBase {
    db: Database,
    api: Arc<dyn ChatApi>,
    channel: String,
    author: PlatformUser,
    audit: Option<AuditChannel>,
}

impl ContextBase {
    async fn send(&self, text: &str) -> Result<(), ClientError> {
        self.api.send_message(&self.channel, text).await
    }

    /// The author with the username the platform API reports, for users we
    /// have never stored. Known users keep the name from the inbound message.
    async fn canonical_author(&self) -> Result<PlatformUser, CommandError> {
        let known = self
            .db
            .users()
            .find_identity(self.author.platform, &self.author.platform_id)
            .await?;
        if known.is_some() {
            return Ok(self.author.clone());
        }

        match self.api.user_from_id(&self.author.platform_id).await? {
            Some(api_user) => Ok(PlatformUser::new(
                self.author.platform,
                self.author.platform_id.clone(),
                api_user.username,
            )),
            None => Ok(self.author.clone()),
        }
    }

    async fn log(&self, invocation: &Invocation<'_>) {
        info!(
            platform = %self.author.platform,
            channel = %self.channel,
            user = %self.author.username,
            user_id = %self.author.platform_id,
            command = %invocation.command,
            args = %invocation.args,
            "Command invoked"
        );
        if let Some(audit) = &self.audit {
            audit
                .record(self.author.platform, &self.channel, &self.author.username, invocation)
                .await;
        }
    }
}
