//! Discord command context.

use super::{AuditChannel, CommandContext, ContextBase, Invocation};
use crate::db::Database;
use crate::error::CommandError;
use crate::platform::{ChatApi, ClientError, Platform, PlatformUser};
use async_trait::async_trait;
use std::sync::Arc;

/// Context for a command sent in a Discord channel.
pub struct DiscordContext {
    base: ContextBase,
}

impl DiscordContext {
    pub fn new(
        db: Database,
        api: Arc<dyn ChatApi>,
        channel_id: impl Into<String>,
        author: PlatformUser,
        audit: Option<AuditChannel>,
    ) -> Self {
        debug_assert_eq!(author.platform, Platform::Discord);
        Self {
            base: ContextBase {
                db,
                api,
                channel: channel_id.into(),
                author,
                audit,
            },
        }
    }
}

/// Discord mention markup for a user id.
pub fn mention(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

/// Extract the user id from `<@id>` or `<@!id>` mention markup.
pub fn parse_mention(text: &str) -> Option<&str> {
    let inner = text.trim().strip_prefix("<@")?.strip_suffix('>')?;
    let id = inner.strip_prefix('!').unwrap_or(inner);
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then_some(id)
}

#[async_trait]
impl CommandContext for DiscordContext {
    fn platform(&self) -> Platform {
        Platform::Discord
    }

    fn channel(&self) -> &str {
        &self.base.channel
    }

    fn author(&self) -> &PlatformUser {
        &self.base.author
    }

    fn db(&self) -> &Database {
        &self.base.db
    }

    fn mention(&self) -> String {
        mention(&self.base.author.platform_id)
    }

    async fn send(&self, text: &str) -> Result<(), ClientError> {
        self.base.send(text).await
    }

    async fn platform_user(&self) -> Result<PlatformUser, CommandError> {
        self.base.canonical_author().await
    }

    async fn log(&self, invocation: &Invocation<'_>) {
        self.base.log(invocation).await
    }
}
