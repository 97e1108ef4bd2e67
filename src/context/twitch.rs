//! Twitch command context.

use super::{AuditChannel, CommandContext, ContextBase, Invocation};
use crate::db::Database;
use crate::error::CommandError;
use crate::platform::{ChatApi, ClientError, Platform, PlatformUser};
use async_trait::async_trait;
use std::sync::Arc;

/// Context for a command sent in a Twitch channel's chat.
pub struct TwitchContext {
    base: ContextBase,
}

impl TwitchContext {
    pub fn new(
        db: Database,
        api: Arc<dyn ChatApi>,
        channel: impl Into<String>,
        author: PlatformUser,
        audit: Option<AuditChannel>,
    ) -> Self {
        debug_assert_eq!(author.platform, Platform::Twitch);
        Self {
            base: ContextBase {
                db,
                api,
                channel: channel.into(),
                author,
                audit,
            },
        }
    }
}

#[async_trait]
impl CommandContext for TwitchContext {
    fn platform(&self) -> Platform {
        Platform::Twitch
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
        format!("@{}", self.base.author.username)
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
