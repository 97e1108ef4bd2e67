//! Message routing from platform connections to the command registry.

use crate::commands::{Dispatch, Registry};
use crate::context::{AuditChannel, DiscordContext, TwitchContext};
use crate::db::Database;
use crate::platform::{ChatApi, InboundMessage, Platform};
use std::sync::Arc;
use tracing::warn;

/// Shared bot state. One instance serves every connection.
pub struct Bot {
    registry: Registry,
    db: Database,
    discord: Option<Arc<dyn ChatApi>>,
    twitch: Option<Arc<dyn ChatApi>>,
    audit: Option<AuditChannel>,
}

impl Bot {
    pub fn new(registry: Registry, db: Database) -> Self {
        Self {
            registry,
            db,
            discord: None,
            twitch: None,
            audit: None,
        }
    }

    pub fn with_discord(mut self, api: Arc<dyn ChatApi>) -> Self {
        self.discord = Some(api);
        self
    }

    pub fn with_twitch(mut self, api: Arc<dyn ChatApi>) -> Self {
        self.twitch = Some(api);
        self
    }

    /// Send an audit line for every invocation to a Discord channel.
    ///
    /// Requires the Discord client to be set first.
    pub fn with_audit_channel(mut self, channel_id: impl Into<String>) -> Self {
        match &self.discord {
            Some(api) => self.audit = Some(AuditChannel::new(Arc::clone(api), channel_id)),
            None => warn!("Audit channel configured without a Discord client; ignoring"),
        }
        self
    }

    /// Handle one inbound chat message.
    pub async fn handle(&self, message: InboundMessage) -> Dispatch {
        let platform = message.platform();
        let api = match platform {
            Platform::Discord => self.discord.clone(),
            Platform::Twitch => self.twitch.clone(),
        };
        let Some(api) = api else {
            warn!(platform = %platform, "Message from platform with no client configured");
            return Dispatch::Ignored;
        };

        let InboundMessage {
            author,
            channel,
            text,
        } = message;
        let audit = self.audit.clone();

        match platform {
            Platform::Discord => {
                let ctx = DiscordContext::new(self.db.clone(), api, channel, author, audit);
                self.registry.dispatch(&ctx, &text).await
            }
            Platform::Twitch => {
                let ctx = TwitchContext::new(self.db.clone(), api, channel, author, audit);
                self.registry.dispatch(&ctx, &text).await
            }
        }
    }
}
