//! Test harness for driving commands end to end against in-memory doubles.

use crate::bot::Bot;
use crate::commands::{Dispatch, Registry};
use crate::config::BotConfig;
use crate::db::{Account, Database};
use crate::platform::mock::MockApi;
use crate::platform::{InboundMessage, Platform, PlatformUser};
use crate::scores::ConsoleType;
use std::sync::Arc;

pub const DISCORD_CHANNEL: &str = "100200300";
pub const TWITCH_CHANNEL: &str = "classictetris";

/// A bot wired to mock Discord and Twitch APIs and a fresh database.
///
/// Messages are sent as `discord_user` / `twitch_user`. Both are known to
/// their mock API, but nothing is in the database until a command or a
/// setup helper creates it.
pub struct CommandHarness {
    pub bot: Bot,
    pub db: Database,
    pub discord_api: Arc<MockApi>,
    pub twitch_api: Arc<MockApi>,
    pub discord_user: PlatformUser,
    pub twitch_user: PlatformUser,
}

impl CommandHarness {
    pub async fn new() -> Self {
        Self::with_registry(Registry::with_default_commands(&BotConfig::default())).await
    }

    pub async fn with_registry(registry: Registry) -> Self {
        let db = Database::new(":memory:").await.unwrap();
        let discord_api = MockApi::new();
        let twitch_api = MockApi::new();

        let discord_user = PlatformUser::new(Platform::Discord, "1001", "discord_user");
        let twitch_user = PlatformUser::new(Platform::Twitch, "2001", "twitch_user");
        discord_api.add_user(&discord_user.platform_id, &discord_user.username);
        twitch_api.add_user(&twitch_user.platform_id, &twitch_user.username);

        let bot = Bot::new(registry, db.clone())
            .with_discord(discord_api.clone())
            .with_twitch(twitch_api.clone());

        Self {
            bot,
            db,
            discord_api,
            twitch_api,
            discord_user,
            twitch_user,
        }
    }

    pub async fn dispatch_discord(&self, text: &str) -> Dispatch {
        self.bot
            .handle(InboundMessage {
                author: self.discord_user.clone(),
                channel: DISCORD_CHANNEL.to_string(),
                text: text.to_string(),
            })
            .await
    }

    pub async fn dispatch_twitch(&self, text: &str) -> Dispatch {
        self.bot
            .handle(InboundMessage {
                author: self.twitch_user.clone(),
                channel: TWITCH_CHANNEL.to_string(),
                text: text.to_string(),
            })
            .await
    }

    /// Send `text` on Discord and return the replies.
    pub async fn discord(&self, text: &str) -> Vec<String> {
        self.dispatch_discord(text).await;
        self.discord_messages()
    }

    /// Send `text` on Twitch and return the replies.
    pub async fn twitch(&self, text: &str) -> Vec<String> {
        self.dispatch_twitch(text).await;
        self.twitch_messages()
    }

    pub fn discord_messages(&self) -> Vec<String> {
        self.discord_api.poll(DISCORD_CHANNEL)
    }

    pub fn twitch_messages(&self) -> Vec<String> {
        self.twitch_api.poll(TWITCH_CHANNEL)
    }

    /// The Discord sender's account, created if needed.
    pub async fn discord_account(&self) -> Account {
        self.db.users().resolve(&self.discord_user).await.unwrap()
    }

    /// The Twitch sender's account, created if needed.
    pub async fn twitch_account(&self) -> Account {
        self.db.users().resolve(&self.twitch_user).await.unwrap()
    }

    /// Another Discord user with an account.
    pub async fn other_discord_user(&self, id: &str, username: &str) -> Account {
        let user = PlatformUser::new(Platform::Discord, id, username);
        self.db.users().resolve(&user).await.unwrap()
    }

    /// Another Twitch user with an account.
    pub async fn other_twitch_user(&self, id: &str, username: &str) -> Account {
        let user = PlatformUser::new(Platform::Twitch, id, username);
        self.db.users().resolve(&user).await.unwrap()
    }

    pub async fn add_pb(&self, user_id: i64, score: i64, console: ConsoleType, level: u8) {
        self.db
            .scores()
            .add_pb(user_id, score, console, level)
            .await
            .unwrap();
    }
}
