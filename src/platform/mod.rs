//! Chat platforms and their API clients.
//!
//! Every platform is reached through [`ChatApi`]: the network-backed clients
//! live in [`discord`] and [`twitch`], and `mock` provides an in-memory
//! double for tests that records sends and serves scripted users.

pub mod discord;
#[cfg(test)]
pub mod mock;
pub mod twitch;

pub use discord::DiscordClient;
pub use twitch::TwitchClient;

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Chat platform tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Discord,
    Twitch,
}

impl Platform {
    /// Lookup order used when searching identities across platforms.
    pub const PRIORITY: [Platform; 2] = [Platform::Discord, Platform::Twitch];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::Twitch => "twitch",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform-native user as seen on the wire, not yet tied to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformUser {
    pub platform: Platform,
    /// Discord snowflake or Twitch user id.
    pub platform_id: String,
    pub username: String,
}

impl PlatformUser {
    pub fn new(platform: Platform, platform_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            platform,
            platform_id: platform_id.into(),
            username: username.into(),
        }
    }
}

/// A chat message delivered by a platform connection.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub author: PlatformUser,
    /// Discord channel id or Twitch channel login (no `#`).
    pub channel: String,
    pub text: String,
}

impl InboundMessage {
    pub fn platform(&self) -> Platform {
        self.author.platform
    }
}

/// A user record returned by a platform's REST API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiUser {
    pub id: String,
    pub username: String,
}

/// Errors from platform API clients.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("connection closed")]
    Closed,
}

/// Authenticated client for one chat platform.
///
/// This is the only I/O boundary the command layer sees.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Deliver `text` to `channel`. Messages to one channel arrive in call order.
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ClientError>;

    /// Fetch a user by platform id. `Ok(None)` when the platform has no such user.
    async fn user_from_id(&self, id: &str) -> Result<Option<ApiUser>, ClientError>;
}
