//! Core configuration types and loading.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Command surface settings.
    #[serde(default)]
    pub bot: BotConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Discord connection. The bot skips Discord entirely when absent.
    pub discord: Option<DiscordConfig>,
    /// Twitch connection. The bot skips Twitch entirely when absent.
    pub twitch: Option<TwitchConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Command surface settings shared by every platform.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Prefix that marks a chat message as a command (default: `!`).
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Public website root, used when linking to event pages.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            base_url: default_base_url(),
        }
    }
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "ctmbot.db".to_string()
}

/// Discord bot configuration.
#[derive(Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Never logged.
    pub token: String,
    /// Channel that receives one audit line per command invocation.
    #[serde(default)]
    pub audit_channel_id: Option<String>,
    /// REST API root.
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
    /// Gateway WebSocket URL.
    #[serde(default = "default_discord_gateway_url")]
    pub gateway_url: String,
}

impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("audit_channel_id", &self.audit_channel_id)
            .field("api_base", &self.api_base)
            .field("gateway_url", &self.gateway_url)
            .finish()
    }
}

fn default_discord_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_discord_gateway_url() -> String {
    "wss://gateway.discord.gg/?v=10&encoding=json".to_string()
}

/// Twitch bot configuration.
#[derive(Clone, Deserialize)]
pub struct TwitchConfig {
    /// Bot login used for the IRC NICK.
    pub username: String,
    /// Chat token in `oauth:<token>` form. Never logged.
    pub oauth_token: String,
    /// Application client id for Helix requests.
    pub client_id: String,
    /// Channels to join, without the leading `#`.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Helix REST API root.
    #[serde(default = "default_twitch_api_base")]
    pub api_base: String,
    /// IRC server address.
    #[serde(default = "default_twitch_irc_addr")]
    pub irc_addr: String,
}

impl TwitchConfig {
    /// The bare token for Helix `Authorization: Bearer` headers.
    pub fn bearer_token(&self) -> &str {
        self.oauth_token
            .strip_prefix("oauth:")
            .unwrap_or(&self.oauth_token)
    }
}

impl fmt::Debug for TwitchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitchConfig")
            .field("username", &self.username)
            .field("oauth_token", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("channels", &self.channels)
            .field("api_base", &self.api_base)
            .field("irc_addr", &self.irc_addr)
            .finish()
    }
}

fn default_twitch_api_base() -> String {
    "https://api.twitch.tv/helix".to_string()
}

fn default_twitch_irc_addr() -> String {
    "irc.chat.twitch.tv:6667".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.bot.prefix, "!");
        assert_eq!(config.database.path, "ctmbot.db");
        assert!(config.discord.is_none());
        assert!(config.twitch.is_none());
    }

    #[test]
    fn test_platform_sections() {
        let config = Config::from_toml(
            r#"
            [bot]
            prefix = "?"
            base_url = "https://monthlytetris.info"

            [discord]
            token = "secret-token"
            audit_channel_id = "42"

            [twitch]
            username = "ctmbot"
            oauth_token = "oauth:abc123"
            client_id = "cid"
            channels = ["classictetris"]
            "#,
        )
        .unwrap();

        assert_eq!(config.bot.prefix, "?");
        let discord = config.discord.unwrap();
        assert_eq!(discord.audit_channel_id.as_deref(), Some("42"));
        assert_eq!(discord.api_base, "https://discord.com/api/v10");

        let twitch = config.twitch.unwrap();
        assert_eq!(twitch.channels, vec!["classictetris".to_string()]);
        assert_eq!(twitch.bearer_token(), "abc123");
        assert_eq!(twitch.irc_addr, "irc.chat.twitch.tv:6667");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_toml(
            r#"
            [discord]
            token = "very-secret"
            "#,
        )
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
