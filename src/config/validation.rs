//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("bot.prefix must not be empty")]
    EmptyPrefix,
    #[error("bot.prefix must not contain whitespace, got '{0}'")]
    WhitespaceInPrefix(String),
    #[error("discord.token is required")]
    MissingDiscordToken,
    #[error("twitch.username is required")]
    MissingTwitchUsername,
    #[error("twitch.oauth_token must look like 'oauth:<token>'")]
    InvalidOauthToken,
    #[error("twitch.channels must list at least one channel")]
    NoTwitchChannels,
    #[error("twitch channel names must be 1-25 alphanumeric/underscore characters, got '{0}'")]
    InvalidTwitchChannel(String),
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

const MAX_TWITCH_NAME_LEN: usize = 25;

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let prefix = &config.bot.prefix;
    if prefix.is_empty() {
        errors.push(ValidationError::EmptyPrefix);
    } else if prefix.chars().any(char::is_whitespace) {
        errors.push(ValidationError::WhitespaceInPrefix(prefix.clone()));
    }

    if let Some(ref discord) = config.discord
        && discord.token.trim().is_empty()
    {
        errors.push(ValidationError::MissingDiscordToken);
    }

    if let Some(ref twitch) = config.twitch {
        if twitch.username.trim().is_empty() {
            errors.push(ValidationError::MissingTwitchUsername);
        }
        let token_ok = twitch
            .oauth_token
            .strip_prefix("oauth:")
            .is_some_and(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_alphanumeric()));
        if !token_ok {
            errors.push(ValidationError::InvalidOauthToken);
        }
        if twitch.channels.is_empty() {
            errors.push(ValidationError::NoTwitchChannels);
        }
        for channel in &twitch.channels {
            if !is_valid_twitch_name(channel) {
                errors.push(ValidationError::InvalidTwitchChannel(channel.clone()));
            }
        }
    }

    if config.database.path != ":memory:" {
        let db_path = Path::new(&config.database.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(
                config.database.path.clone(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_twitch_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_TWITCH_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
