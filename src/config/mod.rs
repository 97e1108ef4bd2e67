//! Configuration loading and management.
//!
//! - [`types`]: Config struct definitions and TOML loading
//! - [`validation`]: startup checks that collect every problem at once

mod types;
mod validation;

pub use types::{BotConfig, Config, ConfigError, DatabaseConfig, DiscordConfig, TwitchConfig};
pub use validation::{ValidationError, validate};
