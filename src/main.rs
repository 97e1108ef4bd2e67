//! ctmbot - Discord and Twitch chat bot daemon.

use ctm_bot::bot::Bot;
use ctm_bot::commands::Registry;
use ctm_bot::config::{Config, validate};
use ctm_bot::db::Database;
use ctm_bot::network::{DiscordGateway, TwitchConnection};
use ctm_bot::platform::{DiscordClient, TwitchClient};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("CTMBOT_LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    if config.discord.is_none() && config.twitch.is_none() {
        anyhow::bail!("Neither [discord] nor [twitch] is configured; nothing to do");
    }

    info!(
        prefix = %config.bot.prefix,
        database = %config.database.path,
        discord = config.discord.is_some(),
        twitch = config.twitch.is_some(),
        "Starting ctmbot"
    );

    let db = Database::new(&config.database.path).await?;
    let registry = Registry::with_default_commands(&config.bot);
    let mut bot = Bot::new(registry, db);

    let mut twitch_queue = None;
    if let Some(discord) = &config.discord {
        bot = bot.with_discord(Arc::new(DiscordClient::new(discord)));
        if let Some(channel_id) = &discord.audit_channel_id {
            bot = bot.with_audit_channel(channel_id.clone());
        }
    }
    if let Some(twitch) = &config.twitch {
        let (client, outbound) = TwitchClient::new(twitch);
        bot = bot.with_twitch(Arc::new(client));
        twitch_queue = Some(outbound);
    }
    let bot = Arc::new(bot);

    if let Some(discord) = &config.discord {
        let gateway = DiscordGateway::new(
            discord.gateway_url.clone(),
            discord.token.clone(),
            Arc::clone(&bot),
        );
        tokio::spawn(gateway.run());
    }
    if let (Some(twitch), Some(outbound)) = (config.twitch.clone(), twitch_queue) {
        let connection = TwitchConnection::new(twitch, Arc::clone(&bot), outbound);
        tokio::spawn(connection.run());
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
