//! Discord REST client.

use super::{ApiUser, ChatApi, ClientError};
use crate::config::DiscordConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use tracing::debug;

/// Discord REST client authenticated as a bot.
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    auth_header: String,
}

impl DiscordClient {
    pub fn new(config: &DiscordConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            auth_header: format!("Bot {}", config.token),
        }
    }
}

#[async_trait]
impl ChatApi for DiscordClient {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ClientError> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel);
        let body = json!({
            "content": text,
            "allowed_mentions": { "parse": ["users"] },
        });

        let response = self
            .http
            .post(&url)
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        debug!(channel = %channel, "Discord message sent");
        Ok(())
    }

    async fn user_from_id(&self, id: &str) -> Result<Option<ApiUser>, ClientError> {
        let url = format!("{}/users/{}", self.api_base, id);
        let response = self
            .http
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<ApiUser>().await?)),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ClientError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
