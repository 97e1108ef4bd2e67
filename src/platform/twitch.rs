//! Twitch client: chat goes out over the IRC connection, user lookups over Helix.

use super::{ApiUser, ChatApi, ClientError};
use crate::config::TwitchConfig;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

/// Outbound IRC lines buffered between the client and the connection task.
const OUTBOUND_CAPACITY: usize = 64;

/// Twitch client.
///
/// `send_message` queues a raw `PRIVMSG` line for the IRC connection task,
/// which owns the socket; the queue keeps lines in issue order.
pub struct TwitchClient {
    http: reqwest::Client,
    api_base: String,
    client_id: String,
    bearer: String,
    outbound: mpsc::Sender<String>,
}

#[derive(Debug, Deserialize)]
struct HelixUsers {
    data: Vec<HelixUser>,
}

#[derive(Debug, Deserialize)]
struct HelixUser {
    id: String,
    login: String,
}

impl TwitchClient {
    /// Create a client and the receiving end of its outbound line queue.
    pub fn new(config: &TwitchConfig) -> (Self, mpsc::Receiver<String>) {
        let (outbound, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let client = Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            bearer: format!("Bearer {}", config.bearer_token()),
            outbound,
        };
        (client, rx)
    }
}

/// Build a PRIVMSG line. Line breaks would end the IRC line early, so they become spaces.
pub fn privmsg_line(channel: &str, text: &str) -> String {
    let text: String = text
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    format!("PRIVMSG #{} :{}", channel.trim_start_matches('#'), text)
}

#[async_trait]
impl ChatApi for TwitchClient {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ClientError> {
        self.outbound
            .send(privmsg_line(channel, text))
            .await
            .map_err(|_| ClientError::Closed)
    }

    async fn user_from_id(&self, id: &str) -> Result<Option<ApiUser>, ClientError> {
        let url = format!("{}/users", self.api_base);
        let response = self
            .http
            .get(&url)
            .query(&[("id", id)])
            .header("Client-Id", &self.client_id)
            .header("Authorization", &self.bearer)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        let users: HelixUsers = response.json().await?;
        Ok(users.data.into_iter().next().map(|u| ApiUser {
            id: u.id,
            username: u.login,
        }))
    }
}
