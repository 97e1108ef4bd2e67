//! Discord gateway connection.
//!
//! Speaks just enough of the gateway protocol to receive messages: HELLO,
//! IDENTIFY, heartbeats, and `MESSAGE_CREATE` dispatches. Replies go out
//! through the REST client, not the socket.

use super::Backoff;
use crate::bot::Bot;
use crate::platform::{InboundMessage, Platform, PlatformUser};
use crate::telemetry::spans;
use futures_util::{SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{Instrument, debug, info, warn};

/// GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT
const INTENTS: u64 = (1 << 9) | (1 << 12) | (1 << 15);

/// Gateway opcodes.
mod op {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("gateway closed the connection")]
    Closed,
}

/// One gateway frame.
#[derive(Debug, Deserialize)]
struct Payload {
    op: u8,
    #[serde(default)]
    d: Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageCreate {
    channel_id: String,
    #[serde(default)]
    content: String,
    author: Author,
}

#[derive(Debug, Deserialize)]
struct Author {
    id: String,
    username: String,
    #[serde(default)]
    bot: bool,
}

/// Turn a `MESSAGE_CREATE` body into an inbound message.
///
/// Messages from bots (including ourselves) and messages without text are dropped.
pub fn parse_message_create(data: &Value) -> Option<InboundMessage> {
    let message = MessageCreate::deserialize(data).ok()?;
    if message.author.bot || message.content.is_empty() {
        return None;
    }
    Some(InboundMessage {
        author: PlatformUser::new(Platform::Discord, message.author.id, message.author.username),
        channel: message.channel_id,
        text: message.content,
    })
}

/// Heartbeat period announced by HELLO.
fn heartbeat_interval(hello: &Payload) -> Result<Duration, GatewayError> {
    if hello.op != op::HELLO {
        return Err(GatewayError::Protocol(format!("expected HELLO, got op {}", hello.op)));
    }
    match hello.d.get("heartbeat_interval").and_then(Value::as_u64) {
        Some(0) => Err(GatewayError::Protocol("HELLO with zero heartbeat_interval".into())),
        Some(ms) => Ok(Duration::from_millis(ms)),
        None => Err(GatewayError::Protocol("HELLO without heartbeat_interval".into())),
    }
}

/// Heartbeat timer. A tick delayed by a slow dispatch fires once, not in a burst.
fn heartbeat_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn identify(token: &str) -> Message {
    let payload = json!({
        "op": op::IDENTIFY,
        "d": {
            "token": token,
            "intents": INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "ctmbot",
                "device": "ctmbot",
            },
        },
    });
    Message::Text(payload.to_string())
}

fn heartbeat(sequence: Option<u64>) -> Message {
    Message::Text(json!({ "op": op::HEARTBEAT, "d": sequence }).to_string())
}

/// Read frames until the next JSON payload.
async fn next_payload<S>(read: &mut S) -> Result<Option<Payload>, GatewayError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = read.next().await {
        match frame? {
            Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
            Message::Close(frame) => {
                info!(?frame, "Gateway sent close frame");
                return Ok(None);
            }
            _ => continue,
        }
    }
    Ok(None)
}

/// Discord gateway client feeding the bot.
pub struct DiscordGateway {
    url: String,
    token: String,
    bot: Arc<Bot>,
}

impl DiscordGateway {
    pub fn new(url: impl Into<String>, token: impl Into<String>, bot: Arc<Bot>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            bot,
        }
    }

    /// Run sessions forever, reconnecting after each one ends.
    pub async fn run(self) {
        let mut backoff = Backoff::new();
        loop {
            match self.session().instrument(spans::connection("discord")).await {
                Ok(()) => {
                    info!("Discord session ended; reconnecting");
                    backoff.reset();
                }
                Err(e) => warn!(error = %e, "Discord session failed"),
            }
            tokio::time::sleep(backoff.next_delay()).await;
        }
    }

    async fn session(&self) -> Result<(), GatewayError> {
        let (socket, _) = connect_async(self.url.as_str()).await?;
        let (mut write, mut read) = socket.split();

        let hello = next_payload(&mut read).await?.ok_or(GatewayError::Closed)?;
        let interval = heartbeat_interval(&hello)?;

        write.send(identify(&self.token)).await?;
        info!(heartbeat = ?interval, "Identified with Discord gateway");

        let mut ticker = heartbeat_ticker(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut sequence = None;
        let mut awaiting_ack = false;

        loop {
            tokio::select! {
                payload = next_payload(&mut read) => {
                    let Some(payload) = payload? else {
                        return Ok(());
                    };
                    if payload.s.is_some() {
                        sequence = payload.s;
                    }
                    match payload.op {
                        op::DISPATCH => self.on_dispatch(payload.t.as_deref(), &payload.d).await,
                        op::HEARTBEAT => write.send(heartbeat(sequence)).await?,
                        op::HEARTBEAT_ACK => awaiting_ack = false,
                        op::RECONNECT | op::INVALID_SESSION => {
                            info!(op = payload.op, "Gateway asked for a new session");
                            return Ok(());
                        }
                        other => debug!(op = other, "Ignoring gateway opcode"),
                    }
                }

                _ = ticker.tick() => {
                    if awaiting_ack {
                        return Err(GatewayError::Protocol("heartbeat not acknowledged".into()));
                    }
                    write.send(heartbeat(sequence)).await?;
                    awaiting_ack = true;
                }
            }
        }
    }

    async fn on_dispatch(&self, event: Option<&str>, data: &Value) {
        match event {
            Some("READY") => {
                let user = data
                    .pointer("/user/username")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                info!(user = %user, "Discord session ready");
            }
            Some("MESSAGE_CREATE") => {
                if let Some(message) = parse_message_create(data) {
                    self.bot.handle(message).await;
                }
            }
            _ => {}
        }
    }
}
