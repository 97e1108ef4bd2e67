//! Twitch chat connection over IRC.
//!
//! One TCP session joins every configured channel, requests IRCv3 tags so
//! each PRIVMSG carries the sender's `user-id`, and drains the outbound
//! line queue fed by [`TwitchClient`](crate::platform::TwitchClient).

use super::Backoff;
use crate::bot::Bot;
use crate::config::TwitchConfig;
use crate::platform::{InboundMessage, Platform, PlatformUser};
use crate::telemetry::spans;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{Instrument, debug, info, warn};

/// Twitch allows 512 bytes per line, plus tags.
const MAX_LINE_LENGTH: usize = 8192;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] LinesCodecError),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("outbound queue closed")]
    QueueClosed,
}

/// What a session should do after an inbound line.
#[derive(Debug, PartialEq, Eq)]
enum LineAction {
    Continue,
    Reply(String),
    Reconnect,
}

/// If `line` is a PING, the payload to echo back.
pub fn parse_ping(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("PING")?;
    Some(rest.trim_start().trim_start_matches(':'))
}

/// Look up one IRCv3 tag value in a tag string (without the leading `@`).
fn tag<'a>(tags: &'a str, key: &str) -> Option<&'a str> {
    tags.split(';').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (k == key).then_some(v)
    })
}

/// Parse a tagged PRIVMSG into an inbound message.
///
/// Format: `@...;user-id=123;... :login!login@login.tmi.twitch.tv PRIVMSG #channel :text`.
/// Lines without a `user-id` tag can't be tied to an identity and are dropped.
pub fn parse_privmsg(line: &str) -> Option<InboundMessage> {
    let (tags, rest) = match line.strip_prefix('@') {
        Some(tagged) => tagged.split_once(' ')?,
        None => ("", line),
    };

    let rest = rest.strip_prefix(':')?;
    let (prefix, rest) = rest.split_once(' ')?;
    let login = prefix.split('!').next().filter(|l| !l.is_empty())?;

    let rest = rest.strip_prefix("PRIVMSG ")?;
    let (channel, text) = rest.split_once(" :")?;
    let channel = channel.strip_prefix('#')?;

    let user_id = tag(tags, "user-id").filter(|id| !id.is_empty())?;

    Some(InboundMessage {
        author: PlatformUser::new(Platform::Twitch, user_id, login),
        channel: channel.to_string(),
        text: text.to_string(),
    })
}

/// Twitch IRC connection feeding the bot.
pub struct TwitchConnection {
    config: TwitchConfig,
    bot: Arc<Bot>,
    outbound: mpsc::Receiver<String>,
}

impl TwitchConnection {
    /// `outbound` is the queue returned alongside the [`TwitchClient`](crate::platform::TwitchClient).
    pub fn new(config: TwitchConfig, bot: Arc<Bot>, outbound: mpsc::Receiver<String>) -> Self {
        Self {
            config,
            bot,
            outbound,
        }
    }

    /// Run sessions until the outbound queue closes, reconnecting after failures.
    pub async fn run(mut self) {
        let mut backoff = Backoff::new();
        loop {
            match self.session().instrument(spans::connection("twitch")).await {
                Ok(()) => {
                    info!("Twitch session ended; reconnecting");
                    backoff.reset();
                }
                Err(ConnectionError::QueueClosed) => {
                    info!("Twitch client dropped; stopping connection");
                    return;
                }
                Err(e) => warn!(error = %e, "Twitch session failed"),
            }
            tokio::time::sleep(backoff.next_delay()).await;
        }
    }

    fn login_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "CAP REQ :twitch.tv/tags twitch.tv/commands".to_string(),
            format!("PASS {}", self.config.oauth_token),
            format!("NICK {}", self.config.username.to_lowercase()),
        ];
        lines.extend(
            self.config
                .channels
                .iter()
                .map(|c| format!("JOIN #{}", c.trim_start_matches('#').to_lowercase())),
        );
        lines
    }

    async fn session(&mut self) -> Result<(), ConnectionError> {
        let stream = TcpStream::connect(self.config.irc_addr.as_str()).await?;
        let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

        for line in self.login_lines() {
            framed.send(line).await?;
        }
        info!(
            addr = %self.config.irc_addr,
            channels = ?self.config.channels,
            "Connected to Twitch chat"
        );

        let own_login = self.config.username.to_lowercase();

        loop {
            tokio::select! {
                line = framed.next() => {
                    let Some(line) = line else {
                        return Ok(());
                    };
                    let line = line?;
                    match self.on_line(&line, &own_login).await? {
                        LineAction::Continue => {}
                        LineAction::Reply(reply) => framed.send(reply).await?,
                        LineAction::Reconnect => return Ok(()),
                    }
                }

                queued = self.outbound.recv() => {
                    let Some(queued) = queued else {
                        return Err(ConnectionError::QueueClosed);
                    };
                    framed.send(queued).await?;
                }
            }
        }
    }

    async fn on_line(&self, line: &str, own_login: &str) -> Result<LineAction, ConnectionError> {
        if let Some(payload) = parse_ping(line) {
            return Ok(LineAction::Reply(format!("PONG :{}", payload)));
        }

        if let Some(message) = parse_privmsg(line) {
            if message.author.username != own_login {
                self.bot.handle(message).await;
            }
            return Ok(LineAction::Continue);
        }

        let command = line
            .strip_prefix('@')
            .and_then(|l| l.split_once(' '))
            .map_or(line, |(_, rest)| rest)
            .split(' ')
            .nth(1);

        match command {
            Some("RECONNECT") => {
                info!("Twitch requested reconnect");
                Ok(LineAction::Reconnect)
            }
            Some("NOTICE") if line.contains("Login authentication failed") => {
                Err(ConnectionError::Auth(line.to_string()))
            }
            _ => {
                debug!(line = %line, "Ignoring Twitch line");
                Ok(LineAction::Continue)
            }
        }
    }
}
