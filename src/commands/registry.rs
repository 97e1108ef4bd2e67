//! Command registry and dispatch.
//!
//! Unknown commands and commands not offered on the invoking platform are
//! ignored without a reply, since chat channels are shared with ordinary
//! conversation.

use super::{Args, Command, CommandOptions, HelpCommand, PbCommand, QualifyCommand, SetPbCommand};
use crate::config::BotConfig;
use crate::context::{CommandContext, Invocation};
use crate::telemetry::{CommandTimer, spans};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug, error, warn};

/// What happened to a dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Not a command, unknown, or not available on this platform. Nothing was sent.
    Ignored,
    /// The command ran to completion.
    Handled,
    /// The command failed; the error was answered with one reply.
    Failed(&'static str),
}

/// Registry of chat commands.
pub struct Registry {
    prefix: String,
    commands: Vec<Arc<dyn Command>>,
    /// Lowercase name or alias -> index into `commands`.
    lookup: HashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry for commands starting with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Create a registry with every built-in command registered.
    pub fn with_default_commands(config: &BotConfig) -> Self {
        let mut registry = Self::new(config.prefix.clone());
        registry.register(PbCommand);
        registry.register(SetPbCommand);
        registry.register(QualifyCommand::new(config.base_url.clone()));

        let listing = registry.listing();
        registry.register(HelpCommand::new(config.prefix.clone(), listing));
        registry
    }

    /// Register a command under its name and aliases.
    ///
    /// A later registration wins a name collision.
    pub fn register(&mut self, command: impl Command + 'static) {
        let index = self.commands.len();
        let options = command.options();
        for name in std::iter::once(command.name()).chain(options.aliases.iter().copied()) {
            if self.lookup.insert(name.to_ascii_lowercase(), index).is_some() {
                warn!(command = %name, "Command name registered twice");
            }
        }
        self.commands.push(Arc::new(command));
    }

    /// Look up a command by name or alias, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.lookup
            .get(&name.to_ascii_lowercase())
            .map(|&index| &self.commands[index])
    }

    /// Visible commands with the platforms they run on.
    pub fn listing(&self) -> Vec<(&'static str, CommandOptions)> {
        self.commands
            .iter()
            .map(|c| (c.name(), c.options()))
            .filter(|(_, options)| !options.hidden)
            .collect()
    }

    /// Split `text` into a lowercase command name and the raw argument string.
    ///
    /// Returns `None` if the text doesn't start with the prefix or names nothing.
    pub fn parse<'t>(&self, text: &'t str) -> Option<(String, &'t str)> {
        let rest = text.trim_start().strip_prefix(self.prefix.as_str())?;
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        if name.is_empty() {
            return None;
        }
        Some((name.to_lowercase(), args))
    }

    /// Full usage line for a command.
    fn usage_line(&self, command: &dyn Command) -> String {
        let usage = command.options().usage;
        if usage.is_empty() {
            format!("Usage: {}{}", self.prefix, command.name())
        } else {
            format!("Usage: {}{} {}", self.prefix, command.name(), usage)
        }
    }

    /// Route one chat message. Never fails: handler errors become a single reply.
    pub async fn dispatch(&self, ctx: &dyn CommandContext, text: &str) -> Dispatch {
        let Some((name, raw_args)) = self.parse(text) else {
            return Dispatch::Ignored;
        };
        let Some(command) = self.get(&name) else {
            debug!(command = %name, "Ignoring unknown command");
            return Dispatch::Ignored;
        };
        if !command.options().allows(ctx.platform()) {
            debug!(command = %name, platform = %ctx.platform(), "Ignoring command not offered on platform");
            return Dispatch::Ignored;
        }

        let span = spans::command(
            command.name(),
            ctx.platform().as_str(),
            ctx.channel(),
            &ctx.author().username,
        );

        async {
            ctx.log(&Invocation {
                command: &name,
                args: raw_args,
            })
            .await;

            let _timer = CommandTimer::new(command.name());
            let args = Args::parse(raw_args);

            match command.execute(ctx, &args).await {
                Ok(()) => Dispatch::Handled,
                Err(e) => {
                    if e.is_internal() {
                        error!(error = %e, "Command failed");
                    } else {
                        debug!(error = %e, "Command rejected");
                    }
                    let reply = e.reply_text(&self.usage_line(&**command));
                    if let Err(send_err) = ctx.reply(&reply).await {
                        warn!(error = %send_err, "Failed to send error reply");
                    }
                    Dispatch::Failed(e.error_code())
                }
            }
        }
        .instrument(span)
        .await
    }
}
