//! Command error taxonomy.
//!
//! Handlers return [`CommandError`]; the registry turns each error into a
//! single chat reply so nothing escapes message processing.

use crate::db::{DbError, IneligibleReason};
use crate::platform::ClientError;
use thiserror::Error;

/// Reply used when a command fails for reasons the user can't act on.
pub const INTERNAL_ERROR_REPLY: &str = "Something went wrong.";

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required argument missing or malformed; answered with the command's usage line.
    #[error("usage")]
    Usage,

    /// Argument out of range or unparseable; the message is the literal reply.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced user or record doesn't exist; the message is the literal reply.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("ineligible: {}", .0.as_str())]
    Ineligible(IneligibleReason),

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("platform client error: {0}")]
    Client(#[from] ClientError),
}

impl CommandError {
    /// Get a static error code string for logging.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Usage => "usage",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::Ineligible(_) => "ineligible",
            Self::Db(_) => "db_error",
            Self::Client(_) => "client_error",
        }
    }

    /// The chat reply for this error.
    ///
    /// `usage` is the full usage line (e.g. `Usage: !setpb <score>`), which
    /// only the registry knows since it owns the prefix.
    pub fn reply_text(&self, usage: &str) -> String {
        match self {
            Self::Usage => usage.to_string(),
            Self::InvalidArgument(message) | Self::NotFound(message) => message.clone(),
            Self::Ineligible(reason) => reason.message().to_string(),
            Self::Db(_) | Self::Client(_) => INTERNAL_ERROR_REPLY.to_string(),
        }
    }

    /// Whether this error indicates a fault rather than bad user input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Db(_) | Self::Client(_))
    }
}

/// Result type for command handlers.
pub type CommandResult = Result<(), CommandError>;
