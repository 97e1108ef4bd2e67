//! Qualifying events.
//!
//! The command layer only reads events to answer "may this account qualify?".

use super::{Account, DbError};
use crate::platform::Platform;
use sqlx::SqlitePool;

/// A tournament qualifying event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub qualifying_open: bool,
}

impl Event {
    /// Public page for this event under `base_url`.
    pub fn absolute_url(&self, base_url: &str) -> String {
        format!("{}/event/{}/", base_url.trim_end_matches('/'), self.slug)
    }
}

/// Why an account may not qualify for an event.
///
/// Checked in declaration order; only the first applicable reason is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    Closed,
    LoggedOut,
    AlreadyQualified,
    LinkTwitch,
    LinkDiscord,
}

impl IneligibleReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::LoggedOut => "logged_out",
            Self::AlreadyQualified => "already_qualified",
            Self::LinkTwitch => "link_twitch",
            Self::LinkDiscord => "link_discord",
        }
    }

    /// User-facing explanation.
    pub fn message(self) -> &'static str {
        match self {
            Self::Closed => "Qualifying is closed for this event.",
            Self::LoggedOut => "You must be logged in to qualify.",
            Self::AlreadyQualified => "You have already qualified for this event.",
            Self::LinkTwitch => "You must link your Twitch account before qualifying.",
            Self::LinkDiscord => "You must link your Discord account before qualifying.",
        }
    }
}

type EventRow = (i64, String, String, bool);

fn event_from_row((id, name, slug, qualifying_open): EventRow) -> Event {
    Event {
        id,
        name,
        slug,
        qualifying_open,
    }
}

/// Repository for event operations.
pub struct EventRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EventRepository<'a> {
    /// Create a new event repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an event.
    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        qualifying_open: bool,
    ) -> Result<Event, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO events (name, slug, qualifying_open)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(qualifying_open)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::EventExists(slug.to_string());
            }
            DbError::from(e)
        })?;

        Ok(Event {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            slug: slug.to_string(),
            qualifying_open,
        })
    }

    /// Find event by slug.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>, DbError> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, name, slug, qualifying_open FROM events WHERE slug = ? COLLATE NOCASE",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(event_from_row))
    }

    /// Open or close qualifying.
    pub async fn set_qualifying_open(&self, event_id: i64, open: bool) -> Result<(), DbError> {
        sqlx::query("UPDATE events SET qualifying_open = ? WHERE id = ?")
            .bind(open)
            .bind(event_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Record a qualifier attempt for an account.
    pub async fn add_qualifier(
        &self,
        event_id: i64,
        user_id: i64,
        submitted: bool,
    ) -> Result<(), DbError> {
        sqlx::query("INSERT INTO qualifiers (event_id, user_id, submitted) VALUES (?, ?, ?)")
            .bind(event_id)
            .bind(user_id)
            .bind(submitted)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// The first reason `user` may not qualify for `event`, or `None` if eligible.
    pub async fn user_ineligible_reason(
        &self,
        event: &Event,
        user: Option<&Account>,
    ) -> Result<Option<IneligibleReason>, DbError> {
        if !event.qualifying_open {
            return Ok(Some(IneligibleReason::Closed));
        }
        let Some(user) = user else {
            return Ok(Some(IneligibleReason::LoggedOut));
        };

        let already_submitted = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM qualifiers
                WHERE event_id = ? AND user_id = ? AND submitted = 1
            )
            "#,
        )
        .bind(event.id)
        .bind(user.id)
        .fetch_one(self.pool)
        .await?;
        if already_submitted {
            return Ok(Some(IneligibleReason::AlreadyQualified));
        }

        if !self.has_identity(user.id, Platform::Twitch).await? {
            return Ok(Some(IneligibleReason::LinkTwitch));
        }
        if !self.has_identity(user.id, Platform::Discord).await? {
            return Ok(Some(IneligibleReason::LinkDiscord));
        }
        Ok(None)
    }

    /// Whether `user` may qualify for `event`.
    pub async fn is_user_eligible(
        &self,
        event: &Event,
        user: Option<&Account>,
    ) -> Result<bool, DbError> {
        Ok(self.user_ineligible_reason(event, user).await?.is_none())
    }

    async fn has_identity(&self, user_id: i64, platform: Platform) -> Result<bool, DbError> {
        let sql = match platform {
            Platform::Discord => "SELECT EXISTS(SELECT 1 FROM discord_users WHERE user_id = ?)",
            Platform::Twitch => "SELECT EXISTS(SELECT 1 FROM twitch_users WHERE user_id = ?)",
        };
        Ok(sqlx::query_scalar::<_, bool>(sql)
            .bind(user_id)
            .fetch_one(self.pool)
            .await?)
    }
}
