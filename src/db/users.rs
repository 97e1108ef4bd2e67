//! Account and platform identity repository.
//!
//! An account is created lazily the first time one of its identities is
//! seen. Identities are keyed on the platform-native id; the stored username
//! follows whatever the platform last reported.

use super::DbError;
use crate::platform::{Platform, PlatformUser};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

/// A unified cross-platform account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub created_at: i64,
}

/// A stored platform identity, linked to exactly one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub platform: Platform,
    pub platform_id: String,
    pub username: String,
    pub user_id: i64,
}

fn identity_table(platform: Platform) -> &'static str {
    match platform {
        Platform::Discord => "discord_users",
        Platform::Twitch => "twitch_users",
    }
}

/// Username comparison per platform: Discord names are matched exactly,
/// Twitch logins are case-insensitive.
fn username_collation(platform: Platform) -> &'static str {
    match platform {
        Platform::Discord => "",
        Platform::Twitch => " COLLATE NOCASE",
    }
}

/// Repository for account and identity operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an account with no linked identities.
    pub async fn create(&self) -> Result<Account, DbError> {
        let mut conn = self.pool.acquire().await?;
        insert_account(&mut conn).await
    }

    /// Number of accounts.
    pub async fn count(&self) -> Result<i64, DbError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?)
    }

    /// Find an identity by platform-native id.
    pub async fn find_identity(
        &self,
        platform: Platform,
        platform_id: &str,
    ) -> Result<Option<Identity>, DbError> {
        let mut conn = self.pool.acquire().await?;
        find_identity_in(&mut conn, platform, platform_id).await
    }

    /// Find an identity on `platform` by username.
    pub async fn find_by_username(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<Option<Identity>, DbError> {
        let sql = format!(
            "SELECT platform_id, username, user_id FROM {} WHERE username = ?{} ORDER BY id LIMIT 1",
            identity_table(platform),
            username_collation(platform)
        );
        let row = sqlx::query_as::<_, (String, String, i64)>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(|(platform_id, username, user_id)| Identity {
            platform,
            platform_id,
            username,
            user_id,
        }))
    }

    /// Search every platform for an identity with this username.
    ///
    /// Platforms are tried in [`Platform::PRIORITY`] order and the first hit
    /// wins. A single leading `@` is ignored. Never creates records.
    pub async fn any_platform_user_from_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, DbError> {
        let username = username.trim();
        let username = username.strip_prefix('@').unwrap_or(username);
        if username.is_empty() {
            return Ok(None);
        }

        for platform in Platform::PRIORITY {
            if let Some(identity) = self.find_by_username(platform, username).await? {
                return Ok(Some(identity));
            }
        }
        Ok(None)
    }

    /// Return the account behind `user`, creating the identity and account on first contact.
    ///
    /// Idempotent per platform identity; runs in one transaction.
    pub async fn resolve(&self, user: &PlatformUser) -> Result<Account, DbError> {
        let mut tx = self.pool.begin().await?;
        let account = resolve_in(&mut tx, user).await?;
        tx.commit().await?;
        Ok(account)
    }
}

async fn insert_account(conn: &mut SqliteConnection) -> Result<Account, DbError> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query("INSERT INTO users (created_at) VALUES (?)")
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(Account {
        id: result.last_insert_rowid(),
        created_at: now,
    })
}

async fn find_identity_in(
    conn: &mut SqliteConnection,
    platform: Platform,
    platform_id: &str,
) -> Result<Option<Identity>, DbError> {
    let sql = format!(
        "SELECT platform_id, username, user_id FROM {} WHERE platform_id = ?",
        identity_table(platform)
    );
    let row = sqlx::query_as::<_, (String, String, i64)>(&sql)
        .bind(platform_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|(platform_id, username, user_id)| Identity {
        platform,
        platform_id,
        username,
        user_id,
    }))
}

/// Resolve-or-create on an open connection, so callers can fold it into a
/// larger transaction.
pub(super) async fn resolve_in(
    conn: &mut SqliteConnection,
    user: &PlatformUser,
) -> Result<Account, DbError> {
    let table = identity_table(user.platform);

    if let Some(identity) = find_identity_in(conn, user.platform, &user.platform_id).await? {
        if identity.username != user.username {
            let sql = format!("UPDATE {} SET username = ? WHERE platform_id = ?", table);
            sqlx::query(&sql)
                .bind(&user.username)
                .bind(&user.platform_id)
                .execute(&mut *conn)
                .await?;
            debug!(
                platform = %user.platform,
                old = %identity.username,
                new = %user.username,
                "Identity username updated"
            );
        }

        let row = sqlx::query_as::<_, (i64, i64)>("SELECT id, created_at FROM users WHERE id = ?")
            .bind(identity.user_id)
            .fetch_optional(&mut *conn)
            .await?;
        return row
            .map(|(id, created_at)| Account { id, created_at })
            .ok_or_else(|| {
                DbError::Internal(format!(
                    "{} identity {} points at missing account {}",
                    user.platform, user.platform_id, identity.user_id
                ))
            });
    }

    let account = insert_account(conn).await?;
    let sql = format!(
        "INSERT INTO {} (platform_id, username, user_id) VALUES (?, ?, ?)",
        table
    );
    sqlx::query(&sql)
        .bind(&user.platform_id)
        .bind(&user.username)
        .bind(account.id)
        .execute(&mut *conn)
        .await?;

    info!(
        platform = %user.platform,
        platform_id = %user.platform_id,
        username = %user.username,
        account = account.id,
        "Account created for new identity"
    );
    Ok(account)
}

/// Link an identity to an existing account.
#[cfg(test)]
pub(crate) async fn link_identity(
    pool: &SqlitePool,
    user: &PlatformUser,
    account: &Account,
) -> Result<(), DbError> {
    let sql = format!(
        "INSERT INTO {} (platform_id, username, user_id) VALUES (?, ?, ?)",
        identity_table(user.platform)
    );
    sqlx::query(&sql)
        .bind(&user.platform_id)
        .bind(&user.username)
        .bind(account.id)
        .execute(pool)
        .await?;
    Ok(())
}
