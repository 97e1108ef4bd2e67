//! PB repository.
//!
//! Scores are an append-only log: nothing is updated or deleted, and the
//! current PB for a category is the newest row in it.

use super::users::resolve_in;
use super::{Account, DbError};
use crate::platform::PlatformUser;
use crate::scores::{ConsoleType, CurrentPbs, DEFAULT_LEVEL, LEVEL_19, PbSubmission};
use sqlx::SqlitePool;
use tracing::info;

/// One PB submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub id: i64,
    pub user_id: i64,
    pub score: i64,
    pub console: ConsoleType,
    pub starting_level: u8,
    pub created_at: i64,
}

type ScoreRow = (i64, i64, i64, String, i64, i64);

fn record_from_row(row: ScoreRow) -> Result<ScoreRecord, DbError> {
    let (id, user_id, score, console, level, created_at) = row;
    let console = console
        .parse::<ConsoleType>()
        .map_err(|_| DbError::Internal(format!("score {id} has unknown console type {console:?}")))?;
    let starting_level = u8::try_from(level)
        .map_err(|_| DbError::Internal(format!("score {id} has invalid level {level}")))?;
    Ok(ScoreRecord {
        id,
        user_id,
        score,
        console,
        starting_level,
        created_at,
    })
}

/// Repository for PB operations.
pub struct ScoreRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ScoreRepository<'a> {
    /// Create a new score repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a PB for an existing account.
    pub async fn add_pb(
        &self,
        user_id: i64,
        score: i64,
        console: ConsoleType,
        starting_level: u8,
    ) -> Result<ScoreRecord, DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO score_pbs (user_id, score, console_type, starting_level, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(score)
        .bind(console.as_str())
        .bind(i64::from(starting_level))
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(ScoreRecord {
            id: result.last_insert_rowid(),
            user_id,
            score,
            console,
            starting_level,
            created_at: now,
        })
    }

    /// Resolve (or create) the submitter's account and append the PB, atomically.
    pub async fn add_pb_for(
        &self,
        submitter: &PlatformUser,
        pb: &PbSubmission,
    ) -> Result<(Account, ScoreRecord), DbError> {
        let mut tx = self.pool.begin().await?;

        let account = resolve_in(&mut tx, submitter).await?;

        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO score_pbs (user_id, score, console_type, starting_level, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id)
        .bind(pb.score)
        .bind(pb.console.as_str())
        .bind(i64::from(pb.level))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            account = account.id,
            score = pb.score,
            console = pb.console.as_str(),
            level = pb.level,
            "PB recorded"
        );

        let record = ScoreRecord {
            id: result.last_insert_rowid(),
            user_id: account.id,
            score: pb.score,
            console: pb.console,
            starting_level: pb.level,
            created_at: now,
        };
        Ok((account, record))
    }

    /// Current PB for one (console, level) category.
    pub async fn get_pb(
        &self,
        user_id: i64,
        console: ConsoleType,
        starting_level: u8,
    ) -> Result<Option<i64>, DbError> {
        let score = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT score FROM score_pbs
            WHERE user_id = ? AND console_type = ? AND starting_level = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(console.as_str())
        .bind(i64::from(starting_level))
        .fetch_optional(self.pool)
        .await?;
        Ok(score)
    }

    /// Current PB in the default category (NTSC, level 18).
    pub async fn get_default_pb(&self, user_id: i64) -> Result<Option<i64>, DbError> {
        self.get_pb(user_id, ConsoleType::Ntsc, DEFAULT_LEVEL).await
    }

    /// The categories a PB report shows.
    pub async fn current_pbs(&self, user_id: i64) -> Result<CurrentPbs, DbError> {
        Ok(CurrentPbs {
            ntsc: self.get_pb(user_id, ConsoleType::Ntsc, DEFAULT_LEVEL).await?,
            ntsc_19: self.get_pb(user_id, ConsoleType::Ntsc, LEVEL_19).await?,
            pal: self.get_pb(user_id, ConsoleType::Pal, DEFAULT_LEVEL).await?,
        })
    }

    /// Every submission for an account, newest first.
    pub async fn history(&self, user_id: i64) -> Result<Vec<ScoreRecord>, DbError> {
        let rows = sqlx::query_as::<_, ScoreRow>(
            r#"
            SELECT id, user_id, score, console_type, starting_level, created_at
            FROM score_pbs
            WHERE user_id = ?
            ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(record_from_row).collect()
    }

    /// Number of submissions across all accounts.
    pub async fn count(&self) -> Result<i64, DbError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM score_pbs")
            .fetch_one(self.pool)
            .await?)
    }
}
