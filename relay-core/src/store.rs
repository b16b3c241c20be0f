//! Persistence seam for journals and sessions.
//!
//! `JournalStore` is what the relay talks to. `PgJournalStore` is the Postgres
//! implementation; tests swap in an in-memory double.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::RelayError;
use crate::models::{Journal, Session};

/// Result of resolving the journal for a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJournal {
    pub journal: Journal,
    /// True when this call inserted the row, false when it already existed.
    pub created: bool,
}

#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Return the journal for `day`, inserting one with id `candidate` if none
    /// exists. Must be atomic: concurrent callers for the same day all get the
    /// same journal and at most one of them sees `created == true`.
    async fn resolve_journal(
        &self,
        candidate: Uuid,
        day: NaiveDate,
    ) -> Result<ResolvedJournal, RelayError>;

    async fn insert_session(&self, session: &Session) -> Result<(), RelayError>;

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, RelayError>;

    async fn sessions_for_journal(&self, journal_id: Uuid) -> Result<Vec<Session>, RelayError>;
}

#[derive(Debug, Clone)]
pub struct PgJournalStore {
    pool: PgPool,
}

impl PgJournalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl JournalStore for PgJournalStore {
    async fn resolve_journal(
        &self,
        candidate: Uuid,
        day: NaiveDate,
    ) -> Result<ResolvedJournal, RelayError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        // xmax is 0 only for a row this statement inserted.
        let (id, journal_day, created_at, created): (Uuid, NaiveDate, DateTime<Utc>, bool) =
            sqlx::query_as(
                r#"
                INSERT INTO journals (id, journal_day)
                VALUES ($1, $2)
                ON CONFLICT (journal_day) DO UPDATE SET journal_day = EXCLUDED.journal_day
                RETURNING id, journal_day, created_at, (xmax = 0) AS created
                "#,
            )
            .bind(candidate)
            .bind(day)
            .fetch_one(&self.pool)
            .await?;

        Ok(ResolvedJournal {
            journal: Journal {
                id,
                journal_day,
                created_at,
            },
            created,
        })
    }

    async fn insert_session(&self, session: &Session) -> Result<(), RelayError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, journal_id, metadata, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.id)
        .bind(session.journal_id)
        .bind(Json(&session.metadata))
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, RelayError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, journal_id, metadata, created_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn sessions_for_journal(&self, journal_id: Uuid) -> Result<Vec<Session>, RelayError> {
        let sessions = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, journal_id, metadata, created_at
            FROM sessions
            WHERE journal_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(journal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }
}
