//! `SQLite` implementation of [`ActiveSelectionRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::repository::ActiveSelectionRepository;
use crate::types::ActiveSelection;
use crate::RosterError;

/// `SQLite`-backed active-selection repository.
#[derive(Clone)]
pub struct SqliteActiveSelectionRepository {
    pool: SqlitePool,
}

impl SqliteActiveSelectionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SelectionRecord {
    account_id: i64,
    organization_id: i64,
    updated_at: DateTime<Utc>,
}

impl From<SelectionRecord> for ActiveSelection {
    fn from(row: SelectionRecord) -> Self {
        ActiveSelection {
            account_id: row.account_id,
            organization_id: row.organization_id,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ActiveSelectionRepository for SqliteActiveSelectionRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn get(&self, account_id: i64) -> Result<Option<ActiveSelection>, RosterError> {
        let row: Option<SelectionRecord> = sqlx::query_as(
            "SELECT account_id, organization_id, updated_at FROM active_selections WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "roster", "msg=\"database error\", operation=\"get_active_selection\", error=\"{e}\"");
            RosterError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn set(
        &self,
        account_id: i64,
        organization_id: i64,
    ) -> Result<ActiveSelection, RosterError> {
        let now = Utc::now();

        let row: SelectionRecord = sqlx::query_as(
            r"
            INSERT INTO active_selections (account_id, organization_id)
            VALUES (?, ?)
            ON CONFLICT (account_id)
            DO UPDATE SET organization_id = ?, updated_at = ?
            RETURNING account_id, organization_id, updated_at
            ",
        )
        .bind(account_id)
        .bind(organization_id)
        .bind(organization_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "roster", "msg=\"database error\", operation=\"set_active_selection\", error=\"{e}\"");
            RosterError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn clear(&self, account_id: i64) -> Result<(), RosterError> {
        sqlx::query("DELETE FROM active_selections WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "roster", "msg=\"database error\", operation=\"clear_active_selection\", error=\"{e}\"");
                RosterError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }
}
