//! `SQLite` implementation of [`InvitationRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::policy::Role;
use crate::repository::{CreateInvitation, InvitationRepository};
use crate::types::{Invitation, InvitationStatus};
use crate::RosterError;

/// `SQLite`-backed invitation repository.
#[derive(Clone)]
pub struct SqliteInvitationRepository {
    pool: SqlitePool,
}

impl SqliteInvitationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str =
    "id, organization_id, email, role, token_hash, invited_by, status, expires_at, created_at";

#[derive(FromRow)]
struct InvitationRecord {
    id: i64,
    organization_id: i64,
    email: String,
    role: String,
    token_hash: String,
    invited_by: i64,
    status: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InvitationRecord> for Invitation {
    type Error = RosterError;

    fn try_from(row: InvitationRecord) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).ok_or_else(|| {
            RosterError::DatabaseError(format!("unrecognized role {:?}", row.role))
        })?;
        let status = InvitationStatus::from_str(&row.status).ok_or_else(|| {
            RosterError::DatabaseError(format!("unrecognized status {:?}", row.status))
        })?;

        Ok(Invitation {
            id: row.id,
            organization_id: row.organization_id,
            email: row.email,
            role,
            token_hash: row.token_hash,
            invited_by: row.invited_by,
            status,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl InvitationRepository for SqliteInvitationRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateInvitation) -> Result<Invitation, RosterError> {
        let row: InvitationRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO invitations (organization_id, email, role, token_hash, invited_by, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            ",
        ))
        .bind(data.organization_id)
        .bind(&data.email)
        .bind(data.role.as_str())
        .bind(&data.token_hash)
        .bind(data.invited_by)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "roster", "msg=\"database error\", operation=\"create_invitation\", error=\"{e}\"");
            RosterError::DatabaseError(e.to_string())
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Invitation>, RosterError> {
        let row: Option<InvitationRecord> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM invitations WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    log::error!(target: "roster", "msg=\"database error\", operation=\"find_invitation_by_id\", error=\"{e}\"");
                    RosterError::DatabaseError(e.to_string())
                })?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Invitation>, RosterError> {
        let row: Option<InvitationRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM invitations WHERE token_hash = ?",
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "roster", "msg=\"database error\", operation=\"find_invitation_by_token_hash\", error=\"{e}\"");
            RosterError::DatabaseError(e.to_string())
        })?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_organization(
        &self,
        organization_id: i64,
    ) -> Result<Vec<Invitation>, RosterError> {
        let rows: Vec<InvitationRecord> = sqlx::query_as(&format!(
            r"
            SELECT {COLUMNS} FROM invitations
            WHERE organization_id = ?
            ORDER BY created_at DESC, id DESC
            ",
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "roster", "msg=\"database error\", operation=\"find_invitations_by_organization\", error=\"{e}\"");
            RosterError::DatabaseError(e.to_string())
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_status(
        &self,
        id: i64,
        status: InvitationStatus,
    ) -> Result<Invitation, RosterError> {
        let row: InvitationRecord = sqlx::query_as(&format!(
            r"
            UPDATE invitations SET status = ?
            WHERE id = ?
            RETURNING {COLUMNS}
            ",
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RosterError::NotFound,
            _ => {
                log::error!(target: "roster", "msg=\"database error\", operation=\"update_invitation_status\", error=\"{e}\"");
                RosterError::DatabaseError(e.to_string())
            }
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn refresh_token(
        &self,
        id: i64,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Result<Invitation, RosterError> {
        let row: InvitationRecord = sqlx::query_as(&format!(
            r"
            UPDATE invitations SET token_hash = ?, expires_at = ?
            WHERE id = ?
            RETURNING {COLUMNS}
            ",
        ))
        .bind(&token_hash)
        .bind(expires_at)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RosterError::NotFound,
            _ => {
                log::error!(target: "roster", "msg=\"database error\", operation=\"refresh_invitation_token\", error=\"{e}\"");
                RosterError::DatabaseError(e.to_string())
            }
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<u64, RosterError> {
        let result =
            sqlx::query("UPDATE invitations SET status = 'expired' WHERE status = 'pending' AND expires_at < ?")
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    log::error!(target: "roster", "msg=\"database error\", operation=\"expire_lapsed_invitations\", error=\"{e}\"");
                    RosterError::DatabaseError(e.to_string())
                })?;

        Ok(result.rows_affected())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: i64) -> Result<(), RosterError> {
        sqlx::query("DELETE FROM invitations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "roster", "msg=\"database error\", operation=\"delete_invitation\", error=\"{e}\"");
                RosterError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_by_organization(&self, organization_id: i64) -> Result<u64, RosterError> {
        let result = sqlx::query("DELETE FROM invitations WHERE organization_id = ?")
            .bind(organization_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "roster", "msg=\"database error\", operation=\"delete_invitations_by_organization\", error=\"{e}\"");
                RosterError::DatabaseError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }
}
