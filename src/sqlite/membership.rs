//! `SQLite` implementation of [`MembershipRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::policy::Role;
use crate::repository::{CreateMembership, MembershipRepository};
use crate::types::Membership;
use crate::RosterError;

/// `SQLite`-backed membership repository.
///
/// The `UNIQUE (organization_id, account_id)` constraint enforces the
/// one-membership-per-pair invariant; violations surface as
/// [`RosterError::Conflict`].
#[derive(Clone)]
pub struct SqliteMembershipRepository {
    pool: SqlitePool,
}

impl SqliteMembershipRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, organization_id, account_id, role, created_at, updated_at";

#[derive(FromRow)]
struct MembershipRecord {
    id: i64,
    organization_id: i64,
    account_id: i64,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MembershipRecord> for Membership {
    type Error = RosterError;

    fn try_from(row: MembershipRecord) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).ok_or_else(|| {
            RosterError::DatabaseError(format!("unrecognized role {:?}", row.role))
        })?;

        Ok(Membership {
            id: row.id,
            organization_id: row.organization_id,
            account_id: row.account_id,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl MembershipRepository for SqliteMembershipRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateMembership) -> Result<Membership, RosterError> {
        let row: MembershipRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO memberships (organization_id, account_id, role)
            VALUES (?, ?, ?)
            RETURNING {COLUMNS}
            ",
        ))
        .bind(data.organization_id)
        .bind(data.account_id)
        .bind(data.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                return RosterError::Conflict(format!(
                    "account {} is already a member of organization {}",
                    data.account_id, data.organization_id
                ));
            }
            log::error!(target: "roster", "msg=\"database error\", operation=\"create_membership\", error=\"{e}\"");
            RosterError::DatabaseError(e.to_string())
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Membership>, RosterError> {
        let row: Option<MembershipRecord> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM memberships WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    log::error!(target: "roster", "msg=\"database error\", operation=\"find_membership_by_id\", error=\"{e}\"");
                    RosterError::DatabaseError(e.to_string())
                })?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_org_and_account(
        &self,
        organization_id: i64,
        account_id: i64,
    ) -> Result<Option<Membership>, RosterError> {
        let row: Option<MembershipRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM memberships WHERE organization_id = ? AND account_id = ?",
        ))
        .bind(organization_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "roster", "msg=\"database error\", operation=\"find_membership_by_org_and_account\", error=\"{e}\"");
            RosterError::DatabaseError(e.to_string())
        })?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_organization(
        &self,
        organization_id: i64,
    ) -> Result<Vec<Membership>, RosterError> {
        let rows: Vec<MembershipRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM memberships WHERE organization_id = ? ORDER BY id",
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "roster", "msg=\"database error\", operation=\"find_memberships_by_organization\", error=\"{e}\"");
            RosterError::DatabaseError(e.to_string())
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_account(&self, account_id: i64) -> Result<Vec<Membership>, RosterError> {
        let rows: Vec<MembershipRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM memberships WHERE account_id = ? ORDER BY id",
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "roster", "msg=\"database error\", operation=\"find_memberships_by_account\", error=\"{e}\"");
            RosterError::DatabaseError(e.to_string())
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_role(&self, id: i64, role: Role) -> Result<Membership, RosterError> {
        let row: MembershipRecord = sqlx::query_as(&format!(
            r"
            UPDATE memberships SET role = ?, updated_at = ?
            WHERE id = ?
            RETURNING {COLUMNS}
            ",
        ))
        .bind(role.as_str())
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RosterError::NotFound,
            _ => {
                log::error!(target: "roster", "msg=\"database error\", operation=\"update_membership_role\", error=\"{e}\"");
                RosterError::DatabaseError(e.to_string())
            }
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: i64) -> Result<(), RosterError> {
        sqlx::query("DELETE FROM memberships WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "roster", "msg=\"database error\", operation=\"delete_membership\", error=\"{e}\"");
                RosterError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_by_organization(&self, organization_id: i64) -> Result<u64, RosterError> {
        let result = sqlx::query("DELETE FROM memberships WHERE organization_id = ?")
            .bind(organization_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "roster", "msg=\"database error\", operation=\"delete_memberships_by_organization\", error=\"{e}\"");
                RosterError::DatabaseError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }
}
