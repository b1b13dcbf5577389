//! `SQLite` implementation of [`OrganizationRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::repository::{CreateOrganization, OrganizationChanges, OrganizationRepository};
use crate::types::Organization;
use crate::RosterError;

/// `SQLite`-backed organization repository.
#[derive(Clone)]
pub struct SqliteOrganizationRepository {
    pool: SqlitePool,
}

impl SqliteOrganizationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, name, industry, phone_number, email, address, owner_id, created_at, updated_at";

#[derive(FromRow)]
struct OrganizationRecord {
    id: i64,
    name: String,
    industry: String,
    phone_number: String,
    email: Option<String>,
    address: Option<String>,
    owner_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrganizationRecord> for Organization {
    fn from(row: OrganizationRecord) -> Self {
        Organization {
            id: row.id,
            name: row.name,
            industry: row.industry,
            phone_number: row.phone_number,
            email: row.email,
            address: row.address,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl OrganizationRepository for SqliteOrganizationRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateOrganization) -> Result<Organization, RosterError> {
        let row: OrganizationRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO organizations (name, industry, phone_number, email, address, owner_id)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            ",
        ))
        .bind(&data.name)
        .bind(&data.industry)
        .bind(&data.phone_number)
        .bind(&data.email)
        .bind(&data.address)
        .bind(data.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "roster", "msg=\"database error\", operation=\"create_organization\", error=\"{e}\"");
            RosterError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Organization>, RosterError> {
        let row: Option<OrganizationRecord> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM organizations WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    log::error!(target: "roster", "msg=\"database error\", operation=\"find_organization_by_id\", error=\"{e}\"");
                    RosterError::DatabaseError(e.to_string())
                })?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, changes), err))]
    async fn update(
        &self,
        id: i64,
        changes: OrganizationChanges,
    ) -> Result<Organization, RosterError> {
        let existing = self.find_by_id(id).await?.ok_or(RosterError::NotFound)?;

        let name = changes.name.unwrap_or(existing.name);
        let industry = changes.industry.unwrap_or(existing.industry);
        let phone_number = changes.phone_number.unwrap_or(existing.phone_number);
        let email = changes.email.unwrap_or(existing.email);
        let address = changes.address.unwrap_or(existing.address);

        let row: OrganizationRecord = sqlx::query_as(&format!(
            r"
            UPDATE organizations
            SET name = ?, industry = ?, phone_number = ?, email = ?, address = ?, updated_at = ?
            WHERE id = ?
            RETURNING {COLUMNS}
            ",
        ))
        .bind(&name)
        .bind(&industry)
        .bind(&phone_number)
        .bind(&email)
        .bind(&address)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RosterError::NotFound,
            _ => {
                log::error!(target: "roster", "msg=\"database error\", operation=\"update_organization\", error=\"{e}\"");
                RosterError::DatabaseError(e.to_string())
            }
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: i64) -> Result<(), RosterError> {
        sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "roster", "msg=\"database error\", operation=\"delete_organization\", error=\"{e}\"");
                RosterError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }
}
