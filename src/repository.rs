//! Storage boundaries.
//!
//! Each trait is implemented once per backend (`mocks`, `sqlite`, or an
//! application's own store). The actions in [`crate::actions`] are generic
//! over these traits and never touch a backend directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::policy::Role;
use crate::types::{
    AccountProfile, ActiveSelection, Invitation, InvitationStatus, Membership, Organization,
};
use crate::RosterError;

#[derive(Debug, Clone)]
pub struct CreateOrganization {
    pub name: String,
    pub industry: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub owner_id: i64,
}

/// Partial update for an organization's profile. `None` leaves a field as-is.
#[derive(Debug, Clone, Default)]
pub struct OrganizationChanges {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub organization_id: i64,
    pub account_id: i64,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub organization_id: i64,
    pub email: String,
    pub role: Role,
    pub token_hash: String,
    pub invited_by: i64,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create(&self, data: CreateOrganization) -> Result<Organization, RosterError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Organization>, RosterError>;
    async fn update(
        &self,
        id: i64,
        changes: OrganizationChanges,
    ) -> Result<Organization, RosterError>;
    async fn delete(&self, id: i64) -> Result<(), RosterError>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Fails with [`RosterError::Conflict`] if a membership already exists
    /// for the (organization, account) pair.
    async fn create(&self, data: CreateMembership) -> Result<Membership, RosterError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Membership>, RosterError>;
    async fn find_by_org_and_account(
        &self,
        organization_id: i64,
        account_id: i64,
    ) -> Result<Option<Membership>, RosterError>;
    async fn find_by_organization(
        &self,
        organization_id: i64,
    ) -> Result<Vec<Membership>, RosterError>;
    /// Stable across repeated calls absent mutation (membership creation order).
    async fn find_by_account(&self, account_id: i64) -> Result<Vec<Membership>, RosterError>;
    async fn update_role(&self, id: i64, role: Role) -> Result<Membership, RosterError>;
    async fn delete(&self, id: i64) -> Result<(), RosterError>;
    async fn delete_by_organization(&self, organization_id: i64) -> Result<u64, RosterError>;
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn create(&self, data: CreateInvitation) -> Result<Invitation, RosterError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Invitation>, RosterError>;
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Invitation>, RosterError>;
    /// Every invitation for the organization, newest first.
    async fn find_by_organization(
        &self,
        organization_id: i64,
    ) -> Result<Vec<Invitation>, RosterError>;
    async fn update_status(
        &self,
        id: i64,
        status: InvitationStatus,
    ) -> Result<Invitation, RosterError>;
    /// Replace the token hash and deadline of an invitation (resend).
    async fn refresh_token(
        &self,
        id: i64,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Result<Invitation, RosterError>;
    /// Persist `Expired` onto every stored-`Pending` invitation whose
    /// deadline is before `now`. Returns the number of rows touched.
    async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<u64, RosterError>;
    async fn delete(&self, id: i64) -> Result<(), RosterError>;
    async fn delete_by_organization(&self, organization_id: i64) -> Result<u64, RosterError>;
}

/// Persists each account's active-organization pointer across sessions.
#[async_trait]
pub trait ActiveSelectionRepository: Send + Sync {
    async fn get(&self, account_id: i64) -> Result<Option<ActiveSelection>, RosterError>;
    async fn set(
        &self,
        account_id: i64,
        organization_id: i64,
    ) -> Result<ActiveSelection, RosterError>;
    async fn clear(&self, account_id: i64) -> Result<(), RosterError>;
}

/// Read-only view into the external identity system's account profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_account(
        &self,
        account_id: i64,
    ) -> Result<Option<AccountProfile>, RosterError>;
}
