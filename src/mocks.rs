//! In-memory repository implementations for tests and embedding.

#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::policy::Role;
use crate::repository::{
    ActiveSelectionRepository, CreateInvitation, CreateMembership, CreateOrganization,
    InvitationRepository, MembershipRepository, OrganizationChanges, OrganizationRepository,
    ProfileRepository,
};
use crate::types::{
    AccountProfile, ActiveSelection, Invitation, InvitationStatus, Membership, Organization,
};
use crate::RosterError;

#[derive(Clone, Default)]
pub struct MockOrganizationRepository {
    organizations: Arc<RwLock<HashMap<i64, Organization>>>,
    next_id: Arc<AtomicI64>,
}

impl MockOrganizationRepository {
    pub fn new() -> Self {
        Self {
            organizations: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

#[async_trait]
impl OrganizationRepository for MockOrganizationRepository {
    async fn create(&self, data: CreateOrganization) -> Result<Organization, RosterError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let organization = Organization {
            id,
            name: data.name,
            industry: data.industry,
            phone_number: data.phone_number,
            email: data.email,
            address: data.address,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };

        let mut organizations = self
            .organizations
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        organizations.insert(id, organization.clone());

        Ok(organization)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Organization>, RosterError> {
        let organizations = self
            .organizations
            .read()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        Ok(organizations.get(&id).cloned())
    }

    async fn update(
        &self,
        id: i64,
        changes: OrganizationChanges,
    ) -> Result<Organization, RosterError> {
        let mut organizations = self
            .organizations
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;

        let organization = organizations.get_mut(&id).ok_or(RosterError::NotFound)?;

        if let Some(name) = changes.name {
            organization.name = name;
        }
        if let Some(industry) = changes.industry {
            organization.industry = industry;
        }
        if let Some(phone_number) = changes.phone_number {
            organization.phone_number = phone_number;
        }
        if let Some(email) = changes.email {
            organization.email = email;
        }
        if let Some(address) = changes.address {
            organization.address = address;
        }
        organization.updated_at = Utc::now();

        Ok(organization.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RosterError> {
        let mut organizations = self
            .organizations
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        organizations.remove(&id);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockMembershipRepository {
    memberships: Arc<RwLock<HashMap<i64, Membership>>>,
    next_id: Arc<AtomicI64>,
}

impl MockMembershipRepository {
    pub fn new() -> Self {
        Self {
            memberships: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

#[async_trait]
impl MembershipRepository for MockMembershipRepository {
    async fn create(&self, data: CreateMembership) -> Result<Membership, RosterError> {
        let mut memberships = self
            .memberships
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;

        if memberships
            .values()
            .any(|m| m.organization_id == data.organization_id && m.account_id == data.account_id)
        {
            return Err(RosterError::Conflict(format!(
                "account {} is already a member of organization {}",
                data.account_id, data.organization_id
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let membership = Membership {
            id,
            organization_id: data.organization_id,
            account_id: data.account_id,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        memberships.insert(id, membership.clone());

        Ok(membership)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Membership>, RosterError> {
        let memberships = self
            .memberships
            .read()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        Ok(memberships.get(&id).cloned())
    }

    async fn find_by_org_and_account(
        &self,
        organization_id: i64,
        account_id: i64,
    ) -> Result<Option<Membership>, RosterError> {
        let memberships = self
            .memberships
            .read()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        Ok(memberships
            .values()
            .find(|m| m.organization_id == organization_id && m.account_id == account_id)
            .cloned())
    }

    async fn find_by_organization(
        &self,
        organization_id: i64,
    ) -> Result<Vec<Membership>, RosterError> {
        let memberships = self
            .memberships
            .read()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        let mut rows: Vec<Membership> = memberships
            .values()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.id);
        Ok(rows)
    }

    async fn find_by_account(&self, account_id: i64) -> Result<Vec<Membership>, RosterError> {
        let memberships = self
            .memberships
            .read()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        let mut rows: Vec<Membership> = memberships
            .values()
            .filter(|m| m.account_id == account_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.id);
        Ok(rows)
    }

    async fn update_role(&self, id: i64, role: Role) -> Result<Membership, RosterError> {
        let mut memberships = self
            .memberships
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;

        let membership = memberships.get_mut(&id).ok_or(RosterError::NotFound)?;
        membership.role = role;
        membership.updated_at = Utc::now();

        Ok(membership.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RosterError> {
        let mut memberships = self
            .memberships
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        memberships.remove(&id);
        Ok(())
    }

    async fn delete_by_organization(&self, organization_id: i64) -> Result<u64, RosterError> {
        let mut memberships = self
            .memberships
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        let before = memberships.len();
        memberships.retain(|_, m| m.organization_id != organization_id);
        Ok((before - memberships.len()) as u64)
    }
}

#[derive(Clone, Default)]
pub struct MockInvitationRepository {
    invitations: Arc<RwLock<HashMap<i64, Invitation>>>,
    next_id: Arc<AtomicI64>,
}

impl MockInvitationRepository {
    pub fn new() -> Self {
        Self {
            invitations: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

#[async_trait]
impl InvitationRepository for MockInvitationRepository {
    async fn create(&self, data: CreateInvitation) -> Result<Invitation, RosterError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let invitation = Invitation {
            id,
            organization_id: data.organization_id,
            email: data.email,
            role: data.role,
            token_hash: data.token_hash,
            invited_by: data.invited_by,
            status: InvitationStatus::Pending,
            expires_at: data.expires_at,
            created_at: Utc::now(),
        };

        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        invitations.insert(id, invitation.clone());

        Ok(invitation)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Invitation>, RosterError> {
        let invitations = self
            .invitations
            .read()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        Ok(invitations.get(&id).cloned())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Invitation>, RosterError> {
        let invitations = self
            .invitations
            .read()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        Ok(invitations
            .values()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn find_by_organization(
        &self,
        organization_id: i64,
    ) -> Result<Vec<Invitation>, RosterError> {
        let invitations = self
            .invitations
            .read()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        let mut rows: Vec<Invitation> = invitations
            .values()
            .filter(|i| i.organization_id == organization_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn update_status(
        &self,
        id: i64,
        status: InvitationStatus,
    ) -> Result<Invitation, RosterError> {
        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;

        let invitation = invitations.get_mut(&id).ok_or(RosterError::NotFound)?;
        invitation.status = status;

        Ok(invitation.clone())
    }

    async fn refresh_token(
        &self,
        id: i64,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Result<Invitation, RosterError> {
        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;

        let invitation = invitations.get_mut(&id).ok_or(RosterError::NotFound)?;
        invitation.token_hash = token_hash;
        invitation.expires_at = expires_at;

        Ok(invitation.clone())
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<u64, RosterError> {
        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;

        let mut touched = 0;
        for invitation in invitations.values_mut() {
            if invitation.status == InvitationStatus::Pending && invitation.expires_at < now {
                invitation.status = InvitationStatus::Expired;
                touched += 1;
            }
        }

        Ok(touched)
    }

    async fn delete(&self, id: i64) -> Result<(), RosterError> {
        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        invitations.remove(&id);
        Ok(())
    }

    async fn delete_by_organization(&self, organization_id: i64) -> Result<u64, RosterError> {
        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        let before = invitations.len();
        invitations.retain(|_, i| i.organization_id != organization_id);
        Ok((before - invitations.len()) as u64)
    }
}

#[derive(Clone, Default)]
pub struct MockActiveSelectionRepository {
    selections: Arc<RwLock<HashMap<i64, ActiveSelection>>>,
}

impl MockActiveSelectionRepository {
    pub fn new() -> Self {
        Self {
            selections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl ActiveSelectionRepository for MockActiveSelectionRepository {
    async fn get(&self, account_id: i64) -> Result<Option<ActiveSelection>, RosterError> {
        let selections = self
            .selections
            .read()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        Ok(selections.get(&account_id).cloned())
    }

    async fn set(
        &self,
        account_id: i64,
        organization_id: i64,
    ) -> Result<ActiveSelection, RosterError> {
        let mut selections = self
            .selections
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        let selection = ActiveSelection {
            account_id,
            organization_id,
            updated_at: Utc::now(),
        };
        selections.insert(account_id, selection.clone());
        Ok(selection)
    }

    async fn clear(&self, account_id: i64) -> Result<(), RosterError> {
        let mut selections = self
            .selections
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        selections.remove(&account_id);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockProfileRepository {
    pub profiles: Arc<RwLock<HashMap<i64, AccountProfile>>>,
}

impl MockProfileRepository {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a profile, replacing any existing one for the account.
    pub fn insert(&self, profile: AccountProfile) {
        let mut profiles = self.profiles.write().unwrap_or_else(|e| e.into_inner());
        profiles.insert(profile.account_id, profile);
    }
}

#[async_trait]
impl ProfileRepository for MockProfileRepository {
    async fn find_by_account(
        &self,
        account_id: i64,
    ) -> Result<Option<AccountProfile>, RosterError> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        Ok(profiles.get(&account_id).cloned())
    }
}
