//! Client-side session cache for the active organization.
//!
//! The cache is a possibly-stale mirror of "which organizations does this
//! account belong to, and which one is it operating in". It is never
//! authoritative: every [`SessionCache::refresh`] replaces the cached list
//! wholesale from the membership directory and re-validates the active
//! selection against it. The selection itself survives restarts through an
//! [`ActiveSelectionRepository`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::repository::{ActiveSelectionRepository, MembershipRepository, OrganizationRepository};
use crate::types::OrganizationWithRole;
use crate::RosterError;

use crate::actions::ListOrganizationsAction;

#[derive(Default)]
struct CacheState {
    organizations: Vec<OrganizationWithRole>,
    active: Option<i64>,
    /// False until the first refresh completes.
    fetched: bool,
}

/// Per-account cache of organizations-with-role and the active selection.
///
/// Single-consumer: one instance serves one signed-in account. Concurrent
/// refreshes are allowed and resolve last-write-wins, which is fine for
/// read-mostly data that the next refresh corrects anyway.
pub struct SessionCache<M, O, S>
where
    M: MembershipRepository,
    O: OrganizationRepository,
    S: ActiveSelectionRepository,
{
    account_id: i64,
    list_action: ListOrganizationsAction<M, O>,
    selection_repo: S,
    state: RwLock<CacheState>,
    loading: AtomicBool,
}

impl<M, O, S> SessionCache<M, O, S>
where
    M: MembershipRepository,
    O: OrganizationRepository,
    S: ActiveSelectionRepository,
{
    pub fn new(account_id: i64, membership_repo: M, organization_repo: O, selection_repo: S) -> Self {
        Self {
            account_id,
            list_action: ListOrganizationsAction::new(membership_repo, organization_repo),
            selection_repo,
            state: RwLock::new(CacheState::default()),
            loading: AtomicBool::new(false),
        }
    }

    /// Re-fetch the organization list and reconcile the active selection.
    ///
    /// The previous in-memory selection wins if the new list still contains
    /// it; otherwise the persisted selection is tried; otherwise the first
    /// entry of the new list (or none, if the list is empty). Whenever
    /// reconciliation lands somewhere new, the persisted selection follows.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn refresh(&self) -> Result<Vec<OrganizationWithRole>, RosterError> {
        self.loading.store(true, Ordering::SeqCst);
        let result = self.refresh_inner().await;
        self.loading.store(false, Ordering::SeqCst);
        result
    }

    async fn refresh_inner(&self) -> Result<Vec<OrganizationWithRole>, RosterError> {
        let organizations = self.list_action.execute(self.account_id).await?;

        let current = {
            let state = self
                .state
                .read()
                .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
            if state.fetched {
                state.active
            } else {
                None
            }
        };

        let persisted = self
            .selection_repo
            .get(self.account_id)
            .await?
            .map(|s| s.organization_id);

        let listed = |id: &i64| organizations.iter().any(|o| o.organization.id == *id);
        let active = current
            .filter(listed)
            .or_else(|| persisted.filter(listed))
            .or_else(|| organizations.first().map(|o| o.organization.id));

        match active {
            Some(id) if persisted != Some(id) => {
                self.selection_repo.set(self.account_id, id).await?;
            }
            None if persisted.is_some() => {
                self.selection_repo.clear(self.account_id).await?;
            }
            _ => {}
        }

        {
            let mut state = self
                .state
                .write()
                .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
            state.organizations = organizations.clone();
            state.active = active;
            state.fetched = true;
        }

        log::debug!(
            target: "roster",
            "msg=\"session cache refreshed\", account={}, organizations={}, active={:?}",
            self.account_id,
            organizations.len(),
            active
        );

        Ok(organizations)
    }

    /// Switch the active organization.
    ///
    /// Ignored (returns `false`) unless the organization is in the cached
    /// list; the UI is expected to only offer listed choices, but the cache
    /// does not trust it.
    pub async fn set_active(&self, organization_id: i64) -> Result<bool, RosterError> {
        {
            let state = self
                .state
                .read()
                .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
            if !state
                .organizations
                .iter()
                .any(|o| o.organization.id == organization_id)
            {
                return Ok(false);
            }
        }

        self.selection_repo.set(self.account_id, organization_id).await?;

        let mut state = self
            .state
            .write()
            .map_err(|_| RosterError::Internal("lock poisoned".into()))?;
        state.active = Some(organization_id);

        Ok(true)
    }

    /// The active organization, or `None` before the first refresh or when
    /// the account belongs to no organization.
    pub fn active(&self) -> Option<OrganizationWithRole> {
        let state = self.state.read().ok()?;
        let id = state.active?;
        state
            .organizations
            .iter()
            .find(|o| o.organization.id == id)
            .cloned()
    }

    /// Snapshot of the cached organization list.
    pub fn organizations(&self) -> Vec<OrganizationWithRole> {
        self.state
            .read()
            .map(|state| state.organizations.clone())
            .unwrap_or_default()
    }

    /// True while a refresh is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Drop the cached list and in-memory selection (sign-out path).
    ///
    /// The persisted selection row is left alone; the next session's first
    /// refresh reconciles against it.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.write() {
            *state = CacheState::default();
        }
    }
}
