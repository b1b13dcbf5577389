use crate::locks::OrgLocks;
use crate::policy::RoleAction;
use crate::repository::MembershipRepository;
use crate::RosterError;

use super::change_role::ensure_not_sole_owner;

/// Input data for removing a member.
#[derive(Debug, Clone)]
pub struct RemoveMemberInput {
    pub organization_id: i64,
    /// The authenticated account performing the removal.
    pub actor: i64,
    /// The account being removed.
    pub target: i64,
}

/// Action to remove a member from an organization.
///
/// Gated by the `RemoveMember` grant (owner or manager) plus the target
/// rules: no self-removal through this path, owners are untouchable, and a
/// manager removes staff only.
pub struct RemoveMemberAction<M>
where
    M: MembershipRepository,
{
    membership_repo: M,
    locks: OrgLocks,
}

impl<M> RemoveMemberAction<M>
where
    M: MembershipRepository,
{
    pub fn new(membership_repo: M, locks: OrgLocks) -> Self {
        Self {
            membership_repo,
            locks,
        }
    }

    /// Removes the target's membership.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - membership deleted
    /// - `Err(RosterError::Forbidden)` - policy or target-rule failure
    /// - `Err(RosterError::NotFound)` - target is not a member
    /// - `Err(RosterError::InvalidTransition(_))` - target holds the
    ///   organization's only ownership
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "remove_member", skip_all, err)
    )]
    pub async fn execute(&self, input: RemoveMemberInput) -> Result<(), RosterError> {
        let _guard = self.locks.acquire(input.organization_id).await;

        let actor_membership = self
            .membership_repo
            .find_by_org_and_account(input.organization_id, input.actor)
            .await?
            .ok_or(RosterError::Forbidden)?;

        if !actor_membership.role.can(RoleAction::RemoveMember) {
            return Err(RosterError::Forbidden);
        }

        if input.actor == input.target {
            return Err(RosterError::Forbidden);
        }

        let target_membership = self
            .membership_repo
            .find_by_org_and_account(input.organization_id, input.target)
            .await?
            .ok_or(RosterError::NotFound)?;

        if !actor_membership.role.can_target(&target_membership.role) {
            return Err(RosterError::Forbidden);
        }

        ensure_not_sole_owner(&self.membership_repo, &target_membership).await?;

        self.membership_repo.delete(target_membership.id).await?;

        log::info!(
            target: "roster",
            "msg=\"member removed\", organization_id={}, target={}, actor={}",
            input.organization_id,
            input.target,
            input.actor
        );

        Ok(())
    }
}
