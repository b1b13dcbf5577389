use crate::locks::OrgLocks;
use crate::policy::{Role, RoleAction};
use crate::repository::MembershipRepository;
use crate::types::Membership;
use crate::RosterError;

/// Input data for changing a member's role.
#[derive(Debug, Clone)]
pub struct ChangeRoleInput {
    pub organization_id: i64,
    /// The authenticated account performing the change.
    pub actor: i64,
    /// The account whose membership is changed.
    pub target: i64,
    pub new_role: Role,
}

/// Action to change a member's role.
///
/// Gated by the `ChangeRole` grant (owner only) plus the target rules: an
/// actor never changes their own role, never touches an owner, and must
/// outrank the target. Ownership is not transferable through this path, so
/// `new_role` may not be `Owner`.
pub struct ChangeRoleAction<M>
where
    M: MembershipRepository,
{
    membership_repo: M,
    locks: OrgLocks,
}

impl<M> ChangeRoleAction<M>
where
    M: MembershipRepository,
{
    pub fn new(membership_repo: M, locks: OrgLocks) -> Self {
        Self {
            membership_repo,
            locks,
        }
    }

    /// Changes the target's role within the organization.
    ///
    /// # Returns
    ///
    /// - `Ok(membership)` - the updated membership
    /// - `Err(RosterError::Forbidden)` - policy or target-rule failure
    /// - `Err(RosterError::NotFound)` - target is not a member
    /// - `Err(RosterError::InvalidTransition(_))` - new role is `owner`, or
    ///   the target holds the organization's only ownership
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "change_role", skip_all, err)
    )]
    pub async fn execute(&self, input: ChangeRoleInput) -> Result<Membership, RosterError> {
        let _guard = self.locks.acquire(input.organization_id).await;

        let actor_membership = self
            .membership_repo
            .find_by_org_and_account(input.organization_id, input.actor)
            .await?
            .ok_or(RosterError::Forbidden)?;

        if !actor_membership.role.can(RoleAction::ChangeRole) {
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

        if input.new_role == Role::Owner {
            return Err(RosterError::InvalidTransition(
                "ownership cannot be assigned through a role change".into(),
            ));
        }

        ensure_not_sole_owner(&self.membership_repo, &target_membership).await?;

        let membership = self
            .membership_repo
            .update_role(target_membership.id, input.new_role)
            .await?;

        log::info!(
            target: "roster",
            "msg=\"role changed\", organization_id={}, target={}, role={}, actor={}",
            input.organization_id,
            input.target,
            input.new_role,
            input.actor
        );

        Ok(membership)
    }
}

/// Refuse the mutation if `target` holds the organization's only `owner`
/// membership.
pub(super) async fn ensure_not_sole_owner<M: MembershipRepository>(
    membership_repo: &M,
    target: &Membership,
) -> Result<(), RosterError> {
    if target.role != Role::Owner {
        return Ok(());
    }

    let owners = membership_repo
        .find_by_organization(target.organization_id)
        .await?
        .iter()
        .filter(|m| m.role == Role::Owner)
        .count();

    if owners <= 1 {
        return Err(RosterError::InvalidTransition(
            "an organization must keep an owner".into(),
        ));
    }

    Ok(())
}
