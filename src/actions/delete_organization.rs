use crate::locks::OrgLocks;
use crate::policy::RoleAction;
use crate::repository::{InvitationRepository, MembershipRepository, OrganizationRepository};
use crate::RosterError;

/// Action to delete an organization and everything attached to it.
///
/// Owner-only. Memberships and invitations are removed first, then the
/// organization row; the whole cascade runs under the organization's lock
/// and is not reversible.
pub struct DeleteOrganizationAction<O, M, I>
where
    O: OrganizationRepository,
    M: MembershipRepository,
    I: InvitationRepository,
{
    organization_repo: O,
    membership_repo: M,
    invitation_repo: I,
    locks: OrgLocks,
}

impl<O, M, I> DeleteOrganizationAction<O, M, I>
where
    O: OrganizationRepository,
    M: MembershipRepository,
    I: InvitationRepository,
{
    pub fn new(organization_repo: O, membership_repo: M, invitation_repo: I, locks: OrgLocks) -> Self {
        Self {
            organization_repo,
            membership_repo,
            invitation_repo,
            locks,
        }
    }

    /// Deletes the organization with its memberships and invitations.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - deleted
    /// - `Err(RosterError::NotFound)` - no such organization
    /// - `Err(RosterError::Forbidden)` - actor is not the owner
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "delete_organization", skip_all, err)
    )]
    pub async fn execute(&self, organization_id: i64, actor: i64) -> Result<(), RosterError> {
        let _guard = self.locks.acquire(organization_id).await;

        self.organization_repo
            .find_by_id(organization_id)
            .await?
            .ok_or(RosterError::NotFound)?;

        let membership = self
            .membership_repo
            .find_by_org_and_account(organization_id, actor)
            .await?
            .ok_or(RosterError::Forbidden)?;

        if !membership.role.can(RoleAction::DeleteOrganization) {
            return Err(RosterError::Forbidden);
        }

        let memberships = self
            .membership_repo
            .delete_by_organization(organization_id)
            .await?;
        let invitations = self
            .invitation_repo
            .delete_by_organization(organization_id)
            .await?;
        self.organization_repo.delete(organization_id).await?;

        self.locks.release(organization_id);

        log::info!(
            target: "roster",
            "msg=\"organization deleted\", organization_id={organization_id}, actor={actor}, memberships={memberships}, invitations={invitations}"
        );

        Ok(())
    }
}
