use chrono::Utc;

use crate::policy::RoleAction;
use crate::repository::{InvitationRepository, MembershipRepository};
use crate::types::{Invitation, InvitationStatus};
use crate::RosterError;

/// Action to list an organization's invitations, optionally filtered by
/// status.
///
/// Requires the `InviteMember` grant. The filter compares against the
/// *effective* status, so a lapsed pending invitation matches `Expired` and
/// never `Pending`, whether or not a sweep has run.
pub struct ListInvitationsAction<M, I>
where
    M: MembershipRepository,
    I: InvitationRepository,
{
    membership_repo: M,
    invitation_repo: I,
}

impl<M, I> ListInvitationsAction<M, I>
where
    M: MembershipRepository,
    I: InvitationRepository,
{
    pub fn new(membership_repo: M, invitation_repo: I) -> Self {
        Self {
            membership_repo,
            invitation_repo,
        }
    }

    /// # Returns
    ///
    /// - `Ok(invitations)` - newest first; token hashes never serialize
    /// - `Err(RosterError::Forbidden)` - actor lacks `InviteMember`
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_invitations", skip_all, err)
    )]
    pub async fn execute(
        &self,
        organization_id: i64,
        status: Option<InvitationStatus>,
        actor: i64,
    ) -> Result<Vec<Invitation>, RosterError> {
        let membership = self
            .membership_repo
            .find_by_org_and_account(organization_id, actor)
            .await?
            .ok_or(RosterError::Forbidden)?;

        if !membership.role.can(RoleAction::InviteMember) {
            return Err(RosterError::Forbidden);
        }

        let invitations = self
            .invitation_repo
            .find_by_organization(organization_id)
            .await?;

        let now = Utc::now();
        Ok(match status {
            Some(wanted) => invitations
                .into_iter()
                .filter(|i| i.effective_status(now) == wanted)
                .collect(),
            None => invitations,
        })
    }
}
