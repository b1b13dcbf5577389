use crate::policy::RoleAction;
use crate::repository::{MembershipRepository, OrganizationRepository, ProfileRepository};
use crate::types::MemberRecord;
use crate::RosterError;

/// Action to list an organization's members with their profiles.
///
/// Any member may list (every role holds `View`); non-members are refused.
pub struct ListMembersAction<O, M, P>
where
    O: OrganizationRepository,
    M: MembershipRepository,
    P: ProfileRepository,
{
    organization_repo: O,
    membership_repo: M,
    profile_repo: P,
}

impl<O, M, P> ListMembersAction<O, M, P>
where
    O: OrganizationRepository,
    M: MembershipRepository,
    P: ProfileRepository,
{
    pub fn new(organization_repo: O, membership_repo: M, profile_repo: P) -> Self {
        Self {
            organization_repo,
            membership_repo,
            profile_repo,
        }
    }

    /// # Returns
    ///
    /// - `Ok(members)` - memberships joined with optional profiles
    /// - `Err(RosterError::NotFound)` - no such organization
    /// - `Err(RosterError::Forbidden)` - actor is not a member
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_members", skip_all, err)
    )]
    pub async fn execute(
        &self,
        organization_id: i64,
        actor: i64,
    ) -> Result<Vec<MemberRecord>, RosterError> {
        self.organization_repo
            .find_by_id(organization_id)
            .await?
            .ok_or(RosterError::NotFound)?;

        let membership = self
            .membership_repo
            .find_by_org_and_account(organization_id, actor)
            .await?
            .ok_or(RosterError::Forbidden)?;

        if !membership.role.can(RoleAction::View) {
            return Err(RosterError::Forbidden);
        }

        let memberships = self
            .membership_repo
            .find_by_organization(organization_id)
            .await?;

        let mut members = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let profile = self
                .profile_repo
                .find_by_account(membership.account_id)
                .await?;
            members.push(MemberRecord {
                membership,
                profile,
            });
        }

        Ok(members)
    }
}
