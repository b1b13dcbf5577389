use crate::policy::RoleAction;
use crate::repository::{MembershipRepository, OrganizationChanges, OrganizationRepository};
use crate::types::Organization;
use crate::validators::{validate_email, validate_name};
use crate::RosterError;

/// Action to update an organization's profile fields.
///
/// Requires the `EditProfile` grant (owner or manager).
pub struct UpdateOrganizationAction<O, M>
where
    O: OrganizationRepository,
    M: MembershipRepository,
{
    organization_repo: O,
    membership_repo: M,
}

impl<O, M> UpdateOrganizationAction<O, M>
where
    O: OrganizationRepository,
    M: MembershipRepository,
{
    pub fn new(organization_repo: O, membership_repo: M) -> Self {
        Self {
            organization_repo,
            membership_repo,
        }
    }

    /// Applies a partial profile update.
    ///
    /// # Returns
    ///
    /// - `Ok(organization)` - the updated organization
    /// - `Err(RosterError::NotFound)` - no such organization
    /// - `Err(RosterError::Forbidden)` - actor is not a member or holds `staff`
    /// - `Err(RosterError::Validation(_))` - a changed field was rejected
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "update_organization", skip_all, err)
    )]
    pub async fn execute(
        &self,
        organization_id: i64,
        actor: i64,
        changes: OrganizationChanges,
    ) -> Result<Organization, RosterError> {
        self.organization_repo
            .find_by_id(organization_id)
            .await?
            .ok_or(RosterError::NotFound)?;

        let membership = self
            .membership_repo
            .find_by_org_and_account(organization_id, actor)
            .await?
            .ok_or(RosterError::Forbidden)?;

        if !membership.role.can(RoleAction::EditProfile) {
            return Err(RosterError::Forbidden);
        }

        if let Some(name) = changes.name.as_deref() {
            validate_name(name)?;
        }
        if let Some(Some(email)) = changes.email.as_ref() {
            validate_email(email)?;
        }

        let organization = self
            .organization_repo
            .update(organization_id, changes)
            .await?;

        log::info!(
            target: "roster",
            "msg=\"organization updated\", organization_id={organization_id}, actor={actor}"
        );

        Ok(organization)
    }
}
