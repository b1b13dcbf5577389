use crate::repository::{MembershipRepository, OrganizationRepository};
use crate::types::OrganizationWithRole;
use crate::RosterError;

/// Action to list every organization an account belongs to, with the
/// account's own role in each.
///
/// Ordered by membership creation; the order is stable across calls absent
/// mutation. Memberships whose organization row has vanished mid-read are
/// skipped rather than failing the listing.
pub struct ListOrganizationsAction<M, O>
where
    M: MembershipRepository,
    O: OrganizationRepository,
{
    membership_repo: M,
    organization_repo: O,
}

impl<M, O> ListOrganizationsAction<M, O>
where
    M: MembershipRepository,
    O: OrganizationRepository,
{
    pub fn new(membership_repo: M, organization_repo: O) -> Self {
        Self {
            membership_repo,
            organization_repo,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_organizations", skip_all, err)
    )]
    pub async fn execute(&self, account_id: i64) -> Result<Vec<OrganizationWithRole>, RosterError> {
        let memberships = self.membership_repo.find_by_account(account_id).await?;

        let mut entries = Vec::with_capacity(memberships.len());
        for membership in memberships {
            if let Some(organization) = self
                .organization_repo
                .find_by_id(membership.organization_id)
                .await?
            {
                entries.push(OrganizationWithRole {
                    organization,
                    role: membership.role,
                });
            }
        }

        Ok(entries)
    }
}
