use crate::policy::Role;
use crate::repository::{
    CreateMembership, CreateOrganization, MembershipRepository, OrganizationRepository,
};
use crate::types::{Membership, Organization};
use crate::validators::{validate_email, validate_name};
use crate::RosterError;

/// Input data for creating an organization.
#[derive(Debug, Clone)]
pub struct CreateOrganizationInput {
    pub name: String,
    pub industry: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub address: Option<String>,
    /// The authenticated account creating the organization. Becomes the owner.
    pub creator: i64,
}

/// Output from creating an organization.
#[derive(Debug)]
pub struct CreateOrganizationOutput {
    pub organization: Organization,
    /// The creator's `owner` membership.
    pub membership: Membership,
}

/// Action to create an organization with its initial owner membership.
///
/// Every organization starts with exactly one `owner` membership, held by
/// the creator; that invariant is established here and defended by
/// [`super::ChangeRoleAction`] and [`super::RemoveMemberAction`] afterwards.
pub struct CreateOrganizationAction<O, M>
where
    O: OrganizationRepository,
    M: MembershipRepository,
{
    organization_repo: O,
    membership_repo: M,
}

impl<O, M> CreateOrganizationAction<O, M>
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

    /// Creates the organization and the creator's owner membership.
    ///
    /// # Returns
    ///
    /// - `Ok(output)` - the organization and its owner membership
    /// - `Err(RosterError::Validation(_))` - name or email rejected
    /// - `Err(_)` - storage errors
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_organization", skip_all, err)
    )]
    pub async fn execute(
        &self,
        input: CreateOrganizationInput,
    ) -> Result<CreateOrganizationOutput, RosterError> {
        validate_name(&input.name)?;
        if let Some(email) = input.email.as_deref() {
            validate_email(email)?;
        }

        let organization = self
            .organization_repo
            .create(CreateOrganization {
                name: input.name,
                industry: input.industry,
                phone_number: input.phone_number,
                email: input.email,
                address: input.address,
                owner_id: input.creator,
            })
            .await?;

        let membership = self
            .membership_repo
            .create(CreateMembership {
                organization_id: organization.id,
                account_id: input.creator,
                role: Role::Owner,
            })
            .await?;

        log::info!(
            target: "roster",
            "msg=\"organization created\", organization_id={}, owner={}",
            organization.id,
            input.creator
        );

        Ok(CreateOrganizationOutput {
            organization,
            membership,
        })
    }
}
