use chrono::Utc;

use crate::crypto::hash_token;
use crate::repository::{InvitationRepository, OrganizationRepository};
use crate::types::InvitationView;
use crate::{RosterError, SecretString};

/// Action to look up an invitation by its token, read-only.
///
/// This is what an invitation link lands on before the invitee decides to
/// accept. The returned status is the *effective* one: a lapsed pending
/// invitation reads `expired` even if no sweep has persisted the transition.
pub struct ValidateInvitationAction<I, O>
where
    I: InvitationRepository,
    O: OrganizationRepository,
{
    invitation_repo: I,
    organization_repo: O,
}

impl<I, O> ValidateInvitationAction<I, O>
where
    I: InvitationRepository,
    O: OrganizationRepository,
{
    pub fn new(invitation_repo: I, organization_repo: O) -> Self {
        Self {
            invitation_repo,
            organization_repo,
        }
    }

    /// # Returns
    ///
    /// - `Ok(view)` - invitee email, offered role, organization name,
    ///   effective status, and deadline
    /// - `Err(RosterError::NotFound)` - no invitation holds this token
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "validate_invitation", skip_all, err)
    )]
    pub async fn execute(&self, token: &SecretString) -> Result<InvitationView, RosterError> {
        let token_hash = hash_token(token.expose_secret());

        let invitation = self
            .invitation_repo
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or(RosterError::NotFound)?;

        let organization = self
            .organization_repo
            .find_by_id(invitation.organization_id)
            .await?
            .ok_or(RosterError::NotFound)?;

        Ok(InvitationView {
            email: invitation.email.clone(),
            role: invitation.role,
            organization_name: organization.name,
            status: invitation.effective_status(Utc::now()),
            expires_at: invitation.expires_at,
        })
    }
}
