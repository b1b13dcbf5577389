use chrono::{Duration, Utc};

use crate::crypto::{generate_token, hash_token};
use crate::policy::RoleAction;
use crate::repository::{InvitationRepository, MembershipRepository};
use crate::types::{Invitation, InvitationStatus};
use crate::{RosterError, SecretString};

use super::invite::InvitationConfig;

/// Output from resending an invitation.
#[derive(Debug)]
pub struct ResendInvitationOutput {
    /// The invitation with its refreshed deadline.
    pub invitation: Invitation,
    /// The fresh plain token to deliver. The previous token no longer works.
    pub token: SecretString,
}

/// Action to re-issue a pending invitation.
///
/// Issues a new token and resets the deadline; the status stays `pending`.
/// Judged against the *stored* status, so an invitation that lapsed without
/// a sweep can still be re-issued.
pub struct ResendInvitationAction<M, I>
where
    M: MembershipRepository,
    I: InvitationRepository,
{
    membership_repo: M,
    invitation_repo: I,
    config: InvitationConfig,
}

impl<M, I> ResendInvitationAction<M, I>
where
    M: MembershipRepository,
    I: InvitationRepository,
{
    /// Creates a new `ResendInvitationAction` with default configuration.
    pub fn new(membership_repo: M, invitation_repo: I) -> Self {
        Self {
            membership_repo,
            invitation_repo,
            config: InvitationConfig::default(),
        }
    }

    /// Creates a new `ResendInvitationAction` with custom configuration.
    pub fn with_config(membership_repo: M, invitation_repo: I, config: InvitationConfig) -> Self {
        Self {
            membership_repo,
            invitation_repo,
            config,
        }
    }

    /// # Returns
    ///
    /// - `Ok(output)` - fresh token and deadline
    /// - `Err(RosterError::NotFound)` - no such invitation
    /// - `Err(RosterError::Forbidden)` - actor lacks `InviteMember` on the
    ///   invitation's organization
    /// - `Err(RosterError::InvalidState(_))` - stored status is not `pending`
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "resend_invitation", skip_all, err)
    )]
    pub async fn execute(
        &self,
        invitation_id: i64,
        actor: i64,
    ) -> Result<ResendInvitationOutput, RosterError> {
        let invitation = self
            .invitation_repo
            .find_by_id(invitation_id)
            .await?
            .ok_or(RosterError::NotFound)?;

        let membership = self
            .membership_repo
            .find_by_org_and_account(invitation.organization_id, actor)
            .await?
            .ok_or(RosterError::Forbidden)?;

        if !membership.role.can(RoleAction::InviteMember) {
            return Err(RosterError::Forbidden);
        }

        if invitation.status != InvitationStatus::Pending {
            return Err(RosterError::InvalidState(format!(
                "cannot resend a {} invitation",
                invitation.status
            )));
        }

        let token = generate_token(self.config.token_length);
        let token_hash = hash_token(&token);
        let expires_at = Utc::now() + Duration::days(self.config.expiry_days);

        let invitation = self
            .invitation_repo
            .refresh_token(invitation.id, token_hash, expires_at)
            .await?;

        log::info!(
            target: "roster",
            "msg=\"invitation resent\", organization_id={}, invitation_id={}, actor={actor}",
            invitation.organization_id,
            invitation.id
        );

        Ok(ResendInvitationOutput {
            invitation,
            token: SecretString::new(token),
        })
    }
}
