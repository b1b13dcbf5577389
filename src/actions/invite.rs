use chrono::{Duration, Utc};

use crate::crypto::{generate_token, hash_token, DEFAULT_TOKEN_LENGTH};
use crate::policy::{Role, RoleAction};
use crate::repository::{CreateInvitation, InvitationRepository, MembershipRepository};
use crate::types::Invitation;
use crate::validators::validate_email;
use crate::{RosterError, SecretString};

/// Configuration for invitations.
#[derive(Debug, Clone)]
pub struct InvitationConfig {
    /// Number of days until an invitation expires. Default: 7
    pub expiry_days: i64,
    /// Length of generated invitation tokens. Default: 32
    pub token_length: usize,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expiry_days: 7,
            token_length: DEFAULT_TOKEN_LENGTH,
        }
    }
}

/// Input data for creating an invitation.
#[derive(Debug, Clone)]
pub struct InviteMemberInput {
    pub organization_id: i64,
    pub email: String,
    /// The role offered. `Owner` is never invitable.
    pub role: Role,
    /// The authenticated account sending the invitation.
    pub actor: i64,
}

/// Output from creating an invitation.
#[derive(Debug)]
pub struct InviteMemberOutput {
    /// The created invitation record.
    pub invitation: Invitation,
    /// The plain token to send to the invitee (not stored, only returned once).
    pub token: SecretString,
}

/// Action to invite an email address to join an organization.
///
/// Requires the `InviteMember` grant (owner or manager). The token is hashed
/// before storage and cannot be retrieved later; deliver the returned plain
/// token to the invitee out of band.
pub struct InviteMemberAction<M, I>
where
    M: MembershipRepository,
    I: InvitationRepository,
{
    membership_repo: M,
    invitation_repo: I,
    config: InvitationConfig,
}

impl<M, I> InviteMemberAction<M, I>
where
    M: MembershipRepository,
    I: InvitationRepository,
{
    /// Creates a new `InviteMemberAction` with default configuration.
    pub fn new(membership_repo: M, invitation_repo: I) -> Self {
        Self {
            membership_repo,
            invitation_repo,
            config: InvitationConfig::default(),
        }
    }

    /// Creates a new `InviteMemberAction` with custom configuration.
    pub fn with_config(membership_repo: M, invitation_repo: I, config: InvitationConfig) -> Self {
        Self {
            membership_repo,
            invitation_repo,
            config,
        }
    }

    /// Creates a pending invitation.
    ///
    /// # Returns
    ///
    /// - `Ok(output)` - invitation created, with the plain token for delivery
    /// - `Err(RosterError::Forbidden)` - actor is not a member or holds `staff`
    /// - `Err(RosterError::InvalidRole)` - the offered role is `owner`
    /// - `Err(RosterError::Validation(_))` - invitee email rejected
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "invite_member", skip_all, err)
    )]
    pub async fn execute(&self, input: InviteMemberInput) -> Result<InviteMemberOutput, RosterError> {
        let membership = self
            .membership_repo
            .find_by_org_and_account(input.organization_id, input.actor)
            .await?
            .ok_or(RosterError::Forbidden)?;

        if !membership.role.can(RoleAction::InviteMember) {
            return Err(RosterError::Forbidden);
        }

        if input.role == Role::Owner {
            return Err(RosterError::InvalidRole);
        }

        validate_email(&input.email)?;

        let token = generate_token(self.config.token_length);
        let token_hash = hash_token(&token);
        let expires_at = Utc::now() + Duration::days(self.config.expiry_days);

        let invitation = self
            .invitation_repo
            .create(CreateInvitation {
                organization_id: input.organization_id,
                email: input.email,
                role: input.role,
                token_hash,
                invited_by: input.actor,
                expires_at,
            })
            .await?;

        log::info!(
            target: "roster",
            "msg=\"invitation created\", organization_id={}, invitation_id={}, email=\"{}\", role={}",
            invitation.organization_id,
            invitation.id,
            invitation.email,
            invitation.role
        );

        Ok(InviteMemberOutput {
            invitation,
            token: SecretString::new(token),
        })
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use super::*;
    use crate::mocks::{MockInvitationRepository, MockMembershipRepository};
    use crate::repository::CreateMembership;
    use crate::types::InvitationStatus;
    use crate::ValidationError;

    async fn setup_member(role: Role) -> (MockMembershipRepository, MockInvitationRepository) {
        let membership_repo = MockMembershipRepository::new();
        let invitation_repo = MockInvitationRepository::new();

        membership_repo
            .create(CreateMembership {
                organization_id: 1,
                account_id: 1,
                role,
            })
            .await
            .unwrap();

        (membership_repo, invitation_repo)
    }

    fn input(role: Role) -> InviteMemberInput {
        InviteMemberInput {
            organization_id: 1,
            email: "invitee@example.com".to_owned(),
            role,
            actor: 1,
        }
    }

    #[tokio::test]
    async fn test_invite_success() {
        let (membership_repo, invitation_repo) = setup_member(Role::Owner).await;
        let action = InviteMemberAction::new(membership_repo, invitation_repo);

        let output = action.execute(input(Role::Staff)).await.unwrap();

        assert_eq!(output.invitation.email, "invitee@example.com");
        assert_eq!(output.invitation.role, Role::Staff);
        assert_eq!(output.invitation.status, InvitationStatus::Pending);
        assert!(!output.token.expose_secret().is_empty());
        // only the hash is stored
        assert_ne!(
            output.invitation.token_hash,
            output.token.expose_secret()
        );
    }

    #[tokio::test]
    async fn test_manager_may_invite() {
        let (membership_repo, invitation_repo) = setup_member(Role::Manager).await;
        let action = InviteMemberAction::new(membership_repo, invitation_repo);

        assert!(action.execute(input(Role::Staff)).await.is_ok());
    }

    #[tokio::test]
    async fn test_staff_may_not_invite() {
        let (membership_repo, invitation_repo) = setup_member(Role::Staff).await;
        let action = InviteMemberAction::new(membership_repo, invitation_repo);

        let result = action.execute(input(Role::Staff)).await;
        assert_eq!(result.unwrap_err(), RosterError::Forbidden);
    }

    #[tokio::test]
    async fn test_non_member_may_not_invite() {
        let action = InviteMemberAction::new(
            MockMembershipRepository::new(),
            MockInvitationRepository::new(),
        );

        let result = action.execute(input(Role::Staff)).await;
        assert_eq!(result.unwrap_err(), RosterError::Forbidden);
    }

    #[tokio::test]
    async fn test_cannot_offer_ownership() {
        let (membership_repo, invitation_repo) = setup_member(Role::Owner).await;
        let action = InviteMemberAction::new(membership_repo, invitation_repo);

        let result = action.execute(input(Role::Owner)).await;
        assert_eq!(result.unwrap_err(), RosterError::InvalidRole);
    }

    #[tokio::test]
    async fn test_rejects_bad_email() {
        let (membership_repo, invitation_repo) = setup_member(Role::Owner).await;
        let action = InviteMemberAction::new(membership_repo, invitation_repo);

        let result = action
            .execute(InviteMemberInput {
                email: "nope".to_owned(),
                ..input(Role::Staff)
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            RosterError::Validation(ValidationError::EmailInvalidFormat)
        );
    }

    #[tokio::test]
    async fn test_custom_expiry() {
        let (membership_repo, invitation_repo) = setup_member(Role::Owner).await;
        let config = InvitationConfig {
            expiry_days: 14,
            ..Default::default()
        };
        let action = InviteMemberAction::with_config(membership_repo, invitation_repo, config);

        let output = action.execute(input(Role::Manager)).await.unwrap();

        // expiry is approximately 14 days out
        let expected = Utc::now() + Duration::days(14);
        let diff = (output.invitation.expires_at - expected).num_seconds().abs();
        assert!(diff < 5, "expiry should be ~14 days from now");
    }

    #[tokio::test]
    async fn test_custom_token_length() {
        let (membership_repo, invitation_repo) = setup_member(Role::Owner).await;
        let config = InvitationConfig {
            token_length: 48,
            ..Default::default()
        };
        let action = InviteMemberAction::with_config(membership_repo, invitation_repo, config);

        let output = action.execute(input(Role::Staff)).await.unwrap();
        assert_eq!(output.token.expose_secret().len(), 48);
    }
}
