use crate::policy::RoleAction;
use crate::repository::{InvitationRepository, MembershipRepository};
use crate::types::InvitationStatus;
use crate::RosterError;

/// Action to cancel a pending invitation.
///
/// The invitation transitions to `cancelled` and its token stops working.
/// Judged against the *stored* status, so a lapsed pending invitation can
/// still be tidied up.
pub struct CancelInvitationAction<M, I>
where
    M: MembershipRepository,
    I: InvitationRepository,
{
    membership_repo: M,
    invitation_repo: I,
}

impl<M, I> CancelInvitationAction<M, I>
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
    /// - `Ok(())` - invitation cancelled
    /// - `Err(RosterError::NotFound)` - no such invitation
    /// - `Err(RosterError::Forbidden)` - actor lacks `InviteMember` on the
    ///   invitation's organization
    /// - `Err(RosterError::InvalidState(_))` - stored status is not `pending`
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "cancel_invitation", skip_all, err)
    )]
    pub async fn execute(&self, invitation_id: i64, actor: i64) -> Result<(), RosterError> {
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
                "cannot cancel a {} invitation",
                invitation.status
            )));
        }

        self.invitation_repo
            .update_status(invitation.id, InvitationStatus::Cancelled)
            .await?;

        log::info!(
            target: "roster",
            "msg=\"invitation cancelled\", organization_id={}, invitation_id={}, actor={actor}",
            invitation.organization_id,
            invitation.id
        );

        Ok(())
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::mocks::{MockInvitationRepository, MockMembershipRepository};
    use crate::policy::Role;
    use crate::repository::{CreateInvitation, CreateMembership};
    use crate::types::Invitation;

    async fn setup() -> (MockMembershipRepository, MockInvitationRepository, Invitation) {
        let membership_repo = MockMembershipRepository::new();
        let invitation_repo = MockInvitationRepository::new();

        membership_repo
            .create(CreateMembership {
                organization_id: 1,
                account_id: 1,
                role: Role::Manager,
            })
            .await
            .unwrap();

        let invitation = invitation_repo
            .create(CreateInvitation {
                organization_id: 1,
                email: "invitee@example.com".to_owned(),
                role: Role::Staff,
                token_hash: "hash".to_owned(),
                invited_by: 1,
                expires_at: Utc::now() + Duration::days(7),
            })
            .await
            .unwrap();

        (membership_repo, invitation_repo, invitation)
    }

    #[tokio::test]
    async fn test_cancel_success() {
        let (membership_repo, invitation_repo, invitation) = setup().await;
        let action = CancelInvitationAction::new(membership_repo, invitation_repo.clone());

        action.execute(invitation.id, 1).await.unwrap();

        let stored = invitation_repo
            .find_by_id(invitation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, InvitationStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_twice_fails() {
        let (membership_repo, invitation_repo, invitation) = setup().await;
        let action = CancelInvitationAction::new(membership_repo, invitation_repo);

        action.execute(invitation.id, 1).await.unwrap();
        let result = action.execute(invitation.id, 1).await;

        assert!(matches!(result.unwrap_err(), RosterError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_staff_may_not_cancel() {
        let (membership_repo, invitation_repo, invitation) = setup().await;
        membership_repo
            .create(CreateMembership {
                organization_id: 1,
                account_id: 2,
                role: Role::Staff,
            })
            .await
            .unwrap();

        let action = CancelInvitationAction::new(membership_repo, invitation_repo);
        let result = action.execute(invitation.id, 2).await;

        assert_eq!(result.unwrap_err(), RosterError::Forbidden);
    }

    #[tokio::test]
    async fn test_unknown_invitation() {
        let (membership_repo, invitation_repo, _) = setup().await;
        let action = CancelInvitationAction::new(membership_repo, invitation_repo);

        let result = action.execute(999, 1).await;
        assert_eq!(result.unwrap_err(), RosterError::NotFound);
    }
}
