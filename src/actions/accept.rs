use chrono::Utc;

use crate::crypto::hash_token;
use crate::locks::OrgLocks;
use crate::repository::{CreateMembership, InvitationRepository, MembershipRepository};
use crate::types::{InvitationStatus, Membership};
use crate::{RosterError, SecretString};

/// Action to accept an invitation.
///
/// Token possession is authorization: any authenticated account holding a
/// valid token may accept, whatever email the invitation names. The status
/// check, membership write, and `accepted` transition happen as one unit
/// under the organization's lock, so of two concurrent accepts on the same
/// token exactly one succeeds and the other observes `AlreadyAccepted`.
pub struct AcceptInvitationAction<I, M>
where
    I: InvitationRepository,
    M: MembershipRepository,
{
    invitation_repo: I,
    membership_repo: M,
    locks: OrgLocks,
}

impl<I, M> AcceptInvitationAction<I, M>
where
    I: InvitationRepository,
    M: MembershipRepository,
{
    pub fn new(invitation_repo: I, membership_repo: M, locks: OrgLocks) -> Self {
        Self {
            invitation_repo,
            membership_repo,
            locks,
        }
    }

    /// Accepts the invitation for `account_id`.
    ///
    /// If the account is already a member of the organization, the
    /// invitation's role replaces the existing one.
    ///
    /// # Returns
    ///
    /// - `Ok(membership)` - the created or overwritten membership
    /// - `Err(RosterError::NotFound)` - no invitation holds this token
    /// - `Err(RosterError::Expired)` - the deadline passed before use
    /// - `Err(RosterError::AlreadyAccepted)` - the token was already redeemed
    /// - `Err(RosterError::Cancelled)` - the invitation was cancelled
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "accept_invitation", skip_all, err)
    )]
    pub async fn execute(
        &self,
        token: &SecretString,
        account_id: i64,
    ) -> Result<Membership, RosterError> {
        let token_hash = hash_token(token.expose_secret());

        let invitation = self
            .invitation_repo
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or(RosterError::NotFound)?;

        let _guard = self.locks.acquire(invitation.organization_id).await;

        // re-read under the lock; a concurrent accept may have won the race
        let invitation = self
            .invitation_repo
            .find_by_id(invitation.id)
            .await?
            .ok_or(RosterError::NotFound)?;

        match invitation.effective_status(Utc::now()) {
            InvitationStatus::Accepted => return Err(RosterError::AlreadyAccepted),
            InvitationStatus::Cancelled => return Err(RosterError::Cancelled),
            InvitationStatus::Expired => return Err(RosterError::Expired),
            InvitationStatus::Pending => {}
        }

        let membership = match self
            .membership_repo
            .find_by_org_and_account(invitation.organization_id, account_id)
            .await?
        {
            Some(existing) => {
                self.membership_repo
                    .update_role(existing.id, invitation.role)
                    .await?
            }
            None => {
                self.membership_repo
                    .create(CreateMembership {
                        organization_id: invitation.organization_id,
                        account_id,
                        role: invitation.role,
                    })
                    .await?
            }
        };

        self.invitation_repo
            .update_status(invitation.id, InvitationStatus::Accepted)
            .await?;

        log::info!(
            target: "roster",
            "msg=\"invitation accepted\", organization_id={}, invitation_id={}, account={}, role={}",
            invitation.organization_id,
            invitation.id,
            account_id,
            invitation.role
        );

        Ok(membership)
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::crypto::hash_token;
    use crate::mocks::{MockInvitationRepository, MockMembershipRepository};
    use crate::policy::Role;
    use crate::repository::{CreateInvitation, CreateMembership};
    use crate::types::Invitation;

    const TOKEN: &str = "test-token-12345";

    async fn setup(
        role: Role,
        expires_at: chrono::DateTime<Utc>,
    ) -> (MockInvitationRepository, MockMembershipRepository, Invitation) {
        let invitation_repo = MockInvitationRepository::new();
        let membership_repo = MockMembershipRepository::new();

        let invitation = invitation_repo
            .create(CreateInvitation {
                organization_id: 1,
                email: "invitee@example.com".to_owned(),
                role,
                token_hash: hash_token(TOKEN),
                invited_by: 1,
                expires_at,
            })
            .await
            .unwrap();

        (invitation_repo, membership_repo, invitation)
    }

    #[tokio::test]
    async fn test_accept_success() {
        let (invitation_repo, membership_repo, invitation) =
            setup(Role::Staff, Utc::now() + Duration::days(7)).await;
        let action = AcceptInvitationAction::new(
            invitation_repo.clone(),
            membership_repo,
            OrgLocks::new(),
        );

        let membership = action.execute(&SecretString::new(TOKEN), 2).await.unwrap();

        assert_eq!(membership.organization_id, 1);
        assert_eq!(membership.account_id, 2);
        assert_eq!(membership.role, Role::Staff);

        let stored = invitation_repo
            .find_by_id(invitation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, InvitationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_second_accept_fails() {
        let (invitation_repo, membership_repo, _) =
            setup(Role::Staff, Utc::now() + Duration::days(7)).await;
        let action =
            AcceptInvitationAction::new(invitation_repo, membership_repo.clone(), OrgLocks::new());

        action.execute(&SecretString::new(TOKEN), 2).await.unwrap();
        let result = action.execute(&SecretString::new(TOKEN), 3).await;

        assert_eq!(result.unwrap_err(), RosterError::AlreadyAccepted);
        // the loser gained no membership
        assert!(membership_repo
            .find_by_org_and_account(1, 3)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_accept_overwrites_existing_role() {
        let (invitation_repo, membership_repo, _) =
            setup(Role::Manager, Utc::now() + Duration::days(7)).await;
        membership_repo
            .create(CreateMembership {
                organization_id: 1,
                account_id: 2,
                role: Role::Staff,
            })
            .await
            .unwrap();

        let action = AcceptInvitationAction::new(
            invitation_repo,
            membership_repo.clone(),
            OrgLocks::new(),
        );

        let membership = action.execute(&SecretString::new(TOKEN), 2).await.unwrap();

        assert_eq!(membership.role, Role::Manager);
        // still a single membership for the pair
        assert_eq!(membership_repo.find_by_organization(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_accept_expired() {
        let (invitation_repo, membership_repo, _) =
            setup(Role::Staff, Utc::now() - Duration::hours(1)).await;
        let action =
            AcceptInvitationAction::new(invitation_repo, membership_repo, OrgLocks::new());

        let result = action.execute(&SecretString::new(TOKEN), 2).await;
        assert_eq!(result.unwrap_err(), RosterError::Expired);
    }

    #[tokio::test]
    async fn test_accept_cancelled() {
        let (invitation_repo, membership_repo, invitation) =
            setup(Role::Staff, Utc::now() + Duration::days(7)).await;
        invitation_repo
            .update_status(invitation.id, InvitationStatus::Cancelled)
            .await
            .unwrap();

        let action =
            AcceptInvitationAction::new(invitation_repo, membership_repo, OrgLocks::new());

        let result = action.execute(&SecretString::new(TOKEN), 2).await;
        assert_eq!(result.unwrap_err(), RosterError::Cancelled);
    }

    #[tokio::test]
    async fn test_accept_unknown_token() {
        let (invitation_repo, membership_repo, _) =
            setup(Role::Staff, Utc::now() + Duration::days(7)).await;
        let action =
            AcceptInvitationAction::new(invitation_repo, membership_repo, OrgLocks::new());

        let result = action.execute(&SecretString::new("wrong"), 2).await;
        assert_eq!(result.unwrap_err(), RosterError::NotFound);
    }

    #[tokio::test]
    async fn test_concurrent_accepts_one_winner() {
        let (invitation_repo, membership_repo, _) =
            setup(Role::Staff, Utc::now() + Duration::days(7)).await;
        let action = std::sync::Arc::new(AcceptInvitationAction::new(
            invitation_repo,
            membership_repo.clone(),
            OrgLocks::new(),
        ));

        let a = {
            let action = std::sync::Arc::clone(&action);
            tokio::spawn(async move { action.execute(&SecretString::new(TOKEN), 2).await })
        };
        let b = {
            let action = std::sync::Arc::clone(&action);
            tokio::spawn(async move { action.execute(&SecretString::new(TOKEN), 3).await })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = if a.is_ok() { b } else { a };
        assert_eq!(loser.unwrap_err(), RosterError::AlreadyAccepted);

        // exactly one membership came out of the race
        assert_eq!(membership_repo.find_by_organization(1).await.unwrap().len(), 1);
    }
}
