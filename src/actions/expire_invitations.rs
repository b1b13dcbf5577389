//! Run periodically (e.g., via cron) to persist `expired` onto lapsed
//! invitations. Reads never depend on this: `effective_status` already
//! reports lapsed invitations as expired.

use chrono::Utc;

use crate::repository::InvitationRepository;
use crate::RosterError;

/// Hygiene sweep that persists the `expired` status onto stored-pending
/// invitations whose deadline has passed.
pub struct ExpireInvitationsAction<I>
where
    I: InvitationRepository,
{
    invitation_repo: I,
}

impl<I> ExpireInvitationsAction<I>
where
    I: InvitationRepository,
{
    pub fn new(invitation_repo: I) -> Self {
        Self { invitation_repo }
    }

    /// Marks every lapsed pending invitation as expired.
    ///
    /// # Returns
    ///
    /// - `Ok(count)` - number of invitations transitioned
    /// - `Err(_)` - storage errors
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self), name = "expire_invitations")
    )]
    pub async fn execute(&self) -> Result<u64, RosterError> {
        let expired = self.invitation_repo.expire_lapsed(Utc::now()).await?;

        if expired > 0 {
            log::info!(
                target: "roster",
                "msg=\"invitations expired\", count={expired}"
            );
        }

        Ok(expired)
    }
}
