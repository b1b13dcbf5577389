//! Core record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::Role;

/// An organization is the tenant boundary that groups members together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Line of business, free-form.
    pub industry: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Contact email, if any.
    pub email: Option<String>,
    /// Street address, if any.
    pub address: Option<String>,
    /// Account that created the organization. Write-once; authority checks
    /// go through memberships, never this column.
    pub owner_id: i64,
    /// When the organization was created.
    pub created_at: DateTime<Utc>,
    /// When the organization was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Links an account to an organization with a role.
///
/// At most one membership exists per (organization, account) pair, and every
/// organization holds exactly one `owner` membership at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Unique identifier.
    pub id: i64,
    /// The organization this membership belongs to.
    pub organization_id: i64,
    /// The member's account.
    pub account_id: i64,
    /// The member's role within the organization.
    pub role: Role,
    /// When the account joined.
    pub created_at: DateTime<Utc>,
    /// When the membership was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of an invitation.
///
/// `Pending` is the only state with outgoing transitions; the rest are
/// terminal. Expiry is time-based and evaluated lazily on read — see
/// [`Invitation::effective_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Cancelled,
}

impl InvitationStatus {
    /// Stable string form used for storage and wire formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Cancelled => "cancelled",
        }
    }

    /// Parse from the storage string. Returns `None` for unrecognized input.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvitationStatus::Pending),
            "accepted" => Some(InvitationStatus::Accepted),
            "expired" => Some(InvitationStatus::Expired),
            "cancelled" => Some(InvitationStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outstanding offer for an email address to join an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// Unique identifier.
    pub id: i64,
    /// The organization being invited to.
    pub organization_id: i64,
    /// Email of the invitee.
    pub email: String,
    /// Role assigned on acceptance. Never `Owner`.
    pub role: Role,
    /// SHA-256 hash of the invitation token. The plain token is returned
    /// once at creation/resend and is not recoverable afterwards.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Account that sent the invitation.
    pub invited_by: i64,
    /// Stored lifecycle state.
    pub status: InvitationStatus,
    /// When the invitation lapses.
    pub expires_at: DateTime<Utc>,
    /// When the invitation was created.
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Check if the invitation's deadline has passed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Check against the current wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// The status a reader must be told.
    ///
    /// A stored `Pending` past its deadline reads as `Expired` even if no
    /// sweep has persisted the transition yet; every other stored status is
    /// returned unchanged.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.status == InvitationStatus::Pending && self.is_expired_at(now) {
            InvitationStatus::Expired
        } else {
            self.status
        }
    }
}

/// What a token holder sees when validating an invitation link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationView {
    pub email: String,
    pub role: Role,
    pub organization_name: String,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
}

/// The persisted active-organization pointer for one account.
///
/// Never authoritative: the session cache re-validates it against the
/// membership directory on every refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSelection {
    pub account_id: i64,
    pub organization_id: i64,
    pub updated_at: DateTime<Utc>,
}

/// Display data for an account, resolved from the external identity system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    pub account_id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// One entry of an organization listing: the organization together with the
/// caller's own role in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationWithRole {
    pub organization: Organization,
    pub role: Role,
}

/// One entry of a member listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    pub membership: Membership,
    /// `None` when the identity system has no profile for the account.
    pub profile: Option<AccountProfile>,
}
