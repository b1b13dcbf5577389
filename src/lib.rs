//! Multi-tenant membership and invitation management.
//!
//! `roster` models organizations ("businesses") whose members hold one of
//! three ranked roles (`owner` > `manager` > `staff`), and email invitations
//! that move through a small state machine (`pending` → `accepted` /
//! `expired` / `cancelled`). Storage is pluggable through repository traits;
//! the crate ships in-memory mocks (feature `mocks`) and a `SQLite` backend
//! (feature `sqlite`).
//!
//! Identity (sign-up, sign-in, sessions) and transport (HTTP routing, email
//! delivery) are the embedding application's concern: every operation here
//! takes an already-authenticated account id and returns plain data.

pub mod actions;
pub mod crypto;
pub mod locks;
pub mod policy;
pub mod repository;
pub mod secret;
pub mod session;
pub mod types;
pub mod validators;

#[cfg(feature = "mocks")]
pub mod mocks;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use locks::OrgLocks;
pub use policy::{Role, RoleAction};
pub use repository::{
    ActiveSelectionRepository, CreateInvitation, CreateMembership, CreateOrganization,
    InvitationRepository, MembershipRepository, OrganizationChanges, OrganizationRepository,
    ProfileRepository,
};
pub use secret::SecretString;
pub use session::SessionCache;
pub use types::{
    AccountProfile, ActiveSelection, Invitation, InvitationStatus, InvitationView, MemberRecord,
    Membership, Organization, OrganizationWithRole,
};
pub use validators::ValidationError;

use std::fmt;

/// Errors produced by roster operations.
///
/// `Forbidden` and `NotFound` are kept distinct so callers can decide for
/// themselves whether to mask existence information at their boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterError {
    /// The actor lacks the role or target relationship the operation requires.
    Forbidden,
    /// No such organization, membership, invitation, or token.
    NotFound,
    /// The offered role is not invitable (invitations never offer `owner`).
    InvalidRole,
    /// A role change or removal would violate a membership invariant.
    InvalidTransition(String),
    /// The invitation is not in a state that permits the operation.
    InvalidState(String),
    /// The invitation lapsed before it was used.
    Expired,
    /// The invitation token was already redeemed.
    AlreadyAccepted,
    /// The invitation was cancelled by the organization.
    Cancelled,
    /// A concurrent mutation invalidated the request; safe to retry after re-reading.
    Conflict(String),
    /// An input field failed validation.
    Validation(ValidationError),
    DatabaseError(String),
    Internal(String),
}

impl std::error::Error for RosterError {}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::Forbidden => write!(f, "You do not have permission to do that"),
            RosterError::NotFound => write!(f, "Not found"),
            RosterError::InvalidRole => write!(f, "That role cannot be offered by invitation"),
            RosterError::InvalidTransition(msg) => write!(f, "Invalid transition: {msg}"),
            RosterError::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
            RosterError::Expired => write!(f, "Invitation has expired"),
            RosterError::AlreadyAccepted => write!(f, "Invitation has already been accepted"),
            RosterError::Cancelled => write!(f, "Invitation has been cancelled"),
            RosterError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            RosterError::Validation(err) => write!(f, "{err}"),
            RosterError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            RosterError::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<ValidationError> for RosterError {
    fn from(err: ValidationError) -> Self {
        RosterError::Validation(err)
    }
}
