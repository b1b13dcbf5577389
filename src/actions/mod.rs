//! One action per operation of the request/response boundary.
//!
//! Actions are generic over the repository traits, carry no transport
//! concerns, and perform every authorization and invariant check themselves.
//! Mutating actions additionally serialize on the target organization's
//! [`crate::OrgLocks`] entry.

mod accept;
mod cancel;
mod change_role;
mod create_organization;
mod delete_organization;
mod expire_invitations;
mod invite;
mod list_invitations;
mod list_members;
mod list_organizations;
mod remove_member;
mod resend;
mod update_organization;
mod validate;

pub use accept::AcceptInvitationAction;
pub use cancel::CancelInvitationAction;
pub use change_role::{ChangeRoleAction, ChangeRoleInput};
pub use create_organization::{
    CreateOrganizationAction, CreateOrganizationInput, CreateOrganizationOutput,
};
pub use delete_organization::DeleteOrganizationAction;
pub use expire_invitations::ExpireInvitationsAction;
pub use invite::{InvitationConfig, InviteMemberAction, InviteMemberInput, InviteMemberOutput};
pub use list_invitations::ListInvitationsAction;
pub use list_members::ListMembersAction;
pub use list_organizations::ListOrganizationsAction;
pub use remove_member::{RemoveMemberAction, RemoveMemberInput};
pub use resend::{ResendInvitationAction, ResendInvitationOutput};
pub use update_organization::UpdateOrganizationAction;
pub use validate::ValidateInvitationAction;
