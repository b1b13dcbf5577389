//! `SQLite`-backed repositories.
//!
//! Run [`migrations::run`] against the pool before constructing the
//! repositories.

pub mod migrations;

mod invitation;
mod membership;
mod organization;
mod selection;

pub use invitation::SqliteInvitationRepository;
pub use membership::SqliteMembershipRepository;
pub use organization::SqliteOrganizationRepository;
pub use selection::SqliteActiveSelectionRepository;
