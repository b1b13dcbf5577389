//! Role policy for organization members.
//!
//! The permission table is the single source of truth for what each role may
//! do; callers consume it through [`Role::can`] rather than re-deriving
//! per-screen booleans. Checks that involve a *target* membership (who may
//! demote or remove whom) live in [`Role::can_target`] and are evaluated by
//! the directory actions, where both memberships are in hand.

use serde::{Deserialize, Serialize};

/// A member's role within one organization.
///
/// Roles are totally ordered by authority: `Owner` > `Manager` > `Staff`.
/// Every organization has exactly one `Owner` membership for its entire
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Manager,
    Staff,
}

impl Role {
    /// Stable string form used for storage and wire formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }

    /// Parse from the storage string. Returns `None` for unrecognized input.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Role::Owner),
            "manager" => Some(Role::Manager),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Role::Owner => 2,
            Role::Manager => 1,
            Role::Staff => 0,
        }
    }

    /// True if this role carries more authority than `other`.
    pub fn outranks(&self, other: &Role) -> bool {
        self.rank() > other.rank()
    }

    /// The permission table. Pure and total over [`RoleAction`].
    ///
    /// | action             | owner | manager | staff |
    /// |--------------------|-------|---------|-------|
    /// | view               | yes   | yes     | yes   |
    /// | edit profile       | yes   | yes     | no    |
    /// | delete organization| yes   | no      | no    |
    /// | invite member      | yes   | yes     | no    |
    /// | change role        | yes   | no      | no    |
    /// | remove member      | yes   | yes     | no    |
    ///
    /// A `manager`'s `RemoveMember` grant is further constrained by
    /// [`Role::can_target`]: managers act on staff only.
    pub fn can(&self, action: RoleAction) -> bool {
        match action {
            RoleAction::View => true,
            RoleAction::EditProfile => matches!(self, Role::Owner | Role::Manager),
            RoleAction::DeleteOrganization => matches!(self, Role::Owner),
            RoleAction::InviteMember => matches!(self, Role::Owner | Role::Manager),
            RoleAction::ChangeRole => matches!(self, Role::Owner),
            RoleAction::RemoveMember => matches!(self, Role::Owner | Role::Manager),
        }
    }

    /// Whether an actor holding this role may modify or remove a member
    /// holding `target`.
    ///
    /// Nobody targets an owner, and a manager may act on staff only. The
    /// actor-is-not-the-target rule needs account ids and is checked by the
    /// actions themselves.
    pub fn can_target(&self, target: &Role) -> bool {
        if *target == Role::Owner {
            return false;
        }
        match self {
            Role::Owner => true,
            Role::Manager => *target == Role::Staff,
            Role::Staff => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action gated by the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAction {
    View,
    EditProfile,
    DeleteOrganization,
    InviteMember,
    ChangeRole,
    RemoveMember,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 3] = [Role::Owner, Role::Manager, Role::Staff];
    const ALL_ACTIONS: [RoleAction; 6] = [
        RoleAction::View,
        RoleAction::EditProfile,
        RoleAction::DeleteOrganization,
        RoleAction::InviteMember,
        RoleAction::ChangeRole,
        RoleAction::RemoveMember,
    ];

    #[test]
    fn test_permission_table() {
        let expected = [
            // (action, owner, manager, staff)
            (RoleAction::View, true, true, true),
            (RoleAction::EditProfile, true, true, false),
            (RoleAction::DeleteOrganization, true, false, false),
            (RoleAction::InviteMember, true, true, false),
            (RoleAction::ChangeRole, true, false, false),
            (RoleAction::RemoveMember, true, true, false),
        ];

        for (action, owner, manager, staff) in expected {
            assert_eq!(Role::Owner.can(action), owner, "{action:?} for owner");
            assert_eq!(Role::Manager.can(action), manager, "{action:?} for manager");
            assert_eq!(Role::Staff.can(action), staff, "{action:?} for staff");
        }
    }

    #[test]
    fn test_delete_organization_is_owner_only() {
        for role in ALL_ROLES {
            assert_eq!(
                role.can(RoleAction::DeleteOrganization),
                role == Role::Owner
            );
        }
    }

    #[test]
    fn test_table_is_total() {
        for role in ALL_ROLES {
            for action in ALL_ACTIONS {
                // every (role, action) pair answers without panicking
                let _ = role.can(action);
            }
        }
    }

    #[test]
    fn test_ordering() {
        assert!(Role::Owner.outranks(&Role::Manager));
        assert!(Role::Owner.outranks(&Role::Staff));
        assert!(Role::Manager.outranks(&Role::Staff));
        assert!(!Role::Staff.outranks(&Role::Manager));
        assert!(!Role::Manager.outranks(&Role::Manager));
    }

    #[test]
    fn test_nobody_targets_an_owner() {
        for role in ALL_ROLES {
            assert!(!role.can_target(&Role::Owner));
        }
    }

    #[test]
    fn test_manager_targets_staff_only() {
        assert!(Role::Manager.can_target(&Role::Staff));
        assert!(!Role::Manager.can_target(&Role::Manager));
    }

    #[test]
    fn test_owner_targets_any_non_owner() {
        assert!(Role::Owner.can_target(&Role::Manager));
        assert!(Role::Owner.can_target(&Role::Staff));
    }

    #[test]
    fn test_staff_targets_nobody() {
        for role in ALL_ROLES {
            assert!(!Role::Staff.can_target(&role));
        }
    }

    #[test]
    fn test_role_roundtrip() {
        for role in ALL_ROLES {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("admin"), None);
        assert_eq!(Role::from_str(""), None);
    }
}
