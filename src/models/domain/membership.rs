use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Privilege level inside one organization. The declaration order is the
/// privilege order, so `Ord` compares roles by rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Role {
    /// Pending invitation, not yet accepted.
    Invited,
    Member,
    Admin,
    Owner,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Invited, Role::Member, Role::Admin, Role::Owner];

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Owner)
    }

    pub fn outranks(self, other: Role) -> bool {
        self > other
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Role::Invited => 0,
            Role::Member => 1,
            Role::Admin => 2,
            Role::Owner => 3,
        }
    }
}

impl From<Role> for i32 {
    fn from(role: Role) -> Self {
        role.as_i32()
    }
}

impl TryFrom<i32> for Role {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::Invited),
            1 => Ok(Role::Member),
            2 => Ok(Role::Admin),
            3 => Ok(Role::Owner),
            other => Err(format!("unknown organization role {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Invited => write!(f, "invited"),
            Role::Member => write!(f, "member"),
            Role::Admin => write!(f, "admin"),
            Role::Owner => write!(f, "owner"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Membership {
    pub organization_id: String,
    pub user_id: String,
    pub username: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Membership {
    pub fn new(organization_id: &str, user_id: &str, username: &str, role: Role) -> Self {
        Membership {
            organization_id: organization_id.to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            role,
            created_at: Some(Utc::now()),
        }
    }

    pub fn is_same_user(&self, other: &Membership) -> bool {
        self.user_id == other.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_totally_ordered_by_privilege() {
        assert!(Role::Invited < Role::Member);
        assert!(Role::Member < Role::Admin);
        assert!(Role::Admin < Role::Owner);
        assert!(Role::Owner.outranks(Role::Admin));
        assert!(!Role::Member.outranks(Role::Member));
    }

    #[test]
    fn only_admin_and_owner_are_admins() {
        let admins: Vec<_> = Role::ALL.iter().filter(|r| r.is_admin()).collect();
        assert_eq!(admins, vec![&Role::Admin, &Role::Owner]);
    }

    #[test]
    fn role_is_stored_as_integer() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "2");

        let parsed: Role = serde_json::from_str("0").unwrap();
        assert_eq!(parsed, Role::Invited);

        assert!(serde_json::from_str::<Role>("7").is_err());
    }

    #[test]
    fn membership_serializes_role_as_integer() {
        let membership = Membership::new("org-1", "user-1", "alice", Role::Owner);
        let value = serde_json::to_value(&membership).unwrap();
        assert_eq!(value["role"], 3);
    }
}
