use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::{BranchId, DomainError, DomainResult, Record, RecordId};

use crate::Role;

/// The locally signed-in user.
///
/// Stored as a single record so the session survives a restart; signing out
/// clears the collection rather than mutating this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    /// The branch this user works at; admins typically have none and see all.
    pub branch_id: Option<BranchId>,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
}

impl User {
    pub fn sign_in(
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
        branch_id: Option<BranchId>,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let email = email.into();
        if !email.contains('@') {
            return Err(DomainError::validation("email must contain '@'"));
        }
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(DomainError::validation("display name cannot be empty"));
        }

        Ok(Self {
            id: RecordId::new(),
            email,
            display_name,
            role,
            branch_id,
            created_at: at,
            synced: false,
        })
    }
}

impl Record for User {
    fn record_type(&self) -> &'static str {
        "user"
    }

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn synced(&self) -> bool {
        self.synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_produces_unsynced_user() {
        let user = User::sign_in("till@shop.example", "Till One", Role::Staff, None, Utc::now())
            .unwrap();
        assert!(!user.synced);
        assert_eq!(user.role, Role::Staff);
    }

    #[test]
    fn email_without_at_is_rejected() {
        let err =
            User::sign_in("not-an-email", "Till One", Role::Staff, None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blank_display_name_is_rejected() {
        let err =
            User::sign_in("till@shop.example", "  ", Role::Staff, None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn role_round_trips_through_json() {
        let user = User::sign_in(
            "owner@admin.tillbook.example",
            "Owner",
            Role::Admin,
            None,
            Utc::now(),
        )
        .unwrap();

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["role"].as_str(), Some("admin"));

        let back: User = serde_json::from_value(value).unwrap();
        assert_eq!(back, user);
    }
}
