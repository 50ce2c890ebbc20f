use serde::{Deserialize, Serialize};

use tillbook_core::{DomainError, DomainResult};

/// What a signed-in user is allowed to see.
///
/// Staff run the till; admins additionally get the cross-branch dashboard
/// and inventory management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    /// Derive the role from the sign-in email. Admins are recognised by a
    /// configured suffix (e.g. `@admin.tillbook.example`); everyone else is
    /// staff. The comparison is case-insensitive.
    pub fn for_email(email: &str, admin_suffix: &str) -> Self {
        if email.to_lowercase().ends_with(&admin_suffix.to_lowercase()) {
            Role::Admin
        } else {
            Role::Staff
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Staff => f.write_str("staff"),
        }
    }
}

/// Gate for admin-only surfaces such as the branch dashboard.
pub fn ensure_admin(role: Role) -> DomainResult<()> {
    if role.is_admin() {
        Ok(())
    } else {
        Err(DomainError::unauthorized(
            "this view is restricted to admins",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_match_grants_admin() {
        let role = Role::for_email("owner@admin.tillbook.example", "@admin.tillbook.example");
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn suffix_match_is_case_insensitive() {
        let role = Role::for_email("Owner@ADMIN.Tillbook.Example", "@admin.tillbook.example");
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn other_emails_are_staff() {
        let role = Role::for_email("till@shop.example", "@admin.tillbook.example");
        assert_eq!(role, Role::Staff);
    }

    #[test]
    fn ensure_admin_rejects_staff() {
        assert!(ensure_admin(Role::Admin).is_ok());
        let err = ensure_admin(Role::Staff).unwrap_err();
        assert!(matches!(err, tillbook_core::DomainError::Unauthorized(_)));
    }
}
