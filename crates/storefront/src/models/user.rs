//! User domain types and the request-scoped visitor identity.

use chrono::{DateTime, Utc};
use serde::Serialize;

use greengrocer_core::{Email, RoleRequirement, UserId};

/// A registered account: customer, employee, or admin.
///
/// The stored password is intentionally not part of this type; it is only
/// ever touched inside the user repository.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Email address (unique, case-sensitive).
    pub email: Email,
    pub phone: Option<String>,
    /// Employee flag; grants staff access alongside `is_admin`.
    pub is_employee: bool,
    /// Admin flag; required for the `/admin` surface.
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name, e.g. for order views.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Employees and admins count as staff.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.is_employee || self.is_admin
    }
}

/// The identity attached to a request: a signed-in user, or a synthesized
/// guest for sessions with no account.
///
/// Guests are an explicit value rather than the absence of a user, so
/// handlers and services share one shape for "who is asking".
#[derive(Debug, Clone)]
pub enum Visitor {
    /// Unauthenticated session.
    Guest,
    /// Authenticated session with a loaded account.
    SignedIn(User),
}

impl Visitor {
    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Guest => None,
            Self::SignedIn(user) => Some(user),
        }
    }

    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// The single capability check used by every guarded route and service.
    #[must_use]
    pub fn satisfies(&self, required: RoleRequirement) -> bool {
        match (self, required) {
            (Self::Guest, _) => false,
            (Self::SignedIn(_), RoleRequirement::SignedIn) => true,
            (Self::SignedIn(user), RoleRequirement::Staff) => user.is_staff(),
            (Self::SignedIn(user), RoleRequirement::Admin) => user.is_admin,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(is_employee: bool, is_admin: bool) -> User {
        User {
            id: UserId::new(1),
            first_name: "Jane".to_string(),
            last_name: "Smith".to_string(),
            email: Email::parse("jane.smith@example.com").unwrap(),
            phone: None,
            is_employee,
            is_admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(user(false, false).full_name(), "Jane Smith");
    }

    #[test]
    fn test_guest_satisfies_nothing() {
        for required in [
            RoleRequirement::SignedIn,
            RoleRequirement::Staff,
            RoleRequirement::Admin,
        ] {
            assert!(!Visitor::Guest.satisfies(required));
        }
    }

    #[test]
    fn test_customer_is_only_signed_in() {
        let visitor = Visitor::SignedIn(user(false, false));
        assert!(visitor.satisfies(RoleRequirement::SignedIn));
        assert!(!visitor.satisfies(RoleRequirement::Staff));
        assert!(!visitor.satisfies(RoleRequirement::Admin));
    }

    #[test]
    fn test_employee_is_staff_but_not_admin() {
        let visitor = Visitor::SignedIn(user(true, false));
        assert!(visitor.satisfies(RoleRequirement::SignedIn));
        assert!(visitor.satisfies(RoleRequirement::Staff));
        assert!(!visitor.satisfies(RoleRequirement::Admin));
    }

    #[test]
    fn test_admin_satisfies_everything() {
        let visitor = Visitor::SignedIn(user(false, true));
        assert!(visitor.satisfies(RoleRequirement::SignedIn));
        assert!(visitor.satisfies(RoleRequirement::Staff));
        assert!(visitor.satisfies(RoleRequirement::Admin));
    }
}
