//! Access requirements for protected operations.

use serde::{Deserialize, Serialize};

/// The minimum access a route or operation demands.
///
/// Checked in exactly one place (`Visitor::satisfies` in the storefront)
/// rather than with ad-hoc flag tests scattered across handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleRequirement {
    /// Any signed-in (non-guest) user.
    SignedIn,
    /// An employee or admin.
    Staff,
    /// An admin.
    Admin,
}
