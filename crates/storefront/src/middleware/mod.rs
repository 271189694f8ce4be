//! Request middleware: sessions and authentication extractors.

pub mod auth;
pub mod session;

pub use auth::{CurrentVisitor, RequireAdmin, RequireAdminMode, RequireStaff, RequireUser};
pub use session::create_session_layer;
