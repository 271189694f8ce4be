//! Core types for Greengrocer.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod role;
pub mod sku;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::RoleRequirement;
pub use sku::{Sku, SkuError};
pub use status::OrderStatus;
