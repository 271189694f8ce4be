//! Domain models for the storefront.
//!
//! These are validated domain objects; the `db` layer maps rows straight
//! into them via `sqlx::FromRow`.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::{Cart, CartContents, CartItem, CartLine};
pub use catalog::{Product, ProductCategory};
pub use order::{Order, OrderDetail, OrderItem};
pub use user::{User, Visitor};
