//! Domain services.
//!
//! Services own validation, permission checks, and transaction boundaries;
//! repositories own SQL. Every mutating checkout/cart path runs inside a
//! single transaction so partial writes are never observable.

mod error;

pub mod cart;
pub mod catalog;
pub mod orders;
pub mod users;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use error::{ServiceError, ServiceResult};
pub use orders::OrderService;
pub use users::UserService;
