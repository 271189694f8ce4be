//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Featured products + categories
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (pings the database)
//!
//! # Catalog
//! GET  /products                - Paged product listing
//! GET  /products/search         - Filtered search (term/category/price)
//! GET  /products/category/{id}  - Products in one category
//! GET  /products/{id}           - Product detail
//! GET  /api/products/featured   - Featured products (limit param)
//! POST /products/{id}/update-quantity - Adjust stock (staff)
//! POST /products/{id}/toggle-active   - Activate/deactivate (staff)
//!
//! # Cart (requires login)
//! GET  /cart                    - Cart contents with totals
//! POST /cart/add                - Add product (quantities merge)
//! POST /cart/update/{item_id}   - Set line quantity (0 removes)
//! POST /cart/remove/{item_id}   - Remove line
//! POST /cart/clear              - Remove every line
//! GET  /cart/count              - Unit count badge (0 for guests)
//!
//! # Checkout & orders (requires login)
//! GET  /checkout                - Cart summary (empty cart redirects to /cart)
//! POST /orders/checkout         - Place order from cart
//! GET  /orders                  - Paged listing (status/date/search filters)
//! GET  /orders/{id}             - Order detail
//! POST /orders/{id}/status      - Transition status (staff)
//! POST /orders/{id}/cancel      - Cancel + restore stock (owner or staff)
//! POST /orders/{id}/reorder     - New order from an old one (owner)
//!
//! # Identity
//! POST /login                   - Authenticate, bind user to session
//! POST /register                - Create account, sign in
//! GET  /logout                  - Destroy session
//! GET  /profile                 - Own profile
//! POST /profile/update          - Update own profile
//!
//! # Admin (admin role + admin-mode flag)
//! POST /admin/toggle-mode       - Flip the session's admin-mode flag
//! GET  /admin/dashboard         - Status counts, low stock, user count
//! GET  /admin/customers         - Paged customer listing (search)
//! GET  /admin/customers/{id}    - Customer detail
//! POST /admin/customers/{id}/delete           - Destructive delete
//! POST /admin/customers/{id}/make-employee    - Grant employee flag
//! POST /admin/customers/{id}/remove-employee  - Revoke employee flag
//! POST /admin/customers/{id}/make-admin       - Grant admin flag
//! POST /admin/customers/{id}/remove-admin     - Revoke admin flag
//! POST /admin/products/add      - Create product
//! POST /admin/products/{id}/edit - Edit product
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod home;
pub mod orders;
pub mod products;
pub mod profile;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", products::routes())
        .route("/api/products/featured", get(products::featured))
        .nest("/cart", cart::routes())
        .route("/checkout", get(orders::checkout_page))
        .nest("/orders", orders::routes())
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", get(auth::logout))
        .route("/profile", get(profile::show))
        .route("/profile/update", post(profile::update))
        .nest("/admin", admin::routes())
}
