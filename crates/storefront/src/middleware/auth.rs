//! Authentication middleware and extractors.
//!
//! The session stores only the user id and the admin-mode flag. Every
//! request resolves them into an explicit [`Visitor`] value (signed-in user
//! or synthesized guest) so handlers never poke at raw session state, and
//! role checks all funnel through `Visitor::satisfies`.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use greengrocer_core::{RoleRequirement, UserId};

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{User, Visitor};
use crate::state::AppState;

/// Keys under which identity state lives in the session.
pub mod session_keys {
    pub const USER_ID: &str = "user_id";
    pub const ADMIN_MODE: &str = "admin_mode";
}

/// Extractor resolving the request's identity, guest included.
///
/// Never rejects: an unauthenticated session (or a stale user id whose
/// account was deleted) yields `Visitor::Guest`.
pub struct CurrentVisitor(pub Visitor);

impl FromRequestParts<AppState> for CurrentVisitor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(Visitor::Guest));
        };

        let user_id: Option<UserId> = session
            .get(session_keys::USER_ID)
            .await
            .map_err(|e| AppError::Internal(format!("session load failed: {e}")))?;

        let visitor = match user_id {
            None => Visitor::Guest,
            Some(id) => match UserRepository::new(state.pool()).get_by_id(id).await? {
                Some(user) => Visitor::SignedIn(user),
                // Account deleted since sign-in; treat the session as guest.
                None => Visitor::Guest,
            },
        };

        Ok(Self(visitor))
    }
}

/// Extractor that requires a signed-in user.
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentVisitor(visitor) = CurrentVisitor::from_request_parts(parts, state).await?;
        match visitor {
            Visitor::SignedIn(user) => Ok(Self(user)),
            Visitor::Guest => Err(AppError::Unauthorized("please log in".to_owned())),
        }
    }
}

/// Extractor that requires an employee or admin.
pub struct RequireStaff(pub User);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentVisitor(visitor) = CurrentVisitor::from_request_parts(parts, state).await?;
        require(visitor, RoleRequirement::Staff, "staff access required").map(Self)
    }
}

/// Extractor that requires an admin.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentVisitor(visitor) = CurrentVisitor::from_request_parts(parts, state).await?;
        require(visitor, RoleRequirement::Admin, "admin privileges required").map(Self)
    }
}

/// Extractor for `/admin/*` pages: admin role plus the session's admin-mode
/// flag (admins browse the shop as customers until they toggle it on).
pub struct RequireAdminMode(pub User);

impl FromRequestParts<AppState> for RequireAdminMode {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentVisitor(visitor) = CurrentVisitor::from_request_parts(parts, state).await?;
        let user = require(visitor, RoleRequirement::Admin, "admin privileges required")?;

        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("please log in".to_owned()))?;

        if !admin_mode(session).await? {
            return Err(AppError::Service(
                crate::services::ServiceError::Forbidden("admin mode is not enabled".to_owned()),
            ));
        }

        Ok(Self(user))
    }
}

fn require(
    visitor: Visitor,
    required: RoleRequirement,
    denied: &str,
) -> Result<User, AppError> {
    let allowed = visitor.satisfies(required);
    match visitor {
        Visitor::Guest => Err(AppError::Unauthorized("please log in".to_owned())),
        Visitor::SignedIn(user) if allowed => Ok(user),
        Visitor::SignedIn(_) => Err(AppError::Service(
            crate::services::ServiceError::Forbidden(denied.to_owned()),
        )),
    }
}

/// Record a successful login in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_in(session: &Session, user_id: UserId) -> Result<(), AppError> {
    session
        .insert(session_keys::USER_ID, user_id)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))
}

/// Destroy the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_out(session: &Session) -> Result<(), AppError> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))
}

/// Whether the session currently has admin mode enabled.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn admin_mode(session: &Session) -> Result<bool, AppError> {
    Ok(session
        .get::<bool>(session_keys::ADMIN_MODE)
        .await
        .map_err(|e| AppError::Internal(format!("session load failed: {e}")))?
        .unwrap_or(false))
}

/// Flip the session's admin-mode flag, returning the new value.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn toggle_admin_mode(session: &Session) -> Result<bool, AppError> {
    let enabled = !admin_mode(session).await?;
    session
        .insert(session_keys::ADMIN_MODE, enabled)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
    Ok(enabled)
}
