//! Login, registration, and logout handlers.

use axum::{Form, Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::auth::{sign_in, sign_out};
use crate::models::User;
use crate::services::UserService;
use crate::services::users::Registration;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

/// Authenticate and bind the user to the session.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Json<User>> {
    let user = UserService::new(state.pool())
        .login(&form.email, &form.password)
        .await?;

    sign_in(&session, user.id).await?;
    tracing::info!(user_id = %user.id, "login");
    Ok(Json(user))
}

/// Create an account and sign it in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<(StatusCode, Json<User>)> {
    let registration = Registration {
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        password: form.password,
        phone: form.phone,
    };

    let user = UserService::new(state.pool()).register(&registration).await?;
    sign_in(&session, user.id).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Destroy the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Value>> {
    sign_out(&session).await?;
    Ok(Json(json!({ "logged_out": true })))
}
