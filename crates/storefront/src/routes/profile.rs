//! Profile handlers.

use axum::{Form, Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::db::users::ProfileUpdate;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::User;
use crate::services::UserService;
use crate::state::AppState;

/// Profile update form data. An absent password keeps the current one.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// The signed-in user's profile.
#[instrument(skip(user))]
pub async fn show(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}

/// Update the signed-in user's profile.
#[instrument(skip(user, state, form))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Form(form): Form<ProfileForm>,
) -> Result<Json<User>> {
    let update = ProfileUpdate {
        first_name: form.first_name,
        last_name: form.last_name,
        phone: form.phone,
        password: form.password.filter(|p| !p.is_empty()),
    };

    let updated = UserService::new(state.pool())
        .update_profile(user.id, &update)
        .await?;
    Ok(Json(updated))
}
