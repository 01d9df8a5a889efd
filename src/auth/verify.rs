//! Defines the endpoint clients use to check that their session is still valid.

use axum::{Extension, Json, extract::State};

use crate::{
    Error,
    auth::middleware::UserState,
    user::{AuthResponse, UserID, UserResponse, get_user_by_id},
};

/// Return the details of the logged in user.
///
/// Must sit behind [auth_guard](crate::auth::auth_guard), which rejects
/// requests without a valid session before they get here.
///
/// # Errors
///
/// Returns [Error::InvalidSession] if the user has since been deleted.
pub async fn get_verify_session(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<AuthResponse>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidSession,
        error => error,
    })?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
    }))
}
