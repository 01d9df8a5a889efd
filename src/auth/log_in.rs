//! Defines the JSON endpoint for logging in with an email address and password.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::{PrivateCookieJar, WithRejection, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::cookie::set_auth_cookie,
    timezone::get_local_offset,
    user::{AuthResponse, UserResponse, get_user_by_email},
};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by the client.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the hash in the database.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInRequest {
    /// Email address entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Handler for log-in requests.
///
/// On success the auth cookie is set and the user's details are returned.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if no user has the email address or
/// the password does not match. Both cases give the same response so that
/// clients cannot probe for registered addresses.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    WithRejection(Json(credentials), _): WithRejection<Json<LogInRequest>, Error>,
) -> Result<(PrivateCookieJar, Json<AuthResponse>), Error> {
    let email = credentials.email.trim().to_lowercase();

    let user = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::info!("Log-in attempt for unknown email address");
                return Err(Error::InvalidCredentials);
            }
            Err(error) => {
                tracing::error!("Unhandled error while verifying credentials: {error}");
                return Err(error);
            }
        }
    };

    let is_password_valid = user
        .password_hash
        .verify(&credentials.password)
        .inspect_err(|error| tracing::error!("Unhandled error while verifying credentials: {error}"))?;

    if !is_password_valid {
        tracing::info!("Incorrect password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration, local_offset)
        .inspect_err(|error| tracing::error!("Error setting auth cookie: {error}"))?;

    tracing::info!("User {} logged in", user.id);

    Ok((
        jar,
        Json(AuthResponse {
            user: UserResponse::from(&user),
        }),
    ))
}
