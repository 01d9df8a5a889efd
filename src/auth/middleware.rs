//! Authentication middleware that validates cookies and extends sessions.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    auth::cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
    timezone::get_local_offset,
    user::{User, UserID, get_user_by_id},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid authorization cookie.
///
/// The user ID is placed into the request and the request executed normally
/// if the cookie is valid, otherwise a 401 JSON error is returned. Each
/// successful request pushes the cookie expiry out to at least
/// `cookie_duration` from now.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}");
            return Error::CookieMissing.into_response();
        }
    };
    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => {
            tracing::debug!("Rejected request to {}: {error}", parts.uri.path());
            return error.into_response();
        }
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        state.cookie_duration,
        local_offset,
    ) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Get the user behind `user_id` if they may record transactions.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidSession] if the user no longer exists,
/// - [Error::InsufficientPermission] if the user only has read permission,
/// - [Error::SqlError] if the user could not be loaded.
pub fn require_write_permission(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    let user = match get_user_by_id(user_id, connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::warn!("Session belongs to user {user_id} who no longer exists");
            return Err(Error::InvalidSession);
        }
        Err(error) => return Err(error),
    };

    if !user.can_write() {
        tracing::info!("User {user_id} tried to modify transactions without write permission");
        return Err(Error::InsufficientPermission);
    }

    Ok(user)
}

/// The state needed to look up the logged in user.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[cfg(test)]
mod auth_guard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json, Router,
        http::StatusCode,
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    use crate::{
        PasswordHash, ValidatedPassword,
        app_state::create_cookie_key,
        auth::{
            COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, LogInState, auth_guard,
            middleware::AuthState, post_log_in,
        },
        db::initialize,
        endpoints,
        user::{NewUser, Permission, Role, UserID, create_user},
    };

    async fn handler(Extension(user_id): Extension<UserID>) -> Json<i64> {
        Json(user_id.as_i64())
    }

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_user(
            NewUser {
                email: "ama@example.com".to_owned(),
                name: "Ama".to_owned(),
                role: Role::User,
                permission: Permission::Read,
                password_hash: PasswordHash::new(ValidatedPassword::new_unchecked("test"), 4)
                    .unwrap(),
            },
            &connection,
        )
        .unwrap();

        let cookie_key = create_cookie_key("foobar");
        let auth_state = AuthState {
            cookie_key: cookie_key.clone(),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
        };
        let log_in_state = LogInState {
            cookie_key,
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route("/protected", get(handler))
            .layer(middleware::from_fn_with_state(auth_state, auth_guard))
            .route(endpoints::LOG_IN_API, post(post_log_in))
            .with_state(log_in_state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    async fn log_in(server: &TestServer) -> Cookie<'static> {
        server
            .post(endpoints::LOG_IN_API)
            .json(&json!({ "email": "ama@example.com", "password": "test" }))
            .await
            .cookie(COOKIE_TOKEN)
    }

    #[tokio::test]
    async fn passes_user_id_to_handler() {
        let server = get_test_server();
        let cookie = log_in(&server).await;

        let response = server.get("/protected").add_cookie(cookie).await;

        response.assert_status_ok();
        response.assert_json(&1);
    }

    #[tokio::test]
    async fn rejects_missing_cookie_with_json_error() {
        let server = get_test_server();

        let response = server.get("/protected").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "You must be logged in to do that" }));
    }

    #[tokio::test]
    async fn rejects_tampered_cookie() {
        let server = get_test_server();

        let response = server
            .get("/protected")
            .add_cookie(Cookie::new(COOKIE_TOKEN, r#"{"user_id":1}"#))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refreshes_cookie_on_activity() {
        let server = get_test_server();
        let cookie = log_in(&server).await;

        let response = server.get("/protected").add_cookie(cookie).await;

        let refreshed = response.cookie(COOKIE_TOKEN);
        let expires = refreshed.expires_datetime().unwrap();
        assert!(
            (expires - (OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION)).abs()
                < Duration::seconds(2),
            "got expiry {expires:?}"
        );
    }
}
