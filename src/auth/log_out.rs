//! Log-out route handler that invalidates the authentication cookie.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::auth::cookie::{get_token_from_cookies, invalidate_auth_cookie};

/// Invalidate the auth cookie and respond with 204 No Content.
///
/// Logging out without a valid session is not an error.
pub async fn post_log_out(jar: PrivateCookieJar) -> Response {
    if let Ok(token) = get_token_from_cookies(&jar) {
        tracing::info!("User {} logged out", token.user_id);
    }

    let jar = invalidate_auth_cookie(jar);

    (StatusCode::NO_CONTENT, jar).into_response()
}
