//! Cookie based authentication: logging in and out, checking sessions and
//! guarding routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod token;
mod verify;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{LogInRequest, LogInState, post_log_in};
pub use log_out::post_log_out;
pub use middleware::{AuthState, UserState, auth_guard, require_write_permission};
pub(crate) use token::Token;
pub use verify::get_verify_session;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
