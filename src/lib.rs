//! Ledgerline is a web app for tracking the income and expenditure of a small business.
//!
//! This library provides a JSON API for recording transactions and summarising
//! them, plus an HTML financial report. The aggregation rules live in the pure
//! [report] module, which knows nothing about HTTP or the database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod app_state;
mod auth;
mod dashboard;
mod db;
mod endpoints;
mod filters;
mod html;
mod logging;
mod password;
pub mod report;
mod routing;
pub mod session;
mod timezone;
pub mod transaction;
pub mod user;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use timezone::get_local_offset;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth cookie exists but has expired or could not be decoded.
    #[error("the session has expired or is invalid")]
    InvalidSession,

    /// There was an error formatting or computing a cookie expiry date time.
    #[error("could not compute the cookie expiry: {0}")]
    CookieExpiry(String),

    /// The user does not have the permission needed for the request.
    #[error("you do not have permission to modify transactions")]
    InsufficientPermission,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address is empty or does not look like an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A user with the given email address is already registered.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// A transaction amount was negative, not a number, or too large.
    #[error("{0} is not a valid amount, amounts must be from 0 to 1000000000000")]
    InvalidAmount(f64),

    /// An expenditure was submitted without a category.
    #[error("expenditures must have a category")]
    MissingCategory,

    /// A date could not be parsed.
    ///
    /// Holds the name of the offending field and the raw value.
    #[error("could not parse {field} \"{value}\", dates must look like YYYY-MM-DD")]
    InvalidDate {
        /// The name of the field holding the date.
        field: String,
        /// The text that failed to parse.
        value: String,
    },

    /// The start of a date range is after its end.
    #[error("the start date {0} is after the end date {1}")]
    InvalidDateRange(Date, Date),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// A request body was not valid JSON or did not have the expected fields.
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// The client session could not be read from or written to its storage.
    #[error("could not access the stored session: {0}")]
    SessionStorage(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody(rejection.body_text())
    }
}

impl Error {
    /// The HTTP status code the error maps to.
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::CookieMissing | Error::InvalidSession => {
                StatusCode::UNAUTHORIZED
            }
            Error::InsufficientPermission => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::InvalidAmount(_)
            | Error::InvalidRequestBody(_)
            | Error::MissingCategory
            | Error::InvalidDate { .. }
            | Error::InvalidDateRange(_, _)
            | Error::FutureDate(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            Error::InvalidCredentials => "Invalid email or password".to_owned(),
            Error::CookieMissing | Error::InvalidSession => {
                "You must be logged in to do that".to_owned()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
