//! The shared state handed to every route: the cookie key, the session length,
//! the business's timezone and the ledger database.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize, timezone::get_local_offset};

/// The state of the REST server.
///
/// Handlers take a narrower sub-state (e.g., `DashboardState`) built from this
/// via [FromRef].
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key for encrypting the private auth cookie.
    pub cookie_key: Key,

    /// How long a session lasts without activity.
    pub cookie_duration: Duration,

    /// The canonical name of the timezone the business reports in, e.g. "Africa/Accra".
    ///
    /// "Today" for future-date checks and the report's "prepared on" date use this zone.
    pub local_timezone: String,

    /// The ledger database holding users and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Open the ledger in `db_connection`, creating its tables if needed.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a
    /// canonical timezone name, or an SQL error if the tables cannot be created.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Use `duration` as the session length instead of [DEFAULT_COOKIE_DURATION].
    pub fn with_cookie_duration(mut self, duration: Duration) -> Self {
        self.cookie_duration = duration;
        self
    }
}

// `PrivateCookieJar` finds its key through this impl.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the cookie encryption key from `secret`.
///
/// The same secret always gives the same key, so sessions survive a restart.
pub fn create_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}
