//! Client-side session state.
//!
//! A [SessionState] remembers who is logged in between runs of a client. It
//! owns a [SessionStorage] backend that it loads from and saves to at explicit
//! points: [SessionState::restore] when the client starts, [SessionState::log_in]
//! and [SessionState::log_out] when the user changes.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    user::{AuthResponse, Permission, Role, UserID, UserResponse},
};

/// The logged in user as the client remembers them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user logs in with.
    pub email: String,
    /// The user's display name.
    pub name: String,
    /// The user's role.
    pub role: Role,
    /// Whether the user may record transactions. Stored in lower case.
    pub permission: Permission,
}

impl SessionUser {
    /// Whether the user may record transactions.
    pub fn can_write(&self) -> bool {
        self.permission == Permission::Write
    }
}

impl TryFrom<UserResponse> for SessionUser {
    type Error = Error;

    /// Normalise the upper case permission sent by the server.
    fn try_from(user: UserResponse) -> Result<Self, Self::Error> {
        let permission = match user.permission.to_lowercase().as_str() {
            "read" => Permission::Read,
            "write" => Permission::Write,
            other => {
                tracing::warn!("server sent unknown permission \"{other}\"");
                return Err(Error::InvalidSession);
            }
        };

        Ok(Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            permission,
        })
    }
}

/// What a [SessionStorage] persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    /// The credential the client sends with each request, e.g. the auth cookie.
    pub token: Option<String>,
    /// The user the token belongs to.
    pub user: SessionUser,
}

/// Somewhere to keep a [StoredSession] between runs.
pub trait SessionStorage {
    /// Read the stored session, if there is one.
    fn load(&self) -> Result<Option<StoredSession>, Error>;

    /// Replace the stored session with `session`.
    fn save(&mut self, session: &StoredSession) -> Result<(), Error>;

    /// Forget the stored session. Clearing empty storage is not an error.
    fn clear(&mut self) -> Result<(), Error>;
}

/// Keeps the session in memory only, so it is lost when the process exits.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStorage {
    session: Option<StoredSession>,
}

impl MemorySessionStorage {
    /// Storage that starts out holding `session`.
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Some(session),
        }
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<StoredSession>, Error> {
        Ok(self.session.clone())
    }

    fn save(&mut self, session: &StoredSession) -> Result<(), Error> {
        self.session = Some(session.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.session = None;
        Ok(())
    }
}

/// Keeps the session in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSessionStorage {
    path: PathBuf,
}

impl JsonFileSessionStorage {
    /// Storage backed by the file at `path`. The file is created on the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Where the session is stored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A sibling of [Self::path] with `.tmp` appended, never the path itself.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        name.into()
    }
}

impl SessionStorage for JsonFileSessionStorage {
    fn load(&self) -> Result<Option<StoredSession>, Error> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(storage_error(&self.path, error)),
        };

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|error| storage_error(&self.path, error))
    }

    fn save(&mut self, session: &StoredSession) -> Result<(), Error> {
        let json =
            serde_json::to_string_pretty(session).map_err(|error| storage_error(&self.path, error))?;

        // Write then rename so a crash never leaves half a file behind.
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json).map_err(|error| storage_error(&tmp_path, error))?;
        fs::rename(&tmp_path, &self.path).map_err(|error| storage_error(&self.path, error))
    }

    fn clear(&mut self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(storage_error(&self.path, error)),
        }
    }
}

fn storage_error(path: &Path, error: impl std::fmt::Display) -> Error {
    Error::SessionStorage(format!("{}: {error}", path.display()))
}

/// Who is logged in on this client.
#[derive(Debug)]
pub struct SessionState<S: SessionStorage> {
    storage: S,
    token: Option<String>,
    user: Option<SessionUser>,
    is_loading: bool,
}

impl<S: SessionStorage> SessionState<S> {
    /// Create a session over `storage`.
    ///
    /// The session counts as loading until [SessionState::restore] finishes.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            token: None,
            user: None,
            is_loading: true,
        }
    }

    /// The logged in user, if any.
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// The stored credential of the logged in user, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether the stored session is still being checked.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the stored session and check it with the server.
    ///
    /// `verify` is only called when a session was stored. If it succeeds, the
    /// refreshed user replaces the stored one. If it fails, or the stored
    /// session cannot be read, the storage is cleared and nobody is logged in.
    ///
    /// # Errors
    ///
    /// Returns [Error::SessionStorage] if the storage cannot be saved to or cleared.
    pub async fn restore<F, Fut>(&mut self, verify: F) -> Result<Option<&SessionUser>, Error>
    where
        F: FnOnce(StoredSession) -> Fut,
        Fut: Future<Output = Result<AuthResponse, Error>>,
    {
        self.is_loading = true;
        let result = self.restore_inner(verify).await;
        self.is_loading = false;

        result.map(|_| self.user.as_ref())
    }

    async fn restore_inner<F, Fut>(&mut self, verify: F) -> Result<(), Error>
    where
        F: FnOnce(StoredSession) -> Fut,
        Fut: Future<Output = Result<AuthResponse, Error>>,
    {
        let stored = match self.storage.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(()),
            Err(error) => {
                tracing::warn!("discarding unreadable session: {error}");
                return self.forget();
            }
        };

        // Show the remembered user while the server is asked.
        self.token = stored.token.clone();
        self.user = Some(stored.user.clone());

        let refreshed = verify(stored)
            .await
            .and_then(|response| SessionUser::try_from(response.user));

        match refreshed {
            Ok(user) => {
                self.storage.save(&StoredSession {
                    token: self.token.clone(),
                    user: user.clone(),
                })?;
                self.user = Some(user);
                Ok(())
            }
            Err(error) => {
                tracing::info!("stored session is no longer valid: {error}");
                self.forget()
            }
        }
    }

    /// Remember the user from a successful log-in response.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidSession] if the response has an unknown
    /// permission, or [Error::SessionStorage] if the session cannot be saved.
    pub fn log_in(&mut self, response: AuthResponse, token: Option<String>) -> Result<&SessionUser, Error> {
        let user = SessionUser::try_from(response.user)?;
        let stored = StoredSession { token, user };

        self.storage.save(&stored)?;
        self.token = stored.token;
        self.is_loading = false;

        Ok(self.user.insert(stored.user))
    }

    /// Forget the logged in user.
    ///
    /// # Errors
    ///
    /// Returns [Error::SessionStorage] if the storage cannot be cleared. The
    /// in-memory session is cleared regardless.
    pub fn log_out(&mut self) -> Result<(), Error> {
        self.forget()
    }

    fn forget(&mut self) -> Result<(), Error> {
        self.token = None;
        self.user = None;
        self.storage.clear()
    }
}
