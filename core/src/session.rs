//! Persisted "logged-in user" record and the capability pages read it through.
//!
//! # Design
//! Storage is a flat string-to-string key/value document, the same shape as
//! browser local storage. The session occupies one key, `loggedInUser`, whose
//! value is the serialized `{jwt, user}` object. A login overwrites the key
//! wholesale; nothing ever edits a session in place.
//!
//! Pages never touch storage directly. They receive a `SessionProvider` and
//! ask it for the token or the user id; a missing session is an error value
//! rather than a crash at the point of use.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ApiError;
use crate::types::Session;

/// Storage key holding the serialized session.
pub const SESSION_KEY: &str = "loggedInUser";

/// Read/write access to the persisted session.
pub trait SessionStore {
    fn load(&self) -> Result<Option<Session>, ApiError>;
    fn save(&self, session: &Session) -> Result<(), ApiError>;
    fn clear(&self) -> Result<(), ApiError>;
}

/// What an authenticated page needs from the session.
pub trait SessionProvider {
    fn current_token(&self) -> Result<String, ApiError>;
    fn current_user_id(&self) -> Result<u64, ApiError>;
}

impl<S: SessionStore + ?Sized> SessionProvider for S {
    fn current_token(&self) -> Result<String, ApiError> {
        self.load()?
            .map(|s| s.jwt)
            .ok_or(ApiError::MissingSession)
    }

    fn current_user_id(&self) -> Result<u64, ApiError> {
        self.load()?
            .map(|s| s.user.id)
            .ok_or(ApiError::MissingSession)
    }
}

/// A JSON key/value file standing in for browser local storage.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> Result<BTreeMap<String, String>, ApiError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                ApiError::Storage(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ApiError::Storage(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write_items(&self, items: &BTreeMap<String, String>) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ApiError::Storage(format!("{}: {e}", parent.display())))?;
            }
        }
        let raw = serde_json::to_string_pretty(items)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        fs::write(&self.path, raw)
            .map_err(|e| ApiError::Storage(format!("{}: {e}", self.path.display())))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, ApiError> {
        let items = self.read_items()?;
        match items.get(SESSION_KEY) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| ApiError::Storage(format!("corrupt {SESSION_KEY}: {e}"))),
        }
    }

    fn save(&self, session: &Session) -> Result<(), ApiError> {
        let mut items = self.read_items()?;
        let raw = serde_json::to_string(session)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        items.insert(SESSION_KEY.to_string(), raw);
        self.write_items(&items)?;
        debug!(user_id = session.user.id, path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        let mut items = self.read_items()?;
        if items.remove(SESSION_KEY).is_some() {
            self.write_items(&items)?;
        }
        Ok(())
    }
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RefCell<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RefCell::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, ApiError> {
        Ok(self.session.borrow().clone())
    }

    fn save(&self, session: &Session) -> Result<(), ApiError> {
        *self.session.borrow_mut() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        self.session.borrow_mut().take();
        Ok(())
    }
}
