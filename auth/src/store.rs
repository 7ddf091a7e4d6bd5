//! Session persistence.
//!
//! The session lives in the system keyring as a JSON blob. `MOCK_KEYRING`
//! swaps in a process-local map for tests and headless runs. With the
//! `file-store` feature, `USE_FILE_STORE` keeps it in
//! `~/.mediavault/session.json` instead, and a failing keyring falls back to
//! that file.

use crate::{AuthError, Session};
use keyring::Entry;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

const KEYRING_SERVICE_NAME: &str = "MediaVault";
const SESSION_ENTRY: &str = "session";
const MOCK_KEYRING_ENV: &str = "MOCK_KEYRING";
const MOCK_KEYRING_FAIL_ENV: &str = "MOCK_KEYRING_FAIL";
pub const USE_FILE_STORE_ENV: &str = "USE_FILE_STORE";

static MOCK_STORE: Lazy<Mutex<HashMap<String, String>>> = Lazy::new(|| Mutex::new(HashMap::new()));

enum Backend {
    Mock,
    Keyring,
    #[cfg(feature = "file-store")]
    File(std::path::PathBuf),
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty() && v != "0").unwrap_or(false)
}

fn backend() -> Backend {
    #[cfg(feature = "file-store")]
    if env_flag(USE_FILE_STORE_ENV) {
        return Backend::File(file_store::session_path());
    }
    if env_flag(MOCK_KEYRING_ENV) || env_flag(MOCK_KEYRING_FAIL_ENV) {
        return Backend::Mock;
    }
    Backend::Keyring
}

pub(crate) fn save_session(session: &Session) -> Result<(), AuthError> {
    let data = serde_json::to_string(session).map_err(|e| AuthError::Keyring(e.to_string()))?;
    match write_raw(&data) {
        Ok(()) => Ok(()),
        #[cfg(feature = "file-store")]
        Err(AuthError::Keyring(msg)) => {
            tracing::warn!(error = %msg, "Keyring unavailable, storing session on disk");
            file_store::write(&file_store::session_path(), &data)?;
            std::env::set_var(USE_FILE_STORE_ENV, "1");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn load_session() -> Result<Option<Session>, AuthError> {
    match read_raw()? {
        Some(data) => serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| AuthError::Keyring(format!("corrupt stored session: {}", e))),
        None => Ok(None),
    }
}

pub(crate) fn clear_session() -> Result<(), AuthError> {
    match backend() {
        Backend::Mock => {
            mock_store()?.remove(SESSION_ENTRY);
            Ok(())
        }
        Backend::Keyring => {
            let entry = keyring_entry()?;
            match entry.delete_password() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(AuthError::Keyring(e.to_string())),
            }
        }
        #[cfg(feature = "file-store")]
        Backend::File(path) => file_store::remove(&path),
    }
}

fn write_raw(data: &str) -> Result<(), AuthError> {
    match backend() {
        Backend::Mock => {
            if env_flag(MOCK_KEYRING_FAIL_ENV) {
                return Err(AuthError::Keyring("mock keyring failure".into()));
            }
            mock_store()?.insert(SESSION_ENTRY.to_string(), data.to_string());
            Ok(())
        }
        Backend::Keyring => keyring_entry()?
            .set_password(data)
            .map_err(|e| AuthError::Keyring(e.to_string())),
        #[cfg(feature = "file-store")]
        Backend::File(path) => file_store::write(&path, data),
    }
}

fn read_raw() -> Result<Option<String>, AuthError> {
    match backend() {
        Backend::Mock => Ok(mock_store()?.get(SESSION_ENTRY).cloned()),
        Backend::Keyring => match keyring_entry()?.get_password() {
            Ok(data) => Ok(Some(data)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AuthError::Keyring(e.to_string())),
        },
        #[cfg(feature = "file-store")]
        Backend::File(path) => file_store::read(&path),
    }
}

fn keyring_entry() -> Result<Entry, AuthError> {
    Entry::new(KEYRING_SERVICE_NAME, SESSION_ENTRY).map_err(|e| AuthError::Keyring(e.to_string()))
}

fn mock_store() -> Result<std::sync::MutexGuard<'static, HashMap<String, String>>, AuthError> {
    MOCK_STORE
        .lock()
        .map_err(|_| AuthError::Keyring("mock keyring poisoned".into()))
}

#[cfg(feature = "file-store")]
mod file_store {
    use crate::AuthError;
    use std::path::{Path, PathBuf};

    pub fn session_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mediavault")
            .join("session.json")
    }

    pub fn write(path: &Path, data: &str) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AuthError::Keyring(e.to_string()))?;
        }
        std::fs::write(path, data).map_err(|e| AuthError::Keyring(e.to_string()))
    }

    pub fn read(path: &Path) -> Result<Option<String>, AuthError> {
        match std::fs::read_to_string(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::Keyring(e.to_string())),
        }
    }

    pub fn remove(path: &Path) -> Result<(), AuthError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Keyring(e.to_string())),
        }
    }
}
