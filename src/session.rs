//! Operator session and the persisted local key-value store it lives in.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::api::{ApiClient, ApiError};
use crate::models::{Role, User};

const SESSION_KEY: &str = "session";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("local store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("local store contents are not valid json: {0}")]
    Format(#[from] serde_json::Error),
}

/// String key-value store persisted as one JSON object on disk.
/// Every write rewrites the file through a temporary file in the same directory.
#[derive(Debug, Default)]
pub struct LocalStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl LocalStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), "Opened local store");
        Ok(LocalStore {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    pub fn in_memory() -> Self {
        LocalStore::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.lock();
        entries.insert(key.to_owned(), value);
        self.persist(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.get(key)
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StoreError::from)
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.set(key, serde_json::to_string(value)?)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // a poisoned map is still a valid map
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&serde_json::to_vec_pretty(entries)?)?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn session(&self) -> Option<Session> {
        match self.get_json::<Session>(SESSION_KEY) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "Discarding unreadable session");
                None
            }
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        self.set_json(SESSION_KEY, session)
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        self.remove(SESSION_KEY)
    }
}

/// Who is operating the console. Resolved once per request and handed to
/// whatever needs the operator id or role.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for Session {
    fn from(user: User) -> Self {
        Session {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Please enter both email and password")]
    MissingCredentials,
    #[error("Invalid email or password. Please try again.")]
    Rejected(#[source] ApiError),
    #[error("Could not reach the server. Please try again.")]
    Unreachable(#[source] ApiError),
    #[error("Could not save the session: {0}")]
    Store(#[from] StoreError),
}

pub async fn login(
    api: &ApiClient,
    store: &LocalStore,
    email: &str,
    password: &SecretString,
) -> Result<Session, LoginError> {
    let email = email.trim();
    if email.is_empty() || password.expose_secret().is_empty() {
        return Err(LoginError::MissingCredentials);
    }
    let user = api.login(email, password).await.map_err(|err| match err {
        ApiError::Backend { .. } => LoginError::Rejected(err),
        ApiError::Transport(_) | ApiError::Url(_) => LoginError::Unreachable(err),
    })?;
    let session = Session::from(user);
    store.save_session(&session)?;
    tracing::info!(user = %session.username, role = %session.role, "Operator logged in");
    Ok(session)
}

pub fn logout(store: &LocalStore) -> Result<(), StoreError> {
    store.clear_session()?;
    tracing::info!("Operator logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{admin_session, FakeBackend};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let store = LocalStore::open(&path).unwrap();
        store.save_session(&admin_session()).unwrap();
        store.set("theme", "dark".into()).unwrap();

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.session(), Some(admin_session()));
        assert_eq!(reopened.get("theme").as_deref(), Some("dark"));

        logout(&reopened).unwrap();
        assert_eq!(LocalStore::open(&path).unwrap().session(), None);
    }

    #[test]
    fn corrupt_session_is_ignored() {
        let store = LocalStore::in_memory();
        store.set(SESSION_KEY, "{not json".into()).unwrap();
        assert_eq!(store.session(), None);
    }

    #[tokio::test]
    async fn login_stores_session() {
        let backend = FakeBackend::start(Router::new().route(
            "/api/users/login",
            post(|Json(body): Json<Value>| async move {
                if body["password"] == "admin123" {
                    Ok(Json(json!({"user": {
                        "_id": "admin-1", "username": "granny",
                        "email": body["email"], "role": "admin"
                    }})))
                } else {
                    Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "bad credentials"}))))
                }
            }),
        ))
        .await;
        let store = LocalStore::in_memory();
        let api = backend.client();

        let wrong = login(&api, &store, "admin@quizgranny.com", &SecretString::from("nope".to_owned())).await;
        assert!(matches!(wrong, Err(LoginError::Rejected(_))));
        assert_eq!(store.session(), None);

        let session = login(&api, &store, " admin@quizgranny.com ", &SecretString::from("admin123".to_owned()))
            .await
            .unwrap();
        assert!(session.is_admin());
        assert_eq!(session.email, "admin@quizgranny.com");
        assert_eq!(store.session(), Some(session));
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let store = LocalStore::in_memory();
        let api = crate::testing::unreachable_client();
        let result = login(&api, &store, "", &SecretString::from("x".to_owned())).await;
        assert!(matches!(result, Err(LoginError::MissingCredentials)));
    }
}
