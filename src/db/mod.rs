//! Client-side persistence for the auth session, the way the backend SDKs
//! keep it: browser local storage on web, a small sqlite file on native.
//! Nothing else is persisted; caches and stores are memory-only.

use crate::api::AuthSession;

#[cfg(target_arch = "wasm32")]
use gloo_storage::{errors::StorageError, LocalStorage, Storage};

/// Error type for database operations on native platforms
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct DbError(String);

#[cfg(not(target_arch = "wasm32"))]
impl DbError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl std::error::Error for DbError {}

#[cfg(target_arch = "wasm32")]
const SESSION_KEY: &str = "chelly.auth_session";

#[cfg(target_arch = "wasm32")]
pub async fn save_session(session: &AuthSession) -> Result<(), StorageError> {
    LocalStorage::set(SESSION_KEY, session)
}

#[cfg(target_arch = "wasm32")]
pub async fn load_session() -> Result<Option<AuthSession>, StorageError> {
    match LocalStorage::get::<AuthSession>(SESSION_KEY) {
        Ok(session) => Ok(Some(session)),
        Err(StorageError::KeyNotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn clear_session() -> Result<(), StorageError> {
    LocalStorage::delete(SESSION_KEY);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn get_db_connection() -> Result<rusqlite::Connection, DbError> {
    let mut path = dirs::data_dir().ok_or_else(|| DbError::new("No data directory available"))?;
    path.push("chelly");
    std::fs::create_dir_all(&path).map_err(|e| DbError::new(e.to_string()))?;
    path.push("chelly.db");

    let conn = rusqlite::Connection::open(path).map_err(|e| DbError::new(e.to_string()))?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS auth_session (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            payload TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| DbError::new(e.to_string()))?;

    Ok(conn)
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn save_session(session: &AuthSession) -> Result<(), DbError> {
    let conn = get_db_connection()?;
    let payload = serde_json::to_string(session).map_err(|e| DbError::new(e.to_string()))?;
    conn.execute(
        "INSERT INTO auth_session (id, payload) VALUES (1, ?1)
         ON CONFLICT(id) DO UPDATE SET payload = excluded.payload",
        [&payload],
    )
    .map_err(|e| DbError::new(e.to_string()))?;
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn load_session() -> Result<Option<AuthSession>, DbError> {
    let conn = get_db_connection()?;
    let mut stmt = conn
        .prepare("SELECT payload FROM auth_session WHERE id = 1")
        .map_err(|e| DbError::new(e.to_string()))?;

    let payload: Option<String> = stmt
        .query_row([], |row| row.get(0))
        .map(Some)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(DbError::new(other.to_string())),
        })?;

    Ok(payload.and_then(|text| serde_json::from_str(&text).ok()))
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn clear_session() -> Result<(), DbError> {
    let conn = get_db_connection()?;
    conn.execute("DELETE FROM auth_session", [])
        .map_err(|e| DbError::new(e.to_string()))?;
    Ok(())
}
