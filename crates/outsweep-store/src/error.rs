use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp {value:?}: {reason}")]
    Timestamp { value: String, reason: String },

    #[error("Unknown item id {0}")]
    UnknownItem(u64),

    #[error("Store not available: {0}")]
    Unavailable(String),
}
