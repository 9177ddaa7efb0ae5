use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaytabError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to parse import file: {0}")]
    Parse(String),

    #[error("User not authenticated")]
    AuthRequired,

    #[error("Storage is unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Remote backend error: {0}")]
    Remote(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PlaytabError>;
