use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("No per-user data directory on this platform")]
    NoDataDir,

    /// Creating the cache directory failed.
    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema migration v{version} failed: {reason}")]
    Migration { version: u32, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
