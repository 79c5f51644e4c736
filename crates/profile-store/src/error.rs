use thiserror::Error;

use crate::row::{Collection, UniqueField};

/// Errors that can occur when interacting with the profile store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert violated an active-row unique constraint.
    #[error("unique constraint violated on {collection}.{field}")]
    Conflict {
        collection: Collection,
        field: UniqueField,
    },

    /// The storage backend rejected or failed the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for profile store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
