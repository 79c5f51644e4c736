//! Registration error types.

use profile_store::{StoreError, UniqueField};
use thiserror::Error;

/// Errors that can terminate a registration saga.
///
/// Best-effort step failures (address enrichment, billing) never appear
/// here: they are absorbed at the call site and the saga proceeds without
/// the enriched data.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A mandatory field for the request's kind is empty after trimming.
    #[error("missing required field: {field}")]
    Validation { field: &'static str },

    /// The email or tax id is already registered to a non-deleted profile.
    #[error("{field} already registered")]
    Conflict { field: UniqueField },

    /// The identity service failed to create the principal.
    #[error("identity service error: {0}")]
    Identity(String),

    /// The profile store failed a query or a mandatory insert.
    #[error("profile store error: {0}")]
    Store(#[from] StoreError),

    /// Any unexpected failure. The message is caller-safe.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for registration results.
pub type Result<T> = std::result::Result<T, RegistrationError>;
