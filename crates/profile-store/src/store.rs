use async_trait::async_trait;
use common::RecordId;

use crate::row::{Collection, Row, UniqueField};
use crate::Result;

/// Core trait for profile store implementations.
///
/// All implementations must be thread-safe (Send + Sync) and must enforce
/// the active-row unique constraints on email and tax id at insert time,
/// surfacing violations as [`crate::StoreError::Conflict`].
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Inserts a row into its collection.
    ///
    /// Returns the row's primary key. Fails with `Conflict` when the row
    /// violates a unique constraint against a non-deleted row.
    async fn insert(&self, row: Row) -> Result<RecordId>;

    /// Deletes a row by primary key.
    ///
    /// Idempotent: deleting a row that does not exist is not an error.
    async fn delete(&self, collection: Collection, id: RecordId) -> Result<()>;

    /// Returns true if a non-deleted row holds `value` in the unique field.
    ///
    /// Soft-deleted rows are excluded from the uniqueness scope. A query
    /// error is distinct from "not found" and must propagate.
    async fn exists(&self, field: UniqueField, value: &str) -> Result<bool>;
}
