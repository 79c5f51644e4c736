//! Relational row storage for the registration service.
//!
//! The store exposes keyed insert/delete over four collections (user index,
//! client profiles, studio profiles, addresses) plus uniqueness probes used
//! by the registration pre-checks. Two implementations are provided:
//! [`InMemoryProfileStore`] for tests and [`PostgresProfileStore`] backed by
//! sqlx. Both enforce the active-row unique constraints on email and tax id,
//! so a conflicting insert surfaces as [`StoreError::Conflict`] even when the
//! pre-flight check raced with a concurrent registration.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod row;
pub mod store;

pub use common::{RecordId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryProfileStore;
pub use postgres::PostgresProfileStore;
pub use row::{
    AccountRole, ActKind, AddressRow, ClientRow, Collection, Row, StudioRow, SubscriptionStatus,
    UniqueField, UserRow,
};
pub use store::ProfileStore;
