use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::RecordId;
use tokio::sync::RwLock;

use crate::row::{Collection, Row, UniqueField};
use crate::store::ProfileStore;
use crate::{Result, StoreError};

#[derive(Debug, Clone)]
struct StoredRow {
    row: Row,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    rows: HashMap<Collection, Vec<StoredRow>>,
    fail_inserts: HashSet<Collection>,
    fail_exists: bool,
}

/// In-memory profile store implementation for testing.
///
/// Stores rows per collection and enforces the same active-row unique
/// constraints as the PostgreSQL implementation. Inserts can be failed on
/// demand per collection to exercise saga compensation paths.
#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryProfileStore {
    /// Creates a new empty in-memory profile store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures inserts into `collection` to fail.
    pub async fn set_fail_on_insert(&self, collection: Collection, fail: bool) {
        let mut state = self.state.write().await;
        if fail {
            state.fail_inserts.insert(collection);
        } else {
            state.fail_inserts.remove(&collection);
        }
    }

    /// Configures uniqueness probes to fail.
    pub async fn set_fail_on_exists(&self, fail: bool) {
        self.state.write().await.fail_exists = fail;
    }

    /// Returns the number of non-deleted rows in a collection.
    pub async fn row_count(&self, collection: Collection) -> usize {
        self.state
            .read()
            .await
            .rows
            .get(&collection)
            .map(|rows| rows.iter().filter(|r| r.deleted_at.is_none()).count())
            .unwrap_or(0)
    }

    /// Returns a non-deleted row by primary key.
    pub async fn get_row(&self, collection: Collection, id: RecordId) -> Option<Row> {
        self.state
            .read()
            .await
            .rows
            .get(&collection)
            .and_then(|rows| {
                rows.iter()
                    .find(|r| r.deleted_at.is_none() && r.row.id() == id)
            })
            .map(|r| r.row.clone())
    }

    /// Soft-deletes a row, removing it from the uniqueness scope while
    /// keeping it stored.
    pub async fn mark_deleted(&self, collection: Collection, id: RecordId) {
        let mut state = self.state.write().await;
        if let Some(rows) = state.rows.get_mut(&collection) {
            for stored in rows.iter_mut() {
                if stored.row.id() == id {
                    stored.deleted_at = Some(Utc::now());
                }
            }
        }
    }

    fn conflict_for(state: &State, row: &Row) -> Option<StoreError> {
        match row {
            Row::User(user) => {
                if Self::probe(state, UniqueField::Email, &user.email) {
                    return Some(StoreError::Conflict {
                        collection: Collection::Users,
                        field: UniqueField::Email,
                    });
                }
            }
            Row::Client(client) => {
                if Self::probe(state, UniqueField::TaxId, &client.tax_id) {
                    return Some(StoreError::Conflict {
                        collection: Collection::Clients,
                        field: UniqueField::TaxId,
                    });
                }
            }
            Row::Studio(studio) => {
                if Self::probe(state, UniqueField::TaxId, &studio.tax_id) {
                    return Some(StoreError::Conflict {
                        collection: Collection::Studios,
                        field: UniqueField::TaxId,
                    });
                }
            }
            Row::Address(_) => {}
        }
        None
    }

    fn probe(state: &State, field: UniqueField, value: &str) -> bool {
        let collections: &[Collection] = match field {
            UniqueField::Email => &[Collection::Users],
            UniqueField::TaxId => &[Collection::Clients, Collection::Studios],
        };

        collections.iter().any(|collection| {
            state
                .rows
                .get(collection)
                .map(|rows| {
                    rows.iter()
                        .filter(|r| r.deleted_at.is_none())
                        .any(|r| match (&r.row, field) {
                            (Row::User(u), UniqueField::Email) => u.email == value,
                            (Row::Client(c), UniqueField::TaxId) => c.tax_id == value,
                            (Row::Studio(s), UniqueField::TaxId) => s.tax_id == value,
                            _ => false,
                        })
                })
                .unwrap_or(false)
        })
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn insert(&self, row: Row) -> Result<RecordId> {
        let mut state = self.state.write().await;
        let collection = row.collection();

        if state.fail_inserts.contains(&collection) {
            return Err(StoreError::Backend(format!(
                "insert into {collection} unavailable"
            )));
        }

        if let Some(conflict) = Self::conflict_for(&state, &row) {
            return Err(conflict);
        }

        let id = row.id();
        state.rows.entry(collection).or_default().push(StoredRow {
            row,
            deleted_at: None,
        });
        Ok(id)
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(rows) = state.rows.get_mut(&collection) {
            rows.retain(|r| r.row.id() != id);
        }
        Ok(())
    }

    async fn exists(&self, field: UniqueField, value: &str) -> Result<bool> {
        let state = self.state.read().await;
        if state.fail_exists {
            return Err(StoreError::Backend("exists probe unavailable".to_string()));
        }
        Ok(Self::probe(&state, field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{AccountRole, UserRow};
    use common::UserId;

    fn user_row(email: &str) -> Row {
        Row::User(UserRow {
            id: UserId::new(),
            email: email.to_string(),
            role: AccountRole::Client,
        })
    }

    #[tokio::test]
    async fn insert_and_exists() {
        let store = InMemoryProfileStore::new();
        store.insert(user_row("a@b.com")).await.unwrap();

        assert!(store.exists(UniqueField::Email, "a@b.com").await.unwrap());
        assert!(!store.exists(UniqueField::Email, "c@d.com").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryProfileStore::new();
        store.insert(user_row("a@b.com")).await.unwrap();

        let err = store.insert(user_row("a@b.com")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                field: UniqueField::Email,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn soft_deleted_rows_leave_uniqueness_scope() {
        let store = InMemoryProfileStore::new();
        let id = store.insert(user_row("a@b.com")).await.unwrap();
        store.mark_deleted(Collection::Users, id).await;

        assert!(!store.exists(UniqueField::Email, "a@b.com").await.unwrap());
        // A new registration with the same email is allowed again.
        store.insert(user_row("a@b.com")).await.unwrap();
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryProfileStore::new();
        let id = store.insert(user_row("a@b.com")).await.unwrap();

        store.delete(Collection::Users, id).await.unwrap();
        store.delete(Collection::Users, id).await.unwrap();
        assert_eq!(store.row_count(Collection::Users).await, 0);
    }

    #[tokio::test]
    async fn injected_insert_failure() {
        let store = InMemoryProfileStore::new();
        store.set_fail_on_insert(Collection::Users, true).await;

        let err = store.insert(user_row("a@b.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(store.row_count(Collection::Users).await, 0);
    }
}
