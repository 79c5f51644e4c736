//! Compensation stack for unwinding mandatory saga steps.

use common::{RecordId, UserId};
use profile_store::{Collection, ProfileStore};

use crate::services::identity::IdentityProvider;

/// An undo action for one committed mandatory step.
#[derive(Debug, Clone, PartialEq)]
pub enum Compensation {
    /// Delete the provisioned identity.
    DeleteIdentity(UserId),
    /// Delete a row inserted into a collection.
    DeleteRow {
        collection: Collection,
        id: RecordId,
    },
}

impl std::fmt::Display for Compensation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compensation::DeleteIdentity(id) => write!(f, "delete identity {id}"),
            Compensation::DeleteRow { collection, id } => {
                write!(f, "delete {collection} row {id}")
            }
        }
    }
}

/// Undo actions for the mandatory steps committed so far.
///
/// Each mandatory step pushes its own compensation on success; best-effort
/// steps never push. On terminal failure the stack unwinds most-recent
/// first. A compensation that fails is logged and counted but does not
/// stop the remaining compensations; cleanup is best-effort and the saga's
/// failure is reported to the caller regardless.
#[derive(Debug, Default)]
pub struct CompensationStack {
    actions: Vec<Compensation>,
}

impl CompensationStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the undo action for a step that just committed.
    pub fn push(&mut self, action: Compensation) {
        self.actions.push(action);
    }

    /// Returns the number of recorded actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if no actions are recorded.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs all recorded compensations in reverse order.
    ///
    /// Returns the number of compensations that failed.
    pub async fn unwind<I, D>(self, identity: &I, store: &D) -> usize
    where
        I: IdentityProvider,
        D: ProfileStore,
    {
        let mut failures = 0;

        for action in self.actions.into_iter().rev() {
            let result = match &action {
                Compensation::DeleteIdentity(id) => identity
                    .delete_identity(*id)
                    .await
                    .map_err(|e| e.to_string()),
                Compensation::DeleteRow { collection, id } => store
                    .delete(*collection, *id)
                    .await
                    .map_err(|e| e.to_string()),
            };

            match result {
                Ok(()) => {
                    tracing::info!(compensation = %action, "compensation applied");
                }
                Err(error) => {
                    failures += 1;
                    metrics::counter!("registration_compensation_failures").increment(1);
                    tracing::warn!(compensation = %action, %error, "compensation failed");
                }
            }
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile_store::{AccountRole, InMemoryProfileStore, Row, UserRow};
    use secrecy::SecretString;

    use crate::services::identity::InMemoryIdentityProvider;

    #[tokio::test]
    async fn unwinds_in_reverse_order() {
        let identity = InMemoryIdentityProvider::new();
        let store = InMemoryProfileStore::new();

        let provisioned = identity
            .create_identity("ana@example.com", &SecretString::from("s3cret"))
            .await
            .unwrap();
        let row_id = store
            .insert(Row::User(UserRow {
                id: provisioned.id,
                email: "ana@example.com".to_string(),
                role: AccountRole::Client,
            }))
            .await
            .unwrap();

        let mut stack = CompensationStack::new();
        stack.push(Compensation::DeleteIdentity(provisioned.id));
        stack.push(Compensation::DeleteRow {
            collection: Collection::Users,
            id: row_id,
        });
        assert_eq!(stack.len(), 2);

        let failures = stack.unwind(&identity, &store).await;
        assert_eq!(failures, 0);
        assert_eq!(identity.identity_count(), 0);
        assert_eq!(store.row_count(Collection::Users).await, 0);
    }

    #[tokio::test]
    async fn compensations_are_idempotent() {
        let identity = InMemoryIdentityProvider::new();
        let store = InMemoryProfileStore::new();

        let provisioned = identity
            .create_identity("ana@example.com", &SecretString::from("s3cret"))
            .await
            .unwrap();

        // Unwinding the same undo action twice produces no error and no
        // additional side effect.
        for _ in 0..2 {
            let mut stack = CompensationStack::new();
            stack.push(Compensation::DeleteIdentity(provisioned.id));
            stack.push(Compensation::DeleteRow {
                collection: Collection::Users,
                id: RecordId::new(),
            });
            let failures = stack.unwind(&identity, &store).await;
            assert_eq!(failures, 0);
        }
        assert_eq!(identity.identity_count(), 0);
    }

    #[tokio::test]
    async fn failed_compensation_does_not_stop_the_rest() {
        let identity = InMemoryIdentityProvider::new();
        let store = InMemoryProfileStore::new();

        let provisioned = identity
            .create_identity("ana@example.com", &SecretString::from("s3cret"))
            .await
            .unwrap();
        let row_id = store
            .insert(Row::User(UserRow {
                id: provisioned.id,
                email: "ana@example.com".to_string(),
                role: AccountRole::Client,
            }))
            .await
            .unwrap();

        identity.set_fail_on_delete(true);

        let mut stack = CompensationStack::new();
        stack.push(Compensation::DeleteIdentity(provisioned.id));
        stack.push(Compensation::DeleteRow {
            collection: Collection::Users,
            id: row_id,
        });

        let failures = stack.unwind(&identity, &store).await;
        assert_eq!(failures, 1);
        // The row delete still ran despite the identity delete failing.
        assert_eq!(store.row_count(Collection::Users).await, 0);
        assert_eq!(identity.identity_count(), 1);
    }
}
