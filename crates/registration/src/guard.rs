//! Uniqueness pre-checks run before any side effect.

use profile_store::{ProfileStore, UniqueField};

use crate::error::{RegistrationError, Result};

/// Pre-flight duplicate rejection.
///
/// Each probe is an independent query against the non-deleted rows. A
/// store error is distinct from "not found" and propagates; it is never
/// treated as the uniqueness check passing. The persistence layer's unique
/// constraints remain the authority for requests racing past this check.
pub struct UniquenessGuard<D> {
    store: D,
}

impl<D: ProfileStore> UniquenessGuard<D> {
    /// Creates a guard over the given store.
    pub fn new(store: D) -> Self {
        Self { store }
    }

    /// Rejects the registration if the email, or the tax id when given,
    /// already belongs to a non-deleted profile.
    pub async fn ensure_available(&self, email: &str, tax_id: Option<&str>) -> Result<()> {
        if self.store.exists(UniqueField::Email, email).await? {
            return Err(RegistrationError::Conflict {
                field: UniqueField::Email,
            });
        }

        if let Some(tax_id) = tax_id {
            if self.store.exists(UniqueField::TaxId, tax_id).await? {
                return Err(RegistrationError::Conflict {
                    field: UniqueField::TaxId,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserId;
    use profile_store::{AccountRole, InMemoryProfileStore, Row, UserRow};

    async fn store_with_user(email: &str) -> InMemoryProfileStore {
        let store = InMemoryProfileStore::new();
        store
            .insert(Row::User(UserRow {
                id: UserId::new(),
                email: email.to_string(),
                role: AccountRole::Client,
            }))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn fresh_email_passes() {
        let store = store_with_user("taken@example.com").await;
        let guard = UniquenessGuard::new(store);

        guard
            .ensure_available("fresh@example.com", Some("52998224725"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let store = store_with_user("taken@example.com").await;
        let guard = UniquenessGuard::new(store);

        let err = guard
            .ensure_available("taken@example.com", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Conflict {
                field: UniqueField::Email
            }
        ));
    }

    #[tokio::test]
    async fn probe_failure_is_not_availability() {
        let store = InMemoryProfileStore::new();
        store.set_fail_on_exists(true).await;
        let guard = UniquenessGuard::new(store);

        let err = guard
            .ensure_available("anyone@example.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Store(_)));
    }
}
