//! Identity provider trait, in-memory implementation, and HTTP client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Bounded timeout for identity service calls.
const IDENTITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to an externally provisioned identity.
#[derive(Debug, Clone)]
pub struct ProvisionedIdentity {
    /// Opaque id assigned by the identity service.
    pub id: UserId,
    /// Normalized email the identity was created with.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Errors from the identity service.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The service processed the request and refused it.
    #[error("identity service rejected the request: {0}")]
    Rejected(String),

    /// The request could not be completed (network, timeout, bad response).
    #[error("identity service request failed: {0}")]
    Request(String),
}

/// Trait for identity store operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a confirmed principal with the given credentials.
    ///
    /// The identity is created with its email pre-confirmed; this domain
    /// has no confirmation round trip.
    async fn create_identity(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ProvisionedIdentity, IdentityError>;

    /// Deletes a principal.
    ///
    /// Idempotent: deleting an id that does not exist is not an error.
    async fn delete_identity(&self, id: UserId) -> Result<(), IdentityError>;
}

#[derive(Debug, Default)]
struct InMemoryIdentityState {
    identities: HashMap<UserId, String>,
    fail_on_create: bool,
    fail_on_delete: bool,
}

/// In-memory identity provider for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    state: Arc<RwLock<InMemoryIdentityState>>,
}

impl InMemoryIdentityProvider {
    /// Creates a new in-memory identity provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the provider to fail on the next create call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures the provider to fail delete calls (compensation paths).
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.state.write().unwrap().fail_on_delete = fail;
    }

    /// Returns the number of existing identities.
    pub fn identity_count(&self) -> usize {
        self.state.read().unwrap().identities.len()
    }

    /// Returns the identity id registered for an email, if any.
    pub fn find_by_email(&self, email: &str) -> Option<UserId> {
        self.state
            .read()
            .unwrap()
            .identities
            .iter()
            .find(|(_, stored)| stored.as_str() == email)
            .map(|(id, _)| *id)
    }

    /// Returns true if an identity exists with the given id.
    pub fn has_identity(&self, id: UserId) -> bool {
        self.state.read().unwrap().identities.contains_key(&id)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_identity(
        &self,
        email: &str,
        _password: &SecretString,
    ) -> Result<ProvisionedIdentity, IdentityError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(IdentityError::Rejected("identity store refused".to_string()));
        }

        let id = UserId::new();
        state.identities.insert(id, email.to_string());

        Ok(ProvisionedIdentity {
            id,
            email: email.to_string(),
            created_at: Utc::now(),
        })
    }

    async fn delete_identity(&self, id: UserId) -> Result<(), IdentityError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_delete {
            return Err(IdentityError::Request("identity store unreachable".to_string()));
        }

        state.identities.remove(&id);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CreatedPrincipal {
    id: Uuid,
    email: String,
    created_at: Option<DateTime<Utc>>,
}

/// HTTP identity provider targeting a GoTrue-style admin API.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    service_key: SecretString,
}

impl std::fmt::Debug for HttpIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIdentityProvider")
            .field("base_url", &self.base_url)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpIdentityProvider {
    /// Creates a new HTTP identity provider.
    pub fn new(
        base_url: impl Into<String>,
        service_key: SecretString,
    ) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(IDENTITY_TIMEOUT)
            .build()
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key,
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn create_identity(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ProvisionedIdentity, IdentityError> {
        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
            "email_confirm": true,
        });

        let response = self
            .client
            .post(format!("{}/admin/users", self.base_url))
            .bearer_auth(self.service_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected(format!("{status}: {message}")));
        }

        let principal: CreatedPrincipal = response
            .json()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        Ok(ProvisionedIdentity {
            id: UserId::from_uuid(principal.id),
            email: principal.email,
            created_at: principal.created_at.unwrap_or_else(Utc::now),
        })
    }

    async fn delete_identity(&self, id: UserId) -> Result<(), IdentityError> {
        let response = self
            .client
            .delete(format!("{}/admin/users/{}", self.base_url, id))
            .bearer_auth(self.service_key.expose_secret())
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status();
        // A principal that is already gone counts as deleted.
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(IdentityError::Request(format!("{status}: {message}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password() -> SecretString {
        SecretString::from("s3cret")
    }

    #[tokio::test]
    async fn create_and_delete() {
        let provider = InMemoryIdentityProvider::new();

        let identity = provider
            .create_identity("ana@example.com", &password())
            .await
            .unwrap();
        assert_eq!(identity.email, "ana@example.com");
        assert_eq!(provider.identity_count(), 1);
        assert_eq!(
            provider.find_by_email("ana@example.com"),
            Some(identity.id)
        );

        provider.delete_identity(identity.id).await.unwrap();
        assert_eq!(provider.identity_count(), 0);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_ok() {
        let provider = InMemoryIdentityProvider::new();
        provider.delete_identity(UserId::new()).await.unwrap();
    }

    #[tokio::test]
    async fn fail_on_create() {
        let provider = InMemoryIdentityProvider::new();
        provider.set_fail_on_create(true);

        let result = provider.create_identity("ana@example.com", &password()).await;
        assert!(result.is_err());
        assert_eq!(provider.identity_count(), 0);
    }
}
