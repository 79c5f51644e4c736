//! Billing service: trait, in-memory implementation, and HTTP client.
//!
//! Billing is a best-effort saga step: any failure leaves the registration
//! intact with empty billing identifiers. New studios always start on a
//! trial regardless of billing availability.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use profile_store::SubscriptionStatus;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bounded timeout for billing service calls.
const BILLING_TIMEOUT: Duration = Duration::from_secs(10);

/// Days of trial granted to a new studio before the first charge.
pub const TRIAL_PERIOD_DAYS: i64 = 7;

/// Subscription billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    /// Returns the cycle in the billing service's wire vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "MONTHLY",
            BillingCycle::Yearly => "YEARLY",
        }
    }
}

/// Customer data sent to the billing service.
///
/// Address fields reflect the resolved address when enrichment succeeded,
/// so the billing customer record matches what the saga stores.
#[derive(Debug, Clone)]
pub struct CustomerDraft {
    pub name: String,
    pub email: String,
    pub tax_id: String,
    pub phone: String,
    pub postal_code: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
}

/// Plan parameters for a new subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionPlan {
    pub cycle: BillingCycle,
    pub price_cents: i64,
    /// First due date; the trial runs until then.
    pub next_due: NaiveDate,
}

/// Identifiers of a created subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    pub subscription_id: String,
    pub payment_link: Option<String>,
}

/// Billing annotation attached to a studio profile.
///
/// The default is an unbilled trial: no customer or subscription ids,
/// status `trial`, first due date [`TRIAL_PERIOD_DAYS`] out.
#[derive(Debug, Clone)]
pub struct BillingAccount {
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub next_due: NaiveDate,
    pub payment_link: Option<String>,
}

impl Default for BillingAccount {
    fn default() -> Self {
        Self {
            customer_id: None,
            subscription_id: None,
            status: SubscriptionStatus::Trial,
            next_due: Utc::now().date_naive() + chrono::Duration::days(TRIAL_PERIOD_DAYS),
            payment_link: None,
        }
    }
}

/// Errors from the billing service.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The billing call could not complete; proceed without billing data.
    #[error("billing service unavailable: {0}")]
    Unavailable(String),
}

/// Trait for billing operations.
#[async_trait]
pub trait BillingService: Send + Sync {
    /// Creates a billing customer, returning its id.
    async fn create_customer(&self, draft: &CustomerDraft) -> Result<String, BillingError>;

    /// Creates a recurring subscription for an existing customer.
    async fn create_subscription(
        &self,
        customer_id: &str,
        plan: &SubscriptionPlan,
    ) -> Result<SubscriptionHandle, BillingError>;
}

#[derive(Debug, Default)]
struct InMemoryBillingState {
    customers: HashMap<String, String>,
    subscriptions: HashMap<String, String>,
    next_id: u32,
    fail_on_customer: bool,
    fail_on_subscription: bool,
}

/// In-memory billing service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingService {
    state: Arc<RwLock<InMemoryBillingState>>,
}

impl InMemoryBillingService {
    /// Creates a new in-memory billing service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail customer creation.
    pub fn set_fail_on_customer(&self, fail: bool) {
        self.state.write().unwrap().fail_on_customer = fail;
    }

    /// Configures the service to fail subscription creation.
    pub fn set_fail_on_subscription(&self, fail: bool) {
        self.state.write().unwrap().fail_on_subscription = fail;
    }

    /// Returns the number of customers created.
    pub fn customer_count(&self) -> usize {
        self.state.read().unwrap().customers.len()
    }

    /// Returns the number of subscriptions created.
    pub fn subscription_count(&self) -> usize {
        self.state.read().unwrap().subscriptions.len()
    }
}

#[async_trait]
impl BillingService for InMemoryBillingService {
    async fn create_customer(&self, draft: &CustomerDraft) -> Result<String, BillingError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_customer {
            return Err(BillingError::Unavailable("billing offline".to_string()));
        }

        state.next_id += 1;
        let customer_id = format!("CUS-{:04}", state.next_id);
        state
            .customers
            .insert(customer_id.clone(), draft.email.clone());
        Ok(customer_id)
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        _plan: &SubscriptionPlan,
    ) -> Result<SubscriptionHandle, BillingError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_subscription {
            return Err(BillingError::Unavailable("billing offline".to_string()));
        }

        state.next_id += 1;
        let subscription_id = format!("SUB-{:04}", state.next_id);
        state
            .subscriptions
            .insert(subscription_id.clone(), customer_id.to_string());

        Ok(SubscriptionHandle {
            subscription_id,
            payment_link: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreatedCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedSubscription {
    id: String,
    #[serde(rename = "invoiceUrl")]
    invoice_url: Option<String>,
}

/// HTTP billing client.
///
/// Targets an Asaas-style API: `access_token` header, `POST /customers`,
/// `POST /subscriptions`; amounts on the wire are decimal currency units.
#[derive(Clone)]
pub struct SubscriptionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for SubscriptionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl SubscriptionClient {
    /// Creates a new billing client.
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Result<Self, BillingError> {
        let client = reqwest::Client::builder()
            .timeout(BILLING_TIMEOUT)
            .build()
            .map_err(|e| BillingError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, BillingError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("access_token", self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| BillingError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BillingError::Unavailable(format!(
                "billing returned {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BillingError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl BillingService for SubscriptionClient {
    async fn create_customer(&self, draft: &CustomerDraft) -> Result<String, BillingError> {
        let body = serde_json::json!({
            "name": draft.name,
            "email": draft.email,
            "cpfCnpj": draft.tax_id,
            "mobilePhone": draft.phone,
            "postalCode": draft.postal_code,
            "address": draft.street,
            "addressNumber": draft.number,
        });

        let customer: CreatedCustomer = self.post("/customers", &body).await?;
        Ok(customer.id)
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        plan: &SubscriptionPlan,
    ) -> Result<SubscriptionHandle, BillingError> {
        let body = serde_json::json!({
            "customer": customer_id,
            "billingType": "UNDEFINED",
            "value": plan.price_cents as f64 / 100.0,
            "nextDueDate": plan.next_due.format("%Y-%m-%d").to_string(),
            "cycle": plan.cycle.as_str(),
        });

        let subscription: CreatedSubscription = self.post("/subscriptions", &body).await?;
        Ok(SubscriptionHandle {
            subscription_id: subscription.id,
            payment_link: subscription.invoice_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> CustomerDraft {
        CustomerDraft {
            name: "Garage Sound".to_string(),
            email: "studio@example.com".to_string(),
            tax_id: "11222333000181".to_string(),
            phone: "11 3333-0000".to_string(),
            postal_code: Some("01310100".to_string()),
            street: Some("Avenida Paulista".to_string()),
            number: Some("1000".to_string()),
        }
    }

    fn plan() -> SubscriptionPlan {
        SubscriptionPlan {
            cycle: BillingCycle::Monthly,
            price_cents: 9900,
            next_due: Utc::now().date_naive() + chrono::Duration::days(TRIAL_PERIOD_DAYS),
        }
    }

    #[tokio::test]
    async fn customer_then_subscription() {
        let service = InMemoryBillingService::new();

        let customer_id = service.create_customer(&draft()).await.unwrap();
        assert!(customer_id.starts_with("CUS-"));

        let handle = service
            .create_subscription(&customer_id, &plan())
            .await
            .unwrap();
        assert!(handle.subscription_id.starts_with("SUB-"));
        assert_eq!(service.customer_count(), 1);
        assert_eq!(service.subscription_count(), 1);
    }

    #[tokio::test]
    async fn customer_failure() {
        let service = InMemoryBillingService::new();
        service.set_fail_on_customer(true);

        let result = service.create_customer(&draft()).await;
        assert!(matches!(result, Err(BillingError::Unavailable(_))));
        assert_eq!(service.customer_count(), 0);
    }

    #[tokio::test]
    async fn default_account_is_trial() {
        let account = BillingAccount::default();
        assert_eq!(account.status, SubscriptionStatus::Trial);
        assert_eq!(account.customer_id, None);
        assert_eq!(
            account.next_due,
            Utc::now().date_naive() + chrono::Duration::days(TRIAL_PERIOD_DAYS)
        );
    }
}
