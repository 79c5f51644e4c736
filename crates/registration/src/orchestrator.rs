//! Saga orchestrator for account registration.

use common::{RecordId, UserId};
use profile_store::{ProfileStore, StoreError};

use crate::compensation::{Compensation, CompensationStack};
use crate::error::RegistrationError;
use crate::guard::UniquenessGuard;
use crate::kind::plan_rows;
use crate::request::RegistrationRequest;
use crate::services::billing::{
    BillingAccount, BillingService, SubscriptionClient, SubscriptionPlan,
};
use crate::services::enrichment::{
    sanitize_postal_code, AddressEnrichment, PostalLookupClient, ResolvedAddress,
};
use crate::services::identity::IdentityProvider;
use crate::state::SagaPhase;

/// Identifiers returned by a committed registration.
///
/// A receipt is only produced when every mandatory step completed; there
/// is no partial-success outcome.
#[derive(Debug, Clone)]
pub struct RegistrationReceipt {
    pub user_id: UserId,
    pub profile_id: RecordId,
}

struct BillingStep<B> {
    service: B,
    plan_price_cents: i64,
}

/// Drives the registration saga: validation, uniqueness pre-checks, the
/// mandatory identity/row provisioning steps, the two best-effort
/// enrichment steps, and compensation on mandatory-step failure.
///
/// The orchestrator is stateless across requests and safe to share; each
/// call to [`register`](Self::register) runs one sequential saga.
/// Enrichment and billing are optional collaborators — when absent, their
/// steps are skipped rather than failed.
pub struct RegistrationOrchestrator<I, D, E, B> {
    identity: I,
    store: D,
    guard: UniquenessGuard<D>,
    enrichment: Option<E>,
    billing: Option<BillingStep<B>>,
}

impl<I, D> RegistrationOrchestrator<I, D, PostalLookupClient, SubscriptionClient>
where
    I: IdentityProvider,
    D: ProfileStore + Clone,
{
    /// Creates an orchestrator with enrichment and billing disabled.
    pub fn new(identity: I, store: D) -> Self {
        let guard = UniquenessGuard::new(store.clone());
        Self {
            identity,
            store,
            guard,
            enrichment: None,
            billing: None,
        }
    }
}

impl<I, D, E, B> RegistrationOrchestrator<I, D, E, B>
where
    I: IdentityProvider,
    D: ProfileStore + Clone,
    E: AddressEnrichment,
    B: BillingService,
{
    /// Enables the postal-code address enrichment step.
    pub fn with_enrichment<E2: AddressEnrichment>(
        self,
        enrichment: E2,
    ) -> RegistrationOrchestrator<I, D, E2, B> {
        RegistrationOrchestrator {
            identity: self.identity,
            store: self.store,
            guard: self.guard,
            enrichment: Some(enrichment),
            billing: self.billing,
        }
    }

    /// Enables the billing provisioning step with the given plan price.
    pub fn with_billing<B2: BillingService>(
        self,
        service: B2,
        plan_price_cents: i64,
    ) -> RegistrationOrchestrator<I, D, E, B2> {
        RegistrationOrchestrator {
            identity: self.identity,
            store: self.store,
            guard: self.guard,
            enrichment: self.enrichment,
            billing: Some(BillingStep {
                service,
                plan_price_cents,
            }),
        }
    }

    /// Runs the registration saga for one request.
    ///
    /// A returned receipt guarantees every mandatory step committed; an
    /// error guarantees every mandatory step that had committed was
    /// compensated (best-effort, in reverse order) before returning.
    #[tracing::instrument(skip(self, request), fields(kind = %request.kind()))]
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        metrics::counter!("registrations_total").increment(1);
        let saga_start = std::time::Instant::now();

        let result = self.run_saga(request).await;

        metrics::histogram!("registration_duration_seconds")
            .record(saga_start.elapsed().as_secs_f64());
        match &result {
            Ok(receipt) => {
                metrics::counter!("registrations_completed").increment(1);
                tracing::info!(
                    user_id = %receipt.user_id,
                    profile_id = %receipt.profile_id,
                    "registration committed"
                );
            }
            Err(error) => {
                metrics::counter!("registrations_failed").increment(1);
                tracing::warn!(%error, "registration failed");
            }
        }

        result
    }

    async fn run_saga(
        &self,
        mut request: RegistrationRequest,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        let descriptor = request.kind().descriptor();

        // 1. Normalize and validate. No side effects before this point.
        request.normalize();
        request.validate()?;
        tracing::debug!(phase = %SagaPhase::Validated, "saga checkpoint");

        // 2. Uniqueness pre-checks. The store's unique constraints remain
        //    the authority for requests racing past these probes.
        let tax_id = descriptor.requires_tax_id.then(|| request.tax_id());
        self.guard.ensure_available(request.email(), tax_id).await?;
        tracing::debug!(phase = %SagaPhase::UniquenessChecked, "saga checkpoint");

        // 3. Provision the identity. Terminal on failure: nothing exists
        //    yet, so there is nothing to compensate.
        let identity = self
            .identity
            .create_identity(request.email(), request.password())
            .await
            .map_err(|e| RegistrationError::Identity(e.to_string()))?;
        let mut compensations = CompensationStack::new();
        compensations.push(Compensation::DeleteIdentity(identity.id));
        tracing::debug!(phase = %SagaPhase::IdentityCreated, "saga checkpoint");

        // 4. Best-effort address resolution, before any row is written so
        //    stored rows and the billing customer see the resolved address.
        let resolved = if descriptor.supports_enrichment {
            self.try_enrich(&request).await
        } else {
            None
        };

        // 5. Best-effort billing provisioning.
        let billing = if descriptor.supports_billing {
            Some(self.try_provision_billing(&request, resolved.as_ref()).await)
        } else {
            None
        };

        // 6. Mandatory row inserts, in plan order.
        let plan = plan_rows(&request, &identity, resolved.as_ref(), billing.as_ref());
        for row in plan.rows {
            let collection = row.collection();
            match self.store.insert(row).await {
                Ok(id) => {
                    compensations.push(Compensation::DeleteRow { collection, id });
                }
                Err(error) => {
                    tracing::error!(
                        %collection,
                        %error,
                        "mandatory insert failed, unwinding saga"
                    );
                    let mapped = match error {
                        // A constraint hit here means a concurrent
                        // registration won the race window; report it
                        // exactly like the pre-check's conflict.
                        StoreError::Conflict { field, .. } => {
                            RegistrationError::Conflict { field }
                        }
                        other => RegistrationError::Store(other),
                    };
                    compensations.unwind(&self.identity, &self.store).await;
                    return Err(mapped);
                }
            }
        }
        tracing::debug!(phase = %SagaPhase::ProfileCreated, "saga checkpoint");

        tracing::debug!(phase = %SagaPhase::Committed, "saga checkpoint");
        Ok(RegistrationReceipt {
            user_id: identity.id,
            profile_id: plan.profile_id,
        })
    }

    /// Resolves the submitted postal code, absorbing every failure.
    async fn try_enrich(&self, request: &RegistrationRequest) -> Option<ResolvedAddress> {
        let enrichment = self.enrichment.as_ref()?;
        let postal_code = sanitize_postal_code(&request.address().postal_code)?;

        match enrichment.resolve(&postal_code).await {
            Ok(resolved) => {
                tracing::info!(%postal_code, "postal code resolved");
                Some(resolved)
            }
            Err(error) => {
                metrics::counter!("address_lookups_unavailable").increment(1);
                tracing::warn!(
                    %postal_code,
                    %error,
                    "address lookup unavailable, keeping submitted address"
                );
                None
            }
        }
    }

    /// Provisions a billing customer and subscription, absorbing every
    /// failure. The returned account always carries the trial defaults.
    async fn try_provision_billing(
        &self,
        request: &RegistrationRequest,
        resolved: Option<&ResolvedAddress>,
    ) -> BillingAccount {
        let mut account = BillingAccount::default();

        let Some(step) = self.billing.as_ref() else {
            tracing::debug!("billing not configured, account starts on unbilled trial");
            return account;
        };
        let Some(draft) = request.customer_draft(resolved) else {
            return account;
        };

        let customer_id = match step.service.create_customer(&draft).await {
            Ok(id) => id,
            Err(error) => {
                metrics::counter!("billing_unavailable").increment(1);
                tracing::warn!(%error, "billing customer creation unavailable, proceeding unbilled");
                return account;
            }
        };
        account.customer_id = Some(customer_id.clone());

        let plan = SubscriptionPlan {
            cycle: request.billing_cycle().unwrap_or_default(),
            price_cents: step.plan_price_cents,
            next_due: account.next_due,
        };
        match step.service.create_subscription(&customer_id, &plan).await {
            Ok(handle) => {
                account.subscription_id = Some(handle.subscription_id);
                account.payment_link = handle.payment_link;
            }
            Err(error) => {
                metrics::counter!("billing_unavailable").increment(1);
                tracing::warn!(
                    %error,
                    "subscription creation unavailable, customer left without subscription"
                );
            }
        }

        account
    }
}
