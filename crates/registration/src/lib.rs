//! Registration saga for account onboarding.
//!
//! Registering an account provisions correlated records across several
//! independently-failing resources: an identity store, relational profile
//! tables, a postal-code address-enrichment service, and a billing
//! service. No shared transaction boundary exists, so the saga coordinates
//! the steps itself:
//!
//! 1. Normalize and validate the request
//! 2. Pre-check email and tax id uniqueness
//! 3. Create the identity (mandatory)
//! 4. Resolve the address from the postal code (best-effort)
//! 5. Provision billing for kinds that support it (best-effort)
//! 6. Insert the profile rows (mandatory)
//!
//! Mandatory steps push undo actions onto a compensation stack; if a later
//! mandatory step fails, the stack unwinds in reverse order before the
//! failure is reported. Best-effort step failures are logged and absorbed.

pub mod compensation;
pub mod error;
pub mod guard;
pub mod kind;
pub mod orchestrator;
pub mod request;
pub mod services;
pub mod state;

pub use compensation::{Compensation, CompensationStack};
pub use error::RegistrationError;
pub use guard::UniquenessGuard;
pub use kind::{plan_rows, KindDescriptor, ProfileKind, RowPlan};
pub use orchestrator::{RegistrationOrchestrator, RegistrationReceipt};
pub use request::{
    AddressInput, ArtistSignup, ClientSignup, RegistrationRequest, StudioSignup,
};
pub use services::{
    AddressEnrichment, BillingAccount, BillingCycle, BillingError, BillingService,
    CustomerDraft, EnrichmentError, HttpIdentityProvider, IdentityError, IdentityProvider,
    InMemoryAddressEnrichment, InMemoryBillingService, InMemoryIdentityProvider,
    PostalLookupClient, ProvisionedIdentity, ResolvedAddress, SubscriptionClient,
    SubscriptionHandle, SubscriptionPlan,
};
pub use state::SagaPhase;
