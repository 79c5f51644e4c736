//! External service traits, in-memory test doubles, and HTTP clients for
//! the saga's provisioning steps.

pub mod billing;
pub mod enrichment;
pub mod identity;

pub use billing::{
    BillingAccount, BillingCycle, BillingError, BillingService, CustomerDraft,
    InMemoryBillingService, SubscriptionClient, SubscriptionHandle, SubscriptionPlan,
};
pub use enrichment::{
    sanitize_postal_code, AddressEnrichment, EnrichmentError, InMemoryAddressEnrichment,
    PostalLookupClient, ResolvedAddress,
};
pub use identity::{
    HttpIdentityProvider, IdentityError, IdentityProvider, InMemoryIdentityProvider,
    ProvisionedIdentity,
};
