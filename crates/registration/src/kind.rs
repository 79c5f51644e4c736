//! Per-kind registration descriptors and row planning.
//!
//! The three registration workflows share one saga; everything that varies
//! by profile kind lives in [`KindDescriptor`] and [`plan_rows`], so the
//! orchestrator never branches on the kind itself.

use common::RecordId;
use profile_store::{
    AccountRole, AddressRow, ClientRow, Collection, Row, StudioRow, UserRow,
};
use serde::{Deserialize, Serialize};

use crate::request::{AddressInput, RegistrationRequest};
use crate::services::billing::BillingAccount;
use crate::services::enrichment::{sanitize_postal_code, ResolvedAddress};
use crate::services::identity::ProvisionedIdentity;

/// The profile kinds the service can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Client,
    MusicianOrBand,
    Studio,
}

impl ProfileKind {
    /// Returns the static descriptor driving this kind's saga steps.
    pub fn descriptor(&self) -> &'static KindDescriptor {
        match self {
            ProfileKind::Client => &CLIENT,
            ProfileKind::MusicianOrBand => &MUSICIAN_OR_BAND,
            ProfileKind::Studio => &STUDIO,
        }
    }

    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Client => "client",
            ProfileKind::MusicianOrBand => "musician_or_band",
            ProfileKind::Studio => "studio",
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static step table for one profile kind.
#[derive(Debug, Clone, Copy)]
pub struct KindDescriptor {
    /// Role recorded in the user index.
    pub role: AccountRole,
    /// Collection that receives the profile row.
    pub profile_collection: Collection,
    /// Whether the kind writes a separate address row.
    pub separate_address_row: bool,
    /// Whether the postal-code lookup applies.
    pub supports_enrichment: bool,
    /// Whether billing provisioning applies.
    pub supports_billing: bool,
    /// Whether the tax id uniqueness pre-check applies.
    pub requires_tax_id: bool,
}

static CLIENT: KindDescriptor = KindDescriptor {
    role: AccountRole::Client,
    profile_collection: Collection::Clients,
    separate_address_row: false,
    supports_enrichment: true,
    supports_billing: false,
    requires_tax_id: true,
};

static MUSICIAN_OR_BAND: KindDescriptor = KindDescriptor {
    role: AccountRole::Artist,
    profile_collection: Collection::Clients,
    separate_address_row: false,
    supports_enrichment: true,
    supports_billing: false,
    requires_tax_id: true,
};

static STUDIO: KindDescriptor = KindDescriptor {
    role: AccountRole::Studio,
    profile_collection: Collection::Studios,
    separate_address_row: true,
    supports_enrichment: true,
    supports_billing: true,
    requires_tax_id: true,
};

/// The ordered mandatory inserts for one registration, plus the id of the
/// row that acts as the profile record.
#[derive(Debug, Clone)]
pub struct RowPlan {
    pub rows: Vec<Row>,
    pub profile_id: RecordId,
}

fn pick(resolved: Option<&String>, submitted: &str) -> String {
    resolved.cloned().unwrap_or_else(|| submitted.to_string())
}

fn stored_postal_code(address: &AddressInput) -> String {
    sanitize_postal_code(&address.postal_code).unwrap_or_else(|| address.postal_code.clone())
}

/// Builds the mandatory rows for a normalized request.
///
/// Resolved address fields win over caller-submitted ones wherever the
/// lookup produced them; the billing account (when present) lands in the
/// initial studio insert.
pub fn plan_rows(
    request: &RegistrationRequest,
    identity: &ProvisionedIdentity,
    resolved: Option<&ResolvedAddress>,
    billing: Option<&BillingAccount>,
) -> RowPlan {
    let descriptor = request.kind().descriptor();
    let profile_id = RecordId::new();
    let mut rows = vec![Row::User(UserRow {
        id: identity.id,
        email: identity.email.clone(),
        role: descriptor.role,
    })];

    match request {
        RegistrationRequest::Client(c) => {
            rows.push(Row::Client(ClientRow {
                id: profile_id,
                user_id: identity.id,
                name: c.name.clone(),
                email: identity.email.clone(),
                phone: c.phone.clone(),
                tax_id: c.tax_id.clone(),
                act: None,
                postal_code: stored_postal_code(&c.address),
                street: pick(resolved.and_then(|r| r.street.as_ref()), &c.address.street),
                city: pick(resolved.and_then(|r| r.city.as_ref()), &c.address.city),
                state: pick(resolved.and_then(|r| r.state.as_ref()), &c.address.state)
                    .to_uppercase(),
                district: pick(
                    resolved.and_then(|r| r.district.as_ref()),
                    &c.address.district,
                ),
                latitude: resolved.and_then(|r| r.latitude).or(c.latitude),
                longitude: resolved.and_then(|r| r.longitude).or(c.longitude),
            }));
        }
        RegistrationRequest::MusicianOrBand(a) => {
            rows.push(Row::Client(ClientRow {
                id: profile_id,
                user_id: identity.id,
                name: a.name.clone(),
                email: identity.email.clone(),
                phone: a.phone.clone(),
                tax_id: a.tax_id.clone(),
                act: Some(a.act),
                postal_code: stored_postal_code(&a.address),
                street: pick(resolved.and_then(|r| r.street.as_ref()), &a.address.street),
                city: pick(resolved.and_then(|r| r.city.as_ref()), &a.address.city),
                state: pick(resolved.and_then(|r| r.state.as_ref()), &a.address.state)
                    .to_uppercase(),
                district: pick(
                    resolved.and_then(|r| r.district.as_ref()),
                    &a.address.district,
                ),
                latitude: resolved.and_then(|r| r.latitude).or(a.latitude),
                longitude: resolved.and_then(|r| r.longitude).or(a.longitude),
            }));
        }
        RegistrationRequest::Studio(s) => {
            let account = billing.cloned().unwrap_or_default();
            rows.push(Row::Studio(StudioRow {
                id: profile_id,
                user_id: identity.id,
                name: s.name.clone(),
                legal_name: s.legal_name.clone(),
                email: identity.email.clone(),
                phone: s.phone.clone(),
                tax_id: s.tax_id.clone(),
                image_url: s.image_url.clone(),
                customer_id: account.customer_id,
                subscription_id: account.subscription_id,
                subscription_status: account.status,
                subscription_due: account.next_due,
            }));
            rows.push(Row::Address(AddressRow {
                id: RecordId::new(),
                user_id: identity.id,
                postal_code: stored_postal_code(&s.address),
                street: Some(pick(
                    resolved.and_then(|r| r.street.as_ref()),
                    &s.address.street,
                )),
                number: s.address.number.clone(),
                city: Some(pick(resolved.and_then(|r| r.city.as_ref()), &s.address.city)),
                state: Some(
                    pick(resolved.and_then(|r| r.state.as_ref()), &s.address.state)
                        .to_uppercase(),
                ),
                district: Some(pick(
                    resolved.and_then(|r| r.district.as_ref()),
                    &s.address.district,
                )),
                complement: s.address.complement.clone(),
                latitude: resolved.and_then(|r| r.latitude),
                longitude: resolved.and_then(|r| r.longitude),
            }));
        }
    }

    RowPlan { rows, profile_id }
}
