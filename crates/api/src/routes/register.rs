//! Registration endpoints, one per profile kind.
//!
//! Request fields are all optional at the JSON layer; missing mandatory
//! fields are rejected by the saga's own validation so every failure mode
//! flows through the same response envelope.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use profile_store::{ActKind, ProfileStore};
use registration::{
    AddressEnrichment, AddressInput, ArtistSignup, BillingCycle, BillingService, ClientSignup,
    IdentityProvider, RegistrationOrchestrator, RegistrationReceipt, RegistrationRequest,
    StudioSignup,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<I, D, E, B> {
    pub orchestrator: RegistrationOrchestrator<I, D, E, B>,
}

// -- Request types --

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterClientRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
    pub tax_id: String,
    pub postal_code: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub district: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterArtistRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
    pub tax_id: String,
    /// `"musician"` or `"band"`.
    pub kind: Option<ActKind>,
    pub postal_code: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub district: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterStudioRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub legal_name: String,
    pub phone: String,
    pub tax_id: String,
    pub postal_code: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub district: String,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub image_url: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
}

// -- Response types --

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    /// Machine-oriented short reason.
    pub message: String,
    /// Human-facing message.
    pub notification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RegistrationData>,
}

#[derive(Serialize)]
pub struct RegistrationData {
    pub user_id: String,
    pub profile_id: String,
}

fn created(receipt: RegistrationReceipt) -> (StatusCode, Json<RegisterResponse>) {
    (
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "account registered".to_string(),
            notification: "Registration complete! You can now sign in.".to_string(),
            data: Some(RegistrationData {
                user_id: receipt.user_id.to_string(),
                profile_id: receipt.profile_id.to_string(),
            }),
        }),
    )
}

impl From<RegisterClientRequest> for RegistrationRequest {
    fn from(req: RegisterClientRequest) -> Self {
        RegistrationRequest::Client(ClientSignup {
            email: req.email,
            password: SecretString::from(req.password),
            name: req.name,
            phone: req.phone,
            tax_id: req.tax_id,
            address: AddressInput {
                postal_code: req.postal_code,
                street: req.street,
                city: req.city,
                state: req.state,
                district: req.district,
                number: None,
                complement: None,
            },
            latitude: req.latitude,
            longitude: req.longitude,
        })
    }
}

impl RegisterArtistRequest {
    fn into_request(self, act: ActKind) -> RegistrationRequest {
        RegistrationRequest::MusicianOrBand(ArtistSignup {
            email: self.email,
            password: SecretString::from(self.password),
            name: self.name,
            phone: self.phone,
            tax_id: self.tax_id,
            act,
            address: AddressInput {
                postal_code: self.postal_code,
                street: self.street,
                city: self.city,
                state: self.state,
                district: self.district,
                number: None,
                complement: None,
            },
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

impl From<RegisterStudioRequest> for RegistrationRequest {
    fn from(req: RegisterStudioRequest) -> Self {
        RegistrationRequest::Studio(StudioSignup {
            email: req.email,
            password: SecretString::from(req.password),
            name: req.name,
            legal_name: req.legal_name,
            phone: req.phone,
            tax_id: req.tax_id,
            address: AddressInput {
                postal_code: req.postal_code,
                street: req.street,
                city: req.city,
                state: req.state,
                district: req.district,
                number: req.number,
                complement: req.complement,
            },
            image_url: req.image_url,
            billing_cycle: req.billing_cycle.unwrap_or_default(),
        })
    }
}

// -- Handlers --

/// POST /register/client — register an individual client.
#[tracing::instrument(skip(state, req))]
pub async fn client<I, D, E, B>(
    State(state): State<Arc<AppState<I, D, E, B>>>,
    Json(req): Json<RegisterClientRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError>
where
    I: IdentityProvider,
    D: ProfileStore + Clone,
    E: AddressEnrichment,
    B: BillingService,
{
    let receipt = state.orchestrator.register(req.into()).await?;
    Ok(created(receipt))
}

/// POST /register/artist — register a musician or band.
#[tracing::instrument(skip(state, req))]
pub async fn artist<I, D, E, B>(
    State(state): State<Arc<AppState<I, D, E, B>>>,
    Json(req): Json<RegisterArtistRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError>
where
    I: IdentityProvider,
    D: ProfileStore + Clone,
    E: AddressEnrichment,
    B: BillingService,
{
    let act = req.kind.ok_or(ApiError::MissingField("kind"))?;
    let receipt = state.orchestrator.register(req.into_request(act)).await?;
    Ok(created(receipt))
}

/// POST /register/studio — register a studio.
#[tracing::instrument(skip(state, req))]
pub async fn studio<I, D, E, B>(
    State(state): State<Arc<AppState<I, D, E, B>>>,
    Json(req): Json<RegisterStudioRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError>
where
    I: IdentityProvider,
    D: ProfileStore + Clone,
    E: AddressEnrichment,
    B: BillingService,
{
    let receipt = state.orchestrator.register(req.into()).await?;
    Ok(created(receipt))
}
