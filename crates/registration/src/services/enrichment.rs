//! Postal-code address enrichment: trait, in-memory implementation, and
//! HTTP lookup client.
//!
//! Enrichment is a best-effort saga step. Every failure mode of the lookup
//! (timeout, non-2xx, malformed body) collapses into
//! [`EnrichmentError::Unavailable`]; the caller keeps the submitted address
//! and proceeds.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Bounded timeout for lookup calls.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Postal codes are exactly eight digits once stripped of punctuation.
const POSTAL_CODE_LEN: usize = 8;

/// Normalized address produced by the postal-code lookup.
///
/// Fields the lookup could not determine stay `None`; the caller-submitted
/// value survives for those.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Errors from the address lookup.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// The lookup could not produce a result; proceed without it.
    #[error("address lookup unavailable: {0}")]
    Unavailable(String),
}

/// Trait for postal-code address resolution.
#[async_trait]
pub trait AddressEnrichment: Send + Sync {
    /// Resolves a sanitized (digits-only) postal code.
    async fn resolve(&self, postal_code: &str) -> Result<ResolvedAddress, EnrichmentError>;
}

/// Strips punctuation from a postal code, accepting only digits-only codes
/// of the expected length.
pub fn sanitize_postal_code(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    (digits.len() == POSTAL_CODE_LEN).then_some(digits)
}

#[derive(Debug, Default)]
struct InMemoryEnrichmentState {
    resolutions: HashMap<String, ResolvedAddress>,
    unavailable: bool,
    lookup_count: u32,
}

/// In-memory address enrichment for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressEnrichment {
    state: Arc<RwLock<InMemoryEnrichmentState>>,
}

impl InMemoryAddressEnrichment {
    /// Creates a new in-memory enrichment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resolution for a postal code.
    pub fn insert_resolution(&self, postal_code: impl Into<String>, resolved: ResolvedAddress) {
        self.state
            .write()
            .unwrap()
            .resolutions
            .insert(postal_code.into(), resolved);
    }

    /// Configures the service to report itself unavailable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Returns the number of lookups attempted.
    pub fn lookup_count(&self) -> u32 {
        self.state.read().unwrap().lookup_count
    }
}

#[async_trait]
impl AddressEnrichment for InMemoryAddressEnrichment {
    async fn resolve(&self, postal_code: &str) -> Result<ResolvedAddress, EnrichmentError> {
        let mut state = self.state.write().unwrap();
        state.lookup_count += 1;

        if state.unavailable {
            return Err(EnrichmentError::Unavailable("lookup offline".to_string()));
        }

        state
            .resolutions
            .get(postal_code)
            .cloned()
            .ok_or_else(|| EnrichmentError::Unavailable(format!("unknown code {postal_code}")))
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    district: Option<String>,
    lat: Option<String>,
    lng: Option<String>,
}

/// HTTP postal-code lookup client.
///
/// Targets an AwesomeAPI-style endpoint: `GET {base}/json/{code}?token=…`
/// returning address fields plus coordinates as decimal strings.
#[derive(Clone)]
pub struct PostalLookupClient {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl std::fmt::Debug for PostalLookupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostalLookupClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl PostalLookupClient {
    /// Creates a new postal-code lookup client.
    pub fn new(
        base_url: impl Into<String>,
        token: SecretString,
    ) -> Result<Self, EnrichmentError> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| EnrichmentError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn trimmed(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl AddressEnrichment for PostalLookupClient {
    async fn resolve(&self, postal_code: &str) -> Result<ResolvedAddress, EnrichmentError> {
        let url = format!(
            "{}/json/{}?token={}",
            self.base_url,
            postal_code,
            self.token.expose_secret()
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EnrichmentError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::Unavailable(format!(
                "lookup returned {status}"
            )));
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Unavailable(e.to_string()))?;

        // Coordinates arrive as decimal strings; both must parse to count.
        let (latitude, longitude) = match (body.lat.as_deref(), body.lng.as_deref()) {
            (Some(lat), Some(lng)) => (lat.trim().parse().ok(), lng.trim().parse().ok()),
            _ => (None, None),
        };

        Ok(ResolvedAddress {
            street: Self::trimmed(body.address),
            city: Self::trimmed(body.city),
            state: Self::trimmed(body.state).map(|s| s.to_uppercase()),
            district: Self::trimmed(body.district),
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_accepts_punctuated_codes() {
        assert_eq!(
            sanitize_postal_code("01310-100"),
            Some("01310100".to_string())
        );
        assert_eq!(
            sanitize_postal_code(" 01310100 "),
            Some("01310100".to_string())
        );
    }

    #[test]
    fn sanitize_rejects_wrong_length() {
        assert_eq!(sanitize_postal_code("1234"), None);
        assert_eq!(sanitize_postal_code("013101001"), None);
        assert_eq!(sanitize_postal_code(""), None);
    }

    #[tokio::test]
    async fn resolve_known_code() {
        let service = InMemoryAddressEnrichment::new();
        service.insert_resolution(
            "01310100",
            ResolvedAddress {
                street: Some("Avenida Paulista".to_string()),
                city: Some("São Paulo".to_string()),
                ..ResolvedAddress::default()
            },
        );

        let resolved = service.resolve("01310100").await.unwrap();
        assert_eq!(resolved.street.as_deref(), Some("Avenida Paulista"));
        assert_eq!(service.lookup_count(), 1);
    }

    #[tokio::test]
    async fn unknown_code_is_unavailable() {
        let service = InMemoryAddressEnrichment::new();
        let result = service.resolve("99999999").await;
        assert!(matches!(result, Err(EnrichmentError::Unavailable(_))));
    }

    #[tokio::test]
    async fn outage_is_unavailable() {
        let service = InMemoryAddressEnrichment::new();
        service.insert_resolution("01310100", ResolvedAddress::default());
        service.set_unavailable(true);

        let result = service.resolve("01310100").await;
        assert!(matches!(result, Err(EnrichmentError::Unavailable(_))));
    }
}
