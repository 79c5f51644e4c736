//! Application configuration loaded from environment variables.
//!
//! Configuration is resolved once at startup and injected into the
//! collaborators via constructors. Absence of the enrichment or billing
//! sections silently disables those optional saga steps; absence of the
//! identity or database sections falls back to the in-memory
//! implementations (development mode).

use secrecy::SecretString;

/// Default base URL of the postal-code lookup service.
const DEFAULT_POSTAL_LOOKUP_URL: &str = "https://cep.awesomeapi.com.br";

/// Default studio plan price when none is configured.
const DEFAULT_PLAN_PRICE_CENTS: i64 = 9900;

/// Identity service connection settings.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub service_key: SecretString,
}

/// Postal-code lookup connection settings.
#[derive(Debug, Clone)]
pub struct PostalLookupConfig {
    pub base_url: String,
    pub token: SecretString,
}

/// Billing service connection settings.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub plan_price_cents: i64,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres connection string (absent: in-memory store)
/// - `IDENTITY_URL`, `IDENTITY_SERVICE_KEY` — identity service (absent:
///   in-memory provider)
/// - `POSTAL_LOOKUP_URL`, `POSTAL_LOOKUP_TOKEN` — address enrichment
///   (token absent: enrichment disabled)
/// - `BILLING_URL`, `BILLING_API_KEY`, `BILLING_PLAN_PRICE_CENTS` —
///   billing service (absent: billing disabled)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub identity: Option<IdentityConfig>,
    pub postal_lookup: Option<PostalLookupConfig>,
    pub billing: Option<BillingConfig>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let identity = match (
            std::env::var("IDENTITY_URL"),
            std::env::var("IDENTITY_SERVICE_KEY"),
        ) {
            (Ok(base_url), Ok(service_key)) => Some(IdentityConfig {
                base_url,
                service_key: SecretString::from(service_key),
            }),
            _ => None,
        };

        let postal_lookup = std::env::var("POSTAL_LOOKUP_TOKEN")
            .ok()
            .map(|token| PostalLookupConfig {
                base_url: std::env::var("POSTAL_LOOKUP_URL")
                    .unwrap_or_else(|_| DEFAULT_POSTAL_LOOKUP_URL.to_string()),
                token: SecretString::from(token),
            });

        let billing = match (std::env::var("BILLING_URL"), std::env::var("BILLING_API_KEY")) {
            (Ok(base_url), Ok(api_key)) => Some(BillingConfig {
                base_url,
                api_key: SecretString::from(api_key),
                plan_price_cents: std::env::var("BILLING_PLAN_PRICE_CENTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_PLAN_PRICE_CENTS),
            }),
            _ => None,
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            identity,
            postal_lookup,
            billing,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            identity: None,
            postal_lookup: None,
            billing: None,
        }
    }
}
