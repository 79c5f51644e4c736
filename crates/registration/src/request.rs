//! Registration request variants and input normalization.

use profile_store::ActKind;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{RegistrationError, Result};
use crate::kind::ProfileKind;
use crate::services::billing::{BillingCycle, CustomerDraft};
use crate::services::enrichment::{sanitize_postal_code, ResolvedAddress};

/// Caller-submitted address fields.
///
/// `number` is mandatory only for studio registrations; `complement` is
/// always optional.
#[derive(Debug, Clone, Default)]
pub struct AddressInput {
    pub postal_code: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub district: String,
    pub number: Option<String>,
    pub complement: Option<String>,
}

/// Individual client signup.
#[derive(Debug, Clone)]
pub struct ClientSignup {
    pub email: String,
    pub password: SecretString,
    pub name: String,
    pub phone: String,
    pub tax_id: String,
    pub address: AddressInput,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Musician or band signup.
#[derive(Debug, Clone)]
pub struct ArtistSignup {
    pub email: String,
    pub password: SecretString,
    pub name: String,
    pub phone: String,
    pub tax_id: String,
    pub act: ActKind,
    pub address: AddressInput,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Studio signup.
#[derive(Debug, Clone)]
pub struct StudioSignup {
    pub email: String,
    pub password: SecretString,
    pub name: String,
    pub legal_name: String,
    pub phone: String,
    pub tax_id: String,
    pub address: AddressInput,
    pub image_url: Option<String>,
    pub billing_cycle: BillingCycle,
}

/// A registration request, tagged by profile kind.
///
/// Immutable once accepted by the orchestrator; normalization happens
/// before any side effect.
#[derive(Debug, Clone)]
pub enum RegistrationRequest {
    Client(ClientSignup),
    MusicianOrBand(ArtistSignup),
    Studio(StudioSignup),
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn trim_optional(value: &mut Option<String>) {
    if let Some(inner) = value {
        trim_in_place(inner);
        if inner.is_empty() {
            *value = None;
        }
    }
}

impl AddressInput {
    fn normalize(&mut self) {
        trim_in_place(&mut self.postal_code);
        trim_in_place(&mut self.street);
        trim_in_place(&mut self.city);
        trim_in_place(&mut self.district);
        self.state = self.state.trim().to_uppercase();
        trim_optional(&mut self.number);
        trim_optional(&mut self.complement);
    }
}

impl RegistrationRequest {
    /// Returns the profile kind this request registers.
    pub fn kind(&self) -> ProfileKind {
        match self {
            RegistrationRequest::Client(_) => ProfileKind::Client,
            RegistrationRequest::MusicianOrBand(_) => ProfileKind::MusicianOrBand,
            RegistrationRequest::Studio(_) => ProfileKind::Studio,
        }
    }

    /// Returns the (normalized) email.
    pub fn email(&self) -> &str {
        match self {
            RegistrationRequest::Client(c) => &c.email,
            RegistrationRequest::MusicianOrBand(a) => &a.email,
            RegistrationRequest::Studio(s) => &s.email,
        }
    }

    /// Returns the password.
    pub fn password(&self) -> &SecretString {
        match self {
            RegistrationRequest::Client(c) => &c.password,
            RegistrationRequest::MusicianOrBand(a) => &a.password,
            RegistrationRequest::Studio(s) => &s.password,
        }
    }

    /// Returns the tax id.
    pub fn tax_id(&self) -> &str {
        match self {
            RegistrationRequest::Client(c) => &c.tax_id,
            RegistrationRequest::MusicianOrBand(a) => &a.tax_id,
            RegistrationRequest::Studio(s) => &s.tax_id,
        }
    }

    /// Returns the submitted address.
    pub fn address(&self) -> &AddressInput {
        match self {
            RegistrationRequest::Client(c) => &c.address,
            RegistrationRequest::MusicianOrBand(a) => &a.address,
            RegistrationRequest::Studio(s) => &s.address,
        }
    }

    /// Normalizes all string inputs in place: email lowercased, every field
    /// trimmed, state code uppercased.
    pub fn normalize(&mut self) {
        match self {
            RegistrationRequest::Client(c) => {
                c.email = c.email.trim().to_lowercase();
                trim_in_place(&mut c.name);
                trim_in_place(&mut c.phone);
                trim_in_place(&mut c.tax_id);
                c.address.normalize();
            }
            RegistrationRequest::MusicianOrBand(a) => {
                a.email = a.email.trim().to_lowercase();
                trim_in_place(&mut a.name);
                trim_in_place(&mut a.phone);
                trim_in_place(&mut a.tax_id);
                a.address.normalize();
            }
            RegistrationRequest::Studio(s) => {
                s.email = s.email.trim().to_lowercase();
                trim_in_place(&mut s.name);
                trim_in_place(&mut s.legal_name);
                trim_in_place(&mut s.phone);
                trim_in_place(&mut s.tax_id);
                trim_optional(&mut s.image_url);
                s.address.normalize();
            }
        }
    }

    /// Returns the billing cycle for kinds that support billing.
    pub fn billing_cycle(&self) -> Option<BillingCycle> {
        match self {
            RegistrationRequest::Studio(s) => Some(s.billing_cycle),
            _ => None,
        }
    }

    /// Builds the billing customer draft for kinds that support billing.
    ///
    /// Resolved address fields win over the submitted ones so the billing
    /// customer record matches what the saga will store.
    pub fn customer_draft(&self, resolved: Option<&ResolvedAddress>) -> Option<CustomerDraft> {
        match self {
            RegistrationRequest::Studio(s) => Some(CustomerDraft {
                name: s.name.clone(),
                email: s.email.clone(),
                tax_id: s.tax_id.clone(),
                phone: s.phone.clone(),
                postal_code: sanitize_postal_code(&s.address.postal_code),
                street: resolved
                    .and_then(|r| r.street.clone())
                    .or_else(|| Some(s.address.street.clone())),
                number: s.address.number.clone(),
            }),
            _ => None,
        }
    }

    /// Mandatory fields for this request's kind, as (name, value) pairs.
    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields: Vec<(&'static str, &str)> = Vec::new();
        let address = self.address();

        match self {
            RegistrationRequest::Client(c) => {
                fields.push(("email", &c.email));
                fields.push(("name", &c.name));
                fields.push(("phone", &c.phone));
                fields.push(("tax_id", &c.tax_id));
            }
            RegistrationRequest::MusicianOrBand(a) => {
                fields.push(("email", &a.email));
                fields.push(("name", &a.name));
                fields.push(("phone", &a.phone));
                fields.push(("tax_id", &a.tax_id));
            }
            RegistrationRequest::Studio(s) => {
                fields.push(("email", &s.email));
                fields.push(("name", &s.name));
                fields.push(("legal_name", &s.legal_name));
                fields.push(("phone", &s.phone));
                fields.push(("tax_id", &s.tax_id));
                fields.push(("number", s.address.number.as_deref().unwrap_or("")));
            }
        }

        fields.push(("postal_code", &address.postal_code));
        fields.push(("street", &address.street));
        fields.push(("city", &address.city));
        fields.push(("state", &address.state));
        fields.push(("district", &address.district));
        fields
    }

    /// Rejects the request if any mandatory field for its kind is empty
    /// after trimming.
    pub fn validate(&self) -> Result<()> {
        if self.password().expose_secret().trim().is_empty() {
            return Err(RegistrationError::Validation { field: "password" });
        }

        for (field, value) in self.required_fields() {
            if value.trim().is_empty() {
                return Err(RegistrationError::Validation { field });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_signup() -> ClientSignup {
        ClientSignup {
            email: "  Ana.Souza@Example.COM ".to_string(),
            password: SecretString::from("s3cret"),
            name: " Ana Souza ".to_string(),
            phone: "11 99999-0000".to_string(),
            tax_id: " 52998224725 ".to_string(),
            address: AddressInput {
                postal_code: " 01310-100 ".to_string(),
                street: "Avenida Paulista".to_string(),
                city: "São Paulo".to_string(),
                state: " sp ".to_string(),
                district: "Bela Vista".to_string(),
                number: None,
                complement: Some("  ".to_string()),
            },
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn normalize_lowercases_email_and_uppercases_state() {
        let mut request = RegistrationRequest::Client(client_signup());
        request.normalize();

        assert_eq!(request.email(), "ana.souza@example.com");
        assert_eq!(request.address().state, "SP");
        assert_eq!(request.address().postal_code, "01310-100");
        // Blank optionals collapse to None.
        assert_eq!(request.address().complement, None);
    }

    #[test]
    fn validate_accepts_complete_client() {
        let mut request = RegistrationRequest::Client(client_signup());
        request.normalize();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_name() {
        let mut signup = client_signup();
        signup.name = "   ".to_string();
        let mut request = RegistrationRequest::Client(signup);
        request.normalize();

        let err = request.validate().unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Validation { field: "name" }
        ));
    }

    #[test]
    fn validate_rejects_missing_password() {
        let mut signup = client_signup();
        signup.password = SecretString::from("");
        let request = RegistrationRequest::Client(signup);

        let err = request.validate().unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Validation { field: "password" }
        ));
    }

    #[test]
    fn studio_requires_street_number_and_legal_name() {
        let mut request = RegistrationRequest::Studio(StudioSignup {
            email: "studio@example.com".to_string(),
            password: SecretString::from("s3cret"),
            name: "Garage Sound".to_string(),
            legal_name: "Garage Sound Ltda".to_string(),
            phone: "11 3333-0000".to_string(),
            tax_id: "11222333000181".to_string(),
            address: AddressInput {
                postal_code: "01310100".to_string(),
                street: "Avenida Paulista".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
                district: "Bela Vista".to_string(),
                number: None,
                complement: None,
            },
            image_url: None,
            billing_cycle: BillingCycle::Monthly,
        });
        request.normalize();

        let err = request.validate().unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Validation { field: "number" }
        ));
    }
}
