//! Row types for the registration collections.

use chrono::NaiveDate;
use common::{RecordId, UserId};
use serde::{Deserialize, Serialize};

/// The relational collections the registration saga writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// User index rows keyed by identity id.
    Users,
    /// Client and artist profile rows.
    Clients,
    /// Studio profile rows.
    Studios,
    /// Studio address rows.
    Addresses,
}

impl Collection {
    /// Returns the backing table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Clients => "clients",
            Collection::Studios => "studios",
            Collection::Addresses => "addresses",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// Fields covered by an active-row unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueField {
    /// Email, unique across the user index.
    Email,
    /// Tax id, unique across client and studio profiles.
    TaxId,
}

impl UniqueField {
    /// Returns the column name backing the constraint.
    pub fn column(&self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::TaxId => "tax_id",
        }
    }
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Role recorded in the user index for a registered account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Client,
    Artist,
    Studio,
}

impl AccountRole {
    /// Returns the role name as stored in the `role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Client => "client",
            AccountRole::Artist => "artist",
            AccountRole::Studio => "studio",
        }
    }
}

/// Whether an artist account registers as a solo musician or a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActKind {
    Musician,
    Band,
}

impl ActKind {
    /// Returns the act kind as stored in the `act` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActKind::Musician => "musician",
            ActKind::Band => "band",
        }
    }
}

/// Lifecycle status of a studio subscription.
///
/// New studios start in `Trial`; the billing service moves them to `Active`
/// once the first invoice is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    PastDue,
    Cancelled,
}

impl SubscriptionStatus {
    /// Returns the status as stored in the `subscription_status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User index row, keyed by the identity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    pub email: String,
    pub role: AccountRole,
}

/// Client or artist profile row with inline address fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRow {
    pub id: RecordId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub tax_id: String,
    /// `None` for individual clients, set for artist accounts.
    pub act: Option<ActKind>,
    pub postal_code: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub district: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Studio profile row with subscription annotation fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudioRow {
    pub id: RecordId,
    pub user_id: UserId,
    pub name: String,
    pub legal_name: String,
    pub email: String,
    pub phone: String,
    pub tax_id: String,
    pub image_url: Option<String>,
    /// Billing customer id; `None` when billing was unavailable or disabled.
    pub customer_id: Option<String>,
    /// Billing subscription id; `None` when billing was unavailable or disabled.
    pub subscription_id: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_due: NaiveDate,
}

/// Studio address row. Fields reflect the resolved address when the
/// postal-code lookup succeeded, otherwise the caller-submitted values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRow {
    pub id: RecordId,
    pub user_id: UserId,
    pub postal_code: String,
    pub street: Option<String>,
    pub number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub complement: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A row destined for one of the registration collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Row {
    User(UserRow),
    Client(ClientRow),
    Studio(StudioRow),
    Address(AddressRow),
}

impl Row {
    /// Returns the collection this row belongs to.
    pub fn collection(&self) -> Collection {
        match self {
            Row::User(_) => Collection::Users,
            Row::Client(_) => Collection::Clients,
            Row::Studio(_) => Collection::Studios,
            Row::Address(_) => Collection::Addresses,
        }
    }

    /// Returns the row's primary key.
    pub fn id(&self) -> RecordId {
        match self {
            Row::User(row) => RecordId::from(row.id),
            Row::Client(row) => row.id,
            Row::Studio(row) => row.id,
            Row::Address(row) => row.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_table_names() {
        assert_eq!(Collection::Users.table_name(), "users");
        assert_eq!(Collection::Clients.table_name(), "clients");
        assert_eq!(Collection::Studios.table_name(), "studios");
        assert_eq!(Collection::Addresses.table_name(), "addresses");
    }

    #[test]
    fn row_collection_and_id() {
        let user_id = UserId::new();
        let row = Row::User(UserRow {
            id: user_id,
            email: "a@b.com".to_string(),
            role: AccountRole::Client,
        });
        assert_eq!(row.collection(), Collection::Users);
        assert_eq!(row.id().as_uuid(), user_id.as_uuid());
    }

    #[test]
    fn subscription_status_serializes_snake_case() {
        let json = serde_json::to_string(&SubscriptionStatus::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");
    }
}
