// 🛕 Data Model - Temple masters and transactional entries
//
// Every entity is owned by the persistence layer and read-only to the ledger core.
// Amounts are stored non-negative; direction is assigned only when merging (see ledger.rs).
// Dates are ISO 8601 `YYYY-MM-DD` strings, so lexicographic order == chronological order.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// RECORD (value + stable identity)
// ============================================================================

/// A document as delivered by a collection feed: the entity value plus the
/// opaque stable identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: String,

    #[serde(flatten)]
    pub value: T,
}

impl<T> Record<T> {
    pub fn new(id: impl Into<String>, value: T) -> Self {
        Record {
            id: id.into(),
            value,
        }
    }
}

impl<T> std::ops::Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxType {
    Full,
    Half,
}

impl TaxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxType::Full => "Full",
            TaxType::Half => "Half",
        }
    }
}

/// Devotee / master status. Any value other than "Active" or "Inactive",
/// including a missing one, decodes as `Unknown` and counts as not active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    Active,
    Inactive,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Inactive => "Inactive",
            Status::Unknown => "Unknown",
        }
    }

    pub fn is_active(&self) -> bool {
        *self == Status::Active
    }
}

// ============================================================================
// COLLECTIONS
// ============================================================================

/// The nine logical collections the persistence collaborator exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Villages,
    Devotees,
    TaxMasters,
    DonationMasters,
    PettyCashMasters,
    TaxEntries,
    DonationEntries,
    InterestEntries,
    PaymentEntries,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Villages,
        Collection::Devotees,
        Collection::TaxMasters,
        Collection::DonationMasters,
        Collection::PettyCashMasters,
        Collection::TaxEntries,
        Collection::DonationEntries,
        Collection::InterestEntries,
        Collection::PaymentEntries,
    ];

    /// Collection name as used by the document store
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Villages => "villages",
            Collection::Devotees => "devotees",
            Collection::TaxMasters => "taxMasters",
            Collection::DonationMasters => "donationMasters",
            Collection::PettyCashMasters => "pettyCashMasters",
            Collection::TaxEntries => "taxEntries",
            Collection::DonationEntries => "donationEntries",
            Collection::InterestEntries => "interestEntries",
            Collection::PaymentEntries => "paymentEntries",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown collection: {}", s))
    }
}

// ============================================================================
// MASTERS (reference data)
// ============================================================================
//
// Every field is defaulted. A document with a missing field still decodes and
// keeps counting toward totals; only a value of the wrong JSON shape (say, a
// string amount) makes the feed skip it.
//
// A missing or unrecognized `taxType` decodes as None; `status` as Unknown.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Village {
    pub name: String,
    pub post: String,
    pub taluk: String,
    pub district: String,
    pub representative: String,
    pub created_at: String,
}

/// Devotee (tax person). `status` gates eligibility in the tax report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Devotee {
    pub village_name: String,
    pub taxperson_name: String,
    pub father_name: String,
    #[serde(deserialize_with = "lenient_tax_type")]
    pub tax_type: Option<TaxType>,
    #[serde(deserialize_with = "lenient_status")]
    pub status: Status,
    pub spl_name: String,
    pub current_location: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxMaster {
    pub tax_amount: f64,
    #[serde(rename = "type", deserialize_with = "lenient_tax_type")]
    pub tax_type: Option<TaxType>,
    pub interest_percentage: f64,
    #[serde(deserialize_with = "lenient_status")]
    pub status: Status,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DonationMaster {
    pub donation_type: String,
    pub description: String,
    #[serde(deserialize_with = "lenient_status")]
    pub status: Status,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PettyCashMaster {
    pub issue_type: String,
    pub description: String,
    #[serde(deserialize_with = "lenient_status")]
    pub status: Status,
    pub created_at: String,
}

// ============================================================================
// TRANSACTIONAL ENTRIES
// ============================================================================

/// Tax payment entry. `paid == false` means pending: excluded from paid
/// totals, included in pending totals. `year == 0` means the year is unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxEntry {
    /// Weak reference to `Devotee::taxperson_name`
    pub devotee_name: String,
    pub village_name: String,
    #[serde(deserialize_with = "lenient_tax_type")]
    pub tax_type: Option<TaxType>,
    pub year: i32,
    pub amount: f64,
    pub payment_date: String,
    pub paid: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DonationEntry {
    pub devotee_name: String,
    pub donation_type: String,
    pub amount: f64,
    pub payment_date: String,
    pub notes: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterestEntry {
    pub devotee_name: String,
    pub principal_amount: f64,
    pub interest_amount: f64,
    pub payment_date: String,
    pub notes: String,
    pub created_at: String,
}

/// Outflow / expense. Always counted toward expense totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentEntry {
    pub payee_name: String,
    pub category: String,
    pub amount: f64,
    pub payment_date: String,
    pub notes: String,
    pub created_at: String,
}

/// null or an unrecognized value → `Status::Unknown`
fn lenient_status<'de, D>(deserializer: D) -> Result<Status, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

/// null, "" or an unrecognized value → None
fn lenient_tax_type<'de, D>(deserializer: D) -> Result<Option<TaxType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}

// ============================================================================
// TESTS
// ============================================================================
