use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A customer entity identified by a unique policy number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyHolder {
    pub id: i64,
    pub name: String,
    pub policy_number: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A filed claim against a policy, owned by exactly one policy holder.
///
/// `claim_id` is the human-facing identifier (e.g. `CLM-2024-001`) and is
/// distinct from the store-assigned numeric `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceClaim {
    pub id: i64,
    pub claim_id: String,
    pub policy_holder_id: i64,
    pub date_filed: DateTime<Utc>,
    pub claim_type: ClaimType,
    pub status: ClaimStatus,
    pub amount: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A claim composed with its owning policy holder, as returned by the joined
/// read operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimWithPolicyHolder {
    #[serde(flatten)]
    pub claim: InsuranceClaim,
    pub policy_holder: PolicyHolder,
}

/// Category of an insurance claim. The stored set is closed; any other value
/// is a data-integrity error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    Auto,
    Home,
    Life,
    Health,
    Property,
    Liability,
}

impl ClaimType {
    /// Returns the canonical database representation for the claim type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Home => "HOME",
            Self::Life => "LIFE",
            Self::Health => "HEALTH",
            Self::Property => "PROPERTY",
            Self::Liability => "LIABILITY",
        }
    }
}

impl FromStr for ClaimType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "AUTO" => Ok(Self::Auto),
            "HOME" => Ok(Self::Home),
            "LIFE" => Ok(Self::Life),
            "HEALTH" => Ok(Self::Health),
            "PROPERTY" => Ok(Self::Property),
            "LIABILITY" => Ok(Self::Liability),
            other => Err(UnknownVariant {
                kind: "claim_type",
                value: other.to_string(),
            }),
        }
    }
}

/// Processing stage of a claim.
///
/// Transitions are deliberately unrestricted: any status may move to any
/// other, including re-opening a settled claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    Investigating,
    Settled,
}

impl ClaimStatus {
    /// Returns the canonical database representation for the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Investigating => "INVESTIGATING",
            Self::Settled => "SETTLED",
        }
    }
}

impl Default for ClaimStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl FromStr for ClaimStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "INVESTIGATING" => Ok(Self::Investigating),
            "SETTLED" => Ok(Self::Settled),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Raised when a stored enumeration column holds a value outside its closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Input for the createPolicyHolder operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePolicyHolderInput {
    pub name: String,
    pub policy_number: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub date_of_birth: NaiveDate,
}

/// Partial-field input for the updatePolicyHolder operation. Absent fields
/// leave the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePolicyHolderInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

impl UpdatePolicyHolderInput {
    /// Returns `true` when no mutable field is supplied. Such an update is
    /// still applied and bumps `updated_at`.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.policy_number.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.date_of_birth.is_none()
    }
}

/// Input for the createInsuranceClaim operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInsuranceClaimInput {
    pub claim_id: String,
    pub policy_holder_id: i64,
    pub date_filed: DateTime<Utc>,
    pub claim_type: ClaimType,
    #[serde(default)]
    pub status: Option<ClaimStatus>,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial-field input for the updateInsuranceClaim operation.
///
/// `description` is tri-state: absent leaves the stored value unchanged,
/// `null` clears it, and a string replaces it. The double option keeps
/// "unset" and "set to null" distinguishable through deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateInsuranceClaimInput {
    #[serde(default)]
    pub claim_id: Option<String>,
    #[serde(default)]
    pub policy_holder_id: Option<i64>,
    #[serde(default)]
    pub date_filed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub claim_type: Option<ClaimType>,
    #[serde(default)]
    pub status: Option<ClaimStatus>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

impl UpdateInsuranceClaimInput {
    /// Returns `true` when no mutable field is supplied.
    pub fn is_empty(&self) -> bool {
        self.claim_id.is_none()
            && self.policy_holder_id.is_none()
            && self.date_filed.is_none()
            && self.claim_type.is_none()
            && self.status.is_none()
            && self.amount.is_none()
            && self.description.is_none()
    }
}

/// Deserializes a field that distinguishes "absent" from "present but null".
/// Serde only invokes this when the key is present, so the outer option is
/// always `Some` here; absence falls back to the `default` attribute.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
