use std::fmt;

use rust_decimal::Decimal;

use crate::types::{
    CreateInsuranceClaimInput, CreatePolicyHolderInput, UpdateInsuranceClaimInput,
    UpdatePolicyHolderInput,
};

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Input rejected before reaching the store. Carries every offending field so
/// the caller can attribute the failure precisely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: ")?;
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Accumulates field errors across the checks for one input.
#[derive(Debug, Default)]
struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    fn require_non_empty(&mut self, field: &'static str, value: &str) {
        if value.is_empty() {
            self.errors
                .push(FieldError::new(field, "must not be empty"));
        }
    }

    fn require_email(&mut self, field: &'static str, value: &str) {
        if !is_well_formed_email(value) {
            self.errors
                .push(FieldError::new(field, "must be a valid email address"));
        }
    }

    fn require_positive_id(&mut self, field: &'static str, value: i64) {
        if value <= 0 {
            self.errors
                .push(FieldError::new(field, "must be a positive integer"));
        }
    }

    fn require_amount(&mut self, field: &'static str, value: Decimal) {
        if value <= Decimal::ZERO {
            self.errors.push(FieldError::new(field, "must be positive"));
        } else if value.normalize().scale() > 2 {
            self.errors.push(FieldError::new(
                field,
                "must have at most two decimal places",
            ));
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}

/// Minimal well-formedness check for email addresses: one `@` separating a
/// non-empty local part from a domain with an interior dot, no whitespace.
fn is_well_formed_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.splitn(2, '@');
    let (Some(local), Some(domain)) = (parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot < domain.len() - 1,
        None => false,
    }
}

/// Checks a createPolicyHolder input against the per-field rules.
pub fn validate_create_policy_holder(
    input: &CreatePolicyHolderInput,
) -> Result<(), ValidationError> {
    let mut checks = Checks::default();
    checks.require_non_empty("name", &input.name);
    checks.require_non_empty("policy_number", &input.policy_number);
    checks.require_email("email", &input.email);
    checks.require_non_empty("phone", &input.phone);
    checks.require_non_empty("address", &input.address);
    checks.finish()
}

/// Checks an updatePolicyHolder input. Every supplied field is held to the
/// same rule as at creation; absent fields are skipped.
pub fn validate_update_policy_holder(
    input: &UpdatePolicyHolderInput,
) -> Result<(), ValidationError> {
    let mut checks = Checks::default();
    if let Some(name) = &input.name {
        checks.require_non_empty("name", name);
    }
    if let Some(policy_number) = &input.policy_number {
        checks.require_non_empty("policy_number", policy_number);
    }
    if let Some(email) = &input.email {
        checks.require_email("email", email);
    }
    if let Some(phone) = &input.phone {
        checks.require_non_empty("phone", phone);
    }
    if let Some(address) = &input.address {
        checks.require_non_empty("address", address);
    }
    checks.finish()
}

/// Checks a createInsuranceClaim input against the per-field rules.
/// Referential checks against the store happen in the operation layer.
pub fn validate_create_claim(input: &CreateInsuranceClaimInput) -> Result<(), ValidationError> {
    let mut checks = Checks::default();
    checks.require_non_empty("claim_id", &input.claim_id);
    checks.require_positive_id("policy_holder_id", input.policy_holder_id);
    checks.require_amount("amount", input.amount);
    checks.finish()
}

/// Checks an updateInsuranceClaim input; supplied fields only.
pub fn validate_update_claim(input: &UpdateInsuranceClaimInput) -> Result<(), ValidationError> {
    let mut checks = Checks::default();
    if let Some(claim_id) = &input.claim_id {
        checks.require_non_empty("claim_id", claim_id);
    }
    if let Some(policy_holder_id) = input.policy_holder_id {
        checks.require_positive_id("policy_holder_id", policy_holder_id);
    }
    if let Some(amount) = input.amount {
        checks.require_amount("amount", amount);
    }
    checks.finish()
}
