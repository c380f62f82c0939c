use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use thiserror::Error;
use tracing::warn;

use claims_desk_core::types::{
    ClaimStatus, ClaimWithPolicyHolder, CreateInsuranceClaimInput, CreatePolicyHolderInput,
    InsuranceClaim, PolicyHolder, UpdateInsuranceClaimInput, UpdatePolicyHolderInput,
};
use claims_desk_core::validate::{
    validate_create_claim, validate_create_policy_holder, validate_update_claim,
    validate_update_policy_holder, ValidationError,
};
use claims_desk_storage::{ClaimError, Database, NewClaim, NewPolicyHolder, PolicyHolderError};

/// Implements the record-management operations: validate the input, run one
/// transaction against the store, and return the stored record.
///
/// The clock is injectable so tests can observe `updated_at` advancing
/// deterministically.
#[derive(Clone)]
pub struct ClaimsService {
    database: Database,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl ClaimsService {
    pub fn new(database: Database, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        Self { database, clock }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    #[cfg(test)]
    pub fn with_clock(&self, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        Self {
            database: self.database.clone(),
            clock,
        }
    }

    /// Validates and inserts a new policy holder, returning the stored
    /// record with its generated id and timestamps.
    pub async fn create_policy_holder(
        &self,
        input: CreatePolicyHolderInput,
    ) -> Result<PolicyHolder, OperationError> {
        validate_create_policy_holder(&input)?;

        let now = self.now();
        let repo = self.database.policy_holders();
        let mut tx = self.database.begin().await?;
        let holder = repo
            .insert(
                &mut tx,
                &NewPolicyHolder {
                    name: &input.name,
                    policy_number: &input.policy_number,
                    email: &input.email,
                    phone: &input.phone,
                    address: &input.address,
                    date_of_birth: input.date_of_birth,
                    created_at: now,
                    updated_at: now,
                },
            )
            .await?;
        tx.commit().await?;

        Ok(holder)
    }

    /// Lists all policy holders ordered by name ascending.
    pub async fn get_policy_holders(&self) -> Result<Vec<PolicyHolder>, OperationError> {
        Ok(self.database.policy_holders().list().await?)
    }

    /// Fetches one policy holder, or `None` when the id is unknown.
    pub async fn get_policy_holder(&self, id: i64) -> Result<Option<PolicyHolder>, OperationError> {
        Ok(self.database.policy_holders().fetch(id).await?)
    }

    /// Applies the supplied fields to an existing policy holder. Returns
    /// `None` when the target id does not exist; `updated_at` is bumped even
    /// when no mutable field is supplied.
    pub async fn update_policy_holder(
        &self,
        id: i64,
        input: UpdatePolicyHolderInput,
    ) -> Result<Option<PolicyHolder>, OperationError> {
        validate_update_policy_holder(&input)?;

        let repo = self.database.policy_holders();
        let mut tx = self.database.begin().await?;
        let Some(mut holder) = repo.fetch_for_update(&mut tx, id).await? else {
            return Ok(None);
        };

        if let Some(name) = input.name {
            holder.name = name;
        }
        if let Some(policy_number) = input.policy_number {
            holder.policy_number = policy_number;
        }
        if let Some(email) = input.email {
            holder.email = email;
        }
        if let Some(phone) = input.phone {
            holder.phone = phone;
        }
        if let Some(address) = input.address {
            holder.address = address;
        }
        if let Some(date_of_birth) = input.date_of_birth {
            holder.date_of_birth = date_of_birth;
        }
        holder.updated_at = self.now();

        repo.update(&mut tx, &holder).await?;
        tx.commit().await?;

        Ok(Some(holder))
    }

    /// Validates and inserts a new claim. The referenced policy holder must
    /// exist and the human-facing claim id must be unused; status defaults to
    /// `PENDING` and description to null.
    pub async fn create_insurance_claim(
        &self,
        input: CreateInsuranceClaimInput,
    ) -> Result<InsuranceClaim, OperationError> {
        validate_create_claim(&input)?;

        let now = self.now();
        let holders = self.database.policy_holders();
        let claims = self.database.claims();
        let mut tx = self.database.begin().await?;

        if !holders.exists(&mut tx, input.policy_holder_id).await? {
            return Err(OperationError::NotFound {
                entity: "policy holder",
                id: input.policy_holder_id,
            });
        }
        if claims.claim_id_taken(&mut tx, &input.claim_id).await? {
            counter!("db_constraint_violations_total", "constraint" => "claim_id").increment(1);
            return Err(OperationError::DuplicateKey {
                field: "claim_id",
                value: input.claim_id,
            });
        }

        let claim = claims
            .insert(
                &mut tx,
                &NewClaim {
                    claim_id: &input.claim_id,
                    policy_holder_id: input.policy_holder_id,
                    date_filed: input.date_filed,
                    claim_type: input.claim_type,
                    status: input.status.unwrap_or_default(),
                    amount: input.amount,
                    description: input.description.as_deref(),
                    created_at: now,
                    updated_at: now,
                },
            )
            .await
            .map_err(|err| match err {
                // Backstop for a concurrent delete-free race; the pre-check
                // above already handled the common path.
                ClaimError::MissingPolicyHolder(id) => OperationError::NotFound {
                    entity: "policy holder",
                    id,
                },
                other => other.into(),
            })?;
        tx.commit().await?;

        Ok(claim)
    }

    /// Lists every claim joined with its policy holder, most recently filed
    /// first.
    pub async fn get_insurance_claims(&self) -> Result<Vec<ClaimWithPolicyHolder>, OperationError> {
        Ok(self.database.claims().list_with_holders().await?)
    }

    /// Fetches one claim joined with its policy holder, or `None` when the
    /// claim id is unknown.
    pub async fn get_insurance_claim(
        &self,
        id: i64,
    ) -> Result<Option<ClaimWithPolicyHolder>, OperationError> {
        Ok(self.database.claims().fetch_with_holder(id).await?)
    }

    /// Applies the supplied fields to an existing claim. Returns `None` when
    /// the target id does not exist. When `policy_holder_id` is supplied the
    /// referential check re-applies. Status transitions are unrestricted.
    pub async fn update_insurance_claim(
        &self,
        id: i64,
        input: UpdateInsuranceClaimInput,
    ) -> Result<Option<InsuranceClaim>, OperationError> {
        validate_update_claim(&input)?;

        let holders = self.database.policy_holders();
        let claims = self.database.claims();
        let mut tx = self.database.begin().await?;
        let Some(mut claim) = claims.fetch_for_update(&mut tx, id).await? else {
            return Ok(None);
        };

        if let Some(policy_holder_id) = input.policy_holder_id {
            if !holders.exists(&mut tx, policy_holder_id).await? {
                counter!("db_constraint_violations_total", "constraint" => "policy_holder_id")
                    .increment(1);
                return Err(OperationError::ForeignKeyViolation {
                    field: "policy_holder_id",
                    value: policy_holder_id,
                });
            }
            claim.policy_holder_id = policy_holder_id;
        }
        if let Some(claim_id) = input.claim_id {
            claim.claim_id = claim_id;
        }
        if let Some(date_filed) = input.date_filed {
            claim.date_filed = date_filed;
        }
        if let Some(claim_type) = input.claim_type {
            claim.claim_type = claim_type;
        }
        if let Some(status) = input.status {
            if claim.status == ClaimStatus::Settled && status != ClaimStatus::Settled {
                warn!(
                    stage = "service",
                    claim_id = %claim.claim_id,
                    from = %claim.status,
                    to = %status,
                    "re-opening a settled claim"
                );
            }
            claim.status = status;
        }
        if let Some(amount) = input.amount {
            claim.amount = amount;
        }
        if let Some(description) = input.description {
            claim.description = description;
        }
        claim.updated_at = self.now();

        claims.update(&mut tx, &claim).await?;
        tx.commit().await?;

        Ok(Some(claim))
    }

    /// Lists the claims filed by one policy holder, most recently filed
    /// first. An unknown policy holder yields an empty list, not an error.
    pub async fn get_claims_by_policy_holder(
        &self,
        policy_holder_id: i64,
    ) -> Result<Vec<InsuranceClaim>, OperationError> {
        Ok(self
            .database
            .claims()
            .list_for_policy_holder(policy_holder_id)
            .await?)
    }
}

/// Failure taxonomy shared by all operations.
///
/// A creation referencing a missing policy holder is `NotFound`; an update
/// whose target id is missing yields `Ok(None)` instead, never an error.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("{field} '{value}' already exists")]
    DuplicateKey {
        field: &'static str,
        value: String,
    },
    #[error("{field} {value} does not reference an existing policy holder")]
    ForeignKeyViolation { field: &'static str, value: i64 },
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<sqlx::Error> for OperationError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(Box::new(err))
    }
}

impl From<PolicyHolderError> for OperationError {
    fn from(err: PolicyHolderError) -> Self {
        match err {
            PolicyHolderError::DuplicatePolicyNumber(value) => {
                counter!("db_constraint_violations_total", "constraint" => "policy_number")
                    .increment(1);
                Self::DuplicateKey {
                    field: "policy_number",
                    value,
                }
            }
            PolicyHolderError::Database(err) => Self::Storage(Box::new(err)),
        }
    }
}

impl From<ClaimError> for OperationError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::DuplicateClaimId(value) => {
                counter!("db_constraint_violations_total", "constraint" => "claim_id").increment(1);
                Self::DuplicateKey {
                    field: "claim_id",
                    value,
                }
            }
            ClaimError::MissingPolicyHolder(value) => {
                counter!("db_constraint_violations_total", "constraint" => "policy_holder_id")
                    .increment(1);
                Self::ForeignKeyViolation {
                    field: "policy_holder_id",
                    value,
                }
            }
            ClaimError::Decode(err) => Self::Storage(Box::new(err)),
            ClaimError::Database(err) => Self::Storage(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use claims_desk_core::types::ClaimType;
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct TestClock {
        current: Arc<Mutex<DateTime<Utc>>>,
    }

    impl TestClock {
        fn new(start: DateTime<Utc>) -> Self {
            Self {
                current: Arc::new(Mutex::new(start)),
            }
        }

        fn as_fn(&self) -> Arc<dyn Fn() -> DateTime<Utc> + Send + Sync> {
            let current = self.current.clone();
            Arc::new(move || *current.lock().expect("clock poisoned"))
        }

        fn advance_to(&self, value: DateTime<Utc>) {
            *self.current.lock().expect("clock poisoned") = value;
        }
    }

    fn ts(value: &str) -> DateTime<Utc> {
        value.parse().expect("timestamp")
    }

    async fn setup_service(clock: &TestClock) -> (TempDir, ClaimsService) {
        let dir = TempDir::new().expect("tempdir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("claims.db").display());
        let db = Database::connect(&url).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        (dir, ClaimsService::new(db, clock.as_fn()))
    }

    fn john_doe() -> CreatePolicyHolderInput {
        CreatePolicyHolderInput {
            name: "John Doe".to_string(),
            policy_number: "POL-1".to_string(),
            email: "j@x.com".to_string(),
            phone: "555".to_string(),
            address: "1 Main St".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
        }
    }

    fn claim_for(policy_holder_id: i64, claim_id: &str) -> CreateInsuranceClaimInput {
        CreateInsuranceClaimInput {
            claim_id: claim_id.to_string(),
            policy_holder_id,
            date_filed: ts("2024-01-15T00:00:00Z"),
            claim_type: ClaimType::Auto,
            status: None,
            amount: "5000.50".parse().unwrap(),
            description: None,
        }
    }

    #[tokio::test]
    async fn create_policy_holder_returns_input_fields_with_generated_id() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;

        let holder = service
            .create_policy_holder(john_doe())
            .await
            .expect("create succeeds");
        assert_eq!(holder.id, 1);
        assert_eq!(holder.name, "John Doe");
        assert_eq!(holder.policy_number, "POL-1");
        assert_eq!(holder.created_at, ts("2024-01-01T00:00:00Z"));
        assert_eq!(holder.updated_at, holder.created_at);
    }

    #[tokio::test]
    async fn create_policy_holder_rejects_invalid_input_without_writing() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;

        let err = service
            .create_policy_holder(CreatePolicyHolderInput {
                email: "nope".to_string(),
                ..john_doe()
            })
            .await
            .expect_err("invalid email should fail");
        assert!(matches!(err, OperationError::Validation(_)));
        assert!(service.get_policy_holders().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn duplicate_policy_number_maps_to_duplicate_key() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;
        service.create_policy_holder(john_doe()).await.expect("first");

        let err = service
            .create_policy_holder(CreatePolicyHolderInput {
                name: "Jane Doe".to_string(),
                ..john_doe()
            })
            .await
            .expect_err("duplicate policy number should fail");
        assert!(matches!(
            err,
            OperationError::DuplicateKey { field: "policy_number", ref value } if value == "POL-1"
        ));
    }

    #[tokio::test]
    async fn update_policy_holder_applies_only_supplied_fields() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;
        let holder = service.create_policy_holder(john_doe()).await.expect("create");

        clock.advance_to(ts("2024-02-01T00:00:00Z"));
        let updated = service
            .update_policy_holder(
                holder.id,
                UpdatePolicyHolderInput {
                    phone: Some("555-0100".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update succeeds")
            .expect("target exists");

        assert_eq!(updated.phone, "555-0100");
        assert_eq!(updated.name, "John Doe");
        assert_eq!(updated.created_at, ts("2024-01-01T00:00:00Z"));
        assert_eq!(updated.updated_at, ts("2024-02-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn empty_update_still_advances_updated_at() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;
        let holder = service.create_policy_holder(john_doe()).await.expect("create");

        clock.advance_to(ts("2024-03-01T00:00:00Z"));
        let updated = service
            .update_policy_holder(holder.id, UpdatePolicyHolderInput::default())
            .await
            .expect("update succeeds")
            .expect("target exists");

        assert!(updated.updated_at > holder.updated_at);
        assert_eq!(
            PolicyHolder {
                updated_at: holder.updated_at,
                ..updated
            },
            holder
        );
    }

    #[tokio::test]
    async fn update_missing_policy_holder_returns_none() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;

        let result = service
            .update_policy_holder(
                42,
                UpdatePolicyHolderInput {
                    name: Some("Nobody".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("missing target is not an error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn create_claim_defaults_status_and_description() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;
        let holder = service.create_policy_holder(john_doe()).await.expect("create");

        let claim = service
            .create_insurance_claim(claim_for(holder.id, "CLM-1"))
            .await
            .expect("create succeeds");
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert_eq!(claim.description, None);
        assert_eq!(claim.amount.to_string(), "5000.50");
    }

    #[tokio::test]
    async fn create_claim_for_missing_holder_is_not_found_and_writes_nothing() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;

        let err = service
            .create_insurance_claim(claim_for(99, "CLM-1"))
            .await
            .expect_err("missing policy holder should fail");
        assert!(matches!(
            err,
            OperationError::NotFound { entity: "policy holder", id: 99 }
        ));
        assert!(service.get_insurance_claims().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn second_claim_with_same_claim_id_fails_first_stays_readable() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;
        let holder = service.create_policy_holder(john_doe()).await.expect("create");
        let first = service
            .create_insurance_claim(claim_for(holder.id, "CLM-1"))
            .await
            .expect("first create");

        let err = service
            .create_insurance_claim(claim_for(holder.id, "CLM-1"))
            .await
            .expect_err("duplicate claim_id should fail");
        assert!(matches!(
            err,
            OperationError::DuplicateKey { field: "claim_id", ref value } if value == "CLM-1"
        ));

        let readable = service
            .get_insurance_claim(first.id)
            .await
            .expect("fetch")
            .expect("first claim still present");
        assert_eq!(readable.claim.claim_id, "CLM-1");
    }

    #[tokio::test]
    async fn dashboard_scenario_round_trips() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;

        let holder = service.create_policy_holder(john_doe()).await.expect("create");
        assert_eq!(holder.id, 1);

        let claim = service
            .create_insurance_claim(claim_for(holder.id, "CLM-1"))
            .await
            .expect("create claim");
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert_eq!(claim.description, None);

        clock.advance_to(ts("2024-01-20T00:00:00Z"));
        let updated = service
            .update_insurance_claim(
                claim.id,
                UpdateInsuranceClaimInput {
                    status: Some(ClaimStatus::Approved),
                    ..Default::default()
                },
            )
            .await
            .expect("update succeeds")
            .expect("target exists");
        assert_eq!(updated.status, ClaimStatus::Approved);
        assert_eq!(updated.amount.to_string(), "5000.50");
        assert_eq!(updated.claim_id, "CLM-1");

        let composite = service
            .get_insurance_claim(claim.id)
            .await
            .expect("fetch")
            .expect("present");
        assert_eq!(composite.claim.status, ClaimStatus::Approved);
        assert_eq!(composite.policy_holder.name, "John Doe");
    }

    #[tokio::test]
    async fn update_claim_to_missing_holder_is_foreign_key_violation() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;
        let holder = service.create_policy_holder(john_doe()).await.expect("create");
        let claim = service
            .create_insurance_claim(claim_for(holder.id, "CLM-1"))
            .await
            .expect("create claim");

        let err = service
            .update_insurance_claim(
                claim.id,
                UpdateInsuranceClaimInput {
                    policy_holder_id: Some(77),
                    ..Default::default()
                },
            )
            .await
            .expect_err("dangling reference should fail");
        assert!(matches!(
            err,
            OperationError::ForeignKeyViolation { field: "policy_holder_id", value: 77 }
        ));
    }

    #[tokio::test]
    async fn update_missing_claim_returns_none() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;

        let result = service
            .update_insurance_claim(
                42,
                UpdateInsuranceClaimInput {
                    status: Some(ClaimStatus::Approved),
                    ..Default::default()
                },
            )
            .await
            .expect("missing target is not an error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn settled_claims_may_be_reopened() {
        // Documented permissive behavior: transitions are unrestricted, so a
        // settled claim may move back to pending.
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;
        let holder = service.create_policy_holder(john_doe()).await.expect("create");
        let claim = service
            .create_insurance_claim(CreateInsuranceClaimInput {
                status: Some(ClaimStatus::Settled),
                ..claim_for(holder.id, "CLM-1")
            })
            .await
            .expect("create claim");
        assert_eq!(claim.status, ClaimStatus::Settled);

        let reopened = service
            .update_insurance_claim(
                claim.id,
                UpdateInsuranceClaimInput {
                    status: Some(ClaimStatus::Pending),
                    ..Default::default()
                },
            )
            .await
            .expect("update succeeds")
            .expect("target exists");
        assert_eq!(reopened.status, ClaimStatus::Pending);
    }

    #[tokio::test]
    async fn description_set_to_null_clears_while_absent_leaves_unchanged() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;
        let holder = service.create_policy_holder(john_doe()).await.expect("create");
        let claim = service
            .create_insurance_claim(CreateInsuranceClaimInput {
                description: Some("rear-end collision".to_string()),
                ..claim_for(holder.id, "CLM-1")
            })
            .await
            .expect("create claim");

        let untouched = service
            .update_insurance_claim(
                claim.id,
                UpdateInsuranceClaimInput {
                    status: Some(ClaimStatus::Investigating),
                    ..Default::default()
                },
            )
            .await
            .expect("update")
            .expect("present");
        assert_eq!(untouched.description.as_deref(), Some("rear-end collision"));

        let cleared = service
            .update_insurance_claim(
                claim.id,
                UpdateInsuranceClaimInput {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .await
            .expect("update")
            .expect("present");
        assert_eq!(cleared.description, None);
    }

    #[tokio::test]
    async fn amount_round_trips_for_any_two_decimal_value() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;
        let holder = service.create_policy_holder(john_doe()).await.expect("create");

        for (index, raw) in ["999.99", "0.01", "123456.78", "5000.50"].iter().enumerate() {
            let claim = service
                .create_insurance_claim(CreateInsuranceClaimInput {
                    amount: raw.parse::<Decimal>().unwrap(),
                    ..claim_for(holder.id, &format!("CLM-{index}"))
                })
                .await
                .expect("create claim");
            let fetched = service
                .get_insurance_claim(claim.id)
                .await
                .expect("fetch")
                .expect("present");
            assert_eq!(fetched.claim.amount.to_string(), *raw);
        }
    }

    #[tokio::test]
    async fn listings_follow_the_mandated_orderings() {
        let clock = TestClock::new(ts("2024-01-01T00:00:00Z"));
        let (_dir, service) = setup_service(&clock).await;
        let bob = service
            .create_policy_holder(CreatePolicyHolderInput {
                name: "Bob".to_string(),
                policy_number: "POL-2".to_string(),
                ..john_doe()
            })
            .await
            .expect("create");
        let alice = service
            .create_policy_holder(CreatePolicyHolderInput {
                name: "Alice".to_string(),
                policy_number: "POL-3".to_string(),
                ..john_doe()
            })
            .await
            .expect("create");

        for (claim_id, holder_id, filed) in [
            ("CLM-1", bob.id, "2024-01-15T00:00:00Z"),
            ("CLM-2", alice.id, "2024-03-15T00:00:00Z"),
            ("CLM-3", bob.id, "2024-02-15T00:00:00Z"),
        ] {
            service
                .create_insurance_claim(CreateInsuranceClaimInput {
                    date_filed: ts(filed),
                    ..claim_for(holder_id, claim_id)
                })
                .await
                .expect("create claim");
        }

        let holders = service.get_policy_holders().await.expect("list");
        let names: Vec<_> = holders.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);

        let claims = service.get_insurance_claims().await.expect("list");
        let ids: Vec<_> = claims.iter().map(|c| c.claim.claim_id.as_str()).collect();
        assert_eq!(ids, vec!["CLM-2", "CLM-3", "CLM-1"]);

        let bobs = service
            .get_claims_by_policy_holder(bob.id)
            .await
            .expect("list");
        let ids: Vec<_> = bobs.iter().map(|c| c.claim_id.as_str()).collect();
        assert_eq!(ids, vec!["CLM-3", "CLM-1"]);

        let unknown = service.get_claims_by_policy_holder(999).await.expect("list");
        assert!(unknown.is_empty());
    }
}
