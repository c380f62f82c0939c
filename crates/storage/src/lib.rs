use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::{
    migrate::MigrateError, sqlite::SqlitePoolOptions, Sqlite, SqlitePool, Transaction,
};
use thiserror::Error;

use claims_desk_core::types::{
    ClaimStatus, ClaimType, ClaimWithPolicyHolder, InsuranceClaim, PolicyHolder, UnknownVariant,
};

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        apply_pragmas(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Begins a SQLite transaction. Every mutation operation runs as one
    /// transaction so existence checks and writes cannot interleave with
    /// concurrent requests.
    pub async fn begin(&self) -> Result<Transaction<'_, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Returns a handle to operate on policy holders.
    pub fn policy_holders(&self) -> PolicyHolderRepository {
        PolicyHolderRepository {
            pool: self.pool.clone(),
        }
    }

    /// Returns a handle to operate on insurance claims.
    pub fn claims(&self) -> ClaimRepository {
        ClaimRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<(), StorageError> {
    // foreign_keys defaults to OFF in SQLite; the claims table relies on it.
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    Ok(())
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to apply pragma: {0}")]
    Pragma(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Raised when a stored row cannot be converted back into a domain value.
/// Indicates data corruption rather than a caller mistake.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),
    #[error("invalid stored amount '{value}': {source}")]
    Amount {
        value: String,
        source: rust_decimal::Error,
    },
}

// SQLite extended result codes surfaced by sqlx.
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";

/// Repository for the `policy_holders` table.
#[derive(Clone)]
pub struct PolicyHolderRepository {
    pool: SqlitePool,
}

impl PolicyHolderRepository {
    /// Inserts a new policy holder and returns the stored record, including
    /// the generated id.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record: &NewPolicyHolder<'_>,
    ) -> Result<PolicyHolder, PolicyHolderError> {
        let row = sqlx::query_as::<_, PolicyHolderRow>(
            "INSERT INTO policy_holders \
             (name, policy_number, email, phone, address, date_of_birth, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, name, policy_number, email, phone, address, date_of_birth, created_at, updated_at",
        )
        .bind(record.name)
        .bind(record.policy_number)
        .bind(record.email)
        .bind(record.phone)
        .bind(record.address)
        .bind(record.date_of_birth.to_string())
        .bind(to_rfc3339(record.created_at))
        .bind(to_rfc3339(record.updated_at))
        .fetch_one(&mut **tx)
        .await
        .map_err(|err| map_policy_holder_error(err, record.policy_number))?;

        Ok(row.into_domain())
    }

    /// Fetches a policy holder by id.
    pub async fn fetch(&self, id: i64) -> Result<Option<PolicyHolder>, PolicyHolderError> {
        let row = sqlx::query_as::<_, PolicyHolderRow>(
            "SELECT id, name, policy_number, email, phone, address, date_of_birth, created_at, updated_at \
             FROM policy_holders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PolicyHolderRow::into_domain))
    }

    /// Fetches a policy holder inside an open transaction, for update flows.
    pub async fn fetch_for_update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
    ) -> Result<Option<PolicyHolder>, PolicyHolderError> {
        let row = sqlx::query_as::<_, PolicyHolderRow>(
            "SELECT id, name, policy_number, email, phone, address, date_of_birth, created_at, updated_at \
             FROM policy_holders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(PolicyHolderRow::into_domain))
    }

    /// Returns `true` when a policy holder with the given id exists.
    pub async fn exists(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
    ) -> Result<bool, PolicyHolderError> {
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM policy_holders WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.is_some())
    }

    /// Lists all policy holders ordered by name ascending. The id tiebreak
    /// keeps the ordering deterministic for equal names.
    pub async fn list(&self) -> Result<Vec<PolicyHolder>, PolicyHolderError> {
        let rows = sqlx::query_as::<_, PolicyHolderRow>(
            "SELECT id, name, policy_number, email, phone, address, date_of_birth, created_at, updated_at \
             FROM policy_holders ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PolicyHolderRow::into_domain).collect())
    }

    /// Writes the full merged record back. The caller has already applied the
    /// partial update over the fetched row inside the same transaction.
    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        holder: &PolicyHolder,
    ) -> Result<(), PolicyHolderError> {
        sqlx::query(
            "UPDATE policy_holders \
             SET name = ?, policy_number = ?, email = ?, phone = ?, address = ?, \
                 date_of_birth = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&holder.name)
        .bind(&holder.policy_number)
        .bind(&holder.email)
        .bind(&holder.phone)
        .bind(&holder.address)
        .bind(holder.date_of_birth.to_string())
        .bind(to_rfc3339(holder.updated_at))
        .bind(holder.id)
        .execute(&mut **tx)
        .await
        .map_err(|err| map_policy_holder_error(err, &holder.policy_number))?;

        Ok(())
    }
}

fn map_policy_holder_error(err: sqlx::Error, policy_number: &str) -> PolicyHolderError {
    match err {
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_UNIQUE) =>
        {
            PolicyHolderError::DuplicatePolicyNumber(policy_number.to_string())
        }
        other => PolicyHolderError::Database(other),
    }
}

/// Errors that can occur while operating on policy holders.
#[derive(Debug, Error)]
pub enum PolicyHolderError {
    #[error("policy number '{0}' already exists")]
    DuplicatePolicyNumber(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for PolicyHolderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

/// Data required to create a new policy holder row. Timestamps are supplied
/// by the caller's clock so they stay consistent within one operation.
pub struct NewPolicyHolder<'a> {
    pub name: &'a str,
    pub policy_number: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct PolicyHolderRow {
    id: i64,
    name: String,
    policy_number: String,
    email: String,
    phone: String,
    address: String,
    date_of_birth: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PolicyHolderRow {
    fn into_domain(self) -> PolicyHolder {
        PolicyHolder {
            id: self.id,
            name: self.name,
            policy_number: self.policy_number,
            email: self.email,
            phone: self.phone,
            address: self.address,
            date_of_birth: self.date_of_birth,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for the `insurance_claims` table.
#[derive(Clone)]
pub struct ClaimRepository {
    pool: SqlitePool,
}

const CLAIM_COLUMNS: &str = "id, claim_id, policy_holder_id, date_filed, claim_type, status, \
                             amount, description, created_at, updated_at";

impl ClaimRepository {
    /// Inserts a new claim and returns the stored record.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record: &NewClaim<'_>,
    ) -> Result<InsuranceClaim, ClaimError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            "INSERT INTO insurance_claims \
             (claim_id, policy_holder_id, date_filed, claim_type, status, amount, description, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {CLAIM_COLUMNS}",
        ))
        .bind(record.claim_id)
        .bind(record.policy_holder_id)
        .bind(to_rfc3339(record.date_filed))
        .bind(record.claim_type.as_str())
        .bind(record.status.as_str())
        .bind(amount_to_text(record.amount))
        .bind(record.description)
        .bind(to_rfc3339(record.created_at))
        .bind(to_rfc3339(record.updated_at))
        .fetch_one(&mut **tx)
        .await
        .map_err(|err| map_claim_error(err, record.claim_id, record.policy_holder_id))?;

        row.into_domain()
    }

    /// Returns `true` when the human-facing claim identifier is already taken.
    pub async fn claim_id_taken(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        claim_id: &str,
    ) -> Result<bool, ClaimError> {
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM insurance_claims WHERE claim_id = ?")
            .bind(claim_id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.is_some())
    }

    /// Fetches a claim by its numeric id.
    pub async fn fetch(&self, id: i64) -> Result<Option<InsuranceClaim>, ClaimError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            "SELECT {CLAIM_COLUMNS} FROM insurance_claims WHERE id = ?",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ClaimRow::into_domain).transpose()
    }

    /// Fetches a claim inside an open transaction, for update flows.
    pub async fn fetch_for_update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
    ) -> Result<Option<InsuranceClaim>, ClaimError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            "SELECT {CLAIM_COLUMNS} FROM insurance_claims WHERE id = ?",
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(ClaimRow::into_domain).transpose()
    }

    /// Writes the full merged record back.
    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        claim: &InsuranceClaim,
    ) -> Result<(), ClaimError> {
        sqlx::query(
            "UPDATE insurance_claims \
             SET claim_id = ?, policy_holder_id = ?, date_filed = ?, claim_type = ?, \
                 status = ?, amount = ?, description = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&claim.claim_id)
        .bind(claim.policy_holder_id)
        .bind(to_rfc3339(claim.date_filed))
        .bind(claim.claim_type.as_str())
        .bind(claim.status.as_str())
        .bind(amount_to_text(claim.amount))
        .bind(&claim.description)
        .bind(to_rfc3339(claim.updated_at))
        .bind(claim.id)
        .execute(&mut **tx)
        .await
        .map_err(|err| map_claim_error(err, &claim.claim_id, claim.policy_holder_id))?;

        Ok(())
    }

    /// Lists all claims joined with their policy holder, most recently filed
    /// first.
    pub async fn list_with_holders(&self) -> Result<Vec<ClaimWithPolicyHolder>, ClaimError> {
        let rows = sqlx::query_as::<_, ClaimWithHolderRow>(&format!(
            "{JOINED_SELECT} ORDER BY c.date_filed DESC, c.id DESC",
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ClaimWithHolderRow::into_domain).collect()
    }

    /// Fetches one claim joined with its policy holder.
    pub async fn fetch_with_holder(
        &self,
        id: i64,
    ) -> Result<Option<ClaimWithPolicyHolder>, ClaimError> {
        let row = sqlx::query_as::<_, ClaimWithHolderRow>(&format!(
            "{JOINED_SELECT} WHERE c.id = ?",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ClaimWithHolderRow::into_domain).transpose()
    }

    /// Lists the claims filed by one policy holder, most recently filed
    /// first. An unknown policy holder yields an empty list, not an error.
    pub async fn list_for_policy_holder(
        &self,
        policy_holder_id: i64,
    ) -> Result<Vec<InsuranceClaim>, ClaimError> {
        let rows = sqlx::query_as::<_, ClaimRow>(&format!(
            "SELECT {CLAIM_COLUMNS} FROM insurance_claims \
             WHERE policy_holder_id = ? ORDER BY date_filed DESC, id DESC",
        ))
        .bind(policy_holder_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ClaimRow::into_domain).collect()
    }
}

const JOINED_SELECT: &str = "SELECT c.id, c.claim_id, c.policy_holder_id, c.date_filed, \
        c.claim_type, c.status, c.amount, c.description, c.created_at, c.updated_at, \
        p.id AS holder_id, p.name AS holder_name, p.policy_number AS holder_policy_number, \
        p.email AS holder_email, p.phone AS holder_phone, p.address AS holder_address, \
        p.date_of_birth AS holder_date_of_birth, p.created_at AS holder_created_at, \
        p.updated_at AS holder_updated_at \
   FROM insurance_claims AS c \
  INNER JOIN policy_holders AS p ON p.id = c.policy_holder_id";

fn map_claim_error(err: sqlx::Error, claim_id: &str, policy_holder_id: i64) -> ClaimError {
    match err {
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_UNIQUE) =>
        {
            ClaimError::DuplicateClaimId(claim_id.to_string())
        }
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_FOREIGNKEY) =>
        {
            ClaimError::MissingPolicyHolder(policy_holder_id)
        }
        other => ClaimError::Database(other),
    }
}

/// Errors that can occur while operating on claims.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("claim id '{0}' already exists")]
    DuplicateClaimId(String),
    #[error("policy holder {0} does not exist")]
    MissingPolicyHolder(i64),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ClaimError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

/// Data required to create a new claim row.
pub struct NewClaim<'a> {
    pub claim_id: &'a str,
    pub policy_holder_id: i64,
    pub date_filed: DateTime<Utc>,
    pub claim_type: ClaimType,
    pub status: ClaimStatus,
    pub amount: Decimal,
    pub description: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ClaimRow {
    id: i64,
    claim_id: String,
    policy_holder_id: i64,
    date_filed: DateTime<Utc>,
    claim_type: String,
    status: String,
    amount: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ClaimRow {
    fn into_domain(self) -> Result<InsuranceClaim, ClaimError> {
        Ok(InsuranceClaim {
            id: self.id,
            claim_id: self.claim_id,
            policy_holder_id: self.policy_holder_id,
            date_filed: self.date_filed,
            claim_type: self.claim_type.parse().map_err(DecodeError::from)?,
            status: self.status.parse().map_err(DecodeError::from)?,
            amount: amount_from_text(&self.amount)?,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClaimWithHolderRow {
    id: i64,
    claim_id: String,
    policy_holder_id: i64,
    date_filed: DateTime<Utc>,
    claim_type: String,
    status: String,
    amount: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    holder_id: i64,
    holder_name: String,
    holder_policy_number: String,
    holder_email: String,
    holder_phone: String,
    holder_address: String,
    holder_date_of_birth: NaiveDate,
    holder_created_at: DateTime<Utc>,
    holder_updated_at: DateTime<Utc>,
}

impl ClaimWithHolderRow {
    fn into_domain(self) -> Result<ClaimWithPolicyHolder, ClaimError> {
        let claim = ClaimRow {
            id: self.id,
            claim_id: self.claim_id,
            policy_holder_id: self.policy_holder_id,
            date_filed: self.date_filed,
            claim_type: self.claim_type,
            status: self.status,
            amount: self.amount,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_domain()?;

        Ok(ClaimWithPolicyHolder {
            claim,
            policy_holder: PolicyHolder {
                id: self.holder_id,
                name: self.holder_name,
                policy_number: self.holder_policy_number,
                email: self.holder_email,
                phone: self.holder_phone,
                address: self.holder_address,
                date_of_birth: self.holder_date_of_birth,
                created_at: self.holder_created_at,
                updated_at: self.holder_updated_at,
            },
        })
    }
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Canonical two-decimal text form persisted for monetary values.
/// Validation guarantees the scale never exceeds two, so rescaling only pads.
fn amount_to_text(value: Decimal) -> String {
    let mut normalized = value;
    normalized.rescale(2);
    normalized.to_string()
}

fn amount_from_text(value: &str) -> Result<Decimal, DecodeError> {
    value.parse::<Decimal>().map_err(|source| DecodeError::Amount {
        value: value.to_string(),
        source,
    })
}
