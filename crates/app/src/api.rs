use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use tracing::{error, info};

use claims_desk_core::types::{
    CreateInsuranceClaimInput, CreatePolicyHolderInput, UpdateInsuranceClaimInput,
    UpdatePolicyHolderInput,
};

use crate::problem::ProblemResponse;
use crate::router::AppState;
use crate::service::OperationError;

pub async fn create_policy_holder(
    State(state): State<AppState>,
    Json(input): Json<CreatePolicyHolderInput>,
) -> Result<Response, ProblemResponse> {
    const OP: &str = "createPolicyHolder";
    let holder = state
        .service()
        .create_policy_holder(input)
        .await
        .map_err(|err| problem_from(OP, err))?;
    info!(stage = "api", op = OP, id = holder.id, "policy holder created");
    track(OP, "ok");
    Ok((StatusCode::CREATED, Json(holder)).into_response())
}

pub async fn list_policy_holders(
    State(state): State<AppState>,
) -> Result<Response, ProblemResponse> {
    const OP: &str = "getPolicyHolders";
    let holders = state
        .service()
        .get_policy_holders()
        .await
        .map_err(|err| problem_from(OP, err))?;
    track(OP, "ok");
    Ok(Json(holders).into_response())
}

pub async fn get_policy_holder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ProblemResponse> {
    const OP: &str = "getPolicyHolder";
    let holder = state
        .service()
        .get_policy_holder(id)
        .await
        .map_err(|err| problem_from(OP, err))?
        .ok_or_else(|| absent(OP, "policy holder", id))?;
    track(OP, "ok");
    Ok(Json(holder).into_response())
}

pub async fn update_policy_holder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePolicyHolderInput>,
) -> Result<Response, ProblemResponse> {
    const OP: &str = "updatePolicyHolder";
    let holder = state
        .service()
        .update_policy_holder(id, input)
        .await
        .map_err(|err| problem_from(OP, err))?
        .ok_or_else(|| absent(OP, "policy holder", id))?;
    info!(stage = "api", op = OP, id, "policy holder updated");
    track(OP, "ok");
    Ok(Json(holder).into_response())
}

pub async fn create_claim(
    State(state): State<AppState>,
    Json(input): Json<CreateInsuranceClaimInput>,
) -> Result<Response, ProblemResponse> {
    const OP: &str = "createInsuranceClaim";
    let claim = state
        .service()
        .create_insurance_claim(input)
        .await
        .map_err(|err| problem_from(OP, err))?;
    info!(stage = "api", op = OP, id = claim.id, claim_id = %claim.claim_id, "claim created");
    track(OP, "ok");
    Ok((StatusCode::CREATED, Json(claim)).into_response())
}

pub async fn list_claims(State(state): State<AppState>) -> Result<Response, ProblemResponse> {
    const OP: &str = "getInsuranceClaims";
    let claims = state
        .service()
        .get_insurance_claims()
        .await
        .map_err(|err| problem_from(OP, err))?;
    track(OP, "ok");
    Ok(Json(claims).into_response())
}

pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ProblemResponse> {
    const OP: &str = "getInsuranceClaim";
    let claim = state
        .service()
        .get_insurance_claim(id)
        .await
        .map_err(|err| problem_from(OP, err))?
        .ok_or_else(|| absent(OP, "claim", id))?;
    track(OP, "ok");
    Ok(Json(claim).into_response())
}

pub async fn update_claim(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateInsuranceClaimInput>,
) -> Result<Response, ProblemResponse> {
    const OP: &str = "updateInsuranceClaim";
    let claim = state
        .service()
        .update_insurance_claim(id, input)
        .await
        .map_err(|err| problem_from(OP, err))?
        .ok_or_else(|| absent(OP, "claim", id))?;
    info!(stage = "api", op = OP, id, "claim updated");
    track(OP, "ok");
    Ok(Json(claim).into_response())
}

pub async fn claims_by_policy_holder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ProblemResponse> {
    const OP: &str = "getClaimsByPolicyHolder";
    let claims = state
        .service()
        .get_claims_by_policy_holder(id)
        .await
        .map_err(|err| problem_from(OP, err))?;
    track(OP, "ok");
    Ok(Json(claims).into_response())
}

fn track(op: &'static str, result: &'static str) {
    counter!("api_requests_total", "op" => op, "result" => result).increment(1);
}

/// A read or update targeting an id that does not exist. The service reports
/// this as an absent value rather than an error; over HTTP it becomes 404.
fn absent(op: &'static str, entity: &'static str, id: i64) -> ProblemResponse {
    track(op, "not_found");
    ProblemResponse::new(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("{entity} {id} not found"),
    )
}

fn problem_from(op: &'static str, err: OperationError) -> ProblemResponse {
    match err {
        OperationError::Validation(err) => {
            track(op, "validation_error");
            let detail = err.to_string();
            ProblemResponse::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", detail)
                .with_errors(err.into_errors())
        }
        OperationError::NotFound { entity, id } => {
            track(op, "not_found");
            ProblemResponse::new(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{entity} {id} not found"),
            )
        }
        err @ OperationError::DuplicateKey { .. } => {
            track(op, "duplicate_key");
            ProblemResponse::new(StatusCode::CONFLICT, "duplicate_key", err.to_string())
        }
        err @ OperationError::ForeignKeyViolation { .. } => {
            track(op, "foreign_key_violation");
            ProblemResponse::new(
                StatusCode::CONFLICT,
                "foreign_key_violation",
                err.to_string(),
            )
        }
        OperationError::Storage(err) => {
            track(op, "storage_error");
            error!(stage = "api", op, error = %err, "storage failure");
            ProblemResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "the operation could not be completed",
            )
        }
    }
}
