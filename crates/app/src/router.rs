use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;

use claims_desk_storage::Database;

use crate::service::ClaimsService;
use crate::{api, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    service: ClaimsService,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database) -> Self {
        let clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync> = Arc::new(Utc::now);
        let service = ClaimsService::new(storage, clock);
        Self { metrics, service }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        self.service = self.service.with_clock(clock);
        self
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn service(&self) -> &ClaimsService {
        &self.service
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route(
            "/api/policy-holders",
            get(api::list_policy_holders).post(api::create_policy_holder),
        )
        .route(
            "/api/policy-holders/:id",
            get(api::get_policy_holder).patch(api::update_policy_holder),
        )
        .route(
            "/api/policy-holders/:id/claims",
            get(api::claims_by_policy_holder),
        )
        .route("/api/claims", get(api::list_claims).post(api::create_claim))
        .route(
            "/api/claims/:id",
            get(api::get_claim).patch(api::update_claim),
        )
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .unwrap()
}
