//! HTTP API
//!
//! JSON endpoints over a shared [`ForecastService`]:
//! - `POST /api/price-projection`
//! - `POST /api/evaluate`
//! - `GET  /api/historical?ticker=&period=`
//! - `POST /api/compound-growth`
//! - `GET  /api/models`
//! - `GET  /health`
//!
//! Failures are answered with `{kind, message}` and a status derived from
//! the error kind. Malformed bodies and query strings included.


use crate::calculator::{GrowthRequest, GrowthResult};
use crate::data::DataSource;
use crate::error::{ForecastError, Result};
use crate::models::MODEL_TABLE;
use crate::service::{
    EvaluationRequest, EvaluationResponse, ForecastService, ProjectionRequest, ProjectionResponse,
};
use crate::types::HistoricalSeries;
use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// HTTP status for an error kind
pub fn status_code(err: &ForecastError) -> StatusCode {
    match err {
        ForecastError::InvalidModel(_)
        | ForecastError::InvalidHorizon(_)
        | ForecastError::InvalidFrequency(_)
        | ForecastError::InvalidFeature(_)
        | ForecastError::InvalidLookback(_)
        | ForecastError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ForecastError::InsufficientData { .. } | ForecastError::EmptyPartition { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ForecastError::DataUnavailable { .. } => StatusCode::NOT_FOUND,
        ForecastError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ForecastError {
    fn into_response(self) -> Response {
        (status_code(&self), Json(self.payload())).into_response()
    }
}

/// `Json` body whose rejection is an `InvalidInput` error
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ForecastError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ForecastError::InvalidInput(rejection.body_text())),
        }
    }
}

/// `Query` string whose rejection is an `InvalidInput` error
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = axum::extract::rejection::QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ForecastError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ForecastError::InvalidInput(rejection.body_text())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoricalQuery {
    pub ticker: String,
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "1y".to_string()
}

#[derive(Debug, Serialize)]
struct ModelEntry {
    id: &'static str,
    label: &'static str,
    linear: bool,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
}

// ============ HTTP API Handlers ============

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

async fn list_models() -> Json<Vec<ModelEntry>> {
    Json(
        MODEL_TABLE
            .iter()
            .map(|spec| ModelEntry {
                id: spec.id,
                label: spec.label,
                linear: spec.kind.is_linear(),
            })
            .collect(),
    )
}

async fn price_projection<D: DataSource>(
    State(service): State<Arc<ForecastService<D>>>,
    ApiJson(request): ApiJson<ProjectionRequest>,
) -> Result<Json<ProjectionResponse>> {
    Ok(Json(service.project(request).await?))
}

async fn evaluate<D: DataSource>(
    State(service): State<Arc<ForecastService<D>>>,
    ApiJson(request): ApiJson<EvaluationRequest>,
) -> Result<Json<EvaluationResponse>> {
    Ok(Json(service.evaluate(request).await?))
}

async fn historical<D: DataSource>(
    State(service): State<Arc<ForecastService<D>>>,
    ApiQuery(query): ApiQuery<HistoricalQuery>,
) -> Result<Json<HistoricalSeries>> {
    Ok(Json(service.historical(&query.ticker, &query.period).await?))
}

async fn compound_growth<D: DataSource>(
    State(service): State<Arc<ForecastService<D>>>,
    ApiJson(request): ApiJson<GrowthRequest>,
) -> Result<Json<GrowthResult>> {
    Ok(Json(service.compound_growth(&request)?))
}

/// Create the API router
pub fn create_router<D: DataSource + 'static>(service: Arc<ForecastService<D>>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        .route("/api/price-projection", post(price_projection::<D>))
        .route("/api/evaluate", post(evaluate::<D>))
        .route("/api/historical", get(historical::<D>))
        .route("/api/compound-growth", post(compound_growth::<D>))
        .with_state(service)
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve<D: DataSource + 'static>(
    service: Arc<ForecastService<D>>,
    addr: &str,
) -> anyhow::Result<()> {
    let app = create_router(service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
