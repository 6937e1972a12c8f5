use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::access::KeyError;
use super::domain::IntervenantId;
use super::evaluation::WorkweekRequirements;
use super::repository::{
    IntervenantRepository, IntervenantSummary, RepositoryError, SearchQuery,
};
use super::service::{AvailabilityService, AvailabilityServiceError};
use super::views::AvailabilityPageView;

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Router builder exposing the key-gated availability page and the intervenant directory.
///
/// Directory routes answer with [`IntervenantSummary`]; access keys are never listed.
pub fn availability_router<R, P>(service: Arc<AvailabilityService<R, P>>) -> Router
where
    R: IntervenantRepository + 'static,
    P: WorkweekRequirements + 'static,
{
    Router::new()
        .route("/api/v1/availability/:key", get(page_handler::<R, P>))
        .route("/api/v1/keys/:key", get(key_check_handler::<R, P>))
        .route("/api/v1/intervenants", get(search_handler::<R, P>))
        .route(
            "/api/v1/intervenants/:intervenant_id",
            get(intervenant_handler::<R, P>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

pub(crate) async fn page_handler<R, P>(
    State(service): State<Arc<AvailabilityService<R, P>>>,
    Path(key): Path<String>,
) -> Response
where
    R: IntervenantRepository + 'static,
    P: WorkweekRequirements + 'static,
{
    let report = match service.report(&key, Utc::now()) {
        Ok(report) => report,
        Err(err) => return service_error_response(err),
    };

    match AvailabilityPageView::from_report(&report) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

pub(crate) async fn key_check_handler<R, P>(
    State(service): State<Arc<AvailabilityService<R, P>>>,
    Path(key): Path<String>,
) -> Response
where
    R: IntervenantRepository + 'static,
    P: WorkweekRequirements + 'static,
{
    match service.check_key(&key, Utc::now()) {
        Ok(check) => (StatusCode::OK, axum::Json(check)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn search_handler<R, P>(
    State(service): State<Arc<AvailabilityService<R, P>>>,
    Query(params): Query<SearchParams>,
) -> Response
where
    R: IntervenantRepository + 'static,
    P: WorkweekRequirements + 'static,
{
    let query = match SearchQuery::new(params.query, params.page, params.limit) {
        Ok(query) => query,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };

    match service.search(&query) {
        Ok(records) => {
            let summaries: Vec<IntervenantSummary> =
                records.iter().map(IntervenantSummary::from).collect();
            (StatusCode::OK, axum::Json(summaries)).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn intervenant_handler<R, P>(
    State(service): State<Arc<AvailabilityService<R, P>>>,
    Path(intervenant_id): Path<String>,
) -> Response
where
    R: IntervenantRepository + 'static,
    P: WorkweekRequirements + 'static,
{
    match service.get(&IntervenantId(intervenant_id)) {
        Ok(record) => {
            (StatusCode::OK, axum::Json(IntervenantSummary::from(&record))).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

fn service_error_response(err: AvailabilityServiceError) -> Response {
    match err {
        AvailabilityServiceError::Key(reason @ KeyError::Unknown) => {
            error_response(StatusCode::NOT_FOUND, reason.message().to_string())
        }
        AvailabilityServiceError::Key(reason @ KeyError::Expired) => {
            error_response(StatusCode::FORBIDDEN, reason.message().to_string())
        }
        AvailabilityServiceError::Repository(RepositoryError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, "intervenant not found".to_string())
        }
        other => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let payload = json!({ "error": message });
    (status, axum::Json(payload)).into_response()
}
