use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use presence_core::TracingReporter;
use presence_core::error::AppError;
use presence_core::models::Locator;
use presence_core::traits::MemorySink;
use presence_core::validate::parse_all;

use crate::dto::{HealthResponse, MAX_LOCATORS_PER_REQUEST, ResolveRequest, ResolveResponse};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Request bodies above this size are rejected with 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the full router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/resolve", post(resolve))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/resolve",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "One record per locator, in order", body = ResolveResponse),
        (status = 400, description = "Malformed body or invalid locators", body = crate::dto::ErrorResponse),
        (status = 413, description = "Body larger than 1 MiB", body = crate::dto::ErrorResponse),
        (status = 429, description = "Per-IP request quota exhausted", body = crate::dto::ErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::dto::ErrorResponse),
    ),
    tag = "resolve"
)]
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    payload: Result<axum::Json<ResolveRequest>, JsonRejection>,
) -> Result<axum::Json<ResolveResponse>, ApiError> {
    let axum::Json(body) = payload?;
    let locators = validate_request(&body.locators)?;

    tracing::info!(count = locators.len(), "Resolving locators");

    let mut sink = MemorySink::new();
    state
        .scheduler
        .run(&locators, &mut sink, &TracingReporter)
        .await?;

    Ok(axum::Json(ResolveResponse::new(sink.into_records())))
}

/// Strict request validation: every entry must parse.
fn validate_request(raw: &[String]) -> Result<Vec<Locator>, ApiError> {
    if raw.is_empty() {
        return Err(AppError::InvalidInput("Please provide at least one URL".into()).into());
    }
    if raw.len() > MAX_LOCATORS_PER_REQUEST {
        return Err(AppError::InvalidInput(format!(
            "Maximum {MAX_LOCATORS_PER_REQUEST} URLs allowed per request"
        ))
        .into());
    }

    parse_all(raw).map_err(|invalid| {
        ApiError::from(AppError::InvalidInput(format!(
            "The following URLs are invalid: {}",
            invalid.join(", ")
        )))
        .with_details(invalid)
    })
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accepts_one_to_ten_entries() {
        assert_eq!(validate_request(&strings(&["example.com"])).unwrap().len(), 1);

        let ten: Vec<String> = (0..10).map(|i| format!("site{i}.com")).collect();
        assert_eq!(validate_request(&ten).unwrap().len(), 10);
    }

    #[test]
    fn rejects_empty_and_oversized_lists() {
        assert_eq!(
            validate_request(&[]).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );

        let eleven: Vec<String> = (0..11).map(|i| format!("site{i}.com")).collect();
        assert_eq!(
            validate_request(&eleven).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn one_bad_entry_rejects_the_request() {
        let err = validate_request(&strings(&["example.com", "not a url", "ftp://x.com"]))
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
