use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use presence_core::models::AggregatedRecord;

/// Upper bound on locators accepted by one resolve call.
pub const MAX_LOCATORS_PER_REQUEST: usize = 10;

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResolveRequest {
    /// Company site URLs, 1 to 10 entries. Bare domains are accepted.
    #[serde(alias = "urls")]
    #[schema(example = json!(["https://example.com"]))]
    pub locators: Vec<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ResolveResponse {
    pub success: bool,
    /// One record per input locator, in request order.
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<AggregatedRecord>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

impl ResolveResponse {
    pub fn new(results: Vec<AggregatedRecord>) -> Self {
        Self {
            success: true,
            count: results.len(),
            results,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    /// Offending inputs, when the request was rejected because of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
}
