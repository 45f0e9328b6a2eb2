use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, StatusCode, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;

use presence_core::error::AppError;

use crate::error::ApiError;

pub const DEFAULT_MAX_REQUESTS: u32 = 100;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-client-IP request quota for the whole API.
///
/// A client may spend the full quota at once; it then regains one request
/// every `window / max_requests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
        }
    }
}

impl RateLimit {
    /// Read the quota from environment variables.
    ///
    /// - `PRESENCE_RATE_LIMIT` (optional, defaults to 100; `0` disables limiting)
    /// - `PRESENCE_RATE_LIMIT_WINDOW_SECS` (optional, defaults to 900)
    pub fn from_env() -> Result<Option<Self>, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, AppError> {
        let defaults = Self::default();

        let max_requests = match lookup("PRESENCE_RATE_LIMIT") {
            None => defaults.max_requests,
            Some(raw) => parse_number("PRESENCE_RATE_LIMIT", &raw)?,
        };
        if max_requests == 0 {
            return Ok(None);
        }

        let window = match lookup("PRESENCE_RATE_LIMIT_WINDOW_SECS") {
            None => defaults.window,
            Some(raw) => {
                let secs = parse_number("PRESENCE_RATE_LIMIT_WINDOW_SECS", &raw)?;
                Duration::from_secs(secs.into())
            }
        };

        let limit = Self {
            max_requests,
            window,
        };
        limit.validate()?;
        Ok(Some(limit))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_requests == 0 || self.window.is_zero() {
            return Err(AppError::ConfigError(format!(
                "Invalid rate limit: {} requests per {}s",
                self.max_requests,
                self.window.as_secs()
            )));
        }
        Ok(())
    }

    /// Wrap `router` so each client IP gets the quota; excess requests get a
    /// JSON 429.
    ///
    /// Clients are keyed by peer address, so the app must be served with
    /// `into_make_service_with_connect_info::<SocketAddr>()`.
    pub fn apply(&self, router: Router) -> Result<Router, AppError> {
        self.validate()?;

        let config = GovernorConfigBuilder::default()
            .period(self.window / self.max_requests)
            .burst_size(self.max_requests)
            .finish()
            .ok_or_else(|| {
                AppError::ConfigError(format!(
                    "Rate limit {} requests per {}s is too fine-grained",
                    self.max_requests,
                    self.window.as_secs()
                ))
            })?;

        Ok(router
            .layer(GovernorLayer::new(config))
            .layer(middleware::map_response(json_rate_limit_body)))
    }
}

/// Replace the limiter's plain-text 429 with the API error body, keeping its
/// wait hints.
async fn json_rate_limit_body(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let mut json = ApiError::rate_limited().into_response();
    for name in [header::RETRY_AFTER, HeaderName::from_static("x-ratelimit-after")] {
        if let Some(value) = response.headers().get(&name) {
            json.headers_mut().insert(name, value.clone());
        }
    }
    json
}

fn parse_number(key: &str, raw: &str) -> Result<u32, AppError> {
    raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid {key} '{raw}': must be a non-negative integer"
        ))
    })
}
