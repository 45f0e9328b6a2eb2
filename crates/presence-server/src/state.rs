use std::time::Instant;

use presence_client::{ReqwestFetcher, WebAggregator};
use presence_core::error::AppError;
use presence_core::{BatchScheduler, PipelineConfig};

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub scheduler: BatchScheduler<WebAggregator<ReqwestFetcher>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        aggregator: WebAggregator<ReqwestFetcher>,
        config: PipelineConfig,
    ) -> Result<Self, AppError> {
        Ok(Self {
            scheduler: BatchScheduler::new(aggregator, config)?,
            started_at: Instant::now(),
        })
    }
}
