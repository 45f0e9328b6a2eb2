use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_BATCH_SIZE: usize = 3;
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Tuning knobs for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Items per batch; also the concurrency limit.
    pub batch_size: usize,
    /// Pause between consecutive batches (not after the last one).
    pub inter_batch_delay: Duration,
    /// Per-request timeout handed to each fetcher's transport.
    pub fetch_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    /// Read configuration from environment variables.
    ///
    /// - `PRESENCE_BATCH_SIZE` (optional, defaults to 3)
    /// - `PRESENCE_BATCH_DELAY_MS` (optional, defaults to 2000)
    /// - `PRESENCE_FETCH_TIMEOUT_MS` (optional, defaults to 30000)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let batch_size = match lookup("PRESENCE_BATCH_SIZE") {
            None => defaults.batch_size,
            Some(raw) => parse_number("PRESENCE_BATCH_SIZE", &raw)? as usize,
        };
        let inter_batch_delay = match lookup("PRESENCE_BATCH_DELAY_MS") {
            None => defaults.inter_batch_delay,
            Some(raw) => Duration::from_millis(parse_number("PRESENCE_BATCH_DELAY_MS", &raw)?),
        };
        let fetch_timeout = match lookup("PRESENCE_FETCH_TIMEOUT_MS") {
            None => defaults.fetch_timeout,
            Some(raw) => Duration::from_millis(parse_number("PRESENCE_FETCH_TIMEOUT_MS", &raw)?),
        };

        let config = Self {
            batch_size,
            inter_batch_delay,
            fetch_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.batch_size == 0 {
            return Err(AppError::ConfigError("batch size must be at least 1".into()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "fetch timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid {key} '{raw}': must be a non-negative integer"
        ))
    })
}
