//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::batch::{PipelineEvent, PipelineReporter};
use crate::error::AppError;
use crate::models::{
    AggregatedRecord, AppLinks, AppListing, CompanyEnrichment, Discovery, Locator, SocialLinks,
    Source,
};
use crate::traits::{Discoverer, Fetcher, ItemProcessor, ResultSink, SourceFetcher};

pub fn locator(raw: &str) -> Locator {
    Locator::parse(raw).unwrap()
}

pub fn sample_listing(source: Source) -> AppListing {
    let link = match source {
        Source::GooglePlay => "https://play.google.com/store/apps/details?id=com.example.app",
        _ => "https://apps.apple.com/us/app/example/id123456789",
    };
    AppListing {
        app_name: Some("Example App".into()),
        developer_name: Some("Example Inc.".into()),
        last_updated: Some("2024-03-01".into()),
        ..AppListing::new(source, link)
    }
}

pub fn sample_enrichment() -> CompanyEnrichment {
    CompanyEnrichment::from_website(
        SocialLinks {
            linkedin: Some("https://www.linkedin.com/company/example".into()),
            twitter: None,
            facebook: None,
        },
        Some("50".into()),
    )
}

pub fn discovery_with_both_apps() -> Discovery {
    Discovery {
        company_name: Some("Example".into()),
        app_links: AppLinks {
            google_play: Some(locator(
                "https://play.google.com/store/apps/details?id=com.example.app",
            )),
            app_store: Some(locator("https://apps.apple.com/us/app/example/id123456789")),
        },
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock transport serving canned documents keyed by exact URL.
///
/// Unknown URLs get an HTTP 404 error. Every requested URL is recorded.
#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: Arc<Mutex<HashMap<String, Result<String, String>>>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.to_string()));
        self
    }

    /// Requests for `url` fail with a network error carrying `message`.
    pub fn with_error(self, url: &str, message: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.pages.lock().unwrap().get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(message)) => Err(AppError::NetworkError(message.clone())),
            None => Err(AppError::HttpError(format!("HTTP 404 for {url}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// MockDiscoverer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockDiscoverer {
    result: Arc<Mutex<Result<Discovery, String>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockDiscoverer {
    pub fn new(discovery: Discovery) -> Self {
        Self {
            result: Arc::new(Mutex::new(Ok(discovery))),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing(error: AppError) -> Self {
        Self {
            result: Arc::new(Mutex::new(Err(error.to_string()))),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Discoverer for MockDiscoverer {
    async fn discover(&self, _locator: &Locator) -> Result<Discovery, AppError> {
        *self.calls.lock().unwrap() += 1;
        self.result
            .lock()
            .unwrap()
            .clone()
            .map_err(AppError::NetworkError)
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Mock provider that returns a fixed outcome and records every locator.
#[derive(Clone)]
pub struct MockSource<P> {
    source: Source,
    outcome: Arc<Mutex<Result<Option<P>, String>>>,
    calls: Arc<Mutex<Vec<Locator>>>,
}

impl<P: Clone + Send> MockSource<P> {
    pub fn found(source: Source, profile: P) -> Self {
        Self::with_outcome(source, Ok(Some(profile)))
    }

    pub fn empty(source: Source) -> Self {
        Self::with_outcome(source, Ok(None))
    }

    pub fn failing(source: Source, error: AppError) -> Self {
        Self::with_outcome(source, Err(error.to_string()))
    }

    fn with_outcome(source: Source, outcome: Result<Option<P>, String>) -> Self {
        Self {
            source,
            outcome: Arc::new(Mutex::new(outcome)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Locator> {
        self.calls.lock().unwrap().clone()
    }
}

impl<P: Clone + Send + 'static> SourceFetcher for MockSource<P> {
    type Profile = P;

    fn source(&self) -> Source {
        self.source
    }

    async fn lookup(&self, locator: &Locator) -> Result<Option<P>, AppError> {
        self.calls.lock().unwrap().push(locator.clone());
        self.outcome
            .lock()
            .unwrap()
            .clone()
            .map_err(AppError::Generic)
    }
}

// ---------------------------------------------------------------------------
// MockProcessor
// ---------------------------------------------------------------------------

/// Item processor with per-host latency, failure, and panic injection.
#[derive(Clone, Default)]
pub struct MockProcessor {
    latency: Arc<Mutex<HashMap<String, Duration>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    panicking: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(self, host: &str, latency: Duration) -> Self {
        self.latency
            .lock()
            .unwrap()
            .insert(host.to_string(), latency);
        self
    }

    pub fn failing_for(self, host: &str) -> Self {
        self.failing.lock().unwrap().insert(host.to_string());
        self
    }

    pub fn panicking_for(self, host: &str) -> Self {
        self.panicking.lock().unwrap().insert(host.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ItemProcessor for MockProcessor {
    async fn process(&self, locator: &Locator) -> AggregatedRecord {
        *self.calls.lock().unwrap() += 1;
        let host = locator.host().to_string();

        let latency = self.latency.lock().unwrap().get(&host).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.panicking.lock().unwrap().contains(&host) {
            panic!("simulated aggregator bug for {host}");
        }
        if self.failing.lock().unwrap().contains(&host) {
            return AggregatedRecord::failed(locator.clone(), "simulated discovery failure");
        }

        AggregatedRecord::assemble(
            locator.clone(),
            Some(host),
            None,
            None,
            Some(sample_enrichment()),
        )
    }
}

// ---------------------------------------------------------------------------
// Sinks and reporters
// ---------------------------------------------------------------------------

/// Sink that rejects every batch.
#[derive(Debug, Default)]
pub struct FailingSink {
    pub attempts: usize,
}

impl ResultSink for FailingSink {
    fn append(&mut self, _records: &[AggregatedRecord]) -> Result<(), AppError> {
        self.attempts += 1;
        Err(AppError::SinkError("disk full".into()))
    }
}

/// Reporter that keeps a textual log of every event.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    fn matching(&self, prefix: &str) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    pub fn pauses(&self) -> usize {
        self.matching("pause:").len()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.matching("batch:")
            .iter()
            .map(|s| s.parse().unwrap())
            .collect()
    }

    pub fn failed_items(&self) -> Vec<String> {
        self.matching("failed:")
    }
}

impl PipelineReporter for RecordingReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        let line = match event {
            PipelineEvent::RunStarted { total, batches } => format!("run:{total}/{batches}"),
            PipelineEvent::BatchStarted { size, .. } => format!("batch:{size}"),
            PipelineEvent::ItemFailed { url, .. } => format!("failed:{url}"),
            PipelineEvent::BatchCompleted { records, .. } => format!("done:{records}"),
            PipelineEvent::SinkFailed { error, .. } => format!("sink:{error}"),
            PipelineEvent::Pausing { delay } => format!("pause:{}", delay.as_millis()),
            PipelineEvent::RunFinished { records, .. } => format!("finished:{records}"),
        };
        self.events.lock().unwrap().push(line);
    }
}
