use std::future::Future;

use crate::error::AppError;
use crate::models::{AggregatedRecord, Discovery, Locator, Source};

/// Fetches a raw document (HTML page or JSON payload) from a URL.
///
/// The transport owns its own timeout and any heavyweight resource it needs.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Queries the company site for its name and any linked app listings.
///
/// Errors propagate: without the base page there is nothing to plan from.
pub trait Discoverer: Send + Sync + Clone {
    fn discover(
        &self,
        locator: &Locator,
    ) -> impl Future<Output = Result<Discovery, AppError>> + Send;
}

/// One data provider feeding a profile fragment into the aggregated record.
///
/// Implementors write the fallible [`lookup`](Self::lookup); callers use
/// [`fetch`](Self::fetch), which never fails.
pub trait SourceFetcher: Send + Sync + Clone {
    type Profile: Send;

    fn source(&self) -> Source;

    /// Look the locator up.
    ///
    /// Returns `Ok(None)` without touching the network when the locator does
    /// not have the shape this source understands.
    fn lookup(
        &self,
        locator: &Locator,
    ) -> impl Future<Output = Result<Option<Self::Profile>, AppError>> + Send;

    /// Failure-isolated fetch: any error is logged and reported as absent.
    fn fetch(&self, locator: &Locator) -> impl Future<Output = Option<Self::Profile>> + Send {
        async move {
            match self.lookup(locator).await {
                Ok(Some(profile)) => {
                    tracing::debug!(source = %self.source(), url = %locator, "Source returned a profile");
                    Some(profile)
                }
                Ok(None) => {
                    tracing::debug!(source = %self.source(), url = %locator, "Source had nothing for locator");
                    None
                }
                Err(e) => {
                    tracing::warn!(
                        source = %self.source(),
                        url = %locator,
                        error = %e,
                        transient = e.is_transient(),
                        "Source fetch failed"
                    );
                    None
                }
            }
        }
    }
}

/// Turns one input into one record. Must not fail: errors become a failed record.
pub trait ItemProcessor: Send + Sync {
    fn process(&self, locator: &Locator) -> impl Future<Output = AggregatedRecord> + Send;
}

/// Receives each completed batch, in order, exactly once.
///
/// Implementations accumulate across calls.
pub trait ResultSink: Send {
    fn append(&mut self, records: &[AggregatedRecord]) -> Result<(), AppError>;
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn append(&mut self, records: &[AggregatedRecord]) -> Result<(), AppError> {
        (**self).append(records)
    }
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn append(&mut self, records: &[AggregatedRecord]) -> Result<(), AppError> {
        (**self).append(records)
    }
}

/// Keeps every appended record in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub batches: Vec<Vec<AggregatedRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records across batches, in append order.
    pub fn into_records(self) -> Vec<AggregatedRecord> {
        self.batches.into_iter().flatten().collect()
    }
}

impl ResultSink for MemorySink {
    fn append(&mut self, records: &[AggregatedRecord]) -> Result<(), AppError> {
        self.batches.push(records.to_vec());
        Ok(())
    }
}
