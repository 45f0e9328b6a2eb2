pub mod aggregate;
pub mod batch;
pub mod config;
pub mod error;
pub mod models;
pub mod traits;
pub mod validate;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use aggregate::ItemAggregator;
pub use batch::{BatchScheduler, PipelineEvent, PipelineReporter, RunSummary, TracingReporter};
pub use config::PipelineConfig;
pub use error::AppError;
pub use models::{
    AggregatedRecord, AppLinks, AppListing, CompanyEnrichment, Discovery, FetchPlan, Locator,
    RecordStatus, SocialLinks, Source,
};
pub use traits::{Discoverer, Fetcher, ItemProcessor, MemorySink, ResultSink, SourceFetcher};
pub use validate::validate_locators;
