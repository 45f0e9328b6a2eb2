use crate::models::{AggregatedRecord, AppListing, CompanyEnrichment, FetchPlan, Locator};
use crate::traits::{Discoverer, ItemProcessor, SourceFetcher};

/// Resolves one input end-to-end: discovery, then the planned fan-out.
///
/// Generic over every provider via traits so the orchestration can be tested
/// without any network access.
#[derive(Clone)]
pub struct ItemAggregator<D, A, G, E>
where
    D: Discoverer,
    A: SourceFetcher<Profile = AppListing>,
    G: SourceFetcher<Profile = AppListing>,
    E: SourceFetcher<Profile = CompanyEnrichment>,
{
    discoverer: D,
    app_store: A,
    google_play: G,
    enrichment: E,
}

impl<D, A, G, E> ItemAggregator<D, A, G, E>
where
    D: Discoverer,
    A: SourceFetcher<Profile = AppListing>,
    G: SourceFetcher<Profile = AppListing>,
    E: SourceFetcher<Profile = CompanyEnrichment>,
{
    pub fn new(discoverer: D, app_store: A, google_play: G, enrichment: E) -> Self {
        Self {
            discoverer,
            app_store,
            google_play,
            enrichment,
        }
    }

    /// Run the full pipeline for one input.
    ///
    /// 1. Discover the company name and app links (failure ends the item)
    /// 2. App Store listing, if linked
    /// 3. Google Play listing, if linked
    /// 4. Enrichment against the input itself, always
    ///
    /// Steps 2–4 run concurrently.
    pub async fn process(&self, locator: &Locator) -> AggregatedRecord {
        tracing::info!(url = %locator, "Discovering");
        let discovery = match self.discoverer.discover(locator).await {
            Ok(discovery) => discovery,
            Err(e) => {
                tracing::warn!(url = %locator, error = %e, "Discovery failed");
                return AggregatedRecord::failed(locator.clone(), e.to_string());
            }
        };

        let plan = FetchPlan::new(locator, &discovery);
        tracing::info!(
            url = %locator,
            company = ?discovery.company_name,
            app_store = plan.app_store.is_some(),
            google_play = plan.google_play.is_some(),
            "Discovery complete"
        );

        self.execute(&plan, discovery.company_name).await
    }

    /// Run the fetchers named by `plan` and assemble the record.
    pub async fn execute(&self, plan: &FetchPlan, company: Option<String>) -> AggregatedRecord {
        let app_store = async {
            match &plan.app_store {
                Some(link) => self.app_store.fetch(link).await,
                None => None,
            }
        };
        let google_play = async {
            match &plan.google_play {
                Some(link) => self.google_play.fetch(link).await,
                None => None,
            }
        };
        let enrichment = self.enrichment.fetch(&plan.enrichment);

        let (app_store_data, google_play_data, fallback_data) =
            tokio::join!(app_store, google_play, enrichment);

        AggregatedRecord::assemble(
            plan.enrichment.clone(),
            company,
            google_play_data,
            app_store_data,
            fallback_data,
        )
    }
}

impl<D, A, G, E> ItemProcessor for ItemAggregator<D, A, G, E>
where
    D: Discoverer,
    A: SourceFetcher<Profile = AppListing>,
    G: SourceFetcher<Profile = AppListing>,
    E: SourceFetcher<Profile = CompanyEnrichment>,
{
    async fn process(&self, locator: &Locator) -> AggregatedRecord {
        ItemAggregator::process(self, locator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{Discovery, RecordStatus, Source};
    use crate::testutil::*;

    fn aggregator(
        discoverer: MockDiscoverer,
        app_store: MockSource<AppListing>,
        google_play: MockSource<AppListing>,
        enrichment: MockSource<CompanyEnrichment>,
    ) -> ItemAggregator<
        MockDiscoverer,
        MockSource<AppListing>,
        MockSource<AppListing>,
        MockSource<CompanyEnrichment>,
    > {
        ItemAggregator::new(discoverer, app_store, google_play, enrichment)
    }

    #[tokio::test]
    async fn no_app_links_yields_enrichment_only() {
        let enrichment = MockSource::found(Source::Website, sample_enrichment());
        let app_store = MockSource::found(Source::AppStore, sample_listing(Source::AppStore));
        let google_play =
            MockSource::found(Source::GooglePlay, sample_listing(Source::GooglePlay));
        let agg = aggregator(
            MockDiscoverer::new(Discovery {
                company_name: Some("Example".into()),
                ..Default::default()
            }),
            app_store.clone(),
            google_play.clone(),
            enrichment.clone(),
        );

        let record = agg.process(&locator("example.com")).await;

        assert_eq!(record.company.as_deref(), Some("Example"));
        assert!(!record.app_present);
        assert!(record.google_play_data.is_none());
        assert!(record.app_store_data.is_none());
        assert_eq!(record.fallback_data, Some(sample_enrichment()));
        assert_eq!(record.status, RecordStatus::Ok);
        assert_eq!(app_store.call_count(), 0);
        assert_eq!(google_play.call_count(), 0);
        assert_eq!(enrichment.call_count(), 1);
    }

    #[tokio::test]
    async fn both_app_listings_found() {
        let agg = aggregator(
            MockDiscoverer::new(discovery_with_both_apps()),
            MockSource::found(Source::AppStore, sample_listing(Source::AppStore)),
            MockSource::found(Source::GooglePlay, sample_listing(Source::GooglePlay)),
            MockSource::found(Source::Website, sample_enrichment()),
        );

        let record = agg.process(&locator("example.com")).await;

        assert!(record.app_present);
        assert_eq!(
            record.app_store_data.map(|l| l.source),
            Some(Source::AppStore)
        );
        assert_eq!(
            record.google_play_data.map(|l| l.source),
            Some(Source::GooglePlay)
        );
        assert!(record.fallback_data.is_some());
    }

    #[tokio::test]
    async fn app_fetch_failures_leave_app_present_false() {
        let enrichment = MockSource::found(Source::Website, sample_enrichment());
        let agg = aggregator(
            MockDiscoverer::new(discovery_with_both_apps()),
            MockSource::failing(Source::AppStore, AppError::Timeout(30)),
            MockSource::failing(Source::GooglePlay, AppError::HttpError("HTTP 404".into())),
            enrichment.clone(),
        );

        let record = agg.process(&locator("example.com")).await;

        assert!(!record.app_present);
        assert_eq!(record.company.as_deref(), Some("Example"));
        assert!(!record.is_failed());
        assert!(record.error.is_none());
        assert!(record.fallback_data.is_some());
        assert_eq!(enrichment.call_count(), 1);
    }

    #[tokio::test]
    async fn one_app_listing_is_enough_for_app_present() {
        let agg = aggregator(
            MockDiscoverer::new(discovery_with_both_apps()),
            MockSource::failing(Source::AppStore, AppError::Timeout(30)),
            MockSource::found(Source::GooglePlay, sample_listing(Source::GooglePlay)),
            MockSource::empty(Source::Website),
        );

        let record = agg.process(&locator("example.com")).await;

        assert!(record.app_present);
        assert!(record.app_store_data.is_none());
        assert!(record.google_play_data.is_some());
        assert!(record.fallback_data.is_none());
    }

    #[tokio::test]
    async fn discovery_failure_is_terminal_and_skips_every_fetch() {
        let app_store = MockSource::found(Source::AppStore, sample_listing(Source::AppStore));
        let google_play =
            MockSource::found(Source::GooglePlay, sample_listing(Source::GooglePlay));
        let enrichment = MockSource::found(Source::Website, sample_enrichment());
        let agg = aggregator(
            MockDiscoverer::failing(AppError::NetworkError("connection refused".into())),
            app_store.clone(),
            google_play.clone(),
            enrichment.clone(),
        );

        let record = agg.process(&locator("example.com")).await;

        assert!(record.is_failed());
        assert!(record.error.as_deref().unwrap().contains("connection refused"));
        assert!(!record.app_present);
        assert!(record.company.is_none());
        assert!(record.google_play_data.is_none());
        assert!(record.app_store_data.is_none());
        assert!(record.fallback_data.is_none());
        assert_eq!(app_store.call_count(), 0);
        assert_eq!(google_play.call_count(), 0);
        assert_eq!(enrichment.call_count(), 0);
    }

    #[tokio::test]
    async fn enrichment_targets_the_input_not_a_discovered_link() {
        let enrichment = MockSource::found(Source::Website, sample_enrichment());
        let agg = aggregator(
            MockDiscoverer::new(discovery_with_both_apps()),
            MockSource::empty(Source::AppStore),
            MockSource::empty(Source::GooglePlay),
            enrichment.clone(),
        );

        let input = locator("example.com/about");
        agg.process(&input).await;

        assert_eq!(enrichment.calls(), vec![input]);
    }

    #[tokio::test]
    async fn execute_runs_plan_without_discovery() {
        let app_store = MockSource::found(Source::AppStore, sample_listing(Source::AppStore));
        let discoverer = MockDiscoverer::failing(AppError::Generic("must not be called".into()));
        let agg = aggregator(
            discoverer.clone(),
            app_store.clone(),
            MockSource::empty(Source::GooglePlay),
            MockSource::empty(Source::Website),
        );

        let mut plan = FetchPlan::enrichment_only(&locator("example.com"));
        plan.app_store = Some(locator("https://apps.apple.com/us/app/example/id123"));
        let record = agg.execute(&plan, Some("Example".into())).await;

        assert!(record.app_present);
        assert_eq!(app_store.call_count(), 1);
        assert_eq!(discoverer.call_count(), 0);
    }
}
