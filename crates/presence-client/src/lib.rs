pub mod app_store;
#[cfg(feature = "browser")]
pub mod browser_fetcher;
pub mod enrichment;
pub mod fetcher;
pub mod google_play;
mod html;
pub mod site;

pub use app_store::AppStoreFetcher;
#[cfg(feature = "browser")]
pub use browser_fetcher::BrowserFetcher;
pub use enrichment::EnrichmentFetcher;
pub use fetcher::ReqwestFetcher;
pub use google_play::GooglePlayFetcher;
pub use site::SiteDiscoverer;

use presence_core::ItemAggregator;
use presence_core::traits::Fetcher;

/// The production aggregator: site discovery plus the three web sources, all
/// sharing one transport.
pub type WebAggregator<F> =
    ItemAggregator<SiteDiscoverer<F>, AppStoreFetcher<F>, GooglePlayFetcher<F>, EnrichmentFetcher<F>>;

pub fn web_aggregator<F: Fetcher>(fetcher: F) -> WebAggregator<F> {
    ItemAggregator::new(
        SiteDiscoverer::new(fetcher.clone()),
        AppStoreFetcher::new(fetcher.clone()),
        GooglePlayFetcher::new(fetcher.clone()),
        EnrichmentFetcher::new(fetcher),
    )
}
