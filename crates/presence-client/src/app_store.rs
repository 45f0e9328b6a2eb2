use presence_core::error::AppError;
use presence_core::models::{AppListing, Locator, Source};
use presence_core::traits::{Fetcher, SourceFetcher};
use serde::Deserialize;
use url::Url;

const DEFAULT_LOOKUP_URL: &str = "https://itunes.apple.com/lookup";

/// Apple App Store listings via the public iTunes lookup API.
#[derive(Clone)]
pub struct AppStoreFetcher<F: Fetcher> {
    fetcher: F,
    lookup_url: String,
}

impl<F: Fetcher> AppStoreFetcher<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
        }
    }

    /// Point lookups at a different endpoint (mirrors, tests).
    pub fn with_lookup_url(mut self, lookup_url: impl Into<String>) -> Self {
        self.lookup_url = lookup_url.into();
        self
    }
}

/// The numeric App Store id, if `locator` is an App Store listing.
///
/// The id is a whole path segment, e.g. `/us/app/example/id284882215`; digits
/// inside the app slug never count.
pub fn app_store_id(locator: &Locator) -> Option<String> {
    if !locator.host().contains("apps.apple.com") {
        return None;
    }
    locator
        .url()
        .path_segments()?
        .filter_map(|segment| segment.strip_prefix("id"))
        .find(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}

// ---- iTunes lookup API types ----

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    results: Vec<LookupApp>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupApp {
    track_name: Option<String>,
    artist_name: Option<String>,
    seller_name: Option<String>,
    seller_url: Option<String>,
    current_version_release_date: Option<String>,
}

impl<F: Fetcher> SourceFetcher for AppStoreFetcher<F> {
    type Profile = AppListing;

    fn source(&self) -> Source {
        Source::AppStore
    }

    async fn lookup(&self, locator: &Locator) -> Result<Option<AppListing>, AppError> {
        let Some(id) = app_store_id(locator) else {
            return Ok(None);
        };

        let url = Url::parse_with_params(&self.lookup_url, &[("id", id.as_str())])
            .map_err(|e| AppError::Generic(format!("Invalid lookup URL: {e}")))?;
        let body = self.fetcher.fetch(url.as_str()).await?;
        parse_lookup(&body, locator, &id).map(Some)
    }
}

fn parse_lookup(body: &str, locator: &Locator, id: &str) -> Result<AppListing, AppError> {
    let response: LookupResponse = serde_json::from_str(body)?;
    let app = response.results.into_iter().next().ok_or_else(|| {
        AppError::ParseError(format!("App Store lookup returned no results for id {id}"))
    })?;

    Ok(AppListing {
        app_name: app.track_name,
        developer_name: app.artist_name.or(app.seller_name),
        developer_website: app.seller_url,
        last_updated: app.current_version_release_date,
        ..AppListing::new(Source::AppStore, locator.as_str())
    })
}
