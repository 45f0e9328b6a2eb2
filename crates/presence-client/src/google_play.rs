use std::sync::LazyLock;

use presence_core::error::AppError;
use presence_core::models::{AppListing, Locator, Source};
use presence_core::traits::{Fetcher, SourceFetcher};
use scraper::{Html, Selector};
use url::Url;

use crate::html::{element_text, first_attr, first_text, visible_text};

const DEFAULT_DETAILS_URL: &str = "https://play.google.com/store/apps/details";
const PLAY_HOST: &str = "play.google.com";
const TITLE_SUFFIX: &str = " - Apps on Google Play";

static APP_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"h1[itemprop="name"], h1"#).expect("title selector"));

static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:title"]"#).expect("og:title selector")
});

static DEVELOPER_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href*="/store/apps/dev"]"#).expect("developer link selector")
});

static MAILTO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href^="mailto:"]"#).expect("mailto selector"));

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));

/// Google Play listings, scraped from the public details page.
#[derive(Clone)]
pub struct GooglePlayFetcher<F: Fetcher> {
    fetcher: F,
    details_url: String,
}

impl<F: Fetcher> GooglePlayFetcher<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            details_url: DEFAULT_DETAILS_URL.to_string(),
        }
    }

    pub fn with_details_url(mut self, details_url: impl Into<String>) -> Self {
        self.details_url = details_url.into();
        self
    }
}

/// The package id, if `locator` is a Google Play listing.
pub fn package_id(locator: &Locator) -> Option<String> {
    if locator.host() != PLAY_HOST {
        return None;
    }
    locator.query_param("id")
}

impl<F: Fetcher> SourceFetcher for GooglePlayFetcher<F> {
    type Profile = AppListing;

    fn source(&self) -> Source {
        Source::GooglePlay
    }

    async fn lookup(&self, locator: &Locator) -> Result<Option<AppListing>, AppError> {
        let Some(id) = package_id(locator) else {
            return Ok(None);
        };

        let url = Url::parse_with_params(&self.details_url, &[("id", id.as_str()), ("hl", "en")])
            .map_err(|e| AppError::Generic(format!("Invalid details URL: {e}")))?;
        let html = self.fetcher.fetch(url.as_str()).await?;
        parse_listing(&html, locator).map(Some)
    }
}

/// Parse a Play Store details page.
///
/// A page without an app title is not a listing and is rejected.
pub fn parse_listing(html: &str, locator: &Locator) -> Result<AppListing, AppError> {
    let doc = Html::parse_document(html);

    let app_name = first_text(&doc, &APP_TITLE).or_else(|| {
        first_attr(&doc, &OG_TITLE, "content")
            .map(|t| t.trim_end_matches(TITLE_SUFFIX).trim().to_string())
            .filter(|t| !t.is_empty())
    });
    let Some(app_name) = app_name else {
        return Err(AppError::ParseError(format!(
            "No app title on Google Play page for {locator}"
        )));
    };

    let lines = visible_text(&doc);

    Ok(AppListing {
        app_name: Some(app_name),
        developer_name: first_text(&doc, &DEVELOPER_LINK),
        developer_email: developer_email(&doc),
        developer_website: developer_website(&doc),
        downloads: downloads(&lines),
        last_updated: value_after(&lines, "Updated on"),
        ..AppListing::new(Source::GooglePlay, locator.as_str())
    })
}

fn developer_email(doc: &Html) -> Option<String> {
    let href = first_attr(doc, &MAILTO, "href")?;
    let address = href.trim_start_matches("mailto:");
    let address = address.split('?').next().unwrap_or_default().trim();
    (!address.is_empty()).then(|| address.to_string())
}

/// Href of the first absolute link labelled "Website" in the developer section.
fn developer_website(doc: &Html) -> Option<String> {
    doc.select(&ANCHOR)
        .filter(|el| element_text(el).starts_with("Website"))
        .filter_map(|el| el.value().attr("href"))
        .find(|href| href.starts_with("http"))
        .map(str::to_string)
}

/// The `<n>+` text node directly followed by a `Downloads` label.
fn downloads(lines: &[&str]) -> Option<String> {
    lines
        .windows(2)
        .find(|pair| pair[0].ends_with('+') && pair[1] == "Downloads")
        .map(|pair| pair[0].to_string())
}

fn value_after(lines: &[&str], label: &str) -> Option<String> {
    lines
        .windows(2)
        .find(|pair| pair[0] == label)
        .map(|pair| pair[1].to_string())
}

#[cfg(test)]
mod tests {
    use presence_core::testutil::{MockFetcher, locator};

    use super::*;

    const LISTING: &str = "https://play.google.com/store/apps/details?id=com.example.app";
    const DETAILS: &str = "https://play.google.com/store/apps/details?id=com.example.app&hl=en";

    const PAGE: &str = r#"<html><head>
        <meta property="og:title" content="Example App - Apps on Google Play">
        <script>window.data = "Updated on";</script>
        </head><body>
        <h1 itemprop="name"><span>Example App</span></h1>
        <a href="/store/apps/developer?id=Example+Inc."><span>Example Inc.</span></a>
        <div><div>4.5</div><div>120K reviews</div></div>
        <div><div>1M+</div><div>Downloads</div></div>
        <section>
          <div>About this app</div>
          <div><div>Updated on</div><div>Mar 1, 2024</div></div>
        </section>
        <section>
          <a href="https://example.com"><div>Website</div><div>example.com</div></a>
          <a href="mailto:support@example.com?subject=Hi"><div>Email</div></a>
        </section>
        </body></html>"#;

    #[test]
    fn package_id_requires_exact_host_and_id() {
        assert_eq!(package_id(&locator(LISTING)).as_deref(), Some("com.example.app"));
        assert_eq!(
            package_id(&locator("https://play.google.com/store/apps/details")),
            None
        );
        assert_eq!(
            package_id(&locator("https://play.google.com/store/apps/details?id=")),
            None
        );
        assert_eq!(
            package_id(&locator("https://notplay.google.com/store/apps/details?id=x")),
            None
        );
        assert_eq!(package_id(&locator("https://example.com/?id=x")), None);
    }

    #[test]
    fn parses_listing_fields() {
        let listing = parse_listing(PAGE, &locator(LISTING)).unwrap();

        assert_eq!(listing.source, Source::GooglePlay);
        assert_eq!(listing.link, LISTING);
        assert_eq!(listing.app_name.as_deref(), Some("Example App"));
        assert_eq!(listing.developer_name.as_deref(), Some("Example Inc."));
        assert_eq!(listing.developer_email.as_deref(), Some("support@example.com"));
        assert_eq!(listing.developer_website.as_deref(), Some("https://example.com"));
        assert_eq!(listing.downloads.as_deref(), Some("1M+"));
        assert_eq!(listing.last_updated.as_deref(), Some("Mar 1, 2024"));
    }

    #[test]
    fn og_title_is_a_fallback_for_the_name() {
        let html = r#"<html><head>
            <meta property="og:title" content="Example App - Apps on Google Play">
            </head><body></body></html>"#;
        let listing = parse_listing(html, &locator(LISTING)).unwrap();

        assert_eq!(listing.app_name.as_deref(), Some("Example App"));
        assert_eq!(listing.downloads, None);
        assert_eq!(listing.last_updated, None);
        assert_eq!(listing.developer_email, None);
    }

    #[test]
    fn page_without_title_is_rejected() {
        let err = parse_listing("<html><body>Not found</body></html>", &locator(LISTING))
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[tokio::test]
    async fn fetches_english_details_page() {
        let fetcher = MockFetcher::new().with_page(DETAILS, PAGE);
        let source = GooglePlayFetcher::new(fetcher.clone());

        let listing = source.fetch(&locator(LISTING)).await.unwrap();

        assert_eq!(listing.app_name.as_deref(), Some("Example App"));
        assert_eq!(fetcher.requests(), vec![DETAILS.to_string()]);
    }

    #[tokio::test]
    async fn app_store_locator_is_ignored_without_a_request() {
        let fetcher = MockFetcher::new();
        let source = GooglePlayFetcher::new(fetcher.clone());

        let result = source
            .fetch(&locator("https://apps.apple.com/us/app/example/id123456789"))
            .await;

        assert!(result.is_none());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_absent() {
        let fetcher = MockFetcher::new().with_error(DETAILS, "connection reset");
        let source = GooglePlayFetcher::new(fetcher);

        assert!(source.fetch(&locator(LISTING)).await.is_none());
    }
}
