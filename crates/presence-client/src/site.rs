use std::sync::LazyLock;

use presence_core::error::AppError;
use presence_core::models::{AppLinks, Discovery, Locator};
use presence_core::traits::{Discoverer, Fetcher};
use scraper::{Html, Selector};
use url::Url;

use crate::html::{absolute_links, first_attr, first_text};

static OG_SITE_NAME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:site_name"]"#).expect("og:site_name selector")
});

static APPLICATION_NAME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="application-name"]"#).expect("application-name selector")
});

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector"));

const GOOGLE_PLAY_MARKER: &str = "play.google.com/store/apps";
const APP_STORE_MARKER: &str = "apps.apple.com";

/// Discovery against the company's own site.
///
/// Reads the display name and the first App Store / Google Play link from the
/// landing page.
#[derive(Clone)]
pub struct SiteDiscoverer<F: Fetcher> {
    fetcher: F,
}

impl<F: Fetcher> SiteDiscoverer<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetcher> Discoverer for SiteDiscoverer<F> {
    async fn discover(&self, locator: &Locator) -> Result<Discovery, AppError> {
        let html = self.fetcher.fetch(locator.as_str()).await?;
        tracing::debug!(url = %locator, bytes = html.len(), "Fetched landing page");
        Ok(parse_landing_page(&html, locator.url()))
    }
}

/// Extract the company name and app links from a landing page.
pub fn parse_landing_page(html: &str, base: &Url) -> Discovery {
    let doc = Html::parse_document(html);

    let company_name = first_attr(&doc, &OG_SITE_NAME, "content")
        .or_else(|| first_attr(&doc, &APPLICATION_NAME, "content"))
        .or_else(|| first_text(&doc, &TITLE).and_then(|t| title_prefix(&t)));

    let links = absolute_links(&doc, base);
    let app_links = AppLinks {
        google_play: first_matching_link(&links, GOOGLE_PLAY_MARKER),
        app_store: first_matching_link(&links, APP_STORE_MARKER),
    };

    Discovery {
        company_name,
        app_links,
    }
}

/// Title text before the first `|` or `-`, trimmed.
fn title_prefix(title: &str) -> Option<String> {
    let head = match title.find(['|', '-']) {
        Some(i) => &title[..i],
        None => title,
    };
    let head = head.trim();
    (!head.is_empty()).then(|| head.to_string())
}

fn first_matching_link(links: &[String], marker: &str) -> Option<Locator> {
    links
        .iter()
        .filter(|link| link.contains(marker))
        .find_map(|link| Locator::parse(link).ok())
}
