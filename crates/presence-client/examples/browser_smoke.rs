/// Smoke test for `BrowserFetcher` against a live company site.
///
/// Renders the page in headless Chromium and runs the landing-page
/// extractor over the result.
///
/// Run with:
///   cargo run -p presence-client --example browser_smoke --features browser -- https://example.com
use std::time::Duration;

use presence_client::BrowserFetcher;
use presence_client::site::parse_landing_page;
use presence_core::Locator;
use presence_core::traits::Fetcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let raw = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());
    let locator = Locator::parse(&raw)?;

    let fetcher = BrowserFetcher::new(Duration::from_secs(30));
    let html = fetcher.fetch(locator.as_str()).await?;
    anyhow::ensure!(html.len() > 200, "HTML suspiciously short ({} bytes)", html.len());

    let discovery = parse_landing_page(&html, locator.url());
    println!("rendered {} bytes", html.len());
    println!("company name: {:?}", discovery.company_name);
    println!("google play:  {:?}", discovery.app_links.google_play.map(String::from));
    println!("app store:    {:?}", discovery.app_links.app_store.map(String::from));
    Ok(())
}
