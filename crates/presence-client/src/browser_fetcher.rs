use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use presence_core::error::AppError;
use presence_core::traits::Fetcher;

use crate::fetcher::BROWSER_USER_AGENT;

/// Headless Chromium transport for sites that render client-side.
///
/// Every [`Fetcher::fetch`] call launches its own browser and shuts it down
/// before returning, whether the page loaded, failed or timed out. Nothing is
/// shared between calls, so clones are cheap and concurrent fetches do not
/// contend on one process.
///
/// ```rust,no_run
/// use presence_client::BrowserFetcher;
/// use presence_core::traits::Fetcher;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = BrowserFetcher::new(std::time::Duration::from_secs(30));
/// let html = fetcher.fetch("https://example.com").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BrowserFetcher {
    timeout: Duration,
    executable: Option<PathBuf>,
}

impl BrowserFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            executable: find_chrome_binary(),
        }
    }

    fn config(&self) -> Result<BrowserConfig, AppError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .disable_default_args()
            .window_size(1920, 1080);
        if let Some(bin) = &self.executable {
            builder = builder.chrome_executable(bin);
        }

        let user_agent = format!("--user-agent={BROWSER_USER_AGENT}");
        builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg(user_agent.as_str())
            .build()
            .map_err(|e| AppError::Generic(format!("Browser config error: {e}")))
    }

    async fn render(browser: &Browser, url: &str) -> Result<String, AppError> {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to navigate to {url}: {e}")))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| AppError::HttpError(format!("Navigation to {url} failed: {e}")))?;
        page.content()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read page content: {e}")))
    }
}

impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let (mut browser, mut handler) = Browser::launch(self.config()?)
            .await
            .map_err(|e| AppError::Generic(format!("Failed to launch browser: {e}")))?;

        // The CDP connection only makes progress while the handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "Browser handler stopped");
                    break;
                }
            }
        });

        let result = match tokio::time::timeout(self.timeout, Self::render(&browser, url)).await {
            Ok(inner) => inner,
            Err(_) => Err(AppError::timeout(self.timeout)),
        };

        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "Failed to close browser");
        }
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }
}

/// Locate a Chrome/Chromium binary, honouring `CHROME_BIN`.
///
/// The snap wrapper at `/snap/bin/chromium` drops unknown flags and breaks
/// headless mode, so the real binary inside the snap is preferred. `None`
/// leaves the lookup to chromiumoxide.
fn find_chrome_binary() -> Option<PathBuf> {
    const CANDIDATES: &[&str] = &[
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    std::env::var_os("CHROME_BIN")
        .map(PathBuf::from)
        .into_iter()
        .chain(CANDIDATES.iter().map(PathBuf::from))
        .find(|p| p.exists())
}
