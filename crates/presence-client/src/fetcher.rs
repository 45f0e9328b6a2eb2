use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use presence_core::error::AppError;
use presence_core::traits::Fetcher;
use reqwest::{Client, redirect};
use url::Url;

/// Desktop browser User-Agent. Store pages and many company sites serve a
/// stripped or blocked page to obvious bots.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

/// Plain HTTP transport.
///
/// Requests to private or reserved addresses are refused unless
/// [`allow_private_urls`](Self::allow_private_urls) is set, since the server
/// front-end fetches caller-supplied URLs.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
    block_private: bool,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| AppError::HttpError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout,
            block_private: true,
        })
    }

    /// Permit loopback and private-network targets (CLI use, local tests).
    pub fn allow_private_urls(mut self) -> Self {
        self.block_private = false;
        self
    }

    fn classify(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::timeout(self.timeout)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {e}"))
        } else {
            AppError::HttpError(e.to_string())
        }
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        if self.block_private {
            ensure_public(url).await?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {url}",
                status.as_u16()
            )));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        tracing::debug!(url, status = status.as_u16(), bytes = body.len(), "Fetched");
        Ok(body)
    }
}

/// Reject URLs that are not http(s) or whose host resolves to a private or
/// reserved address.
async fn ensure_public(url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::HttpError(format!("Invalid URL: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::HttpError(format!(
            "URL scheme '{}' is not allowed",
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::HttpError(format!("URL has no host: {url}")))?;
    let blocked = |ip: IpAddr| {
        AppError::HttpError(format!("Blocked private address {ip} for host {host}"))
    };

    // IPv6 literals come back bracketed from host_str.
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return if is_reserved(ip) { Err(blocked(ip)) } else { Ok(()) };
    }

    let port = parsed.port_or_known_default().unwrap_or(443);
    let addrs: Vec<_> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| AppError::NetworkError(format!("DNS lookup failed for {host}: {e}")))?
        .collect();

    if addrs.is_empty() {
        return Err(AppError::NetworkError(format!(
            "DNS lookup returned no addresses for {host}"
        )));
    }

    match addrs.iter().map(|a| a.ip()).find(|ip| is_reserved(*ip)) {
        Some(ip) => Err(blocked(ip)),
        None => Ok(()),
    }
}

fn is_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_reserved_v4(v4),
        IpAddr::V6(v6) => is_reserved_v6(v6),
    }
}

fn is_reserved_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        // carrier-grade NAT, 100.64.0.0/10
        || (a == 100 && (b & 0xC0) == 64)
}

fn is_reserved_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fe80::/10 link-local, fc00::/7 unique local
        || (first & 0xFFC0) == 0xFE80
        || (first & 0xFE00) == 0xFC00
        || ip.to_ipv4_mapped().is_some_and(is_reserved_v4)
}
