use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;

/// A validated, normalized target address.
///
/// Always an absolute `http`/`https` URL with a host. Bare domains such as
/// `example.com` are promoted to `https://example.com/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator(Url);

impl Locator {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput("empty URL".into()));
        }

        // Anything already carrying a scheme is parsed as-is so the scheme
        // check below sees it.
        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let url = Url::parse(&candidate)
            .map_err(|e| AppError::InvalidInput(format!("{trimmed}: {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::InvalidInput(format!(
                    "{trimmed}: scheme '{scheme}' is not allowed"
                )));
            }
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(AppError::InvalidInput(format!("{trimmed}: missing host")));
        }

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// First value of the query parameter `name`, if present and non-empty.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.0
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locator {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locator {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.0.into()
    }
}

/// Which provider produced a profile fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Website,
    AppStore,
    GooglePlay,
    Linkedin,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Website => "website",
            Source::AppStore => "app_store",
            Source::GooglePlay => "google_play",
            Source::Linkedin => "linkedin",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A store listing for the company's app. Shared by both app stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppListing {
    pub source: Source,
    /// The listing URL the data was fetched for.
    pub link: String,
    pub app_name: Option<String>,
    pub developer_name: Option<String>,
    pub developer_email: Option<String>,
    pub developer_website: Option<String>,
    pub last_updated: Option<String>,
    pub downloads: Option<String>,
}

impl AppListing {
    pub fn new(source: Source, link: impl Into<String>) -> Self {
        Self {
            source,
            link: link.into(),
            app_name: None,
            developer_name: None,
            developer_email: None,
            developer_website: None,
            last_updated: None,
            downloads: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
}

/// General company metadata gathered from the site and its LinkedIn page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyEnrichment {
    /// Last source that contributed fields.
    pub source: Source,
    pub social_links: SocialLinks,
    pub employee_size: Option<String>,
    pub linkedin_company_size: Option<String>,
    pub linkedin_exact_employee_count: Option<String>,
    pub linkedin_website: Option<String>,
    pub linkedin_industry: Option<String>,
    pub linkedin_headquarters: Option<String>,
    pub linkedin_company_type: Option<String>,
    pub linkedin_founded_year: Option<u16>,
    pub linkedin_specialties: Vec<String>,
}

impl CompanyEnrichment {
    pub fn from_website(social_links: SocialLinks, employee_size: Option<String>) -> Self {
        Self {
            source: Source::Website,
            social_links,
            employee_size,
            linkedin_company_size: None,
            linkedin_exact_employee_count: None,
            linkedin_website: None,
            linkedin_industry: None,
            linkedin_headquarters: None,
            linkedin_company_type: None,
            linkedin_founded_year: None,
            linkedin_specialties: Vec::new(),
        }
    }
}

/// App listing links found on a company site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppLinks {
    pub google_play: Option<Locator>,
    pub app_store: Option<Locator>,
}

/// Result of the discovery step against the company site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    pub company_name: Option<String>,
    pub app_links: AppLinks,
}

/// Which fetchers apply to one item, decided from its discovery result.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub app_store: Option<Locator>,
    pub google_play: Option<Locator>,
    /// Always the original input, never a discovered link.
    pub enrichment: Locator,
}

impl FetchPlan {
    pub fn new(input: &Locator, discovery: &Discovery) -> Self {
        Self {
            app_store: discovery.app_links.app_store.clone(),
            google_play: discovery.app_links.google_play.clone(),
            enrichment: input.clone(),
        }
    }

    /// Enrichment only.
    pub fn enrichment_only(input: &Locator) -> Self {
        Self {
            app_store: None,
            google_play: None,
            enrichment: input.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Ok,
    Failed,
}

/// The merged output for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRecord {
    pub url: Locator,
    pub company: Option<String>,
    pub app_present: bool,
    pub google_play_data: Option<AppListing>,
    pub app_store_data: Option<AppListing>,
    pub fallback_data: Option<CompanyEnrichment>,
    pub status: RecordStatus,
    /// Set only when the whole item failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AggregatedRecord {
    /// Assemble a record from whatever fragments succeeded.
    ///
    /// `app_present` is derived here from the fragments actually obtained.
    pub fn assemble(
        url: Locator,
        company: Option<String>,
        google_play_data: Option<AppListing>,
        app_store_data: Option<AppListing>,
        fallback_data: Option<CompanyEnrichment>,
    ) -> Self {
        let app_present = google_play_data.is_some() || app_store_data.is_some();
        Self {
            url,
            company,
            app_present,
            google_play_data,
            app_store_data,
            fallback_data,
            status: RecordStatus::Ok,
            error: None,
        }
    }

    /// Terminal record for an item whose discovery (or processing) failed.
    pub fn failed(url: Locator, error: impl Into<String>) -> Self {
        Self {
            url,
            company: None,
            app_present: false,
            google_play_data: None,
            app_store_data: None,
            fallback_data: None,
            status: RecordStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == RecordStatus::Failed
    }
}
