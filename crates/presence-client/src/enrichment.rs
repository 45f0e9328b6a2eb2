//! General company metadata: social links and size hints from the company
//! site, then the public LinkedIn "about us" card when the site links one.

use std::sync::LazyLock;

use presence_core::error::AppError;
use presence_core::models::{CompanyEnrichment, Locator, SocialLinks, Source};
use presence_core::traits::{Fetcher, SourceFetcher};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::html::{absolute_links, element_text, is_app_store_host, text_lines, visible_text};

/// Tried in order against the lowercased page text; first match wins.
static EMPLOYEE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(\d+)\+?\s+employees").expect("employees regex"),
        Regex::new(r"team of (\d+)").expect("team regex"),
        Regex::new(r"(\d+)\s+people").expect("people regex"),
    ]
});

/// A count with any number of thousands separators, or a plain digit run.
static EXACT_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+|\d+").expect("count regex"));

static LEADING_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+").expect("digits regex"));

/// Candidates for the "N employees on LinkedIn" call-to-action, best first.
static FACE_PILE: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    [
        Selector::parse(".face-pile__text").expect("face-pile selector"),
        Selector::parse(r#"a[data-tracking-control-name="face-pile-cta"]"#)
            .expect("face-pile cta selector"),
        Selector::parse(r#"a[data-tracking-will-navigate="true"]"#)
            .expect("navigate selector"),
    ]
});

static WEBSITE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[data-test-id="about-us__website"]"#).expect("website selector")
});

/// Company enrichment from the site itself plus its LinkedIn page.
#[derive(Clone)]
pub struct EnrichmentFetcher<F: Fetcher> {
    fetcher: F,
}

impl<F: Fetcher> EnrichmentFetcher<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetcher> SourceFetcher for EnrichmentFetcher<F> {
    type Profile = CompanyEnrichment;

    fn source(&self) -> Source {
        Source::Website
    }

    async fn lookup(&self, locator: &Locator) -> Result<Option<CompanyEnrichment>, AppError> {
        if is_app_store_host(locator.host()) {
            return Ok(None);
        }

        let html = self.fetcher.fetch(locator.as_str()).await?;
        let (social_links, employee_size) = parse_site(&html, locator.url());
        let mut enrichment = CompanyEnrichment::from_website(social_links, employee_size);

        let Some(linkedin) = enrichment.social_links.linkedin.clone() else {
            return Ok(Some(enrichment));
        };

        match self.fetcher.fetch(&linkedin).await {
            Ok(page) => parse_linkedin(&page).apply(&mut enrichment),
            Err(e) => {
                tracing::warn!(
                    url = %locator,
                    linkedin = %linkedin,
                    error = %e,
                    "LinkedIn fetch failed, keeping site data"
                );
            }
        }

        Ok(Some(enrichment))
    }
}

/// Social links and an employee-size guess from a company page.
pub fn parse_site(html: &str, base: &Url) -> (SocialLinks, Option<String>) {
    let doc = Html::parse_document(html);
    let links = absolute_links(&doc, base);

    let social_links = SocialLinks {
        linkedin: first_link_on(&links, &["linkedin.com"]),
        twitter: first_link_on(&links, &["twitter.com", "x.com"]),
        facebook: first_link_on(&links, &["facebook.com"]),
    };

    let text = visible_text(&doc).join(" ").to_lowercase();
    let employee_size = EMPLOYEE_PATTERNS
        .iter()
        .find_map(|re| re.captures(&text))
        .map(|caps| caps[1].to_string());

    (social_links, employee_size)
}

/// First link whose host is one of `domains` or a subdomain of one.
fn first_link_on(links: &[String], domains: &[&str]) -> Option<String> {
    links
        .iter()
        .find(|link| {
            Url::parse(link)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string))
                .is_some_and(|host| {
                    domains
                        .iter()
                        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
                })
        })
        .cloned()
}

/// Fields read from a public LinkedIn company page.
#[derive(Debug, Default, PartialEq)]
pub struct LinkedinProfile {
    pub company_size: Option<String>,
    pub exact_employee_count: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub headquarters: Option<String>,
    pub company_type: Option<String>,
    pub founded_year: Option<u16>,
    pub specialties: Vec<String>,
}

impl LinkedinProfile {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge into `enrichment`. The source only flips to LinkedIn when the
    /// page contributed something.
    fn apply(self, enrichment: &mut CompanyEnrichment) {
        if self.is_empty() {
            return;
        }
        enrichment.source = Source::Linkedin;
        enrichment.linkedin_company_size = self.company_size;
        enrichment.linkedin_exact_employee_count = self.exact_employee_count;
        enrichment.linkedin_website = self.website;
        enrichment.linkedin_industry = self.industry;
        enrichment.linkedin_headquarters = self.headquarters;
        enrichment.linkedin_company_type = self.company_type;
        enrichment.linkedin_founded_year = self.founded_year;
        enrichment.linkedin_specialties = self.specialties;
    }
}

pub fn parse_linkedin(html: &str) -> LinkedinProfile {
    let doc = Html::parse_document(html);

    let founded_year = about_value(&doc, "foundedOn").and_then(|v| {
        LEADING_DIGITS_RE
            .find(&v)
            .and_then(|m| m.as_str().parse::<u16>().ok())
    });

    LinkedinProfile {
        company_size: about_value(&doc, "size"),
        exact_employee_count: exact_employee_count(&doc),
        website: website(&doc),
        industry: about_value(&doc, "industry"),
        headquarters: about_value(&doc, "headquarters"),
        company_type: about_value(&doc, "organizationType"),
        founded_year,
        specialties: specialties(&doc),
    }
}

fn about_item<'a>(doc: &'a Html, field: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(&format!(r#"[data-test-id="about-us__{field}"]"#)).ok()?;
    doc.select(&selector).next()
}

/// An about-us item renders as a label line followed by the value line.
fn about_value(doc: &Html, field: &str) -> Option<String> {
    let item = about_item(doc, field)?;
    text_lines(&item).get(1).map(|v| v.to_string())
}

fn exact_employee_count(doc: &Html) -> Option<String> {
    let text = FACE_PILE
        .iter()
        .find_map(|sel| doc.select(sel).next())
        .map(|el| element_text(&el))?;
    EXACT_COUNT_RE
        .find(&text)
        .map(|m| m.as_str().replace(',', ""))
}

fn website(doc: &Html) -> Option<String> {
    let el = doc.select(&WEBSITE).next()?;
    el.value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .or_else(|| {
            let text = element_text(&el);
            (!text.is_empty()).then_some(text)
        })
}

fn specialties(doc: &Html) -> Vec<String> {
    let Some(item) = about_item(doc, "specialties") else {
        return Vec::new();
    };
    text_lines(&item)
        .into_iter()
        .skip(1)
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
