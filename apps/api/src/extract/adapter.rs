//! Per-platform extraction strategies for the deep path.
//!
//! Adapters are a registered strategy table, not a central conditional:
//! adding a source platform means registering one adapter. Each known vendor
//! carries an ordered list of structural selectors for title/company/
//! location/description; unrecognized hosts fall back to the generic list.
//! Company inference cascades: structural element → embedded page metadata →
//! URL-derived slug → reject.

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use url::Url;

use crate::extract::heuristics::{
    clean_description, company_from_slug, derive_logo, derive_tags, is_valid_pair,
};
use crate::search::models::{JobRecord, Platform};

/// One platform's extraction strategy.
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    fn matches(&self, url: &Url) -> bool;

    /// Extracts a validated record from a fetched page, or nothing. A reject
    /// here is routine filtering.
    fn extract(&self, html: &str, url: &Url, discovered_at: DateTime<Utc>) -> Option<JobRecord>;
}

/// Selector-driven adapter shared by every known vendor and the generic
/// fallback. Vendors differ only in their selector tables.
struct SelectorAdapter {
    platform: Platform,
    /// Host suffixes this adapter claims; empty means "matches everything"
    /// (the generic fallback).
    host_suffixes: &'static [&'static str],
    title_selectors: &'static [&'static str],
    company_selectors: &'static [&'static str],
    location_selectors: &'static [&'static str],
    description_selectors: &'static [&'static str],
}

impl PlatformAdapter for SelectorAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn matches(&self, url: &Url) -> bool {
        if self.host_suffixes.is_empty() {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        self.host_suffixes
            .iter()
            .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")))
    }

    fn extract(&self, html: &str, url: &Url, discovered_at: DateTime<Utc>) -> Option<JobRecord> {
        let document = Html::parse_document(html);

        let title = first_text(&document, self.title_selectors)?;
        let company = self.infer_company(&document, url)?;
        if !is_valid_pair(&title, &company) {
            return None;
        }

        let location = first_text(&document, self.location_selectors);
        let description =
            first_text(&document, self.description_selectors).and_then(|d| clean_description(&d));
        let tags = derive_tags(&title, description.as_deref());

        Some(JobRecord {
            logo: derive_logo(url.as_str()),
            title,
            company,
            location,
            description,
            url: url.as_str().to_string(),
            source: self.platform,
            tags,
            posted_at: None,
            discovered_at,
        })
    }
}

impl SelectorAdapter {
    fn infer_company(&self, document: &Html, url: &Url) -> Option<String> {
        first_text(document, self.company_selectors)
            .or_else(|| meta_content(document, "meta[property=\"og:site_name\"]"))
            .or_else(|| meta_content(document, "meta[name=\"author\"]"))
            .or_else(|| company_from_slug(url))
    }
}

fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let trimmed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
    }
    None
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let content = document
        .select(&selector)
        .next()?
        .value()
        .attr("content")?
        .trim()
        .to_string();
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}

/// The registered strategy table. The generic fallback sits last and matches
/// every URL, so `adapter_for` always resolves.
pub struct ExtractorRegistry {
    adapters: Vec<Box<dyn PlatformAdapter>>,
}

impl ExtractorRegistry {
    pub fn with_known_platforms() -> Self {
        let adapters: Vec<Box<dyn PlatformAdapter>> = vec![
            Box::new(SelectorAdapter {
                platform: Platform::Greenhouse,
                host_suffixes: &["boards.greenhouse.io", "job-boards.greenhouse.io"],
                title_selectors: &["h1.app-title", ".job__title h1", "h1"],
                company_selectors: &["span.company-name", ".company-name"],
                location_selectors: &[".location", ".job__location"],
                description_selectors: &["#content", ".job__description"],
            }),
            Box::new(SelectorAdapter {
                platform: Platform::Lever,
                host_suffixes: &["jobs.lever.co"],
                title_selectors: &[".posting-headline h2", "h2"],
                company_selectors: &[".main-header-logo img[alt]"],
                location_selectors: &[".posting-categories .location", ".sort-by-time.posting-category"],
                description_selectors: &[".section-wrapper .section", ".posting-page"],
            }),
            Box::new(SelectorAdapter {
                platform: Platform::Workday,
                host_suffixes: &["myworkdayjobs.com"],
                title_selectors: &["[data-automation-id=\"jobPostingHeader\"]", "h1"],
                company_selectors: &[],
                location_selectors: &["[data-automation-id=\"locations\"]"],
                description_selectors: &["[data-automation-id=\"jobPostingDescription\"]"],
            }),
            Box::new(SelectorAdapter {
                platform: Platform::Ashby,
                host_suffixes: &["jobs.ashbyhq.com"],
                title_selectors: &["h1"],
                company_selectors: &[],
                location_selectors: &["[class*=\"location\"]"],
                description_selectors: &["[class*=\"description\"]"],
            }),
            Box::new(SelectorAdapter {
                platform: Platform::SmartRecruiters,
                host_suffixes: &["jobs.smartrecruiters.com"],
                title_selectors: &["h1.job-title", "h1"],
                company_selectors: &[".job-company", "[itemprop=\"hiringOrganization\"]"],
                location_selectors: &["[itemprop=\"jobLocation\"]", "spl-job-location"],
                description_selectors: &["[itemprop=\"description\"]", ".job-sections"],
            }),
            Box::new(SelectorAdapter {
                platform: Platform::Workable,
                host_suffixes: &["apply.workable.com"],
                title_selectors: &["h1[data-ui=\"job-title\"]", "h1"],
                company_selectors: &["[data-ui=\"company-name\"]"],
                location_selectors: &["[data-ui=\"job-location\"]"],
                description_selectors: &["[data-ui=\"job-description\"]"],
            }),
            Box::new(SelectorAdapter {
                platform: Platform::Recruitee,
                host_suffixes: &["recruitee.com"],
                title_selectors: &["h1"],
                company_selectors: &[],
                location_selectors: &["[class*=\"location\"]"],
                description_selectors: &["[class*=\"description\"]", "main"],
            }),
            Box::new(SelectorAdapter {
                platform: Platform::Jobvite,
                host_suffixes: &["jobs.jobvite.com"],
                title_selectors: &["h2.jv-header", "h1", "h2"],
                company_selectors: &[],
                location_selectors: &[".jv-job-detail-meta"],
                description_selectors: &[".jv-job-detail-description"],
            }),
            // Generic fallback for unrecognized platforms. Must stay last.
            Box::new(SelectorAdapter {
                platform: Platform::CompanySite,
                host_suffixes: &[],
                title_selectors: &[
                    "h1.job-title",
                    "[data-testid=\"job-title\"]",
                    ".posting-headline h2",
                    "h1",
                ],
                company_selectors: &[".company-name", "[data-testid=\"company-name\"]"],
                location_selectors: &[".location", "[class*=\"location\"]"],
                description_selectors: &[
                    ".job-description",
                    "[class*=\"description\"]",
                    "article",
                    "main",
                ],
            }),
        ];

        Self { adapters }
    }

    pub fn adapter_for(&self, url: &Url) -> &dyn PlatformAdapter {
        self.adapters
            .iter()
            .find(|adapter| adapter.matches(url))
            .map(|boxed| boxed.as_ref())
            .expect("registry always ends with a catch-all adapter")
    }

    /// Source platform tag for a URL, without extracting anything.
    pub fn platform_for(&self, url: &Url) -> Platform {
        self.adapter_for(url).platform()
    }
}
