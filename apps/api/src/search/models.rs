//! Core data model for the discovery pipeline: source platforms, search
//! filters, and the structured job record every adapter produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum lengths a record must satisfy to exist at all. Extraction that
/// cannot meet these is discarded, never stored with placeholders.
pub const MIN_TITLE_LEN: usize = 3;
pub const MIN_COMPANY_LEN: usize = 2;

/// A known ATS vendor the engine can scope a search to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Greenhouse,
    Lever,
    Workday,
    Ashby,
    #[serde(rename = "smartrecruiters")]
    SmartRecruiters,
    Workable,
    Recruitee,
    Jobvite,
    /// Generic `careers.*` / `jobs.*` style company pages, matched by URL
    /// pattern rather than a vendor domain.
    #[serde(rename = "company-site")]
    CompanySite,
}

impl Platform {
    pub const ALL: [Platform; 9] = [
        Platform::Greenhouse,
        Platform::Lever,
        Platform::Workday,
        Platform::Ashby,
        Platform::SmartRecruiters,
        Platform::Workable,
        Platform::Recruitee,
        Platform::Jobvite,
        Platform::CompanySite,
    ];

    /// The bounded subset the "all" scope fans out to. Querying every vendor
    /// per request would blow the provider quota for marginal coverage.
    pub const HIGH_SIGNAL: [Platform; 5] = [
        Platform::Greenhouse,
        Platform::Lever,
        Platform::Ashby,
        Platform::Workday,
        Platform::SmartRecruiters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Greenhouse => "greenhouse",
            Platform::Lever => "lever",
            Platform::Workday => "workday",
            Platform::Ashby => "ashby",
            Platform::SmartRecruiters => "smartrecruiters",
            Platform::Workable => "workable",
            Platform::Recruitee => "recruitee",
            Platform::Jobvite => "jobvite",
            Platform::CompanySite => "company-site",
        }
    }

    /// Provider scope operator for this platform.
    pub fn site_operator(&self) -> &'static str {
        match self {
            Platform::Greenhouse => "site:boards.greenhouse.io",
            Platform::Lever => "site:jobs.lever.co",
            Platform::Workday => "site:myworkdayjobs.com",
            Platform::Ashby => "site:jobs.ashbyhq.com",
            Platform::SmartRecruiters => "site:jobs.smartrecruiters.com",
            Platform::Workable => "site:apply.workable.com",
            Platform::Recruitee => "site:recruitee.com",
            Platform::Jobvite => "site:jobs.jobvite.com",
            Platform::CompanySite => "(inurl:careers OR inurl:jobs)",
        }
    }

    /// Platforms that render postings client-side and need a longer page
    /// fetch timeout on the deep extraction path.
    pub fn is_js_heavy(&self) -> bool {
        matches!(self, Platform::Workday | Platform::Ashby)
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greenhouse" => Ok(Platform::Greenhouse),
            "lever" => Ok(Platform::Lever),
            "workday" => Ok(Platform::Workday),
            "ashby" => Ok(Platform::Ashby),
            "smartrecruiters" => Ok(Platform::SmartRecruiters),
            "workable" => Ok(Platform::Workable),
            "recruitee" => Ok(Platform::Recruitee),
            "jobvite" => Ok(Platform::Jobvite),
            "company-site" => Ok(Platform::CompanySite),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// Either one fixed platform or the bounded "all" fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformScope {
    All,
    One(Platform),
}

impl PlatformScope {
    /// The concrete platforms this scope fans out to.
    pub fn resolve(&self) -> Vec<Platform> {
        match self {
            PlatformScope::All => Platform::HIGH_SIGNAL.to_vec(),
            PlatformScope::One(p) => vec![*p],
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PlatformScope::All => "all".to_string(),
            PlatformScope::One(p) => p.as_str().to_string(),
        }
    }
}

impl std::str::FromStr for PlatformScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(PlatformScope::All);
        }
        s.parse::<Platform>().map(PlatformScope::One)
    }
}

/// Location filter applied as a qualifier term in the compiled expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationFilter {
    All,
    Remote,
    Onsite,
    Hybrid,
    Country(String),
}

impl LocationFilter {
    /// The qualifier term appended to the compiled expression, if any.
    pub fn qualifier(&self) -> Option<String> {
        match self {
            LocationFilter::All => None,
            LocationFilter::Remote => Some("\"remote\"".to_string()),
            LocationFilter::Onsite => Some("\"on-site\"".to_string()),
            LocationFilter::Hybrid => Some("\"hybrid\"".to_string()),
            LocationFilter::Country(c) => Some(format!("\"{c}\"")),
        }
    }
}

impl std::str::FromStr for LocationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("location filter must not be empty".to_string());
        }
        Ok(match trimmed.to_lowercase().as_str() {
            "all" => LocationFilter::All,
            "remote" => LocationFilter::Remote,
            "onsite" | "on-site" => LocationFilter::Onsite,
            "hybrid" => LocationFilter::Hybrid,
            _ => LocationFilter::Country(trimmed.to_string()),
        })
    }
}

/// Recency filter. Expressed as a provider side parameter, never embedded in
/// the compiled expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    #[default]
    Any,
    Day,
    Week,
    Month,
}

impl TimeFilter {
    pub fn as_provider_param(&self) -> Option<&'static str> {
        match self {
            TimeFilter::Any => None,
            TimeFilter::Day => Some("d1"),
            TimeFilter::Week => Some("w1"),
            TimeFilter::Month => Some("m1"),
        }
    }
}

impl std::str::FromStr for TimeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" | "" => Ok(TimeFilter::Any),
            "day" | "24h" => Ok(TimeFilter::Day),
            "week" => Ok(TimeFilter::Week),
            "month" => Ok(TimeFilter::Month),
            other => Err(format!("unknown time filter '{other}'")),
        }
    }
}

/// A fully validated search request. Immutable once issued.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub platform: PlatformScope,
    pub location: LocationFilter,
    pub time: TimeFilter,
    pub page: u32,
    pub limit: usize,
}

/// One raw item from the external search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderItem {
    pub link: String,
    pub title: String,
    pub snippet: String,
}

/// A structured job record. The `url` is canonical and acts as the dedup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub logo: Option<String>,
    pub source: Platform,
    pub tags: Vec<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub discovered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_jobs: usize,
    pub page_size: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub jobs: Vec<JobRecord>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_signal_subset_is_bounded() {
        assert!(Platform::HIGH_SIGNAL.len() <= 5);
    }

    #[test]
    fn test_platform_scope_parses_all() {
        assert_eq!("all".parse::<PlatformScope>().unwrap(), PlatformScope::All);
        assert_eq!(
            "ALL".parse::<PlatformScope>().unwrap(),
            PlatformScope::All
        );
    }

    #[test]
    fn test_platform_scope_parses_vendor() {
        assert_eq!(
            "greenhouse".parse::<PlatformScope>().unwrap(),
            PlatformScope::One(Platform::Greenhouse)
        );
    }

    #[test]
    fn test_platform_scope_rejects_unknown_vendor() {
        assert!("monster".parse::<PlatformScope>().is_err());
    }

    #[test]
    fn test_location_filter_unknown_value_is_country() {
        assert_eq!(
            "Germany".parse::<LocationFilter>().unwrap(),
            LocationFilter::Country("Germany".to_string())
        );
    }

    #[test]
    fn test_time_filter_provider_params() {
        assert_eq!("any".parse::<TimeFilter>().unwrap().as_provider_param(), None);
        assert_eq!(
            "day".parse::<TimeFilter>().unwrap().as_provider_param(),
            Some("d1")
        );
        assert_eq!(
            "week".parse::<TimeFilter>().unwrap().as_provider_param(),
            Some("w1")
        );
        assert_eq!(
            "month".parse::<TimeFilter>().unwrap().as_provider_param(),
            Some("m1")
        );
    }

    #[test]
    fn test_all_scope_resolves_to_high_signal_subset() {
        let platforms = PlatformScope::All.resolve();
        assert_eq!(platforms.len(), Platform::HIGH_SIGNAL.len());
        assert!(platforms.contains(&Platform::Greenhouse));
        assert!(!platforms.contains(&Platform::CompanySite));
    }
}
