//! Pattern rules for the cheap extraction path: title/company inference from
//! a search-result item, direct-job URL classification, URL normalization,
//! and tag/description post-processing.
//!
//! These heuristics are inherently approximate. A discarded item is routine
//! filtering, not an error.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use url::Url;

use crate::search::models::{JobRecord, Platform, ProviderItem, MIN_COMPANY_LEN, MIN_TITLE_LEN};

pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const MAX_TAGS: usize = 5;

/// Tokens that can never be a company name on their own: employment-type
/// words, bare location/state/city names, month names.
const NON_COMPANY_TOKENS: &[&str] = &[
    "full-time",
    "full time",
    "part-time",
    "part time",
    "contract",
    "contractor",
    "temporary",
    "internship",
    "intern",
    "remote",
    "hybrid",
    "onsite",
    "on-site",
    "hiring",
    "careers",
    "career",
    "jobs",
    "job",
    "apply",
    "opening",
    "openings",
    "alabama",
    "arizona",
    "california",
    "colorado",
    "florida",
    "georgia",
    "illinois",
    "massachusetts",
    "michigan",
    "nevada",
    "new york",
    "north carolina",
    "ohio",
    "oregon",
    "pennsylvania",
    "texas",
    "utah",
    "virginia",
    "washington",
    "atlanta",
    "austin",
    "boston",
    "chicago",
    "denver",
    "los angeles",
    "miami",
    "san francisco",
    "seattle",
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Landing-page labels that are never a real posting title.
const GENERIC_TITLES: &[&str] = &[
    "careers",
    "career",
    "jobs",
    "job openings",
    "open positions",
    "open roles",
    "current openings",
    "join us",
    "join our team",
    "work with us",
    "opportunities",
    "job search",
    "job board",
];

/// Fixed vocabulary for tag derivation: technology, seniority and
/// employment-type terms matched by substring against title+description.
const TAG_VOCABULARY: &[&str] = &[
    "rust",
    "python",
    "typescript",
    "javascript",
    "react",
    "node",
    "java",
    "golang",
    "kotlin",
    "swift",
    "aws",
    "gcp",
    "kubernetes",
    "docker",
    "terraform",
    "sql",
    "postgres",
    "machine learning",
    "data engineering",
    "devops",
    "security",
    "frontend",
    "backend",
    "full stack",
    "mobile",
    "ios",
    "android",
    "senior",
    "staff",
    "principal",
    "lead",
    "junior",
    "intern",
    "contract",
    "full-time",
    "part-time",
    "remote",
    "hybrid",
];

fn numeric_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4,}$").expect("valid regex"))
}

fn uuid_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("valid regex")
    })
}

fn title_at_company_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?P<title>.{3,}?)\s+(?:at|with|@)\s+(?P<company>[^.,;|]{2,})")
            .expect("valid regex")
    })
}

/// Resolves a possibly relative link against its base and strips the
/// fragment, yielding the canonical dedup key.
pub fn normalize_url(link: &str, base: Option<&str>) -> Option<String> {
    let parsed = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(base?).ok()?;
            base.join(link).ok()?
        }
        Err(_) => return None,
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let mut normalized = parsed;
    normalized.set_fragment(None);
    Some(normalized.to_string())
}

/// Classifies a URL as pointing at one specific posting rather than a
/// listing root: an id-bearing path segment or a job-id query parameter.
pub fn is_direct_job_url(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(url) => url,
        Err(_) => return false,
    };

    let has_job_id_param = parsed.query_pairs().any(|(name, _)| {
        let name = name.to_lowercase();
        // lever- covers the tracking params Lever appends to apply links.
        name.starts_with("lever-")
            || matches!(
                name.as_str(),
                "jobid" | "gh_jid" | "jid" | "job_id" | "postingid"
            )
    });
    if has_job_id_param {
        return true;
    }

    parsed
        .path_segments()
        .into_iter()
        .flatten()
        .any(|segment| numeric_id_re().is_match(segment) || uuid_segment_re().is_match(segment))
}

/// True when the token could plausibly name a company.
pub fn is_plausible_company(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.len() < MIN_COMPANY_LEN {
        return false;
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let lower = trimmed.to_lowercase();
    !NON_COMPANY_TOKENS.contains(&lower.as_str())
}

pub fn is_generic_title(title: &str) -> bool {
    let lower = title.trim().to_lowercase();
    GENERIC_TITLES.contains(&lower.as_str())
}

/// True when the pair satisfies the record-existence invariant.
pub fn is_valid_pair(title: &str, company: &str) -> bool {
    title.trim().len() >= MIN_TITLE_LEN
        && company.trim().len() >= MIN_COMPANY_LEN
        && !is_generic_title(title)
        && is_plausible_company(company)
}

/// Attempts to split a search-result title into (job title, company).
///
/// Tried in order: separator-based company suffix ("Title - Company",
/// "Title | Company"), then "Title at/with/@ Company" on the item title,
/// then the same pattern against the snippet with the raw title kept as the
/// job title.
pub fn parse_title_company(title: &str, snippet: &str) -> Option<(String, String)> {
    if let Some(pair) = split_on_separator(title) {
        return Some(pair);
    }

    if let Some(caps) = title_at_company_re().captures(title.trim()) {
        let job_title = clean_title(&caps["title"]);
        let company = clean_company(&caps["company"]);
        if is_valid_pair(&job_title, &company) {
            return Some((job_title, company));
        }
    }

    if let Some(caps) = title_at_company_re().captures(snippet.trim()) {
        let job_title = clean_title(title);
        let company = clean_company(&caps["company"]);
        if is_valid_pair(&job_title, &company) {
            return Some((job_title, company));
        }
    }

    None
}

fn split_on_separator(title: &str) -> Option<(String, String)> {
    for separator in [" - ", " | ", " – ", " — "] {
        if let Some((left, right)) = title.split_once(separator) {
            let job_title = clean_title(left);
            let company = clean_company(right);
            if is_valid_pair(&job_title, &company) {
                return Some((job_title, company));
            }
        }
    }
    None
}

fn clean_title(raw: &str) -> String {
    raw.trim().trim_end_matches(['.', ',', ':']).to_string()
}

/// Strips board-noise suffixes search engines append to company segments.
/// Suffixes are ASCII, so a byte-wise case-insensitive tail comparison is
/// enough; the cut index must be validated as a char boundary because the
/// company part itself may be multibyte.
fn clean_company(raw: &str) -> String {
    let mut company = raw.trim().to_string();
    for suffix in [" careers", " jobs", " hiring", " job board"] {
        if company.len() < suffix.len() {
            continue;
        }
        let cut = company.len() - suffix.len();
        if company.is_char_boundary(cut) && company[cut..].eq_ignore_ascii_case(suffix) {
            company.truncate(cut);
        }
    }
    company.trim().trim_end_matches(['.', ',', ':']).to_string()
}

/// Derives a company name from the URL path/host slug. Last resort in the
/// company inference cascade.
pub fn company_from_slug(url: &Url) -> Option<String> {
    let slug = url
        .path_segments()
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty() && !numeric_id_re().is_match(s) && !uuid_segment_re().is_match(s))
        .map(str::to_string)
        .or_else(|| {
            url.host_str()
                .and_then(|h| h.split('.').next())
                .map(str::to_string)
        })?;

    let cleaned = title_case(&slug.replace(['-', '_'], " "));
    if is_plausible_company(&cleaned) {
        Some(cleaned)
    } else {
        None
    }
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Favicon-style logo URL derived from the posting host.
pub fn derive_logo(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(format!("https://logo.clearbit.com/{host}"))
}

/// Collapses layout/markup whitespace noise and caps the length.
pub fn clean_description(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    if collapsed.chars().count() <= DESCRIPTION_MAX_CHARS {
        return Some(collapsed);
    }
    let truncated: String = collapsed.chars().take(DESCRIPTION_MAX_CHARS).collect();
    Some(format!("{}…", truncated.trim_end()))
}

/// Keyword tags from the fixed vocabulary, deduplicated, capped at
/// `MAX_TAGS`, in vocabulary order.
pub fn derive_tags(title: &str, description: Option<&str>) -> Vec<String> {
    let haystack = format!("{} {}", title, description.unwrap_or_default()).to_lowercase();
    let mut tags = Vec::new();
    for term in TAG_VOCABULARY {
        if tags.len() >= MAX_TAGS {
            break;
        }
        if haystack.contains(term) {
            tags.push(term.to_string());
        }
    }
    tags
}

/// Cheap extraction path: builds a record straight from the provider item
/// when the pattern rules succeed and the URL points at one specific posting.
pub fn extract_from_item(
    item: &ProviderItem,
    url: &str,
    platform: Platform,
    discovered_at: DateTime<Utc>,
) -> Option<JobRecord> {
    if !is_direct_job_url(url) {
        return None;
    }
    let (title, company) = parse_title_company(&item.title, &item.snippet)?;
    let description = clean_description(&item.snippet);
    let tags = derive_tags(&title, description.as_deref());

    Some(JobRecord {
        logo: derive_logo(url),
        title,
        company,
        location: None,
        description,
        url: url.to_string(),
        source: platform,
        tags,
        posted_at: None,
        discovered_at,
    })
}
