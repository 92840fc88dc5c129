//! Search term selection for a ranking run. Terms are drawn from the profile
//! in priority order; higher-priority terms get a larger share of the result
//! pool so the strongest signals dominate what gets retrieved.

use crate::rank::profile::UserProfile;

pub const MAX_TERMS: usize = 8;
/// Per-term record quota for resume- and history-derived titles.
pub const FULL_QUOTA: usize = 10;
/// Per-term record quota for declared preferences and recent searches.
pub const REDUCED_QUOTA: usize = 5;

/// Terms used when the profile carries no usable signal at all. A brand-new
/// user still gets a ranked feed rather than an empty page.
pub const DEFAULT_TERMS: [&str; 2] = ["software engineer", "developer"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    pub text: String,
    pub quota: usize,
}

/// Builds the retrieval term list: resume-suggested titles first, then
/// previously applied titles, then declared job types, then recent searches.
/// Duplicates (case-insensitive) are kept at their highest-priority slot.
pub fn select_terms(profile: &UserProfile) -> Vec<SearchTerm> {
    let mut terms: Vec<SearchTerm> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    let mut push = |text: &str, quota: usize, terms: &mut Vec<SearchTerm>, seen: &mut Vec<String>| {
        let trimmed = text.trim();
        if trimmed.is_empty() || terms.len() >= MAX_TERMS {
            return;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            return;
        }
        seen.push(key);
        terms.push(SearchTerm {
            text: trimmed.to_string(),
            quota,
        });
    };

    for title in &profile.suggested_titles {
        push(title, FULL_QUOTA, &mut terms, &mut seen);
    }
    for title in &profile.applied_titles {
        push(title, FULL_QUOTA, &mut terms, &mut seen);
    }
    for job_type in &profile.job_types {
        push(job_type, REDUCED_QUOTA, &mut terms, &mut seen);
    }
    for search in &profile.recent_searches {
        push(search, REDUCED_QUOTA, &mut terms, &mut seen);
    }

    if terms.is_empty() {
        return DEFAULT_TERMS
            .iter()
            .map(|t| SearchTerm {
                text: t.to_string(),
                quota: FULL_QUOTA,
            })
            .collect();
    }

    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            suggested_titles: vec!["Backend Engineer".to_string()],
            applied_titles: vec!["platform engineer".to_string()],
            job_types: vec!["DevOps".to_string()],
            recent_searches: vec!["rust remote".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_priority_order() {
        let terms = select_terms(&profile());
        let texts: Vec<&str> = terms.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Backend Engineer",
                "platform engineer",
                "DevOps",
                "rust remote"
            ]
        );
    }

    #[test]
    fn test_quota_by_source() {
        let terms = select_terms(&profile());
        assert_eq!(terms[0].quota, FULL_QUOTA);
        assert_eq!(terms[1].quota, FULL_QUOTA);
        assert_eq!(terms[2].quota, REDUCED_QUOTA);
        assert_eq!(terms[3].quota, REDUCED_QUOTA);
    }

    #[test]
    fn test_case_insensitive_dedup_keeps_priority_slot() {
        let mut p = profile();
        p.job_types = vec!["backend engineer".to_string()];
        let terms = select_terms(&p);
        assert_eq!(terms[0].text, "Backend Engineer");
        assert_eq!(terms[0].quota, FULL_QUOTA);
        assert!(!terms.iter().skip(1).any(|t| t.text.eq_ignore_ascii_case("backend engineer")));
    }

    #[test]
    fn test_capped_at_max_terms() {
        let p = UserProfile {
            suggested_titles: (0..20).map(|i| format!("Title {i}")).collect(),
            ..Default::default()
        };
        assert_eq!(select_terms(&p).len(), MAX_TERMS);
    }

    #[test]
    fn test_empty_profile_falls_back_to_defaults() {
        let terms = select_terms(&UserProfile::default());
        assert_eq!(terms.len(), DEFAULT_TERMS.len());
        assert_eq!(terms[0].text, "software engineer");
        assert_eq!(terms[0].quota, FULL_QUOTA);
    }

    #[test]
    fn test_blank_entries_skipped() {
        let p = UserProfile {
            suggested_titles: vec!["  ".to_string()],
            job_types: vec!["qa engineer".to_string()],
            ..Default::default()
        };
        let terms = select_terms(&p);
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].text, "qa engineer");
    }
}
