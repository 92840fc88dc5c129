//! Query Compiler — turns a free-text query plus scope/location filters into
//! a provider-specific boolean search expression.
//!
//! The recency filter is deliberately NOT part of the expression: the
//! provider expresses it as a side parameter (`TimeFilter::as_provider_param`).

use crate::errors::AppError;
use crate::search::models::{LocationFilter, Platform, PlatformScope};

/// Bias term favouring live posting pages over generic listing roots.
const POSTING_BIAS: &str = "(inurl:apply OR \"apply now\" OR \"job description\")";

/// Compiles a search expression. Rejects an empty query before any network
/// call is made.
pub fn compile(
    query: &str,
    scope: PlatformScope,
    location: &LocationFilter,
) -> Result<String, AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::Validation(
            "search query must not be empty".to_string(),
        ));
    }

    // Literal phrase match for the query itself.
    let mut expression = format!("\"{query}\"");

    expression.push(' ');
    expression.push_str(&scope_operator(scope));

    expression.push(' ');
    expression.push_str(POSTING_BIAS);

    if let Some(qualifier) = location.qualifier() {
        expression.push(' ');
        expression.push_str(&qualifier);
    }

    Ok(expression)
}

/// The "all" scope compiles to a disjunction over the high-signal subset,
/// not the union of every known platform.
fn scope_operator(scope: PlatformScope) -> String {
    match scope {
        PlatformScope::One(platform) => platform.site_operator().to_string(),
        PlatformScope::All => {
            let sites: Vec<&str> = Platform::HIGH_SIGNAL
                .iter()
                .map(|p| p.site_operator())
                .collect();
            format!("({})", sites.join(" OR "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_platform_contains_phrase_and_site_operator() {
        let expr = compile(
            "Software Engineer",
            PlatformScope::One(Platform::Greenhouse),
            &LocationFilter::All,
        )
        .unwrap();
        assert!(expr.contains("\"Software Engineer\""));
        assert!(expr.contains("site:boards.greenhouse.io"));
    }

    #[test]
    fn test_all_scope_is_bounded_disjunction() {
        let expr = compile("rust developer", PlatformScope::All, &LocationFilter::All).unwrap();
        let site_count = expr.matches("site:").count();
        assert!(site_count <= 5, "expected at most 5 site operators, got {site_count}");
        assert!(expr.contains(" OR "));
    }

    #[test]
    fn test_bias_term_present() {
        let expr = compile("designer", PlatformScope::All, &LocationFilter::All).unwrap();
        assert!(expr.contains("inurl:apply"));
    }

    #[test]
    fn test_location_qualifier_appended_when_not_all() {
        let expr = compile(
            "data engineer",
            PlatformScope::One(Platform::Lever),
            &LocationFilter::Remote,
        )
        .unwrap();
        assert!(expr.ends_with("\"remote\""));
    }

    #[test]
    fn test_country_filter_quoted() {
        let expr = compile(
            "backend engineer",
            PlatformScope::One(Platform::Lever),
            &LocationFilter::Country("Canada".to_string()),
        )
        .unwrap();
        assert!(expr.contains("\"Canada\""));
    }

    #[test]
    fn test_no_qualifier_for_all_locations() {
        let expr = compile(
            "backend engineer",
            PlatformScope::One(Platform::Lever),
            &LocationFilter::All,
        )
        .unwrap();
        assert!(expr.ends_with(POSTING_BIAS));
    }

    #[test]
    fn test_empty_query_rejected() {
        let err = compile("   ", PlatformScope::All, &LocationFilter::All);
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_recency_never_embedded() {
        let expr = compile("devops", PlatformScope::All, &LocationFilter::All).unwrap();
        assert!(!expr.contains("d1"));
        assert!(!expr.contains("dateRestrict"));
    }

    #[test]
    fn test_company_site_scope_uses_wildcard_pattern() {
        let expr = compile(
            "platform engineer",
            PlatformScope::One(Platform::CompanySite),
            &LocationFilter::All,
        )
        .unwrap();
        assert!(expr.contains("inurl:careers OR inurl:jobs"));
    }
}
