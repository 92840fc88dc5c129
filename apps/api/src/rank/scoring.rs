//! Candidate scoring. Every rule adds a weighted bonus on top of a neutral
//! baseline and appends a human-readable reason; the reason list order is the
//! accrual order, so the strongest structural signals come first.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::rank::profile::UserProfile;
use crate::search::models::JobRecord;

pub const BASELINE_SCORE: i32 = 50;
const W_SUGGESTED_TITLE: i32 = 25;
const W_PREFERENCE: i32 = 10;
const W_SKILL: i32 = 5;
const SKILL_CAP: i32 = 20;
const W_INDUSTRY: i32 = 8;
const W_WORK_MODE: i32 = 10;
const W_LOCATION: i32 = 8;
const W_FRESH_DAY: i32 = 15;
const W_FRESH_WEEK: i32 = 8;
const W_NOVEL_COMPANY: i32 = 5;
const SAVED_SIMILARITY_PENALTY: i32 = 10;

const STOPWORDS: &[&str] = &[
    "and", "the", "for", "with", "senior", "junior", "lead", "staff", "mid",
    "level", "remote", "hybrid", "onsite",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(flatten)]
    pub job: JobRecord,
    pub score: i32,
    pub reasons: Vec<String>,
}

/// Words that carry meaning for title comparison: lowercased, 3+ chars,
/// not a seniority/connective stopword.
pub fn significant_words(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Two titles are similar when they share at least half of the shorter
/// title's significant words.
pub fn titles_similar(a: &str, b: &str) -> bool {
    let words_a = significant_words(a);
    let words_b = significant_words(b);
    if words_a.is_empty() || words_b.is_empty() {
        return false;
    }
    let shared = words_a.iter().filter(|w| words_b.contains(w)).count();
    let shorter = words_a.len().min(words_b.len());
    shared * 2 >= shorter
}

/// Scores one candidate against the profile. `now` anchors the recency tiers.
pub fn score_candidate(
    job: &JobRecord,
    profile: &UserProfile,
    now: DateTime<Utc>,
) -> Recommendation {
    let mut score = BASELINE_SCORE;
    let mut reasons = Vec::new();

    let title_lower = job.title.to_lowercase();
    let haystack = format!(
        "{} {} {}",
        title_lower,
        job.description.as_deref().unwrap_or_default().to_lowercase(),
        job.location.as_deref().unwrap_or_default().to_lowercase(),
    );

    for job_type in &profile.job_types {
        if title_lower.contains(&job_type.to_lowercase()) {
            score += W_PREFERENCE;
            reasons.push(format!("Matches your preferred job type \"{job_type}\""));
            break;
        }
    }

    for suggested in &profile.suggested_titles {
        if titles_similar(&job.title, suggested) {
            score += W_SUGGESTED_TITLE;
            reasons.push(format!("Strong match for \"{suggested}\" from your resume"));
            break;
        }
    }

    let mut skill_bonus = 0;
    let mut matched_skills = Vec::new();
    for skill in &profile.skills {
        let skill_lower = skill.to_lowercase();
        let in_tags = job.tags.iter().any(|t| t.eq_ignore_ascii_case(skill));
        if (in_tags || haystack.contains(&skill_lower)) && skill_bonus < SKILL_CAP {
            skill_bonus += W_SKILL;
            matched_skills.push(skill.clone());
        }
    }
    if skill_bonus > 0 {
        score += skill_bonus;
        reasons.push(format!("Uses your skills: {}", matched_skills.join(", ")));
    }

    for industry in &profile.industries {
        if haystack.contains(&industry.to_lowercase()) {
            score += W_INDUSTRY;
            reasons.push(format!("In your industry of interest: {industry}"));
            break;
        }
    }

    if let Some(mode) = &profile.work_mode {
        if haystack.contains(&mode.to_lowercase()) {
            score += W_WORK_MODE;
            reasons.push(format!("Offers your preferred {mode} work mode"));
        }
    }

    for location in &profile.preferred_locations {
        if haystack.contains(&location.to_lowercase()) {
            score += W_LOCATION;
            reasons.push(format!("Located in {location}"));
            break;
        }
    }

    if let Some(posted_at) = job.posted_at {
        let age = now.signed_duration_since(posted_at);
        if age <= Duration::days(1) {
            score += W_FRESH_DAY;
            reasons.push("Posted within the last day".to_string());
        } else if age <= Duration::days(7) {
            score += W_FRESH_WEEK;
            reasons.push("Posted within the last week".to_string());
        }
    }

    // Novelty only means something once there is a history to be absent from.
    if !profile.applied_companies.is_empty()
        && !profile.applied_companies.contains(&job.company.to_lowercase())
    {
        score += W_NOVEL_COMPANY;
        reasons.push("A company you haven't applied to yet".to_string());
    }

    if profile
        .saved_titles
        .iter()
        .any(|saved| titles_similar(&job.title, saved))
    {
        score -= SAVED_SIMILARITY_PENALTY;
        reasons.push("Similar to a job you already saved".to_string());
    }

    Recommendation {
        job: job.clone(),
        score: score.clamp(0, 100),
        reasons,
    }
}

/// True when the candidate's title is similar to something the user already
/// applied to; such candidates are dropped entirely rather than penalized.
pub fn matches_applied(job: &JobRecord, profile: &UserProfile) -> bool {
    profile
        .applied_titles
        .iter()
        .any(|applied| titles_similar(&job.title, applied))
}
