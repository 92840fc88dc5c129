//! Ranking profile assembly. Built fresh per ranking run from the
//! collaborators; only the resulting recommendations are cached, never the
//! profile itself. Every signal is optional and every collaborator failure
//! degrades to "no signal".

use tracing::{debug, warn};
use uuid::Uuid;

use crate::analyzer::{AnalyzerError, DocumentAnalyzer};
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub job_types: Vec<String>,
    pub skills: Vec<String>,
    pub suggested_titles: Vec<String>,
    pub experience_level: Option<String>,
    /// Lowercased titles from the application history.
    pub applied_titles: Vec<String>,
    /// Lowercased companies from the application history.
    pub applied_companies: Vec<String>,
    /// Lowercased titles from saved jobs.
    pub saved_titles: Vec<String>,
    pub recent_searches: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub work_mode: Option<String>,
    pub industries: Vec<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
}

impl UserProfile {
    /// True when at least one term-producing signal exists.
    pub fn has_signals(&self) -> bool {
        !self.suggested_titles.is_empty()
            || !self.applied_titles.is_empty()
            || !self.job_types.is_empty()
            || !self.recent_searches.is_empty()
    }
}

/// Gathers every signal the collaborators hold for this user.
pub async fn assemble(
    store: &dyn ProfileStore,
    analyzer: &dyn DocumentAnalyzer,
    user_id: Uuid,
) -> UserProfile {
    let mut profile = UserProfile::default();

    match store.preferences(user_id).await {
        Ok(Some(prefs)) => {
            profile.job_types = prefs.job_types;
            profile.preferred_locations = prefs.preferred_locations;
            profile.work_mode = prefs.work_mode;
            profile.industries = prefs.industries;
            profile.salary_min = prefs.salary_min;
            profile.salary_max = prefs.salary_max;
            profile.experience_level = prefs.experience_level;
        }
        Ok(None) => {}
        Err(err) => warn!("failed to load preferences for {user_id}: {err}"),
    }

    match store.applied_jobs(user_id).await {
        Ok(applied) => {
            profile.applied_titles = applied.iter().map(|a| a.title.to_lowercase()).collect();
            profile.applied_companies = applied.iter().map(|a| a.company.to_lowercase()).collect();
        }
        Err(err) => warn!("failed to load application history for {user_id}: {err}"),
    }

    match store.saved_titles(user_id).await {
        Ok(saved) => profile.saved_titles = saved.iter().map(|t| t.to_lowercase()).collect(),
        Err(err) => warn!("failed to load saved jobs for {user_id}: {err}"),
    }

    match store.recent_searches(user_id).await {
        Ok(searches) => profile.recent_searches = searches,
        Err(err) => warn!("failed to load search history for {user_id}: {err}"),
    }

    match store.resume_text(user_id).await {
        Ok(Some(text)) => match analyzer.analyze(&text).await {
            Ok(analysis) => {
                profile.skills = analysis.skills;
                profile.suggested_titles = analysis.suggested_job_titles;
                if profile.experience_level.is_none() {
                    profile.experience_level = analysis.experience_level;
                }
            }
            Err(AnalyzerError::Disabled) => debug!("resume analyzer disabled"),
            Err(err) => warn!("resume analysis failed for {user_id}: {err}"),
        },
        Ok(None) => {}
        Err(err) => warn!("failed to load resume for {user_id}: {err}"),
    }

    profile
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::analyzer::ResumeAnalysis;
    use crate::store::{AppliedJob, UserPreferences};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// In-memory store double.
    #[derive(Default)]
    pub struct StubStore {
        pub preferences: Option<UserPreferences>,
        pub resume: Option<String>,
        pub applied: Vec<AppliedJob>,
        pub saved: Vec<String>,
        pub searches: Vec<String>,
        pub fail_reads: bool,
        pub refresh_marks: AtomicUsize,
    }

    #[async_trait]
    impl ProfileStore for StubStore {
        async fn preferences(&self, _: Uuid) -> Result<Option<UserPreferences>, sqlx::Error> {
            if self.fail_reads {
                return Err(sqlx::Error::PoolClosed);
            }
            Ok(self.preferences.clone())
        }

        async fn resume_text(&self, _: Uuid) -> Result<Option<String>, sqlx::Error> {
            if self.fail_reads {
                return Err(sqlx::Error::PoolClosed);
            }
            Ok(self.resume.clone())
        }

        async fn applied_jobs(&self, _: Uuid) -> Result<Vec<AppliedJob>, sqlx::Error> {
            if self.fail_reads {
                return Err(sqlx::Error::PoolClosed);
            }
            Ok(self.applied.clone())
        }

        async fn saved_titles(&self, _: Uuid) -> Result<Vec<String>, sqlx::Error> {
            if self.fail_reads {
                return Err(sqlx::Error::PoolClosed);
            }
            Ok(self.saved.clone())
        }

        async fn recent_searches(&self, _: Uuid) -> Result<Vec<String>, sqlx::Error> {
            if self.fail_reads {
                return Err(sqlx::Error::PoolClosed);
            }
            Ok(self.searches.clone())
        }

        async fn mark_recommendations_refreshed(&self, _: Uuid) -> Result<(), sqlx::Error> {
            self.refresh_marks
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    /// Analyzer double returning a fixed analysis, or failing.
    #[derive(Default)]
    pub struct StubAnalyzer {
        pub analysis: Option<ResumeAnalysis>,
    }

    #[async_trait]
    impl DocumentAnalyzer for StubAnalyzer {
        async fn analyze(&self, _: &str) -> Result<ResumeAnalysis, AnalyzerError> {
            self.analysis.clone().ok_or(AnalyzerError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }
}
