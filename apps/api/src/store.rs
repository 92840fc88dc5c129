//! Persistence Store collaborator — read access to the user signals the
//! ranking profile is built from, plus a best-effort bookkeeping write.
//! The engine never owns long-term user data; it only reads it per run.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Declared preferences a user has saved.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct UserPreferences {
    pub job_types: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub work_mode: Option<String>,
    pub industries: Vec<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub experience_level: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppliedJob {
    pub title: String,
    pub company: String,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn preferences(&self, user_id: Uuid) -> Result<Option<UserPreferences>, sqlx::Error>;

    async fn resume_text(&self, user_id: Uuid) -> Result<Option<String>, sqlx::Error>;

    async fn applied_jobs(&self, user_id: Uuid) -> Result<Vec<AppliedJob>, sqlx::Error>;

    async fn saved_titles(&self, user_id: Uuid) -> Result<Vec<String>, sqlx::Error>;

    async fn recent_searches(&self, user_id: Uuid) -> Result<Vec<String>, sqlx::Error>;

    /// Best-effort bookkeeping: records that the user's recommendation cache
    /// was repopulated. No transactional guarantees expected.
    async fn mark_recommendations_refreshed(&self, user_id: Uuid) -> Result<(), sqlx::Error>;
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn preferences(&self, user_id: Uuid) -> Result<Option<UserPreferences>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT job_types, preferred_locations, work_mode, industries,
                   salary_min, salary_max, experience_level
            FROM user_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn resume_text(&self, user_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT raw_text FROM resumes WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn applied_jobs(&self, user_id: Uuid) -> Result<Vec<AppliedJob>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT job_title AS title, company
            FROM applications
            WHERE user_id = $1
            ORDER BY applied_at DESC
            LIMIT 50
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn saved_titles(&self, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT job_title FROM saved_jobs WHERE user_id = $1 ORDER BY saved_at DESC LIMIT 50",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn recent_searches(&self, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT query FROM search_history WHERE user_id = $1 ORDER BY searched_at DESC LIMIT 10",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_recommendations_refreshed(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO recommendation_refreshes (user_id, refreshed_at)
            VALUES ($1, NOW())
            ON CONFLICT (user_id) DO UPDATE SET refreshed_at = NOW()
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
