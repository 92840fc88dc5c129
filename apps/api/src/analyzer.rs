/// Document Analyzer collaborator — turns raw resume text into skills,
/// suggested titles, and an experience level.
///
/// This is one optional profile signal: any failure here degrades to "no
/// signal" and must never abort a ranking run.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("analyzer returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("no analyzer configured")]
    Disabled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysis {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub suggested_job_titles: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
}

#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, resume_text: &str) -> Result<ResumeAnalysis, AnalyzerError>;
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

pub struct HttpDocumentAnalyzer {
    client: Client,
    endpoint: String,
}

impl HttpDocumentAnalyzer {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for HttpDocumentAnalyzer {
    async fn analyze(&self, resume_text: &str) -> Result<ResumeAnalysis, AnalyzerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { text: resume_text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let analysis: ResumeAnalysis = response.json().await?;
        debug!(
            "analyzer returned {} skills, {} suggested titles",
            analysis.skills.len(),
            analysis.suggested_job_titles.len()
        );
        Ok(analysis)
    }
}

/// Used when no analyzer endpoint is configured; ranking proceeds without
/// the resume signal.
pub struct DisabledAnalyzer;

#[async_trait]
impl DocumentAnalyzer for DisabledAnalyzer {
    async fn analyze(&self, _resume_text: &str) -> Result<ResumeAnalysis, AnalyzerError> {
        Err(AnalyzerError::Disabled)
    }
}
