//! Shared "analysis pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch reviews -> request analysis -> normalize reply
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::analysis::{collect_ratings, normalize, request_analysis};
use crate::data::{CompletionClient, Credentials, OpenAiClient, ReviewSource, SerpApiClient};
use crate::domain::{AnalysisResult, RawReview, RunRequest};
use crate::error::AnalysisError;

/// Where a run is (or where it stopped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Fetching,
    Fetched,
    FetchFailed,
    Analyzing,
    Analyzed,
    AnalysisFailed,
    Normalizing,
    Done,
}

impl RunStage {
    pub fn is_failed(self) -> bool {
        matches!(self, RunStage::FetchFailed | RunStage::AnalysisFailed)
    }

    pub fn label(self) -> &'static str {
        match self {
            RunStage::Idle => "idle",
            RunStage::Fetching => "fetching reviews",
            RunStage::Fetched => "reviews fetched",
            RunStage::FetchFailed => "fetch failed",
            RunStage::Analyzing => "analyzing reviews",
            RunStage::Analyzed => "analysis received",
            RunStage::AnalysisFailed => "analysis failed",
            RunStage::Normalizing => "normalizing",
            RunStage::Done => "done",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A run that stopped in a terminal `*_failed` stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFailure {
    pub stage: RunStage,
    pub error: AnalysisError,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.error)
    }
}

impl std::error::Error for RunFailure {}

impl From<RunFailure> for crate::error::AppError {
    fn from(failure: RunFailure) -> Self {
        crate::error::AppError::new(failure.error.exit_code(), failure.to_string())
    }
}

/// All computed outputs of a single analysis run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub request: RunRequest,
    pub reviews: Vec<RawReview>,
    pub analysis: AnalysisResult,
    pub ratings: Vec<i64>,
    /// Set when the reply could not be parsed and the fallback was used.
    pub warning: Option<AnalysisError>,
    pub reviews_with_text: usize,
    pub reviews_embedded: usize,
    pub completed_at: DateTime<Utc>,
}

/// Execute one run against the given collaborators.
pub fn run(
    request: &RunRequest,
    reviews: &dyn ReviewSource,
    llm: &dyn CompletionClient,
) -> Result<RunOutput, RunFailure> {
    run_with_progress(request, reviews, llm, &mut |_| {})
}

/// Like [`run`], reporting every stage transition to `on_stage`.
pub fn run_with_progress(
    request: &RunRequest,
    source: &dyn ReviewSource,
    llm: &dyn CompletionClient,
    on_stage: &mut dyn FnMut(RunStage),
) -> Result<RunOutput, RunFailure> {
    let mut enter = |stage: RunStage| {
        debug!(%stage, "run stage");
        on_stage(stage);
    };

    // 1) Fetch reviews. An empty result is as unusable as a failed call.
    enter(RunStage::Fetching);
    let fetched = source
        .fetch_reviews(&request.app_id, request.max_reviews)
        .and_then(|reviews| {
            if reviews.is_empty() {
                Err(AnalysisError::NotFound {
                    app_id: request.app_id.clone(),
                    detail: "the `reviews` array was empty".to_string(),
                })
            } else {
                Ok(reviews)
            }
        });
    let reviews = match fetched {
        Ok(reviews) => reviews,
        Err(error) => {
            warn!(app_id = %request.app_id, %error, "fetch failed");
            enter(RunStage::FetchFailed);
            return Err(RunFailure { stage: RunStage::FetchFailed, error });
        }
    };
    enter(RunStage::Fetched);

    // 2) Ask the model.
    enter(RunStage::Analyzing);
    let reply = match request_analysis(&reviews, request, llm) {
        Ok(reply) => reply,
        Err(error) => {
            warn!(%error, "analysis failed");
            enter(RunStage::AnalysisFailed);
            return Err(RunFailure { stage: RunStage::AnalysisFailed, error });
        }
    };
    enter(RunStage::Analyzed);

    // 3) Normalize; never fails.
    enter(RunStage::Normalizing);
    let normalized = normalize(&reply.text, collect_ratings(&reviews));
    enter(RunStage::Done);

    info!(
        app_id = %request.app_id,
        reviews = reviews.len(),
        fallback = normalized.used_fallback(),
        "analysis complete"
    );

    Ok(RunOutput {
        request: request.clone(),
        reviews,
        analysis: normalized.result,
        ratings: normalized.ratings,
        warning: normalized.warning,
        reviews_with_text: reply.reviews_with_text,
        reviews_embedded: reply.reviews_embedded,
        completed_at: Utc::now(),
    })
}

/// Network endpoints and limits for the hosted collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub serpapi_url: Option<String>,
    pub openai_url: Option<String>,
    pub timeout: Duration,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            serpapi_url: None,
            openai_url: None,
            timeout: Duration::from_secs(crate::domain::DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Build the real SerpApi and OpenAI clients.
pub fn build_clients(
    credentials: &Credentials,
    endpoints: &Endpoints,
) -> Result<(SerpApiClient, OpenAiClient), AnalysisError> {
    let mut serpapi = SerpApiClient::new(&credentials.serpapi_key, endpoints.timeout)?;
    if let Some(url) = &endpoints.serpapi_url {
        serpapi = serpapi.with_base_url(url);
    }
    let mut openai = OpenAiClient::new(&credentials.openai_key, endpoints.timeout)?;
    if let Some(url) = &endpoints.openai_url {
        openai = openai.with_base_url(url);
    }
    Ok((serpapi, openai))
}
