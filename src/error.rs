//! Error types.
//!
//! - `AnalysisError`: the pipeline's failure taxonomy. Every variant is a value the
//!   caller can match on; none of them is raised as a panic.
//! - `AppError`: what the binary prints, plus the process exit code.

use std::fmt;

use thiserror::Error;

/// Hosted collaborator that a request failed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    ReviewSearch,
    TextGeneration,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::ReviewSearch => write!(f, "review search"),
            Service::TextGeneration => write!(f, "text generation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("missing {name}: pass --{flag}, set {env_var} (or .env), or use --ask-keys")]
    CredentialMissing {
        name: &'static str,
        flag: &'static str,
        env_var: &'static str,
    },

    #[error("no reviews found for app ID {app_id}: {detail}")]
    NotFound { app_id: String, detail: String },

    #[error("{service} request failed: {message}")]
    ExternalService { service: Service, message: String },

    #[error("no review text to analyze")]
    NoContent,

    #[error("analysis reply was not valid JSON: {reason}")]
    MalformedResponse { reason: String },
}

impl AnalysisError {
    pub fn review_search(message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: Service::ReviewSearch,
            message: message.into(),
        }
    }

    pub fn text_generation(message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: Service::TextGeneration,
            message: message.into(),
        }
    }

    /// Process exit code used when this error ends the program.
    pub fn exit_code(&self) -> u8 {
        match self {
            AnalysisError::CredentialMissing { .. } => 2,
            AnalysisError::NotFound { .. } => 3,
            AnalysisError::ExternalService { .. } => 4,
            AnalysisError::NoContent => 5,
            // Not returned as a run failure; normalization falls back instead.
            AnalysisError::MalformedResponse { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
