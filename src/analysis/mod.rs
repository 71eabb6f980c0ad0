//! Review analysis: prompt construction, the model request, and reply normalization.

pub mod normalize;
pub mod prompt;
pub mod request;

pub use normalize::{NormalizedAnalysis, collect_ratings, fallback_analysis, normalize};
pub use request::{AnalysisReply, request_analysis};
