//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - fetched review records (`RawReview`)
//! - the normalized analysis output (`AnalysisResult`, `Sentiment`, `RatingDistribution`)
//! - the immutable run input (`RunRequest`)

pub mod types;

pub use types::*;
