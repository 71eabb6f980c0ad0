//! Reporting utilities: summary metrics and formatted terminal output.

pub mod format;

pub use format::*;

use crate::app::pipeline::RunOutput;
use crate::domain::RatingDistribution;

/// Headline numbers for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_reviews: usize,
    /// Reviews whose rating is within 1..=5.
    pub rated_reviews: usize,
    pub average_rating: f64,
    pub reviews_with_text: usize,
    pub reviews_embedded: usize,
    pub used_fallback: bool,
}

impl RunSummary {
    pub fn status_label(&self) -> &'static str {
        if self.used_fallback {
            "Complete (fallback insights)"
        } else {
            "Complete"
        }
    }
}

/// Compute the summary metrics of a run.
pub fn summarize(run: &RunOutput) -> RunSummary {
    let dist = RatingDistribution::from_ratings(&run.ratings);
    RunSummary {
        total_reviews: run.reviews.len(),
        rated_reviews: dist.total(),
        average_rating: dist.average(),
        reviews_with_text: run.reviews_with_text,
        reviews_embedded: run.reviews_embedded,
        used_fallback: run.warning.is_some(),
    }
}
