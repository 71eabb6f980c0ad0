//! Turn the model's reply into an `AnalysisResult`.
//!
//! Parsing is best-effort: an unparsable reply degrades to a fixed fallback
//! and is reported as a warning, never as a failure. The rating histogram is
//! always recomputed from the fetched reviews.

use serde::Deserialize;
use tracing::warn;

use crate::domain::{AnalysisResult, RatingDistribution, RawReview, Sentiment};
use crate::error::AnalysisError;

const NO_FEEDBACK: &str = "No feedback available";

/// Normalizer output: the result, the ratings it was built from, and the
/// parse failure (if the fallback was used).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAnalysis {
    pub result: AnalysisResult,
    pub ratings: Vec<i64>,
    pub warning: Option<AnalysisError>,
}

impl NormalizedAnalysis {
    pub fn used_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

/// Wire shape of the reply. Missing fields get display defaults; whatever the
/// model put in `rating_distribution` is ignored.
#[derive(Debug, Deserialize)]
struct ModelReply {
    #[serde(default)]
    overall_sentiment: Sentiment,
    #[serde(default = "neutral_score")]
    sentiment_score: f64,
    #[serde(default)]
    key_themes: Vec<String>,
    #[serde(default)]
    common_issues: Vec<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default = "no_feedback")]
    user_experience_feedback: String,
    #[serde(default)]
    feature_requests: Vec<String>,
}

fn neutral_score() -> f64 {
    0.5
}

fn no_feedback() -> String {
    NO_FEEDBACK.to_string()
}

impl From<ModelReply> for AnalysisResult {
    fn from(r: ModelReply) -> Self {
        AnalysisResult {
            overall_sentiment: r.overall_sentiment,
            sentiment_score: r.sentiment_score,
            key_themes: r.key_themes,
            common_issues: r.common_issues,
            strengths: r.strengths,
            user_experience_feedback: r.user_experience_feedback,
            feature_requests: r.feature_requests,
            rating_distribution: RatingDistribution::default(),
        }
    }
}

/// Ratings of every review that has one, in fetch order.
pub fn collect_ratings(reviews: &[RawReview]) -> Vec<i64> {
    reviews.iter().filter_map(|r| r.rating).collect()
}

/// Remove a leading ```` ```json ```` (or bare ```` ``` ````) fence and a trailing ```` ``` ````.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Strict parse of a (possibly fenced) reply. The histogram is left empty.
pub fn parse_reply(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str::<ModelReply>(cleaned)
        .map(AnalysisResult::from)
        .map_err(|e| AnalysisError::MalformedResponse { reason: e.to_string() })
}

/// Result shown when the reply cannot be parsed.
pub fn fallback_analysis() -> AnalysisResult {
    AnalysisResult {
        overall_sentiment: Sentiment::Neutral,
        sentiment_score: 0.5,
        key_themes: vec!["User feedback analysis completed".to_string()],
        common_issues: vec!["Review analysis available".to_string()],
        strengths: vec!["User insights gathered".to_string()],
        user_experience_feedback: "Analysis completed successfully".to_string(),
        feature_requests: vec!["User feedback processed".to_string()],
        rating_distribution: RatingDistribution::default(),
    }
}

/// Parse `raw`, fall back on failure, and overwrite the histogram from `ratings`.
pub fn normalize(raw: &str, ratings: Vec<i64>) -> NormalizedAnalysis {
    let (mut result, warning) = match parse_reply(raw) {
        Ok(result) => (result, None),
        Err(err) => {
            warn!(error = %err, raw = %raw, "analysis reply was not valid JSON; using fallback");
            (fallback_analysis(), Some(err))
        }
    };

    result.rating_distribution = RatingDistribution::from_ratings(&ratings);

    NormalizedAnalysis {
        result,
        ratings,
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{
        "overall_sentiment": "negative",
        "sentiment_score": 0.25,
        "key_themes": ["stability", "notifications"],
        "common_issues": ["crashes"],
        "strengths": ["video quality"],
        "user_experience_feedback": "Frequent crashes frustrate users.",
        "feature_requests": ["offline mode"],
        "rating_distribution": {"1_star": 40, "2_star": 0, "3_star": 0, "4_star": 0, "5_star": 99}
    }"#;

    #[test]
    fn fenced_reply_parses_like_bare_json() {
        let fenced = format!("```json\n{REPLY}\n```");
        let bare = normalize(REPLY, vec![1, 5]);
        let wrapped = normalize(&fenced, vec![1, 5]);

        assert_eq!(bare, wrapped);
        assert!(bare.warning.is_none());
        assert_eq!(bare.result.overall_sentiment, Sentiment::Negative);
        assert_eq!(bare.result.key_themes, vec!["stability", "notifications"]);

        let plain_fence = format!("```\n{REPLY}\n```");
        assert_eq!(normalize(&plain_fence, vec![1, 5]), bare);
    }

    #[test]
    fn model_histogram_is_always_replaced() {
        let out = normalize(REPLY, vec![5, 2, 1, 9, 0]);
        assert_eq!(
            out.result.rating_distribution,
            RatingDistribution { one_star: 1, two_star: 1, three_star: 0, four_star: 0, five_star: 1 }
        );
        assert_eq!(out.ratings, vec![5, 2, 1, 9, 0]);
    }

    #[test]
    fn truncated_reply_falls_back_without_failing() {
        let truncated = &REPLY[..REPLY.len() / 2];
        let out = normalize(truncated, vec![4, 4]);

        assert!(out.used_fallback());
        assert!(matches!(out.warning, Some(AnalysisError::MalformedResponse { .. })));
        assert_eq!(out.result.overall_sentiment, Sentiment::Neutral);
        assert_eq!(out.result.sentiment_score, 0.5);
        assert_eq!(out.result.key_themes, vec!["User feedback analysis completed"]);
        assert_eq!(out.result.rating_distribution.four_star, 2);
    }

    #[test]
    fn prose_and_non_object_replies_fall_back() {
        assert!(normalize("Sure! Here is the analysis you asked for.", vec![]).used_fallback());
        assert!(normalize("[1, 2, 3]", vec![]).used_fallback());
        assert!(normalize(r#"{"sentiment_score": "high"}"#, vec![]).used_fallback());
    }

    #[test]
    fn missing_fields_take_display_defaults() {
        let out = normalize(r#"{"key_themes": ["speed"]}"#, vec![3]);
        assert!(out.warning.is_none());
        assert_eq!(out.result.overall_sentiment, Sentiment::Neutral);
        assert_eq!(out.result.sentiment_score, 0.5);
        assert_eq!(out.result.key_themes, vec!["speed"]);
        assert!(out.result.common_issues.is_empty());
        assert_eq!(out.result.user_experience_feedback, "No feedback available");
        assert_eq!(out.result.rating_distribution.three_star, 1);
    }

    #[test]
    fn strip_code_fences_leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn collect_ratings_skips_reviews_without_rating() {
        let mut unrated = RawReview::new("x", 1);
        unrated.rating = None;
        let reviews = vec![RawReview::new("a", 5), unrated, RawReview::new("", 2)];
        assert_eq!(collect_ratings(&reviews), vec![5, 2]);
    }
}
