//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed through the pipeline in-memory
//! - exported to JSON
//! - reloaded later for rendering

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Apple App Store ID of Microsoft Teams.
pub const DEFAULT_APP_ID: &str = "1113153706";
pub const DEFAULT_APP_NAME: &str = "Microsoft Teams";
pub const DEFAULT_MAX_REVIEWS: usize = 25;
pub const DEFAULT_MODEL: &str = "gpt-4";
/// Upper bound on review texts embedded in one prompt.
pub const PROMPT_REVIEW_LIMIT: usize = 50;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// One review record as returned by the search service.
///
/// Only `text` and `rating` are interpreted; every other field is carried in
/// `extra` and re-serialized unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawReview {
    pub fn new(text: impl Into<String>, rating: i64) -> Self {
        Self {
            text: Some(text.into()),
            rating: Some(rating),
            extra: Map::new(),
        }
    }

    /// Review text, if it has any non-whitespace content.
    pub fn usable_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn has_text(&self) -> bool {
        self.usable_text().is_some()
    }
}

/// Accept integers, integral floats, and numeric strings; anything else is "no rating".
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(rating_from_value))
}

fn rating_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Overall sentiment label.
///
/// Labels outside the usual three are preserved verbatim rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
    Other(String),
}

impl Sentiment {
    pub fn label(&self) -> &str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
            Sentiment::Other(s) => s,
        }
    }

    /// Label with the first letter upper-cased, for display.
    pub fn title(&self) -> String {
        let label = self.label();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl From<String> for Sentiment {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "neutral" => Sentiment::Neutral,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Other(raw),
        }
    }
}

impl From<Sentiment> for String {
    fn from(s: Sentiment) -> Self {
        s.label().to_string()
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Count of reviews per star rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDistribution {
    #[serde(rename = "1_star")]
    pub one_star: usize,
    #[serde(rename = "2_star")]
    pub two_star: usize,
    #[serde(rename = "3_star")]
    pub three_star: usize,
    #[serde(rename = "4_star")]
    pub four_star: usize,
    #[serde(rename = "5_star")]
    pub five_star: usize,
}

impl RatingDistribution {
    /// Count ratings 1..=5; anything else is skipped.
    pub fn from_ratings(ratings: &[i64]) -> Self {
        let mut dist = Self::default();
        for &r in ratings {
            if let Some(slot) = dist.slot_mut(r) {
                *slot += 1;
            }
        }
        dist
    }

    pub fn get(&self, stars: i64) -> usize {
        match stars {
            1 => self.one_star,
            2 => self.two_star,
            3 => self.three_star,
            4 => self.four_star,
            5 => self.five_star,
            _ => 0,
        }
    }

    fn slot_mut(&mut self, stars: i64) -> Option<&mut usize> {
        match stars {
            1 => Some(&mut self.one_star),
            2 => Some(&mut self.two_star),
            3 => Some(&mut self.three_star),
            4 => Some(&mut self.four_star),
            5 => Some(&mut self.five_star),
            _ => None,
        }
    }

    pub fn total(&self) -> usize {
        (1..=5).map(|s| self.get(s)).sum()
    }

    /// `(stars, count)` pairs in ascending star order.
    pub fn counts(&self) -> [(i64, usize); 5] {
        [1, 2, 3, 4, 5].map(|s| (s, self.get(s)))
    }

    /// Mean star rating, or `0.0` when empty.
    pub fn average(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: usize = self.counts().iter().map(|&(s, n)| s as usize * n).sum();
        weighted as f64 / total as f64
    }
}

/// Structured summary produced from one batch of reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub overall_sentiment: Sentiment,
    pub sentiment_score: f64,
    pub key_themes: Vec<String>,
    pub common_issues: Vec<String>,
    pub strengths: Vec<String>,
    pub user_experience_feedback: String,
    pub feature_requests: Vec<String>,
    pub rating_distribution: RatingDistribution,
}

/// Immutable input of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub app_id: String,
    pub app_name: String,
    pub max_reviews: usize,
    pub model: String,
    pub prompt_review_limit: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            max_reviews: DEFAULT_MAX_REVIEWS,
            model: DEFAULT_MODEL.to_string(),
            prompt_review_limit: PROMPT_REVIEW_LIMIT,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}
