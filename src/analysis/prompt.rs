//! Prompt text for the review analysis request.

use crate::domain::RawReview;

pub const SYSTEM_PROMPT: &str =
    "You are an expert app analyst specializing in user feedback analysis.";

/// The reply shape the model is asked for, spelled out verbatim in the prompt.
const SCHEMA_EXAMPLE: &str = r#"{
    "overall_sentiment": "positive",
    "sentiment_score": 0.8,
    "key_themes": ["user interface", "performance", "features"],
    "common_issues": ["slow loading", "buggy", "missing features"],
    "strengths": ["easy to use", "reliable", "good design"],
    "user_experience_feedback": "Users generally find the app intuitive but report performance issues",
    "feature_requests": ["dark mode", "better search", "offline support"],
    "rating_distribution": {
        "1_star": 0,
        "2_star": 0,
        "3_star": 0,
        "4_star": 0,
        "5_star": 0
    }
}"#;

/// Texts of the reviews that have any, in fetch order.
pub fn review_texts(reviews: &[RawReview]) -> Vec<&str> {
    reviews.iter().filter_map(RawReview::usable_text).collect()
}

/// Build the user prompt.
///
/// `total` is the number of reviews with text; only the first `limit` of
/// `texts` are embedded.
pub fn build_prompt(app_name: &str, texts: &[&str], limit: usize) -> String {
    let embedded: Vec<String> = texts
        .iter()
        .take(limit)
        .map(|t| format!("- {}", t.trim()))
        .collect();

    let mut out = String::new();
    out.push_str(&format!(
        "Analyze the following {} Apple App Store reviews for {app_name}.\n\n",
        texts.len()
    ));
    out.push_str("Reviews:\n");
    out.push_str(&embedded.join("\n"));
    out.push_str("\n\nYou must respond with ONLY valid JSON in this exact format:\n");
    out.push_str(SCHEMA_EXAMPLE);
    out.push_str("\n\nIMPORTANT: Respond with ONLY the JSON object, no additional text or explanations.\n");
    out
}
