//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline stays free of presentation concerns
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisResult, RawReview, Sentiment};
use crate::report::summarize;

/// Header + summary metrics of a completed run.
pub fn format_run_summary(run: &RunOutput) -> String {
    let summary = summarize(run);
    let mut out = String::new();

    out.push_str(&format!("=== {} review insights ===\n", run.request.app_name));
    out.push_str(&format!(
        "App ID: {} | model: {} | analyzed at: {}\n",
        run.request.app_id,
        run.request.model,
        run.completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
    ));
    out.push_str(&format!("Total reviews: {}\n", summary.total_reviews));
    out.push_str(&format!(
        "Average rating: {:.1} / 5 (n={})\n",
        summary.average_rating, summary.rated_reviews
    ));
    out.push_str(&format!(
        "Reviews with text: {} (sent to model: {})\n",
        summary.reviews_with_text, summary.reviews_embedded
    ));
    out.push_str(&format!("Analysis status: {}\n", summary.status_label()));
    if let Some(warning) = &run.warning {
        out.push_str(&format!(
            "Warning: {warning}. Showing placeholder insights; see the log for the raw reply.\n"
        ));
    }

    out
}

/// Short marker for a sentiment label.
pub fn sentiment_marker(sentiment: &Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => ":)",
        Sentiment::Neutral => ":|",
        Sentiment::Negative => ":(",
        Sentiment::Other(_) => ":?",
    }
}

/// Sentiment, score, and the text sections of an analysis.
pub fn format_insights(analysis: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Overall sentiment: {} {}\n",
        analysis.overall_sentiment.title(),
        sentiment_marker(&analysis.overall_sentiment)
    ));
    out.push_str(&format!("Sentiment score: {:.2}/1.0\n", analysis.sentiment_score));

    push_list(&mut out, "Key themes", &analysis.key_themes);
    push_list(&mut out, "Common issues", &analysis.common_issues);
    push_list(&mut out, "Strengths", &analysis.strengths);

    out.push_str("\nUser experience feedback:\n");
    out.push_str(&format!("  {}\n", analysis.user_experience_feedback));

    push_list(&mut out, "Feature requests", &analysis.feature_requests);

    out
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    out.push_str(&format!("\n{title}:\n"));
    if items.is_empty() {
        out.push_str("  (none)\n");
    }
    for item in items {
        out.push_str(&format!("  - {item}\n"));
    }
}

/// The first `limit` raw reviews: rating and a one-line text preview.
pub fn format_reviews(reviews: &[RawReview], limit: usize, text_width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Raw reviews (showing {} of {}):\n",
        limit.min(reviews.len()),
        reviews.len()
    ));
    out.push_str(&format!("{:>3}  {:>6}  {}\n", "#", "rating", "text"));

    for (idx, review) in reviews.iter().take(limit).enumerate() {
        let rating = review
            .rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        let text = review
            .usable_text()
            .map(|t| truncate(&one_line(t), text_width))
            .unwrap_or_else(|| "(no text)".to_string());
        out.push_str(&format!("{:>3}  {:>6}  {}\n", idx + 1, rating, text));
    }

    out
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
