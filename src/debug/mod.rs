//! Review-fetch diagnostics.
//!
//! Issues the same search as the pipeline for several review counts and
//! reports what came back: response keys, how many reviews, and how many of
//! them are usable. Optionally writes the report as a Markdown bundle.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use serde_json::Value;
use tracing::info;

use crate::data::ReviewSource;
use crate::data::serpapi::response_keys;
use crate::domain::RawReview;
use crate::error::{AnalysisError, AppError};
use crate::report::truncate;

pub const DEFAULT_COUNTS: [usize; 3] = [25, 50, 100];
const SAMPLE_REVIEWS: usize = 3;
const TEXT_PREVIEW_CHARS: usize = 100;
const RESPONSE_PREVIEW_CHARS: usize = 300;

/// Per-review classification counts. Each review lands in the first bucket it matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewQuality {
    pub total: usize,
    /// Text and rating.
    pub valid: usize,
    pub empty_text: usize,
    /// Text but no rating.
    pub no_rating: usize,
    /// Array entries that are not review objects.
    pub malformed: usize,
    pub samples: Vec<ReviewSample>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSample {
    pub text_preview: Option<String>,
    pub rating: Option<i64>,
}

/// What one search response contained.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDiagnostics {
    pub keys: Vec<String>,
    pub reviews: Option<ReviewQuality>,
    pub error: Option<String>,
    /// Start of the pretty-printed body, kept when there were no reviews.
    pub preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchProbe {
    pub requested: usize,
    pub outcome: Result<ResponseDiagnostics, AnalysisError>,
}

pub fn classify_reviews(reviews: &[RawReview]) -> ReviewQuality {
    let mut quality = ReviewQuality {
        total: reviews.len(),
        ..ReviewQuality::default()
    };

    for review in reviews {
        let has_text = review.has_text();
        let has_rating = review.rating.is_some();
        if has_text && has_rating {
            quality.valid += 1;
        } else if !has_text {
            quality.empty_text += 1;
        } else {
            quality.no_rating += 1;
        }
    }

    quality.samples = reviews
        .iter()
        .take(SAMPLE_REVIEWS)
        .map(|r| ReviewSample {
            text_preview: r.usable_text().map(|t| truncate(t, TEXT_PREVIEW_CHARS)),
            rating: r.rating,
        })
        .collect();

    quality
}

/// Inspect a raw search response without interpreting failures as errors.
pub fn inspect_response(body: &Value) -> ResponseDiagnostics {
    let keys = response_keys(body);

    if let Some(raw) = body.get("reviews") {
        let Some(items) = raw.as_array() else {
            let shown = truncate(&raw.to_string(), RESPONSE_PREVIEW_CHARS);
            return ResponseDiagnostics {
                keys,
                reviews: Some(ReviewQuality::default()),
                error: Some(format!("`reviews` is not an array: {shown}")),
                preview: None,
            };
        };

        // One bad entry must not hide the rest.
        let parsed: Vec<RawReview> = items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect();
        let mut quality = classify_reviews(&parsed);
        quality.total = items.len();
        quality.malformed = items.len() - parsed.len();

        return ResponseDiagnostics {
            keys,
            reviews: Some(quality),
            error: None,
            preview: None,
        };
    }

    let error = body.get("error").and_then(Value::as_str).map(str::to_string);
    let pretty = serde_json::to_string_pretty(body).unwrap_or_default();
    ResponseDiagnostics {
        keys,
        reviews: None,
        error,
        preview: Some(truncate(&pretty, RESPONSE_PREVIEW_CHARS)),
    }
}

/// Run one search per requested count.
pub fn probe_counts(source: &dyn ReviewSource, app_id: &str, counts: &[usize]) -> Vec<FetchProbe> {
    counts
        .iter()
        .map(|&requested| {
            info!(app_id, requested, "probing review search");
            FetchProbe {
                requested,
                outcome: source.search(app_id, requested).map(|body| inspect_response(&body)),
            }
        })
        .collect()
}

/// Human-readable diagnostics report.
pub fn format_diagnostics(app_id: &str, app_name: &str, probes: &[FetchProbe]) -> String {
    let mut out = String::new();
    out.push_str("Review count diagnostics\n");
    out.push_str(&format!("{}\n", "=".repeat(60)));
    out.push_str(&format!("App: {app_name} (ID: {app_id})\n"));

    for probe in probes {
        out.push_str(&format!("\nRequesting {} reviews...\n", probe.requested));
        match &probe.outcome {
            Err(err) => out.push_str(&format!("  Error: {err}\n")),
            Ok(diag) => push_response(&mut out, diag),
        }
    }

    out.push_str("\nTroubleshooting tips:\n");
    out.push_str("1. Check your SerpApi plan limits\n");
    out.push_str("2. Verify the app ID is correct\n");
    out.push_str("3. Some reviews might be filtered out automatically\n");
    out.push_str("4. Empty or invalid reviews might be excluded\n");

    out
}

fn push_response(out: &mut String, diag: &ResponseDiagnostics) {
    out.push_str(&format!("  Response keys: [{}]\n", diag.keys.join(", ")));

    let Some(quality) = &diag.reviews else {
        out.push_str("  No reviews found in response\n");
        if let Some(err) = &diag.error {
            out.push_str(&format!("  Error: {err}\n"));
        }
        if let Some(preview) = &diag.preview {
            out.push_str(&format!("  Full response: {preview}\n"));
        }
        return;
    };

    out.push_str(&format!("  Found {} reviews\n", quality.total));
    if let Some(err) = &diag.error {
        out.push_str(&format!("  Error: {err}\n"));
    }
    for (idx, sample) in quality.samples.iter().enumerate() {
        out.push_str(&format!(
            "  Review {}: text: {}, rating: {}\n",
            idx + 1,
            yes_no(sample.text_preview.is_some()),
            yes_no(sample.rating.is_some()),
        ));
        if let Some(text) = &sample.text_preview {
            out.push_str(&format!("     text: {text}\n"));
        }
        if let Some(rating) = sample.rating {
            out.push_str(&format!("     rating: {rating}\n"));
        }
    }
    out.push_str(&format!(
        "  Summary: {} valid, {} empty text, {} no rating",
        quality.valid, quality.empty_text, quality.no_rating
    ));
    if quality.malformed > 0 {
        out.push_str(&format!(", {} malformed", quality.malformed));
    }
    out.push('\n');
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Write the diagnostics report under `debug/` and return its path.
pub fn write_debug_bundle(app_id: &str, report: &str) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("review_debug_{app_id}_{ts}.md"));

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
    writeln!(file, "# review fetch debug bundle")
        .and_then(|_| writeln!(file, "- generated: {}", Local::now().to_rfc3339()))
        .and_then(|_| writeln!(file, "\n```text\n{report}```"))
        .map_err(|e| AppError::new(4, format!("Failed to write debug bundle: {e}")))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct ByCount;

    impl ReviewSource for ByCount {
        fn search(&self, _app_id: &str, max_reviews: usize) -> Result<Value, AnalysisError> {
            match max_reviews {
                25 => Ok(json!({
                    "search_metadata": {"status": "Success"},
                    "reviews": [
                        {"text": "Works well", "rating": 5},
                        {"text": "  ", "rating": 3},
                        {"text": "No stars given"},
                        {"rating": 1}
                    ]
                })),
                50 => Ok(json!({"error": "Your account has run out of searches."})),
                _ => Err(AnalysisError::review_search("timed out")),
            }
        }
    }

    #[test]
    fn classify_uses_first_matching_bucket() {
        let body = ByCount.search("1", 25).unwrap();
        let diag = inspect_response(&body);
        let quality = diag.reviews.unwrap();

        assert_eq!(quality.total, 4);
        assert_eq!(quality.valid, 1);
        assert_eq!(quality.empty_text, 2);
        assert_eq!(quality.no_rating, 1);
        assert_eq!(quality.samples.len(), 3);
        assert_eq!(quality.samples[0].text_preview.as_deref(), Some("Works well"));
        assert_eq!(diag.keys, vec!["reviews", "search_metadata"]);
    }

    #[test]
    fn response_without_reviews_keeps_error_and_preview() {
        let diag = inspect_response(&json!({"error": "Invalid API key."}));
        assert!(diag.reviews.is_none());
        assert_eq!(diag.error.as_deref(), Some("Invalid API key."));
        assert!(diag.preview.unwrap().contains("Invalid API key."));
    }

    #[test]
    fn report_covers_each_probe_outcome() {
        let probes = probe_counts(&ByCount, "1113153706", &DEFAULT_COUNTS);
        assert_eq!(probes.len(), 3);

        let txt = format_diagnostics("1113153706", "Microsoft Teams", &probes);
        assert!(txt.contains("App: Microsoft Teams (ID: 1113153706)\n"));
        assert!(txt.contains("\nRequesting 25 reviews...\n  Response keys: [reviews, search_metadata]\n  Found 4 reviews\n"));
        assert!(txt.contains("  Summary: 1 valid, 2 empty text, 1 no rating\n"));
        assert!(txt.contains("  No reviews found in response\n  Error: Your account has run out of searches.\n"));
        assert!(txt.contains("\nRequesting 100 reviews...\n  Error: review search request failed: timed out\n"));
        assert!(txt.ends_with("4. Empty or invalid reviews might be excluded\n"));
    }

    #[test]
    fn stray_entries_are_counted_not_dropped() {
        let body = json!({"reviews": [
            {"text": "ok", "rating": 5},
            {"text": "fine", "rating": 4},
            "stray"
        ]});
        let diag = inspect_response(&body);
        let quality = diag.reviews.clone().unwrap();
        assert_eq!(quality.total, 3);
        assert_eq!(quality.valid, 2);
        assert_eq!(quality.malformed, 1);

        let mut out = String::new();
        push_response(&mut out, &diag);
        assert!(out.contains("  Found 3 reviews\n"));
        assert!(out.contains("  Summary: 2 valid, 0 empty text, 0 no rating, 1 malformed\n"));
    }

    #[test]
    fn non_array_reviews_are_reported() {
        let diag = inspect_response(&json!({"reviews": {"text": "ok"}}));
        assert_eq!(diag.reviews.unwrap().total, 0);
        assert!(diag.error.unwrap().starts_with("`reviews` is not an array"));
    }

    #[test]
    fn long_texts_are_previewed() {
        let long = "x".repeat(250);
        let quality = classify_reviews(&[RawReview::new(long, 4)]);
        let preview = quality.samples[0].text_preview.as_ref().unwrap();
        assert_eq!(preview.chars().count(), 100);
        assert!(preview.ends_with("..."));
    }
}
