//! SerpApi `apple_reviews` integration (the review fetcher).

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::RawReview;
use crate::error::AnalysisError;

pub const BASE_URL: &str = "https://serpapi.com/search.json";
const ENGINE: &str = "apple_reviews";

/// Anything that can answer a review search.
///
/// `search` returns the raw response body; `fetch_reviews` extracts the
/// `reviews` array from it. The split lets diagnostics inspect the full
/// response while the pipeline only sees records.
pub trait ReviewSource {
    fn search(&self, app_id: &str, max_reviews: usize) -> Result<Value, AnalysisError>;

    fn fetch_reviews(&self, app_id: &str, max_reviews: usize) -> Result<Vec<RawReview>, AnalysisError> {
        let body = self.search(app_id, max_reviews)?;
        let reviews = parse_reviews(app_id, body)?;
        info!(app_id, count = reviews.len(), "fetched reviews");
        Ok(reviews)
    }
}

pub struct SerpApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::review_search(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl ReviewSource for SerpApiClient {
    fn search(&self, app_id: &str, max_reviews: usize) -> Result<Value, AnalysisError> {
        info!(app_id, max_reviews, "requesting reviews");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&query_params(app_id, &self.api_key, max_reviews))
            .send()
            .map_err(|e| AnalysisError::review_search(e.to_string()))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .map_err(|e| AnalysisError::review_search(format!("failed to parse response ({status}): {e}")))?;

        // SerpApi reports bad keys and quota exhaustion as a JSON `error` with a 4xx status.
        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {status}"));
            warn!(app_id, %status, "review search rejected");
            return Err(AnalysisError::review_search(message));
        }

        debug!(app_id, keys = ?response_keys(&body), "review search response");
        Ok(body)
    }
}

/// Query string for one search. The credential travels as `api_key`.
pub fn query_params(app_id: &str, api_key: &str, max_reviews: usize) -> Vec<(&'static str, String)> {
    vec![
        ("engine", ENGINE.to_string()),
        ("product_id", app_id.to_string()),
        ("api_key", api_key.to_string()),
        ("num", max_reviews.to_string()),
    ]
}

/// Extract the `reviews` array from a search response.
pub fn parse_reviews(app_id: &str, body: Value) -> Result<Vec<RawReview>, AnalysisError> {
    let Value::Object(mut map) = body else {
        return Err(AnalysisError::review_search("response was not a JSON object"));
    };

    let Some(reviews) = map.remove("reviews") else {
        let detail = match map.get("error").and_then(Value::as_str) {
            Some(err) => err.to_string(),
            None => "response had no `reviews` key".to_string(),
        };
        warn!(app_id, %detail, "no reviews found");
        return Err(AnalysisError::NotFound {
            app_id: app_id.to_string(),
            detail,
        });
    };

    serde_json::from_value(reviews)
        .map_err(|e| AnalysisError::review_search(format!("malformed `reviews` array: {e}")))
}

/// Sorted top-level keys of a response object (empty for non-objects).
pub fn response_keys(body: &Value) -> Vec<String> {
    let mut keys: Vec<String> = body
        .as_object()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_params_use_apple_reviews_engine() {
        let params = query_params("1113153706", "secret", 25);
        assert_eq!(
            params,
            vec![
                ("engine", "apple_reviews".to_string()),
                ("product_id", "1113153706".to_string()),
                ("api_key", "secret".to_string()),
                ("num", "25".to_string()),
            ]
        );
    }

    #[test]
    fn parse_reviews_reads_reviews_array() {
        let body = json!({
            "search_metadata": {"status": "Success"},
            "reviews": [
                {"text": "Great app", "rating": 5, "title": "Love it"},
                {"text": "", "rating": 2},
            ]
        });
        let reviews = parse_reviews("1", body).unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].rating, Some(5));
        assert_eq!(reviews[0].extra.get("title"), Some(&json!("Love it")));
        assert!(!reviews[1].has_text());
    }

    #[test]
    fn missing_reviews_key_is_not_found_with_service_error() {
        let body = json!({"error": "Invalid product_id."});
        let err = parse_reviews("999", body).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::NotFound {
                app_id: "999".to_string(),
                detail: "Invalid product_id.".to_string(),
            }
        );

        let err = parse_reviews("999", json!({"search_metadata": {}})).unwrap_err();
        assert!(matches!(err, AnalysisError::NotFound { ref detail, .. } if detail.contains("no `reviews` key")));
    }

    #[test]
    fn empty_reviews_array_is_empty_not_an_error() {
        let reviews = parse_reviews("1", json!({"reviews": []})).unwrap();
        assert!(reviews.is_empty());
    }

    #[test]
    fn non_object_body_is_external_service_error() {
        let err = parse_reviews("1", json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, AnalysisError::ExternalService { .. }));
    }

    #[test]
    fn response_keys_are_sorted() {
        let body = json!({"reviews": [], "error": "x", "search_metadata": {}});
        assert_eq!(response_keys(&body), vec!["error", "reviews", "search_metadata"]);
        assert!(response_keys(&json!(null)).is_empty());
    }
}
