//! The analysis requester: reviews in, raw model reply out.

use tracing::{debug, info};

use crate::analysis::prompt::{SYSTEM_PROMPT, build_prompt, review_texts};
use crate::data::{ChatMessage, ChatRequest, CompletionClient};
use crate::domain::{RawReview, RunRequest};
use crate::error::AnalysisError;

/// Raw reply plus what went into the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReply {
    pub text: String,
    /// Reviews with usable text.
    pub reviews_with_text: usize,
    /// Texts actually embedded (capped by `prompt_review_limit`).
    pub reviews_embedded: usize,
}

/// Build the chat request for `reviews`, or `None` when no review has text.
pub fn build_chat_request(reviews: &[RawReview], request: &RunRequest) -> Option<ChatRequest> {
    let texts = review_texts(reviews);
    if texts.is_empty() {
        return None;
    }

    let prompt = build_prompt(&request.app_name, &texts, request.prompt_review_limit);
    Some(ChatRequest {
        model: request.model.clone(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    })
}

/// Send one analysis request. Short-circuits with `NoContent` before any call
/// when there is nothing to analyze.
pub fn request_analysis(
    reviews: &[RawReview],
    request: &RunRequest,
    client: &dyn CompletionClient,
) -> Result<AnalysisReply, AnalysisError> {
    let Some(chat) = build_chat_request(reviews, request) else {
        info!(reviews = reviews.len(), "no review text to analyze; skipping request");
        return Err(AnalysisError::NoContent);
    };

    let reviews_with_text = review_texts(reviews).len();
    let reviews_embedded = reviews_with_text.min(request.prompt_review_limit);
    debug!(
        reviews_with_text,
        reviews_embedded,
        prompt_chars = chat.messages.last().map(|m| m.content.len()).unwrap_or(0),
        "built analysis prompt"
    );

    let text = client.complete(&chat)?;
    Ok(AnalysisReply {
        text,
        reviews_with_text,
        reviews_embedded,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::data::Role;

    /// Records every request and answers with a fixed reply.
    struct RecordingClient {
        reply: Result<String, AnalysisError>,
        seen: RefCell<Vec<ChatRequest>>,
    }

    impl RecordingClient {
        fn replying(text: &str) -> Self {
            Self { reply: Ok(text.to_string()), seen: RefCell::new(Vec::new()) }
        }
    }

    impl CompletionClient for RecordingClient {
        fn complete(&self, request: &ChatRequest) -> Result<String, AnalysisError> {
            self.seen.borrow_mut().push(request.clone());
            self.reply.clone()
        }
    }

    #[test]
    fn no_text_means_no_call() {
        let client = RecordingClient::replying("{}");
        let reviews = vec![RawReview::new("", 5), RawReview::new("   ", 1)];

        let err = request_analysis(&reviews, &RunRequest::default(), &client).unwrap_err();
        assert_eq!(err, AnalysisError::NoContent);
        assert!(client.seen.borrow().is_empty());
    }

    #[test]
    fn request_uses_fixed_sampling_and_analyst_system_role() {
        let client = RecordingClient::replying("{\"ok\": true}");
        let reviews = vec![
            RawReview::new("Great app", 5),
            RawReview::new("", 2),
            RawReview::new("Crashes a lot", 1),
        ];

        let reply = request_analysis(&reviews, &RunRequest::default(), &client).unwrap();
        assert_eq!(reply.text, "{\"ok\": true}");
        assert_eq!(reply.reviews_with_text, 2);
        assert_eq!(reply.reviews_embedded, 2);

        let seen = client.seen.borrow();
        assert_eq!(seen.len(), 1);
        let chat = &seen[0];
        assert_eq!(chat.model, "gpt-4");
        assert!((chat.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(chat.max_tokens, 1000);
        assert_eq!(chat.messages[0].role, Role::System);
        assert!(chat.messages[0].content.contains("app analyst"));

        let prompt = &chat.messages[1].content;
        assert!(prompt.contains("Analyze the following 2 Apple App Store reviews for Microsoft Teams."));
        assert!(prompt.contains("- Great app\n- Crashes a lot\n"));
    }

    #[test]
    fn transport_failure_passes_through() {
        let client = RecordingClient {
            reply: Err(AnalysisError::text_generation("connection reset")),
            seen: RefCell::new(Vec::new()),
        };
        let err = request_analysis(&[RawReview::new("hi", 3)], &RunRequest::default(), &client).unwrap_err();
        assert!(matches!(err, AnalysisError::ExternalService { .. }));
    }
}
