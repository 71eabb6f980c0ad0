//! Hosted collaborators: review search, text generation, and their credentials.

pub mod credentials;
pub mod openai;
pub mod serpapi;

pub use credentials::Credentials;
pub use openai::{ChatMessage, ChatRequest, CompletionClient, OpenAiClient, Role};
pub use serpapi::{ReviewSource, SerpApiClient};
