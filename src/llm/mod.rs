//! Hosted language model boundary: text embeddings and chat completions.

mod openai;

pub use openai::OpenAiClient;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// `None` leaves the budget to the provider.
    pub max_tokens: Option<u32>,
    pub temperature: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("completion failed: {0}")]
    Completion(String),
}

pub trait LanguageModel: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
