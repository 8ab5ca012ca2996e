use reqwest::blocking::Response;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

use super::{CompletionRequest, LanguageModel, LlmError};

/// Blocking client for OpenAI-compatible `/embeddings` and
/// `/chat/completions` endpoints.
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        OpenAiClient {
            client: reqwest::blocking::Client::new(),
            base_url,
            api_key: config.api_key.clone().unwrap_or_default(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
        }
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> reqwest::Result<Response> {
        log::debug!("POST {}{}", self.base_url, path);
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
    }
}

/// Reads the body of a failed response into a readable message.
fn failure_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    format!("provider returned {status}: {body}")
}

// ─── Embeddings ──────────────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f64>,
}

// ─── Chat completions ────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    n: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LanguageModel for OpenAiClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let req = EmbedRequest {
            model: &self.embedding_model,
            input: text,
        };

        let resp = self
            .post("/embeddings", &req)
            .map_err(|e| LlmError::Embedding(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(LlmError::Embedding(failure_message(resp)));
        }

        let body: EmbedResponse = resp
            .json()
            .map_err(|e| LlmError::Embedding(format!("malformed response: {e}")))?;

        body.data
            .into_iter()
            .next()
            .map(|data| data.embedding.into_iter().map(|v| v as f32).collect())
            .ok_or_else(|| LlmError::Embedding("no embedding returned".to_string()))
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let req = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            max_tokens: request.max_tokens,
            n: 1,
            temperature: request.temperature,
        };

        let resp = self
            .post("/chat/completions", &req)
            .map_err(|e| LlmError::Completion(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(LlmError::Completion(failure_message(resp)));
        }

        let body: ChatResponse = resp
            .json()
            .map_err(|e| LlmError::Completion(format!("malformed response: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::Completion("no choices returned".to_string()))
    }
}
