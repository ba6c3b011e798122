//! Text generator port and implementations.
//!
//! - `OllamaGenerator` synthesizes answers via an Ollama-style
//!   `/api/generate` endpoint, assembling a prompt from the system message,
//!   the recent conversation, the resolved reference material, and the
//!   question.
//! - `CannedGenerator` and `FailingGenerator` are deterministic test doubles.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use deskbot_core::config::LlmConfig;
use deskbot_core::types::{Candidate, Role, Turn};

use crate::error::GenerationError;

/// Port for the text-generation collaborator.
///
/// `question` is the resolved question (a clarify selection already folded
/// in), `snippets` the reference material for the resolved option only, and
/// `history` the recent window of prior turns.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn synthesize(
        &self,
        question: &str,
        snippets: &[Candidate],
        history: &[Turn],
    ) -> Result<String, GenerationError>;
}

// ---------------------------------------------------------------------------
// OllamaGenerator - production adapter
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP adapter for an Ollama-style generation backend.
pub struct OllamaGenerator {
    client: reqwest::Client,
    generate_url: String,
    model: String,
    system_message: String,
}

impl OllamaGenerator {
    /// Build a generator from the LLM configuration section.
    pub fn new(config: &LlmConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            generate_url: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            system_message: config.system_message.clone(),
        })
    }

    fn build_prompt(&self, question: &str, snippets: &[Candidate], history: &[Turn]) -> String {
        let history_block = if history.is_empty() {
            "No previous conversation history.".to_string()
        } else {
            history
                .iter()
                .map(|turn| match turn.role {
                    Role::User => format!("User: {}", turn.content),
                    Role::Assistant => format!("Assistant: {}", turn.content),
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let context_block = if snippets.is_empty() {
            "No additional context provided.".to_string()
        } else {
            snippets
                .iter()
                .map(|c| c.snippet.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        format!(
            "{system}\n\n\
             Conversation so far:\n{history}\n\n\
             Reference material:\n{context}\n\n\
             Answer the question below directly, as your own knowledge. \
             Never mention documents, sources, or context in the answer.\n\n\
             Question: {question}\n\
             Answer:",
            system = self.system_message,
            history = history_block,
            context = context_block,
            question = question,
        )
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn synthesize(
        &self,
        question: &str,
        snippets: &[Candidate],
        history: &[Turn],
    ) -> Result<String, GenerationError> {
        let prompt = self.build_prompt(question, snippets, history);
        debug!(prompt_len = prompt.len(), model = %self.model, "Invoking generator");

        let response = self
            .client
            .post(&self.generate_url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Unavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GenerationError::Unavailable(format!(
                "generate returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Decode(e.to_string()))?;

        Ok(body.response.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Generator that returns a fixed reply, prefixed with the snippets it was
/// given so tests can assert what material reached synthesis.
pub struct CannedGenerator {
    reply: String,
}

impl CannedGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn synthesize(
        &self,
        _question: &str,
        snippets: &[Candidate],
        _history: &[Turn],
    ) -> Result<String, GenerationError> {
        if snippets.is_empty() {
            Ok(self.reply.clone())
        } else {
            let material = snippets
                .iter()
                .map(|c| c.snippet.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            Ok(format!("{} {}", self.reply, material))
        }
    }
}

/// Generator that always fails, for exercising the degraded path.
pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn synthesize(
        &self,
        _question: &str,
        _snippets: &[Candidate],
        _history: &[Turn],
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable("simulated outage".to_string()))
    }
}
