//! Intent classification port and implementations.
//!
//! Classifies a query as a greeting/farewell or a real question before
//! retrieval runs. Classification is best-effort: failures fall back to the
//! keyword classifier and never surface as errors.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use deskbot_core::config::LlmConfig;
use deskbot_core::types::Intent;

/// Port for the intent-classification collaborator.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, query: &str) -> Intent;
}

// ---------------------------------------------------------------------------
// KeywordIntentClassifier
// ---------------------------------------------------------------------------

static GREETING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let pats = [
        r"(?i)^\s*(oi|ol[aá]|opa)\s*[!.?]*\s*$",
        r"(?i)^\s*(hi|hello|hey)\b",
        r"(?i)^\s*(bom dia|boa tarde|boa noite)\b",
        r"(?i)^\s*good\s+(morning|afternoon|evening)\b",
        r"(?i)^\s*(tchau|bye|goodbye|at[eé] mais|see you)\b",
        r"(?i)^\s*(obrigad[oa]|thanks|thank you|valeu)\b",
    ];
    pats.iter()
        .map(|p| Regex::new(p).expect("Invalid greeting regex"))
        .collect()
});

/// Regex-based greeting detector, used standalone and as the fallback for
/// the LLM classifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    pub fn classify_sync(&self, query: &str) -> Intent {
        if GREETING_PATTERNS.iter().any(|re| re.is_match(query)) {
            Intent::Greeting
        } else {
            Intent::Question
        }
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(&self, query: &str) -> Intent {
        self.classify_sync(query)
    }
}

// ---------------------------------------------------------------------------
// OllamaIntentClassifier
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

/// LLM-backed intent classifier with keyword fallback.
pub struct OllamaIntentClassifier {
    client: reqwest::Client,
    generate_url: String,
    model: String,
    fallback: KeywordIntentClassifier,
}

impl OllamaIntentClassifier {
    pub fn new(config: &LlmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            generate_url: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.intent_model.clone(),
            fallback: KeywordIntentClassifier,
        })
    }

    async fn classify_remote(&self, query: &str) -> Result<Intent, reqwest::Error> {
        let prompt = format!(
            "Classify the user's message as exactly one word, either \
             \"greeting\" or \"question\". Greetings, farewells, and thanks \
             are \"greeting\"; everything else is \"question\".\n\n\
             Message: {query}\n\
             Category:"
        );

        let response = self
            .client
            .post(&self.generate_url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateResponse = response.json().await?;
        let normalized = body.response.to_lowercase();

        let intent = if normalized.contains("greeting") {
            Intent::Greeting
        } else {
            Intent::Question
        };
        debug!(?intent, "Intent classified");
        Ok(intent)
    }
}

#[async_trait]
impl IntentClassifier for OllamaIntentClassifier {
    async fn classify(&self, query: &str) -> Intent {
        match self.classify_remote(query).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "Intent classification failed; falling back to keywords");
                self.fallback.classify_sync(query)
            }
        }
    }
}
