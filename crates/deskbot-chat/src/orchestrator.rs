//! Chat orchestrator: central coordinator wiring the collaborators to the
//! policy engine and the history store.
//!
//! One call per user action: validate, classify intent, resolve the
//! effective question against history, retrieve, decide, synthesize where
//! the decision calls for it, and append the exchange. Collaborator faults
//! and timeouts degrade to the not-found response; they never surface as
//! transport failures.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use deskbot_core::config::DeskbotConfig;
use deskbot_core::types::{Intent, Turn};
use deskbot_retrieval::{Generator, IntentClassifier, Retriever};

use crate::error::ChatError;
use crate::history::HistoryStore;
use crate::policy::{self, Decision, NotFoundReason};
use crate::session;

/// Central chat orchestrator.
pub struct ChatOrchestrator {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    intent_classifier: Arc<dyn IntentClassifier>,
    history: HistoryStore,
    memory_window: usize,
    max_message_length: usize,
    escalation_contact: String,
    retrieval_timeout: Duration,
    generation_timeout: Duration,
}

impl ChatOrchestrator {
    /// Create an orchestrator from the application configuration and the
    /// three collaborator ports.
    pub fn new(
        config: &DeskbotConfig,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        intent_classifier: Arc<dyn IntentClassifier>,
    ) -> Self {
        Self {
            retriever,
            generator,
            intent_classifier,
            history: HistoryStore::new(),
            memory_window: config.chat.memory_window,
            max_message_length: config.chat.max_message_length,
            escalation_contact: config.chat.escalation_contact.clone(),
            retrieval_timeout: Duration::from_secs(config.retrieval.timeout_secs),
            generation_timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }

    /// Handle one user message.
    ///
    /// Returns the assistant's response text and the session id (the
    /// submitted one, or a freshly coined one when none was given). The
    /// exchange is durably appended to history before this returns.
    pub async fn handle_message(
        &self,
        query: &str,
        session_id: Option<String>,
    ) -> Result<(String, String), ChatError> {
        if query.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if query.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        let sid = match session_id {
            Some(id) => {
                session::validate_session_id(&id)?;
                id
            }
            None => session::new_session_id(),
        };

        let history = self.history.history(&sid)?;
        let intent = self.intent_classifier.classify(query).await;
        info!(session_id = %sid, ?intent, turns = history.len(), "Processing message");

        let effective = policy::effective_question(query, &history);

        let decision = if intent == Intent::Greeting {
            policy::decide(&effective, &[], intent)
        } else {
            match tokio::time::timeout(
                self.retrieval_timeout,
                self.retriever.retrieve(&effective.text),
            )
            .await
            {
                Ok(Ok(candidates)) => policy::decide(&effective, &candidates, intent),
                Ok(Err(e)) => {
                    warn!(session_id = %sid, error = %e, "Retrieval failed");
                    Decision::NotFound(NotFoundReason::RetrievalUnavailable)
                }
                Err(_) => {
                    warn!(session_id = %sid, "Retrieval timed out");
                    Decision::NotFound(NotFoundReason::RetrievalUnavailable)
                }
            }
        };

        let response_text = match decision {
            Decision::Clarify(options) => {
                info!(session_id = %sid, options = options.len(), "Clarifying");
                policy::clarify_message(&options)
            }
            Decision::NotFound(reason) => {
                info!(session_id = %sid, ?reason, "No usable candidate");
                policy::not_found_message(reason, &self.escalation_contact)
            }
            Decision::Answer(resolved) => {
                let window = self.recent_window(&history);
                let synthesis = tokio::time::timeout(
                    self.generation_timeout,
                    self.generator
                        .synthesize(&resolved.question, &resolved.candidates, &window),
                )
                .await;
                match synthesis {
                    Ok(Ok(text)) if !text.trim().is_empty() => text,
                    Ok(Ok(_)) => {
                        warn!(session_id = %sid, "Generator returned empty text");
                        policy::not_found_message(
                            NotFoundReason::RetrievalUnavailable,
                            &self.escalation_contact,
                        )
                    }
                    Ok(Err(e)) => {
                        warn!(session_id = %sid, error = %e, "Generation failed");
                        policy::not_found_message(
                            NotFoundReason::RetrievalUnavailable,
                            &self.escalation_contact,
                        )
                    }
                    Err(_) => {
                        warn!(session_id = %sid, "Generation timed out");
                        policy::not_found_message(
                            NotFoundReason::RetrievalUnavailable,
                            &self.escalation_contact,
                        )
                    }
                }
            }
        };

        self.history
            .append_exchange(&sid, Turn::user(query), Turn::assistant(response_text.clone()))?;

        Ok((response_text, sid))
    }

    /// The turn sequence for a session, empty if unknown.
    pub fn history(&self, session_id: &str) -> Result<Vec<Turn>, ChatError> {
        session::validate_session_id(session_id)?;
        self.history.history(session_id)
    }

    /// Clear a session's history. Reports `SessionNotFound` for sessions
    /// never seen or already cleared.
    pub fn clear_history(&self, session_id: &str) -> Result<(), ChatError> {
        session::validate_session_id(session_id)?;
        self.history.clear(session_id)
    }

    /// The recent exchange window replayed to the generator.
    fn recent_window(&self, history: &[Turn]) -> Vec<Turn> {
        let max_turns = self.memory_window * 2;
        history[history.len().saturating_sub(max_turns)..].to_vec()
    }
}

// =============================================================================
// Tests
// =============================================================================
