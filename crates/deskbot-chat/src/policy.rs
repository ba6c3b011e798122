//! Dialogue policy engine.
//!
//! The decision core: given the effective question, the retrieved candidates,
//! and the classified intent, decide whether to ask a clarifying question
//! enumerating the distinct options, synthesize an answer from the resolved
//! material, or fall back to the escalation response. Every function here is
//! a pure function of its inputs, so the decision is reproducible and
//! testable without a generation model.

use deskbot_core::types::{Candidate, Intent, Role, Turn};

/// Outcome of the dialogue policy for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Ask which of the enumerated options the user means. Labels are in
    /// retrieval order.
    Clarify(Vec<String>),
    /// Synthesize an answer from the resolved material.
    Answer(Resolved),
    /// Nothing usable; respond with the configured escalation instruction.
    NotFound(NotFoundReason),
}

/// Input to answer synthesis: the resolved question and the reference
/// material for the resolved option only.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub question: String,
    pub candidates: Vec<Candidate>,
}

/// Why the not-found path was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// Retrieval ran and produced nothing relevant.
    NoMatch,
    /// The retrieval or generation collaborator failed or timed out.
    RetrievalUnavailable,
}

/// The question the decision rules actually operate on. When the previous
/// assistant turn was a clarifying question and the new message selects one
/// of its options, `text` is the original question combined with the
/// selection and `selected` carries the chosen label.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveQuestion {
    pub text: String,
    pub selected: Option<String>,
}

/// Fixed lead-in of every clarifying message. `parse_clarify` relies on it
/// to recognize the engine's own clarifications in history.
const CLARIFY_LEAD: &str =
    "Your question applies to more than one option here. Which one do you mean: ";

/// Render a clarifying message that literally enumerates every option, in
/// retrieval order, with no answer content.
///
/// Labels must not contain ", " or the enumeration becomes unparseable;
/// retrieval labels are short system names, which never do.
pub fn clarify_message(options: &[String]) -> String {
    format!("{}{}?", CLARIFY_LEAD, options.join(", "))
}

/// Recognize a previously emitted clarifying message and recover its option
/// list. Returns `None` for any other assistant text.
pub fn parse_clarify(text: &str) -> Option<Vec<String>> {
    let rest = text.strip_prefix(CLARIFY_LEAD)?;
    let rest = rest.trim_end().strip_suffix('?')?;
    let options: Vec<String> = rest
        .split(", ")
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .collect();
    (!options.is_empty()).then_some(options)
}

/// Render the not-found response. The configured escalation contact appears
/// verbatim; nothing else is fabricated.
pub fn not_found_message(reason: NotFoundReason, contact: &str) -> String {
    match reason {
        NotFoundReason::NoMatch => format!(
            "I couldn't find an answer to that in the knowledge base. \
             Please contact {} so the team can help you directly.",
            contact
        ),
        NotFoundReason::RetrievalUnavailable => format!(
            "The knowledge base is temporarily unavailable, so I can't look \
             that up right now. Please try again in a moment or contact {}.",
            contact
        ),
    }
}

/// Lowercase and keep only alphanumerics and single spaces, so label and
/// selection matching ignore case, punctuation, and spacing.
fn normalize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a user reply selects the given option label. Exact match after
/// normalization, or containment in either direction for short replies like
/// "Outlook, please" or a truncated "thunder".
fn selection_matches(reply: &str, label: &str) -> bool {
    let r = normalize(reply);
    let l = normalize(label);
    if r.is_empty() || l.is_empty() {
        return false;
    }
    r == l || r.contains(&l) || (r.len() >= 3 && l.contains(&r))
}

/// Partition candidates by label, preserving first-seen retrieval order.
/// Labels compare case-insensitively; near-duplicate snippets within one
/// label (identical after normalization) are discarded.
pub fn group_by_label(candidates: &[Candidate]) -> Vec<(String, Vec<Candidate>)> {
    let mut groups: Vec<(String, Vec<Candidate>)> = Vec::new();
    for candidate in candidates {
        let key = normalize(&candidate.label);
        if let Some((_, members)) = groups.iter_mut().find(|(label, _)| normalize(label) == key) {
            let duplicate = members
                .iter()
                .any(|existing| normalize(&existing.snippet) == normalize(&candidate.snippet));
            if !duplicate {
                members.push(candidate.clone());
            }
        } else {
            groups.push((candidate.label.clone(), vec![candidate.clone()]));
        }
    }
    groups
}

/// If the question itself mentions exactly one of the labels, that label is
/// pinned and no clarification is needed. Mentioning several labels (or
/// none) pins nothing.
pub fn pinned_option(question: &str, labels: &[String]) -> Option<String> {
    let q = normalize(question);
    let mentioned: Vec<&String> = labels
        .iter()
        .filter(|label| {
            let l = normalize(label);
            !l.is_empty() && q.contains(&l)
        })
        .collect();
    match mentioned.as_slice() {
        [single] => Some((*single).clone()),
        _ => None,
    }
}

/// Resolve the question the decision rules should see.
///
/// When the last turn in history is one of the engine's own clarifying
/// messages and the new message selects exactly one of its options, the
/// effective question becomes the original question (the user turn that
/// preceded the clarification) combined with the selection. Otherwise the
/// message stands on its own.
pub fn effective_question(question: &str, history: &[Turn]) -> EffectiveQuestion {
    let plain = EffectiveQuestion {
        text: question.to_string(),
        selected: None,
    };

    let Some(previous) = history.last() else {
        return plain;
    };
    if previous.role != Role::Assistant {
        return plain;
    }
    let Some(options) = parse_clarify(&previous.content) else {
        return plain;
    };

    let matched: Vec<&String> = options
        .iter()
        .filter(|option| selection_matches(question, option))
        .collect();
    let [selected] = matched.as_slice() else {
        // No selection, or an ambiguous one: treat as a fresh question.
        return plain;
    };
    let selected = (*selected).clone();

    let original = history[..history.len() - 1]
        .iter()
        .rev()
        .find(|turn| turn.role == Role::User)
        .map(|turn| turn.content.clone());

    let text = match original {
        Some(original) => format!("{} ({})", original.trim(), selected),
        None => question.to_string(),
    };

    EffectiveQuestion {
        text,
        selected: Some(selected),
    }
}

/// The decision rule.
///
/// Greetings bypass retrieval entirely. Otherwise: two or more distinct
/// options without a pinned one clarify; a single or pinned option answers
/// from that option's material alone; anything else is not-found. A
/// selection carried in from a prior clarifying exchange always resolves to
/// an answer or not-found, never to another clarification over the same set.
pub fn decide(effective: &EffectiveQuestion, candidates: &[Candidate], intent: Intent) -> Decision {
    if intent == Intent::Greeting {
        return Decision::Answer(Resolved {
            question: effective.text.clone(),
            candidates: Vec::new(),
        });
    }

    let groups = group_by_label(candidates);
    if groups.is_empty() {
        return Decision::NotFound(NotFoundReason::NoMatch);
    }

    if let Some(selected) = &effective.selected {
        let resolved: Vec<Candidate> = groups
            .iter()
            .filter(|(label, _)| selection_matches(selected, label))
            .flat_map(|(_, members)| members.iter().cloned())
            .collect();
        return if resolved.is_empty() {
            Decision::NotFound(NotFoundReason::NoMatch)
        } else {
            Decision::Answer(Resolved {
                question: effective.text.clone(),
                candidates: resolved,
            })
        };
    }

    let labels: Vec<String> = groups.iter().map(|(label, _)| label.clone()).collect();
    if labels.len() >= 2 {
        if let Some(pin) = pinned_option(&effective.text, &labels) {
            let resolved = groups
                .into_iter()
                .find(|(label, _)| *label == pin)
                .map(|(_, members)| members)
                .unwrap_or_default();
            Decision::Answer(Resolved {
                question: effective.text.clone(),
                candidates: resolved,
            })
        } else {
            Decision::Clarify(labels)
        }
    } else {
        let resolved = groups
            .into_iter()
            .next()
            .map(|(_, members)| members)
            .unwrap_or_default();
        Decision::Answer(Resolved {
            question: effective.text.clone(),
            candidates: resolved,
        })
    }
}
