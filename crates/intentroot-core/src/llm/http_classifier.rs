//! Language-model intent classifier over a chat-completions endpoint

use super::{ChatMessage, ClassificationContext, IntentClassifier, LLMClient, LlmVerdict};
use crate::config::LLMServiceConfig;
use crate::error::{IntentRootError, Result};
use crate::types::{clamp_unit, Query};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are an intent classifier. Pick the single intent that best \
    matches the user's message from the provided list. Output ONLY valid JSON: \
    {\"intent\": \"<id or unknown>\", \"confidence\": <0.0-1.0>}";

/// Labels a model uses to say it has no opinion
const NO_OPINION: &[&str] = &["unknown", "none", "null", "n/a"];

/// Intent classifier using an external HTTP LLM service
pub struct HttpIntentClassifier {
    client: Arc<dyn LLMClient>,
}

impl HttpIntentClassifier {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    pub fn from_config(config: LLMServiceConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(super::VLLMClient::new(config)?)))
    }
}

#[async_trait]
impl IntentClassifier for HttpIntentClassifier {
    async fn classify(
        &self,
        query: &Query,
        context: &ClassificationContext,
    ) -> Result<Option<LlmVerdict>> {
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_classification_prompt(query, context)),
        ];

        let response = self.client.chat_completion(messages).await?;
        let verdict = parse_verdict(&response)?;

        // A label outside a non-empty registry is treated like "unknown"
        Ok(verdict.filter(|v| {
            context.known_intents.is_empty() || context.known_intents.contains(&v.intent)
        }))
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }
}

fn build_classification_prompt(query: &Query, context: &ClassificationContext) -> String {
    let mut prompt = String::from("Known intents:\n");
    if context.known_intents.is_empty() {
        prompt.push_str("(none registered; answer with your best short snake_case label)\n");
    }
    for intent in context.known_intents.intents() {
        let _ = match intent.description.as_deref().or(intent.title.as_deref()) {
            Some(about) => writeln!(prompt, "- {}: {}", intent.id, about),
            None => writeln!(prompt, "- {}", intent.id),
        };
    }

    if !context.episodes.is_empty() {
        prompt.push_str("\nEarlier in this conversation:\n");
        for episode in &context.episodes {
            let _ = writeln!(prompt, "{}: {}", episode.role.as_str(), episode.text);
        }
    }

    if let Some(intent) = context
        .prior_decision
        .as_ref()
        .and_then(|d| d.final_intent.as_deref())
    {
        let _ = writeln!(prompt, "\nPrevious turn was resolved as: {}", intent);
    }

    let _ = write!(prompt, "\nMessage: \"{}\"\n\nJSON:", query.text);
    prompt
}

fn parse_verdict(response: &str) -> Result<Option<LlmVerdict>> {
    // Models often wrap JSON in prose or code fences
    let json_str = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => {
            tracing::debug!("LLM reply had no JSON object; treating as no opinion");
            return Ok(None);
        }
    };

    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| IntentRootError::Llm(format!("JSON parse error: {}", e)))?;

    let intent = match parsed.get("intent").and_then(|v| v.as_str()).map(str::trim) {
        Some(label) if !label.is_empty() => label,
        _ => return Ok(None),
    };
    if NO_OPINION.iter().any(|n| intent.eq_ignore_ascii_case(n)) {
        return Ok(None);
    }

    let confidence = match parsed.get("confidence") {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };

    Ok(Some(LlmVerdict {
        intent: intent.to_string(),
        confidence: clamp_unit(confidence),
    }))
}
