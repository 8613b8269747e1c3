//! JSON output formatter

use intentroot_core::Candidate;
use serde::Serialize;

pub fn format_value<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string()) + "\n"
}

pub fn format_rule_match(query: &str, candidate: Option<&Candidate>) -> String {
    let output = serde_json::json!({
        "query": query,
        "intent": candidate.map(|c| c.intent_label.as_str()),
        "confidence": candidate.map(|c| c.confidence),
    });
    format_value(&output)
}
