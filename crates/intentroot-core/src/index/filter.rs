//! Payload filters

use crate::types::Payload;
use serde::{Deserialize, Serialize};

/// `key == value`; array-valued payload fields match when they contain `value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub key: String,
    pub value: serde_json::Value,
}

/// Conjunction of field conditions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataFilter {
    pub must: Vec<FieldCondition>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must_eq(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.must.push(FieldCondition {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }

    pub fn matches(&self, payload: &Payload) -> bool {
        self.must.iter().all(|cond| match payload.get(&cond.key) {
            Some(serde_json::Value::Array(items)) => items.contains(&cond.value),
            Some(v) => *v == cond.value,
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Payload {
        let mut p = Payload::new();
        p.insert("domain".into(), json!("billing"));
        p.insert("tags".into(), json!(["refund", "payments"]));
        p
    }

    #[test]
    fn test_scalar_match() {
        assert!(MetadataFilter::new().must_eq("domain", "billing").matches(&payload()));
        assert!(!MetadataFilter::new().must_eq("domain", "support").matches(&payload()));
    }

    #[test]
    fn test_array_contains() {
        assert!(MetadataFilter::new().must_eq("tags", "refund").matches(&payload()));
        assert!(!MetadataFilter::new().must_eq("tags", "shipping").matches(&payload()));
    }

    #[test]
    fn test_missing_key_fails_and_empty_passes() {
        assert!(!MetadataFilter::new().must_eq("category", "x").matches(&payload()));
        assert!(MetadataFilter::new().matches(&payload()));
    }

    #[test]
    fn test_conjunction() {
        let f = MetadataFilter::new()
            .must_eq("domain", "billing")
            .must_eq("tags", "shipping");
        assert!(!f.matches(&payload()));
    }
}
