//! Deterministic phrase and pattern matching

use crate::config::RuleSetConfig;
use crate::error::{IntentRootError, Result};
use crate::types::{Candidate, SignalSource};
use regex::{Regex, RegexBuilder};

enum Trigger {
    /// Lowercased, whitespace-normalized phrase
    Phrase(String),
    Pattern(Regex),
}

impl Trigger {
    fn matches(&self, normalized: &str, raw: &str) -> bool {
        match self {
            Trigger::Phrase(p) => contains_phrase(normalized, p),
            Trigger::Pattern(re) => re.is_match(raw),
        }
    }
}

struct CompiledRule {
    intent: String,
    triggers: Vec<Trigger>,
}

/// Maps configured triggers to intents with one fixed confidence
pub struct RuleMatcher {
    rules: Vec<CompiledRule>,
    confidence: f64,
}

impl RuleMatcher {
    /// Compile every rule; a malformed pattern is a configuration error
    pub fn new(config: &RuleSetConfig) -> Result<Self> {
        let mut rules = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            let mut triggers = Vec::new();
            for phrase in &rule.phrases {
                let normalized = normalize(phrase);
                if !normalized.is_empty() {
                    triggers.push(Trigger::Phrase(normalized));
                }
            }
            for pattern in &rule.patterns {
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        IntentRootError::Config(format!(
                            "rule for {} has a malformed pattern {:?}: {}",
                            rule.intent, pattern, e
                        ))
                    })?;
                triggers.push(Trigger::Pattern(re));
            }
            rules.push(CompiledRule {
                intent: rule.intent.clone(),
                triggers,
            });
        }

        Ok(Self {
            rules,
            confidence: config.confidence,
        })
    }

    /// First rule (in configuration order) with a matching trigger
    pub fn matched_intent(&self, text: &str) -> Option<&str> {
        let normalized = normalize(text);
        self.rules
            .iter()
            .find(|rule| rule.triggers.iter().any(|t| t.matches(&normalized, text)))
            .map(|rule| rule.intent.as_str())
    }

    /// Zero or one rule candidate; no match is no opinion
    pub fn classify(&self, text: &str) -> Option<Candidate> {
        self.matched_intent(text)
            .map(|intent| Candidate::new(SignalSource::Rule, intent, self.confidence))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Phrase containment on word boundaries
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;

    fn config(rules: Vec<RuleConfig>) -> RuleSetConfig {
        RuleSetConfig {
            confidence: 0.75,
            rules,
        }
    }

    fn rule(intent: &str, phrases: &[&str], patterns: &[&str]) -> RuleConfig {
        RuleConfig {
            intent: intent.to_string(),
            phrases: phrases.iter().map(|s| s.to_string()).collect(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_phrase_match_fixed_confidence() {
        let matcher = RuleMatcher::new(&config(vec![rule(
            "appointment_scheduling",
            &["book appointment"],
            &[],
        )]))
        .unwrap();

        let c = matcher.classify("Please  BOOK\tappointment for me").unwrap();
        assert_eq!(c.source, SignalSource::Rule);
        assert_eq!(c.intent_label, "appointment_scheduling");
        assert_eq!(c.confidence, 0.75);
    }

    #[test]
    fn test_phrase_respects_word_boundaries() {
        let matcher = RuleMatcher::new(&config(vec![rule("greeting", &["hi"], &[])])).unwrap();
        assert!(matcher.classify("hi there").is_some());
        assert!(matcher.classify("say hi!").is_some());
        assert!(matcher.classify("this is it").is_none());
    }

    #[test]
    fn test_pattern_case_insensitive() {
        let matcher = RuleMatcher::new(&config(vec![rule(
            "order_management",
            &[],
            &[r"order\s+#?\d+"],
        )]))
        .unwrap();
        assert_eq!(
            matcher.matched_intent("Where is ORDER #1234?"),
            Some("order_management")
        );
        assert!(matcher.classify("no order here").is_none());
    }

    #[test]
    fn test_first_rule_wins() {
        let matcher = RuleMatcher::new(&config(vec![
            rule("cancel_order", &["cancel"], &[]),
            rule("cancel_appointment", &["cancel appointment"], &[]),
        ]))
        .unwrap();
        assert_eq!(
            matcher.matched_intent("cancel appointment"),
            Some("cancel_order")
        );
    }

    #[test]
    fn test_no_match_is_none() {
        let matcher = RuleMatcher::new(&config(vec![rule("a", &["alpha"], &[])])).unwrap();
        assert!(matcher.classify("beta").is_none());
        assert!(RuleMatcher::new(&config(vec![]))
            .unwrap()
            .classify("anything")
            .is_none());
    }

    #[test]
    fn test_malformed_pattern_is_config_error() {
        let err = RuleMatcher::new(&config(vec![rule("a", &[], &["(unclosed"])]))
            .err()
            .unwrap();
        assert!(matches!(err, IntentRootError::Config(_)));
    }
}
