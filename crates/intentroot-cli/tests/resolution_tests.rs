//! Integration tests for config, rules, score and resolve commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const RULES_ONLY: &str = r#"
rules:
  rules:
    - intent: appointment_scheduling
      phrases: ["book appointment"]
    - intent: refund_request
      patterns: ["\\brefund\\b"]
vector:
  enabled: false
llm_classifier:
  enabled: false
memory:
  enabled: false
"#;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.yml");
    fs::write(&path, content).unwrap();
    path
}

fn intentroot_cmd(dir: &TempDir, config: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("intentroot").unwrap();
    cmd.env("INTENTROOT_DB", dir.path().join("test.sqlite"))
        .env("INTENTROOT_CONFIG", config)
        // Nothing listens here, so HTTP calls fail fast
        .env("INTENTROOT_LLM_URL", "http://127.0.0.1:9");
    cmd
}

#[test]
fn test_config_check_ok() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, RULES_ONLY);

    intentroot_cmd(&dir, &config)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"))
        .stdout(predicate::str::contains("Rules:       2"));
}

#[test]
fn test_config_check_negative_weight_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "scoring:\n  source_weights:\n    rule: -1.0\n    vector: 1.0\n    llm: 1.2\n",
    );

    intentroot_cmd(&dir, &config)
        .args(["config", "check"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("source_weights.rule"));
}

#[test]
fn test_config_check_malformed_pattern_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "rules:\n  rules:\n    - intent: broken\n      patterns: [\"(unclosed\"]\n",
    );

    intentroot_cmd(&dir, &config)
        .args(["config", "check"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("malformed pattern"));
}

#[test]
fn test_config_flag_overrides_env() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, RULES_ONLY);
    let bogus = dir.path().join("bogus.yml");
    fs::write(&bogus, "scoring:\n  tie_epsilon: -1.0\n").unwrap();

    intentroot_cmd(&dir, &bogus)
        .arg("--config")
        .arg(&config)
        .args(["config", "check"])
        .assert()
        .success();
}

#[test]
fn test_rules_match() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, RULES_ONLY);

    intentroot_cmd(&dir, &config)
        .args(["rules", "Please", "BOOK", "appointment", "for", "tomorrow"])
        .assert()
        .success()
        .stdout(predicate::str::contains("appointment_scheduling (0.75)"));
}

#[test]
fn test_rules_no_match() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, RULES_ONLY);

    intentroot_cmd(&dir, &config)
        .args(["rules", "what", "is", "the", "weather"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No rule matched"));
}

#[test]
fn test_rules_json() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, RULES_ONLY);

    let output = intentroot_cmd(&dir, &config)
        .args(["--format", "json", "rules", "I", "want", "a", "refund"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["intent"], "refund_request");
    assert_eq!(parsed["confidence"], 0.75);
}

#[test]
fn test_score_disagreement_prefers_weighted_llm() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, RULES_ONLY);
    let candidates = dir.path().join("candidates.json");
    fs::write(
        &candidates,
        r#"[
            {"source": "vector", "intent_label": "appointment_scheduling", "confidence": 0.86},
            {"source": "llm", "intent_label": "order_management", "confidence": 0.91}
        ]"#,
    )
    .unwrap();

    intentroot_cmd(&dir, &config)
        .arg("score")
        .arg(&candidates)
        .assert()
        .success()
        .stdout(predicate::str::contains("Intent:      order_management"))
        .stdout(predicate::str::contains("1.092"));
}

#[test]
fn test_score_empty_is_unresolved() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, RULES_ONLY);

    let output = intentroot_cmd(&dir, &config)
        .args(["--format", "json", "score", "-"])
        .write_stdin("[]")
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed["decision"]["final_intent"].is_null());
    assert_eq!(parsed["decision"]["confidence"], 0.0);
}

#[test]
fn test_score_rejects_out_of_range_confidence() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, RULES_ONLY);

    intentroot_cmd(&dir, &config)
        .args(["score", "-"])
        .write_stdin(r#"[{"source": "rule", "intent_label": "x", "confidence": 1.5}]"#)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("outside [0, 1]"));
}

#[test]
fn test_resolve_rules_only() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, RULES_ONLY);

    let output = intentroot_cmd(&dir, &config)
        .args(["--format", "json", "resolve", "book", "appointment", "please"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["decision"]["final_intent"], "appointment_scheduling");
    assert_eq!(parsed["decision"]["confidence"], 0.75);
    assert_eq!(parsed["reports"][0]["status"], "produced");
    assert_eq!(parsed["reports"][1]["status"], "absent");
    assert_eq!(parsed["reports"][2]["status"], "absent");
}

#[test]
fn test_resolve_with_unreachable_services_falls_back_to_rules() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        r#"
rules:
  rules:
    - intent: refund_request
      phrases: ["refund"]
vector:
  timeout_ms: 2000
llm_classifier:
  timeout_ms: 2000
"#,
    );

    intentroot_cmd(&dir, &config)
        .args(["collection", "create", "intents", "--dims", "3"])
        .args(["--facet", "title", "--facet", "example", "--facet", "description"])
        .assert()
        .success();

    intentroot_cmd(&dir, &config)
        .args(["resolve", "I", "need", "a", "refund", "--session", "s1"])
        .args(["--response", "Sure, let me help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Intent:      refund_request"))
        .stdout(predicate::str::contains("vector  failed"))
        .stdout(predicate::str::contains("llm     failed"));
}

#[test]
fn test_resolve_without_intent_collection_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "vector:\n  enabled: true\nllm_classifier:\n  enabled: false\n",
    );

    intentroot_cmd(&dir, &config)
        .args(["resolve", "refund", "please"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Intent collection 'intents' does not exist"));
}

#[test]
fn test_resolve_untrained_allowed_by_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        r#"
rules:
  rules:
    - intent: refund_request
      phrases: ["refund"]
vector:
  allow_missing_collections: true
llm_classifier:
  enabled: false
memory:
  enabled: false
"#,
    );

    intentroot_cmd(&dir, &config)
        .args(["--format", "json", "resolve", "refund", "please"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"final_intent\": \"refund_request\""));
}
