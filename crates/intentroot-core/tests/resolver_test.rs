//! Integration tests for query resolution
//!
//! Timeouts run on a paused tokio clock, so slow doubles cost no wall time.

mod common;

use common::*;
use intentroot_core::intents::IntentSummary;
use intentroot_core::{
    CollectionRouting, Decision, IntentRegistry, IntentResolver, IntentRootError,
    IntentSnapshot, Query, SignalSource, SignalStatus, SqliteVectorIndex, VectorIndex,
    VectorSchema,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn summary(id: &str) -> IntentSummary {
    IntentSummary {
        id: id.to_string(),
        title: None,
        description: None,
        domain: None,
    }
}

#[tokio::test]
async fn test_rule_only_resolution() {
    let config = rules_only(vec![rule("appointment_scheduling", &["book appointment"])]);
    let resolver = IntentResolver::new(Arc::new(config)).unwrap();

    let resolution = resolver
        .resolve(&Query::new("Please book appointment for Monday", "s1"))
        .await;

    let d = &resolution.decision;
    assert_eq!(d.final_intent.as_deref(), Some("appointment_scheduling"));
    assert!((d.confidence - 0.75).abs() < 1e-9);
    assert_eq!(resolution.reports.len(), 3);
    assert_eq!(
        resolution.report(SignalSource::Rule).unwrap().status,
        SignalStatus::Produced
    );
    assert_eq!(
        resolution.report(SignalSource::Vector).unwrap().status,
        SignalStatus::Absent
    );
    assert_eq!(
        resolution.report(SignalSource::Llm).unwrap().status,
        SignalStatus::Absent
    );
}

#[tokio::test]
async fn test_nothing_matches_is_unresolved() {
    let config = rules_only(vec![rule("refund_request", &["refund"])]);
    let resolver = IntentResolver::new(Arc::new(config)).unwrap();

    let resolution = resolver.resolve(&Query::new("hello there", "s1")).await;
    assert!(!resolution.decision.is_resolved());
    assert_eq!(resolution.decision.confidence, 0.0);
    assert!(resolution.decision.contributing_candidates.is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = rules_only(Vec::new());
    config.scoring.source_weights.llm = -0.5;

    let err = IntentResolver::new(Arc::new(config)).err().unwrap();
    assert!(matches!(err, IntentRootError::Config(_)));
}

#[tokio::test]
async fn test_missing_intent_collection_fails_startup_check() {
    let mut config = rules_only(Vec::new());
    config.vector.enabled = true;
    config.routing = CollectionRouting::PerAgent {
        prefix: "intents_".to_string(),
        default_agent: "general".to_string(),
    };

    let index = Arc::new(SqliteVectorIndex::in_memory().unwrap());
    let resolver = IntentResolver::new(Arc::new(config))
        .unwrap()
        .with_services(Arc::new(KeywordEmbedder::new()), index.clone());

    let err = resolver.check_collections(Some("billing")).await.unwrap_err();
    match err {
        IntentRootError::Config(msg) => assert!(msg.contains("intents_billing")),
        other => panic!("unexpected error {:?}", other),
    }

    let schema = VectorSchema::new(DIMS, ["title", "example", "description"]);
    index.create_collection("intents_billing", &schema).await.unwrap();
    let err = resolver.check_collections(Some("billing")).await.unwrap_err();
    assert!(err.to_string().contains("intents_general"));

    index.create_collection("intents_general", &schema).await.unwrap();
    resolver.check_collections(Some("billing")).await.unwrap();
}

#[tokio::test]
async fn test_collection_check_skipped_when_allowed_or_disabled() {
    let index = Arc::new(SqliteVectorIndex::in_memory().unwrap());

    let mut allowed = rules_only(Vec::new());
    allowed.vector.enabled = true;
    allowed.vector.allow_missing_collections = true;
    let resolver = IntentResolver::new(Arc::new(allowed))
        .unwrap()
        .with_services(Arc::new(KeywordEmbedder::new()), index.clone());
    resolver.check_collections(None).await.unwrap();

    // Untrained but allowed: the vector source reports no opinion
    let resolution = resolver.resolve(&Query::new("anything", "s1")).await;
    assert_eq!(
        resolution.report(SignalSource::Vector).unwrap().status,
        SignalStatus::Absent
    );

    let resolver = IntentResolver::new(Arc::new(rules_only(Vec::new())))
        .unwrap()
        .with_services(Arc::new(KeywordEmbedder::new()), index);
    resolver.check_collections(None).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_llm_timeout_becomes_absent() {
    let mut config = rules_only(vec![rule("refund_request", &["refund"])]);
    config.llm_classifier.enabled = true;
    config.llm_classifier.timeout_ms = 1000;

    let slow = FixedClassifier::new("complaint", 0.99).with_delay(Duration::from_secs(30));
    let resolver = IntentResolver::new(Arc::new(config))
        .unwrap()
        .with_llm(Arc::new(slow));

    let resolution = resolver
        .resolve(&Query::new("I want a refund", "s1"))
        .await;

    assert_eq!(
        resolution.decision.final_intent.as_deref(),
        Some("refund_request")
    );
    let llm = resolution.report(SignalSource::Llm).unwrap();
    assert_eq!(llm.status, SignalStatus::TimedOut);
    assert!(llm.latency_ms >= 1000 && llm.latency_ms < 30_000);
    assert_eq!(resolver.counters().snapshot(SignalSource::Llm).timed_out, 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_vector_does_not_hold_back_llm() {
    let mut config = rules_only(Vec::new());
    config.vector.enabled = true;
    config.vector.timeout_ms = 200;
    config.llm_classifier.enabled = true;

    let index = Arc::new(SqliteVectorIndex::in_memory().unwrap());
    let resolver = IntentResolver::new(Arc::new(config))
        .unwrap()
        .with_services(Arc::new(SlowEmbedder(Duration::from_secs(10))), index)
        .with_llm(Arc::new(FixedClassifier::new("order_management", 0.91)));

    let resolution = resolver
        .resolve(&Query::new("where is my parcel", "s1"))
        .await;

    assert_eq!(
        resolution.report(SignalSource::Vector).unwrap().status,
        SignalStatus::TimedOut
    );
    let d = &resolution.decision;
    assert_eq!(d.final_intent.as_deref(), Some("order_management"));
    assert!((d.confidence - 0.91).abs() < 1e-9);
}

#[tokio::test]
async fn test_failing_llm_is_contained() {
    let mut config = rules_only(vec![rule("refund_request", &["refund"])]);
    config.llm_classifier.enabled = true;

    let resolver = IntentResolver::new(Arc::new(config))
        .unwrap()
        .with_llm(Arc::new(FailingClassifier));

    for _ in 0..3 {
        let resolution = resolver
            .resolve(&Query::new("refund please", "s1"))
            .await;
        assert_eq!(
            resolution.decision.final_intent.as_deref(),
            Some("refund_request")
        );
        match resolution.report(SignalSource::Llm).unwrap().status {
            SignalStatus::Failed(ref reason) => assert!(reason.contains("connection refused")),
            ref other => panic!("unexpected status {:?}", other),
        }
    }

    let counters = resolver.counters().snapshot(SignalSource::Llm);
    assert_eq!(counters.failed, 3);
    assert_eq!(counters.produced, 0);
    assert_eq!(resolver.counters().snapshot(SignalSource::Rule).produced, 3);
}

#[tokio::test]
async fn test_llm_no_opinion_is_absent() {
    let mut config = rules_only(Vec::new());
    config.llm_classifier.enabled = true;

    let resolver = IntentResolver::new(Arc::new(config))
        .unwrap()
        .with_llm(Arc::new(FixedClassifier::no_opinion()));

    let resolution = resolver.resolve(&Query::new("hmm", "s1")).await;
    assert!(!resolution.decision.is_resolved());
    assert_eq!(
        resolution.report(SignalSource::Llm).unwrap().status,
        SignalStatus::Absent
    );
}

#[tokio::test]
async fn test_llm_sees_registry_and_prior_decision() {
    let mut config = rules_only(Vec::new());
    config.llm_classifier.enabled = true;

    let classifier = Arc::new(FixedClassifier::new("order_status", 0.8));
    let registry = Arc::new(IntentRegistry::with_snapshot(IntentSnapshot::new(vec![
        summary("order_status"),
        summary("refund_request"),
    ])));
    let resolver = IntentResolver::new(Arc::new(config))
        .unwrap()
        .with_llm(classifier.clone())
        .with_registry(registry);

    let first = resolver
        .resolve(&Query::new("where is my order", "s1"))
        .await;
    let prior: Decision = first.decision;
    resolver
        .resolve_with_prior(&Query::new("and the other one?", "s1"), Some(&prior))
        .await;

    let seen = classifier.last_seen().unwrap();
    assert_eq!(seen.known_intents, vec!["order_status", "refund_request"]);
    assert_eq!(seen.prior_intent.as_deref(), Some("order_status"));
    assert!(seen.episodes.is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let config = rules_only(vec![rule("refund_request", &["refund"])]);
    let resolver = IntentResolver::new(Arc::new(config)).unwrap();

    let token = CancellationToken::new();
    token.cancel();

    let result = resolver
        .resolve_cancellable(&Query::new("refund", "s1"), &token)
        .await;
    assert!(matches!(result, Err(IntentRootError::Cancelled)));
    assert_eq!(resolver.counters().snapshot(SignalSource::Rule).produced, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_while_waiting_on_llm() {
    let mut config = rules_only(Vec::new());
    config.llm_classifier.enabled = true;
    config.llm_classifier.timeout_ms = 60_000;

    let slow = FixedClassifier::new("complaint", 0.9).with_delay(Duration::from_secs(30));
    let resolver = IntentResolver::new(Arc::new(config))
        .unwrap()
        .with_llm(Arc::new(slow));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let result = resolver
        .resolve_cancellable(&Query::new("this is taking forever", "s1"), &token)
        .await;
    assert!(matches!(result, Err(IntentRootError::Cancelled)));
}

#[tokio::test]
async fn test_uncancelled_token_resolves_normally() {
    let config = rules_only(vec![rule("refund_request", &["refund"])]);
    let resolver = IntentResolver::new(Arc::new(config)).unwrap();

    let resolution = resolver
        .resolve_cancellable(&Query::new("refund", "s1"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        resolution.decision.final_intent.as_deref(),
        Some("refund_request")
    );
}

#[tokio::test]
async fn test_concurrent_queries_share_resolver() {
    let mut config = rules_only(vec![
        rule("refund_request", &["refund"]),
        rule("order_status", &["where is my order"]),
    ]);
    config.llm_classifier.enabled = true;

    let resolver = Arc::new(
        IntentResolver::new(Arc::new(config))
            .unwrap()
            .with_llm(Arc::new(FixedClassifier::new("refund_request", 0.6))),
    );

    let mut handles = Vec::new();
    for i in 0..16 {
        let resolver = Arc::clone(&resolver);
        handles.push(tokio::spawn(async move {
            let text = if i % 2 == 0 { "refund now" } else { "where is my order" };
            resolver
                .resolve(&Query::new(text, format!("s{}", i)))
                .await
                .decision
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let decision = handle.await.unwrap();
        if i % 2 == 0 {
            assert_eq!(decision.final_intent.as_deref(), Some("refund_request"));
        } else {
            // rule 0.6 * 0.75 = 0.45 against llm 1.2 * 0.6 = 0.72
            assert_eq!(decision.final_intent.as_deref(), Some("refund_request"));
            assert_eq!(decision.contributing_candidates.len(), 2);
        }
    }
    assert_eq!(resolver.counters().snapshot(SignalSource::Llm).produced, 16);
}
