//! Query resolution
//!
//! Fans a query out to the three classifiers, bounds each external call by
//! its own timeout, turns every per-source failure into an absent signal,
//! and hands the surviving candidates to the [`HybridScorer`].

use crate::classify::{LlmClassifier, RuleMatcher, SignalReport, SignalStatus, VectorClassifier};
use crate::config::Config;
use crate::error::{IntentRootError, Result};
use crate::index::VectorIndex;
use crate::intents::IntentRegistry;
use crate::llm::{ClassificationContext, Embedder, IntentClassifier};
use crate::memory::{recall, MemoryWriter};
use crate::scorer::{GroupScore, HybridScorer};
use crate::types::{Candidate, Decision, EpisodicEntry, Query, SignalSource};
use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Decision plus how every source fared
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub decision: Decision,
    /// Always one report per source, in rule, vector, llm order
    pub reports: Vec<SignalReport>,
    pub groups: Vec<GroupScore>,
}

impl Resolution {
    pub fn report(&self, source: SignalSource) -> Option<&SignalReport> {
        self.reports.iter().find(|r| r.source == source)
    }
}

#[derive(Debug, Default)]
struct SourceCounters {
    produced: AtomicU64,
    absent: AtomicU64,
    timed_out: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of one source's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub produced: u64,
    pub absent: u64,
    pub timed_out: u64,
    pub failed: u64,
}

/// Per-source outcome counters for callers that trip circuit breakers
#[derive(Debug, Default)]
pub struct SignalCounters {
    rule: SourceCounters,
    vector: SourceCounters,
    llm: SourceCounters,
}

impl SignalCounters {
    fn get(&self, source: SignalSource) -> &SourceCounters {
        match source {
            SignalSource::Rule => &self.rule,
            SignalSource::Vector => &self.vector,
            SignalSource::Llm => &self.llm,
        }
    }

    fn record(&self, source: SignalSource, status: &SignalStatus) {
        let c = self.get(source);
        let counter = match status {
            SignalStatus::Produced => &c.produced,
            SignalStatus::Absent => &c.absent,
            SignalStatus::TimedOut => &c.timed_out,
            SignalStatus::Failed(_) => &c.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, source: SignalSource) -> CounterSnapshot {
        let c = self.get(source);
        CounterSnapshot {
            produced: c.produced.load(Ordering::Relaxed),
            absent: c.absent.load(Ordering::Relaxed),
            timed_out: c.timed_out.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
        }
    }
}

struct RecallSource {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

/// Orchestrates classifiers, scorer and memory for one deployment
pub struct IntentResolver {
    config: Arc<Config>,
    rules: RuleMatcher,
    vector: Option<VectorClassifier>,
    llm: Option<LlmClassifier>,
    scorer: HybridScorer,
    registry: Arc<IntentRegistry>,
    memory: Option<MemoryWriter>,
    recall: Option<RecallSource>,
    counters: Arc<SignalCounters>,
}

impl IntentResolver {
    /// Rule-only resolver; fails on an invalid configuration
    pub fn new(config: Arc<Config>) -> Result<Self> {
        config.validate()?;
        let rules = RuleMatcher::new(&config.rules)?;
        let scorer = HybridScorer::new(&config.scoring);
        Ok(Self {
            config,
            rules,
            vector: None,
            llm: None,
            scorer,
            registry: Arc::new(IntentRegistry::new()),
            memory: None,
            recall: None,
            counters: Arc::new(SignalCounters::default()),
        })
    }

    /// Attach embedding and index clients: enables the vector classifier,
    /// the memory writer and episodic recall as configured
    pub fn with_services(mut self, embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        if self.config.vector.enabled {
            self.vector = Some(VectorClassifier::new(
                Arc::clone(&embedder),
                Arc::clone(&index),
                self.config.routing.clone(),
                self.config.vector.clone(),
            ));
        }
        if self.config.memory.enabled {
            self.memory = Some(MemoryWriter::new(
                Arc::clone(&embedder),
                Arc::clone(&index),
                self.config.memory.collection.clone(),
            ));
            self.recall = Some(RecallSource { index, embedder });
        }
        self
    }

    pub fn with_llm(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        if self.config.llm_classifier.enabled {
            self.llm = Some(LlmClassifier::new(classifier));
        }
        self
    }

    pub fn with_registry(mut self, registry: Arc<IntentRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Startup check that the vector source has somewhere to search;
    /// passes when the vector source is off
    pub async fn check_collections<'a>(
        &self,
        agents: impl IntoIterator<Item = &'a str>,
    ) -> Result<()> {
        match self.vector {
            Some(ref vector) => vector.check_collections(agents).await,
            None => Ok(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<IntentRegistry> {
        &self.registry
    }

    pub fn counters(&self) -> &SignalCounters {
        &self.counters
    }

    pub fn scorer(&self) -> &HybridScorer {
        &self.scorer
    }

    pub async fn resolve(&self, query: &Query) -> Resolution {
        self.resolve_with_prior(query, None).await
    }

    /// Resolve with the previous turn's decision as LLM context
    pub async fn resolve_with_prior(&self, query: &Query, prior: Option<&Decision>) -> Resolution {
        let rule_start = Instant::now();
        let rule = self.rules.classify(&query.text);
        let rule_outcome = self.finish(
            SignalSource::Rule,
            Ok(rule),
            rule_start.elapsed().as_millis() as u64,
        );

        let (vector_outcome, llm_outcome) =
            tokio::join!(self.run_vector(query), self.run_llm(query, prior));

        let mut candidates = Vec::with_capacity(3);
        let mut reports = Vec::with_capacity(3);
        for (candidate, report) in [rule_outcome, vector_outcome, llm_outcome] {
            candidates.extend(candidate);
            reports.push(report);
        }

        let scored = self.scorer.score_detailed(&candidates, Utc::now());
        tracing::info!(
            session = %query.session_id,
            intent = scored.decision.final_intent.as_deref().unwrap_or("<unresolved>"),
            confidence = scored.decision.confidence,
            candidates = candidates.len(),
            "Query resolved"
        );

        Resolution {
            decision: scored.decision,
            reports,
            groups: scored.groups,
        }
    }

    /// Like [`resolve`](Self::resolve), but gives up with `Cancelled` if the
    /// token fires before scoring; in-flight classifier calls are dropped
    pub async fn resolve_cancellable(
        &self,
        query: &Query,
        token: &CancellationToken,
    ) -> Result<Resolution> {
        if token.is_cancelled() {
            return Err(IntentRootError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(session = %query.session_id, "Resolution cancelled");
                Err(IntentRootError::Cancelled)
            }
            resolution = self.resolve(query) => Ok(resolution),
        }
    }

    /// Hand the interaction to the memory writer; `None` when memory is off
    pub fn record(
        &self,
        query: &Query,
        decision: &Decision,
        response: Option<&str>,
    ) -> Option<JoinHandle<usize>> {
        self.memory
            .as_ref()
            .map(|writer| writer.record(query, decision, response))
    }

    async fn run_vector(&self, query: &Query) -> (Option<Candidate>, SignalReport) {
        match self.vector {
            Some(ref vector) => {
                self.guarded(
                    SignalSource::Vector,
                    self.config.vector.timeout(),
                    vector.classify(query),
                )
                .await
            }
            None => self.finish(SignalSource::Vector, Ok(None), 0),
        }
    }

    async fn run_llm(
        &self,
        query: &Query,
        prior: Option<&Decision>,
    ) -> (Option<Candidate>, SignalReport) {
        let llm = match self.llm {
            Some(ref llm) => llm,
            None => return self.finish(SignalSource::Llm, Ok(None), 0),
        };

        let work = async {
            let context = ClassificationContext {
                known_intents: self.registry.snapshot(),
                episodes: self.recall_episodes(query).await,
                prior_decision: prior.cloned(),
            };
            llm.classify(query, &context).await
        };
        self.guarded(SignalSource::Llm, self.config.llm_classifier.timeout(), work)
            .await
    }

    async fn recall_episodes(&self, query: &Query) -> Vec<EpisodicEntry> {
        let depth = self.config.llm_classifier.recall_depth;
        let source = match self.recall {
            Some(ref source) if depth > 0 => source,
            _ => return Vec::new(),
        };

        match recall(
            source.index.as_ref(),
            source.embedder.as_ref(),
            &self.config.memory.collection,
            &query.session_id,
            &query.text,
            depth,
        )
        .await
        {
            Ok(recalled) => recalled.into_iter().map(|r| r.entry).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Episodic recall failed; classifying without context");
                Vec::new()
            }
        }
    }

    async fn guarded<F>(
        &self,
        source: SignalSource,
        budget: Duration,
        work: F,
    ) -> (Option<Candidate>, SignalReport)
    where
        F: Future<Output = Result<Option<Candidate>>>,
    {
        let start = Instant::now();
        let outcome = match tokio::time::timeout(budget, work).await {
            Ok(result) => result,
            Err(_) => Err(IntentRootError::Timeout {
                service: source.to_string(),
                elapsed_ms: budget.as_millis() as u64,
            }),
        };
        self.finish(source, outcome, start.elapsed().as_millis() as u64)
    }

    fn finish(
        &self,
        source: SignalSource,
        outcome: Result<Option<Candidate>>,
        latency_ms: u64,
    ) -> (Option<Candidate>, SignalReport) {
        let (candidate, status) = match outcome {
            Ok(Some(candidate)) => {
                tracing::debug!(
                    source = %source,
                    intent = %candidate.intent_label,
                    confidence = candidate.confidence,
                    latency_ms,
                    "Signal produced"
                );
                (Some(candidate.with_latency(latency_ms)), SignalStatus::Produced)
            }
            Ok(None) => {
                tracing::debug!(source = %source, latency_ms, "Signal absent");
                (None, SignalStatus::Absent)
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(source = %source, latency_ms, "Signal timed out");
                (None, SignalStatus::TimedOut)
            }
            Err(e) => {
                tracing::error!(source = %source, error = %e, "Signal failed");
                (None, SignalStatus::Failed(e.to_string()))
            }
        };

        self.counters.record(source, &status);
        (candidate, SignalReport::new(source, status, latency_ms))
    }
}
