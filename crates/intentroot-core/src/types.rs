//! Core data model
//!
//! Queries flow in, classifiers emit [`Candidate`]s, the hybrid scorer turns
//! them into exactly one [`Decision`]. [`IntentRecord`]s and
//! [`EpisodicEntry`]s are what lives in the vector store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Facet name for an intent's short title
pub const FACET_TITLE: &str = "title";
/// Facet name for an intent's example phrasings
pub const FACET_EXAMPLE: &str = "example";
/// Facet name for an intent's long-form description
pub const FACET_DESCRIPTION: &str = "description";
/// Single facet used by episodic memory collections
pub const FACET_CONTENT: &str = "content";

/// Arbitrary JSON metadata attached to a stored point
pub type Payload = BTreeMap<String, serde_json::Value>;

/// Which classifier produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Rule,
    Vector,
    Llm,
}

impl SignalSource {
    pub const ALL: [SignalSource; 3] = [SignalSource::Rule, SignalSource::Vector, SignalSource::Llm];

    /// Fixed trust ordering used for tie-breaks: llm > vector > rule
    pub fn trust_rank(self) -> u8 {
        match self {
            SignalSource::Rule => 0,
            SignalSource::Vector => 1,
            SignalSource::Llm => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalSource::Rule => "rule",
            SignalSource::Vector => "vector",
            SignalSource::Llm => "llm",
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user query. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub received_at: DateTime<Utc>,
    /// Opaque conversation/session identifier
    pub session_id: String,
    /// Agent or domain hint used for collection routing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            received_at: Utc::now(),
            session_id: session_id.into(),
            agent: None,
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }
}

/// One classifier's proposed intent for a single query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub source: SignalSource,
    pub intent_label: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    #[serde(default)]
    pub latency_ms: u64,
}

impl Candidate {
    /// Build a candidate, clamping confidence into [0, 1] (NaN becomes 0)
    pub fn new(source: SignalSource, intent_label: impl Into<String>, confidence: f64) -> Self {
        Self {
            source,
            intent_label: intent_label.into(),
            confidence: clamp_unit(confidence),
            latency_ms: 0,
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Check a candidate that did not come through [`Candidate::new`]
    pub fn validate(&self) -> crate::Result<()> {
        if self.intent_label.trim().is_empty() {
            return Err(crate::Error::InvalidInput(format!(
                "{} candidate has an empty intent label",
                self.source
            )));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(crate::Error::InvalidInput(format!(
                "{} candidate confidence {} is outside [0, 1]",
                self.source, self.confidence
            )));
        }
        Ok(())
    }
}

/// The single outcome of resolving one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// `None` is the explicit "unresolved" state
    pub final_intent: Option<String>,
    pub confidence: f64,
    /// Every candidate, ordered by descending individual confidence
    pub contributing_candidates: Vec<Candidate>,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub fn unresolved(decided_at: DateTime<Utc>) -> Self {
        Self {
            final_intent: None,
            confidence: 0.0,
            contributing_candidates: Vec::new(),
            decided_at,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.final_intent.is_some()
    }
}

/// Stored representation of a known intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    pub id: String,
    /// Facet name -> embedding
    pub vectors: BTreeMap<String, Vec<f32>>,
    /// domain, category, tags, ...
    #[serde(default)]
    pub metadata: Payload,
}

impl IntentRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vectors: BTreeMap::new(),
            metadata: Payload::new(),
        }
    }

    pub fn with_facet(mut self, facet: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(facet.into(), vector);
        self
    }

    pub fn domain(&self) -> Option<&str> {
        self.metadata.get("domain").and_then(|v| v.as_str())
    }
}

/// Speaker of an episodic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A past utterance kept for contextual recall. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodicEntry {
    pub role: Role,
    pub text: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    /// Intent the interaction was resolved to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl EpisodicEntry {
    /// Deterministic point id: same session, role, timestamp and text map to the same id
    pub fn point_id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.session_id.as_bytes());
        hasher.update(self.role.as_str().as_bytes());
        hasher.update(self.timestamp.to_rfc3339().as_bytes());
        hasher.update(self.text.as_bytes());
        format!("ep-{}", &hasher.finalize().to_hex()[..24])
    }

    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("role".into(), self.role.as_str().into());
        payload.insert("text".into(), self.text.clone().into());
        payload.insert("session_id".into(), self.session_id.clone().into());
        payload.insert("timestamp".into(), self.timestamp.to_rfc3339().into());
        if let Some(ref intent) = self.intent {
            payload.insert("intent".into(), intent.clone().into());
        }
        payload
    }

    /// Rebuild an entry from a stored payload (embedding is not restored)
    pub fn from_payload(payload: &Payload) -> Option<Self> {
        let role = match payload.get("role")?.as_str()? {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => return None,
        };
        let timestamp = DateTime::parse_from_rfc3339(payload.get("timestamp")?.as_str()?)
            .ok()?
            .with_timezone(&Utc);
        Some(Self {
            role,
            text: payload.get("text")?.as_str()?.to_string(),
            embedding: Vec::new(),
            timestamp,
            session_id: payload.get("session_id")?.as_str()?.to_string(),
            intent: payload
                .get("intent")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
