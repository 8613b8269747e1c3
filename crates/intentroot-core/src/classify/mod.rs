//! Intent classifiers
//!
//! Three independent signals feed the hybrid scorer:
//! - [`RuleMatcher`]: synchronous, fixed confidence
//! - [`VectorClassifier`]: embedding + nearest intent record
//! - [`LlmClassifier`]: wraps an external [`crate::llm::IntentClassifier`]
//!
//! Each classifier yields at most one [`crate::Candidate`]; how a source
//! fared on a given query is reported as a [`SignalReport`].

mod llm;
mod rule;
mod vector;

pub use llm::LlmClassifier;
pub use rule::RuleMatcher;
pub use vector::{VectorClassifier, VectorMatch};

use crate::types::SignalSource;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

/// Outcome of one source for one query
#[derive(Debug, Clone, PartialEq)]
pub enum SignalStatus {
    /// A candidate was produced
    Produced,
    /// The source had no opinion (or is disabled)
    Absent,
    TimedOut,
    Failed(String),
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Produced => "produced",
            SignalStatus::Absent => "absent",
            SignalStatus::TimedOut => "timed_out",
            SignalStatus::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStatus::Produced => f.write_str("produced"),
            SignalStatus::Absent => f.write_str("absent"),
            SignalStatus::TimedOut => f.write_str("timed out"),
            SignalStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Audit record for one source
#[derive(Debug, Clone, PartialEq)]
pub struct SignalReport {
    pub source: SignalSource,
    pub status: SignalStatus,
    pub latency_ms: u64,
}

impl Serialize for SignalReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let reason = match &self.status {
            SignalStatus::Failed(reason) => Some(reason.as_str()),
            _ => None,
        };
        let mut state = serializer.serialize_struct("SignalReport", 4)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("status", self.status.as_str())?;
        if let Some(reason) = reason {
            state.serialize_field("reason", reason)?;
        } else {
            state.skip_field("reason")?;
        }
        state.serialize_field("latency_ms", &self.latency_ms)?;
        state.end()
    }
}

impl SignalReport {
    pub fn new(source: SignalSource, status: SignalStatus, latency_ms: u64) -> Self {
        Self {
            source,
            status,
            latency_ms,
        }
    }
}
