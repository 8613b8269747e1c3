//! Adapter from a language-model verdict to a candidate

use crate::error::Result;
use crate::llm::{ClassificationContext, IntentClassifier};
use crate::types::{Candidate, Query, SignalSource};
use std::sync::Arc;
use std::time::Instant;

pub struct LlmClassifier {
    inner: Arc<dyn IntentClassifier>,
}

impl LlmClassifier {
    pub fn new(inner: Arc<dyn IntentClassifier>) -> Self {
        Self { inner }
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    pub async fn classify(
        &self,
        query: &Query,
        context: &ClassificationContext,
    ) -> Result<Option<Candidate>> {
        let start = Instant::now();
        let verdict = self.inner.classify(query, context).await?;
        Ok(verdict.map(|v| {
            Candidate::new(SignalSource::Llm, v.intent, v.confidence)
                .with_latency(start.elapsed().as_millis() as u64)
        }))
    }
}
