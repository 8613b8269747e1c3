//! Intent definitions loaded from YAML

use crate::error::{IntentRootError, Result};
use crate::types::Payload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// One intent as an operator writes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl IntentDefinition {
    /// Payload stored alongside the record's vectors
    pub fn metadata(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("intent".into(), self.id.clone().into());
        if let Some(ref title) = self.title {
            payload.insert("title".into(), title.clone().into());
        }
        if let Some(ref description) = self.description {
            payload.insert("description".into(), description.clone().into());
        }
        if let Some(ref domain) = self.domain {
            payload.insert("domain".into(), domain.clone().into());
        }
        if let Some(ref category) = self.category {
            payload.insert("category".into(), category.clone().into());
        }
        if !self.tags.is_empty() {
            payload.insert("tags".into(), self.tags.clone().into());
        }
        payload
    }
}

/// A set of intent definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentCatalog {
    pub intents: Vec<IntentDefinition>,
}

impl IntentCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let catalog: IntentCatalog = serde_yaml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Ids must be unique and every intent needs something to embed
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for def in &self.intents {
            if def.id.trim().is_empty() {
                return Err(IntentRootError::InvalidInput(
                    "Intent with empty id in catalog".to_string(),
                ));
            }
            if !seen.insert(def.id.as_str()) {
                return Err(IntentRootError::InvalidInput(format!(
                    "Duplicate intent id in catalog: {}",
                    def.id
                )));
            }
            let has_text = def.title.as_deref().is_some_and(|t| !t.trim().is_empty())
                || def.description.as_deref().is_some_and(|d| !d.trim().is_empty())
                || def.examples.iter().any(|e| !e.trim().is_empty());
            if !has_text {
                return Err(IntentRootError::InvalidInput(format!(
                    "Intent {} has no title, description or examples",
                    def.id
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Definitions an agent is trained on: its own domain plus domain-less
    /// ones. Without an agent, every definition.
    pub fn for_agent<'a>(
        &'a self,
        agent: Option<&'a str>,
    ) -> impl Iterator<Item = &'a IntentDefinition> + 'a {
        self.intents.iter().filter(move |d| match (agent, d.domain.as_deref()) {
            (Some(want), Some(domain)) => domain == want,
            _ => true,
        })
    }
}
