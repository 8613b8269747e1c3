//! Collection routing
//!
//! Intent records either share one collection and are told apart by a
//! payload field, or each agent gets its own collection.

use crate::error::{IntentRootError, Result};
use crate::index::MetadataFilter;
use serde::{Deserialize, Serialize};

/// Collection-routing scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CollectionRouting {
    /// One collection, restricted by `filter_key == agent`
    Shared {
        collection: String,
        #[serde(default = "default_filter_key")]
        filter_key: String,
    },
    /// One collection per agent: `<prefix><agent>`
    PerAgent {
        prefix: String,
        /// Collection used when a query carries no agent
        default_agent: String,
    },
}

fn default_filter_key() -> String {
    "domain".to_string()
}

impl Default for CollectionRouting {
    fn default() -> Self {
        CollectionRouting::Shared {
            collection: "intents".to_string(),
            filter_key: default_filter_key(),
        }
    }
}

/// Where a lookup for one agent should go
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTarget {
    pub collection: String,
    pub filter: Option<MetadataFilter>,
}

impl CollectionRouting {
    /// Resolve the collection and filter for an agent
    pub fn route(&self, agent: Option<&str>) -> RouteTarget {
        match self {
            CollectionRouting::Shared {
                collection,
                filter_key,
            } => RouteTarget {
                collection: collection.clone(),
                filter: agent.map(|a| MetadataFilter::new().must_eq(filter_key, a)),
            },
            CollectionRouting::PerAgent {
                prefix,
                default_agent,
            } => RouteTarget {
                collection: format!("{}{}", prefix, agent.unwrap_or(default_agent)),
                filter: None,
            },
        }
    }

    /// Every collection name this scheme can produce for the given agents
    pub fn collections_for<'a>(&self, agents: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut names: Vec<String> = match self {
            CollectionRouting::Shared { collection, .. } => vec![collection.clone()],
            CollectionRouting::PerAgent { .. } => agents
                .into_iter()
                .map(|a| self.route(Some(a)).collection)
                .chain(std::iter::once(self.route(None).collection))
                .collect(),
        };
        names.sort();
        names.dedup();
        names
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            CollectionRouting::Shared {
                collection,
                filter_key,
            } => {
                if collection.trim().is_empty() || filter_key.trim().is_empty() {
                    return Err(IntentRootError::Config(
                        "routing.collection and routing.filter_key must not be empty".into(),
                    ));
                }
            }
            CollectionRouting::PerAgent { default_agent, .. } => {
                if default_agent.trim().is_empty() {
                    return Err(IntentRootError::Config(
                        "routing.default_agent must not be empty".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_routing_adds_filter() {
        let routing = CollectionRouting::default();
        let target = routing.route(Some("billing"));
        assert_eq!(target.collection, "intents");
        assert_eq!(
            target.filter,
            Some(MetadataFilter::new().must_eq("domain", "billing"))
        );
        assert!(routing.route(None).filter.is_none());
    }

    #[test]
    fn test_per_agent_routing() {
        let routing = CollectionRouting::PerAgent {
            prefix: "intents_".into(),
            default_agent: "general".into(),
        };
        assert_eq!(routing.route(Some("billing")).collection, "intents_billing");
        assert_eq!(routing.route(None).collection, "intents_general");
        assert!(routing.route(Some("billing")).filter.is_none());
        assert_eq!(
            routing.collections_for(["billing", "support"]),
            vec!["intents_billing", "intents_general", "intents_support"]
        );
    }

    #[test]
    fn test_routing_yaml() {
        let routing: CollectionRouting =
            serde_yaml::from_str("mode: per_agent\nprefix: agent_\ndefault_agent: main\n").unwrap();
        assert_eq!(routing.route(None).collection, "agent_main");
    }
}
