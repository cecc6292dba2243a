//! Site rules and their persistence

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use shadowit_storage::KeyValueStore;

pub const DEFAULT_RULES_KEY: &str = "siteRules";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Substring looked for in the page URL
    #[serde(rename = "url")]
    pub url_fragment: String,
    /// Outcome when this rule is the first match
    pub blocked: bool,
}

impl Rule {
    pub fn new(url_fragment: impl Into<String>, blocked: bool) -> Self {
        Self {
            url_fragment: url_fragment.into(),
            blocked,
        }
    }

    pub fn block(url_fragment: impl Into<String>) -> Self {
        Self::new(url_fragment, true)
    }

    pub fn allow(url_fragment: impl Into<String>) -> Self {
        Self::new(url_fragment, false)
    }
}

/// Rules written on first run
pub fn default_rules() -> Vec<Rule> {
    vec![Rule::block("canva.com"), Rule::allow("figma.com")]
}

/// Read-only view of the stored rule set.
///
/// Editing rules belongs to whoever administers the store; this type only
/// seeds the defaults when nothing usable is stored.
#[derive(Clone)]
pub struct RuleStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    defaults: Vec<Rule>,
}

impl RuleStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: DEFAULT_RULES_KEY.to_string(),
            defaults: default_rules(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_defaults(mut self, defaults: Vec<Rule>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn rules_key(&self) -> &str {
        &self.key
    }

    /// Load the rules in stored order.
    ///
    /// Absent or unparsable data is replaced by the defaults, which are
    /// written back. An unreachable store yields no rules, so nothing is blocked.
    pub fn load(&self) -> Vec<Rule> {
        let raw = match self.store.get(&self.key) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Rule store unavailable, allowing all sites");
                return Vec::new();
            }
        };

        if let Some(raw) = raw {
            match serde_json::from_str::<Vec<Rule>>(&raw) {
                Ok(rules) => return rules,
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "Stored rules malformed, reseeding defaults");
                }
            }
        }

        self.seed_defaults();
        self.defaults.clone()
    }

    fn seed_defaults(&self) {
        let result = serde_json::to_string(&self.defaults)
            .map_err(shadowit_storage::StorageError::from)
            .and_then(|json| self.store.set(&self.key, &json));

        match result {
            Ok(()) => tracing::info!(key = %self.key, count = self.defaults.len(), "Seeded default rules"),
            Err(e) => tracing::warn!(key = %self.key, error = %e, "Failed to seed default rules"),
        }
    }
}
