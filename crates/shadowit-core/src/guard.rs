//! Site access guard
//!
//! Owns the shared store and hands each page view its own controller with
//! rules, ledger and URL injected.

use std::sync::Arc;

use shadowit_enforcement::{EnforcementController, PresentationSurface};
use shadowit_policy::{RequestLedger, RequestedSites, Rule, RuleStore};
use shadowit_storage::{Database, KeyValueStore, MemoryStore};

use crate::config::Config;
use crate::inspector::{TabQuery, UrlInspector};
use crate::Result;

pub struct Guard {
    config: Config,
    rules: RuleStore,
    ledger: RequestLedger,
}

impl Guard {
    /// Open the SQLite store named by the config
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        tracing::info!(path = %config.database_path.display(), "Opened rule database");

        Ok(Self::with_store(config, Arc::new(db)))
    }

    /// Like [`Guard::open`], but an unusable database degrades to an
    /// in-process store instead of failing
    pub fn open_or_in_memory(config: Config) -> Self {
        match Self::open(config.clone()) {
            Ok(guard) => guard,
            Err(e) => {
                tracing::warn!(error = %e, "Rule database unavailable, using in-memory store");
                Self::in_memory(config)
            }
        }
    }

    pub fn in_memory(config: Config) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: Config, store: Arc<dyn KeyValueStore>) -> Self {
        let rules = RuleStore::new(Arc::clone(&store))
            .with_key(config.rules_key.clone())
            .with_defaults(config.default_rules.clone());
        let ledger = RequestLedger::new(store).with_key(config.requests_key.clone());

        Self {
            config,
            rules,
            ledger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.rules.load()
    }

    pub fn requested_sites(&self) -> RequestedSites {
        self.ledger.load()
    }

    /// Start a page view. The caller runs `evaluate_page` once the page loads.
    pub fn page_view(
        &self,
        url: impl Into<String>,
        surface: Arc<dyn PresentationSurface>,
    ) -> EnforcementController {
        let controller = EnforcementController::new(
            url,
            self.rules.clone(),
            self.ledger.clone(),
            surface,
            self.config.enforcement_settings(),
        );

        tracing::debug!(
            page_view = %controller.page_view_id(),
            url = %controller.page_url(),
            "Page view opened"
        );

        controller
    }

    pub fn inspector(&self, tabs: Arc<dyn TabQuery>) -> UrlInspector {
        UrlInspector::new(tabs, self.config.popper_timeout())
    }
}
