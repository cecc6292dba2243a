//! Access-request ledger
//!
//! Records which sites the user asked temporary access for. Granting or
//! expiring those requests happens elsewhere; entries are never removed here.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use shadowit_storage::KeyValueStore;

pub const DEFAULT_REQUESTS_KEY: &str = "requestedAccess";

/// Distinct site fragments in the order they were first requested.
///
/// Stored as a JSON array; duplicates in stored data collapse on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RequestedSites {
    sites: Vec<String>,
}

impl RequestedSites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the site was already present
    pub fn insert(&mut self, site: &str) -> bool {
        if self.contains(site) {
            return false;
        }
        self.sites.push(site.to_string());
        true
    }

    pub fn contains(&self, site: &str) -> bool {
        self.sites.iter().any(|s| s == site)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for RequestedSites {
    fn from(sites: Vec<String>) -> Self {
        let mut set = RequestedSites::new();
        for site in &sites {
            set.insert(site);
        }
        set
    }
}

impl From<RequestedSites> for Vec<String> {
    fn from(set: RequestedSites) -> Self {
        set.sites
    }
}

#[derive(Clone)]
pub struct RequestLedger {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl RequestLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: DEFAULT_REQUESTS_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Current requests; absent, malformed or unreachable data reads as empty
    pub fn load(&self) -> RequestedSites {
        match self.store.get(&self.key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(key = %self.key, error = %e, "Stored requests malformed, treating as empty");
                RequestedSites::new()
            }),
            Ok(None) => RequestedSites::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Request ledger unavailable, treating as empty");
                RequestedSites::new()
            }
        }
    }

    pub fn contains(&self, site: &str) -> bool {
        self.load().contains(site)
    }

    /// Record a request for `site` and return the updated set.
    ///
    /// A site already present is not written again. A failed write is logged
    /// and the in-memory result is still returned.
    pub fn add(&self, site: &str) -> RequestedSites {
        let mut sites = self.load();

        if sites.insert(site) {
            let result = serde_json::to_string(&sites)
                .map_err(shadowit_storage::StorageError::from)
                .and_then(|json| self.store.set(&self.key, &json));

            if let Err(e) = result {
                tracing::warn!(key = %self.key, site = %site, error = %e, "Failed to persist access request");
            }
        }

        tracing::info!(site = %site, requested = sites.len(), "Access requested");

        sites
    }
}
