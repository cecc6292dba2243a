//! In-process store
//!
//! Mirrors a browser's page-local storage: values live as long as the
//! process. Also used as the test double for storage faults.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StorageError;
use crate::store::KeyValueStore;
use crate::Result;

#[derive(Clone)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
    available: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
            available: true,
        }
    }

    /// A store whose every read and write fails
    pub fn unavailable() -> Self {
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
            available: false,
        }
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values.write().insert(key.to_string(), value.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory store disabled".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_available()?;
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
