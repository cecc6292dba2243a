//! The key-value abstraction shared by every page view.

use crate::Result;

/// A flat string-to-string store.
///
/// There is no transactional guarantee across keys or across callers. When two
/// page views write the same key, the last write wins and nothing is merged.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` when nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
