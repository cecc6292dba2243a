//! Shadowit Storage Layer
//!
//! Rules and access requests live as serialized strings under fixed keys.
//! The policy layer only sees the [`KeyValueStore`] trait; the SQLite
//! [`Database`] and the in-process [`MemoryStore`] are the two engines.

mod database;
mod error;
mod memory;
mod migrations;
mod store;

pub use database::Database;
pub use error::StorageError;
pub use memory::MemoryStore;
pub use store::KeyValueStore;

pub type Result<T> = std::result::Result<T, StorageError>;
