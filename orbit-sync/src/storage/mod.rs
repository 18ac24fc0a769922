//! Durable storage for button configurations.
//!
//! - [`rocks`]: RocksDB store with LZ4-compressed JSON records
//! - [`memory`]: in-process map for tests and ephemeral runs
//!
//! Both implement [`ConfigStore`]. The store is the single source of truth;
//! only [`StateSynchronizer`](crate::StateSynchronizer) writes to it.

pub mod memory;
pub mod rocks;

use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ButtonConfig;

pub use memory::MemoryConfigStore;
pub use rocks::{ButtonMetadata, RocksConfigStore, StoreConfig};

/// Storage errors. Never retried by the store itself.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// RocksDB internal error
    #[error("Database error: {0}")]
    Database(String),
    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Key-value map of button id to configuration record.
///
/// `put` replaces the whole record for its id and must be atomic with
/// respect to concurrent `put`/`get_all`: readers never see a partially
/// written record.
///
/// Implementations must accept concurrent `put` calls from several threads.
/// The synchronizer's write gate only fixes the order of writes; it is not
/// what keeps a store consistent. Any per-record bookkeeping (such as
/// [`ButtonMetadata::revision`]) is the store's own job to keep exact.
pub trait ConfigStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<ButtonConfig>, StoreError>;

    fn get_all(&self) -> Result<BTreeMap<String, ButtonConfig>, StoreError>;

    fn put(&self, config: &ButtonConfig) -> Result<(), StoreError>;

    /// Number of stored records.
    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.get_all()?.len())
    }

    /// Whether records survive a process restart.
    fn is_durable(&self) -> bool;
}
