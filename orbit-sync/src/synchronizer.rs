//! Mediates every read and write of button state.
//!
//! ```text
//! raw JSON ── validate ── default ── persist (ConfigStore) ── publish (BroadcastHub)
//! ```
//!
//! Writes are serialized by a single gate held across persist + publish, so
//! subscribers see `config_updated` frames in the same order the records hit
//! the store. Reads never take the gate. Once an update passes validation
//! its commit runs to completion even if the caller stops waiting.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::broadcast::BroadcastHub;
use crate::error::SyncError;
use crate::model::ButtonConfig;
use crate::protocol::EVENT_CONFIG_UPDATED;
use crate::storage::ConfigStore;

/// Counters for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub updates_applied: u64,
    pub validation_rejects: u64,
    pub storage_failures: u64,
}

#[derive(Default)]
struct AtomicSyncStats {
    updates_applied: AtomicU64,
    validation_rejects: AtomicU64,
    storage_failures: AtomicU64,
}

pub struct StateSynchronizer {
    store: Arc<dyn ConfigStore>,
    hub: Arc<BroadcastHub>,
    write_gate: Arc<Mutex<()>>,
    stats: Arc<AtomicSyncStats>,
}

impl StateSynchronizer {
    pub fn new(store: Arc<dyn ConfigStore>, hub: Arc<BroadcastHub>) -> Self {
        Self {
            store,
            hub,
            write_gate: Arc::new(Mutex::new(())),
            stats: Arc::new(AtomicSyncStats::default()),
        }
    }

    /// Validate, default, persist and broadcast one update.
    ///
    /// The incoming record fully replaces whatever was stored under its id.
    /// Every subscriber, including the one that sent the update, receives
    /// `config_updated` with the stored record.
    pub async fn apply_update(&self, raw: Value) -> Result<ButtonConfig, SyncError> {
        let normalized = match ButtonConfig::from_raw(raw.clone()) {
            Ok(n) => n,
            Err(e) => {
                self.stats.validation_rejects.fetch_add(1, Ordering::Relaxed);
                log::warn!("Rejected button config update ({e}): {raw}");
                return Err(e);
            }
        };

        let config = normalized.config;
        for field in &normalized.defaulted {
            log::warn!("Missing {field} in button config {}, using default", config.id);
        }

        // The commit runs in its own task so a dropped caller cannot leave a
        // persisted record unbroadcast.
        let commit = tokio::spawn(Self::commit(
            self.store.clone(),
            self.hub.clone(),
            self.write_gate.clone(),
            self.stats.clone(),
            config,
            raw,
        ));
        commit.await?
    }

    /// Persist then publish, under the write gate.
    async fn commit(
        store: Arc<dyn ConfigStore>,
        hub: Arc<BroadcastHub>,
        write_gate: Arc<Mutex<()>>,
        stats: Arc<AtomicSyncStats>,
        config: ButtonConfig,
        raw: Value,
    ) -> Result<ButtonConfig, SyncError> {
        let _gate = write_gate.lock().await;

        let record = config.clone();
        let persisted = tokio::task::spawn_blocking(move || store.put(&record)).await;

        match persisted {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                stats.storage_failures.fetch_add(1, Ordering::Relaxed);
                log::error!("Failed to persist button config {}: {e}; record: {raw}", config.id);
                return Err(e.into());
            }
            Err(e) => {
                log::error!("Persist task for button config {} failed: {e}; record: {raw}", config.id);
                return Err(e.into());
            }
        }

        stats.updates_applied.fetch_add(1, Ordering::Relaxed);

        match hub.publish(EVENT_CONFIG_UPDATED, &config).await {
            Ok(n) => log::info!("Button config {} updated, broadcast to {n} subscribers", config.id),
            Err(e) => log::error!("Failed to broadcast button config {}: {e}", config.id),
        }

        Ok(config)
    }

    /// All stored records keyed by id. Never mutates, never broadcasts.
    pub async fn list_all(&self) -> Result<BTreeMap<String, ButtonConfig>, SyncError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.get_all())
            .await?
            .map_err(|e| {
                log::error!("Failed to load button configs: {e}");
                SyncError::from(e)
            })
    }

    /// One stored record.
    pub async fn get(&self, id: &str) -> Result<Option<ButtonConfig>, SyncError> {
        let store = self.store.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || store.get(&id))
            .await?
            .map_err(|e| {
                log::error!("Failed to load button config: {e}");
                SyncError::from(e)
            })
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<usize, SyncError> {
        let store = self.store.clone();
        Ok(tokio::task::spawn_blocking(move || store.count()).await??)
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            updates_applied: self.stats.updates_applied.load(Ordering::Relaxed),
            validation_rejects: self.stats.validation_rejects.load(Ordering::Relaxed),
            storage_failures: self.stats.storage_failures.load(Ordering::Relaxed),
        }
    }
}
