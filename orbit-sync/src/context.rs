//! Process-scoped wiring of the synchronization core.
//!
//! One [`SyncContext`] is built at startup and cloned into every HTTP handler
//! and WebSocket connection task. Clones share the same store, hub and hooks;
//! there are no global singletons.

use std::sync::Arc;

use crate::broadcast::BroadcastHub;
use crate::config::ServerConfig;
use crate::hooks::{AllowAll, Authorizer, CommandCapture, Capturer, DisabledCapture, StaticToken};
use crate::relay::InteractionRelay;
use crate::storage::{ConfigStore, MemoryConfigStore, RocksConfigStore, StoreConfig, StoreError};
use crate::synchronizer::StateSynchronizer;

#[derive(Clone)]
pub struct SyncContext {
    store: Arc<dyn ConfigStore>,
    hub: Arc<BroadcastHub>,
    synchronizer: Arc<StateSynchronizer>,
    relay: Arc<InteractionRelay>,
    authorizer: Arc<dyn Authorizer>,
    capturer: Arc<dyn Capturer>,
}

impl SyncContext {
    /// Wire the core around `store`. Authorization allows everyone and
    /// capture is disabled until replaced.
    pub fn new(store: Arc<dyn ConfigStore>, broadcast_capacity: usize) -> Self {
        let hub = Arc::new(BroadcastHub::new(broadcast_capacity));
        let synchronizer = Arc::new(StateSynchronizer::new(store.clone(), hub.clone()));
        let relay = Arc::new(InteractionRelay::new(hub.clone()));
        Self {
            store,
            hub,
            synchronizer,
            relay,
            authorizer: Arc::new(AllowAll),
            capturer: Arc::new(DisabledCapture),
        }
    }

    /// In-memory store, default hooks.
    pub fn in_memory(broadcast_capacity: usize) -> Self {
        Self::new(Arc::new(MemoryConfigStore::new()), broadcast_capacity)
    }

    /// Open the configured store and hooks.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn ConfigStore> = match &config.storage_path {
            Some(path) => Arc::new(RocksConfigStore::open(StoreConfig {
                path: path.clone(),
                ..StoreConfig::default()
            })?),
            None => {
                log::warn!("No storage path configured, button configs will not survive restart");
                Arc::new(MemoryConfigStore::new())
            }
        };

        let mut ctx = Self::new(store, config.broadcast_capacity);
        if let Some(token) = &config.auth_token {
            ctx = ctx.with_authorizer(Arc::new(StaticToken::new(token.clone())));
        }
        if let Some(line) = &config.capture_command {
            if let Some(cmd) = CommandCapture::from_command_line(line, config.capture_timeout()) {
                ctx = ctx.with_capturer(Arc::new(cmd));
            }
        }
        Ok(ctx)
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_capturer(mut self, capturer: Arc<dyn Capturer>) -> Self {
        self.capturer = capturer;
        self
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    pub fn synchronizer(&self) -> &Arc<StateSynchronizer> {
        &self.synchronizer
    }

    pub fn relay(&self) -> &Arc<InteractionRelay> {
        &self.relay
    }

    pub fn authorizer(&self) -> &Arc<dyn Authorizer> {
        &self.authorizer
    }

    pub fn capturer(&self) -> &Arc<dyn Capturer> {
        &self.capturer
    }
}
