//! # orbit-sync: Shared state for 3D button layouts
//!
//! Keeps every connected client looking at the same set of buttons.
//! Configuration writes are persisted and then pushed to all clients;
//! transient interactions (hover, click) are relayed without touching
//! the store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   HTTP (JSON)    ┌───────────────────┐     ┌─────────────┐
//! │ Editor      │ ───────────────► │ StateSynchronizer │ ──► │ ConfigStore │
//! └─────────────┘                  └─────────┬─────────┘     │ (RocksDB)   │
//!                                            │               └─────────────┘
//! ┌─────────────┐   WebSocket      ┌─────────▼─────────┐
//! │ Viewer      │ ◄──────────────► │ BroadcastHub      │
//! │ (per user)  │   JSON events    │ (fan-out)         │
//! └─────────────┘                  └─────────▲─────────┘
//!                                            │
//!                                  ┌─────────┴─────────┐
//!                                  │ InteractionRelay  │
//!                                  └───────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`model`]: Button records and normalization
//! - [`storage`]: Durable and in-memory config stores
//! - [`broadcast`]: Subscriber registry with per-subscriber queues
//! - [`synchronizer`]: Validate, persist, then broadcast
//! - [`relay`]: Ephemeral interaction fan-out
//! - [`hooks`]: Authorization and page capture collaborators
//! - [`api`]: HTTP gateway
//! - [`server`]: WebSocket gateway and process entry

pub mod model;
pub mod error;
pub mod storage;
pub mod protocol;
pub mod broadcast;
pub mod synchronizer;
pub mod relay;
pub mod hooks;
pub mod config;
pub mod context;
pub mod api;
pub mod server;

// Re-exports for convenience
pub use model::{ButtonConfig, InteractionEvent, Normalized, StateChanged, Vec3};
pub use error::{ErrorKind, SyncError};
pub use storage::{
    ButtonMetadata, ConfigStore, MemoryConfigStore, RocksConfigStore, StoreConfig, StoreError,
};
pub use protocol::{Envelope, ProtocolError};
pub use broadcast::{BroadcastHub, BroadcastStats, Frame, SubscriberId, Subscription};
pub use synchronizer::{StateSynchronizer, SyncStats};
pub use relay::InteractionRelay;
pub use hooks::{
    Actor, AllowAll, Authorizer, CaptureError, Capturer, CommandCapture, Decision,
    DisabledCapture, StaticToken,
};
pub use config::{ConfigError, ServerConfig};
pub use context::SyncContext;
pub use server::{ServerError, SyncServer};
