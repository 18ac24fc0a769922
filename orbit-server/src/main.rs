//! Orbit server: HTTP API and WebSocket event channel for shared
//! 3D button layouts.
//!
//! Configuration comes from the environment (`PORT`, `ORBIT_*`); see
//! [`orbit_sync::ServerConfig::from_env`]. Log level via `RUST_LOG`.

use log::info;
use orbit_sync::{ServerConfig, SyncServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Orbit server...");

    let config = ServerConfig::from_env()?;
    info!(
        "Storage: {}",
        config
            .storage_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "in-memory".to_string())
    );

    let server = SyncServer::new(config)?;
    server.run().await?;
    Ok(())
}
