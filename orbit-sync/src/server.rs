//! Process entry point: HTTP API + WebSocket event channel.
//!
//! Architecture:
//! ```text
//!  HTTP POST /api/button/config ──► StateSynchronizer ──► ConfigStore (RocksDB)
//!                                         │
//!                                         ▼
//!  WS button_interaction ──► InteractionRelay ──► BroadcastHub
//!                                                    │
//!                                     ┌──────────────┼──────────────┐
//!                                     ▼              ▼              ▼
//!                                  Client A       Client B       Client C
//! ```
//!
//! Each WebSocket connection is one hub subscriber for its whole lifetime.
//! The subscriber is removed however the connection ends: close frame,
//! transport error, or heartbeat timeout.

use std::net::SocketAddr;
use std::time::{Duration, Instant};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::api;
use crate::config::ServerConfig;
use crate::context::SyncContext;
use crate::error::SyncError;
use crate::protocol::{Envelope, EVENT_BUTTON_INTERACTION};
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to open store: {0}")]
    Store(#[from] StoreError),
}

type ConnectionResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// The sync server.
pub struct SyncServer {
    config: ServerConfig,
    ctx: SyncContext,
}

impl SyncServer {
    /// Open the configured store and build the process context.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let ctx = SyncContext::from_config(&config)?;
        Ok(Self { config, ctx })
    }

    /// Use an already-built context.
    pub fn with_context(config: ServerConfig, ctx: SyncContext) -> Self {
        Self { config, ctx }
    }

    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind both listeners and serve until one of them fails.
    pub async fn run(&self) -> Result<(), ServerError> {
        let http = TcpListener::bind(&self.config.http_addr).await?;
        let ws = TcpListener::bind(&self.config.ws_addr).await?;
        self.run_with_listeners(http, ws).await
    }

    /// Serve on pre-bound listeners.
    pub async fn run_with_listeners(
        &self,
        http: TcpListener,
        ws: TcpListener,
    ) -> Result<(), ServerError> {
        log::info!("HTTP API listening on {}", http.local_addr()?);
        log::info!("Event channel listening on {}", ws.local_addr()?);

        let app = api::build_router(self.ctx.clone(), self.config.max_body_bytes);
        let http_task = async { axum::serve(http, app).await.map_err(ServerError::from) };

        tokio::try_join!(http_task, self.serve_ws(ws))?;
        Ok(())
    }

    async fn serve_ws(&self, listener: TcpListener) -> Result<(), ServerError> {
        loop {
            let (stream, addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    log::error!("Failed to accept connection: {e}");
                    continue;
                }
            };
            log::debug!("New TCP connection from {addr}");

            let ctx = self.ctx.clone();
            let heartbeat = self.config.heartbeat_interval();
            let client_timeout = self.config.client_timeout();

            tokio::spawn(async move {
                if let Err(e) =
                    Self::handle_connection(stream, addr, ctx, heartbeat, client_timeout).await
                {
                    log::error!("Connection error from {addr}: {e}");
                }
            });
        }
    }

    /// Handle a single WebSocket connection.
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        ctx: SyncContext,
        heartbeat: Duration,
        client_timeout: Duration,
    ) -> ConnectionResult {
        let ws_stream = tokio_tungstenite::accept_async(stream).await?;

        let subscription = ctx.hub().subscribe().await;
        let subscriber_id = subscription.id();
        log::info!("Client connected from {addr} as subscriber {subscriber_id}");

        let result =
            Self::serve_connection(ws_stream, subscription, &ctx, heartbeat, client_timeout).await;

        ctx.hub().unsubscribe(&subscriber_id).await;
        log::info!("Client {subscriber_id} disconnected ({addr})");
        result
    }

    async fn serve_connection(
        ws_stream: tokio_tungstenite::WebSocketStream<TcpStream>,
        mut subscription: crate::broadcast::Subscription,
        ctx: &SyncContext,
        heartbeat: Duration,
        client_timeout: Duration,
    ) -> ConnectionResult {
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        // Only the new subscriber hears about its own connection.
        ws_sender
            .send(Message::text(Envelope::connected().encode()?))
            .await?;

        let mut ticker = tokio::time::interval(heartbeat);
        ticker.tick().await;
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                // Incoming WebSocket message
                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            last_seen = Instant::now();
                            if let Some(reply) = Self::handle_text(ctx, text.as_str()).await {
                                ws_sender.send(Message::text(reply.encode()?)).await?;
                            }
                        }

                        Some(Ok(Message::Ping(data))) => {
                            last_seen = Instant::now();
                            ws_sender.send(Message::Pong(data)).await?;
                        }

                        Some(Ok(Message::Pong(_))) => {
                            last_seen = Instant::now();
                        }

                        Some(Ok(Message::Binary(_))) => {
                            last_seen = Instant::now();
                            log::debug!("Ignoring binary frame from subscriber {}", subscription.id());
                        }

                        Some(Ok(Message::Close(_))) | None => break,

                        Some(Err(e)) => {
                            log::error!("WebSocket error on subscriber {}: {e}", subscription.id());
                            break;
                        }

                        _ => {}
                    }
                }

                // Outgoing broadcast frame
                frame = subscription.recv() => {
                    match frame {
                        Some(frame) => ws_sender.send(Message::text(frame.to_string())).await?,
                        None => {
                            log::warn!("Subscriber {} evicted by the hub, closing", subscription.id());
                            break;
                        }
                    }
                }

                _ = ticker.tick() => {
                    if last_seen.elapsed() > client_timeout {
                        log::warn!("Subscriber {} timed out", subscription.id());
                        break;
                    }
                    ws_sender.send(Message::Ping(Vec::new().into())).await?;
                }
            }
        }

        let _ = ws_sender.close().await;
        Ok(())
    }

    /// Dispatch one inbound text frame. Returns a reply for the sender only.
    async fn handle_text(ctx: &SyncContext, text: &str) -> Option<Envelope> {
        let envelope = match Envelope::decode(text) {
            Ok(env) => env,
            Err(e) => {
                log::warn!("Failed to decode client frame: {e}");
                return Some(Envelope::interaction_error("Invalid message format"));
            }
        };

        match envelope.event.as_str() {
            EVENT_BUTTON_INTERACTION => match ctx.relay().relay(&envelope.data).await {
                Ok(_) => None,
                Err(SyncError::Validation(message)) => Some(Envelope::interaction_error(message)),
                Err(e) => {
                    log::error!("Error handling button interaction: {e}");
                    Some(Envelope::interaction_error("internal error"))
                }
            },
            other => {
                log::debug!("Unhandled event: {other}");
                None
            }
        }
    }
}
