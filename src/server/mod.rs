//! WebSocket transport.
//!
//! Frames are JSON text tagged by `action`. All session access goes through
//! one mutex; events produced under it are queued to per-socket channels
//! before the guard drops, so each peer sees them in session order.

pub mod config;
pub mod connection;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::protocol::SESSION_FULL_MESSAGE;
use crate::state::{ClientRequest, Deck, ServerEvent, Session};

pub use config::ServerConfig;
pub use connection::{Connection, ConnectionId, ConnectionManager};

/// Session plus the sockets it talks to, guarded together.
#[derive(Debug)]
pub struct Table {
    pub session: Session<ConnectionId>,
    pub connections: ConnectionManager,
}

#[derive(Clone, Debug)]
pub struct AppState {
    table: Arc<Mutex<Table>>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        let deck = match config.deck_seed {
            Some(seed) => Deck::with_seed(seed),
            None => Deck::new(),
        };
        Self::with_session(Session::with_deck(deck))
    }

    pub fn with_session(session: Session<ConnectionId>) -> Self {
        Self {
            table: Arc::new(Mutex::new(Table {
                session,
                connections: ConnectionManager::new(),
            })),
        }
    }

    /// Lock the table. Every operation leaves it consistent, so a poisoned
    /// lock is still usable.
    pub fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, remote, state))
}

async fn handle_socket(socket: WebSocket, remote: SocketAddr, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let admitted = {
        let mut table = state.lock();
        let conn = table.connections.register(remote, tx);
        let accepted = table.session.accept(conn);
        match accepted {
            Ok(outbound) => {
                table.connections.deliver(outbound);
                Ok(conn)
            }
            Err(err) => {
                table.connections.remove(conn);
                Err(err)
            }
        }
    };

    let conn = match admitted {
        Ok(conn) => conn,
        Err(err) => {
            warn!(%remote, %err, "connection refused");
            if let Some(payload) = encode(&Session::<ConnectionId>::reject_event()) {
                let _ = sender.send(Message::Text(payload)).await;
            }
            let _ = sender
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: SESSION_FULL_MESSAGE.into(),
                })))
                .await;
            return;
        }
    };

    info!(%conn, %remote, "player connected");

    let write_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Some(payload) = encode(&event) else {
                continue;
            };
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let request = match serde_json::from_str::<ClientRequest>(&text) {
                    Ok(request) => request,
                    Err(err) => {
                        warn!(%conn, ?err, "invalid inbound message");
                        continue;
                    }
                };
                let mut table = state.lock();
                let outbound = table.session.handle(&conn, request);
                table.connections.deliver(outbound);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(%conn, ?err, "socket error");
                break;
            }
        }
    }

    let closed = {
        let mut table = state.lock();
        table.session.remove_player(&conn);
        table.connections.remove(conn)
    };
    if let Some(closed) = closed {
        info!(conn = %closed.id, remote = %closed.remote, sent = closed.sent, "player disconnected");
    }
    // The outbox sender went with the connection; the writer flushes what is
    // queued and exits.
    let _ = write_task.await;
}

fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(?err, action = event.action(), "failed to encode event");
            None
        }
    }
}
