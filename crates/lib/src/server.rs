//! Development HTTP server.
//!
//! Serves the stable output link as static files and exposes `/ws`, which
//! pushes a text frame to the browser after every successful rebuild.

use std::net::SocketAddr;
use std::path::Path;

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderValue, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::consts::KEEPALIVE_INTERVAL;
use crate::live::Notifier;

const NO_CACHE: &str = "no-store, no-cache, must-revalidate, proxy-revalidate, max-age=0";

#[derive(Debug, Error)]
pub enum ServerError {
  #[error("failed to bind {addr}: {source}")]
  Bind {
    addr: SocketAddr,
    #[source]
    source: std::io::Error,
  },

  #[error("server error: {0}")]
  Serve(#[source] std::io::Error),
}

#[derive(Clone)]
struct AppState {
  notifier: Notifier,
  cancel: CancellationToken,
}

/// Static files from `root` plus the `/ws` live-reload endpoint.
pub fn router(root: &Path, notifier: Notifier, cancel: CancellationToken) -> Router {
  Router::new()
    .route("/ws", get(live_reload))
    .fallback_service(ServeDir::new(root))
    .layer(SetResponseHeaderLayer::overriding(
      header::CACHE_CONTROL,
      HeaderValue::from_static(NO_CACHE),
    ))
    .layer(CorsLayer::new().allow_origin(Any))
    .layer(TraceLayer::new_for_http())
    .with_state(AppState { notifier, cancel })
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
  TcpListener::bind(addr)
    .await
    .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve `app` until `cancel` fires.
pub async fn serve(listener: TcpListener, app: Router, cancel: CancellationToken) -> Result<(), ServerError> {
  if let Ok(addr) = listener.local_addr() {
    info!(%addr, "serving catalog api");
  }
  axum::serve(listener, app)
    .with_graceful_shutdown(async move { cancel.cancelled().await })
    .await
    .map_err(ServerError::Serve)
}

async fn live_reload(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
  ws.on_upgrade(move |socket| client_session(socket, state.notifier, state.cancel))
}

/// Pump broker messages and keepalive pings to one client until either side goes away.
async fn client_session(socket: WebSocket, notifier: Notifier, cancel: CancellationToken) {
  let Some(mut subscription) = notifier.register().await else {
    return;
  };
  let client = subscription.id();
  debug!(client, "live-reload client connected");

  let (mut sender, mut receiver) = socket.split();
  let mut keepalive = tokio::time::interval(KEEPALIVE_INTERVAL);
  keepalive.tick().await;

  loop {
    tokio::select! {
      _ = cancel.cancelled() => break,
      message = subscription.recv() => {
        let Some(message) = message else { break };
        if sender.send(Message::Text(message.into())).await.is_err() {
          break;
        }
      }
      _ = keepalive.tick() => {
        if sender.send(Message::Ping(Bytes::new())).await.is_err() {
          break;
        }
      }
      incoming = receiver.next() => match incoming {
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
        Some(Ok(_)) => {}
      },
    }
  }

  let _ = sender.send(Message::Close(None)).await;
  debug!(client, "live-reload client disconnected");
}
