//! TCP listener speaking newline-delimited JSON.
//!
//! Each accepted connection gets:
//! - a reader loop that decodes one [`ClientFrame`] per line and spawns a
//!   task per request, so slow requests never hold up the next line
//! - one writer task draining a bounded outbox of [`ServerFrame`]s, shared
//!   by responses and by the notification forwarders
//! - one forwarder per session opened over it, copying that session's
//!   change events into the outbox
//!
//! A forwarder stuck behind a slow reader stops draining its session, whose
//! own bounded outbox then drops further events.
//!
//! When the peer goes away every session opened over the connection is
//! invalidated.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use sharedvfs_kernel::{SharedVfsService, Subscription, VfsError, shared_vfs_service};
use sharedvfs_types::{ClientFrame, Request, Response, ServerFrame, SessionToken};

use crate::config::ServerConfig;
use crate::constants::FRAME_QUEUE_CAPACITY;
use crate::error::ServerResult;

type FrameTx = mpsc::Sender<ServerFrame>;

/// Sessions opened over one connection, as `(user_name, token)`.
type OpenedSessions = Arc<Mutex<Vec<(String, SessionToken)>>>;

/// A bound server, ready to accept.
pub struct VfsServer {
    listener: TcpListener,
    service: SharedVfsService,
}

impl VfsServer {
    /// Bind the configured address and build a fresh namespace.
    pub async fn bind(config: &ServerConfig) -> ServerResult<Self> {
        let service = shared_vfs_service(&config.vfs);
        Self::bind_with(config, service).await
    }

    /// Bind the configured address and serve an existing namespace.
    pub async fn bind_with(config: &ServerConfig, service: SharedVfsService) -> ServerResult<Self> {
        let listener = TcpListener::bind(config.socket_addr()?).await?;
        Ok(Self { listener, service })
    }

    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the task is cancelled.
    pub async fn run(self) -> ServerResult<()> {
        tracing::info!(addr = %self.local_addr()?, "sharedvfs server listening");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let service = Arc::clone(&self.service);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(service, stream, peer).await {
                            tracing::warn!(%peer, "connection error: {e}");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!("accept error: {e}");
                }
            }
        }
    }
}

async fn handle_connection(
    service: SharedVfsService,
    stream: TcpStream,
    peer: SocketAddr,
) -> ServerResult<()> {
    tracing::debug!(%peer, "connection opened");
    let (reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::channel(FRAME_QUEUE_CAPACITY);
    let writer_task = tokio::spawn(write_frames(writer, rx));

    let opened: OpenedSessions = Arc::default();
    let mut requests = JoinSet::new();
    let mut lines = BufReader::new(reader).lines();

    let read_result = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        while requests.try_join_next().is_some() {}

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ClientFrame>(line) {
            Ok(frame) => {
                let service = Arc::clone(&service);
                let tx = tx.clone();
                let opened = Arc::clone(&opened);
                requests.spawn(async move {
                    handle_request(service, frame, tx, opened).await;
                });
            }
            Err(e) => {
                tracing::debug!(%peer, "malformed frame: {e}");
                let _ = tx
                    .send(ServerFrame::Malformed {
                        message: format!("Invalid JSON: {e}"),
                    })
                    .await;
            }
        }
    };

    // In-flight connects must land before the sweep below.
    while requests.join_next().await.is_some() {}
    let sessions = std::mem::take(&mut *opened.lock());
    for (user_name, token) in sessions {
        if service.invalidate(&user_name, &token) {
            tracing::warn!(%peer, user = %user_name, "connection dropped, session invalidated");
        }
    }

    drop(tx);
    match writer_task.await {
        Ok(Err(e)) => tracing::debug!(%peer, "writer stopped: {e}"),
        Err(e) => tracing::warn!(%peer, "writer task failed: {e}"),
        Ok(Ok(())) => {}
    }
    tracing::debug!(%peer, "connection closed");
    read_result?;
    Ok(())
}

async fn handle_request(
    service: SharedVfsService,
    frame: ClientFrame,
    tx: FrameTx,
    opened: OpenedSessions,
) {
    let ClientFrame { id, request } = frame;
    tracing::debug!(id, op = request.name(), "request");

    let response = match request {
        Request::Connect { user_name } => match service.connect(&user_name) {
            Ok(conn) => {
                opened.lock().push((user_name.clone(), conn.info.token));
                tokio::spawn(forward_notifications(conn.subscription, tx.clone()));
                Response::Connected {
                    user_name,
                    token: conn.info.token,
                    total_sessions: conn.total_sessions,
                }
            }
            Err(e) => error_response(e),
        },
        Request::Disconnect { user_name, token } => match service.disconnect(&user_name, &token) {
            Ok(user_name) => {
                opened.lock().retain(|(_, t)| *t != token);
                Response::Disconnected { user_name }
            }
            Err(e) => error_response(e),
        },
        Request::Execute {
            user_name,
            token,
            command_line,
        } => match service.execute_command(&user_name, &token, &command_line) {
            Ok(message) => Response::Executed { message },
            Err(e) => error_response(e),
        },
    };

    let _ = tx.send(ServerFrame::Response { id, response }).await;
}

fn error_response(e: VfsError) -> Response {
    Response::Error {
        kind: e.kind(),
        message: e.to_string(),
    }
}

/// Copy a session's events into the connection outbox until either side closes.
async fn forward_notifications(mut subscription: Subscription, tx: FrameTx) {
    while let Some(event) = subscription.recv().await {
        if tx.send(ServerFrame::Notification { event }).await.is_err() {
            break;
        }
    }
}

async fn write_frames(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::Receiver<ServerFrame>,
) -> ServerResult<()> {
    while let Some(frame) = rx.recv().await {
        let json = serde_json::to_string(&frame)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.shutdown().await?;
    Ok(())
}
