//! Request/response client over one TCP connection.
//!
//! ```text
//!   VfsClient::call()          socket           reader task
//!   ┌────────────────┐  ClientFrame line  ┌──────────────────────────────┐
//!   │ pending[id]=tx │ ─────────────────▶ │ Response{id} → pending[id]   │
//!   │ await rx       │ ◀───────────────── │ Notification → Notifications │
//!   └────────────────┘      oneshot       └──────────────────────────────┘
//! ```
//!
//! Notifications are dropped unless a user is connected over this client
//! and the event came from someone else.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use sharedvfs_types::{
    ChangeEvent, ClientFrame, Request, RequestId, Response, ServerFrame, SessionToken, same_user,
};

use crate::constants::{CONNECT_TIMEOUT, NOTIFICATION_BUFFER, REQUEST_TIMEOUT};
use crate::error::{ClientError, ClientResult};

/// Session credentials held after a successful connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_name: String,
    pub token: SessionToken,
}

/// Returned by [`VfsClient::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
    pub user_name: String,
    pub total_sessions: usize,
}

/// Change events from other users, already filtered.
#[derive(Debug)]
pub struct Notifications {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl Notifications {
    /// Next event. `None` once the connection is closed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

#[derive(Default)]
struct Shared {
    pending: Mutex<HashMap<RequestId, oneshot::Sender<Response>>>,
    credentials: Mutex<Option<Credentials>>,
    closed: AtomicBool,
}

impl Shared {
    fn accepts(&self, event: &ChangeEvent) -> bool {
        match &*self.credentials.lock() {
            Some(creds) => !event.is_from(&creds.user_name),
            None => false,
        }
    }
}

pub struct VfsClient {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl VfsClient {
    /// Open a TCP connection to the server.
    pub async fn open(host: &str, port: u16) -> ClientResult<(Self, Notifications)> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port)))
            .await
            .map_err(|_| ClientError::Transport(format!("timed out connecting to {host}:{port}")))??;
        tracing::debug!(%host, port, "connected to server");
        Ok(Self::from_stream(stream))
    }

    /// Wrap an established stream. Must be called within a tokio runtime.
    pub fn from_stream(stream: TcpStream) -> (Self, Notifications) {
        let (reader, writer) = stream.into_split();
        let shared = Arc::new(Shared::default());
        let (events_tx, events_rx) = mpsc::channel(NOTIFICATION_BUFFER);
        let reader = tokio::spawn(read_frames(reader, Arc::clone(&shared), events_tx));

        let client = Self {
            writer: tokio::sync::Mutex::new(writer),
            shared,
            next_id: AtomicU64::new(1),
            reader,
        };
        (client, Notifications { rx: events_rx })
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.shared.credentials.lock().clone()
    }

    pub fn user_name(&self) -> Option<String> {
        self.shared
            .credentials
            .lock()
            .as_ref()
            .map(|c| c.user_name.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Open a session. Connecting as someone else while a user is still
    /// connected is refused locally.
    pub async fn connect(&self, user_name: &str) -> ClientResult<Connected> {
        if let Some(current) = self.user_name()
            && !same_user(&current, user_name)
        {
            return Err(ClientError::SwitchUser { current });
        }

        let request = Request::Connect {
            user_name: user_name.to_string(),
        };
        match self.call(request).await? {
            Response::Connected {
                user_name,
                token,
                total_sessions,
            } => {
                *self.shared.credentials.lock() = Some(Credentials {
                    user_name: user_name.clone(),
                    token,
                });
                Ok(Connected {
                    user_name,
                    total_sessions,
                })
            }
            other => Err(unexpected(other)),
        }
    }

    /// Close the current session. Returns the user name.
    pub async fn disconnect(&self) -> ClientResult<String> {
        let creds = self.credentials().ok_or(ClientError::NotConnected)?;
        let request = Request::Disconnect {
            user_name: creds.user_name,
            token: creds.token,
        };
        match self.call(request).await? {
            Response::Disconnected { user_name } => {
                *self.shared.credentials.lock() = None;
                Ok(user_name)
            }
            other => Err(unexpected(other)),
        }
    }

    /// Run one command line as the current user.
    pub async fn execute(&self, command_line: &str) -> ClientResult<String> {
        let creds = self.credentials().ok_or(ClientError::NotConnected)?;
        let request = Request::Execute {
            user_name: creds.user_name,
            token: creds.token,
            command_line: command_line.to_string(),
        };
        match self.call(request).await? {
            Response::Executed { message } => Ok(message),
            other => Err(unexpected(other)),
        }
    }

    /// Send one request and wait for its response. Domain errors come back
    /// as [`ClientError::Server`].
    async fn call(&self, request: Request) -> ClientResult<Response> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&ClientFrame { id, request })?;
        line.push('\n');

        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().insert(id, tx);
        if self.is_closed() {
            self.shared.pending.lock().remove(&id);
            return Err(ClientError::Transport("connection closed".into()));
        }

        let write = {
            let mut writer = self.writer.lock().await;
            writer.write_all(line.as_bytes()).await
        };
        if let Err(e) = write {
            self.shared.pending.lock().remove(&id);
            return Err(ClientError::Transport(e.to_string()));
        }

        let response = match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(ClientError::Transport(
                    "connection closed before a response arrived".into(),
                ));
            }
            Err(_) => {
                self.shared.pending.lock().remove(&id);
                return Err(ClientError::Transport("no response from server".into()));
            }
        };

        match response {
            Response::Error { kind, message } => Err(ClientError::Server { kind, message }),
            response => Ok(response),
        }
    }
}

impl Drop for VfsClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn unexpected(response: Response) -> ClientError {
    ClientError::UnexpectedResponse(format!("{response:?}"))
}

async fn read_frames(
    reader: OwnedReadHalf,
    shared: Arc<Shared>,
    events: mpsc::Sender<ChangeEvent>,
) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("read error: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ServerFrame>(&line) {
            Ok(ServerFrame::Response { id, response }) => {
                match shared.pending.lock().remove(&id) {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => tracing::debug!(id, "response for unknown request"),
                }
            }
            Ok(ServerFrame::Notification { event }) => {
                if shared.accepts(&event) {
                    if let Err(mpsc::error::TrySendError::Full(event)) = events.try_send(event) {
                        tracing::warn!(from = %event.user_name, "notification buffer full, dropping event");
                    }
                } else {
                    tracing::trace!(from = %event.user_name, "notification ignored");
                }
            }
            Ok(ServerFrame::Malformed { message }) => {
                tracing::warn!("server rejected a frame: {message}");
            }
            Err(e) => tracing::warn!("undecodable frame from server: {e}"),
        }
    }

    shared.closed.store(true, Ordering::Release);
    shared.pending.lock().clear();
    tracing::debug!("server connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharedvfs_types::ErrorKind;
    use tokio::net::TcpListener;

    /// A one-connection fake server that answers requests from a script.
    async fn fake_server<F>(respond: F) -> std::net::SocketAddr
    where
        F: Fn(ClientFrame) -> Vec<ServerFrame> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let frame: ClientFrame = serde_json::from_str(&line).unwrap();
                for out in respond(frame) {
                    let mut json = serde_json::to_string(&out).unwrap();
                    json.push('\n');
                    writer.write_all(json.as_bytes()).await.unwrap();
                }
            }
        });
        addr
    }

    fn connected(id: RequestId, user: &str) -> ServerFrame {
        ServerFrame::Response {
            id,
            response: Response::Connected {
                user_name: user.to_string(),
                token: SessionToken::new(),
                total_sessions: 1,
            },
        }
    }

    fn notify(user: &str, line: &str) -> ServerFrame {
        ServerFrame::Notification {
            event: ChangeEvent::new(user, line),
        }
    }

    #[tokio::test]
    async fn test_connect_stores_credentials() {
        let addr = fake_server(|frame| match frame.request {
            Request::Connect { user_name } => vec![connected(frame.id, &user_name)],
            _ => vec![],
        })
        .await;
        let (client, _events) = VfsClient::open("127.0.0.1", addr.port()).await.unwrap();

        let info = client.connect("alice").await.unwrap();
        assert_eq!(info.user_name, "alice");
        assert_eq!(client.user_name().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_switch_user_refused_locally() {
        let addr = fake_server(|frame| match frame.request {
            Request::Connect { user_name } => vec![connected(frame.id, &user_name)],
            _ => vec![],
        })
        .await;
        let (client, _events) = VfsClient::open("127.0.0.1", addr.port()).await.unwrap();
        client.connect("alice").await.unwrap();

        let err = client.connect("bob").await.unwrap_err();
        assert!(matches!(err, ClientError::SwitchUser { ref current } if current == "alice"));
    }

    #[tokio::test]
    async fn test_commands_need_a_user() {
        let addr = fake_server(|_| vec![]).await;
        let (client, _events) = VfsClient::open("127.0.0.1", addr.port()).await.unwrap();
        assert!(matches!(client.execute("md x").await, Err(ClientError::NotConnected)));
        assert!(matches!(client.disconnect().await, Err(ClientError::NotConnected)));
    }

    #[tokio::test]
    async fn test_server_error_is_surfaced() {
        let addr = fake_server(|frame| {
            vec![ServerFrame::Response {
                id: frame.id,
                response: Response::Error {
                    kind: ErrorKind::AlreadyConnected,
                    message: "User 'alice' is already connected.".into(),
                },
            }]
        })
        .await;
        let (client, _events) = VfsClient::open("127.0.0.1", addr.port()).await.unwrap();

        let err = client.connect("alice").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::AlreadyConnected));
        assert_eq!(err.to_string(), "User 'alice' is already connected.");
        assert!(client.credentials().is_none());
    }

    #[tokio::test]
    async fn test_notifications_filtered() {
        // Each connect is answered with notifications around the response.
        let addr = fake_server(|frame| match frame.request {
            Request::Connect { user_name } => vec![
                notify("bob", "md early"),
                connected(frame.id, &user_name),
            ],
            Request::Execute { .. } => vec![
                notify("ALICE", "md mine"),
                notify("bob", "md theirs"),
                ServerFrame::Response {
                    id: frame.id,
                    response: Response::Executed {
                        message: "ok".into(),
                    },
                },
            ],
            _ => vec![],
        })
        .await;
        let (client, mut events) = VfsClient::open("127.0.0.1", addr.port()).await.unwrap();

        client.connect("alice").await.unwrap();
        assert_eq!(client.execute("md x").await.unwrap(), "ok");

        let event = events.recv().await.unwrap();
        assert_eq!(event, ChangeEvent::new("bob", "md theirs"));
        assert!(events.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_closed_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });
        let (client, mut events) = VfsClient::open("127.0.0.1", port).await.unwrap();

        assert!(events.recv().await.is_none());
        let err = client.connect("alice").await.unwrap_err();
        assert!(err.is_transport(), "{err:?}");
    }
}
