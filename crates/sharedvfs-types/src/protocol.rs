//! Serde types for the sharedvfs wire protocol.
//!
//! The transport is newline-delimited JSON over a duplex stream. A client
//! writes one [`ClientFrame`] per line; the server writes one
//! [`ServerFrame`] per line. Responses carry the id of the request they
//! answer. Notifications carry no id and may arrive between responses.
//!
//! ```text
//! → {"id":1,"request":{"type":"connect","user_name":"alice"}}
//! ← {"type":"response","id":1,"response":{"type":"connected","user_name":"alice","token":"…","total_sessions":1}}
//! ← {"type":"notification","event":{"user_name":"bob","command_line":"md docs"}}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::event::ChangeEvent;
use crate::ids::SessionToken;

/// Client-chosen request correlation id.
pub type RequestId = u64;

/// One line written by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFrame {
    pub id: RequestId,
    pub request: Request,
}

/// Operations a client may invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Open a session for `user_name`.
    Connect { user_name: String },
    /// Close the session identified by both fields.
    Disconnect {
        user_name: String,
        token: SessionToken,
    },
    /// Run one command line against the shared tree.
    Execute {
        user_name: String,
        token: SessionToken,
        command_line: String,
    },
}

impl Request {
    /// Short operation name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Disconnect { .. } => "disconnect",
            Self::Execute { .. } => "execute",
        }
    }
}

/// Result of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Connected {
        user_name: String,
        token: SessionToken,
        total_sessions: usize,
    },
    Disconnected { user_name: String },
    Executed { message: String },
    /// A domain error; `message` is a one-line description.
    Error { kind: ErrorKind, message: String },
}

/// One line written by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Response { id: RequestId, response: Response },
    Notification { event: ChangeEvent },
    /// The line could not be decoded as a [`ClientFrame`].
    Malformed { message: String },
}
