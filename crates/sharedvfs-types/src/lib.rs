//! Shared session, event, and wire types for sharedvfs.
//!
//! This crate has **no internal sharedvfs dependencies**. The kernel, the
//! server, and the client all speak in these types, so a path string, a
//! token, or an error kind means the same thing on both ends of a socket.
//!
//! # Key Types
//!
//! |-------------------|----------------------------------------------|
//! | Type              | Purpose                                      |
//! |-------------------|----------------------------------------------|
//! | [`SessionToken`]  | Opaque per-session credential                |
//! | [`SessionInfo`]   | Who connected, with which token, and when    |
//! | [`ChangeEvent`]   | Broadcast payload: actor + command line      |
//! | [`ErrorKind`]     | Domain error classification on the wire      |
//! | [`ClientFrame`]   | One request line sent by a client            |
//! | [`ServerFrame`]   | One response or notification line            |
//! |-------------------|----------------------------------------------|

pub mod error;
pub mod event;
pub mod ids;
pub mod protocol;
pub mod session;

pub use error::ErrorKind;
pub use event::{ChangeEvent, same_user};
pub use ids::{SessionToken, TokenParseError};
pub use protocol::{ClientFrame, Request, RequestId, Response, ServerFrame};
pub use session::SessionInfo;

/// Current time as Unix milliseconds.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
