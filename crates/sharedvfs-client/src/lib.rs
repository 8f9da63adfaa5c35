//! sharedvfs client library
//!
//! Talks to a sharedvfs server over newline-delimited JSON on TCP:
//! request/response correlation, session credentials, and a filtered stream
//! of change notifications from other users.

pub mod connection;
pub mod console;
pub mod constants;
pub mod error;

pub use connection::{Connected, Credentials, Notifications, VfsClient};
pub use console::{Console, Outcome};
pub use error::{ClientError, ClientResult};
