//! # sharedvfs-kernel
//!
//! Shared in-memory namespace for sharedvfs: volumes, directories, and
//! files, mutated by many sessions at once.
//!
//! The kernel owns:
//! - the namespace tree (arena-backed, parent links by id)
//! - path resolution relative to a session's current directory
//! - the command vocabulary and its parser
//! - session tokens (one live session per user name)
//! - fan-out of change events to every session except the actor
//!
//! Transports talk to [`VfsService`]; everything else is exposed for tests
//! and embedding.

pub mod command;
pub mod config;
pub mod error;
pub mod flows;
pub mod path;
pub mod service;
pub mod session;
pub mod tree;

pub use command::{
    Command, CommandCode, ConsoleCode, ConsoleCommand, FsCommand, FsCommandCode,
};
pub use config::VfsConfig;
pub use error::{VfsError, VfsResult};
pub use flows::{NotificationBroadcaster, Subscription};
pub use path::PathResolver;
pub use service::{SharedVfsService, VfsService, shared_vfs_service};
pub use session::{Connection, SessionManager};
pub use tree::{NamespaceTree, NodeId, NodeInfo, NodeKind, Relocation};

pub use sharedvfs_types::{ChangeEvent, ErrorKind, SessionToken};
