//! sharedvfs server library
//!
//! Newline-delimited JSON over TCP in front of the shared namespace kernel.

pub mod config;
pub mod constants;
pub mod error;
pub mod listener;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use listener::VfsServer;
