//! Server configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

/// Default TCP port for the sharedvfs server.
pub const DEFAULT_PORT: u16 = 4242;

/// Default bind address (localhost only).
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Frames queued per connection before responders and forwarders wait
/// for the writer.
pub const FRAME_QUEUE_CAPACITY: usize = 256;
