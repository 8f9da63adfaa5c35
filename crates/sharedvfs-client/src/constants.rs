//! Client configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

use std::time::Duration;

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 4242;

/// Timeout for establishing the TCP connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a request waits for its response before it is reported as a
/// transport failure.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Filtered notifications buffered locally before new ones are dropped.
pub const NOTIFICATION_BUFFER: usize = 1024;
