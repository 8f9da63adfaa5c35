//! Server configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file) is a valid configuration.
//!
//! ```toml
//! bind_address = "0.0.0.0"
//! port = 4242
//!
//! [vfs]
//! volumes = ["C:", "D:"]
//! show_root = false
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sharedvfs_kernel::VfsConfig;

use crate::constants::{DEFAULT_BIND_ADDRESS, DEFAULT_PORT};
use crate::error::{ServerError, ServerResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub vfs: VfsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            vfs: VfsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loopback on an OS-assigned port (for tests).
    pub fn ephemeral() -> Self {
        Self {
            port: 0,
            ..Self::default()
        }
    }

    /// Read a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ServerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_bind_address(mut self, bind_address: impl Into<String>) -> Self {
        self.bind_address = bind_address.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .map_err(|_| ServerError::InvalidAddress(self.bind_address.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 4242);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:4242");
        assert_eq!(config.vfs.default_volume(), "C:");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 5000\n\n[vfs]\nvolumes = [\"C:\", \"D:\"]\nshow_root = true"
        )
        .unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.vfs.volumes, vec!["C:", "D:"]);
        assert!(config.vfs.show_root);
        assert_eq!(config.vfs.max_name_length, 255);
    }

    #[test]
    fn test_load_errors() {
        let missing = ServerConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(missing, ServerError::ConfigRead { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        let bad = ServerConfig::load(file.path()).unwrap_err();
        assert!(matches!(bad, ServerError::ConfigParse { .. }));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::default()
            .with_bind_address("0.0.0.0")
            .with_port(9000);
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:9000");

        let bad = ServerConfig::default().with_bind_address("localhost:9");
        assert!(matches!(bad.socket_addr(), Err(ServerError::InvalidAddress(_))));
    }
}
