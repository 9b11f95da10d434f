//! cirque Configuration System
//!
//! Loads configuration from YAML files with a cascading priority system:
//! 1. `./cirque.yaml` (current directory - highest priority)
//! 2. `~/.cirque.yaml` (home directory)
//! 3. `~/.config/cirque/cirque.yaml` (user config directory)
//! 4. `/etc/cirque/cirque.yaml` (system - lowest priority)
//!
//! Values from higher priority files override those from lower priority files.
//!
//! # YAML Structure
//!
//! ```yaml
//! admin:
//!   host: "127.0.0.1"
//!   port: 11234
//!   password: "secret"
//!   names:
//!     "fc50:d238:930c:e88d:61a0:4811:90b5:c294": "gateway"
//!   calls:
//!     - function: InterfaceController_peerStats
//! transports:
//!   udp:
//!     bind_addr: "0.0.0.0:0"
//! ```

mod admin;
mod transport;

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use admin::{AdminConfig, ArgValue, CallConfig};
pub use transport::{TransportsConfig, UdpConfig, DEFAULT_MAX_DATAGRAM};

/// Default config filename.
const CONFIG_FILENAME: &str = "cirque.yaml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid admin host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("no admin password configured")]
    MissingPassword,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Admin endpoint configuration (`admin.*`).
    #[serde(default)]
    pub admin: AdminConfig,

    /// Socket configuration (`transports.*`).
    #[serde(default)]
    pub transports: TransportsConfig,
}

impl Config {
    /// Create a new empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the standard search paths.
    ///
    /// Returns a tuple of (config, paths_loaded) where paths_loaded contains
    /// the paths that were successfully loaded.
    pub fn load() -> Result<(Self, Vec<PathBuf>), ConfigError> {
        let search_paths = Self::search_paths();
        Self::load_from_paths(&search_paths)
    }

    /// Load configuration from specific paths.
    ///
    /// Paths are processed in order, with later paths overriding earlier ones.
    pub fn load_from_paths(paths: &[PathBuf]) -> Result<(Self, Vec<PathBuf>), ConfigError> {
        let mut config = Config::default();
        let mut loaded_paths = Vec::new();

        for path in paths {
            if path.exists() {
                let file_config = Self::load_file(path)?;
                config.merge(file_config);
                loaded_paths.push(path.clone());
            }
        }

        Ok((config, loaded_paths))
    }

    /// Load configuration from a single file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the standard search paths in priority order (lowest to highest).
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        paths.push(PathBuf::from("/etc/cirque").join(CONFIG_FILENAME));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cirque").join(CONFIG_FILENAME));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".cirque.yaml"));
        }

        paths.push(PathBuf::from(".").join(CONFIG_FILENAME));

        paths
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, other: Config) {
        self.admin.merge(other.admin);
        self.transports.merge(other.transports);
    }

    /// Resolve the admin endpoint socket address.
    pub fn admin_endpoint(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.admin.host();
        let ip: IpAddr = host.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidHost {
                host: host.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(SocketAddr::new(ip, self.admin.port()))
    }

    /// Get the shared secret, failing if none is configured.
    pub fn password(&self) -> Result<&str, ConfigError> {
        self.admin
            .password
            .as_deref()
            .ok_or(ConfigError::MissingPassword)
    }

    /// Serialize this configuration to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
