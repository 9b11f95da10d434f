//! Admin endpoint configuration (`admin.*`).
//!
//! Where the daemon's admin API listens, the shared secret, keepalive
//! timing, presentation aliases and the calls to run once the function
//! catalog is known.

use serde::{Deserialize, Serialize};
use serde_bencode::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

/// Default admin host.
const DEFAULT_HOST: &str = "127.0.0.1";

/// Default admin port.
const DEFAULT_PORT: u16 = 11234;

/// Idle ticks without any inbound datagram before the session stops.
const DEFAULT_TIMEOUT_TICKS: u32 = 3;

/// Length of one countdown tick.
const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Delay between a ping and the check for its pong.
const DEFAULT_PING_CHECK_MS: u64 = 1000;

/// Default sink for subscribed daemon log entries.
const DEFAULT_LOG_FILE: &str = "admin_api_log";

/// A call argument as written in YAML or on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// Integer argument (bencode `i...e`).
    Int(i64),
    /// String argument (bencode byte string).
    Str(String),
}

impl ArgValue {
    /// Parse a command-line value: integers stay integers, anything else is a string.
    pub fn parse(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) => ArgValue::Int(n),
            Err(_) => ArgValue::Str(s.to_string()),
        }
    }

    /// Convert to a bencode value.
    pub fn to_value(&self) -> Value {
        match self {
            ArgValue::Int(n) => Value::Int(*n),
            ArgValue::Str(s) => Value::Bytes(s.as_bytes().to_vec()),
        }
    }
}

/// A remote function to invoke once discovery completes (`admin.calls[]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallConfig {
    /// Remote function name, e.g. `InterfaceController_peerStats`.
    pub function: String,
    /// Overrides applied on top of the function's registered defaults.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, ArgValue>,
}

impl CallConfig {
    /// Create a call with no overrides.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: BTreeMap::new(),
        }
    }

    /// Argument overrides as bencode values.
    pub fn overrides(&self) -> BTreeMap<String, Value> {
        self.args
            .iter()
            .map(|(k, v)| (k.clone(), v.to_value()))
            .collect()
    }
}

/// Admin API configuration (`admin.*`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Admin host, an IP literal (`admin.host`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Admin UDP port (`admin.port`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Shared secret used to sign calls (`admin.password`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Idle countdown start value, in ticks (`admin.timeout_ticks`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ticks: Option<u32>,

    /// Tick length in milliseconds (`admin.tick_interval_ms`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_interval_ms: Option<u64>,

    /// Ping-to-pong check delay in milliseconds (`admin.ping_check_ms`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping_check_ms: Option<u64>,

    /// Level passed to `AdminLog_subscribe`; no subscription when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// File receiving subscribed log entries (`admin.log_file`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Display aliases keyed by IPv6 address (`admin.names`).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub names: HashMap<String, String>,

    /// Calls engaged once the session is ready (`admin.calls`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallConfig>,
}

impl AdminConfig {
    /// Get the admin host, using default if not configured.
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Get the admin port, using default if not configured.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Get the idle timeout in ticks, using default if not configured.
    pub fn timeout_ticks(&self) -> u32 {
        self.timeout_ticks.unwrap_or(DEFAULT_TIMEOUT_TICKS)
    }

    /// Get the tick interval, using default if not configured.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.unwrap_or(DEFAULT_TICK_INTERVAL_MS))
    }

    /// Get the ping check delay, using default if not configured.
    pub fn ping_check(&self) -> Duration {
        Duration::from_millis(self.ping_check_ms.unwrap_or(DEFAULT_PING_CHECK_MS))
    }

    /// Get the log file path, using default if not configured.
    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }

    /// Merge another admin section into this one.
    ///
    /// Scalars override when present, aliases are unioned, calls replace
    /// when non-empty.
    pub fn merge(&mut self, other: AdminConfig) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.password.is_some() {
            self.password = other.password;
        }
        if other.timeout_ticks.is_some() {
            self.timeout_ticks = other.timeout_ticks;
        }
        if other.tick_interval_ms.is_some() {
            self.tick_interval_ms = other.tick_interval_ms;
        }
        if other.ping_check_ms.is_some() {
            self.ping_check_ms = other.ping_check_ms;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.log_file.is_some() {
            self.log_file = other.log_file;
        }
        self.names.extend(other.names);
        if !other.calls.is_empty() {
            self.calls = other.calls;
        }
    }
}
