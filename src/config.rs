//! Configuration file model.
//!
//! Configurations are TOML:
//!
//! ```toml
//! [serial]
//! device = "/dev/ttyUSB0"
//! speed = 115200
//!
//! [timeout]
//! script = "2m"
//! receive = "10s"
//!
//! [[script]]
//! name = "login"
//! body = """
//! send 'root'
//! expect "#"
//! """
//!
//! [[try]]
//! name = "safe-login"
//! script = "login"
//! except = "recover"
//! retry = true
//! ```

use crate::error::{Error, Result};
use crate::parser::parse_duration;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Script timeout used when the configuration does not set one.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Receive timeout used when the configuration does not set one.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// A complete configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub serial: SerialConfig,
    pub timeout: TimeoutConfig,
    #[serde(rename = "script")]
    pub scripts: Vec<NamedScript>,
    #[serde(rename = "try")]
    pub tries: Vec<TryBlock>,
}

impl Config {
    /// Read and parse a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        content.parse()
    }

    /// The effective timeouts, with defaults filled in.
    pub fn timeouts(&self) -> Result<Timeouts> {
        self.timeout.resolve()
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }
}

/// The serial line to open in live mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub device: String,
    /// Baud rate.
    pub speed: u32,
    /// `true` selects even parity.
    pub parity: bool,
    /// Data bits, 5 through 8.
    pub bits: u8,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed: 115_200,
            parity: false,
            bits: 8,
        }
    }
}

/// Timeout literals as written in the configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    pub script: Option<String>,
    pub receive: Option<String>,
}

impl TimeoutConfig {
    pub fn resolve(&self) -> Result<Timeouts> {
        let parse = |literal: &Option<String>, what: &str, default: Duration| match literal {
            Some(s) if !s.trim().is_empty() => parse_duration(s)
                .map_err(|e| Error::Config(format!("invalid {what} timeout: {e}"))),
            _ => Ok(default),
        };
        Ok(Timeouts {
            script: parse(&self.script, "script", DEFAULT_SCRIPT_TIMEOUT)?,
            receive: parse(&self.receive, "receive", DEFAULT_RECEIVE_TIMEOUT)?,
        })
    }
}

/// Effective timeouts for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Upper bound on the whole session.
    pub script: Duration,
    /// Upper bound on any single expect.
    pub receive: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            script: DEFAULT_SCRIPT_TIMEOUT,
            receive: DEFAULT_RECEIVE_TIMEOUT,
        }
    }
}

/// A script body, optionally named.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamedScript {
    #[serde(default)]
    pub name: String,
    pub body: String,
}

/// A try-block: run `script`, optionally retry once, and fall back to
/// `except` when every attempt fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TryBlock {
    #[serde(default)]
    pub name: String,
    pub script: String,
    #[serde(default)]
    pub except: Option<String>,
    #[serde(default)]
    pub retry: bool,
}

impl TryBlock {
    /// The except script name, treating an empty name as none.
    pub fn except_script(&self) -> Option<&str> {
        self.except.as_deref().filter(|name| !name.is_empty())
    }
}
