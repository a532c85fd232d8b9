//! Configuration module for Socksgate
//!
//! This module provides configuration types and parsing for the proxy.
//! Values come from built-in defaults, then an optional TOML file, then
//! command line / environment overrides.

mod server;
mod tcp;

pub use server::{AuthConfig, Config, LogConfig, ServerConfig};
pub use tcp::TcpConfig;

use anyhow::{Context, Result};
use std::net::IpAddr;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}

/// Values supplied on the command line or through the environment
///
/// Every field that is `Some` replaces the corresponding file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Listen address
    pub bind: Option<IpAddr>,
    /// Listen port
    pub port: Option<u16>,
    /// Auth username
    pub username: Option<String>,
    /// Auth password
    pub password: Option<String>,
    /// Log level
    pub log_level: Option<String>,
    /// JSON log output
    pub json_log: Option<bool>,
}

impl Config {
    /// Apply command line / environment overrides on top of this config
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(username) = overrides.username {
            self.auth.username = Some(username);
        }
        if let Some(password) = overrides.password {
            self.auth.password = Some(password);
        }
        if let Some(level) = overrides.log_level {
            self.log.level = level;
        }
        if let Some(json) = overrides.json_log {
            self.log.json = json;
        }
    }
}
