//! Server configuration types
//!
//! Defines the main configuration structures for the proxy.

use super::TcpConfig;
use crate::error::ProxyError;
use crate::socks::Credentials;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::Level;

/// Longest username or password RFC 1929 can carry
const MAX_CREDENTIAL_LEN: usize = 255;

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    1080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Credentials clients must present
    #[serde(default)]
    pub auth: AuthConfig,

    /// Socket options
    #[serde(default)]
    pub tcp: TcpConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Listener configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    /// Port to listen on (1-65535)
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Username/password configuration
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    /// Username for SOCKS5 auth
    #[serde(default)]
    pub username: Option<String>,

    /// Password for SOCKS5 auth
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of plain text
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Maximum tracing level; unknown names fall back to INFO
    pub fn max_level(&self) -> Level {
        match self.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

impl Config {
    /// Socket address the listener binds to
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.bind, self.server.port)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.server.port == 0 {
            return Err(ProxyError::Config(
                "port must be between 1 and 65535".to_string(),
            ));
        }
        self.credentials().map(|_| ())
    }

    /// Credentials every client must present
    pub fn credentials(&self) -> Result<Credentials, ProxyError> {
        let username = required_credential("username", self.auth.username.as_deref())?;
        let password = required_credential("password", self.auth.password.as_deref())?;
        Ok(Credentials::new(username, password))
    }
}

fn required_credential<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, ProxyError> {
    match value {
        None | Some("") => Err(ProxyError::Config(format!(
            "{} must be set for username/password auth",
            name
        ))),
        Some(v) if v.len() > MAX_CREDENTIAL_LEN => Err(ProxyError::Config(format!(
            "{} must be at most {} bytes",
            name, MAX_CREDENTIAL_LEN
        ))),
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            auth: AuthConfig {
                username: Some("user".to_string()),
                password: Some("pass".to_string()),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.port, 1080);
        assert_eq!(config.listen_addr(), "0.0.0.0:1080".parse().unwrap());
        assert!(config.auth.username.is_none());
        assert_eq!(config.log.level, "info");
        assert!(!config.log.json);
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
        let creds = valid_config().credentials().unwrap();
        assert!(creds.matches(b"user", b"pass"));
    }

    #[test]
    fn test_validate_port_zero() {
        let mut config = valid_config();
        config.server.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_validate_missing_credentials() {
        let mut config = valid_config();
        config.auth.username = None;
        assert!(config.validate().unwrap_err().to_string().contains("username"));

        let mut config = valid_config();
        config.auth.password = Some(String::new());
        assert!(config.validate().unwrap_err().to_string().contains("password"));
    }

    #[test]
    fn test_validate_credential_too_long() {
        let mut config = valid_config();
        config.auth.password = Some("x".repeat(256));
        assert!(config.validate().is_err());

        config.auth.password = Some("x".repeat(255));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_parsing() {
        let level = |s: &str| {
            LogConfig {
                level: s.to_string(),
                json: false,
            }
            .max_level()
        };
        assert_eq!(level("trace"), Level::TRACE);
        assert_eq!(level("DEBUG"), Level::DEBUG);
        assert_eq!(level("warning"), Level::WARN);
        assert_eq!(level("error"), Level::ERROR);
        assert_eq!(level("verbose"), Level::INFO);
    }

    #[test]
    fn test_auth_config_debug_redacts_password() {
        let config = valid_config();
        let debug_str = format!("{:?}", config.auth);
        assert!(debug_str.contains("user"));
        assert!(!debug_str.contains("pass\""));
        assert!(debug_str.contains("<redacted>"));
    }
}
