//! TCP socket configuration
//!
//! Options applied to client and target sockets.

use serde::{Deserialize, Serialize};

fn default_nodelay() -> bool {
    true
}

/// Default keepalive seconds
fn default_keepalive_secs() -> Option<u64> {
    Some(20)
}

/// Default keepalive interval
fn default_keepalive_interval() -> Option<u64> {
    Some(8)
}

/// TCP socket configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TcpConfig {
    /// Enable TCP_NODELAY
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// TCP keepalive idle time in seconds, `None` disables keepalive
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: Option<u64>,

    /// TCP keepalive probe interval in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: Option<u64>,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            nodelay: default_nodelay(),
            keepalive_secs: default_keepalive_secs(),
            keepalive_interval: default_keepalive_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_config_default() {
        let config = TcpConfig::default();
        assert!(config.nodelay);
        assert_eq!(config.keepalive_secs, Some(20));
        assert_eq!(config.keepalive_interval, Some(8));
    }

    #[test]
    fn test_tcp_config_partial_toml() {
        let config: TcpConfig = toml::from_str("nodelay = false").unwrap();
        assert!(!config.nodelay);
        assert_eq!(config.keepalive_secs, Some(20));
    }
}
