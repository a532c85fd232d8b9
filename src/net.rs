//! TCP socket options
//!
//! Applied to every accepted client socket and every outbound target socket.

use crate::config::TcpConfig;
use std::time::Duration;
use tokio::net::TcpStream;

/// Socket options for proxied connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive idle time
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive probe interval
    pub keepalive_interval: Option<u64>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts {
            nodelay: true,
            keepalive_secs: Some(20),
            keepalive_interval: Some(8),
        }
    }
}

impl SocketOpts {
    /// Create socket options from TCP config
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: config.keepalive_secs,
            keepalive_interval: config.keepalive_interval,
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let Some(time) = self.keepalive_secs {
            let mut keepalive = socket2::TcpKeepalive::new().with_time(Duration::from_secs(time));
            if let Some(interval) = self.keepalive_interval {
                keepalive = keepalive.with_interval(Duration::from_secs(interval));
            }
            socket2::SockRef::from(stream).set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }

    /// Apply options, logging instead of failing
    pub fn apply_or_warn(&self, stream: &TcpStream) {
        if let Err(e) = self.apply(stream) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }
    }
}
