//! SOCKS5 type definitions
//!
//! Defines the core types used in SOCKS5 protocol handling.

use super::consts::*;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Handshake stage of a connection
///
/// Stages only ever move forward, except that any stage may jump to
/// [`Stage::Closed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Waiting for `VER NMETHODS METHODS`
    Greeting,
    /// Waiting for the RFC 1929 username/password request
    Authenticating,
    /// Waiting for `VER CMD RSV ATYP DST.ADDR DST.PORT`
    AwaitingRequest,
    /// Relaying raw bytes
    Streaming,
    /// Terminal
    Closed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Greeting => write!(f, "greeting"),
            Stage::Authenticating => write!(f, "authentication"),
            Stage::AwaitingRequest => write!(f, "request"),
            Stage::Streaming => write!(f, "streaming"),
            Stage::Closed => write!(f, "closed"),
        }
    }
}

/// SOCKS5 command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksCommand {
    /// TCP CONNECT - establish a TCP connection to target
    Connect,
    /// TCP BIND - wait for incoming connection (not supported)
    Bind,
    /// UDP ASSOCIATE - establish UDP relay (not supported)
    UdpAssociate,
}

impl SocksCommand {
    /// Parse a command byte into SocksCommand
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => Some(SocksCommand::Connect),
            SOCKS5_CMD_TCP_BIND => Some(SocksCommand::Bind),
            SOCKS5_CMD_UDP_ASSOCIATE => Some(SocksCommand::UdpAssociate),
            _ => None,
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::Bind => write!(f, "BIND"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
        }
    }
}

/// Target address of a CONNECT request
///
/// Keeps the address family the client used, since that decides how the
/// host is rendered for resolution and for the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// ATYP 0x01
    Ipv4(Ipv4Addr, u16),
    /// ATYP 0x03, decoded as UTF-8 (lossy)
    Domain(String, u16),
    /// ATYP 0x04
    Ipv6(Ipv6Addr, u16),
}

impl TargetAddr {
    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ipv4(_, port) | TargetAddr::Domain(_, port) | TargetAddr::Ipv6(_, port) => {
                *port
            }
        }
    }

    /// Get the address type byte for SOCKS5 protocol
    pub fn addr_type(&self) -> u8 {
        match self {
            TargetAddr::Ipv4(..) => SOCKS5_ADDR_TYPE_IPV4,
            TargetAddr::Domain(..) => SOCKS5_ADDR_TYPE_DOMAIN,
            TargetAddr::Ipv6(..) => SOCKS5_ADDR_TYPE_IPV6,
        }
    }

    /// Host as a string
    ///
    /// IPv4 is dotted decimal. IPv6 is eight colon-separated lowercase
    /// hextets without `::` compression, e.g. `0:0:0:0:0:0:0:1`.
    pub fn host(&self) -> String {
        match self {
            TargetAddr::Ipv4(ip, _) => ip.to_string(),
            TargetAddr::Domain(domain, _) => domain.clone(),
            TargetAddr::Ipv6(ip, _) => ip
                .segments()
                .iter()
                .map(|hextet| format!("{:x}", hextet))
                .collect::<Vec<_>>()
                .join(":"),
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host(), self.port())
    }
}
