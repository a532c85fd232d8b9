//! Error types for Socksgate
//!
//! This module defines the process-level error type, the per-connection
//! SOCKS5 error taxonomy and the reply codes they map onto.

use crate::socks::Stage;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Process-level error type
///
/// Only startup paths produce these; nothing that happens on a single
/// connection is ever promoted to a `ProxyError`.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address we tried to listen on
        addr: SocketAddr,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },
}

/// SOCKS5 specific errors
///
/// Every variant terminates exactly one connection.
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Transport-level error on either socket
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Unsupported username/password sub-negotiation version
    #[error("Invalid auth version: {0}")]
    InvalidAuthVersion(u8),

    /// No acceptable authentication method
    #[error("No acceptable authentication method")]
    NoAcceptableMethod,

    /// Authentication failed
    #[error("Authentication failed for user: {0}")]
    AuthFailed(String),

    /// Command not supported
    #[error("Command not supported: {0}")]
    CommandNotSupported(u8),

    /// Address type not supported
    #[error("Address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Target host did not resolve
    #[error("Host not found: {host}")]
    HostNotFound {
        /// Host as requested by the client
        host: String,
        /// Resolver error, if the resolver produced one
        #[source]
        source: io::Error,
    },

    /// Outbound connect failed
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        /// Target as requested by the client
        target: String,
        /// Connect error
        #[source]
        source: io::Error,
    },

    /// Client hung up before the handshake completed
    #[error("Client closed connection during {0}")]
    ClientClosed(Stage),
}

impl Socks5Error {
    /// Reply code reported to the client for this error
    ///
    /// Only meaningful for errors raised while handling the request,
    /// before the success reply has gone out.
    pub fn reply_code(&self) -> Socks5ReplyCode {
        match self {
            Socks5Error::CommandNotSupported(_) => Socks5ReplyCode::CommandNotSupported,
            Socks5Error::AddressTypeNotSupported(_) => Socks5ReplyCode::AddressTypeNotSupported,
            Socks5Error::HostNotFound { .. } => Socks5ReplyCode::HostUnreachable,
            Socks5Error::Connect { source, .. } => Socks5ReplyCode::from(source),
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for Socks5ReplyCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Socks5ReplyCode::Succeeded),
            0x01 => Ok(Socks5ReplyCode::GeneralFailure),
            0x02 => Ok(Socks5ReplyCode::ConnectionNotAllowed),
            0x03 => Ok(Socks5ReplyCode::NetworkUnreachable),
            0x04 => Ok(Socks5ReplyCode::HostUnreachable),
            0x05 => Ok(Socks5ReplyCode::ConnectionRefused),
            0x06 => Ok(Socks5ReplyCode::TtlExpired),
            0x07 => Ok(Socks5ReplyCode::CommandNotSupported),
            0x08 => Ok(Socks5ReplyCode::AddressTypeNotSupported),
            other => Err(other),
        }
    }
}

impl From<&io::Error> for Socks5ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Socks5ReplyCode::ConnectionRefused,
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}
