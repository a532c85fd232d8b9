//! SOCKS5 module for Socksgate
//!
//! This module implements the server side of SOCKS5 (RFC 1928) restricted
//! to username/password authentication (RFC 1929) and the CONNECT command.
//! Parsers work on buffered bytes and never consume a partial unit; the
//! [`Connection`] state machine ties them to a client socket.

pub mod auth;
pub mod command;
mod connection;
pub mod consts;
mod tcp_relay;
mod types;

pub use auth::Credentials;
pub use connection::Connection;
pub use tcp_relay::{connect_target, relay_tcp, RelayEnd, RelayStats};
pub use types::{SocksCommand, Stage, TargetAddr};
