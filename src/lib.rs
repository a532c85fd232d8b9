//! # Socksgate - SOCKS5 Proxy Endpoint
//!
//! Socksgate is a small SOCKS5 (RFC 1928) proxy that accepts TCP clients,
//! requires username/password authentication (RFC 1929), opens the
//! requested outbound TCP connection and relays bytes in both directions.
//!
//! ## Features
//!
//! - **Username/Password Only**: clients that do not offer method 0x02 are turned away
//! - **CONNECT Only**: BIND and UDP ASSOCIATE are answered with "command not supported"
//! - **Re-entrant Parsing**: handshake messages may arrive split or coalesced arbitrarily
//! - **Traffic Accounting**: per-tunnel upstream/downstream byte counts are logged on close
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksgate::config::load_config;
//! use socksgate::server::run_server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     config.validate()?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_server(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! The [`server::Server`] accepts sockets and spawns one task per client.
//! Each task owns a [`socks::Connection`], which walks the handshake
//! stages and then relays until either side closes.
//!
//! ```text
//! SOCKS5 Client -> Socksgate -> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod net;
pub mod server;
pub mod socks;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{ProxyError, Socks5Error, Socks5ReplyCode};
pub use server::{run_server, Server};

/// Version of the Socksgate library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
