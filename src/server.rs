//! TCP listener
//!
//! Accepts client connections and hands each one to its own
//! [`Connection`] task until shutdown is signalled.

use crate::config::Config;
use crate::error::{ProxyError, Socks5Error};
use crate::net::SocketOpts;
use crate::socks::{Connection, Credentials};
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Listening SOCKS5 proxy
pub struct Server {
    listener: TcpListener,
    credentials: Arc<Credentials>,
    socket_opts: SocketOpts,
}

impl Server {
    /// Bind the listener described by `config`
    ///
    /// The config is expected to have been validated already; missing
    /// credentials still surface as [`ProxyError::Config`].
    pub async fn bind(config: &Config) -> Result<Self, ProxyError> {
        let credentials = Arc::new(config.credentials()?);
        let addr = config.listen_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ProxyError::Bind { addr, source })?;

        Ok(Server {
            listener,
            credentials,
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, ProxyError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until shutdown
    ///
    /// In-flight connections are left to finish on their own tasks.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        let addr = self.local_addr()?;
        info!("Listening on {}", addr);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => error!("Failed to accept connection: {}", e),
                },
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping listener");
                    break;
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        self.socket_opts.apply_or_warn(&stream);
        let credentials = self.credentials.clone();
        let socket_opts = self.socket_opts;

        tokio::spawn(
            async move {
                info!("Incoming connection");
                let mut conn = Connection::new(stream, credentials).with_socket_opts(socket_opts);
                match conn.run().await {
                    Ok(stats) => debug!(
                        up = stats.upstream,
                        down = stats.downstream,
                        "Connection finished"
                    ),
                    Err(Socks5Error::ClientClosed(stage)) => {
                        debug!("Client closed connection during {}", stage)
                    }
                    Err(Socks5Error::Io(e)) => warn!("Connection error: {}", e),
                    Err(e) => info!("Connection rejected: {}", e),
                }
            }
            .instrument(info_span!("conn", peer = %peer)),
        );
    }
}

/// Bind and run the proxy until shutdown
pub async fn run_server(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    let server = Server::bind(&config).await?;
    server.run(shutdown_rx).await
}
