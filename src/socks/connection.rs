//! Per-connection SOCKS5 state machine
//!
//! A [`Connection`] owns the client socket, the receive buffer and, once
//! the CONNECT succeeds, the target socket. It is driven by a single task,
//! so none of its state needs synchronisation.
//!
//! # Protocol Flow
//!
//! 1. Greeting: only username/password (0x02) is selected
//! 2. RFC 1929 username/password check
//! 3. CONNECT request parsing and outbound connect
//! 4. Raw byte relay until either side closes
//!
//! Every handshake stage parses from the receive buffer and only consumes
//! a unit once it is complete, so clients may send any number of bytes
//! per write, including one byte at a time or several messages at once.

use crate::error::{Socks5Error, Socks5ReplyCode};
use crate::net::SocketOpts;
use crate::socks::auth::{
    encode_auth_status, encode_method_selection, parse_auth_request, parse_greeting, Credentials,
};
use crate::socks::command::{parse_request, send_failure, send_reply};
use crate::socks::consts::*;
use crate::socks::tcp_relay::{connect_target, relay_tcp, RelayStats};
use crate::socks::types::{SocksCommand, Stage, TargetAddr};
use bytes::{Buf, BytesMut};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

/// One proxied client connection
pub struct Connection<S> {
    inbound: S,
    credentials: Arc<Credentials>,
    socket_opts: SocketOpts,
    stage: Stage,
    buffer: BytesMut,
    outbound: Option<TcpStream>,
    target: Option<TargetAddr>,
    stats: RelayStats,
    closed: bool,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a connection in the greeting stage
    pub fn new(inbound: S, credentials: Arc<Credentials>) -> Self {
        Connection {
            inbound,
            credentials,
            socket_opts: SocketOpts::default(),
            stage: Stage::Greeting,
            buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            outbound: None,
            target: None,
            stats: RelayStats::default(),
            closed: false,
        }
    }

    /// Set the options applied to the outbound socket
    pub fn with_socket_opts(mut self, opts: SocketOpts) -> Self {
        self.socket_opts = opts;
        self
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Bytes relayed so far
    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Target requested by the client, once the request has been parsed
    pub fn target(&self) -> Option<&TargetAddr> {
        self.target.as_ref()
    }

    /// Whether teardown has run
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Drive the connection to completion
    ///
    /// Runs the handshake, then the relay, and always tears both sockets
    /// down before returning, whichever way it ends.
    pub async fn run(&mut self) -> Result<RelayStats, Socks5Error> {
        let result = self.drive().await;
        self.close().await;
        result.map(|_| self.stats)
    }

    /// Release both sockets
    ///
    /// Safe to call more than once; only the first call does anything.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.stage = Stage::Closed;

        if let Some(mut outbound) = self.outbound.take() {
            if let Err(e) = outbound.shutdown().await {
                trace!("Outbound shutdown: {}", e);
            }
        }
        if let Err(e) = self.inbound.shutdown().await {
            trace!("Inbound shutdown: {}", e);
        }
    }

    async fn drive(&mut self) -> Result<(), Socks5Error> {
        loop {
            match self.stage {
                Stage::Streaming => return self.relay().await,
                Stage::Closed => return Ok(()),
                _ => {}
            }

            if !self.advance().await? {
                self.fill_buffer().await?;
            }
        }
    }

    /// Append one read's worth of client bytes to the buffer
    async fn fill_buffer(&mut self) -> Result<(), Socks5Error> {
        let n = self.inbound.read_buf(&mut self.buffer).await?;
        if n == 0 {
            return Err(Socks5Error::ClientClosed(self.stage));
        }
        trace!("Read {} bytes during {}", n, self.stage);
        Ok(())
    }

    /// Try to complete the current stage from buffered bytes
    ///
    /// Returns `Ok(false)` when more input is needed; nothing has been
    /// consumed in that case.
    async fn advance(&mut self) -> Result<bool, Socks5Error> {
        match self.stage {
            Stage::Greeting => self.handle_greeting().await,
            Stage::Authenticating => self.handle_auth().await,
            Stage::AwaitingRequest => self.handle_request().await,
            Stage::Streaming | Stage::Closed => Ok(false),
        }
    }

    async fn handle_greeting(&mut self) -> Result<bool, Socks5Error> {
        let parsed =
            parse_greeting(&self.buffer).inspect_err(|e| warn!("Invalid greeting: {}", e))?;
        let Some((greeting, len)) = parsed else {
            return Ok(false);
        };
        self.buffer.advance(len);

        if !greeting.offers_password() {
            info!(
                "No acceptable auth methods from client (offered {:?})",
                greeting.methods
            );
            self.write(&encode_method_selection(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE))
                .await?;
            return Err(Socks5Error::NoAcceptableMethod);
        }

        self.write(&encode_method_selection(SOCKS5_AUTH_METHOD_PASSWORD))
            .await?;
        self.stage = Stage::Authenticating;
        Ok(true)
    }

    async fn handle_auth(&mut self) -> Result<bool, Socks5Error> {
        let parsed =
            parse_auth_request(&self.buffer).inspect_err(|e| warn!("Bad auth request: {}", e))?;
        let Some((request, len)) = parsed else {
            return Ok(false);
        };
        self.buffer.advance(len);

        let ok = self.credentials.matches(&request.username, &request.password);
        self.write(&encode_auth_status(ok)).await?;

        let username = request.username_lossy();
        if !ok {
            info!("Auth failed for user {}", username);
            return Err(Socks5Error::AuthFailed(username.into_owned()));
        }

        info!("Auth success user {}", username);
        self.stage = Stage::AwaitingRequest;
        Ok(true)
    }

    async fn handle_request(&mut self) -> Result<bool, Socks5Error> {
        let parsed = match parse_request(&self.buffer) {
            Ok(parsed) => parsed,
            Err(err) => return Err(self.reject_request(err).await),
        };
        let Some((target, len)) = parsed else {
            return Ok(false);
        };
        self.buffer.advance(len);

        info!("CONNECT {}", target);
        self.target = Some(target.clone());

        let outbound = match connect_target(&target, &self.socket_opts).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!("Remote connect to {} failed: {}", target, err);
                return Err(self.reject_request(err).await);
            }
        };
        info!("Connected to remote {}", target);
        self.outbound = Some(outbound);

        send_reply(
            &mut self.inbound,
            Socks5ReplyCode::Succeeded,
            &target.host(),
            target.port(),
        )
        .await?;
        self.stage = Stage::Streaming;
        Ok(true)
    }

    /// Send whatever reply the request error calls for, then hand it back
    async fn reject_request(&mut self, err: Socks5Error) -> Socks5Error {
        let needs_reply = match &err {
            Socks5Error::UnsupportedVersion(version) => {
                warn!("Invalid version {} in request", version);
                false
            }
            Socks5Error::CommandNotSupported(cmd) => {
                match SocksCommand::from_byte(*cmd) {
                    Some(command) => info!("Unsupported command {}", command),
                    None => info!("Unsupported command {:#04x}", cmd),
                }
                true
            }
            Socks5Error::AddressTypeNotSupported(addr_type) => {
                info!("Address type not supported {:#04x}", addr_type);
                true
            }
            _ => true,
        };

        if needs_reply {
            if let Err(e) = send_failure(&mut self.inbound, err.reply_code()).await {
                debug!("Failed to send failure reply: {}", e);
            }
        }
        err
    }

    async fn relay(&mut self) -> Result<(), Socks5Error> {
        let Some(outbound) = self.outbound.as_mut() else {
            return Ok(());
        };
        // Anything the client pipelined behind the request is payload
        let pending = self.buffer.split();

        let result = relay_tcp(&mut self.inbound, outbound, &pending, &mut self.stats).await;

        let (host, port) = self
            .target
            .as_ref()
            .map(|t| (t.host(), t.port()))
            .unwrap_or_default();
        match &result {
            Ok(end) => info!(
                host = %host,
                port,
                up = self.stats.upstream,
                down = self.stats.downstream,
                "Tunnel closed by {}",
                end
            ),
            Err(e) => warn!(
                host = %host,
                port,
                up = self.stats.upstream,
                down = self.stats.downstream,
                "Tunnel closed on error: {}",
                e
            ),
        }

        result.map(|_| ()).map_err(Socks5Error::from)
    }

    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inbound.write_all(bytes).await?;
        self.inbound.flush().await
    }
}
