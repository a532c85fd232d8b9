//! TCP relay for SOCKS5 CONNECT command
//!
//! Establishes the outbound connection to the target and relays data
//! bidirectionally, counting bytes in each direction.

use crate::error::Socks5Error;
use crate::net::SocketOpts;
use crate::socks::consts::DEFAULT_BUFFER_SIZE;
use crate::socks::types::TargetAddr;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Bytes moved through a tunnel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Client to target
    pub upstream: u64,
    /// Target to client
    pub downstream: u64,
}

/// Side whose read finished first and ended the tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// Client closed or errored
    Client,
    /// Target closed or errored
    Target,
}

impl fmt::Display for RelayEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayEnd::Client => write!(f, "client"),
            RelayEnd::Target => write!(f, "remote"),
        }
    }
}

/// Connect to the requested target
///
/// Resolution failures surface as [`Socks5Error::HostNotFound`]; every
/// resolved address is tried in order and the last connect error is
/// reported as [`Socks5Error::Connect`]. An empty domain dials `localhost`.
pub async fn connect_target(
    target: &TargetAddr,
    opts: &SocketOpts,
) -> Result<TcpStream, Socks5Error> {
    let mut host = target.host();
    if host.is_empty() {
        host = "localhost".to_string();
    }

    // The lookup result borrows `host`, so the error arm clones it
    let addrs: Vec<SocketAddr> = match tokio::net::lookup_host((host.as_str(), target.port())).await
    {
        Ok(addrs) => addrs.collect(),
        Err(source) => {
            return Err(Socks5Error::HostNotFound {
                host: host.clone(),
                source,
            })
        }
    };

    if addrs.is_empty() {
        return Err(Socks5Error::HostNotFound {
            host,
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
        });
    }

    let mut last_err = None;
    for addr in addrs {
        debug!("Connecting to target: {}", addr);
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                opts.apply_or_warn(&stream);
                return Ok(stream);
            }
            Err(e) => {
                debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(Socks5Error::Connect {
        target: target.to_string(),
        source: last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotConnected)),
    })
}

/// Relay data bidirectionally between client and target
///
/// `pending` holds client bytes that were already buffered past the
/// request; they are written to the target before anything else.
/// Returns as soon as either direction hits EOF or an error: this is not
/// a half-close capable relay. `stats` is updated as bytes are written,
/// so it stays accurate even when an error is returned.
pub async fn relay_tcp<A, B>(
    client: &mut A,
    target: &mut B,
    pending: &[u8],
    stats: &mut RelayStats,
) -> io::Result<RelayEnd>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    if !pending.is_empty() {
        target.write_all(pending).await?;
        target.flush().await?;
        stats.upstream += pending.len() as u64;
    }

    let (mut client_read, mut client_write) = tokio::io::split(client);
    let (mut target_read, mut target_write) = tokio::io::split(target);
    let RelayStats {
        upstream,
        downstream,
    } = stats;

    let client_to_target = copy_counted(&mut client_read, &mut target_write, upstream);
    let target_to_client = copy_counted(&mut target_read, &mut client_write, downstream);

    tokio::select! {
        result = client_to_target => result.map(|_| RelayEnd::Client),
        result = target_to_client => result.map(|_| RelayEnd::Target),
    }
}

async fn copy_counted<R, W>(reader: &mut R, writer: &mut W, counter: &mut u64) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..n]).await?;
        writer.flush().await?;
        *counter += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Socks5ReplyCode;
    use std::net::Ipv4Addr;
    use std::time::Duration;
    use tokio::io::duplex;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_relay_tcp_bidirectional() {
        let (mut client_a, mut server_a) = duplex(1024);
        let (mut client_b, mut server_b) = duplex(1024);

        let relay_handle = tokio::spawn(async move {
            let mut stats = RelayStats::default();
            let end = relay_tcp(&mut server_a, &mut server_b, &[], &mut stats).await;
            (end, stats)
        });

        client_a.write_all(b"message A->B").await.unwrap();
        let mut buf_b = vec![0u8; 12];
        client_b.read_exact(&mut buf_b).await.unwrap();
        assert_eq!(&buf_b, b"message A->B");

        client_b.write_all(b"B->A").await.unwrap();
        let mut buf_a = vec![0u8; 4];
        client_a.read_exact(&mut buf_a).await.unwrap();
        assert_eq!(&buf_a, b"B->A");

        drop(client_a);

        let (end, stats) = tokio::time::timeout(Duration::from_secs(1), relay_handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(end.unwrap(), RelayEnd::Client);
        assert_eq!(stats.upstream, 12);
        assert_eq!(stats.downstream, 4);
    }

    #[tokio::test]
    async fn test_relay_tcp_forwards_pending_first() {
        let (client_a, mut server_a) = duplex(1024);
        let (mut client_b, mut server_b) = duplex(1024);

        let relay_handle = tokio::spawn(async move {
            let mut stats = RelayStats::default();
            let end = relay_tcp(&mut server_a, &mut server_b, b"early", &mut stats).await;
            (end, stats)
        });

        let mut buf = vec![0u8; 5];
        client_b.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"early");

        drop(client_a);
        let (_, stats) = tokio::time::timeout(Duration::from_secs(1), relay_handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.upstream, 5);
        assert_eq!(stats.downstream, 0);
    }

    #[tokio::test]
    async fn test_relay_tcp_ends_when_target_closes() {
        let (_client_a, mut server_a) = duplex(1024);
        let (client_b, mut server_b) = duplex(1024);

        let relay_handle = tokio::spawn(async move {
            let mut stats = RelayStats::default();
            relay_tcp(&mut server_a, &mut server_b, &[], &mut stats).await
        });

        drop(client_b);

        let end = tokio::time::timeout(Duration::from_secs(1), relay_handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(end, RelayEnd::Target);
    }

    #[tokio::test]
    async fn test_relay_tcp_large_data() {
        let (mut client_a, mut server_a) = duplex(65536);
        let (mut client_b, mut server_b) = duplex(65536);

        let relay_handle = tokio::spawn(async move {
            let mut stats = RelayStats::default();
            let _ = relay_tcp(&mut server_a, &mut server_b, &[], &mut stats).await;
            stats
        });

        let large_data = vec![0xAB; 50000];
        client_a.write_all(&large_data).await.unwrap();

        let mut received = vec![0u8; 50000];
        client_b.read_exact(&mut received).await.unwrap();
        assert_eq!(received, large_data);

        drop(client_a);
        let stats = tokio::time::timeout(Duration::from_secs(1), relay_handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.upstream, 50000);
    }

    #[test]
    fn test_relay_end_display() {
        assert_eq!(RelayEnd::Client.to_string(), "client");
        assert_eq!(RelayEnd::Target.to_string(), "remote");
    }

    #[tokio::test]
    async fn test_connect_target_success() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let target = TargetAddr::Ipv4(Ipv4Addr::LOCALHOST, port);
        let stream = connect_target(&target, &SocketOpts::default()).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn test_connect_target_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = TargetAddr::Ipv4(Ipv4Addr::LOCALHOST, port);
        let err = connect_target(&target, &SocketOpts::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Socks5Error::Connect { .. }));
        assert_eq!(err.reply_code(), Socks5ReplyCode::ConnectionRefused);
    }

    #[tokio::test]
    async fn test_connect_target_empty_domain_dials_localhost() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let target = TargetAddr::Domain(String::new(), port);
        let stream = connect_target(&target, &SocketOpts::default()).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
        assert!(stream.peer_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_connect_target_unresolvable_domain() {
        let target = TargetAddr::Domain("this-domain-does-not-exist-12345.invalid".to_string(), 80);
        let err = connect_target(&target, &SocketOpts::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Socks5Error::HostNotFound { .. }));
        assert_eq!(err.reply_code(), Socks5ReplyCode::HostUnreachable);
    }
}
