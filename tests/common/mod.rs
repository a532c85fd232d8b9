//! Test utilities for Socksgate
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use socksgate::config::{AuthConfig, Config, ServerConfig};
use socksgate::server::Server;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Username every test proxy accepts
pub const TEST_USER: &str = "testuser";
/// Password every test proxy accepts
pub const TEST_PASS: &str = "testpass";

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Port that nothing is listening on
pub async fn closed_port() -> u16 {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr.port()
}

/// Spawn an echo server and return its address
pub async fn start_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    spawn_echo(listener);
    addr
}

/// Spawn an echo server on `[::1]`, or `None` if IPv6 loopback is unavailable
pub async fn start_echo_server_v6() -> Option<SocketAddr> {
    let listener = TcpListener::bind("[::1]:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    spawn_echo(listener);
    Some(addr)
}

fn spawn_echo(listener: TcpListener) {
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut r, mut w) = stream.split();
                let _ = tokio::io::copy(&mut r, &mut w).await;
            });
        }
    });
}

/// Proxy configuration bound to an ephemeral loopback port
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            bind: "127.0.0.1".parse().unwrap(),
            port: 0,
        },
        auth: AuthConfig {
            username: Some(TEST_USER.to_string()),
            password: Some(TEST_PASS.to_string()),
        },
        ..Default::default()
    }
}

/// Running proxy; dropping the handle leaves the server task running
pub struct TestProxy {
    /// Listen address
    pub addr: SocketAddr,
    /// Send `true` to stop accepting
    pub shutdown_tx: broadcast::Sender<bool>,
}

/// Start a proxy on an ephemeral port
pub async fn start_proxy() -> TestProxy {
    let server = Server::bind(&test_config()).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(server.run(shutdown_rx));
    TestProxy { addr, shutdown_tx }
}

/// Connect to the proxy and complete greeting plus authentication
pub async fn authenticated_client(proxy: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(proxy).await.unwrap();

    stream
        .write_all(&socks5_mock::create_greeting_password())
        .await
        .unwrap();
    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x02]);

    stream
        .write_all(&socks5_mock::create_auth(TEST_USER, TEST_PASS))
        .await
        .unwrap();
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x01, 0x00]);

    stream
}

/// Read a reply whose bound address is IPv4 (10 bytes)
pub async fn read_ipv4_reply(stream: &mut TcpStream) -> [u8; 10] {
    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    reply
}

/// Mock SOCKS5 handshake data
pub mod socks5_mock {
    use socksgate::socks::consts::*;

    /// Greeting offering only username/password
    pub fn create_greeting_password() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_PASSWORD]
    }

    /// Greeting offering only "no authentication"
    pub fn create_greeting_no_auth() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, 0x00]
    }

    /// RFC 1929 username/password request
    pub fn create_auth(username: &str, password: &str) -> Vec<u8> {
        let mut request = vec![SOCKS5_AUTH_VERSION, username.len() as u8];
        request.extend_from_slice(username.as_bytes());
        request.push(password.len() as u8);
        request.extend_from_slice(password.as_bytes());
        request
    }

    /// Create a request for an arbitrary command to an IPv4 address
    pub fn create_request_ipv4(cmd: u8, ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut request = vec![SOCKS5_VERSION, cmd, SOCKS5_RESERVED, SOCKS5_ADDR_TYPE_IPV4];
        request.extend_from_slice(&ip);
        request.extend_from_slice(&port.to_be_bytes());
        request
    }

    /// Create a connect command to IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        create_request_ipv4(SOCKS5_CMD_TCP_CONNECT, ip, port)
    }

    /// Create a connect command to IPv6 address
    pub fn create_connect_ipv6(ip: [u8; 16], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV6,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }
}
