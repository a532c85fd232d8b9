//! SOCKS5 reply builder
//!
//! Constructs SOCKS5 reply messages.

use crate::error::Socks5ReplyCode;
use crate::socks::consts::*;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Build a SOCKS5 reply
///
/// # SOCKS5 Reply Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// See [`encode_bound_addr`] for how `bound_host` is encoded.
pub fn encode_reply(code: Socks5ReplyCode, bound_host: &str, bound_port: u16) -> Vec<u8> {
    let (addr_type, addr) = encode_bound_addr(bound_host);

    let mut reply = Vec::with_capacity(4 + addr.len() + PORT_LEN);
    reply.extend_from_slice(&[SOCKS5_VERSION, code.into(), SOCKS5_RESERVED, addr_type]);
    reply.extend_from_slice(&addr);
    reply.extend_from_slice(&bound_port.to_be_bytes());
    reply
}

/// Encode a bound host as `(ATYP, BND.ADDR)`
///
/// Anything that is not an IPv4 or IPv6 literal becomes IPv4 `0.0.0.0`.
///
/// IPv6 is expanded by splitting on `:` and reading each piece as a hex
/// hextet. If that does not yield exactly 16 bytes, which is the case for
/// every `::`-compressed form, 16 zero bytes are sent instead.
pub fn encode_bound_addr(host: &str) -> (u8, Vec<u8>) {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return (SOCKS5_ADDR_TYPE_IPV4, ip.octets().to_vec());
    }

    if host.parse::<Ipv6Addr>().is_ok() {
        let mut addr: Vec<u8> = host
            .split(':')
            .flat_map(|hextet| {
                u16::from_str_radix(hextet, 16)
                    .unwrap_or(0)
                    .to_be_bytes()
            })
            .collect();
        if addr.len() != 16 {
            addr = vec![0u8; 16];
        }
        return (SOCKS5_ADDR_TYPE_IPV6, addr);
    }

    (SOCKS5_ADDR_TYPE_IPV4, Ipv4Addr::UNSPECIFIED.octets().to_vec())
}

/// Send a reply with the given bound address
pub async fn send_reply<S>(
    stream: &mut S,
    code: Socks5ReplyCode,
    bound_host: &str,
    bound_port: u16,
) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream
        .write_all(&encode_reply(code, bound_host, bound_port))
        .await?;
    stream.flush().await
}

/// Send a failure reply carrying `0.0.0.0:0`
pub async fn send_failure<S>(stream: &mut S, code: Socks5ReplyCode) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    send_reply(stream, code, "0.0.0.0", 0).await
}
