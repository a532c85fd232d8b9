//! SOCKS5 command parser
//!
//! Parses SOCKS5 command requests from the receive buffer.

use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::socks::types::{SocksCommand, TargetAddr};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Parse a CONNECT request from the front of `buf`
///
/// # SOCKS5 Request Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Version, command and address type are checked, in that order, as
/// soon as the 4-byte header is buffered. The address itself is only
/// decoded once the whole variable-length unit is present.
///
/// # Returns
///
/// The target and the number of bytes the request occupies, or `None`
/// if more bytes are needed.
pub fn parse_request(buf: &[u8]) -> Result<Option<(TargetAddr, usize)>, Socks5Error> {
    if buf.len() < REQUEST_HEADER_LEN {
        return Ok(None);
    }

    let version = buf[0];
    let cmd_byte = buf[1];
    let addr_type = buf[3];

    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    if SocksCommand::from_byte(cmd_byte) != Some(SocksCommand::Connect) {
        return Err(Socks5Error::CommandNotSupported(cmd_byte));
    }

    Ok(decode_address(addr_type, &buf[REQUEST_HEADER_LEN..])?
        .map(|(target, len)| (target, REQUEST_HEADER_LEN + len)))
}

/// Decode `DST.ADDR DST.PORT` for the given ATYP
///
/// `buf` starts right after the ATYP byte. Returns the target and the
/// number of bytes of `buf` it spans.
pub fn decode_address(
    addr_type: u8,
    buf: &[u8],
) -> Result<Option<(TargetAddr, usize)>, Socks5Error> {
    match addr_type {
        SOCKS5_ADDR_TYPE_IPV4 => {
            let len = 4 + PORT_LEN;
            if buf.len() < len {
                return Ok(None);
            }
            let ip = Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3]);
            let port = u16::from_be_bytes([buf[4], buf[5]]);
            Ok(Some((TargetAddr::Ipv4(ip, port), len)))
        }

        SOCKS5_ADDR_TYPE_DOMAIN => {
            // DLEN first, then the rest of the unit depends on it
            let Some(&domain_len) = buf.first() else {
                return Ok(None);
            };
            let domain_end = 1 + domain_len as usize;
            let len = domain_end + PORT_LEN;
            if buf.len() < len {
                return Ok(None);
            }
            let domain = String::from_utf8_lossy(&buf[1..domain_end]).into_owned();
            let port = u16::from_be_bytes([buf[domain_end], buf[domain_end + 1]]);
            Ok(Some((TargetAddr::Domain(domain, port), len)))
        }

        SOCKS5_ADDR_TYPE_IPV6 => {
            let len = 16 + PORT_LEN;
            if buf.len() < len {
                return Ok(None);
            }
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&buf[..16]);
            let port = u16::from_be_bytes([buf[16], buf[17]]);
            Ok(Some((TargetAddr::Ipv6(Ipv6Addr::from(octets), port), len)))
        }

        _ => Err(Socks5Error::AddressTypeNotSupported(addr_type)),
    }
}
