//! Username/password authentication
//!
//! Implements the RFC 1929 sub-negotiation for SOCKS5.

use crate::error::Socks5Error;
use crate::socks::consts::{SOCKS5_AUTH_FAILURE, SOCKS5_AUTH_SUCCESS, SOCKS5_AUTH_VERSION};
use std::borrow::Cow;

/// Username/password request as submitted by the client
///
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
/// +----+------+----------+------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    /// Raw username bytes
    pub username: Vec<u8>,
    /// Raw password bytes
    pub password: Vec<u8>,
}

impl AuthRequest {
    /// Username for log output
    pub fn username_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.username)
    }
}

/// Parse a username/password request from the front of `buf`
///
/// Length fields are read only once they are buffered, so this can be
/// called again after every read.
pub fn parse_auth_request(buf: &[u8]) -> Result<Option<(AuthRequest, usize)>, Socks5Error> {
    if buf.len() < 2 {
        return Ok(None);
    }

    let version = buf[0];
    if version != SOCKS5_AUTH_VERSION {
        return Err(Socks5Error::InvalidAuthVersion(version));
    }

    let username_len = buf[1] as usize;
    let plen_at = 2 + username_len;
    if buf.len() < plen_at + 1 {
        return Ok(None);
    }

    let password_len = buf[plen_at] as usize;
    let len = plen_at + 1 + password_len;
    if buf.len() < len {
        return Ok(None);
    }

    let request = AuthRequest {
        username: buf[2..plen_at].to_vec(),
        password: buf[plen_at + 1..len].to_vec(),
    };
    Ok(Some((request, len)))
}

/// Encode the server's `VER STATUS` response
pub fn encode_auth_status(ok: bool) -> [u8; 2] {
    let status = if ok {
        SOCKS5_AUTH_SUCCESS
    } else {
        SOCKS5_AUTH_FAILURE
    };
    [SOCKS5_AUTH_VERSION, status]
}
