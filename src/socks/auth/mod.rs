//! SOCKS5 authentication module
//!
//! Handles method negotiation and holds the configured credentials.
//! Only username/password (method 0x02) is ever selected.

mod password;

pub use password::{encode_auth_status, parse_auth_request, AuthRequest};

use super::consts::*;
use crate::error::Socks5Error;
use std::fmt;

/// Username/password pair every client must present
///
/// Compared byte for byte against what the client submits.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Configured username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Check a submitted username/password pair
    pub fn matches(&self, username: &[u8], password: &[u8]) -> bool {
        self.username.as_bytes() == username && self.password.as_bytes() == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client greeting
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     | 1 to 255 |
/// +----+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    /// Methods offered by the client, in the order sent
    pub methods: Vec<u8>,
}

impl Greeting {
    /// Whether the client offered username/password
    pub fn offers_password(&self) -> bool {
        self.methods.contains(&SOCKS5_AUTH_METHOD_PASSWORD)
    }
}

/// Parse a greeting from the front of `buf`
///
/// Returns `Ok(None)` until the whole greeting is buffered. The version is
/// rejected as soon as the first two bytes are present.
pub fn parse_greeting(buf: &[u8]) -> Result<Option<(Greeting, usize)>, Socks5Error> {
    if buf.len() < 2 {
        return Ok(None);
    }

    let version = buf[0];
    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let len = 2 + buf[1] as usize;
    if buf.len() < len {
        return Ok(None);
    }

    let greeting = Greeting {
        methods: buf[2..len].to_vec(),
    };
    Ok(Some((greeting, len)))
}

/// Encode the server's method selection message
pub fn encode_method_selection(method: u8) -> [u8; 2] {
    [SOCKS5_VERSION, method]
}
