//! SOCKS5 protocol constants
//!
//! Defines all constants used in the SOCKS5 protocol implementation.

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

/// SOCKS5 authentication sub-negotiation version (RFC 1929)
pub const SOCKS5_AUTH_VERSION: u8 = 0x01;

// Authentication methods
/// Username/password authentication, the only method we accept
pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;
/// No acceptable methods
pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xFF;

// Username/password status
/// Credentials accepted
pub const SOCKS5_AUTH_SUCCESS: u8 = 0x00;
/// Credentials rejected
pub const SOCKS5_AUTH_FAILURE: u8 = 0x01;

// Commands
/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;
/// TCP BIND command (not supported)
pub const SOCKS5_CMD_TCP_BIND: u8 = 0x02;
/// UDP ASSOCIATE command (not supported)
pub const SOCKS5_CMD_UDP_ASSOCIATE: u8 = 0x03;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

// Unit lengths
/// VER CMD RSV ATYP
pub const REQUEST_HEADER_LEN: usize = 4;
/// Port field
pub const PORT_LEN: usize = 2;
/// IPv4 request: header + 4 address bytes + port
pub const IPV4_REQUEST_LEN: usize = REQUEST_HEADER_LEN + 4 + PORT_LEN;
/// IPv6 request: header + 16 address bytes + port
pub const IPV6_REQUEST_LEN: usize = REQUEST_HEADER_LEN + 16 + PORT_LEN;

/// Read size for the handshake and relay buffers
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socks5_version() {
        assert_eq!(SOCKS5_VERSION, 5);
        assert_eq!(SOCKS5_AUTH_VERSION, 1);
    }

    #[test]
    fn test_request_lengths() {
        assert_eq!(IPV4_REQUEST_LEN, 10);
        assert_eq!(IPV6_REQUEST_LEN, 22);
    }

    #[test]
    fn test_address_types() {
        assert_eq!(SOCKS5_ADDR_TYPE_IPV4, 1);
        assert_eq!(SOCKS5_ADDR_TYPE_DOMAIN, 3);
        assert_eq!(SOCKS5_ADDR_TYPE_IPV6, 4);
    }
}
