//! SOCKS5 command parsing module
//!
//! Handles parsing SOCKS5 requests and building replies.

mod parser;
mod reply;

pub use parser::{decode_address, parse_request};
pub use reply::{encode_bound_addr, encode_reply, send_failure, send_reply};
