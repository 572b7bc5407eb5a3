//! The wire header: one ASCII line, `FileName:<name>\n`, no escaping.
//!
//! Filenames containing `\n` are out of contract; everything after the first
//! newline is raw file content, end of stream is the peer closing the
//! connection.

use crate::config::HEADER_PREFIX;
use crate::transfer::TransferError;

/// Canonical header line for `name`, including the trailing newline.
pub fn encode_header(name: &str) -> Vec<u8> {
    let mut line = Vec::with_capacity(HEADER_PREFIX.len() + name.len() + 1);
    line.extend_from_slice(HEADER_PREFIX.as_bytes());
    line.extend_from_slice(name.as_bytes());
    line.push(b'\n');
    line
}

/// Parse a received header line (trailing newline already stripped or not)
/// into the transferred file's name.
pub fn parse_header(line: &[u8]) -> Result<String, TransferError> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim_end_matches(['\n', '\r']);
    match text.strip_prefix(HEADER_PREFIX) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(TransferError::MalformedHeader(text.to_string())),
    }
}
