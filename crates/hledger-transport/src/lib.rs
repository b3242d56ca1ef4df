//! Content-Length framed message transport, per the LSP base protocol.
//!
//! Stdout carries the protocol, so nothing here may ever print to it;
//! logging goes through `tracing` to stderr.

#![deny(unsafe_code)]

use hledger_protocol::{JsonRpcRequest, JsonRpcResponse};
use std::io::{self, BufRead, Read, Write};

/// Read one framed message.
///
/// Returns `Ok(None)` on EOF or an unparseable frame (both recoverable:
/// the caller just reads the next frame); `Err` only on real I/O errors.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<JsonRpcRequest>> {
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None); // EOF
        }
        let line = line.trim_end();
        if line.is_empty() {
            break; // end of headers
        }
        if let Some((key, value)) = line.split_once(": ") {
            if key.eq_ignore_ascii_case("Content-Length") {
                content_length = value.parse().ok();
            }
        }
    }

    let Some(length) = content_length else {
        tracing::warn!("frame without Content-Length header, skipping");
        return Ok(None);
    };

    let mut content = vec![0u8; length];
    if let Err(err) = reader.read_exact(&mut content) {
        return if err.kind() == io::ErrorKind::UnexpectedEof { Ok(None) } else { Err(err) };
    }

    match serde_json::from_slice(&content) {
        Ok(request) => Ok(Some(request)),
        Err(err) => {
            tracing::warn!(error = %err, "malformed JSON-RPC frame, skipping");
            Ok(None)
        }
    }
}

/// Write a framed response.
pub fn write_message<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> io::Result<()> {
    let content = serde_json::to_string(response)?;
    write!(writer, "Content-Length: {}\r\n\r\n{}", content.len(), content)?;
    writer.flush()
}

/// Write a framed notification.
pub fn write_notification<W: Write>(
    writer: &mut W,
    method: &str,
    params: serde_json::Value,
) -> io::Result<()> {
    let notification = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
    });
    let content = serde_json::to_string(&notification)?;
    write!(writer, "Content-Length: {}\r\n\r\n{}", content.len(), content)?;
    writer.flush()
}
