//! Protocol codec
//!
//! Client-side encoding of commands and decoding of responses.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! [delim]command(delim key=value)*[delim length]\n<length raw bytes>
//! ```
//! The leading delimiter is omitted when the delimiter is a space.
//!
//! ### Response Format
//! ```text
//! status[sep length]\n<length raw bytes>
//! ```
//! `length` is the run of ASCII digits immediately before the `\n`.

use std::io::{self, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::delimiter::{select_delimiter, DEFAULT_DELIMITER, DELIMITERS};
use super::{Command, Response, ResponseData};
use crate::error::{AgentError, Result};

/// Size of each read while looking for the header line terminator
pub const READ_CHUNK_SIZE: usize = 256;

/// Upper bound on a single read while accumulating response data
const MAX_DATA_READ: usize = 64 * 1024;

const LINE_FEED: u8 = b'\n';

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode a command into the bytes to transmit: header line plus payload.
///
/// Fails without producing anything when no delimiter is usable, when a
/// token would break the line structure, or when the header line (including
/// its `\n`) is `max_line_length` bytes or longer.
pub fn encode_command(command: &Command, max_line_length: usize) -> Result<Bytes> {
    if command.name.is_empty() {
        return Err(AgentError::InvalidCommand("command name is empty".to_string()));
    }

    let params = command.wire_params();

    let delimiter = if params.is_empty() {
        DEFAULT_DELIMITER
    } else {
        select_delimiter(&DELIMITERS, params.values()).ok_or(AgentError::NoAvailableDelimiter)?
    };

    check_token("command name", &command.name, delimiter)?;
    for (key, value) in params.iter() {
        if key.is_empty() || key.contains('=') {
            return Err(AgentError::InvalidCommand(format!(
                "parameter key {:?} must be non-empty and contain no '='",
                key
            )));
        }
        check_token("parameter key", key, delimiter)?;
        if value.contains('\n') {
            return Err(AgentError::InvalidCommand(format!(
                "value of parameter {:?} contains a line feed",
                key
            )));
        }
    }

    let mut line = String::with_capacity(64);
    if delimiter != DEFAULT_DELIMITER {
        line.push(delimiter);
    }
    line.push_str(&command.name);
    for (key, value) in params.iter() {
        line.push(delimiter);
        line.push_str(key);
        line.push('=');
        line.push_str(value);
    }
    if let Some(payload) = &command.payload {
        line.push(delimiter);
        line.push_str(&payload.len().to_string());
    }
    line.push('\n');

    if line.len() >= max_line_length {
        return Err(AgentError::CommandTooLong {
            length: line.len(),
            max: max_line_length,
        });
    }

    let payload = command.payload.as_deref().unwrap_or(&[]);
    let mut message = BytesMut::with_capacity(line.len() + payload.len());
    message.put_slice(line.as_bytes());
    message.put_slice(payload);

    tracing::trace!(
        "Encoded command {} with delimiter {:?}: {} header bytes, {} payload bytes",
        command.name,
        delimiter,
        line.len(),
        payload.len()
    );

    Ok(message.freeze())
}

/// Tokens may not contain the chosen delimiter or a line feed
fn check_token(what: &str, token: &str, delimiter: char) -> Result<()> {
    if token.contains('\n') || token.contains(delimiter) {
        return Err(AgentError::InvalidCommand(format!(
            "{} {:?} contains the delimiter {:?} or a line feed",
            what, token, delimiter
        )));
    }
    Ok(())
}

/// Encode and write a command to a stream, returning the bytes written
pub fn write_command<W: Write>(
    writer: &mut W,
    command: &Command,
    max_line_length: usize,
) -> Result<usize> {
    let bytes = encode_command(command, max_line_length)?;
    writer.write_all(&bytes).map_err(AgentError::WriteFailed)?;
    writer.flush().map_err(AgentError::WriteFailed)?;
    Ok(bytes.len())
}

// =============================================================================
// Response Decoding
// =============================================================================

/// Read a complete response from a stream
///
/// Reads fixed-size chunks until the header line is complete, then reads
/// exactly the declared number of data bytes. If the stream ends while data
/// is outstanding, the partial bytes are returned as `ResponseData::Truncated`.
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let (line, rest) = read_header_line(reader, None)?;
    let (status, declared) = parse_response_header(&line)?;

    tracing::trace!("Response header: status={:?} data_length={}", status, declared);

    if declared == 0 {
        return Ok(Response {
            status,
            data: ResponseData::None,
        });
    }

    let seeded = rest.len().min(declared);
    if rest.len() > declared {
        tracing::debug!(
            "Ignoring {} bytes received past the declared data length",
            rest.len() - declared
        );
    }

    let mut data = BytesMut::with_capacity(declared.min(MAX_DATA_READ));
    data.extend_from_slice(&rest[..seeded]);

    let mut scratch = vec![0u8; (declared - data.len()).min(MAX_DATA_READ)];
    while data.len() < declared {
        let want = (declared - data.len()).min(scratch.len());
        match reader.read(&mut scratch[..want]) {
            Ok(0) => break,
            Ok(n) => data.extend_from_slice(&scratch[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("Read failed while receiving response data: {}", e);
                break;
            }
        }
    }

    let data = if data.len() < declared {
        tracing::warn!(
            "Response data truncated: received {} of {} declared bytes",
            data.len(),
            declared
        );
        ResponseData::Truncated {
            data: data.freeze(),
            expected: declared,
        }
    } else {
        ResponseData::Complete(data.freeze())
    };

    Ok(Response { status, data })
}

/// Split a response header line into status and declared data length
///
/// The trailing run of ASCII digits is the data length. Whatever precedes it,
/// with trailing whitespace trimmed, is the status. Without trailing digits
/// the whole line is the status, unchanged.
pub fn parse_response_header(line: &[u8]) -> Result<(String, usize)> {
    let digits_start = line
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |i| i + 1);

    let declared_present = digits_start < line.len();
    let declared = if declared_present {
        // Digits are ASCII, so this is valid UTF-8.
        let digits = std::str::from_utf8(&line[digits_start..])
            .map_err(|e| AgentError::Protocol(e.to_string()))?;
        digits.parse::<usize>().map_err(|e| {
            AgentError::Protocol(format!("Invalid data length {:?}: {}", digits, e))
        })?
    } else {
        0
    };

    let status = String::from_utf8_lossy(&line[..digits_start]);
    let status = if declared_present {
        status.trim_end().to_string()
    } else {
        status.into_owned()
    };

    Ok((status, declared))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Accumulate `READ_CHUNK_SIZE` reads until a `\n` arrives
///
/// Returns the line without its terminator and any bytes read past it.
/// With a `limit`, lines whose length including the `\n` reaches the limit
/// are rejected.
pub(crate) fn read_header_line<R: Read>(
    reader: &mut R,
    limit: Option<usize>,
) -> Result<(Bytes, Bytes)> {
    let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = read_chunk(reader, &mut chunk)?;
        let scanned = buffer.len();
        buffer.extend_from_slice(&chunk[..n]);

        if let Some(pos) = buffer[scanned..].iter().position(|&b| b == LINE_FEED) {
            let newline = scanned + pos;
            if let Some(max) = limit {
                if newline + 1 >= max {
                    return Err(line_too_long(max));
                }
            }
            let mut line = buffer.split_to(newline + 1);
            line.truncate(newline);
            return Ok((line.freeze(), buffer.freeze()));
        }

        if let Some(max) = limit {
            if buffer.len() >= max {
                return Err(line_too_long(max));
            }
        }
    }
}

fn line_too_long(max: usize) -> AgentError {
    AgentError::Protocol(format!("Maximum command line size allowed: {}", max))
}

/// A single read where EOF and failure are both fatal
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(0) => return Err(AgentError::ConnectionClosed),
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(AgentError::ReadFailed(e)),
        }
    }
}
