//! Agent-side interpretation
//!
//! Reads a command line (and its data) off an accepted connection and writes
//! the response, mirroring the client codec.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::codec::read_header_line;
use super::{Command, Params, Response};
use crate::error::{AgentError, Result};

/// Value given to a parameter that has no `=value` part
pub const DEFAULT_PARAM_VALUE: &str = "true";

/// Largest data length a command may declare
pub const MAX_DATA_LENGTH: usize = i32::MAX as usize;

/// Initial buffer reserved for command data; it grows as bytes arrive.
const DATA_BUFFER_HINT: usize = 64 * 1024;

const CARRIAGE_RETURN: u8 = b'\r';
const DEFAULT_DELIM: u8 = b' ';
const PARAM_VALUE_SEP: u8 = b'=';

/// Read a complete command from a stream
///
/// The delimiter is the first byte of the line unless that byte is an ASCII
/// letter, in which case it is a space. A fragment starting with a digit
/// declares the data length and ends the line.
pub fn read_command<R: Read>(reader: &mut R, max_line_length: usize) -> Result<Command> {
    let (header, rest) = read_header_line(reader, Some(max_line_length))?;

    let mut line: &[u8] = &header;
    if line.last() == Some(&CARRIAGE_RETURN) {
        line = &line[..line.len() - 1];
    }
    if line.is_empty() {
        return Err(AgentError::Protocol("Empty command line".to_string()));
    }

    let (delimiter, mut pos) = if line[0].is_ascii_alphabetic() {
        (DEFAULT_DELIM, 0)
    } else {
        (line[0], 1)
    };

    let name_end = next_fragment(line, pos, delimiter);
    let name = utf8(&line[pos..name_end])?;
    if name.is_empty() {
        return Err(AgentError::Protocol("Missing command name".to_string()));
    }
    pos = name_end;

    let mut params = Params::new();
    let mut data_length = None;

    while pos < line.len() {
        while pos < line.len() && line[pos] == delimiter {
            pos += 1;
        }
        if pos == line.len() {
            break;
        }

        if line[pos].is_ascii_digit() {
            let digits = utf8(&line[pos..])?;
            let length = digits.parse::<usize>().map_err(|e| {
                AgentError::Protocol(format!("Invalid data length {:?} in command {}: {}", digits, name, e))
            })?;
            if length > MAX_DATA_LENGTH {
                return Err(AgentError::Protocol(format!(
                    "Data length {} in command {} exceeds the maximum of {}",
                    length, name, MAX_DATA_LENGTH
                )));
            }
            data_length = Some(length);
            break;
        }

        let end = next_fragment(line, pos + 1, delimiter);
        let fragment = &line[pos..end];
        match fragment.iter().position(|&b| b == PARAM_VALUE_SEP) {
            Some(sep) => params.insert(utf8(&fragment[..sep])?, utf8(&fragment[sep + 1..])?),
            None => params.insert(utf8(fragment)?, DEFAULT_PARAM_VALUE),
        };
        pos = end;
    }

    let payload = match data_length {
        Some(length) => Some(read_data(reader, &rest, length, name)?),
        None => None,
    };

    Ok(Command {
        name: name.to_string(),
        params,
        payload,
        correlation_id: None,
    })
}

/// Collect exactly `length` data bytes, starting with those already buffered
fn read_data<R: Read>(reader: &mut R, buffered: &[u8], length: usize, name: &str) -> Result<Bytes> {
    let seeded = buffered.len().min(length);
    let mut data = Vec::with_capacity(length.min(DATA_BUFFER_HINT));
    data.extend_from_slice(&buffered[..seeded]);

    let remaining = (length - seeded) as u64;
    reader
        .by_ref()
        .take(remaining)
        .read_to_end(&mut data)
        .map_err(AgentError::ReadFailed)?;

    if data.len() < length {
        return Err(AgentError::Protocol(format!(
            "Insufficient bytes read for command {}: expected {} data bytes, got {}",
            name,
            length,
            data.len()
        )));
    }

    Ok(Bytes::from(data))
}

fn next_fragment(line: &[u8], from: usize, delimiter: u8) -> usize {
    line[from..]
        .iter()
        .position(|&b| b == delimiter)
        .map_or(line.len(), |i| from + i)
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| AgentError::Protocol(format!("Command line is not valid UTF-8: {}", e)))
}

// =============================================================================
// Response Encoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: `status\n`, or `status length\n` followed by the data when there
/// is at least one data byte.
pub fn encode_response(response: &Response) -> Bytes {
    let data: &[u8] = response.data().map(|d| d.as_ref()).unwrap_or(&[]);
    let status = response.status.replace(&['\r', '\n'][..], " ");

    let mut header = String::with_capacity(status.len() + 12);
    header.push_str(&status);
    if !data.is_empty() {
        header.push(' ');
        header.push_str(&data.len().to_string());
    }
    header.push('\n');

    let mut message = BytesMut::with_capacity(header.len() + data.len());
    message.put_slice(header.as_bytes());
    message.put_slice(data);
    message.freeze()
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes).map_err(AgentError::WriteFailed)?;
    writer.flush().map_err(AgentError::WriteFailed)?;
    Ok(())
}
