//! Interpreter Tests
//!
//! Agent-side command reading and response writing.

#[path = "../common/mod.rs"]
mod common;

use agentcmd::protocol::{
    encode_command, encode_response, read_command, write_response, Command, Response,
    DEFAULT_PARAM_VALUE, MAX_DATA_LENGTH,
};
use agentcmd::AgentError;
use bytes::Bytes;
use common::ScriptedReader;

const MAX: usize = 20480;

fn read(wire: &[u8]) -> agentcmd::Result<Command> {
    read_command(&mut ScriptedReader::whole(wire), MAX)
}

// =============================================================================
// Command Reading Tests
// =============================================================================

#[test]
fn test_read_bare_command() {
    let cmd = read(b"testCommand\n").unwrap();
    assert_eq!(cmd.name, "testCommand");
    assert!(cmd.params.is_empty());
    assert!(cmd.payload.is_none());
}

#[test]
fn test_read_command_with_params() {
    let cmd = read(b"testCommand p1=v1 p2=v2\n").unwrap();
    assert_eq!(cmd.name, "testCommand");
    assert_eq!(cmd.params.len(), 2);
    assert_eq!(cmd.params.get("p1"), Some("v1"));
    assert_eq!(cmd.params.get("p2"), Some("v2"));
}

#[test]
fn test_read_command_with_custom_delimiter() {
    let cmd = read(b"#testCommand#p1=v1#p2=v 2\n").unwrap();
    assert_eq!(cmd.name, "testCommand");
    assert_eq!(cmd.params.get("p1"), Some("v1"));
    assert_eq!(cmd.params.get("p2"), Some("v 2"));
}

#[test]
fn test_read_command_with_data() {
    let cmd = read(b"testCommand p1=v1 p2=v2 8\ntestData").unwrap();
    assert_eq!(cmd.params.len(), 2);
    assert_eq!(cmd.payload, Some(Bytes::from_static(b"testData")));
}

#[test]
fn test_read_command_with_zero_length_data() {
    let cmd = read(b"PUT 0\n").unwrap();
    assert_eq!(cmd.payload, Some(Bytes::new()));
}

#[test]
fn test_read_param_without_value() {
    let cmd = read(b"RUN verbose level=3\n").unwrap();
    assert_eq!(cmd.params.get("verbose"), Some(DEFAULT_PARAM_VALUE));
    assert_eq!(cmd.params.get("level"), Some("3"));
}

#[test]
fn test_read_value_containing_equals() {
    let cmd = read(b"SET expr=a=b\n").unwrap();
    assert_eq!(cmd.params.get("expr"), Some("a=b"));
}

#[test]
fn test_read_skips_repeated_delimiters() {
    let cmd = read(b"CMD  a=1   b=2  \n").unwrap();
    assert_eq!(cmd.params.len(), 2);
}

#[test]
fn test_read_strips_carriage_return() {
    let cmd = read(b"PING\r\n").unwrap();
    assert_eq!(cmd.name, "PING");
}

#[test]
fn test_read_data_split_across_reads() {
    let mut reader = ScriptedReader::chunked(b"PUT key=k 10\n0123456789", 3);
    let cmd = read_command(&mut reader, MAX).unwrap();
    assert_eq!(cmd.payload, Some(Bytes::from_static(b"0123456789")));
}

#[test]
fn test_read_missing_newline() {
    assert!(matches!(
        read(b"testCommand p1=v1 p2=v2"),
        Err(AgentError::ConnectionClosed)
    ));
}

#[test]
fn test_read_data_shortfall() {
    assert!(matches!(
        read(b"testCommand p1=v1 p2=v2 10\ntestData"),
        Err(AgentError::Protocol(_))
    ));
}

#[test]
fn test_read_data_length_beyond_usize() {
    assert!(matches!(
        read(b"PING 18446744073709551615\n"),
        Err(AgentError::Protocol(_))
    ));
}

#[test]
fn test_read_data_length_over_limit() {
    let err = read(b"PING 999999999999\n").unwrap_err();
    assert!(matches!(err, AgentError::Protocol(_)));
    assert!(err.to_string().contains("exceeds"));

    let wire = format!("PING {}\n", MAX_DATA_LENGTH + 1);
    assert!(matches!(read(wire.as_bytes()), Err(AgentError::Protocol(_))));
}

#[test]
fn test_read_large_declared_length_with_little_data() {
    // Only the bytes that actually arrive are buffered.
    let wire = format!("PUT {}\nabc", MAX_DATA_LENGTH);
    let err = read(wire.as_bytes()).unwrap_err();
    assert!(matches!(err, AgentError::Protocol(_)));
    assert!(err.to_string().contains("got 3"));
}

#[test]
fn test_read_invalid_data_length() {
    assert!(matches!(read(b"CMD 12x\n"), Err(AgentError::Protocol(_))));
}

#[test]
fn test_read_empty_line() {
    assert!(matches!(read(b"\n"), Err(AgentError::Protocol(_))));
}

#[test]
fn test_read_line_too_long() {
    let wire = format!("CMD v={}\n", "x".repeat(100));
    let err = read_command(&mut ScriptedReader::whole(wire.as_bytes()), 64).unwrap_err();
    assert!(err.to_string().contains("Maximum command line size"));
}

#[test]
fn test_read_line_too_long_without_newline() {
    let wire = vec![b'x'; 1000];
    let err = read_command(&mut ScriptedReader::whole(&wire), 64).unwrap_err();
    assert!(matches!(err, AgentError::Protocol(_)));
}

#[test]
fn test_reads_what_the_encoder_writes() {
    let original = Command::new("STORE")
        .param("key", "a b")
        .param("flag", "x^y")
        .payload(vec![0u8, 10, 13, 255])
        .with_correlation_id("req-1");
    let wire = encode_command(&original, MAX).unwrap();

    let decoded = read(&wire).unwrap();
    assert_eq!(decoded.name, "STORE");
    assert_eq!(decoded.params.get("key"), Some("a b"));
    assert_eq!(decoded.params.get("flag"), Some("x^y"));
    assert_eq!(decoded.params.get("requestID"), Some("req-1"));
    assert_eq!(decoded.payload, original.payload);
}

// =============================================================================
// Response Writing Tests
// =============================================================================

#[test]
fn test_encode_success_without_data() {
    assert_eq!(&encode_response(&Response::success(None))[..], b"SUCCESS\n");
}

#[test]
fn test_encode_success_with_data() {
    let response = Response::success(Some(Bytes::from_static(b"hello")));
    assert_eq!(&encode_response(&response)[..], b"SUCCESS 5\nhello");
}

#[test]
fn test_encode_empty_data_has_no_length() {
    let response = Response::success(Some(Bytes::new()));
    assert_eq!(&encode_response(&response)[..], b"SUCCESS\n");
}

#[test]
fn test_encode_error() {
    assert_eq!(&encode_response(&Response::error(""))[..], b"ERROR\n");
    assert_eq!(
        &encode_response(&Response::error("ERROR bad key"))[..],
        b"ERROR bad key\n"
    );
}

#[test]
fn test_encode_status_newlines_flattened() {
    let response = Response::error("ERROR first\nsecond");
    assert_eq!(&encode_response(&response)[..], b"ERROR first second\n");
}

#[test]
fn test_write_response() {
    let mut out = Vec::new();
    write_response(&mut out, &Response::with_status("DONE", Some(Bytes::from_static(b"xy")))).unwrap();
    assert_eq!(out, b"DONE 2\nxy");
}
