//! Client Tests
//!
//! Orchestration against an in-memory transport: what is written, what is
//! returned, and that every opened connection is closed exactly once.

#[path = "../common/mod.rs"]
mod common;

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use agentcmd::network::Connector;
use agentcmd::{AgentClient, AgentError, Command, Reply};
use bytes::Bytes;
use common::{broken_pipe, ScriptedReader};
use parking_lot::Mutex;

// =============================================================================
// In-memory transport
// =============================================================================

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    closes: AtomicUsize,
    written: Mutex<Vec<u8>>,
}

struct MockStream {
    reader: ScriptedReader,
    counters: Arc<Counters>,
    fail_write: bool,
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_write {
            return Err(broken_pipe());
        }
        self.counters.written.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct MockConnector {
    response: Vec<u8>,
    chunk_size: usize,
    fail_connect: bool,
    fail_write: bool,
    counters: Arc<Counters>,
}

impl MockConnector {
    fn responding(response: &[u8]) -> Self {
        Self {
            response: response.to_vec(),
            chunk_size: 256,
            fail_connect: false,
            fail_write: false,
            counters: Arc::new(Counters::default()),
        }
    }

    fn connects(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    fn written(&self) -> Vec<u8> {
        self.counters.written.lock().clone()
    }
}

impl Connector for MockConnector {
    type Stream = MockStream;

    fn connect(&self) -> io::Result<MockStream> {
        if self.fail_connect {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such socket"));
        }
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MockStream {
            reader: ScriptedReader::chunked(&self.response, self.chunk_size),
            counters: Arc::clone(&self.counters),
            fail_write: self.fail_write,
        })
    }

    fn close(&self, _stream: &mut MockStream) -> io::Result<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn endpoint(&self) -> String {
        "mock".to_string()
    }
}

fn client(connector: MockConnector) -> AgentClient<MockConnector> {
    AgentClient::new(connector, 1024)
}

// =============================================================================
// Execute Tests
// =============================================================================

#[test]
fn test_ping_scenario() {
    let client = client(MockConnector::responding(b"SUCCESS\n"));
    let response = client.execute(&Command::new("PING")).unwrap();

    assert!(response.is_success());
    assert_eq!(response.status, "SUCCESS");
    assert!(response.data().is_none());
    assert_eq!(client.connector().written(), b"PING\n");
    assert_eq!(client.connector().connects(), 1);
    assert_eq!(client.connector().closes(), 1);
}

#[test]
fn test_store_scenario() {
    let client = client(MockConnector::responding(b"SUCCESS 5\nhello"));
    let cmd = Command::new("STORE").param("key", "abc").payload("hello");
    let response = client.execute(&cmd).unwrap();

    assert_eq!(client.connector().written(), b"STORE key=abc 5\nhello");
    assert_eq!(response.status, "SUCCESS");
    assert_eq!(response.data(), Some(&Bytes::from_static(b"hello")));
    assert_eq!(client.connector().closes(), 1);
}

#[test]
fn test_byte_at_a_time_response() {
    let mut connector = MockConnector::responding(b"SUCCESS 11\nhello world");
    connector.chunk_size = 1;
    let client = client(connector);
    let response = client.execute(&Command::new("GET")).unwrap();
    assert_eq!(response.data(), Some(&Bytes::from_static(b"hello world")));
}

#[test]
fn test_encoding_error_never_connects() {
    let client = client(MockConnector::responding(b"SUCCESS\n"));
    let cmd = Command::new("SET").param("v", " ^!$%@#*~");

    let err = client.execute(&cmd).unwrap_err();
    assert!(matches!(err, AgentError::NoAvailableDelimiter));
    assert_eq!(client.connector().connects(), 0);
    assert_eq!(client.connector().closes(), 0);
    assert!(client.connector().written().is_empty());
}

#[test]
fn test_too_long_never_connects() {
    let client = AgentClient::new(MockConnector::responding(b"SUCCESS\n"), 8);
    let err = client
        .execute(&Command::new("LONGCOMMAND"))
        .unwrap_err();
    assert!(matches!(err, AgentError::CommandTooLong { .. }));
    assert_eq!(client.connector().connects(), 0);
}

#[test]
fn test_connect_failure() {
    let mut connector = MockConnector::responding(b"SUCCESS\n");
    connector.fail_connect = true;
    let client = client(connector);

    let err = client.execute(&Command::new("PING")).unwrap_err();
    assert!(matches!(err, AgentError::ConnectFailed(_)));
    assert_eq!(client.connector().closes(), 0);
}

#[test]
fn test_write_failure_closes_once() {
    let mut connector = MockConnector::responding(b"SUCCESS\n");
    connector.fail_write = true;
    let client = client(connector);

    let err = client.execute(&Command::new("PING")).unwrap_err();
    assert!(matches!(err, AgentError::WriteFailed(_)));
    assert_eq!(client.connector().connects(), 1);
    assert_eq!(client.connector().closes(), 1);
}

#[test]
fn test_decode_failure_closes_once() {
    let client = client(MockConnector::responding(b"SUCCESS"));
    let err = client.execute(&Command::new("PING")).unwrap_err();
    assert!(matches!(err, AgentError::ConnectionClosed));
    assert_eq!(client.connector().closes(), 1);
}

#[test]
fn test_each_call_uses_a_fresh_connection() {
    let client = client(MockConnector::responding(b"SUCCESS\n"));
    for _ in 0..3 {
        client.execute(&Command::new("PING")).unwrap();
    }
    assert_eq!(client.connector().connects(), 3);
    assert_eq!(client.connector().closes(), 3);
    assert_eq!(client.connector().written(), b"PING\nPING\nPING\n");
}

// =============================================================================
// Send (boundary) Tests
// =============================================================================

#[test]
fn test_send_success() {
    let client = client(MockConnector::responding(b"SUCCESS 2\nok"));
    let reply = client.send(&Command::new("GET"));
    assert_eq!(
        reply,
        Reply {
            succeeded: true,
            status: Some("SUCCESS".to_string()),
            data: Some(Bytes::from_static(b"ok")),
            truncated: false,
        }
    );
}

#[test]
fn test_send_failure_status() {
    let client = client(MockConnector::responding(b"ERROR no such key\n"));
    let reply = client.send(&Command::new("GET"));
    assert!(!reply.succeeded);
    assert_eq!(reply.status.as_deref(), Some("ERROR no such key"));
    assert!(reply.data.is_none());
}

#[test]
fn test_send_swallows_errors() {
    let mut connector = MockConnector::responding(b"");
    connector.fail_connect = true;
    let reply = client(connector).send(&Command::new("PING"));
    assert_eq!(reply, Reply::failed());
}

#[test]
fn test_send_reports_truncation() {
    let client = client(MockConnector::responding(b"SUCCESS 10\nhalf"));
    let reply = client.send(&Command::new("GET"));
    assert!(!reply.succeeded);
    assert!(reply.truncated);
    assert_eq!(reply.status.as_deref(), Some("SUCCESS"));
    assert_eq!(reply.data, Some(Bytes::from_static(b"half")));
    assert_eq!(client.connector().closes(), 1);
}
