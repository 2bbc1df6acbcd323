//! # agentcmd
//!
//! A one-shot client for the agent command protocol, plus the agent side:
//! - Delimiter-escaped, line-framed command encoding
//! - Response decoding with incremental reads and declared-length data
//! - One connection per command, always closed on every exit path
//! - A small Unix domain socket agent server for handlers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐  [delim]CMD key=value .. len\n data  ┌──────────────┐
//! │ AgentClient  │ ────────────────────────────────────▶│    Server    │
//! │  (encoder)   │                                      │ (interpreter)│
//! │  (decoder)   │◀──────────────────────────────────── │   handlers   │
//! └──────────────┘         STATUS [len]\n data          └──────────────┘
//!        one Unix socket connection per command
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use agentcmd::{AgentClient, Command, Config};
//!
//! let config = Config::builder().socket_path("/tmp/agent.sock").build();
//! let client = AgentClient::from_config(&config)?;
//! let reply = client.send(&Command::new("STORE").param("key", "abc").payload("hello"));
//! if reply.succeeded {
//!     println!("stored");
//! }
//! # Ok::<(), agentcmd::AgentError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{AgentError, Result};
pub use config::Config;
pub use client::{send_command, AgentClient, Reply};
pub use protocol::{Command, Params, Response, ResponseData};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of agentcmd
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
