//! Network Module
//!
//! Unix domain socket transport for both ends of the protocol.
//!
//! ## Architecture
//! - Client: one connection per command via a [`Connector`]
//! - Agent: single acceptor thread, worker thread pool for connections
//! - Commands routed through a [`HandlerRegistry`]

mod transport;
mod handler;
mod connection;
mod server;

pub use transport::{Connector, UnixConnector};
pub use handler::{CommandHandler, EchoHandler, HandlerRegistry, PingHandler};
pub use connection::Connection;
pub use server::Server;
