//! agentcmd Agent Binary
//!
//! Starts a demo agent answering PING and ECHO on a Unix domain socket.

use std::sync::Arc;

use agentcmd::network::{HandlerRegistry, Server};
use agentcmd::Config;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// agentcmd Agent
#[derive(Parser, Debug)]
#[command(name = "agentcmd-agent")]
#[command(about = "Demo agent for the line-framed command protocol")]
#[command(version)]
struct Args {
    /// Socket path to listen on
    #[arg(short, long, default_value = "/tmp/agentcmd.sock")]
    socket: String,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Idle timeout for accepted connections in milliseconds
    #[arg(short, long, default_value = "300")]
    idle_timeout_ms: u64,

    /// Maximum command line length in bytes
    #[arg(long, default_value_t = agentcmd::config::DEFAULT_MAX_COMMAND_LINE_LENGTH)]
    max_line: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,agentcmd=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("agentcmd agent v{}", agentcmd::VERSION);
    tracing::info!("Socket: {}", args.socket);
    tracing::info!("Workers: {}", args.workers);

    let config = Config::builder()
        .socket_path(&args.socket)
        .worker_threads(args.workers)
        .client_idle_timeout_ms(args.idle_timeout_ms)
        .max_command_line_length(args.max_line)
        .build();

    let registry = Arc::new(HandlerRegistry::with_builtins());
    tracing::info!("Registered commands: {}", registry.names().join(", "));

    let server = match Server::bind(config, registry) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind agent socket: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Agent error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Agent stopped");
}
