//! agentcmd CLI Client
//!
//! Sends a single command to an agent and prints the result.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use agentcmd::{AgentClient, Command, Config};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// agentcmd CLI
#[derive(Parser, Debug)]
#[command(name = "agentcmd")]
#[command(about = "Send one command to an agent over a Unix domain socket")]
#[command(version)]
struct Args {
    /// Agent socket path
    #[arg(short, long, default_value = "/tmp/agentcmd.sock")]
    socket: PathBuf,

    /// Maximum command line length in bytes
    #[arg(long, default_value_t = agentcmd::config::DEFAULT_MAX_COMMAND_LINE_LENGTH)]
    max_line: usize,

    /// Socket read/write timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "0")]
    timeout_ms: u64,

    /// Correlation id sent as the requestID parameter
    #[arg(short, long)]
    request_id: Option<String>,

    /// Inline data to send after the command line
    #[arg(short, long, conflicts_with = "data_file")]
    data: Option<String>,

    /// File whose contents are sent after the command line
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Command name
    command: String,

    /// Parameters as key=value
    #[arg(value_parser = parse_param)]
    params: Vec<(String, String)>,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {:?}", s)),
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let payload = match (&args.data, &args.data_file) {
        (Some(data), _) => Some(data.clone().into_bytes()),
        (None, Some(path)) => match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                eprintln!("Failed to read {}: {}", path.display(), e);
                return ExitCode::from(2);
            }
        },
        (None, None) => None,
    };

    let mut command = Command::new(args.command).with_params(args.params.into_iter().collect());
    if let Some(payload) = payload {
        command = command.payload(payload);
    }
    if let Some(id) = args.request_id {
        command = command.with_correlation_id(id);
    }

    let config = Config::builder()
        .socket_path(&args.socket)
        .max_command_line_length(args.max_line)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .build();

    let client = match AgentClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    match client.execute(&command) {
        Ok(response) => {
            eprintln!("{}", response.status);
            if let Some(data) = response.data() {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = stdout.write_all(data).and_then(|_| stdout.flush()) {
                    eprintln!("Failed to write data: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            if response.is_truncated() {
                eprintln!("warning: response data truncated");
            }
            if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) if e.is_encoding_error() => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
