//! Agent Server
//!
//! Accepts connections on a Unix domain socket and dispatches them to a
//! fixed pool of worker threads.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam::channel;

use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::network::{Connection, HandlerRegistry};

/// Unix domain socket server for the agent side of the protocol
pub struct Server {
    config: Config,
    listener: UnixListener,
    registry: Arc<HandlerRegistry>,
    shutdown: AtomicBool,
}

impl Server {
    /// Bind the socket described by `config`
    ///
    /// A stale socket file at the path is removed first. Any other kind of
    /// file there is left alone and reported as a configuration error.
    pub fn bind(config: Config, registry: Arc<HandlerRegistry>) -> Result<Self> {
        config.validate()?;

        let path = &config.socket_path;
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_socket() => {
                tracing::debug!("Removing stale socket {}", path.display());
                fs::remove_file(path)?;
            }
            Ok(_) => {
                return Err(AgentError::Config(format!(
                    "{} exists and is not a socket",
                    path.display()
                )))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let listener = UnixListener::bind(path)?;
        tracing::info!("Agent listening on {}", path.display());

        Ok(Self {
            config,
            listener,
            registry,
            shutdown: AtomicBool::new(false),
        })
    }

    /// Path of the bound socket
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Start serving (blocking until `shutdown` is called)
    pub fn run(&self) -> Result<()> {
        let workers = self.config.worker_threads;
        let (sender, receiver) = channel::bounded::<(u64, UnixStream)>(workers * 4);

        let scope_result = crossbeam::scope(|scope| -> Result<()> {
            for index in 0..workers {
                let receiver = receiver.clone();
                scope
                    .builder()
                    .name(format!("agent-worker-{}", index))
                    .spawn(move |_| {
                        for (id, stream) in receiver.iter() {
                            self.serve(id, stream);
                        }
                    })?;
            }
            drop(receiver);

            let mut next_id: u64 = 0;
            for incoming in self.listener.incoming() {
                if self.shutdown.load(Ordering::Acquire) {
                    break;
                }
                match incoming {
                    Ok(stream) => {
                        next_id += 1;
                        if sender.send((next_id, stream)).is_err() {
                            tracing::error!("All agent workers have exited");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Error accepting connection: {}", e);
                    }
                }
            }

            // Closing the channel lets workers drain and exit.
            drop(sender);
            Ok(())
        });

        match scope_result {
            Ok(result) => result,
            Err(_) => Err(AgentError::Io(io::Error::new(
                io::ErrorKind::Other,
                "agent worker thread panicked",
            ))),
        }?;

        tracing::info!("Agent on {} stopped", self.socket_path().display());
        Ok(())
    }

    fn serve(&self, id: u64, stream: UnixStream) {
        let connection = Connection::new(
            stream,
            Arc::clone(&self.registry),
            self.config.max_command_line_length,
            id,
        );
        if let Err(e) = connection.set_timeouts(
            self.config.client_idle_timeout(),
            self.config.write_timeout(),
        ) {
            tracing::warn!("Failed to set timeouts on connection {}: {}", id, e);
            return;
        }
        // A panicking handler must not take the worker down with it.
        match panic::catch_unwind(AssertUnwindSafe(|| connection.handle())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Connection {} ended with error: {}", id, e),
            Err(payload) => tracing::error!(
                "Connection {} panicked: {}",
                id,
                panic_message(payload.as_ref())
            ),
        }
    }

    /// Signal the server to stop accepting connections
    ///
    /// Queued connections are still served before `run` returns.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!("Shutting down agent on {}", self.socket_path().display());
        // Wake the acceptor blocked in accept().
        if let Err(e) = UnixStream::connect(self.socket_path()) {
            tracing::debug!("Wake-up connection failed: {}", e);
        }
    }

    /// Whether `shutdown` has been called
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.config.socket_path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove socket {}: {}",
                    self.config.socket_path.display(),
                    e
                );
            }
        }
    }
}
