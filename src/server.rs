use std::{path::PathBuf, sync::Arc};

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::connection::{handle_client_connection, ServerContext};

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("Invalid command line flag")]
    InvalidCommandLineFlag,
    #[error("Invalid command line flag value")]
    InvalidCommandLineFlagValue,
}

/// Startup configuration taken from the command line.
#[derive(Debug)]
pub struct RedisServer {
    pub port: u32,
    pub dir: PathBuf,
    pub appendfilename: String,
    /// Commands that change the store and therefore go to the log.
    pub write_commands: Vec<&'static str>,
}

impl RedisServer {
    pub fn new<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, CliError> {
        let mut iter = command_line_args.into_iter().skip(1);
        let mut port: Option<u32> = None;
        let mut dir: Option<PathBuf> = None;
        let mut appendfilename: Option<String> = None;

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--port" => {
                    let Some(port_str) = iter.next() else {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    };

                    let port_number = port_str
                        .parse::<u32>()
                        .map_err(|_| CliError::InvalidCommandLineFlagValue)?;

                    if !(1..=65535).contains(&port_number) {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    }

                    port = Some(port_number);
                }
                "--dir" => {
                    let Some(dir_str) = iter.next() else {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    };

                    dir = Some(PathBuf::from(dir_str));
                }
                "--appendfilename" => {
                    let Some(file_name) = iter.next() else {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    };

                    if file_name.is_empty() || file_name.contains(['/', '\\']) {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    }

                    appendfilename = Some(file_name);
                }
                _ => return Err(CliError::InvalidCommandLineFlag),
            }
        }

        Ok(RedisServer {
            port: port.unwrap_or(6379),
            dir: dir.unwrap_or_else(|| PathBuf::from(".")),
            appendfilename: appendfilename.unwrap_or_else(|| "appendonly.aof".to_string()),
            write_commands: vec!["SET", "HSET"],
        })
    }

    pub fn aof_path(&self) -> PathBuf {
        self.dir.join(&self.appendfilename)
    }

    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

/// Accepts clients until `shutdown` is cancelled, one task per connection.
pub async fn serve(listener: TcpListener, context: Arc<ServerContext>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("No longer accepting connections");
                break;
            }
            accepted = listener.accept() => {
                let (stream, address) = match accepted {
                    Ok(connection) => connection,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let client_address = address.to_string();
                let context = Arc::clone(&context);

                tokio::spawn(async move {
                    info!("Accepted connection from {}", client_address);

                    match handle_client_connection(stream, &client_address, context).await {
                        Ok(()) => info!("Client {} disconnected", client_address),
                        Err(e) => warn!("Closed connection to {}: {}", client_address, e),
                    }
                });
            }
        }
    }
}
