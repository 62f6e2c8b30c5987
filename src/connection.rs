//! Per-client request loop.

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tracing::{debug, error};

use crate::{
    aof::Aof,
    commands::{CommandHandler, CommandTable, DispatchError},
    key_value_store::Store,
    resp::{RespError, RespValue},
};

/// Handshake probe sent by some client libraries. Answered before the
/// command table is consulted.
const HANDSHAKE_COMMAND: &str = "COMMAND";

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("RESP parse error: {0}")]
    RespParseError(#[from] RespError),
}

/// State shared by every connection.
pub struct ServerContext {
    pub store: Arc<dyn Store>,
    pub table: Arc<CommandTable>,
    pub aof: Arc<Aof>,
    /// Commands that are appended to the log once they succeed.
    pub write_commands: Vec<&'static str>,
    /// Held from a write's store update until its log append, so the log
    /// order is the order writes were applied.
    write_lock: Mutex<()>,
}

impl ServerContext {
    pub fn new(
        store: Arc<dyn Store>,
        table: Arc<CommandTable>,
        aof: Arc<Aof>,
        write_commands: Vec<&'static str>,
    ) -> Self {
        Self {
            store,
            table,
            aof,
            write_commands,
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_write_command(&self, name: &str) -> bool {
        self.write_commands.iter().any(|command| *command == name)
    }

    /// Runs one request frame and produces its reply.
    ///
    /// Successful write commands are appended to the log after the store has
    /// been updated, both under the write lock. If the append fails the client
    /// gets an error instead of the usual reply.
    pub async fn execute(&self, input: RespValue) -> RespValue {
        let command_handler = match CommandHandler::new(input) {
            Ok(handler) => handler,
            Err(err) => return err.as_resp(),
        };

        if command_handler.name == HANDSHAKE_COMMAND {
            return RespValue::SimpleString("CONNECTED".to_string());
        }

        let is_write = self.is_write_command(&command_handler.name);
        let _write_guard = if is_write {
            Some(self.write_lock.lock().await)
        } else {
            None
        };

        let response = match self
            .table
            .dispatch(&command_handler, self.store.as_ref())
            .await
        {
            Ok(response) => response,
            Err(DispatchError::UnknownCommand(name)) => {
                return RespValue::Error(format!(
                    "ERR unknown command '{}', known commands: {}",
                    name,
                    self.table.names().join(", ")
                ));
            }
        };

        if response.is_error() || !is_write {
            return response;
        }

        if let Err(err) = self.aof.append(&command_handler.input).await {
            error!("Failed to persist {} command: {}", command_handler.name, err);
            return RespValue::Error("ERR failed to persist command".to_string());
        }

        response
    }
}

/// Serves one client until it disconnects.
///
/// Requests are answered in the order they arrive. A frame that cannot be
/// decoded gets an error reply and ends the connection, since the stream
/// position is lost from then on.
pub async fn handle_client_connection<S>(
    mut stream: S,
    client_address: &str,
    context: Arc<ServerContext>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = BytesMut::with_capacity(1024);

    loop {
        let number_of_bytes = stream.read_buf(&mut buffer).await?;

        if number_of_bytes == 0 {
            if !buffer.is_empty() {
                debug!(
                    "Client {} disconnected with {} unparsed bytes",
                    client_address,
                    buffer.len()
                );
            }

            return Ok(());
        }

        loop {
            let input = match RespValue::decode(&buffer[..]) {
                Ok((input, consumed)) => {
                    buffer.advance(consumed);
                    input
                }
                Err(err) if err.is_incomplete() => break,
                Err(err) => {
                    write_to_stream(&mut stream, &err.as_resp()).await?;
                    return Err(err.into());
                }
            };

            let response = context.execute(input).await;
            write_to_stream(&mut stream, &response).await?;
        }
    }
}

async fn write_to_stream<W>(writer: &mut W, response: &RespValue) -> tokio::io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    writer.write_all(&response.encode()).await?;
    writer.flush().await?;

    Ok(())
}
