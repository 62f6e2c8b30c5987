use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_table::Command},
    key_value_store::Store,
    resp::RespValue,
};

pub struct PingArguments {
    message: Option<Bytes>,
}

impl PingArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        match arguments {
            [] => Ok(Self { message: None }),
            [message] => Ok(Self {
                message: Some(message.clone()),
            }),
            _ => Err(CommandError::InvalidPingCommand),
        }
    }
}

/// Handles the PING command.
///
/// Without arguments the reply is `+PONG`. With one argument the message is
/// echoed back as a simple string. A message that cannot travel as a simple
/// string (not UTF-8, or containing CR/LF) is echoed as a bulk string instead
/// so the reply stays well framed.
pub fn ping(arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let ping_arguments = PingArguments::parse(arguments)?;

    let Some(message) = ping_arguments.message else {
        return Ok(RespValue::SimpleString("PONG".to_string()));
    };

    match std::str::from_utf8(&message) {
        Ok(text) if !text.contains(['\r', '\n']) => Ok(RespValue::SimpleString(text.to_string())),
        _ => Ok(RespValue::BulkString(message)),
    }
}

pub struct Ping;

#[async_trait]
impl Command for Ping {
    fn name(&self) -> &'static str {
        "PING"
    }

    async fn run(&self, arguments: &[Bytes], _store: &dyn Store) -> Result<RespValue, CommandError> {
        ping(arguments)
    }
}
