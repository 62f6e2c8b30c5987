use thiserror::Error;

use crate::{key_value_store::StoreError, resp::RespValue};

/// Errors a command reports back to its client. None of them are fatal to
/// the connection and none of them leave a trace in the store or the log.
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("invalid command")]
    InvalidCommand,
    #[error("empty command")]
    EmptyCommand,
    #[error("invalid command argument")]
    InvalidCommandArgument,
    #[error("wrong number of arguments for 'PING' command, expected: PING [message]")]
    InvalidPingCommand,
    #[error("wrong number of arguments for 'SET' command, expected: SET key value")]
    InvalidSetCommand,
    #[error("wrong number of arguments for 'GET' command, expected: GET key")]
    InvalidGetCommand,
    #[error("wrong number of arguments for 'HSET' command, expected: HSET key field value")]
    InvalidHSetCommand,
    #[error("wrong number of arguments for 'HGET' command, expected: HGET key field")]
    InvalidHGetCommand,
    #[error("wrong number of arguments for 'HGETALL' command, expected: HGETALL key")]
    InvalidHGetAllCommand,
    #[error("{0}")]
    DataNotFound(#[from] StoreError),
}

impl CommandError {
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR {}", self))
    }
}
