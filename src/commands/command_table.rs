use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandHandler, get::Get, hget::HGet,
        hgetall::HGetAll, hset::HSet, ping::Ping, set::Set,
    },
    key_value_store::Store,
    resp::RespValue,
};

/// Raised by the table itself, before any handler runs.
#[derive(Error, Debug, PartialEq)]
pub enum DispatchError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/// A single entry of the command table.
#[async_trait]
pub trait Command: Send + Sync {
    /// Uppercase name the command is registered under.
    fn name(&self) -> &'static str;

    /// Validates `arguments` and applies the command to `store`.
    async fn run(&self, arguments: &[Bytes], store: &dyn Store) -> Result<RespValue, CommandError>;

    /// Like [`Command::run`], with failures turned into an `Error` reply.
    async fn execute(&self, arguments: &[Bytes], store: &dyn Store) -> RespValue {
        match self.run(arguments, store).await {
            Ok(response) => response,
            Err(err) => err.as_resp(),
        }
    }
}

/// Maps command names to their handlers. Built once at startup and shared
/// read-only afterwards.
pub struct CommandTable {
    commands: BTreeMap<&'static str, Box<dyn Command>>,
}

impl CommandTable {
    pub fn new() -> Self {
        let mut table = Self {
            commands: BTreeMap::new(),
        };

        table.register(Box::new(Ping));
        table.register(Box::new(Set));
        table.register(Box::new(Get));
        table.register(Box::new(HSet));
        table.register(Box::new(HGet));
        table.register(Box::new(HGetAll));

        table
    }

    fn register(&mut self, command: Box<dyn Command>) {
        self.commands.insert(command.name(), command);
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .get(name.to_uppercase().as_str())
            .map(|command| command.as_ref())
    }

    /// Registered command names in alphabetical order.
    pub fn names(&self) -> Vec<&'static str> {
        self.commands.keys().copied().collect()
    }

    pub async fn dispatch(
        &self,
        command_handler: &CommandHandler,
        store: &dyn Store,
    ) -> Result<RespValue, DispatchError> {
        let Some(command) = self.lookup(&command_handler.name) else {
            return Err(DispatchError::UnknownCommand(command_handler.name.clone()));
        };

        Ok(command.execute(&command_handler.arguments, store).await)
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}
