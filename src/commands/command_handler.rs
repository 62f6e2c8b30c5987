use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue};

/// A request frame split into its command name and arguments.
///
/// The original frame is kept so that mutating commands can be written to
/// the append-only log exactly as they were received.
#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<Bytes>,
    pub input: RespValue,
}

impl CommandHandler {
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = &input else {
            return Err(CommandError::InvalidCommand);
        };

        let name = match elements.first() {
            Some(RespValue::BulkString(s)) => String::from_utf8_lossy(s).to_uppercase(),
            Some(_) => return Err(CommandError::InvalidCommandArgument),
            None => return Err(CommandError::EmptyCommand),
        };

        let mut arguments: Vec<Bytes> = Vec::with_capacity(elements.len() - 1);

        for element in &elements[1..] {
            let arg = match element {
                RespValue::BulkString(s) => Ok(s.clone()),
                _ => Err(CommandError::InvalidCommandArgument),
            }?;

            arguments.push(arg);
        }

        Ok(Self {
            name,
            arguments,
            input,
        })
    }
}
