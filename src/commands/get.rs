use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_table::Command},
    key_value_store::Store,
    resp::RespValue,
};

pub struct GetArguments {
    key: Bytes,
}

impl GetArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key] = arguments else {
            return Err(CommandError::InvalidGetCommand);
        };

        Ok(Self { key: key.clone() })
    }
}

/// Handles the GET command.
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The value stored under the key
/// * `Err(CommandError::DataNotFound)` - If the key does not exist
/// * `Err(CommandError::InvalidGetCommand)` - If the number of arguments is not exactly 1
pub async fn get(store: &dyn Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let value = store.get(&get_arguments.key).await?;

    Ok(RespValue::BulkString(value))
}

pub struct Get;

#[async_trait]
impl Command for Get {
    fn name(&self) -> &'static str {
        "GET"
    }

    async fn run(&self, arguments: &[Bytes], store: &dyn Store) -> Result<RespValue, CommandError> {
        get(store, arguments).await
    }
}
