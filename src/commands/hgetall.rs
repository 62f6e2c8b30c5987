use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_table::Command},
    key_value_store::Store,
    resp::RespValue,
};

pub struct HGetAllArguments {
    key: Bytes,
}

impl HGetAllArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key] = arguments else {
            return Err(CommandError::InvalidHGetAllCommand);
        };

        Ok(Self { key: key.clone() })
    }
}

/// Handles the HGETALL command.
///
/// Replies with a flat array where every field is immediately followed by
/// its value. Pair order is unspecified.
pub async fn hgetall(store: &dyn Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let hgetall_arguments = HGetAllArguments::parse(arguments)?;

    let pairs = store.hgetall(&hgetall_arguments.key).await?;

    let elements = pairs
        .into_iter()
        .flat_map(|(field, value)| [RespValue::BulkString(field), RespValue::BulkString(value)])
        .collect();

    Ok(RespValue::Array(elements))
}

pub struct HGetAll;

#[async_trait]
impl Command for HGetAll {
    fn name(&self) -> &'static str {
        "HGETALL"
    }

    async fn run(&self, arguments: &[Bytes], store: &dyn Store) -> Result<RespValue, CommandError> {
        hgetall(store, arguments).await
    }
}
