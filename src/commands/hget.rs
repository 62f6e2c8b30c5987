use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_table::Command},
    key_value_store::Store,
    resp::RespValue,
};

pub struct HGetArguments {
    key: Bytes,
    field: Bytes,
}

impl HGetArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key, field] = arguments else {
            return Err(CommandError::InvalidHGetCommand);
        };

        Ok(Self {
            key: key.clone(),
            field: field.clone(),
        })
    }
}

/// Handles the HGET command.
///
/// A missing hash and a missing field within an existing hash produce
/// different errors.
pub async fn hget(store: &dyn Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let hget_arguments = HGetArguments::parse(arguments)?;

    let value = store
        .hget(&hget_arguments.key, &hget_arguments.field)
        .await?;

    Ok(RespValue::BulkString(value))
}

pub struct HGet;

#[async_trait]
impl Command for HGet {
    fn name(&self) -> &'static str {
        "HGET"
    }

    async fn run(&self, arguments: &[Bytes], store: &dyn Store) -> Result<RespValue, CommandError> {
        hget(store, arguments).await
    }
}
