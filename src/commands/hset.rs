use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_table::Command},
    key_value_store::Store,
    resp::RespValue,
};

pub struct HSetArguments {
    key: Bytes,
    field: Bytes,
    value: Bytes,
}

impl HSetArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key, field, value] = arguments else {
            return Err(CommandError::InvalidHSetCommand);
        };

        Ok(Self {
            key: key.clone(),
            field: field.clone(),
            value: value.clone(),
        })
    }
}

/// Handles the HSET command. The hash is created on its first field write.
pub async fn hset(store: &dyn Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let hset_arguments = HSetArguments::parse(arguments)?;

    store
        .hset(hset_arguments.key, hset_arguments.field, hset_arguments.value)
        .await;

    Ok(RespValue::SimpleString("OK".to_string()))
}

pub struct HSet;

#[async_trait]
impl Command for HSet {
    fn name(&self) -> &'static str {
        "HSET"
    }

    async fn run(&self, arguments: &[Bytes], store: &dyn Store) -> Result<RespValue, CommandError> {
        hset(store, arguments).await
    }
}
