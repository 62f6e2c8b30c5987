use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_table::Command},
    key_value_store::Store,
    resp::RespValue,
};

/// Represents the parsed arguments for SET command
pub struct SetArguments {
    /// The key name to write
    key: Bytes,
    /// The value to be stored under the given key
    value: Bytes,
}

impl SetArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key, value] = arguments else {
            return Err(CommandError::InvalidSetCommand);
        };

        Ok(Self {
            key: key.clone(),
            value: value.clone(),
        })
    }
}

/// Handles the SET command.
///
/// Stores `value` under `key`, replacing whatever was there before.
///
/// # Returns
///
/// * `Ok(RespValue::SimpleString("OK"))` - The value was stored
/// * `Err(CommandError::InvalidSetCommand)` - If the number of arguments is not exactly 2
///
/// # Examples
///
/// ```ignore
/// // SET grape mango
/// let result = set(&store, &[Bytes::from("grape"), Bytes::from("mango")]).await;
/// // Returns: Ok(RespValue::SimpleString("OK"))
/// ```
pub async fn set(store: &dyn Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    store.set(set_arguments.key, set_arguments.value).await;

    Ok(RespValue::SimpleString("OK".to_string()))
}

pub struct Set;

#[async_trait]
impl Command for Set {
    fn name(&self) -> &'static str {
        "SET"
    }

    async fn run(&self, arguments: &[Bytes], store: &dyn Store) -> Result<RespValue, CommandError> {
        set(store, arguments).await
    }
}
