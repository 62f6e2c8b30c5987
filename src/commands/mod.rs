mod command_error;
mod command_handler;
mod command_table;
mod get;
mod hget;
mod hgetall;
mod hset;
mod ping;
mod set;

pub use command_error::CommandError;
pub use command_handler::CommandHandler;
pub use command_table::{Command, CommandTable, DispatchError};
