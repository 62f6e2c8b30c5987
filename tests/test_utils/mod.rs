#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use resp_kv::{
    aof::Aof,
    commands::{CommandHandler, CommandTable},
    connection::ServerContext,
    key_value_store::KeyValueStore,
    resp::RespValue,
};
use tempfile::TempDir;

/// Test utilities for simplifying command tests
pub struct TestUtils;

impl TestUtils {
    pub fn command(parts: &[&str]) -> RespValue {
        RespValue::Array(
            parts
                .iter()
                .map(|part| RespValue::BulkString(Bytes::copy_from_slice(part.as_bytes())))
                .collect(),
        )
    }

    pub fn ping_command() -> RespValue {
        Self::command(&["PING"])
    }

    pub fn set_command(key: &str, value: &str) -> RespValue {
        Self::command(&["SET", key, value])
    }

    pub fn get_command(key: &str) -> RespValue {
        Self::command(&["GET", key])
    }

    pub fn hset_command(key: &str, field: &str, value: &str) -> RespValue {
        Self::command(&["HSET", key, field, value])
    }

    pub fn hget_command(key: &str, field: &str) -> RespValue {
        Self::command(&["HGET", key, field])
    }

    pub fn hgetall_command(key: &str) -> RespValue {
        Self::command(&["HGETALL", key])
    }

    pub fn expected_simple_string(s: &str) -> RespValue {
        RespValue::SimpleString(s.to_string())
    }

    pub fn expected_bulk_string(s: &str) -> RespValue {
        RespValue::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }

    pub fn expected_error(s: &str) -> RespValue {
        RespValue::Error(s.to_string())
    }

    /// Splits a flat HGETALL reply into sorted field/value pairs.
    pub fn sorted_pairs(response: RespValue) -> Vec<(String, String)> {
        let RespValue::Array(elements) = response else {
            panic!("Expected array, got {:?}", response);
        };
        assert_eq!(elements.len() % 2, 0, "odd number of elements");

        let mut pairs: Vec<(String, String)> = elements
            .chunks(2)
            .map(|pair| match pair {
                [RespValue::BulkString(field), RespValue::BulkString(value)] => (
                    String::from_utf8_lossy(field).into_owned(),
                    String::from_utf8_lossy(value).into_owned(),
                ),
                other => panic!("Expected bulk strings, got {:?}", other),
            })
            .collect();
        pairs.sort();

        pairs
    }
}

/// Test environment with a fresh store, command table and log
pub struct TestEnv {
    pub store: Arc<KeyValueStore>,
    pub table: Arc<CommandTable>,
    pub aof: Arc<Aof>,
    pub context: Arc<ServerContext>,
    pub dir: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        Self::with_dir(dir).await
    }

    /// Opens (or reopens) the log found in `dir`.
    pub async fn with_dir(dir: TempDir) -> Self {
        let aof = Arc::new(
            Aof::open(dir.path().join("appendonly.aof"))
                .await
                .expect("failed to open append-only file"),
        );
        let store = Arc::new(KeyValueStore::new());
        let table = Arc::new(CommandTable::new());

        let context = Arc::new(ServerContext::new(
            store.clone(),
            Arc::clone(&table),
            Arc::clone(&aof),
            vec!["SET", "HSET"],
        ));

        Self {
            store,
            table,
            aof,
            context,
            dir,
        }
    }

    /// Runs a request through the command table only, bypassing the log.
    pub async fn dispatch(&self, command: RespValue) -> RespValue {
        let command_handler = CommandHandler::new(command).expect("invalid request");

        self.table
            .dispatch(&command_handler, &*self.store)
            .await
            .expect("unknown command")
    }

    /// Runs a request the way a client connection would.
    pub async fn execute(&self, command: RespValue) -> RespValue {
        self.context.execute(command).await
    }

    pub async fn exec_command_ok(&self, command: RespValue, expected_response: RespValue) {
        let response = self.execute(command.clone()).await;
        assert_eq!(response, expected_response, "executing {:?}", command);
    }

    /// Raw contents of the log file.
    pub async fn aof_contents(&self) -> Vec<u8> {
        tokio::fs::read(self.aof.path())
            .await
            .expect("failed to read append-only file")
    }
}
