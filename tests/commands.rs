mod test_utils;

use bytes::Bytes;
use resp_kv::{
    commands::{CommandError, CommandHandler, CommandTable, DispatchError},
    key_value_store::{KeyValueStore, Store},
    resp::RespValue,
};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_ping_command() {
    let env = TestEnv::new().await;

    let test_cases = vec![
        (TestUtils::ping_command(), TestUtils::expected_simple_string("PONG")),
        (
            TestUtils::command(&["PING", "hello world"]),
            TestUtils::expected_simple_string("hello world"),
        ),
        (
            TestUtils::command(&["ping", "line\r\nbreak"]),
            TestUtils::expected_bulk_string("line\r\nbreak"),
        ),
        (
            TestUtils::command(&["PING", "a", "b"]),
            TestUtils::expected_error(
                "ERR wrong number of arguments for 'PING' command, expected: PING [message]",
            ),
        ),
    ];

    for (command, expected) in test_cases {
        assert_eq!(env.dispatch(command.clone()).await, expected, "{:?}", command);
    }
}

#[tokio::test]
async fn test_handle_set_and_get_commands() {
    let env = TestEnv::new().await;

    let test_cases = vec![
        ("grape", "mango"),
        ("grape", "pineapple"),
        ("empty", ""),
        ("binary", "with\r\nembedded\nnewlines\r"),
    ];

    for (key, value) in test_cases {
        assert_eq!(
            env.dispatch(TestUtils::set_command(key, value)).await,
            TestUtils::expected_simple_string("OK")
        );
        assert_eq!(
            env.dispatch(TestUtils::get_command(key)).await,
            TestUtils::expected_bulk_string(value)
        );
    }

    assert_eq!(env.store.len().await, 3);
}

#[tokio::test]
async fn test_handle_get_command_not_found() {
    let env = TestEnv::new().await;

    assert_eq!(
        env.dispatch(TestUtils::get_command("grape")).await,
        TestUtils::expected_error("ERR key 'grape' not found")
    );
}

#[tokio::test]
async fn test_handle_commands_with_wrong_number_of_arguments() {
    let env = TestEnv::new().await;

    let test_cases = vec![
        (
            TestUtils::command(&["SET", "grape"]),
            "ERR wrong number of arguments for 'SET' command, expected: SET key value",
        ),
        (
            TestUtils::command(&["SET", "grape", "mango", "PX"]),
            "ERR wrong number of arguments for 'SET' command, expected: SET key value",
        ),
        (
            TestUtils::command(&["GET"]),
            "ERR wrong number of arguments for 'GET' command, expected: GET key",
        ),
        (
            TestUtils::command(&["GET", "grape", "mango"]),
            "ERR wrong number of arguments for 'GET' command, expected: GET key",
        ),
        (
            TestUtils::command(&["HSET", "fruits", "grape"]),
            "ERR wrong number of arguments for 'HSET' command, expected: HSET key field value",
        ),
        (
            TestUtils::command(&["HGET", "fruits"]),
            "ERR wrong number of arguments for 'HGET' command, expected: HGET key field",
        ),
        (
            TestUtils::command(&["HGETALL"]),
            "ERR wrong number of arguments for 'HGETALL' command, expected: HGETALL key",
        ),
    ];

    for (command, expected_error) in test_cases {
        assert_eq!(
            env.dispatch(command.clone()).await,
            TestUtils::expected_error(expected_error),
            "{:?}",
            command
        );
    }

    assert!(env.store.is_empty().await);
}

#[tokio::test]
async fn test_handle_hset_and_hget_commands() {
    let env = TestEnv::new().await;

    assert_eq!(
        env.dispatch(TestUtils::hset_command("fruits", "grape", "purple")).await,
        TestUtils::expected_simple_string("OK")
    );
    assert_eq!(
        env.dispatch(TestUtils::hget_command("fruits", "grape")).await,
        TestUtils::expected_bulk_string("purple")
    );

    assert_eq!(
        env.dispatch(TestUtils::hset_command("fruits", "grape", "green")).await,
        TestUtils::expected_simple_string("OK")
    );
    assert_eq!(
        env.dispatch(TestUtils::hget_command("fruits", "grape")).await,
        TestUtils::expected_bulk_string("green")
    );
    assert_eq!(env.store.hash_len().await, 1);
}

#[tokio::test]
async fn test_handle_hget_command_distinguishes_missing_key_and_field() {
    let env = TestEnv::new().await;

    env.dispatch(TestUtils::hset_command("fruits", "grape", "purple"))
        .await;

    let missing_field = env.dispatch(TestUtils::hget_command("fruits", "mango")).await;
    let missing_key = env.dispatch(TestUtils::hget_command("colors", "grape")).await;

    assert_eq!(
        missing_field,
        TestUtils::expected_error("ERR field 'mango' not found in key 'fruits'")
    );
    assert_eq!(
        missing_key,
        TestUtils::expected_error("ERR key 'colors' not found")
    );
    assert_ne!(missing_field, missing_key);
}

#[tokio::test]
async fn test_handle_hgetall_command() {
    let env = TestEnv::new().await;

    env.dispatch(TestUtils::hset_command("h", "a", "1")).await;
    env.dispatch(TestUtils::hset_command("h", "b", "2")).await;

    let response = env.dispatch(TestUtils::hgetall_command("h")).await;

    assert_eq!(
        TestUtils::sorted_pairs(response),
        vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string())
        ]
    );
}

#[tokio::test]
async fn test_handle_hgetall_command_not_found() {
    let env = TestEnv::new().await;

    assert_eq!(
        env.dispatch(TestUtils::hgetall_command("h")).await,
        TestUtils::expected_error("ERR key 'h' not found")
    );
}

#[tokio::test]
async fn test_string_and_hash_namespaces_are_independent() {
    let env = TestEnv::new().await;

    env.dispatch(TestUtils::set_command("shared", "flat")).await;

    assert_eq!(
        env.dispatch(TestUtils::hgetall_command("shared")).await,
        TestUtils::expected_error("ERR key 'shared' not found")
    );

    env.dispatch(TestUtils::hset_command("shared", "f", "v")).await;

    assert_eq!(
        env.dispatch(TestUtils::get_command("shared")).await,
        TestUtils::expected_bulk_string("flat")
    );
}

#[tokio::test]
async fn test_command_names_are_case_insensitive() {
    let env = TestEnv::new().await;

    assert_eq!(
        env.dispatch(TestUtils::command(&["sEt", "grape", "mango"])).await,
        TestUtils::expected_simple_string("OK")
    );
    assert_eq!(
        env.dispatch(TestUtils::command(&["get", "grape"])).await,
        TestUtils::expected_bulk_string("mango")
    );
    assert!(env.table.lookup("hgetall").is_some());
}

#[tokio::test]
async fn test_dispatch_unknown_command() {
    let table = CommandTable::new();
    let store = KeyValueStore::new();

    let command_handler = CommandHandler::new(TestUtils::command(&["flushall"])).unwrap();

    assert_eq!(
        table.dispatch(&command_handler, &store).await,
        Err(DispatchError::UnknownCommand("FLUSHALL".to_string()))
    );
    assert!(store.is_empty().await);
}

#[test]
fn test_command_table_names() {
    let table = CommandTable::new();

    assert_eq!(
        table.names(),
        vec!["GET", "HGET", "HGETALL", "HSET", "PING", "SET"]
    );
}

#[test]
fn test_command_handler_creation() {
    let command_handler =
        CommandHandler::new(TestUtils::command(&["hset", "fruits", "grape", "purple"])).unwrap();

    assert_eq!(command_handler.name, "HSET");
    assert_eq!(
        command_handler.arguments,
        vec![
            Bytes::from("fruits"),
            Bytes::from("grape"),
            Bytes::from("purple")
        ]
    );
    assert_eq!(
        command_handler.input,
        TestUtils::command(&["hset", "fruits", "grape", "purple"])
    );
}

#[test]
fn test_command_handler_creation_invalid() {
    let test_cases = vec![
        (RespValue::Array(vec![]), CommandError::EmptyCommand),
        (
            RespValue::SimpleString("PING".to_string()),
            CommandError::InvalidCommand,
        ),
        (RespValue::bulk_string("PING"), CommandError::InvalidCommand),
        (
            RespValue::Array(vec![RespValue::Integer(1)]),
            CommandError::InvalidCommandArgument,
        ),
        (
            RespValue::Array(vec![
                RespValue::bulk_string("GET"),
                RespValue::Array(vec![]),
            ]),
            CommandError::InvalidCommandArgument,
        ),
    ];

    for (input, expected_error) in test_cases {
        assert_eq!(
            CommandHandler::new(input.clone()),
            Err(expected_error),
            "{:?}",
            input
        );
    }
}

#[tokio::test]
async fn test_commands_run_against_any_store() {
    struct EmptyStore;

    #[async_trait::async_trait]
    impl Store for EmptyStore {
        async fn set(&self, _key: Bytes, _value: Bytes) {}

        async fn get(&self, key: &[u8]) -> Result<Bytes, resp_kv::key_value_store::StoreError> {
            Err(resp_kv::key_value_store::StoreError::KeyNotFound(
                String::from_utf8_lossy(key).into_owned(),
            ))
        }

        async fn hset(&self, _key: Bytes, _field: Bytes, _value: Bytes) {}

        async fn hget(
            &self,
            key: &[u8],
            _field: &[u8],
        ) -> Result<Bytes, resp_kv::key_value_store::StoreError> {
            self.get(key).await
        }

        async fn hgetall(
            &self,
            key: &[u8],
        ) -> Result<Vec<(Bytes, Bytes)>, resp_kv::key_value_store::StoreError> {
            self.get(key).await.map(|_| Vec::new())
        }
    }

    let table = CommandTable::new();
    let command_handler = CommandHandler::new(TestUtils::get_command("grape")).unwrap();

    assert_eq!(
        table.dispatch(&command_handler, &EmptyStore).await,
        Ok(TestUtils::expected_error("ERR key 'grape' not found"))
    );
}
