//! A small Redis-compatible key-value server with append-only persistence.
//!
//! The crate provides:
//!
//! - The RESP wire codec shared by requests, replies and the log
//! - A concurrent in-memory store for string keys and hashes
//! - A command table for PING, SET, GET, HSET, HGET and HGETALL
//! - An append-only file that records every successful write and is
//!   replayed at startup, before clients are served
//!
//! Clients are served concurrently with Tokio, one task per connection.

pub mod aof;
pub mod commands;
pub mod connection;
pub mod key_value_store;
pub mod resp;
pub mod server;
