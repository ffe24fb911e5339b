//! Infrastructure layer for Parley.
//!
//! Implementations of the ports defined in `parley-core`: the SQLite durable
//! log, in-process and Valkey conversation caches, OpenAI-compatible and
//! local response generators, plus the configuration loader.

pub mod cache;
pub mod config;
pub mod llm;
pub mod sqlite;
