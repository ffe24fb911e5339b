//! Chat sessions, the durable message log and the turn pipeline.
//!
//! - `repository`: `ChatRepository` port (durable log + session directory)
//! - `cache`: `CacheStore` port and the `ConversationCache` window
//! - `locks`: per-session mutual exclusion
//! - `orchestrator`: one user/assistant turn
//! - `lifecycle`: create/list/rename/deactivate
//! - `service`: `ChatService` facade used by the API crate

pub mod cache;
pub mod lifecycle;
pub mod locks;
pub mod orchestrator;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
