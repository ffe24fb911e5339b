//! Business logic and port traits for Parley.
//!
//! This crate defines the "ports" (repository, cache and generator traits)
//! that the infrastructure layer implements. It depends only on
//! `parley-types` -- never on `parley-infra` or any database/IO crate.

pub mod chat;
pub mod generator;
