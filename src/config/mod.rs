//! Configuration for salvage runs
//!
//! Provides types and parsing for `salvage.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
