//! Spritesalvage - recover game assets from HTTP archives
//!
//! This library provides functionality to:
//! - Extract images, audio, fonts and JSON data embedded in HAR captures
//! - Recover sprite-atlas metadata from resource manifests or raw text
//! - Classify sprites by naming convention
//! - Cut atlas textures into individually named sprite images

pub mod archive;
pub mod atlas;
pub mod classify;
pub mod cli;
pub mod config;
pub mod decompose;
pub mod error;
pub mod extract;
pub mod output;
pub mod progress;
pub mod report;
pub mod store;

pub use error::{Result, SalvageError};
