//! Configuration, shared types, and error definitions for objgate.
//!
//! This crate holds the pieces every other objgate crate agrees on: the
//! immutable [`GatewayConfig`] assembled once at startup, the [`S3Url`]
//! shorthand for bucket locations, and the [`ConfigError`] raised when a
//! configuration cannot be loaded or fails validation.

pub mod config;
mod error;
mod types;

pub use config::{EncoderOptions, GatewayConfig, StorageConfig};
pub use error::{ConfigError, ConfigResult};
pub use types::S3Url;
