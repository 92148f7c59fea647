//! ce-core: shared configuration and error types for contacts-export
//!
//! The exporter is configured once at startup, either from a TOML file,
//! from environment variables, or both (environment wins). The resulting
//! [`Config`] is passed by reference into the CardDAV stages.

pub mod config;
pub mod error;

pub use config::{CarddavConfig, Config, HttpConfig, OutputConfig};
pub use error::{Error, Result};
