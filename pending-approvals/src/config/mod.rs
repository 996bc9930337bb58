//! Configuration module for approval registries
//!
//! Configuration is read from TOML; every field has a default so an empty
//! or missing file is valid.

pub mod types;

pub use types::*;
