//! # CFA Common Library
//!
//! Shared code for the conformational-alignment tooling:
//! - Error types
//! - Data folder and TOML configuration resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
