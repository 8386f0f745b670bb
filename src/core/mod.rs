//! # Core Module
//!
//! Configuration, error types, and reply formatting shared by the command system.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add response module with reply splitting
//! - 1.0.0: Initial creation with config and error modules

pub mod config;
pub mod error;
pub mod response;

pub use config::{normalize_prefix, DispatchConfig};
pub use error::{DispatchError, DispatchResult};
pub use response::{split_reply, MESSAGE_LIMIT};
