//! Error types surfaced by the dispatch core
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! Only registration and configuration can fail loudly. Everything that
//! happens while a message is being dispatched is logged and swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// A descriptor was registered without any alias.
    #[error("invalid command descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_descriptor_message() {
        let err = DispatchError::InvalidDescriptor("alias list is empty".to_string());
        assert_eq!(
            err.to_string(),
            "invalid command descriptor: alias list is empty"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DispatchError>();
    }
}
