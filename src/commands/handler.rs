//! Command executor trait
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Handlers declare parameter slots and receive bound arguments
//! - 1.0.0: Initial implementation

use anyhow::Result;
use async_trait::async_trait;

use super::binder::{BoundArgs, SlotKind};
use super::context::ExecutionContext;

/// What a handler produced
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    /// Sent back to the conversation the command came from
    Text(String),
    /// Structured result. Logged, never sent.
    Data(serde_json::Value),
    Nothing,
}

impl HandlerOutput {
    pub fn text(text: impl Into<String>) -> Self {
        HandlerOutput::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            HandlerOutput::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<String> for HandlerOutput {
    fn from(text: String) -> Self {
        HandlerOutput::Text(text)
    }
}

impl From<Option<String>> for HandlerOutput {
    fn from(text: Option<String>) -> Self {
        text.map(HandlerOutput::Text).unwrap_or(HandlerOutput::Nothing)
    }
}

/// Trait implemented by every command
///
/// The executor declares which inputs it wants through [`parameters`]; the
/// dispatcher binds one value per slot, in the same order, and passes them to
/// [`execute`].
///
/// # Example
///
/// ```ignore
/// pub struct EchoCommand;
///
/// #[async_trait]
/// impl CommandExecutor for EchoCommand {
///     fn parameters(&self) -> Vec<SlotKind> {
///         vec![SlotKind::Arguments]
///     }
///
///     async fn execute(&self, args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
///         Ok(HandlerOutput::text(args.list(0).join(" ")))
///     }
/// }
/// ```
///
/// [`parameters`]: CommandExecutor::parameters
/// [`execute`]: CommandExecutor::execute
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Input slots, in the order `execute` expects them
    fn parameters(&self) -> Vec<SlotKind> {
        Vec::new()
    }

    async fn execute(&self, args: BoundArgs, ctx: &ExecutionContext) -> Result<HandlerOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn CommandExecutor) {}

    #[test]
    fn test_output_conversions() {
        assert_eq!(HandlerOutput::from("hi".to_string()).as_text(), Some("hi"));
        assert_eq!(HandlerOutput::from(None::<String>), HandlerOutput::Nothing);
        assert!(HandlerOutput::Data(serde_json::json!({"n": 1})).as_text().is_none());
    }
}
