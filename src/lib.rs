// Core layer - configuration, errors, reply formatting
pub mod core;

// Application layer - command dispatch
pub mod commands;

pub use crate::core::{DispatchConfig, DispatchError, DispatchResult};

pub use crate::commands::{
    ChatTransport, CommandDescriptor, CommandExecutor, DispatchOutcome, Dispatcher,
    ExecutionContext, HandlerOutput, IdentityLookup, Listener, Permission, SlotKind,
};
