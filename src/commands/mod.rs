//! # Command System
//!
//! Prefix-triggered chat commands: tokenizer, registry, parameter binding,
//! permission checks and the dispatcher that ties them together.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Detached executor, listener and help page
//! - 2.0.0: Descriptors built explicitly, executors declare parameter slots
//! - 1.0.0: Initial dispatch pipeline

pub mod binder;
pub mod context;
pub mod descriptor;
pub mod dispatcher;
pub mod executor;
pub mod handler;
pub mod help;
pub mod listener;
pub mod permissions;
pub mod registry;
pub mod tokenizer;

pub use binder::{ArgValue, BoundArgs, BoundValue, ParameterBinder, SlotKind};
pub use context::{
    Channel, ChannelMessageEvent, ChatTransport, ExecutionContext, IdentityLookup, InboundEvent,
    PrivateMessageEvent, Scope, User,
};
pub use descriptor::{CommandDescriptor, CommandDescriptorBuilder};
pub use dispatcher::{DispatchOutcome, Dispatcher, IgnoreReason};
pub use executor::{DetachedExecutor, TaskRecord, TaskStatus, FINISHED_TASK_RETENTION};
pub use handler::{CommandExecutor, HandlerOutput};
pub use help::{help_entries, render_help, HelpEntry};
pub use listener::{Listener, ListenerHandle};
pub use permissions::{Permission, PermissionGate};
pub use registry::CommandRegistry;
pub use tokenizer::TokenizedCommand;
