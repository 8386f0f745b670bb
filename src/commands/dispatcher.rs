//! # Command Dispatcher
//!
//! Turns inbound chat messages into command executions: prefix check,
//! tokenization, alias lookup, scope and permission checks, parameter binding,
//! then inline or detached execution with the textual result sent back to the
//! conversation the message came from.
//!
//! - **Version**: 2.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.2.0: Synchronous handlers run on their own task so a panic fails only that dispatch
//! - 2.1.0: Long replies are split to the configured message limit
//! - 2.0.0: Detached commands run on the bounded executor instead of bare tasks
//! - 1.1.0: Scope check runs a command iff its flag for the event's scope is set
//! - 1.0.0: Initial dispatch pipeline

use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::binder::ParameterBinder;
use super::context::{
    ChannelMessageEvent, ChatTransport, ExecutionContext, IdentityLookup, InboundEvent,
    PrivateMessageEvent, User,
};
use super::descriptor::CommandDescriptor;
use super::executor::DetachedExecutor;
use super::handler::HandlerOutput;
use super::help::render_help;
use super::permissions::{Permission, PermissionGate};
use super::registry::CommandRegistry;
use super::tokenizer::TokenizedCommand;
use crate::core::config::{normalize_prefix, DispatchConfig};
use crate::core::error::DispatchResult;
use crate::core::response::split_reply;

/// Why a message did not reach a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoPrefix,
    UnknownCommand,
    /// The command does not listen to this kind of conversation
    WrongScope,
}

/// What happened to one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    /// The sender lacks the required permission; the handler did not run
    Denied { denial_sent: bool },
    /// A synchronous handler ran to completion
    Completed { replied: bool },
    /// A synchronous handler returned an error or panicked
    Failed,
    /// An asynchronous handler was handed to the detached executor
    Spawned(Uuid),
}

/// Per-message command dispatch
///
/// Cheap to clone; clones share registry, permissions, prefix and executor.
#[derive(Clone)]
pub struct Dispatcher {
    registry: CommandRegistry,
    permissions: PermissionGate,
    binder: ParameterBinder,
    executor: DetachedExecutor,
    transport: Arc<dyn ChatTransport>,
    prefix: Arc<RwLock<String>>,
    missing_permissions_message: Arc<RwLock<Option<String>>>,
    message_limit: usize,
}

impl Dispatcher {
    pub fn new(
        config: &DispatchConfig,
        transport: Arc<dyn ChatTransport>,
        lookup: Arc<dyn IdentityLookup>,
    ) -> DispatchResult<Self> {
        config.validate()?;

        Ok(Self {
            registry: CommandRegistry::new(),
            permissions: PermissionGate::new(),
            binder: ParameterBinder::new(lookup)?,
            executor: DetachedExecutor::new(config.max_concurrent_tasks),
            transport,
            prefix: Arc::new(RwLock::new(config.normalized_prefix())),
            missing_permissions_message: Arc::new(RwLock::new(
                config.missing_permissions_message.clone(),
            )),
            message_limit: config.message_limit,
        })
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn permissions(&self) -> &PermissionGate {
        &self.permissions
    }

    pub fn executor(&self) -> &DetachedExecutor {
        &self.executor
    }

    pub async fn register(&self, descriptor: CommandDescriptor) -> DispatchResult<()> {
        self.registry.register(descriptor).await
    }

    /// Remove every command declaring `alias`, with or without the current prefix
    pub async fn unregister(&self, alias: &str) -> usize {
        let prefix = self.prefix().await;
        self.registry.unregister(alias, &prefix).await
    }

    /// Change the prefix at runtime. Spaces are removed; `None` listens to every message.
    pub async fn set_prefix(&self, prefix: Option<&str>) {
        let prefix = normalize_prefix(prefix);
        info!("🔧 Command prefix set to '{prefix}'");
        *self.prefix.write().await = prefix;
    }

    pub async fn prefix(&self) -> String {
        self.prefix.read().await.clone()
    }

    /// Message sent on permission denial; `None` sends nothing
    pub async fn set_missing_permissions_message(&self, message: Option<String>) {
        *self.missing_permissions_message.write().await = message;
    }

    /// Help page for the currently registered commands
    pub async fn help_text(&self) -> String {
        let prefix = self.prefix().await;
        render_help(&self.registry.descriptors().await, &prefix)
    }

    pub async fn on_channel_message(&self, event: ChannelMessageEvent) -> DispatchOutcome {
        self.dispatch(InboundEvent::Channel(event)).await
    }

    pub async fn on_private_message(&self, event: PrivateMessageEvent) -> DispatchOutcome {
        self.dispatch(InboundEvent::Private(event)).await
    }

    /// Dispatch one inbound message
    ///
    /// Never fails: unknown commands, wrong scope, handler errors and handler
    /// panics are logged and reported through the returned outcome only.
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        let prefix = self.prefix().await;
        let Some(line) = event.text().strip_prefix(prefix.as_str()) else {
            return DispatchOutcome::Ignored(IgnoreReason::NoPrefix);
        };

        let request_id = Uuid::new_v4();
        let command = TokenizedCommand::parse(line);

        let Some(descriptor) = self.registry.find(command.command()).await else {
            debug!("[{request_id}] ❓ No command registered for '{}'", command.command());
            return DispatchOutcome::Ignored(IgnoreReason::UnknownCommand);
        };

        let scope = event.scope();
        if !descriptor.listens_to(scope) {
            debug!(
                "[{request_id}] 🔇 Command '{}' does not listen to {scope} messages",
                descriptor.canonical_alias()
            );
            return DispatchOutcome::Ignored(IgnoreReason::WrongScope);
        }

        info!(
            "[{request_id}] 🎯 Processing command: {} | Args: {} | User: {} | Scope: {scope}",
            descriptor.canonical_alias(),
            command.args().len(),
            event.user().name
        );

        let ctx = ExecutionContext::new(request_id, event, Arc::clone(&self.transport));

        if !self.is_authorized(ctx.user(), descriptor.required_permission()) {
            info!(
                "[{request_id}] 🚫 {} lacks '{}' for '{}'",
                ctx.user().name,
                descriptor.required_permission(),
                descriptor.canonical_alias()
            );
            let denial_sent = self.send_denial(&ctx).await;
            return DispatchOutcome::Denied { denial_sent };
        }

        let slots = descriptor.executor().parameters();
        let args = self.binder.bind(&slots, &command, &ctx).await;
        let limit = self.message_limit;

        if descriptor.run_async() {
            let name = descriptor.canonical_alias().to_string();
            let task_id = self.executor.spawn(&name, request_id, async move {
                let output = descriptor.executor().execute(args, &ctx).await?;
                deliver_output(&ctx, output, limit).await;
                Ok::<(), anyhow::Error>(())
            });
            return DispatchOutcome::Spawned(task_id);
        }

        // Run on its own task so a panic is caught as a JoinError
        let handler = Arc::clone(&descriptor);
        let handler_ctx = ctx.clone();
        let result =
            tokio::spawn(async move { handler.executor().execute(args, &handler_ctx).await })
                .await;

        match result {
            Ok(Ok(output)) => {
                let replied = deliver_output(&ctx, output, limit).await;
                debug!("[{request_id}] ✅ Command '{}' completed", descriptor.canonical_alias());
                DispatchOutcome::Completed { replied }
            }
            Ok(Err(e)) => {
                error!(
                    "[{request_id}] ❌ Command '{}' failed: {e}",
                    descriptor.canonical_alias()
                );
                DispatchOutcome::Failed
            }
            Err(e) => {
                error!(
                    "[{request_id}] 💥 Command '{}' panicked: {e}",
                    descriptor.canonical_alias()
                );
                DispatchOutcome::Failed
            }
        }
    }

    /// Commands open to everyone skip the grant lookup
    fn is_authorized(&self, user: &User, required: Permission) -> bool {
        required == Permission::Everyone || self.permissions.authorize(user, required)
    }

    async fn send_denial(&self, ctx: &ExecutionContext) -> bool {
        let message = self.missing_permissions_message.read().await.clone();
        let Some(message) = message else {
            return false;
        };

        match ctx.reply(&message).await {
            Ok(()) => true,
            Err(e) => {
                warn!("[{}] ⚠️ Failed to send denial message: {e}", ctx.request_id);
                false
            }
        }
    }
}

/// Send textual output back to the originating conversation
///
/// Returns whether anything was sent. Send errors are logged, never raised.
async fn deliver_output(ctx: &ExecutionContext, output: HandlerOutput, limit: usize) -> bool {
    let text = match output {
        HandlerOutput::Text(text) => text,
        HandlerOutput::Data(value) => {
            debug!("[{}] Command returned data, not replying: {value}", ctx.request_id);
            return false;
        }
        HandlerOutput::Nothing => return false,
    };

    let chunks = split_reply(&text, limit);
    if chunks.is_empty() {
        return false;
    }

    let total = chunks.len();
    for (i, chunk) in chunks.iter().enumerate() {
        if let Err(e) = ctx.reply(chunk).await {
            error!(
                "[{}] ❌ Failed to send reply part {}/{total}: {e}",
                ctx.request_id,
                i + 1
            );
            return false;
        }
    }

    debug!("[{}] 📤 Reply sent in {total} part(s)", ctx.request_id);
    true
}
