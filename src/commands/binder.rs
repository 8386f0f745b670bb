//! # Parameter Binder
//!
//! Turns a handler's declared input slots into concrete values taken from the
//! tokenized command line and the event that triggered it.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Unresolvable `@handle` arguments fall back to plain text
//! - 1.0.0: Initial slot resolution

use log::{debug, warn};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::context::{
    Channel, ChannelMessageEvent, ChatTransport, ExecutionContext, IdentityLookup, InboundEvent,
    PrivateMessageEvent, User,
};
use super::tokenizer::TokenizedCommand;

/// Matched against the lower-cased argument
const HANDLE_PATTERN: &str = "^@[0-9a-z][0-9a-z_]{3,}$";

/// An input a handler can ask for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// The whole tokenized command
    Tokenized,
    CommandWord,
    /// Arguments as plain strings
    Arguments,
    /// The event, when it came from a channel
    ChannelEvent,
    /// The event, when it came from a private conversation
    PrivateEvent,
    /// The transport session
    Session,
    /// The channel, when there is one
    Channel,
    Invoker,
    /// Arguments with `@handle` tokens resolved to users
    MixedArguments,
    /// Anything the binder does not know; always bound to `Empty`
    Unknown(String),
}

/// One argument of a [`SlotKind::MixedArguments`] slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    User(User),
}

/// A value bound to a slot
#[derive(Clone)]
pub enum BoundValue {
    Tokenized(TokenizedCommand),
    Text(String),
    TextList(Vec<String>),
    ChannelEvent(ChannelMessageEvent),
    PrivateEvent(PrivateMessageEvent),
    Session(Arc<dyn ChatTransport>),
    Channel(Channel),
    User(User),
    Mixed(Vec<ArgValue>),
    Empty,
}

impl BoundValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, BoundValue::Empty)
    }
}

impl fmt::Debug for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Tokenized(cmd) => f.debug_tuple("Tokenized").field(cmd).finish(),
            BoundValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            BoundValue::TextList(list) => f.debug_tuple("TextList").field(list).finish(),
            BoundValue::ChannelEvent(event) => f.debug_tuple("ChannelEvent").field(event).finish(),
            BoundValue::PrivateEvent(event) => f.debug_tuple("PrivateEvent").field(event).finish(),
            BoundValue::Session(_) => f.write_str("Session(..)"),
            BoundValue::Channel(channel) => f.debug_tuple("Channel").field(channel).finish(),
            BoundValue::User(user) => f.debug_tuple("User").field(user).finish(),
            BoundValue::Mixed(values) => f.debug_tuple("Mixed").field(values).finish(),
            BoundValue::Empty => f.write_str("Empty"),
        }
    }
}

/// Positional values handed to a command, one per declared slot
#[derive(Debug, Clone, Default)]
pub struct BoundArgs(Vec<BoundValue>);

impl BoundArgs {
    pub fn new(values: Vec<BoundValue>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BoundValue> {
        self.0.get(index)
    }

    pub fn values(&self) -> &[BoundValue] {
        &self.0
    }

    /// Text at `index`, if that slot holds text
    pub fn text(&self, index: usize) -> Option<&str> {
        match self.0.get(index) {
            Some(BoundValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Argument list at `index`; empty when the slot holds something else
    pub fn list(&self, index: usize) -> &[String] {
        match self.0.get(index) {
            Some(BoundValue::TextList(list)) => list,
            _ => &[],
        }
    }

    pub fn user(&self, index: usize) -> Option<&User> {
        match self.0.get(index) {
            Some(BoundValue::User(user)) => Some(user),
            _ => None,
        }
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        match self.0.get(index) {
            Some(BoundValue::Channel(channel)) => Some(channel),
            _ => None,
        }
    }

    pub fn mixed(&self, index: usize) -> &[ArgValue] {
        match self.0.get(index) {
            Some(BoundValue::Mixed(values)) => values,
            _ => &[],
        }
    }
}

/// Resolves declared slots to values
#[derive(Clone)]
pub struct ParameterBinder {
    lookup: Arc<dyn IdentityLookup>,
    handle_pattern: Regex,
}

impl ParameterBinder {
    pub fn new(lookup: Arc<dyn IdentityLookup>) -> Result<Self, regex::Error> {
        Ok(Self {
            lookup,
            handle_pattern: Regex::new(HANDLE_PATTERN)?,
        })
    }

    /// Bind every slot, in order
    ///
    /// The result always has exactly one value per slot. Slots that do not apply
    /// to the event's scope, and unknown slot kinds, are bound to `Empty`.
    pub async fn bind(
        &self,
        slots: &[SlotKind],
        command: &TokenizedCommand,
        ctx: &ExecutionContext,
    ) -> BoundArgs {
        let mut values = Vec::with_capacity(slots.len());
        for slot in slots {
            values.push(self.bind_slot(slot, command, ctx).await);
        }
        BoundArgs(values)
    }

    async fn bind_slot(
        &self,
        slot: &SlotKind,
        command: &TokenizedCommand,
        ctx: &ExecutionContext,
    ) -> BoundValue {
        match (slot, &ctx.event) {
            (SlotKind::Tokenized, _) => BoundValue::Tokenized(command.clone()),
            (SlotKind::CommandWord, _) => BoundValue::Text(command.command().to_string()),
            (SlotKind::Arguments, _) => BoundValue::TextList(command.args().to_vec()),
            (SlotKind::ChannelEvent, InboundEvent::Channel(event)) => {
                BoundValue::ChannelEvent(event.clone())
            }
            (SlotKind::PrivateEvent, InboundEvent::Private(event)) => {
                BoundValue::PrivateEvent(event.clone())
            }
            (SlotKind::Session, _) => BoundValue::Session(Arc::clone(&ctx.session)),
            (SlotKind::Channel, InboundEvent::Channel(event)) => {
                BoundValue::Channel(event.channel.clone())
            }
            (SlotKind::Invoker, event) => BoundValue::User(event.user().clone()),
            (SlotKind::MixedArguments, _) => {
                BoundValue::Mixed(self.resolve_arguments(command.args(), ctx).await)
            }
            (SlotKind::Unknown(name), _) => {
                debug!("[{}] Unknown parameter slot '{name}', binding empty", ctx.request_id);
                BoundValue::Empty
            }
            _ => BoundValue::Empty,
        }
    }

    async fn resolve_arguments(&self, args: &[String], ctx: &ExecutionContext) -> Vec<ArgValue> {
        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            resolved.push(self.resolve_argument(arg, ctx).await);
        }
        resolved
    }

    /// `@handle` tokens become users; everything else, including handles the
    /// lookup cannot resolve, stays text
    async fn resolve_argument(&self, arg: &str, ctx: &ExecutionContext) -> ArgValue {
        let lowered = arg.to_lowercase();
        if !self.handle_pattern.is_match(&lowered) {
            return ArgValue::Text(arg.to_string());
        }

        let handle = &lowered[1..];
        match self.lookup.user_by_name(handle).await {
            Ok(Some(user)) => ArgValue::User(user),
            Ok(None) => {
                debug!("[{}] No user named '{handle}', keeping argument as text", ctx.request_id);
                ArgValue::Text(arg.to_string())
            }
            Err(e) => {
                warn!("[{}] ⚠️ User lookup for '{handle}' failed: {e}", ctx.request_id);
                ArgValue::Text(arg.to_string())
            }
        }
    }
}
