//! Chat events, transport seams, and the per-dispatch execution context
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Split transport into `ChatTransport` and `IdentityLookup`
//! - 1.0.0: Initial implementation

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A chat user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Display name if set, login name otherwise
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// A group conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Whether an event came from a channel or a private conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Channel,
    Private,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Channel => write!(f, "channel"),
            Scope::Private => write!(f, "private"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessageEvent {
    pub text: String,
    pub channel: Channel,
    pub user: User,
}

impl ChannelMessageEvent {
    pub fn new(channel: Channel, user: User, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            channel,
            user,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateMessageEvent {
    pub text: String,
    pub user: User,
}

impl PrivateMessageEvent {
    pub fn new(user: User, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user,
        }
    }
}

/// Any message the dispatcher can receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Channel(ChannelMessageEvent),
    Private(PrivateMessageEvent),
}

impl InboundEvent {
    pub fn scope(&self) -> Scope {
        match self {
            InboundEvent::Channel(_) => Scope::Channel,
            InboundEvent::Private(_) => Scope::Private,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            InboundEvent::Channel(event) => &event.text,
            InboundEvent::Private(event) => &event.text,
        }
    }

    pub fn user(&self) -> &User {
        match self {
            InboundEvent::Channel(event) => &event.user,
            InboundEvent::Private(event) => &event.user,
        }
    }

    pub fn channel(&self) -> Option<&Channel> {
        match self {
            InboundEvent::Channel(event) => Some(&event.channel),
            InboundEvent::Private(_) => None,
        }
    }
}

impl From<ChannelMessageEvent> for InboundEvent {
    fn from(event: ChannelMessageEvent) -> Self {
        InboundEvent::Channel(event)
    }
}

impl From<PrivateMessageEvent> for InboundEvent {
    fn from(event: PrivateMessageEvent) -> Self {
        InboundEvent::Private(event)
    }
}

/// Outbound side of the chat platform
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_channel_message(&self, channel: &Channel, text: &str) -> Result<()>;

    async fn send_private_message(&self, user: &User, text: &str) -> Result<()>;
}

/// Resolves a user handle (without the leading `@`) to a full user record
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// `Ok(None)` when no such user exists
    async fn user_by_name(&self, name: &str) -> Result<Option<User>>;
}

/// Everything a handler can see about the message that triggered it
///
/// Cheap to clone: the transport is shared behind an `Arc`.
#[derive(Clone)]
pub struct ExecutionContext {
    pub request_id: Uuid,
    pub event: InboundEvent,
    pub session: Arc<dyn ChatTransport>,
}

impl ExecutionContext {
    pub fn new(request_id: Uuid, event: InboundEvent, session: Arc<dyn ChatTransport>) -> Self {
        Self {
            request_id,
            event,
            session,
        }
    }

    pub fn scope(&self) -> Scope {
        self.event.scope()
    }

    pub fn user(&self) -> &User {
        self.event.user()
    }

    pub fn channel(&self) -> Option<&Channel> {
        self.event.channel()
    }

    /// Send a message back to wherever the event came from
    pub async fn reply(&self, text: &str) -> Result<()> {
        match &self.event {
            InboundEvent::Channel(event) => {
                self.session.send_channel_message(&event.channel, text).await
            }
            InboundEvent::Private(event) => self.session.send_private_message(&event.user, text).await,
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("request_id", &self.request_id)
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transport and identity lookup shared by the command tests

    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Channel { channel: String, text: String },
        Private { user: String, text: String },
    }

    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<Sent>>,
    }

    impl RecordingTransport {
        pub async fn sent(&self) -> Vec<Sent> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send_channel_message(&self, channel: &Channel, text: &str) -> Result<()> {
            self.sent.lock().await.push(Sent::Channel {
                channel: channel.name.clone(),
                text: text.to_string(),
            });
            Ok(())
        }

        async fn send_private_message(&self, user: &User, text: &str) -> Result<()> {
            self.sent.lock().await.push(Sent::Private {
                user: user.name.clone(),
                text: text.to_string(),
            });
            Ok(())
        }
    }

    /// Lookup backed by a fixed map; names listed in `failing` return an error
    #[derive(Default)]
    pub struct StaticLookup {
        pub users: HashMap<String, User>,
        pub failing: Vec<String>,
    }

    impl StaticLookup {
        pub fn with_user(mut self, user: User) -> Self {
            self.users.insert(user.name.clone(), user);
            self
        }

        pub fn failing_on(mut self, name: &str) -> Self {
            self.failing.push(name.to_string());
            self
        }
    }

    #[async_trait]
    impl IdentityLookup for StaticLookup {
        async fn user_by_name(&self, name: &str) -> Result<Option<User>> {
            if self.failing.iter().any(|n| n == name) {
                anyhow::bail!("lookup service unavailable");
            }
            Ok(self.users.get(name).cloned())
        }
    }

    pub fn alice() -> User {
        User::new("1001", "alice")
    }

    pub fn lobby() -> Channel {
        Channel::new("42", "lobby")
    }
}
