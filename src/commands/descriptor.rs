//! Command descriptors
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use std::fmt;
use std::sync::Arc;

use super::context::Scope;
use super::handler::CommandExecutor;
use super::permissions::Permission;

pub const DEFAULT_DESCRIPTION: &str = "none";

/// Metadata and executor for one registered command
///
/// Built with [`CommandDescriptor::builder`]. The first alias is the canonical
/// name used for ordering and help output.
#[derive(Clone)]
pub struct CommandDescriptor {
    aliases: Vec<String>,
    listens_to_private: bool,
    listens_to_channel: bool,
    description: String,
    usage: String,
    required_permission: Permission,
    show_in_help: bool,
    run_async: bool,
    executor: Arc<dyn CommandExecutor>,
}

impl CommandDescriptor {
    pub fn builder(executor: Arc<dyn CommandExecutor>) -> CommandDescriptorBuilder {
        CommandDescriptorBuilder::new(executor)
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// First alias, or empty for a descriptor with no aliases
    pub fn canonical_alias(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or("")
    }

    pub fn matches(&self, word: &str) -> bool {
        self.aliases.iter().any(|alias| alias == word)
    }

    pub fn listens_to_private(&self) -> bool {
        self.listens_to_private
    }

    pub fn listens_to_channel(&self) -> bool {
        self.listens_to_channel
    }

    pub fn listens_to(&self, scope: Scope) -> bool {
        match scope {
            Scope::Channel => self.listens_to_channel,
            Scope::Private => self.listens_to_private,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared usage, falling back to the canonical alias
    pub fn usage(&self) -> &str {
        if self.usage.is_empty() {
            self.canonical_alias()
        } else {
            &self.usage
        }
    }

    pub fn required_permission(&self) -> Permission {
        self.required_permission
    }

    pub fn show_in_help(&self) -> bool {
        self.show_in_help
    }

    pub fn run_async(&self) -> bool {
        self.run_async
    }

    pub fn executor(&self) -> &Arc<dyn CommandExecutor> {
        &self.executor
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("aliases", &self.aliases)
            .field("listens_to_private", &self.listens_to_private)
            .field("listens_to_channel", &self.listens_to_channel)
            .field("required_permission", &self.required_permission)
            .field("run_async", &self.run_async)
            .finish_non_exhaustive()
    }
}

pub struct CommandDescriptorBuilder {
    descriptor: CommandDescriptor,
}

impl CommandDescriptorBuilder {
    fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            descriptor: CommandDescriptor {
                aliases: Vec::new(),
                listens_to_private: true,
                listens_to_channel: true,
                description: DEFAULT_DESCRIPTION.to_string(),
                usage: String::new(),
                required_permission: Permission::Everyone,
                show_in_help: true,
                run_async: false,
                executor,
            },
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.descriptor.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptor
            .aliases
            .extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn private_messages(mut self, enabled: bool) -> Self {
        self.descriptor.listens_to_private = enabled;
        self
    }

    pub fn channel_messages(mut self, enabled: bool) -> Self {
        self.descriptor.listens_to_channel = enabled;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.descriptor.usage = usage.into();
        self
    }

    pub fn required_permission(mut self, permission: Permission) -> Self {
        self.descriptor.required_permission = permission;
        self
    }

    pub fn show_in_help(mut self, show: bool) -> Self {
        self.descriptor.show_in_help = show;
        self
    }

    pub fn run_async(mut self, run_async: bool) -> Self {
        self.descriptor.run_async = run_async;
        self
    }

    /// Finish the descriptor. Aliases are validated at registration.
    pub fn build(self) -> CommandDescriptor {
        self.descriptor
    }
}
