//! Command registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Ordered by canonical alias, first match wins, internal RwLock
//! - 1.0.0: Initial implementation for handler dispatch

use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::descriptor::CommandDescriptor;
use crate::core::error::{DispatchError, DispatchResult};

/// Canonical alias, then registration sequence
type EntryKey = (String, u64);

type Entries = BTreeMap<EntryKey, Arc<CommandDescriptor>>;

/// Registered command descriptors in a deterministic order
///
/// Descriptors are ordered by canonical alias, ties broken by registration
/// order. Lookups return the first descriptor in that order that declares the
/// alias, so a later descriptor sharing an alias is shadowed.
///
/// Each operation takes the internal lock once; there is no transaction across
/// calls.
///
/// # Example
///
/// ```ignore
/// let registry = CommandRegistry::new();
/// registry.register(CommandDescriptor::builder(Arc::new(PingCommand)).alias("ping").build()).await?;
///
/// if let Some(descriptor) = registry.find("ping").await {
///     // ...
/// }
/// ```
#[derive(Clone, Default)]
pub struct CommandRegistry {
    entries: Arc<RwLock<Entries>>,
    sequence: Arc<AtomicU64>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor
    ///
    /// Fails with [`DispatchError::InvalidDescriptor`] when the descriptor has
    /// no aliases.
    pub async fn register(&self, descriptor: CommandDescriptor) -> DispatchResult<()> {
        if descriptor.aliases().is_empty() {
            return Err(DispatchError::InvalidDescriptor(
                "alias list cannot be empty".to_string(),
            ));
        }

        let key = (
            descriptor.canonical_alias().to_string(),
            self.sequence.fetch_add(1, Ordering::Relaxed),
        );
        info!("📝 Registered command '{}' (aliases: {})", key.0, descriptor.aliases().join(", "));
        self.entries.write().await.insert(key, Arc::new(descriptor));
        Ok(())
    }

    /// First descriptor, in registry order, declaring `word` as an alias
    pub async fn find(&self, word: &str) -> Option<Arc<CommandDescriptor>> {
        self.entries
            .read()
            .await
            .values()
            .find(|descriptor| descriptor.matches(word))
            .cloned()
    }

    /// Remove every descriptor declaring the alias
    ///
    /// `prefix` is stripped from `alias` first when present, so both `ping` and
    /// `!ping` work. Returns the number of descriptors removed.
    pub async fn unregister(&self, alias: &str, prefix: &str) -> usize {
        let alias = if prefix.is_empty() {
            alias
        } else {
            alias.strip_prefix(prefix).unwrap_or(alias)
        };

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, descriptor| !descriptor.matches(alias));
        let removed = before - entries.len();

        debug!("🗑️ Unregistered {removed} command(s) for alias '{alias}'");
        removed
    }

    /// Number of registered descriptors
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of all descriptors in registry order
    pub async fn descriptors(&self) -> Vec<Arc<CommandDescriptor>> {
        self.entries.read().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::binder::BoundArgs;
    use crate::commands::context::ExecutionContext;
    use crate::commands::handler::{CommandExecutor, HandlerOutput};
    use anyhow::Result;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl CommandExecutor for Named {
        async fn execute(&self, _args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
            Ok(HandlerOutput::text(self.0))
        }
    }

    fn descriptor(tag: &'static str, aliases: &[&str]) -> CommandDescriptor {
        CommandDescriptor::builder(Arc::new(Named(tag)))
            .aliases(aliases.iter().copied())
            .description(tag)
            .build()
    }

    #[tokio::test]
    async fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty().await);
        assert_eq!(registry.len().await, 0);
        assert!(registry.find("ping").await.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_empty_aliases() {
        let registry = CommandRegistry::new();
        let err = registry.register(descriptor("empty", &[])).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidDescriptor(_)));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_by_any_alias() {
        let registry = CommandRegistry::new();
        registry
            .register(descriptor("ask", &["ask", "question", "q"]))
            .await
            .unwrap();

        for alias in ["ask", "question", "q"] {
            let found = registry.find(alias).await.unwrap();
            assert_eq!(found.canonical_alias(), "ask");
        }
        assert!(registry.find("Ask").await.is_none());
        assert!(registry.find("asking").await.is_none());
    }

    #[tokio::test]
    async fn test_find_iff_alias_registered() {
        let registry = CommandRegistry::new();
        registry.register(descriptor("a", &["alpha", "a"])).await.unwrap();
        registry.register(descriptor("b", &["beta"])).await.unwrap();

        let known = ["alpha", "a", "beta"];
        for word in ["alpha", "a", "beta", "gamma", "", "b"] {
            assert_eq!(registry.find(word).await.is_some(), known.contains(&word), "{word}");
        }
    }

    #[tokio::test]
    async fn test_shared_alias_first_in_order_wins() {
        let registry = CommandRegistry::new();
        // "zeta" sorts after "beta", so "beta" wins the shared alias
        registry.register(descriptor("zeta", &["zeta", "x"])).await.unwrap();
        registry.register(descriptor("beta", &["beta", "x"])).await.unwrap();

        let found = registry.find("x").await.unwrap();
        assert_eq!(found.canonical_alias(), "beta");
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_same_canonical_alias_keeps_registration_order() {
        let registry = CommandRegistry::new();
        registry.register(descriptor("first", &["dup"])).await.unwrap();
        registry.register(descriptor("second", &["dup"])).await.unwrap();

        let found = registry.find("dup").await.unwrap();
        assert_eq!(found.description(), "first");
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_descriptors_sorted_by_canonical_alias() {
        let registry = CommandRegistry::new();
        registry.register(descriptor("c", &["charlie"])).await.unwrap();
        registry.register(descriptor("a", &["alpha"])).await.unwrap();
        registry.register(descriptor("b", &["bravo"])).await.unwrap();

        let names: Vec<String> = registry
            .descriptors()
            .await
            .iter()
            .map(|d| d.canonical_alias().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
    }

    #[tokio::test]
    async fn test_unregister_removes_all_declaring_alias() {
        let registry = CommandRegistry::new();
        registry.register(descriptor("one", &["one", "shared"])).await.unwrap();
        registry.register(descriptor("two", &["two", "shared"])).await.unwrap();
        registry.register(descriptor("three", &["three"])).await.unwrap();

        assert_eq!(registry.unregister("shared", "!").await, 2);
        assert!(registry.find("one").await.is_none());
        assert!(registry.find("two").await.is_none());
        assert!(registry.find("three").await.is_some());
    }

    #[tokio::test]
    async fn test_unregister_accepts_prefixed_alias() {
        let registry = CommandRegistry::new();
        registry.register(descriptor("ping", &["ping"])).await.unwrap();

        assert_eq!(registry.unregister("!ping", "!").await, 1);
        assert!(registry.is_empty().await);
        assert_eq!(registry.unregister("!ping", "!").await, 0);
    }

    #[tokio::test]
    async fn test_unregister_with_empty_prefix() {
        let registry = CommandRegistry::new();
        registry.register(descriptor("ping", &["ping"])).await.unwrap();

        assert_eq!(registry.unregister("ping", "").await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let registry = CommandRegistry::new();
        let clone = registry.clone();
        clone.register(descriptor("ping", &["ping"])).await.unwrap();
        assert!(registry.find("ping").await.is_some());
    }
}
