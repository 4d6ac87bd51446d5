//! The compiled-rule cache (spec §4.G): compiles a message descriptor's
//! rules once and reuses the result for every later message of that
//! type, the way `examples/jwilger-caxton` uses `DashMap` for its
//! actor-registry cache instead of a hand-rolled `RwLock` plus
//! double-checked locking.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use prost_reflect::{Kind, MessageDescriptor};

use crate::compiler;
use crate::error::Result;
use crate::node::MessageNode;
use crate::validator::Validator;

/// A thread-safe, lazily-populated cache of compiled [`MessageNode`]s,
/// keyed by the message's fully-qualified protobuf name.
pub struct Factory {
    cache: DashMap<String, Arc<MessageNode>>,
    lazy_loading: bool,
    allow_unknown_fields: bool,
}

impl Default for Factory {
    fn default() -> Self {
        Factory::new()
    }
}

impl Factory {
    pub fn new() -> Self {
        Factory {
            cache: DashMap::new(),
            lazy_loading: true,
            allow_unknown_fields: false,
        }
    }

    /// Turns off lazy compilation: [`Self::add`] will compile and cache
    /// `desc` immediately instead of waiting for the first `validate`
    /// call to touch it, surfacing compilation errors up front.
    pub fn disable_lazy_loading(&mut self) -> &mut Self {
        self.lazy_loading = false;
        self
    }

    /// Whether an options message still carrying fields the descriptor
    /// pool didn't resolve as a known rule annotation is tolerated
    /// (`true`) or a compilation error (`false`, the default).
    pub fn allow_unknown_fields(&mut self, allow: bool) -> &mut Self {
        self.allow_unknown_fields = allow;
        self
    }

    /// Registers a message type with the factory: always eagerly compiles
    /// and caches `desc` itself, then recurses into every message-typed
    /// field reachable from it (transitively), so a single `add` call on
    /// a root type pulls in its whole reachable schema. Combined with
    /// [`Self::disable_lazy_loading`], this lets [`Self::get`] enforce a
    /// strict allow-list: only descriptors that passed through `add` are
    /// ever compiled.
    #[tracing::instrument(skip(self, desc), fields(message = desc.full_name()))]
    pub fn add(&self, desc: &MessageDescriptor) -> Result<()> {
        let mut visited = HashSet::new();
        self.add_transitive(desc, &mut visited)
    }

    fn add_transitive(&self, desc: &MessageDescriptor, visited: &mut HashSet<String>) -> Result<()> {
        if !visited.insert(desc.full_name().to_string()) {
            return Ok(());
        }
        self.compile_and_cache(desc)?;
        for field in desc.fields() {
            if let Kind::Message(nested) = field.kind() {
                self.add_transitive(&nested, visited)?;
            }
        }
        Ok(())
    }

    fn compile_and_cache(&self, desc: &MessageDescriptor) -> Result<Arc<MessageNode>> {
        if let Some(node) = self.cache.get(desc.full_name()) {
            return Ok(node.clone());
        }
        let compiled = Arc::new(compiler::compile_message(desc, self.allow_unknown_fields)?);
        self.cache.insert(desc.full_name().to_string(), compiled.clone());
        tracing::debug!(message = desc.full_name(), "compiled rule node");
        Ok(compiled)
    }

    /// Returns the compiled rule tree for `desc`. Under lazy loading
    /// (the default), compiles and caches it on first use — concurrent
    /// first uses of the same message type may both compile; the cache
    /// converges on whichever result is inserted last, which is harmless
    /// since both are equivalent. Under [`Self::disable_lazy_loading`],
    /// returns `None` for any descriptor that was never passed to
    /// [`Self::add`] instead of compiling it on demand.
    #[tracing::instrument(skip(self, desc), fields(message = desc.full_name()))]
    pub fn get(&self, desc: &MessageDescriptor) -> Option<Arc<MessageNode>> {
        if let Some(node) = self.cache.get(desc.full_name()) {
            return Some(node.clone());
        }
        if !self.lazy_loading {
            tracing::debug!(message = desc.full_name(), "not found under strict loading");
            return None;
        }
        self.compile_and_cache(desc).ok()
    }

    /// Builds a validator bound to this factory.
    pub fn new_validator(&self, fail_fast: bool) -> Validator<'_> {
        Validator::new(self, fail_fast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_factory_has_empty_cache() {
        let factory = Factory::new();
        assert!(factory.cache.is_empty());
    }
}
