//! BehaviorRegistry - named catalog of behaviors.
//!
//! Behaviors can be composed directly from their `Arc`s, but larger setups
//! register them once under a name and resolve pipelines by name. The
//! registry stores each behavior by name and keeps a reverse index by
//! [`BehaviorId`].
//!
//! # Example
//!
//! ```
//! use pipework_registry::{Behavior, BehaviorRegistry};
//!
//! let mut registry = BehaviorRegistry::new();
//! registry.define(Behavior::builder("Base").default("level", 1)).unwrap();
//!
//! let child = registry.extend(Behavior::builder("Child"), "Base").unwrap();
//! registry.define(child.overrides("level", 2)).unwrap();
//!
//! let pipeline = registry.resolve_pipeline(["Child", "Base"]).unwrap();
//! assert_eq!(pipeline.len(), 2);
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;

use pipework_core::{BehaviorId, Instruction, RegistrationError};

use crate::behavior::{Behavior, BehaviorBuilder};

/// Catalog of behaviors by name.
#[derive(Debug, Default)]
pub struct BehaviorRegistry {
    /// Behaviors by name (primary storage).
    behaviors: FxHashMap<String, Arc<Behavior>>,

    /// Reverse index: id -> name.
    names_by_id: FxHashMap<BehaviorId, String>,

    /// Registration order, for listing.
    order: Vec<String>,
}

impl BehaviorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a built behavior under its name.
    pub fn register(
        &mut self,
        behavior: Arc<Behavior>,
    ) -> Result<Arc<Behavior>, RegistrationError> {
        let name = behavior.name().to_string();
        if self.behaviors.contains_key(&name) {
            return Err(RegistrationError::DuplicateBehavior(name));
        }

        tracing::debug!(behavior = %name, id = %behavior.id(), "registering behavior");

        self.names_by_id.insert(behavior.id(), name.clone());
        self.order.push(name.clone());
        self.behaviors.insert(name, Arc::clone(&behavior));
        Ok(behavior)
    }

    /// Build and register a behavior.
    pub fn define(&mut self, builder: BehaviorBuilder) -> Result<Arc<Behavior>, RegistrationError> {
        self.register(builder.build())
    }

    /// Make `builder` extend the registered behavior `parent`.
    pub fn extend(
        &self,
        builder: BehaviorBuilder,
        parent: &str,
    ) -> Result<BehaviorBuilder, RegistrationError> {
        Ok(builder.extends(self.resolve(parent)?))
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Get a behavior by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Behavior>> {
        self.behaviors.get(name)
    }

    /// Get a behavior by id.
    pub fn get_by_id(&self, id: BehaviorId) -> Option<&Arc<Behavior>> {
        self.names_by_id.get(&id).and_then(|name| self.behaviors.get(name))
    }

    /// Get a behavior by name, failing if it is not registered.
    pub fn resolve(&self, name: &str) -> Result<&Arc<Behavior>, RegistrationError> {
        self.get(name)
            .ok_or_else(|| RegistrationError::UnknownBehavior(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.behaviors.contains_key(name)
    }

    /// Ordered instruction list of a registered behavior.
    pub fn instructions_of(&self, name: &str) -> Result<&[Instruction], RegistrationError> {
        self.resolve(name).map(|b| b.instructions())
    }

    /// Resolve an ordered pipeline of behavior names.
    pub fn resolve_pipeline<I, S>(&self, names: I) -> Result<Vec<Arc<Behavior>>, RegistrationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| self.resolve(name.as_ref()).cloned())
            .collect()
    }

    /// Registered behavior names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registry_is_empty() {
        let registry = BehaviorRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.names().count(), 0);
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = BehaviorRegistry::new();
        let b = registry.define(Behavior::builder("Loud").default("volume", 11)).unwrap();

        assert!(registry.contains("Loud"));
        assert_eq!(registry.get("Loud").map(|b| b.name()), Some("Loud"));
        assert_eq!(registry.get_by_id(b.id()).map(|b| b.name()), Some("Loud"));
        assert_eq!(registry.instructions_of("Loud").unwrap().len(), 1);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = BehaviorRegistry::new();
        registry.define(Behavior::builder("B")).unwrap();
        let err = registry.define(Behavior::builder("B")).unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateBehavior("B".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_names_fail() {
        let mut registry = BehaviorRegistry::new();
        registry.define(Behavior::builder("Known")).unwrap();

        assert_eq!(
            registry.resolve_pipeline(["Known", "Missing"]).unwrap_err(),
            RegistrationError::UnknownBehavior("Missing".into())
        );
        assert!(registry.extend(Behavior::builder("Child"), "Nope").is_err());
        assert!(registry.instructions_of("Nope").is_err());
    }

    #[test]
    fn extend_by_name_inherits_instructions() {
        let mut registry = BehaviorRegistry::new();
        registry.define(Behavior::builder("Base").default("a", 1).default("b", 2)).unwrap();

        let child = registry
            .extend(Behavior::builder("Child").overrides("a", 3), "Base")
            .unwrap();
        let child = registry.define(child).unwrap();

        assert!(child.is_a("Base"));
        let collected: Vec<_> = child.instructions().iter().map(|i| i.name()).collect();
        assert_eq!(collected, vec!["a", "b"]);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Base", "Child"]);
    }
}
