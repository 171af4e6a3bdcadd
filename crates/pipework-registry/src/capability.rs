//! Capability registries.
//!
//! Behaviors may grant capability tags to the types composed with them. The
//! composer hands every grant to a [`CapabilityRegistry`] once the type is
//! built, one [`declare_capabilities`](CapabilityRegistry::declare_capabilities)
//! call per behavior. A rejected declaration aborts the composition.
//!
//! [`CapabilityTable`] is an in-memory registry keyed by [`TypeHash`].

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use rustc_hash::{FxHashMap, FxHashSet};

use pipework_core::{Capability, CapabilityError, ComposedType, TypeHash};

/// Collaborator informed of the capabilities composed types provide.
pub trait CapabilityRegistry: Send + Sync {
    /// Capabilities currently known for `ty`.
    fn query_capabilities(&self, ty: &ComposedType) -> BTreeSet<Capability>;

    /// Record that `ty` provides `tags`.
    fn declare_capabilities(
        &self,
        ty: &ComposedType,
        tags: &BTreeSet<Capability>,
    ) -> Result<(), CapabilityError>;
}

#[derive(Debug, Default)]
struct Table {
    declared: FxHashMap<TypeHash, BTreeSet<Capability>>,
    sealed: FxHashSet<TypeHash>,
    declarations: usize,
}

/// In-memory capability registry.
///
/// A table can be restricted to a set of known tags, and individual types can
/// be sealed; declarations for unknown tags or sealed types are rejected.
#[derive(Debug, Default)]
pub struct CapabilityTable {
    known: Option<BTreeSet<Capability>>,
    inner: RwLock<Table>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept the given tags.
    pub fn with_known<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Capability>,
    {
        self.known = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Reject further declarations for the type named `type_name`.
    pub fn seal(&self, type_name: &str) {
        self.write(|table| {
            table.sealed.insert(TypeHash::from_name(type_name));
        });
    }

    /// Tags declared for the type named `type_name`.
    pub fn declared_for(&self, type_name: &str) -> BTreeSet<Capability> {
        self.read(|table| {
            table
                .declared
                .get(&TypeHash::from_name(type_name))
                .cloned()
                .unwrap_or_default()
        })
    }

    /// Number of accepted declaration calls.
    pub fn declaration_count(&self) -> usize {
        self.read(|table| table.declarations)
    }

    fn read<R>(&self, f: impl FnOnce(&Table) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Table) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl CapabilityRegistry for CapabilityTable {
    fn query_capabilities(&self, ty: &ComposedType) -> BTreeSet<Capability> {
        let mut tags = ty.capabilities().clone();
        tags.extend(self.read(|table| {
            table
                .declared
                .get(&ty.type_hash())
                .cloned()
                .unwrap_or_default()
        }));
        tags
    }

    fn declare_capabilities(
        &self,
        ty: &ComposedType,
        tags: &BTreeSet<Capability>,
    ) -> Result<(), CapabilityError> {
        if let Some(known) = &self.known
            && let Some(unknown) = tags.iter().find(|tag| !known.contains(*tag))
        {
            return Err(CapabilityError::new(
                ty.name(),
                format!("unknown capability '{}'", unknown),
            ));
        }

        self.write(|table| {
            if table.sealed.contains(&ty.type_hash()) {
                return Err(CapabilityError::new(ty.name(), "type is sealed"));
            }
            table
                .declared
                .entry(ty.type_hash())
                .or_default()
                .extend(tags.iter().cloned());
            table.declarations += 1;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> BTreeSet<Capability> {
        names.iter().map(|n| Capability::new(n)).collect()
    }

    #[test]
    fn declarations_accumulate() {
        let table = CapabilityTable::new();
        let ty = ComposedType::empty("Widget");

        table.declare_capabilities(&ty, &tags(&["a"])).unwrap();
        table.declare_capabilities(&ty, &tags(&["b"])).unwrap();

        assert_eq!(table.declared_for("Widget"), tags(&["a", "b"]));
        assert_eq!(table.declaration_count(), 2);
        assert!(table.declared_for("Other").is_empty());
    }

    #[test]
    fn query_includes_type_capabilities() {
        let table = CapabilityTable::new();
        let ty = ComposedType::empty("Widget").with_capabilities(tags(&["own"]));
        table.declare_capabilities(&ty, &tags(&["granted"])).unwrap();
        assert_eq!(table.query_capabilities(&ty), tags(&["granted", "own"]));
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let table = CapabilityTable::new().with_known(["a"]);
        let ty = ComposedType::empty("Widget");
        let err = table.declare_capabilities(&ty, &tags(&["a", "z"])).unwrap_err();
        assert_eq!(err.type_name, "Widget");
        assert!(err.reason.contains("'z'"));
        assert_eq!(table.declaration_count(), 0);
    }

    #[test]
    fn sealed_types_are_rejected() {
        let table = CapabilityTable::new();
        table.seal("Widget");
        let err = table
            .declare_capabilities(&ComposedType::empty("Widget"), &tags(&["a"]))
            .unwrap_err();
        assert_eq!(err.reason, "type is sealed");
    }
}
