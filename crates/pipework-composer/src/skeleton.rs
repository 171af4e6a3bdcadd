//! Target descriptions handed to the composer.
//!
//! A [`TargetSkeleton`] is everything the type declares before composition:
//! its name and doc, its own members, its bases, its own capabilities and the
//! ordered behavior pipeline. [`MemberSnapshot`] freezes which names the
//! target and its bases provide before stage 1 runs.

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use pipework_core::{Capability, ComposedType, DOC_SLOT, Member, Value};
use pipework_registry::Behavior;

/// Declaration of a type to compose.
#[derive(Debug, Clone)]
pub struct TargetSkeleton {
    name: String,
    members: IndexMap<String, Member>,
    bases: Vec<Arc<ComposedType>>,
    capabilities: BTreeSet<Capability>,
    pipeline: Vec<Arc<Behavior>>,
}

impl TargetSkeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: IndexMap::new(),
            bases: Vec::new(),
            capabilities: BTreeSet::new(),
            pipeline: Vec::new(),
        }
    }

    // === Builder Methods ===

    /// Set the type's own doc text.
    pub fn with_doc(self, doc: impl Into<String>) -> Self {
        self.with_member(DOC_SLOT, Value::from(doc.into()))
    }

    /// Declare an own member. Redeclaring a name replaces it.
    pub fn with_member(mut self, name: impl Into<String>, member: impl Into<Member>) -> Self {
        self.members.insert(name.into(), member.into());
        self
    }

    pub fn with_base(mut self, base: &Arc<ComposedType>) -> Self {
        self.bases.push(Arc::clone(base));
        self
    }

    /// Capabilities the type declares itself.
    pub fn with_capabilities<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Capability>,
    {
        self.capabilities.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Append a behavior to the pipeline.
    pub fn with_behavior(mut self, behavior: &Arc<Behavior>) -> Self {
        self.pipeline.push(Arc::clone(behavior));
        self
    }

    /// Append behaviors to the pipeline, in order.
    pub fn with_behaviors<'a, I>(mut self, behaviors: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<Behavior>>,
    {
        self.pipeline.extend(behaviors.into_iter().cloned());
        self
    }

    // === Query Methods ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &IndexMap<String, Member> {
        &self.members
    }

    pub fn bases(&self) -> &[Arc<ComposedType>] {
        &self.bases
    }

    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    pub fn pipeline(&self) -> &[Arc<Behavior>] {
        &self.pipeline
    }

    /// Freeze the own and inherited member names.
    pub fn snapshot(&self) -> MemberSnapshot {
        let mut inherited = FxHashSet::default();
        for base in &self.bases {
            inherited.extend(base.visible_names());
        }
        MemberSnapshot {
            own: self.members.keys().cloned().collect(),
            inherited,
        }
    }

    pub(crate) fn into_parts(self) -> (String, IndexMap<String, Member>, Vec<Arc<ComposedType>>) {
        (self.name, self.members, self.bases)
    }
}

/// Names provided by a target before composition.
#[derive(Debug, Clone, Default)]
pub struct MemberSnapshot {
    own: FxHashSet<String>,
    inherited: FxHashSet<String>,
}

impl MemberSnapshot {
    /// Declared by the target itself.
    pub fn is_own(&self, name: &str) -> bool {
        self.own.contains(name)
    }

    /// Provided by one of the bases.
    pub fn is_inherited(&self, name: &str) -> bool {
        self.inherited.contains(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.is_own(name) || self.is_inherited(name)
    }
}
