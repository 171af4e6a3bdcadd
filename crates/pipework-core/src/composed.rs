//! The materialized result of a composition.
//!
//! A [`ComposedType`] owns its final attribute map: the members the target
//! declared itself, every stage-1 value that was installed and every stage-2
//! chain. Member lookup falls back to the bases, depth-first and left to
//! right; composition works on a flat behavior list, so there is no C3
//! linearization here.
//!
//! The [`CompositionReport`] kept on each type records what the composer did
//! and is meant for tests and tooling.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::hash::TypeHash;
use crate::instruction::{Capability, DOC_SLOT, Instruction};
use crate::member::Member;
use crate::value::Value;

/// Diagnostics recorded by one composition run.
#[derive(Debug, Clone, Default)]
pub struct CompositionReport {
    /// Every instruction processed, in pipeline order, duplicates included.
    pub history: Vec<Instruction>,
    /// Final stage-1 resolution per name.
    pub stage1: IndexMap<String, Instruction>,
    /// Final stage-2 resolution per name.
    pub stage2: IndexMap<String, Instruction>,
}

impl CompositionReport {
    /// Resolved instruction for `name`, stage 1 first.
    pub fn resolution(&self, name: &str) -> Option<&Instruction> {
        self.stage1.get(name).or_else(|| self.stage2.get(name))
    }
}

/// A finished type: plain (no behaviors) or composed.
#[derive(Clone)]
pub struct ComposedType {
    name: Arc<str>,
    hash: TypeHash,
    bases: Vec<Arc<ComposedType>>,
    members: IndexMap<String, Member>,
    capabilities: BTreeSet<Capability>,
    behaviors: Vec<Arc<str>>,
    report: CompositionReport,
}

impl ComposedType {
    /// Create a type from its final member map.
    pub fn new(
        name: impl AsRef<str>,
        bases: Vec<Arc<ComposedType>>,
        members: IndexMap<String, Member>,
    ) -> Self {
        let name = name.as_ref();
        Self {
            name: Arc::from(name),
            hash: TypeHash::from_name(name),
            bases,
            members,
            capabilities: BTreeSet::new(),
            behaviors: Vec::new(),
            report: CompositionReport::default(),
        }
    }

    /// A type with no bases and no members.
    pub fn empty(name: impl AsRef<str>) -> Self {
        Self::new(name, Vec::new(), IndexMap::new())
    }

    // === Builder Methods ===

    pub fn with_capabilities(mut self, capabilities: BTreeSet<Capability>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_behaviors(mut self, behaviors: Vec<Arc<str>>) -> Self {
        self.behaviors = behaviors;
        self
    }

    pub fn with_report(mut self, report: CompositionReport) -> Self {
        self.report = report;
        self
    }

    // === Query Methods ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_hash(&self) -> TypeHash {
        self.hash
    }

    pub fn bases(&self) -> &[Arc<ComposedType>] {
        &self.bases
    }

    /// Names of the behaviors this type was composed from, in pipeline order.
    pub fn behaviors(&self) -> &[Arc<str>] {
        &self.behaviors
    }

    /// Members materialized on this type (not including bases).
    pub fn members(&self) -> &IndexMap<String, Member> {
        &self.members
    }

    /// Member materialized on this type itself.
    pub fn own_member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Resolve a member on this type or its bases.
    ///
    /// The doc slot is never inherited.
    pub fn lookup(&self, name: &str) -> Option<&Member> {
        if let Some(member) = self.members.get(name) {
            return Some(member);
        }
        if name == DOC_SLOT {
            return None;
        }
        self.bases.iter().find_map(|base| base.lookup(name))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Resolve a data value on this type or its bases.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.lookup(name).and_then(Member::as_value)
    }

    /// Documentation of the type itself.
    pub fn doc(&self) -> Option<&str> {
        self.members.get(DOC_SLOT).and_then(Member::as_value).and_then(Value::as_str)
    }

    /// Every member name visible through this type, bases included.
    pub fn visible_names(&self) -> FxHashSet<String> {
        let mut names = FxHashSet::default();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut FxHashSet<String>) {
        names.extend(self.members.keys().cloned());
        for base in &self.bases {
            base.collect_names(names);
        }
    }

    /// Capabilities folded onto this type.
    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    pub fn provides(&self, tag: &str) -> bool {
        self.capabilities.iter().any(|c| c.as_str() == tag)
    }

    /// Diagnostics from the composition that produced this type.
    pub fn report(&self) -> &CompositionReport {
        &self.report
    }
}

impl fmt::Debug for ComposedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedType")
            .field("name", &self.name)
            .field("bases", &self.bases.iter().map(|b| b.name()).collect::<Vec<_>>())
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .field("capabilities", &self.capabilities)
            .field("behaviors", &self.behaviors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Arc<ComposedType> {
        let mut members = IndexMap::new();
        members.insert("K".to_string(), Member::from("Base"));
        members.insert(DOC_SLOT.to_string(), Member::from("Base doc"));
        Arc::new(ComposedType::new("Base", Vec::new(), members))
    }

    #[test]
    fn lookup_falls_back_to_bases() {
        let mut members = IndexMap::new();
        members.insert("L".to_string(), Member::from("Sub"));
        let sub = ComposedType::new("Sub", vec![base()], members);

        assert_eq!(sub.value("K"), Some(&Value::from("Base")));
        assert_eq!(sub.value("L"), Some(&Value::from("Sub")));
        assert!(sub.own_member("K").is_none());
        assert!(!sub.has_attribute("M"));
    }

    #[test]
    fn doc_is_not_inherited() {
        let sub = ComposedType::new("Sub", vec![base()], IndexMap::new());
        assert_eq!(sub.doc(), None);
        assert!(sub.lookup(DOC_SLOT).is_none());
    }

    #[test]
    fn visible_names_include_bases() {
        let sub = ComposedType::new("Sub", vec![base()], IndexMap::new());
        let names = sub.visible_names();
        assert!(names.contains("K"));
        assert!(names.contains(DOC_SLOT));
    }
}
