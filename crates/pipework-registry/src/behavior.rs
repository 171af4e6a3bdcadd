//! Behaviors and the instruction lists they contribute.
//!
//! A [`Behavior`] is a named, immutable bundle of [`Instruction`]s. It is
//! declared with a [`BehaviorBuilder`]:
//!
//! ```
//! use pipework_core::{Layer, Value};
//! use pipework_registry::Behavior;
//!
//! let loud = Behavior::builder("Loud")
//!     .doc("Shouts every greeting.")
//!     .default("volume", 11)
//!     .chain("greet", Layer::new(|next, this, args| {
//!         let inner = next.call(this, args)?;
//!         Ok(Value::from(inner.as_str().unwrap_or_default().to_uppercase()))
//!     }))
//!     .build();
//!
//! assert_eq!(loud.instructions().len(), 3);
//! ```
//!
//! # Instruction Collection
//!
//! The instruction list of a behavior is fixed when it is built:
//!
//! 1. its doc text, as a text chain on the doc slot
//! 2. its capability tags, as one capability instruction
//! 3. its declared instructions, in declaration order
//! 4. for every parent, in `extends` order, the parent's full list minus
//!    instructions already collected and minus anything named like one of
//!    the stage-1 instructions collected before that parent
//!
//! Every instruction in the list carries the origin of the behavior that
//! declared it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use pipework_core::{
    BehaviorId, Capability, CapabilitySet, ChainPayload, Instruction, Member, Origin, Stage,
};

/// A named bundle of composition instructions.
#[derive(Clone)]
pub struct Behavior {
    origin: Origin,
    doc: Option<String>,
    capabilities: BTreeSet<Capability>,
    parents: Vec<Arc<Behavior>>,
    declared: Vec<Instruction>,
    instructions: Vec<Instruction>,
}

impl Behavior {
    /// Start declaring a behavior.
    pub fn builder(name: impl AsRef<str>) -> BehaviorBuilder {
        BehaviorBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.origin.name
    }

    pub fn id(&self) -> BehaviorId {
        self.origin.id
    }

    /// Origin stamped on instructions declared by this behavior.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Capability tags declared directly on this behavior.
    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    /// Behaviors this one extends, in declaration order.
    pub fn parents(&self) -> &[Arc<Behavior>] {
        &self.parents
    }

    /// Instructions declared on this behavior itself.
    pub fn declared(&self) -> &[Instruction] {
        &self.declared
    }

    /// The full ordered instruction list, inherited instructions included.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Check whether this behavior is `name` or extends it, directly or not.
    pub fn is_a(&self, name: &str) -> bool {
        self.name() == name || self.parents.iter().any(|p| p.is_a(name))
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("name", &self.name())
            .field("parents", &self.parents.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("declared", &self.declared.len())
            .field("instructions", &self.instructions.len())
            .finish()
    }
}

impl PartialEq for Behavior {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Declaration surface for a [`Behavior`].
///
/// Declaring the same name twice replaces the earlier declaration in place.
#[derive(Debug, Clone)]
pub struct BehaviorBuilder {
    origin: Origin,
    doc: Option<String>,
    capabilities: BTreeSet<Capability>,
    parents: Vec<Arc<Behavior>>,
    declared: Vec<Instruction>,
}

impl BehaviorBuilder {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            origin: Origin::new(name),
            doc: None,
            capabilities: BTreeSet::new(),
            parents: Vec::new(),
            declared: Vec::new(),
        }
    }

    /// Declare an arbitrary instruction.
    ///
    /// Replaces an earlier declaration for the same name and stage.
    pub fn instruction(mut self, instruction: Instruction) -> Self {
        let instruction = instruction.with_origin(self.origin.clone());
        match self
            .declared
            .iter_mut()
            .find(|existing| {
                existing.name() == instruction.name() && existing.stage() == instruction.stage()
            })
        {
            Some(slot) => *slot = instruction,
            None => self.declared.push(instruction),
        }
        self
    }

    /// Set `name` unless the target or its bases already provide it.
    pub fn default(self, name: impl Into<String>, member: impl Into<Member>) -> Self {
        self.instruction(Instruction::default_value(name, member))
    }

    /// Set `name` unless the target itself declares it.
    pub fn overrides(self, name: impl Into<String>, member: impl Into<Member>) -> Self {
        self.instruction(Instruction::override_value(name, member))
    }

    /// Always set `name`; the target declaring it is a collision.
    pub fn finalize(self, name: impl Into<String>, member: impl Into<Member>) -> Self {
        self.instruction(Instruction::finalize(name, member))
    }

    /// Chain in front of the endpoint for `name`, which must exist.
    pub fn chain(self, name: impl Into<String>, payload: impl Into<ChainPayload>) -> Self {
        self.instruction(Instruction::chain(name, payload))
    }

    /// Chain in front of the endpoint for `name`, if there is one.
    pub fn chain_if_exists(
        self,
        name: impl Into<String>,
        payload: impl Into<ChainPayload>,
    ) -> Self {
        self.instruction(Instruction::chain_if_exists(name, payload))
    }

    /// Describe the behavior. The text is merged into the composed type's doc.
    pub fn doc(mut self, text: impl Into<String>) -> Self {
        self.doc = Some(text.into());
        self
    }

    /// Grant capability tags to every type composed with this behavior.
    pub fn capabilities<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Capability>,
    {
        self.capabilities.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Inherit the instructions of `parent`.
    pub fn extends(mut self, parent: &Arc<Behavior>) -> Self {
        self.parents.push(Arc::clone(parent));
        self
    }

    /// Finish the declaration and collect the instruction list.
    pub fn build(self) -> Arc<Behavior> {
        let instructions = collect(
            &self.origin,
            self.doc.as_deref(),
            &self.capabilities,
            &self.declared,
            &self.parents,
        );
        tracing::trace!(
            behavior = %self.origin,
            declared = self.declared.len(),
            collected = instructions.len(),
            "behavior built"
        );
        Arc::new(Behavior {
            origin: self.origin,
            doc: self.doc,
            capabilities: self.capabilities,
            parents: self.parents,
            declared: self.declared,
            instructions,
        })
    }
}

// ============================================================================
// Collection
// ============================================================================

/// Collect the ordered instruction list of `behavior` from its declaration.
///
/// This recomputes what [`Behavior::instructions`] caches.
pub fn instructions_of(behavior: &Behavior) -> Vec<Instruction> {
    collect(
        &behavior.origin,
        behavior.doc(),
        &behavior.capabilities,
        &behavior.declared,
        &behavior.parents,
    )
}

fn collect(
    origin: &Origin,
    doc: Option<&str>,
    capabilities: &BTreeSet<Capability>,
    declared: &[Instruction],
    parents: &[Arc<Behavior>],
) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(declared.len() + 2);

    if let Some(doc) = doc {
        out.push(Instruction::doc(doc).with_origin(origin.clone()));
    }
    if !capabilities.is_empty() {
        let set = CapabilitySet::new(capabilities.iter().cloned());
        out.push(Instruction::capabilities(set).with_origin(origin.clone()));
    }
    out.extend(declared.iter().cloned());

    // Stage-1 names shadow every instruction for that slot from later
    // parents. A parent's own list is kept whole.
    let mut shadowed: FxHashSet<String> = out
        .iter()
        .filter(|i| i.stage() == Stage::One)
        .map(|i| i.name().to_string())
        .collect();

    for parent in parents {
        let mut adopted = Vec::new();
        for instruction in parent.instructions() {
            if shadowed.contains(instruction.name()) || out.contains(instruction) {
                continue;
            }
            if instruction.stage() == Stage::One {
                adopted.push(instruction.name().to_string());
            }
            out.push(instruction.clone());
        }
        shadowed.extend(adopted);
    }

    out
}
