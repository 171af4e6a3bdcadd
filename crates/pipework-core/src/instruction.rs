//! Instructions: one rule, for one attribute name, from one behavior.
//!
//! An [`Instruction`] pairs an attribute name with an [`Action`] and records
//! which behavior declared it ([`Origin`]). The action's kind determines the
//! installation [`Stage`]:
//!
//! | Kind | Stage | Payload |
//! |------|-------|---------|
//! | `default` | 1 | [`Member`] |
//! | `override` | 1 | [`Member`] |
//! | `finalize` | 1 | [`Member`] |
//! | `chain` | 2 | [`ChainPayload`] |
//! | `chain_if_exists` | 2 | [`ChainPayload`] |
//! | `capabilities` | 2 | [`CapabilitySet`] |
//!
//! Two instructions are equal when they carry the same kind, name and
//! payload. The origin is not part of equality, which lets the composer drop
//! an instruction reached a second time through another inheritance path.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::hash::BehaviorId;
use crate::member::{ChainPayload, Member};

/// Reserved attribute holding documentation text.
pub const DOC_SLOT: &str = "__doc__";

/// Reserved attribute carrying capability grants.
pub const CAPABILITIES_SLOT: &str = "__capabilities__";

// ============================================================================
// Stage and Kind
// ============================================================================

/// Installation stage of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Plain data attributes, installed before endpoint resolution.
    One,
    /// Delegation chains, installed once own and inherited members are fixed.
    Two,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::One => write!(f, "stage1"),
            Stage::Two => write!(f, "stage2"),
        }
    }
}

/// Fieldless mirror of [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    Default,
    Override,
    Finalize,
    Chain,
    ChainIfExists,
    Capabilities,
}

impl InstructionKind {
    pub fn stage(self) -> Stage {
        match self {
            InstructionKind::Default | InstructionKind::Override | InstructionKind::Finalize => {
                Stage::One
            }
            InstructionKind::Chain
            | InstructionKind::ChainIfExists
            | InstructionKind::Capabilities => Stage::Two,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InstructionKind::Default => "default",
            InstructionKind::Override => "override",
            InstructionKind::Finalize => "finalize",
            InstructionKind::Chain => "chain",
            InstructionKind::ChainIfExists => "chain_if_exists",
            InstructionKind::Capabilities => "capabilities",
        }
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// A capability tag, propagated onto composed types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capability(Arc<str>);

impl Capability {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Capability(Arc::from(tag.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Capability {
    fn from(tag: &str) -> Self {
        Capability::new(tag)
    }
}

/// Tags granted by one behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityGrant {
    pub origin: Option<Origin>,
    pub tags: BTreeSet<Capability>,
}

/// Capability grants, in the order the behaviors declared them.
///
/// Equality compares the union of all tags, so the same tags granted along
/// two paths count as one instruction.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    grants: Vec<CapabilityGrant>,
}

impl CapabilitySet {
    /// A set holding a single grant.
    pub fn new<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Capability>,
    {
        Self {
            grants: vec![CapabilityGrant {
                origin: None,
                tags: tags.into_iter().map(Into::into).collect(),
            }],
        }
    }

    pub fn grants(&self) -> &[CapabilityGrant] {
        &self.grants
    }

    /// Union of all granted tags.
    pub fn tags(&self) -> BTreeSet<Capability> {
        self.grants.iter().flat_map(|g| g.tags.iter().cloned()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.iter().all(|g| g.tags.is_empty())
    }

    /// Concatenate the grants of a later set.
    pub fn merge(&self, later: &CapabilitySet) -> CapabilitySet {
        let mut grants = self.grants.clone();
        grants.extend(later.grants.iter().cloned());
        CapabilitySet { grants }
    }

    fn stamp(&mut self, origin: &Origin) {
        for grant in &mut self.grants {
            if grant.origin.is_none() {
                grant.origin = Some(origin.clone());
            }
        }
    }
}

impl PartialEq for CapabilitySet {
    fn eq(&self, other: &Self) -> bool {
        self.tags() == other.tags()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<_> = self.tags().iter().map(|t| t.to_string()).collect();
        write!(f, "({})", tags.join(", "))
    }
}

// ============================================================================
// Instruction
// ============================================================================

/// The behavior an instruction was declared on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub id: BehaviorId,
    pub name: Arc<str>,
}

impl Origin {
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        Self {
            id: BehaviorId::from_name(name),
            name: Arc::from(name),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// What an instruction does with its attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Set if neither the target nor its bases provide the name.
    Default(Member),
    /// Set unless the target itself declares the name.
    Override(Member),
    /// Always set; the target declaring the name is a collision.
    Finalize(Member),
    /// Chain in front of the endpoint; a missing endpoint is an error.
    Chain(ChainPayload),
    /// Chain in front of the endpoint, if there is one.
    ChainIfExists(ChainPayload),
    /// Capabilities handed to the capability registry.
    Capabilities(CapabilitySet),
}

impl Action {
    pub fn kind(&self) -> InstructionKind {
        match self {
            Action::Default(_) => InstructionKind::Default,
            Action::Override(_) => InstructionKind::Override,
            Action::Finalize(_) => InstructionKind::Finalize,
            Action::Chain(_) => InstructionKind::Chain,
            Action::ChainIfExists(_) => InstructionKind::ChainIfExists,
            Action::Capabilities(_) => InstructionKind::Capabilities,
        }
    }

    /// The data payload of a stage-1 action.
    pub fn member(&self) -> Option<&Member> {
        match self {
            Action::Default(m) | Action::Override(m) | Action::Finalize(m) => Some(m),
            _ => None,
        }
    }

    /// The payload of a chain action.
    pub fn chain(&self) -> Option<&ChainPayload> {
        match self {
            Action::Chain(p) | Action::ChainIfExists(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Default(m) | Action::Override(m) | Action::Finalize(m) => write!(f, "{}", m),
            Action::Chain(p) | Action::ChainIfExists(p) => write!(f, "{}", p),
            Action::Capabilities(c) => write!(f, "{}", c),
        }
    }
}

/// One rule for one named attribute.
#[derive(Debug, Clone)]
pub struct Instruction {
    name: String,
    origin: Option<Origin>,
    action: Action,
}

impl Instruction {
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            origin: None,
            action,
        }
    }

    pub fn default_value(name: impl Into<String>, member: impl Into<Member>) -> Self {
        Self::new(name, Action::Default(member.into()))
    }

    pub fn override_value(name: impl Into<String>, member: impl Into<Member>) -> Self {
        Self::new(name, Action::Override(member.into()))
    }

    pub fn finalize(name: impl Into<String>, member: impl Into<Member>) -> Self {
        Self::new(name, Action::Finalize(member.into()))
    }

    pub fn chain(name: impl Into<String>, payload: impl Into<ChainPayload>) -> Self {
        Self::new(name, Action::Chain(payload.into()))
    }

    pub fn chain_if_exists(name: impl Into<String>, payload: impl Into<ChainPayload>) -> Self {
        Self::new(name, Action::ChainIfExists(payload.into()))
    }

    /// A doc chain on the reserved [`DOC_SLOT`].
    pub fn doc(text: impl Into<String>) -> Self {
        Self::new(DOC_SLOT, Action::Chain(ChainPayload::Text(text.into())))
    }

    /// A capability grant on the reserved [`CAPABILITIES_SLOT`].
    pub fn capabilities(set: CapabilitySet) -> Self {
        Self::new(CAPABILITIES_SLOT, Action::Capabilities(set))
    }

    /// Stamp the declaring behavior.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        if let Action::Capabilities(set) = &mut self.action {
            set.stamp(&origin);
        }
        self.origin = Some(origin);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn kind(&self) -> InstructionKind {
        self.action.kind()
    }

    pub fn stage(&self) -> Stage {
        self.kind().stage()
    }
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || (self.name == other.name && self.action == other.action)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} '{}' of {} payload={}>",
            self.kind(),
            self.name,
            self.origin.as_ref().map_or("None", |o| o.name.as_ref()),
            self.action
        )
    }
}
