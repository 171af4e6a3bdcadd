//! Composer - the two-stage composition orchestrator.
//!
//! ## Passes
//!
//! 1. **Collect & merge**: every instruction of every behavior, in pipeline
//!    order, is merged into a per-name map for its stage. An instruction
//!    equal to one already seen is skipped.
//! 2. **Stage 1**: the merged default/override/finalize instructions are
//!    checked against a snapshot of the target's own and inherited names.
//!    The whole plan is validated before any member is written.
//! 3. **Stage 2**: with stage-1 members in place, each merged chain is closed
//!    over its endpoint and installed.
//! 4. **Finish**: the type is built, capability grants are declared to the
//!    capability registry and the hooks run.
//!
//! Nothing is returned unless every pass succeeds.
//!
//! ## Example
//!
//! ```
//! use pipework_composer::{Composer, TargetSkeleton};
//! use pipework_core::{Layer, Method, Value};
//! use pipework_registry::Behavior;
//!
//! let loud = Behavior::builder("Loud")
//!     .chain("greet", Layer::new(|next, this, args| {
//!         let inner = next.call(this, args)?;
//!         Ok(Value::from(inner.as_str().unwrap_or_default().to_uppercase()))
//!     }))
//!     .build();
//!
//! let target = TargetSkeleton::new("Greeter")
//!     .with_member("greet", Method::new(|_, _| Ok(Value::from("hi"))))
//!     .with_behavior(&loud);
//!
//! let ty = Composer::new().compose(target).unwrap();
//! let mut obj = pipework_core::Instance::new(ty);
//! assert_eq!(obj.call("greet", &[]).unwrap(), Value::from("HI"));
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use pipework_core::{
    Action, CapabilityGrant, ComposedType, CompositionError, CompositionReport, Contender,
    DOC_SLOT, Instruction, Member, Result, Stage,
};
use pipework_registry::{Behavior, CapabilityRegistry};

use crate::hooks::CompositionHook;
use crate::merge::merge;
use crate::pipeline::build_chain;
use crate::skeleton::{MemberSnapshot, TargetSkeleton};

/// Runtime options for a [`Composer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Keep the processed instruction history in the report.
    pub record_history: bool,
    /// Merge behavior doc text into the composed type's doc.
    pub merge_behavior_docs: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            record_history: true,
            merge_behavior_docs: true,
        }
    }
}

impl ComposeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record_history(mut self, enabled: bool) -> Self {
        self.record_history = enabled;
        self
    }

    pub fn with_merge_behavior_docs(mut self, enabled: bool) -> Self {
        self.merge_behavior_docs = enabled;
        self
    }
}

// ============================================================================
// Stacks
// ============================================================================

/// Merge state of one composition run.
#[derive(Debug, Default)]
struct Stacks {
    history: Vec<Instruction>,
    stage1: IndexMap<String, Instruction>,
    stage2: IndexMap<String, Instruction>,
}

impl Stacks {
    fn push(&mut self, instruction: &Instruction) -> Result<()> {
        if self.history.contains(instruction) {
            debug!(instruction = %instruction, "duplicate instruction ignored");
        } else {
            let stage = match instruction.stage() {
                Stage::One => &mut self.stage1,
                Stage::Two => &mut self.stage2,
            };
            let merged = match stage.get(instruction.name()) {
                Some(previous) => merge(previous, instruction)?,
                None => instruction.clone(),
            };
            stage.insert(instruction.name().to_string(), merged);
        }
        self.history.push(instruction.clone());
        Ok(())
    }

    fn into_report(self, record_history: bool) -> CompositionReport {
        CompositionReport {
            history: if record_history { self.history } else { Vec::new() },
            stage1: self.stage1,
            stage2: self.stage2,
        }
    }
}

// ============================================================================
// Composer
// ============================================================================

/// Composes [`TargetSkeleton`]s into [`ComposedType`]s.
///
/// A composer holds configuration only; every call to
/// [`compose`](Self::compose) owns its own merge state.
#[derive(Clone, Default)]
pub struct Composer {
    options: ComposeOptions,
    capabilities: Option<Arc<dyn CapabilityRegistry>>,
    hooks: Vec<CompositionHook>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    // === Builder Methods ===

    pub fn with_options(mut self, options: ComposeOptions) -> Self {
        self.options = options;
        self
    }

    /// Declare capability grants to `registry`.
    pub fn with_capability_registry(mut self, registry: Arc<dyn CapabilityRegistry>) -> Self {
        self.capabilities = Some(registry);
        self
    }

    /// Run `hook` after every composition.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arc<ComposedType>, &str, &[Arc<ComposedType>], &IndexMap<String, Member>)
            + Send
            + Sync
            + 'static,
    {
        self.hooks.push(CompositionHook::new(hook));
        self
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    // === Composition ===

    /// Compose `skeleton` with its behavior pipeline.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compose(&self, skeleton: TargetSkeleton) -> Result<Arc<ComposedType>> {
        debug!(
            target_type = skeleton.name(),
            behaviors = skeleton.pipeline().len(),
            "composing type"
        );

        let snapshot = skeleton.snapshot();
        let stacks = self.collect(skeleton.pipeline())?;
        let plan = plan_stage1(skeleton.name(), &stacks.stage1, &snapshot)?;

        let behaviors: Vec<Arc<str>> =
            skeleton.pipeline().iter().map(|b| Arc::from(b.name())).collect();
        let mut capabilities: BTreeSet<_> = skeleton.capabilities().clone();
        for base in skeleton.bases() {
            capabilities.extend(base.capabilities().iter().cloned());
        }

        let (name, mut members, bases) = skeleton.into_parts();
        for (member_name, member) in plan {
            trace!(name = %member_name, "stage1 install");
            members.insert(member_name, member);
        }

        let grants = install_stage2(&name, &mut members, &bases, &stacks.stage2)?;
        for grant in &grants {
            capabilities.extend(grant.tags.iter().cloned());
        }

        let ty = ComposedType::new(&name, bases, members)
            .with_capabilities(capabilities)
            .with_behaviors(behaviors)
            .with_report(stacks.into_report(self.options.record_history));

        self.declare_capabilities(&ty, &grants)?;

        let ty = Arc::new(ty);
        for hook in &self.hooks {
            hook.call(&ty);
        }

        debug!(
            target_type = %name,
            members = ty.members().len(),
            capabilities = ty.capabilities().len(),
            "composed type"
        );
        Ok(ty)
    }

    /// Collect and merge the instructions of `pipeline`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn collect(&self, pipeline: &[Arc<Behavior>]) -> Result<Stacks> {
        let mut stacks = Stacks::default();
        for behavior in pipeline {
            trace!(behavior = behavior.name(), "collecting behavior");
            for instruction in behavior.instructions() {
                if !self.options.merge_behavior_docs && instruction.name() == DOC_SLOT {
                    continue;
                }
                stacks.push(instruction)?;
            }
        }
        Ok(stacks)
    }

    fn declare_capabilities(&self, ty: &ComposedType, grants: &[CapabilityGrant]) -> Result<()> {
        let Some(registry) = &self.capabilities else {
            return Ok(());
        };
        for grant in grants.iter().filter(|g| !g.tags.is_empty()) {
            debug!(
                target_type = ty.name(),
                origin = grant.origin.as_ref().map(|o| o.name.as_ref()),
                tags = grant.tags.len(),
                "declaring capabilities"
            );
            registry.declare_capabilities(ty, &grant.tags)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("options", &self.options)
            .field("capability_registry", &self.capabilities.is_some())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

// ============================================================================
// Stage 1
// ============================================================================

/// Decide which stage-1 members to install, failing before any is written.
#[cfg_attr(feature = "profiling", profiling::function)]
fn plan_stage1(
    type_name: &str,
    stage1: &IndexMap<String, Instruction>,
    snapshot: &MemberSnapshot,
) -> Result<Vec<(String, Member)>> {
    let mut plan = Vec::with_capacity(stage1.len());
    for (name, instruction) in stage1 {
        let install = match instruction.action() {
            Action::Default(member) => (!snapshot.is_defined(name)).then_some(member),
            Action::Override(member) => (!snapshot.is_own(name)).then_some(member),
            Action::Finalize(member) => {
                if snapshot.is_own(name) {
                    return Err(CompositionError::collision(
                        Contender::Target {
                            type_name: type_name.to_string(),
                            member: name.clone(),
                        },
                        instruction.clone(),
                    ));
                }
                Some(member)
            }
            // Only stage-1 kinds are collected into this map.
            Action::Chain(_) | Action::ChainIfExists(_) | Action::Capabilities(_) => None,
        };
        match install {
            Some(member) => plan.push((name.clone(), member.clone())),
            None => trace!(name = %name, kind = %instruction.kind(), "stage1 skipped"),
        }
    }
    Ok(plan)
}

// ============================================================================
// Stage 2
// ============================================================================

/// Install every merged chain. Returns the capability grants to declare.
#[cfg_attr(feature = "profiling", profiling::function)]
fn install_stage2(
    type_name: &str,
    members: &mut IndexMap<String, Member>,
    bases: &[Arc<ComposedType>],
    stage2: &IndexMap<String, Instruction>,
) -> Result<Vec<CapabilityGrant>> {
    let mut grants = Vec::new();
    for (name, instruction) in stage2 {
        if let Action::Capabilities(set) = instruction.action() {
            grants.extend(set.grants().iter().cloned());
            continue;
        }

        let endpoint = endpoint(name, members, bases).cloned();
        match build_chain(type_name, instruction, endpoint.as_ref())? {
            Some(member) => {
                debug!(name = %name, kind = member.kind_name(), "stage2 install");
                members.insert(name.clone(), member);
            }
            None => debug!(name = %name, "optional chain has no endpoint, skipped"),
        }
    }
    Ok(grants)
}

/// Endpoint for a chain: own members (stage 1 included), then the bases.
fn endpoint<'a>(
    name: &str,
    members: &'a IndexMap<String, Member>,
    bases: &'a [Arc<ComposedType>],
) -> Option<&'a Member> {
    if let Some(member) = members.get(name) {
        return Some(member);
    }
    if name == DOC_SLOT {
        return None;
    }
    bases.iter().find_map(|base| base.lookup(name))
}
