//! Pipework: compose types from ordered behaviors.
//!
//! A behavior is a named bundle of instructions for attributes of a target
//! type. Composing a target runs two stages:
//!
//! - **Stage 1** installs plain attributes (`default`, `override`,
//!   `finalize`), resolving conflicts between behaviors with a fixed
//!   precedence.
//! - **Stage 2** installs delegation chains (`chain`, `chain_if_exists`) in
//!   front of the target's own or inherited methods and properties. Each
//!   layer receives a continuation to the rest of the chain.
//!
//! # Example
//!
//! ```
//! use pipework::prelude::*;
//!
//! let loud = Behavior::builder("Loud")
//!     .doc("Shouts.")
//!     .default("volume", 11)
//!     .chain("greet", Layer::new(|next, this, args| {
//!         let inner = next.call(this, args)?;
//!         Ok(Value::from(inner.as_str().unwrap_or_default().to_uppercase()))
//!     }))
//!     .build();
//!
//! let greeter = compose(
//!     TargetSkeleton::new("Greeter")
//!         .with_doc("Greets people.")
//!         .with_member("greet", Method::new(|_, _| Ok(Value::from("hi"))))
//!         .with_behavior(&loud),
//! )
//! .unwrap();
//!
//! let mut obj = Instance::new(greeter.clone());
//! assert_eq!(obj.call("greet", &[]).unwrap(), Value::from("HI"));
//! assert_eq!(obj.get("volume").unwrap(), Value::from(11));
//! assert_eq!(greeter.doc(), Some("Greets people.\n\nShouts."));
//! ```
//!
//! # Crates
//!
//! - [`pipework_core`]: values, members, instructions, composed types, errors
//! - [`pipework_registry`]: behaviors, the behavior catalog, capabilities
//! - [`pipework_composer`]: merging, pipelines and the orchestrator

use std::sync::Arc;

pub use pipework_composer::{
    ComposeOptions, Composer, CompositionHook, MemberSnapshot, TargetSkeleton, build_chain, merge,
};
pub use pipework_core::{
    Accessor, AccessorSet, Action, BehaviorId, CAPABILITIES_SLOT, CallError, CallResult,
    Capability, CapabilityError, CapabilityGrant, CapabilitySet, ChainPayload, ChainedProperty,
    Collision, ComposedType, CompositionError, CompositionReport, Contender, DOC_SLOT, Instance,
    Instruction, InstructionKind, Layer, Member, Method, NameHash, Next, Origin, Property,
    RegistrationError, Result, Stage, TypeHash, Value,
};
pub use pipework_registry::{
    Behavior, BehaviorBuilder, BehaviorRegistry, CapabilityRegistry, CapabilityTable,
    instructions_of,
};

/// Compose `skeleton` with a default [`Composer`].
pub fn compose(skeleton: TargetSkeleton) -> Result<Arc<ComposedType>> {
    Composer::new().compose(skeleton)
}

/// Compose a target whose pipeline is given by registered behavior names.
pub fn compose_named<I, S>(
    registry: &BehaviorRegistry,
    skeleton: TargetSkeleton,
    behaviors: I,
) -> Result<Arc<ComposedType>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pipeline = registry.resolve_pipeline(behaviors)?;
    compose(skeleton.with_behaviors(&pipeline))
}

pub mod prelude {
    pub use crate::{compose, compose_named};
    pub use pipework_composer::{ComposeOptions, Composer, TargetSkeleton};
    pub use pipework_core::{
        CallError, CallResult, ChainedProperty, ComposedType, CompositionError, Instance, Layer,
        Member, Method, Next, Property, Value,
    };
    pub use pipework_registry::{Behavior, BehaviorRegistry, CapabilityTable};
}
