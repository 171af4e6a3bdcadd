//! Core model for pipework compositions.
//!
//! This crate defines everything the registry and composer exchange:
//!
//! - [`value`]: plain data values
//! - [`member`]: methods, chain layers, continuations and properties
//! - [`instruction`]: instructions, their kinds and stages
//! - [`text`]: doc splicing with the continuation marker
//! - [`composed`]: the materialized [`ComposedType`] and its report
//! - [`instance`]: receivers handed to installed members
//! - [`hash`]: deterministic identities for behaviors and types
//! - [`error`]: composition, collaborator and invocation errors

pub mod composed;
pub mod error;
pub mod hash;
pub mod instance;
pub mod instruction;
pub mod member;
pub mod text;
pub mod value;

pub use composed::{ComposedType, CompositionReport};
pub use error::{
    CallError, CapabilityError, Collision, CompositionError, Contender, RegistrationError, Result,
};
pub use hash::{BehaviorId, NameHash, TypeHash};
pub use instance::Instance;
pub use instruction::{
    Action, CAPABILITIES_SLOT, Capability, CapabilityGrant, CapabilitySet, DOC_SLOT, Instruction,
    InstructionKind, Origin, Stage,
};
pub use member::{
    Accessor, AccessorSet, CallResult, ChainPayload, ChainedProperty, Layer, Member, Method, Next,
    Property,
};
pub use text::{CONTINUATION_MARKER, splice};
pub use value::Value;
