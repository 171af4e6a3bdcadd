//! Composition of behaviors into types.
//!
//! - [`merge`](merge::merge): the two merge algebras
//! - [`build_chain`]: closing merged chains over their endpoints
//! - [`TargetSkeleton`]: what a type declares before composition
//! - [`Composer`]: the orchestrator running both stages

pub mod composer;
pub mod hooks;
pub mod merge;
pub mod pipeline;
pub mod skeleton;

#[cfg(test)]
mod props;

pub use composer::{ComposeOptions, Composer};
pub use hooks::CompositionHook;
pub use merge::merge;
pub use pipeline::build_chain;
pub use skeleton::{MemberSnapshot, TargetSkeleton};
