//! Behavior declarations for pipework.
//!
//! - [`Behavior`] / [`BehaviorBuilder`]: the declaration surface and the
//!   ordered instruction list each behavior contributes
//! - [`BehaviorRegistry`]: a catalog for resolving behaviors by name
//! - [`CapabilityRegistry`]: the collaborator told about capability grants,
//!   with [`CapabilityTable`] as an in-memory implementation

pub mod behavior;
pub mod capability;
pub mod registry;

pub use behavior::{Behavior, BehaviorBuilder, instructions_of};
pub use capability::{CapabilityRegistry, CapabilityTable};
pub use registry::BehaviorRegistry;
