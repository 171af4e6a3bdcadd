//! Merge engine: combine two instructions for the same name.
//!
//! `left` is what has accumulated so far, `right` the instruction met next
//! in pipeline order. Equal instructions always collapse to `left`.
//!
//! ## Stage 1
//!
//! | left \ right | default | override | finalize |
//! |--------------|---------|----------|----------|
//! | default      | left    | right    | right    |
//! | override     | left    | left     | right    |
//! | finalize     | left    | left     | collision unless equal |
//!
//! ## Stage 2
//!
//! Chains merge with chains when their payloads are compatible (text with
//! text, method with method, property with property). The merged chain runs
//! `left`'s layer first and stays optional only if both sides were optional.
//! Capability sets merge with capability sets by concatenating their grants.
//!
//! Every other pairing is a collision.

use pipework_core::{Action, CompositionError, Instruction, InstructionKind, Result};

/// Merge `right` into the accumulated instruction `left`.
pub fn merge(left: &Instruction, right: &Instruction) -> Result<Instruction> {
    if left == right {
        return Ok(left.clone());
    }

    let collision = || CompositionError::collision(left.clone(), right.clone());

    use InstructionKind as K;
    let merged = match (left.kind(), right.kind()) {
        // === Stage 1 ===
        (K::Default, K::Default) => left.clone(),
        (K::Default, K::Override | K::Finalize) => right.clone(),
        (K::Override, K::Default | K::Override) => left.clone(),
        (K::Override, K::Finalize) => right.clone(),
        (K::Finalize, K::Default | K::Override) => left.clone(),

        // === Stage 2 ===
        (K::Chain | K::ChainIfExists, K::Chain | K::ChainIfExists) => {
            let (Some(outer), Some(inner)) = (left.action().chain(), right.action().chain())
            else {
                return Err(collision());
            };
            let payload = outer.merge(inner).ok_or_else(collision)?;
            let action = if left.kind() == K::ChainIfExists && right.kind() == K::ChainIfExists {
                Action::ChainIfExists(payload)
            } else {
                Action::Chain(payload)
            };
            keep_origin(left, Instruction::new(left.name(), action))
        }
        (K::Capabilities, K::Capabilities) => match (left.action(), right.action()) {
            (Action::Capabilities(a), Action::Capabilities(b)) => {
                keep_origin(left, Instruction::new(left.name(), Action::Capabilities(a.merge(b))))
            }
            _ => return Err(collision()),
        },

        _ => return Err(collision()),
    };

    tracing::trace!(
        name = left.name(),
        left = %left.kind(),
        right = %right.kind(),
        result = %merged.kind(),
        "merged instructions"
    );
    Ok(merged)
}

fn keep_origin(left: &Instruction, merged: Instruction) -> Instruction {
    match left.origin() {
        Some(origin) => merged.with_origin(origin.clone()),
        None => merged,
    }
}
