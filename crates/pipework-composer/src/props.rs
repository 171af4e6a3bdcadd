//! Property tests for the merge algebra.

use proptest::prelude::*;

use pipework_core::{Action, Instruction, InstructionKind, Layer, Member, Origin};

use crate::merge::merge;

fn rank(kind: InstructionKind) -> u8 {
    match kind {
        InstructionKind::Default => 0,
        InstructionKind::Override => 1,
        InstructionKind::Finalize => 2,
        _ => u8::MAX,
    }
}

fn arb_stage1() -> impl Strategy<Value = Instruction> {
    (0u8..3, 0i64..3, "B[0-9]").prop_map(|(kind, payload, origin)| {
        let action = match kind {
            0 => Action::Default(Member::from(payload)),
            1 => Action::Override(Member::from(payload)),
            _ => Action::Finalize(Member::from(payload)),
        };
        Instruction::new("attr", action).with_origin(Origin::new(origin))
    })
}

fn arb_instruction() -> impl Strategy<Value = Instruction> {
    let layer = Layer::new(|next, this, args| next.call(this, args));
    prop_oneof![
        arb_stage1(),
        "[a-z ]{0,12}".prop_map(|text| Instruction::chain("attr", text)),
        Just(Instruction::chain_if_exists("attr", layer)),
    ]
}

proptest! {
    /// Merging an instruction with itself yields the instruction.
    #[test]
    fn prop_merge_idempotent(instr in arb_instruction()) {
        let merged = merge(&instr, &instr).unwrap();
        prop_assert_eq!(merged, instr);
    }

    /// finalize > override > default, whatever the order.
    #[test]
    fn prop_stage1_precedence(left in arb_stage1(), right in arb_stage1()) {
        let finalize_clash = left.kind() == InstructionKind::Finalize
            && right.kind() == InstructionKind::Finalize
            && left != right;

        match merge(&left, &right) {
            Ok(merged) => {
                prop_assert!(!finalize_clash);
                prop_assert_eq!(rank(merged.kind()), rank(left.kind()).max(rank(right.kind())));
                if left.kind() == right.kind() {
                    prop_assert_eq!(merged.action(), left.action());
                }
            }
            Err(err) => {
                prop_assert!(finalize_clash);
                prop_assert!(err.is_collision());
            }
        }
    }

    /// The merged kind does not depend on the order of the operands.
    #[test]
    fn prop_stage1_kind_commutes(left in arb_stage1(), right in arb_stage1()) {
        if let (Ok(a), Ok(b)) = (merge(&left, &right), merge(&right, &left)) {
            prop_assert_eq!(a.kind(), b.kind());
        }
    }
}
