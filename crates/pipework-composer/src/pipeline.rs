//! Pipeline builder: close a merged chain over its endpoint.
//!
//! The endpoint is whatever the target provides for the chained name once
//! stage 1 is installed (own member first, then the bases). What gets
//! installed depends on the payload:
//!
//! | Payload | Endpoint | Installed |
//! |---------|----------|-----------|
//! | text | string value (or nothing, for the doc slot) | spliced text value |
//! | method layer | method | layer terminated by the method |
//! | property layers | property | property with each accessor closed |
//!
//! A mandatory chain with no endpoint fails with `MissingEndpoint`; an
//! optional one installs nothing. An endpoint of the wrong kind is a
//! collision between the chain and the target.

use pipework_core::{
    AccessorSet, ChainPayload, CompositionError, Contender, DOC_SLOT, Instruction, InstructionKind,
    Member, Result, Value, splice,
};

/// Build the member to install for a merged chain instruction.
///
/// Returns `Ok(None)` when nothing should be installed.
pub fn build_chain(
    type_name: &str,
    instruction: &Instruction,
    endpoint: Option<&Member>,
) -> Result<Option<Member>> {
    let Some(payload) = instruction.action().chain() else {
        return Err(target_collision(type_name, instruction));
    };
    let mandatory = instruction.kind() == InstructionKind::Chain;

    match payload {
        ChainPayload::Text(text) => {
            let below = match endpoint {
                Some(Member::Value(Value::None)) => None,
                Some(Member::Value(Value::Str(s))) => Some(s.as_str()),
                Some(_) => return Err(target_collision(type_name, instruction)),
                // The doc slot always exists, possibly empty.
                None if instruction.name() == DOC_SLOT => None,
                None if mandatory => return Err(missing(type_name, instruction, None)),
                None => return Ok(None),
            };
            Ok(splice(Some(text), below).map(Member::from))
        }

        ChainPayload::Method(layer) => match endpoint {
            Some(Member::Method(method)) => Ok(Some(Member::Method(layer.terminate(method)))),
            Some(_) => Err(target_collision(type_name, instruction)),
            None if mandatory => Err(missing(type_name, instruction, None)),
            None => Ok(None),
        },

        ChainPayload::Property(chained) => match endpoint {
            Some(Member::Property(property)) if mandatory => chained
                .terminate(property)
                .map(|p| Some(Member::Property(p)))
                .map_err(|which: AccessorSet| missing(type_name, instruction, Some(which.label()))),
            Some(Member::Property(property)) => {
                Ok(Some(Member::Property(chained.terminate_available(property))))
            }
            Some(_) => Err(target_collision(type_name, instruction)),
            None if mandatory => Err(missing(type_name, instruction, None)),
            None => Ok(None),
        },
    }
}

fn target_collision(type_name: &str, instruction: &Instruction) -> CompositionError {
    CompositionError::collision(
        instruction.clone(),
        Contender::Target {
            type_name: type_name.to_string(),
            member: instruction.name().to_string(),
        },
    )
}

fn missing(
    type_name: &str,
    instruction: &Instruction,
    accessor: Option<&'static str>,
) -> CompositionError {
    CompositionError::MissingEndpoint {
        type_name: type_name.to_string(),
        name: instruction.name().to_string(),
        accessor,
        origin: instruction.origin().map(|o| o.name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pipework_core::{ChainedProperty, ComposedType, Instance, Layer, Method, Origin, Property};

    fn upper() -> Layer {
        Layer::new(|next, this, args| {
            let inner = next.call(this, args)?;
            Ok(Value::from(inner.as_str().unwrap_or_default().to_uppercase()))
        })
    }

    fn obj() -> Instance {
        Instance::new(Arc::new(ComposedType::empty("Target")))
    }

    #[test]
    fn method_chain_wraps_endpoint() {
        let endpoint = Member::from(Method::new(|_, _| Ok(Value::from("hi"))));
        let built = build_chain("Target", &Instruction::chain("greet", upper()), Some(&endpoint))
            .unwrap()
            .unwrap();
        let method = built.as_method().unwrap();
        assert_eq!(method.call(&mut obj(), &[]).unwrap(), Value::from("HI"));
    }

    #[test]
    fn missing_endpoint_depends_on_kind() {
        let chain = Instruction::chain("greet", upper()).with_origin(Origin::new("Loud"));
        let err = build_chain("Target", &chain, None).unwrap_err();
        assert_eq!(
            err,
            CompositionError::MissingEndpoint {
                type_name: "Target".into(),
                name: "greet".into(),
                accessor: None,
                origin: Some("Loud".into()),
            }
        );

        let optional = Instruction::chain_if_exists("greet", upper());
        assert!(build_chain("Target", &optional, None).unwrap().is_none());
    }

    #[test]
    fn wrong_endpoint_kind_collides_with_target() {
        let err = build_chain(
            "Target",
            &Instruction::chain_if_exists("greet", upper()),
            Some(&Member::from(3)),
        )
        .unwrap_err();
        let collision = err.as_collision().unwrap();
        assert!(!collision.left.is_target());
        assert!(collision.right.is_target());
    }

    #[test]
    fn text_chain_splices_endpoint_doc() {
        let built = build_chain(
            "Target",
            &Instruction::doc("P1"),
            Some(&Member::from("Plumbing")),
        )
        .unwrap();
        assert_eq!(built, Some(Member::from("Plumbing\n\nP1")));

        let alone = build_chain("Target", &Instruction::doc("P1"), None).unwrap();
        assert_eq!(alone, Some(Member::from("P1")));
    }

    #[test]
    fn text_chain_outside_doc_slot_needs_endpoint() {
        let chain = Instruction::chain("title", "extra").with_origin(Origin::new("Titled"));
        let err = build_chain("Target", &chain, None).unwrap_err();
        assert_eq!(
            err,
            CompositionError::MissingEndpoint {
                type_name: "Target".into(),
                name: "title".into(),
                accessor: None,
                origin: Some("Titled".into()),
            }
        );

        let optional = Instruction::chain_if_exists("title", "extra");
        assert_eq!(build_chain("Target", &optional, None).unwrap(), None);

        let built = build_chain("Target", &optional, Some(&Member::from("Base"))).unwrap();
        assert_eq!(built, Some(Member::from("Base\n\nextra")));
    }

    #[test]
    fn property_chain_names_missing_accessor() {
        let endpoint = Member::from(Property::new().with_getter(|_| Ok(Value::from(1))));
        let chained = ChainedProperty::new().chain_setter(|next, this, v| next.set(this, v));

        let err = build_chain("Target", &Instruction::chain("p", chained.clone()), Some(&endpoint))
            .unwrap_err();
        assert!(matches!(
            err,
            CompositionError::MissingEndpoint { accessor: Some("setter"), .. }
        ));

        let built =
            build_chain("Target", &Instruction::chain_if_exists("p", chained), Some(&endpoint))
                .unwrap()
                .unwrap();
        assert_eq!(built.as_property().unwrap().accessors(), AccessorSet::GET);
    }
}
