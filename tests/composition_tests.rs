//! End-to-end composition: orchestration, capabilities, hooks and the catalog.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::thread;

use pipework::prelude::*;
use pipework::{
    CAPABILITIES_SLOT, Capability, CapabilityRegistry, InstructionKind, RegistrationError,
};

fn shout() -> Layer {
    Layer::new(|next, this, args| {
        let inner = next.call(this, args)?;
        Ok(Value::from(inner.as_str().unwrap_or_default().to_uppercase()))
    })
}

fn greeter() -> TargetSkeleton {
    TargetSkeleton::new("Greeter").with_member("greet", Method::new(|_, _| Ok(Value::from("hi"))))
}

fn tags(names: &[&str]) -> BTreeSet<Capability> {
    names.iter().map(|n| Capability::new(n)).collect()
}

#[test]
fn end_to_end_greeting() {
    let b1 = Behavior::builder("B1").chain("greet", shout()).build();
    let ty = compose(greeter().with_behavior(&b1)).unwrap();

    let mut obj = Instance::new(Arc::clone(&ty));
    assert_eq!(obj.call("greet", &[]).unwrap(), Value::from("HI"));
    assert_eq!(ty.behaviors().len(), 1);
    assert_eq!(ty.behaviors()[0].as_ref(), "B1");
}

#[test]
fn composition_without_behaviors_is_plain() {
    let ty = compose(greeter()).unwrap();
    assert_eq!(Instance::new(ty.clone()).call("greet", &[]).unwrap(), Value::from("hi"));
    assert!(ty.report().history.is_empty());
    assert!(ty.behaviors().is_empty());
}

#[test]
fn report_exposes_history_and_resolution() {
    let b1 = Behavior::builder("B1")
        .doc("B1 doc")
        .default("a", 1)
        .chain("greet", shout())
        .build();
    let b2 = Behavior::builder("B2").overrides("a", 2).build();

    let ty = compose(greeter().with_behaviors([&b1, &b2])).unwrap();
    let report = ty.report();

    assert_eq!(report.history.len(), 4);
    assert_eq!(report.resolution("a").map(|i| i.kind()), Some(InstructionKind::Override));
    assert_eq!(
        report.resolution("a").and_then(|i| i.origin()).map(|o| o.name.to_string()),
        Some("B2".to_string())
    );
    assert_eq!(report.stage2.keys().collect::<Vec<_>>(), vec!["__doc__", "greet"]);
}

#[test]
fn shared_ancestor_instructions_are_not_reprocessed() {
    let log = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&log);
    let counting = Behavior::builder("Counting")
        .chain("greet", Layer::new(move |next, this, args| {
            *counter.lock().unwrap() += 1;
            next.call(this, args)
        }))
        .build();
    let left = Behavior::builder("Left").extends(&counting).build();
    let right = Behavior::builder("Right").extends(&counting).build();

    let ty = compose(greeter().with_behaviors([&left, &right])).unwrap();
    Instance::new(ty.clone()).call("greet", &[]).unwrap();

    assert_eq!(*log.lock().unwrap(), 1);
    assert_eq!(ty.report().history.len(), 2);
}

#[test]
fn composition_is_deterministic() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let tracer = |tag: &'static str| {
        let order = Arc::clone(&order);
        Layer::new(move |next, this, args| {
            order.lock().unwrap().push(tag);
            next.call(this, args)
        })
    };
    let b1 = Behavior::builder("B1")
        .doc("one")
        .default("x", 1)
        .chain("greet", tracer("b1"))
        .build();
    let b2 = Behavior::builder("B2")
        .doc("two")
        .finalize("y", 2)
        .chain("greet", tracer("b2"))
        .build();

    let first = compose(greeter().with_behaviors([&b1, &b2])).unwrap();
    let second = compose(greeter().with_behaviors([&b1, &b2])).unwrap();

    let keys = |ty: &ComposedType| {
        (
            ty.report().stage1.keys().cloned().collect::<Vec<_>>(),
            ty.report().stage2.keys().cloned().collect::<Vec<_>>(),
            ty.members().keys().cloned().collect::<Vec<_>>(),
        )
    };
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(first.report().stage1, second.report().stage1);
    assert_eq!(first.doc(), second.doc());

    Instance::new(first).call("greet", &[]).unwrap();
    Instance::new(second).call("greet", &[]).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["b1", "b2", "b1", "b2"]);
}

#[test]
fn capabilities_fold_and_declare() {
    let table = Arc::new(CapabilityTable::new());
    let composer = Composer::new().with_capability_registry(table.clone());

    let base = composer
        .compose(TargetSkeleton::new("Base").with_capabilities(["base"]))
        .unwrap();

    let ordered = Behavior::builder("Ordered").capabilities(["ordered"]).build();
    let sized = Behavior::builder("Sized").capabilities(["sized", "ordered"]).build();

    let ty = composer
        .compose(
            TargetSkeleton::new("Widget")
                .with_base(&base)
                .with_capabilities(["own"])
                .with_behaviors([&ordered, &sized]),
        )
        .unwrap();

    assert_eq!(ty.capabilities(), &tags(&["base", "ordered", "own", "sized"]));
    assert!(ty.provides("sized"));
    assert!(ty.own_member(CAPABILITIES_SLOT).is_none());

    // One declaration per behavior grant.
    assert_eq!(table.declaration_count(), 2);
    assert_eq!(table.declared_for("Widget"), tags(&["ordered", "sized"]));
    assert_eq!(table.query_capabilities(&ty), tags(&["base", "ordered", "own", "sized"]));
}

#[test]
fn rejected_capabilities_abort_composition() {
    let table = Arc::new(CapabilityTable::new().with_known(["ordered"]));
    let seen = Arc::new(Mutex::new(0));
    let hook_seen = Arc::clone(&seen);
    let composer = Composer::new()
        .with_capability_registry(table)
        .with_hook(move |_, _, _, _| *hook_seen.lock().unwrap() += 1);

    let bogus = Behavior::builder("Bogus").capabilities(["teleport"]).build();
    let err = composer.compose(TargetSkeleton::new("Widget").with_behavior(&bogus)).unwrap_err();

    let CompositionError::Capability(inner) = &err else {
        panic!("expected capability error, got {err:?}");
    };
    assert_eq!(inner.type_name, "Widget");
    assert_eq!(*seen.lock().unwrap(), 0);
}

#[test]
fn hooks_run_in_order_after_composition() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let (c1, c2) = (Arc::clone(&calls), Arc::clone(&calls));

    let composer = Composer::new()
        .with_hook(move |ty, name, _, members| {
            assert!(ty.has_attribute("greet"));
            c1.lock().unwrap().push(format!("first {} {}", name, members.len()));
        })
        .with_hook(move |_, name, bases, _| {
            c2.lock().unwrap().push(format!("second {} {}", name, bases.len()));
        });

    let b1 = Behavior::builder("B1").chain("greet", shout()).default("x", 1).build();
    composer.compose(greeter().with_behavior(&b1)).unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["first Greeter 2", "second Greeter 0"]);
}

#[test]
fn catalog_resolves_pipelines_by_name() {
    let mut registry = BehaviorRegistry::new();
    registry.define(Behavior::builder("Loud").chain("greet", shout())).unwrap();
    let polite = registry
        .extend(Behavior::builder("Polite").default("please", true), "Loud")
        .unwrap();
    registry.define(polite).unwrap();

    let ty = compose_named(&registry, greeter(), ["Polite"]).unwrap();
    let mut obj = Instance::new(ty);
    assert_eq!(obj.call("greet", &[]).unwrap(), Value::from("HI"));
    assert_eq!(obj.get("please").unwrap(), Value::from(true));

    let err = compose_named(&registry, greeter(), ["Polite", "Rude"]).unwrap_err();
    assert_eq!(
        err,
        CompositionError::Registration(RegistrationError::UnknownBehavior("Rude".into()))
    );
}

#[test]
fn composed_types_are_shared_across_threads() {
    let counter = Behavior::builder("Counter")
        .chain("bump", Layer::new(|next, this, args| {
            let n = next.call(this, args)?.as_int().unwrap_or(0);
            Ok(Value::from(n * 10))
        }))
        .build();
    let ty = compose(
        TargetSkeleton::new("Counted")
            .with_member(
                "bump",
                Method::new(|this, _| {
                    let n = this.slot("n").and_then(Value::as_int).unwrap_or(0) + 1;
                    this.set_slot("n", n);
                    Ok(Value::from(n))
                }),
            )
            .with_behavior(&counter),
    )
    .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ty = Arc::clone(&ty);
            thread::spawn(move || {
                let mut obj = Instance::new(ty);
                obj.call("bump", &[]).unwrap();
                obj.call("bump", &[]).unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Value::from(20));
    }
}
