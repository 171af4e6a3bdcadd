//! Members of composed types and the chain layers that wrap them.
//!
//! This module provides the callable side of the model:
//!
//! - [`Method`]: an endpoint, `(this, args) -> Value`.
//! - [`Layer`]: one link of a delegation chain, `(next, this, args) -> Value`.
//!   The layer decides whether, how often and with which arguments it calls
//!   the rest of the chain through [`Next`].
//! - [`Property`]: getter/setter/deleter endpoints.
//! - [`ChainedProperty`]: per-accessor layers (or accessor overrides).
//!
//! All callables are shared (`Arc`) and `Send + Sync`. Installed chains carry
//! no state of their own, so a composed type can be used from many threads.
//!
//! # Chain Layout
//!
//! ```text
//! installed method = first.then(second).terminate(endpoint)
//!
//! call(this, args)
//!   └─ first(next₁, this, args)
//!        └─ next₁ → second(next₂, this, args)
//!                     └─ next₂ → endpoint(this, args)
//! ```

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::CallError;
use crate::instance::Instance;
use crate::text::splice;
use crate::value::Value;

/// Result of invoking a member.
pub type CallResult = Result<Value, CallError>;

type MethodFn = dyn Fn(&mut Instance, &[Value]) -> CallResult + Send + Sync;
type LayerFn = dyn Fn(&Next<'_>, &mut Instance, &[Value]) -> CallResult + Send + Sync;

fn same_callable<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ============================================================================
// Continuation
// ============================================================================

/// The rest of a chain, as seen from inside a layer.
///
/// A `Next` is only valid for the duration of the call that received it.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    inner: &'a (dyn Fn(&mut Instance, &[Value]) -> CallResult + 'a),
}

impl<'a> Next<'a> {
    pub fn new(inner: &'a (dyn Fn(&mut Instance, &[Value]) -> CallResult + 'a)) -> Self {
        Self { inner }
    }

    /// Call the rest of the chain.
    pub fn call(&self, this: &mut Instance, args: &[Value]) -> CallResult {
        (self.inner)(this, args)
    }

    /// Call the rest of a getter chain.
    pub fn get(&self, this: &mut Instance) -> CallResult {
        self.call(this, &[])
    }

    /// Call the rest of a setter chain.
    pub fn set(&self, this: &mut Instance, value: Value) -> Result<(), CallError> {
        self.call(this, &[value]).map(|_| ())
    }

    /// Call the rest of a deleter chain.
    pub fn delete(&self, this: &mut Instance) -> Result<(), CallError> {
        self.call(this, &[]).map(|_| ())
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

// ============================================================================
// Method
// ============================================================================

/// A shared endpoint callable with optional documentation.
#[derive(Clone)]
pub struct Method {
    func: Arc<MethodFn>,
    doc: Option<Arc<str>>,
}

impl Method {
    /// Create a method from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(f),
            doc: None,
        }
    }

    /// Attach documentation.
    pub fn with_doc(mut self, doc: impl AsRef<str>) -> Self {
        self.doc = Some(Arc::from(doc.as_ref()));
        self
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Invoke the method.
    pub fn call(&self, this: &mut Instance, args: &[Value]) -> CallResult {
        (self.func)(this, args)
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        same_callable(&self.func, &other.func) && self.doc == other.doc
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Layer
// ============================================================================

/// One link of a delegation chain.
///
/// # Example
///
/// ```
/// use pipework_core::{Layer, Method, Value};
///
/// let shout = Layer::new(|next, this, args| {
///     let inner = next.call(this, args)?;
///     Ok(Value::from(inner.as_str().unwrap_or_default().to_uppercase()))
/// });
/// let greet = shout.terminate(&Method::new(|_, _| Ok(Value::from("hi"))));
/// # let _ = greet;
/// ```
#[derive(Clone)]
pub struct Layer {
    func: Arc<LayerFn>,
    doc: Option<Arc<str>>,
}

impl Layer {
    /// Create a layer from a closure receiving the continuation first.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Next<'_>, &mut Instance, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(f),
            doc: None,
        }
    }

    /// Attach documentation.
    pub fn with_doc(mut self, doc: impl AsRef<str>) -> Self {
        self.doc = Some(Arc::from(doc.as_ref()));
        self
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Invoke this layer with an explicit continuation.
    pub fn invoke(&self, next: &Next<'_>, this: &mut Instance, args: &[Value]) -> CallResult {
        (self.func)(next, this, args)
    }

    /// Combine with a later-declared layer.
    ///
    /// The result calls `self` first; `self`'s continuation enters `inner`,
    /// and `inner`'s continuation is whatever the combined layer is given.
    pub fn then(&self, inner: &Layer) -> Layer {
        let outer = self.clone();
        let inner_layer = inner.clone();
        let mut combined = Layer::new(move |next, this, args| {
            let rest = |this: &mut Instance, args: &[Value]| inner_layer.invoke(next, this, args);
            outer.invoke(&Next::new(&rest), this, args)
        });
        combined.doc = splice(self.doc(), inner.doc()).map(Arc::from);
        combined
    }

    /// Close the chain over an endpoint, producing the installable method.
    pub fn terminate(&self, endpoint: &Method) -> Method {
        let layer = self.clone();
        let end = endpoint.clone();
        let mut installed = Method::new(move |this, args| {
            let terminal = |this: &mut Instance, args: &[Value]| end.call(this, args);
            layer.invoke(&Next::new(&terminal), this, args)
        });
        installed.doc = splice(self.doc(), endpoint.doc()).map(Arc::from);
        installed
    }
}

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        same_callable(&self.func, &other.func) && self.doc == other.doc
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Properties
// ============================================================================

bitflags! {
    /// Which accessors a property defines.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessorSet: u8 {
        const GET = 1 << 0;
        const SET = 1 << 1;
        const DELETE = 1 << 2;
    }
}

impl AccessorSet {
    /// Accessor name for diagnostics.
    pub fn label(self) -> &'static str {
        if self == AccessorSet::GET {
            "getter"
        } else if self == AccessorSet::SET {
            "setter"
        } else if self == AccessorSet::DELETE {
            "deleter"
        } else {
            "accessors"
        }
    }
}

fn setter_arg(args: &[Value]) -> Value {
    args.first().cloned().unwrap_or_default()
}

/// A property endpoint: getter, setter and deleter are each optional.
///
/// Accessors are stored as [`Method`]s; the getter and deleter take no
/// arguments and the setter takes the assigned value as its only argument.
#[derive(Clone, Default, PartialEq)]
pub struct Property {
    pub getter: Option<Method>,
    pub setter: Option<Method>,
    pub deleter: Option<Method>,
    doc: Option<Arc<str>>,
}

impl Property {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Instance) -> CallResult + Send + Sync + 'static,
    {
        self.getter = Some(Method::new(move |this, _| f(this)));
        self
    }

    pub fn with_setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Instance, Value) -> Result<(), CallError> + Send + Sync + 'static,
    {
        self.setter = Some(Method::new(move |this, args| {
            f(this, setter_arg(args)).map(|()| Value::None)
        }));
        self
    }

    pub fn with_deleter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Instance) -> Result<(), CallError> + Send + Sync + 'static,
    {
        self.deleter = Some(Method::new(move |this, _| f(this).map(|()| Value::None)));
        self
    }

    /// Attach documentation.
    pub fn with_doc(mut self, doc: impl AsRef<str>) -> Self {
        self.doc = Some(Arc::from(doc.as_ref()));
        self
    }

    pub(crate) fn set_doc(&mut self, doc: Option<String>) {
        self.doc = doc.map(Arc::from);
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Which accessors are defined.
    pub fn accessors(&self) -> AccessorSet {
        let mut set = AccessorSet::empty();
        set.set(AccessorSet::GET, self.getter.is_some());
        set.set(AccessorSet::SET, self.setter.is_some());
        set.set(AccessorSet::DELETE, self.deleter.is_some());
        set
    }

    /// Get one accessor by flag.
    pub fn accessor(&self, which: AccessorSet) -> Option<&Method> {
        if which == AccessorSet::GET {
            self.getter.as_ref()
        } else if which == AccessorSet::SET {
            self.setter.as_ref()
        } else if which == AccessorSet::DELETE {
            self.deleter.as_ref()
        } else {
            None
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("accessors", &self.accessors())
            .field("doc", &self.doc)
            .finish()
    }
}

/// One accessor slot of a chained property.
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    /// Chain this accessor in front of the endpoint's accessor.
    Chain(Layer),
    /// Replace the accessor outright; nothing below it is reached.
    Override(Method),
}

/// Per-accessor delegation chains for a property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainedProperty {
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
    pub deleter: Option<Accessor>,
    doc: Option<Arc<str>>,
}

impl ChainedProperty {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain_getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Next<'_>, &mut Instance) -> CallResult + Send + Sync + 'static,
    {
        self.getter = Some(Accessor::Chain(Layer::new(move |next, this, _| f(next, this))));
        self
    }

    pub fn chain_setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Next<'_>, &mut Instance, Value) -> Result<(), CallError> + Send + Sync + 'static,
    {
        self.setter = Some(Accessor::Chain(Layer::new(move |next, this, args| {
            f(next, this, setter_arg(args)).map(|()| Value::None)
        })));
        self
    }

    pub fn chain_deleter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Next<'_>, &mut Instance) -> Result<(), CallError> + Send + Sync + 'static,
    {
        self.deleter = Some(Accessor::Chain(Layer::new(move |next, this, _| {
            f(next, this).map(|()| Value::None)
        })));
        self
    }

    pub fn override_getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Instance) -> CallResult + Send + Sync + 'static,
    {
        self.getter = Some(Accessor::Override(Method::new(move |this, _| f(this))));
        self
    }

    pub fn override_setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Instance, Value) -> Result<(), CallError> + Send + Sync + 'static,
    {
        self.setter = Some(Accessor::Override(Method::new(move |this, args| {
            f(this, setter_arg(args)).map(|()| Value::None)
        })));
        self
    }

    pub fn override_deleter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Instance) -> Result<(), CallError> + Send + Sync + 'static,
    {
        self.deleter = Some(Accessor::Override(Method::new(move |this, _| {
            f(this).map(|()| Value::None)
        })));
        self
    }

    /// Attach documentation.
    pub fn with_doc(mut self, doc: impl AsRef<str>) -> Self {
        self.doc = Some(Arc::from(doc.as_ref()));
        self
    }

    pub(crate) fn set_doc(&mut self, doc: Option<String>) {
        self.doc = doc.map(Arc::from);
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Which accessor slots are declared.
    pub fn accessors(&self) -> AccessorSet {
        let mut set = AccessorSet::empty();
        set.set(AccessorSet::GET, self.getter.is_some());
        set.set(AccessorSet::SET, self.setter.is_some());
        set.set(AccessorSet::DELETE, self.deleter.is_some());
        set
    }

    /// Merge with a later-declared chained property, accessor by accessor.
    ///
    /// - only one side declares the accessor: that side is used as is
    /// - the later side overrides: its override replaces the accessor
    /// - the earlier side overrides: it stays, later layers are unreachable
    /// - both chain: the layers are combined, earlier first
    pub fn merge(&self, later: &ChainedProperty) -> ChainedProperty {
        let mut merged = ChainedProperty {
            getter: merge_accessor(&self.getter, &later.getter),
            setter: merge_accessor(&self.setter, &later.setter),
            deleter: merge_accessor(&self.deleter, &later.deleter),
            doc: None,
        };
        merged.set_doc(splice(self.doc(), later.doc()));
        merged
    }

    /// Close every chained accessor over the endpoint's accessor.
    ///
    /// Fails with the accessor that chains but has no endpoint accessor.
    pub fn terminate(&self, endpoint: &Property) -> Result<Property, AccessorSet> {
        self.close(endpoint, true)
    }

    /// Like [`terminate`](Self::terminate), but an accessor without an
    /// endpoint accessor is left undefined instead of failing.
    pub fn terminate_available(&self, endpoint: &Property) -> Property {
        // Lenient closing never reports a missing accessor.
        self.close(endpoint, false).unwrap_or_default()
    }

    fn close(&self, endpoint: &Property, strict: bool) -> Result<Property, AccessorSet> {
        let mut property = Property {
            getter: close_accessor(&self.getter, &endpoint.getter, AccessorSet::GET, strict)?,
            setter: close_accessor(&self.setter, &endpoint.setter, AccessorSet::SET, strict)?,
            deleter: close_accessor(&self.deleter, &endpoint.deleter, AccessorSet::DELETE, strict)?,
            doc: None,
        };
        property.set_doc(splice(self.doc(), endpoint.doc()));
        Ok(property)
    }
}

fn close_accessor(
    chain: &Option<Accessor>,
    endpoint: &Option<Method>,
    which: AccessorSet,
    strict: bool,
) -> Result<Option<Method>, AccessorSet> {
    match (chain, endpoint) {
        (None, endpoint) => Ok(endpoint.clone()),
        (Some(Accessor::Override(method)), _) => Ok(Some(method.clone())),
        (Some(Accessor::Chain(layer)), Some(end)) => Ok(Some(layer.terminate(end))),
        (Some(Accessor::Chain(_)), None) if strict => Err(which),
        (Some(Accessor::Chain(_)), None) => Ok(None),
    }
}

fn merge_accessor(left: &Option<Accessor>, right: &Option<Accessor>) -> Option<Accessor> {
    match (left, right) {
        (left, None) => left.clone(),
        (None, right) => right.clone(),
        (Some(_), Some(Accessor::Override(m))) => Some(Accessor::Override(m.clone())),
        (Some(Accessor::Override(m)), Some(Accessor::Chain(_))) => {
            Some(Accessor::Override(m.clone()))
        }
        (Some(Accessor::Chain(outer)), Some(Accessor::Chain(inner))) => {
            Some(Accessor::Chain(outer.then(inner)))
        }
    }
}

// ============================================================================
// Members and chain payloads
// ============================================================================

/// An attribute of a composed type.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Value(Value),
    Method(Method),
    Property(Property),
}

impl Member {
    /// Short description of the member kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Member::Value(_) => "value",
            Member::Method(_) => "method",
            Member::Property(_) => "property",
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Member::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Member::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Member::Property(p) => Some(p),
            _ => None,
        }
    }

    /// Documentation attached to the member, if any.
    pub fn doc(&self) -> Option<&str> {
        match self {
            Member::Value(_) => None,
            Member::Method(m) => m.doc(),
            Member::Property(p) => p.doc(),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Value(v) => write!(f, "{}", v),
            Member::Method(_) => write!(f, "<method>"),
            Member::Property(p) => write!(f, "<property {:?}>", p.accessors()),
        }
    }
}

impl From<Value> for Member {
    fn from(v: Value) -> Self {
        Member::Value(v)
    }
}

macro_rules! member_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Member {
                fn from(v: $ty) -> Self {
                    Member::Value(Value::from(v))
                }
            }
        )*
    };
}

member_from_value!(bool, i64, i32, f64, &str, String, Vec<Value>);

impl From<Method> for Member {
    fn from(m: Method) -> Self {
        Member::Method(m)
    }
}

impl From<Property> for Member {
    fn from(p: Property) -> Self {
        Member::Property(p)
    }
}

/// The payload of a chain instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainPayload {
    /// Text spliced together (documentation).
    Text(String),
    /// A method layer.
    Method(Layer),
    /// Per-accessor property layers.
    Property(ChainedProperty),
}

impl ChainPayload {
    /// Short description of the payload kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ChainPayload::Text(_) => "text",
            ChainPayload::Method(_) => "method",
            ChainPayload::Property(_) => "property",
        }
    }

    /// Merge with a later payload. Returns `None` when incompatible.
    pub fn merge(&self, later: &ChainPayload) -> Option<ChainPayload> {
        match (self, later) {
            (ChainPayload::Text(left), ChainPayload::Text(right)) => {
                splice(Some(left), Some(right)).map(ChainPayload::Text)
            }
            (ChainPayload::Method(outer), ChainPayload::Method(inner)) => {
                Some(ChainPayload::Method(outer.then(inner)))
            }
            (ChainPayload::Property(outer), ChainPayload::Property(inner)) => {
                Some(ChainPayload::Property(outer.merge(inner)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ChainPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainPayload::Text(t) => write!(f, "{:?}", t),
            ChainPayload::Method(_) => write!(f, "<layer>"),
            ChainPayload::Property(p) => write!(f, "<chained property {:?}>", p.accessors()),
        }
    }
}

impl From<&str> for ChainPayload {
    fn from(s: &str) -> Self {
        ChainPayload::Text(s.to_string())
    }
}

impl From<String> for ChainPayload {
    fn from(s: String) -> Self {
        ChainPayload::Text(s)
    }
}

impl From<Layer> for ChainPayload {
    fn from(l: Layer) -> Self {
        ChainPayload::Method(l)
    }
}

impl From<ChainedProperty> for ChainPayload {
    fn from(p: ChainedProperty) -> Self {
        ChainPayload::Property(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ComposedType;
    use std::sync::Mutex;

    fn instance() -> Instance {
        Instance::new(Arc::new(ComposedType::empty("Probe")))
    }

    #[test]
    fn method_identity_equality() {
        let m = Method::new(|_, _| Ok(Value::None));
        let same = m.clone();
        let other = Method::new(|_, _| Ok(Value::None));
        assert_eq!(m, same);
        assert_ne!(m, other);
    }

    #[test]
    fn layers_run_outer_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let layer = |tag: &'static str| {
            let log = Arc::clone(&log);
            Layer::new(move |next, this, args| {
                log.lock().unwrap().push(format!("{tag} before"));
                let out = next.call(this, args);
                log.lock().unwrap().push(format!("{tag} after"));
                out
            })
        };
        let endpoint = {
            let log = Arc::clone(&log);
            Method::new(move |_, _| {
                log.lock().unwrap().push("endpoint".to_string());
                Ok(Value::from(1))
            })
        };

        let method = layer("b1").then(&layer("b2")).terminate(&endpoint);
        let out = method.call(&mut instance(), &[]).unwrap();

        assert_eq!(out, Value::from(1));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["b1 before", "b2 before", "endpoint", "b2 after", "b1 after"]
        );
    }

    #[test]
    fn layer_may_skip_or_repeat_continuation() {
        let twice = Layer::new(|next, this, args| {
            let a = next.call(this, args)?.as_int().unwrap_or(0);
            let b = next.call(this, args)?.as_int().unwrap_or(0);
            Ok(Value::from(a + b))
        });
        let short = Layer::new(|_, _, _| Ok(Value::from("short")));
        let endpoint = Method::new(|_, args| Ok(args[0].clone()));

        let method = twice.terminate(&endpoint);
        assert_eq!(method.call(&mut instance(), &[Value::from(4)]).unwrap(), Value::from(8));

        let method = short.terminate(&endpoint);
        assert_eq!(method.call(&mut instance(), &[Value::from(4)]).unwrap(), Value::from("short"));
    }

    #[test]
    fn docs_splice_through_layers() {
        let outer = Layer::new(|next, this, args| next.call(this, args)).with_doc("P1.foo");
        let endpoint = Method::new(|_, _| Ok(Value::None)).with_doc("P2.foo");
        assert_eq!(outer.terminate(&endpoint).doc(), Some("P2.foo\n\nP1.foo"));
    }

    #[test]
    fn accessor_merge_rules() {
        let a = ChainedProperty::new().chain_getter(|next, this| next.get(this));
        let b = ChainedProperty::new().override_setter(|_, _| Ok(()));
        let merged = a.merge(&b);
        assert_eq!(merged.accessors(), AccessorSet::GET | AccessorSet::SET);
        assert!(matches!(merged.getter, Some(Accessor::Chain(_))));
        assert!(matches!(merged.setter, Some(Accessor::Override(_))));

        let c = ChainedProperty::new().chain_setter(|next, this, v| next.set(this, v));
        let still_override = merged.merge(&c);
        assert!(matches!(still_override.setter, Some(Accessor::Override(_))));
    }

    #[test]
    fn chained_property_terminates_per_accessor() {
        let endpoint = Property::new()
            .with_getter(|this| Ok(this.slot("v").cloned().unwrap_or_default()))
            .with_doc("endpoint");
        let chain = ChainedProperty::new()
            .chain_getter(|next, this| {
                let v = next.get(this)?.as_int().unwrap_or(0);
                Ok(Value::from(v * 2))
            })
            .override_setter(|this, v| {
                this.set_slot("v", v);
                Ok(())
            })
            .with_doc("chain");

        let property = chain.terminate(&endpoint).unwrap();
        assert_eq!(property.accessors(), AccessorSet::GET | AccessorSet::SET);
        assert_eq!(property.doc(), Some("endpoint\n\nchain"));

        let mut obj = instance();
        property.setter.as_ref().unwrap().call(&mut obj, &[Value::from(4)]).unwrap();
        assert_eq!(property.getter.as_ref().unwrap().call(&mut obj, &[]).unwrap(), Value::from(8));
    }

    #[test]
    fn chained_accessor_without_endpoint() {
        let endpoint = Property::new().with_getter(|_| Ok(Value::None));
        let chain = ChainedProperty::new().chain_setter(|next, this, v| next.set(this, v));
        assert_eq!(chain.terminate(&endpoint).unwrap_err(), AccessorSet::SET);
        assert_eq!(chain.terminate_available(&endpoint).accessors(), AccessorSet::GET);
    }

    #[test]
    fn payload_compatibility() {
        let text = ChainPayload::from("doc");
        let layer = ChainPayload::from(Layer::new(|n, t, a| n.call(t, a)));
        let prop = ChainPayload::from(ChainedProperty::new());
        assert!(text.merge(&ChainPayload::from("more")).is_some());
        assert!(text.merge(&layer).is_none());
        assert!(layer.merge(&prop).is_none());
    }
}
