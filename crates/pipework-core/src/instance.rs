//! Receivers for composed types.
//!
//! An [`Instance`] is the `this` every method, layer and accessor receives.
//! It pairs the shared [`ComposedType`] with a per-instance slot map. Only
//! slots are mutable; the type and its installed chains are shared and never
//! change after composition.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::composed::ComposedType;
use crate::error::CallError;
use crate::member::{CallResult, Member};
use crate::value::Value;

/// An object of a composed type.
#[derive(Debug, Clone)]
pub struct Instance {
    ty: Arc<ComposedType>,
    slots: FxHashMap<String, Value>,
}

impl Instance {
    pub fn new(ty: Arc<ComposedType>) -> Self {
        Self {
            ty,
            slots: FxHashMap::default(),
        }
    }

    /// The type this instance belongs to.
    pub fn ty(&self) -> &Arc<ComposedType> {
        &self.ty
    }

    // === Slots ===

    pub fn slot(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    pub fn set_slot(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.slots.insert(name.into(), value.into());
    }

    pub fn remove_slot(&mut self, name: &str) -> Option<Value> {
        self.slots.remove(name)
    }

    // === Attribute Access ===

    fn missing(&self, name: &str) -> CallError {
        CallError::MissingAttribute {
            type_name: self.ty.name().to_string(),
            name: name.to_string(),
        }
    }

    /// Call a method by name.
    pub fn call(&mut self, name: &str, args: &[Value]) -> CallResult {
        let ty = Arc::clone(&self.ty);
        match ty.lookup(name) {
            Some(Member::Method(method)) => method.call(self, args),
            Some(_) => Err(CallError::NotCallable {
                type_name: ty.name().to_string(),
                name: name.to_string(),
            }),
            None => Err(self.missing(name)),
        }
    }

    /// Read an attribute.
    ///
    /// Properties on the type take precedence over slots; slots take
    /// precedence over plain values on the type.
    pub fn get(&mut self, name: &str) -> CallResult {
        let ty = Arc::clone(&self.ty);
        let member = ty.lookup(name);
        if let Some(Member::Property(property)) = member {
            return match &property.getter {
                Some(getter) => getter.call(self, &[]),
                None => Err(self.missing(name)),
            };
        }
        if let Some(value) = self.slots.get(name) {
            return Ok(value.clone());
        }
        match member {
            Some(Member::Value(value)) => Ok(value.clone()),
            Some(Member::Method(_)) => Err(CallError::NotAValue {
                type_name: ty.name().to_string(),
                name: name.to_string(),
            }),
            _ => Err(self.missing(name)),
        }
    }

    /// Assign an attribute, going through a property setter if there is one.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), CallError> {
        let ty = Arc::clone(&self.ty);
        if let Some(Member::Property(property)) = ty.lookup(name) {
            return match &property.setter {
                Some(setter) => setter.call(self, &[value.into()]).map(|_| ()),
                None => Err(CallError::ReadOnly {
                    name: name.to_string(),
                }),
            };
        }
        self.slots.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Delete an attribute, going through a property deleter if there is one.
    pub fn delete(&mut self, name: &str) -> Result<(), CallError> {
        let ty = Arc::clone(&self.ty);
        if let Some(Member::Property(property)) = ty.lookup(name) {
            return match &property.deleter {
                Some(deleter) => deleter.call(self, &[]).map(|_| ()),
                None => Err(CallError::NoDeleter {
                    name: name.to_string(),
                }),
            };
        }
        self.slots
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| self.missing(name))
    }
}
