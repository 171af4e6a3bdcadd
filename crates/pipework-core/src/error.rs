//! Error types for declaration, composition and invocation.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CompositionError (fatal to one composition run)
//! ├── Collision          - two contenders for one name cannot be merged
//! ├── MissingEndpoint    - a mandatory chain has no terminal implementation
//! ├── Capability         - the capability registry rejected a declaration
//! └── Registration       - behavior catalog errors (duplicates, unknown names)
//!
//! CallError (raised while invoking an installed member)
//! ```
//!
//! Composition errors are raised synchronously from a single pass. A failed
//! composition never yields a partially installed type.

use std::fmt;

use thiserror::Error;

use crate::Instruction;

/// Result alias for composition.
pub type Result<T, E = CompositionError> = std::result::Result<T, E>;

// ============================================================================
// Collisions
// ============================================================================

/// One side of a collision.
#[derive(Debug, Clone, PartialEq)]
pub enum Contender {
    /// An instruction contributed by a behavior.
    Instruction(Box<Instruction>),
    /// A member the target type itself provides.
    Target {
        /// Name of the target type.
        type_name: String,
        /// Name of the conflicting member.
        member: String,
    },
}

impl Contender {
    /// The instruction on this side, if any.
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            Contender::Instruction(instr) => Some(instr),
            Contender::Target { .. } => None,
        }
    }

    /// Check if this side is the target type.
    pub fn is_target(&self) -> bool {
        matches!(self, Contender::Target { .. })
    }
}

impl From<Instruction> for Contender {
    fn from(instr: Instruction) -> Self {
        Contender::Instruction(Box::new(instr))
    }
}

impl fmt::Display for Contender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contender::Instruction(instr) => write!(f, "{}", instr),
            Contender::Target { type_name, member } => {
                write!(f, "<target '{}' member '{}'>", type_name, member)
            }
        }
    }
}

/// Two contenders for the same name that cannot be merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub left: Contender,
    pub right: Contender,
}

impl Collision {
    pub fn new(left: impl Into<Contender>, right: impl Into<Contender>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n    {}\n  with:\n    {}", self.left, self.right)
    }
}

// ============================================================================
// Composition Errors
// ============================================================================

/// Errors that abort a composition run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositionError {
    /// Two instructions (or an instruction and the target) collide.
    #[error("composition collision:{0}")]
    Collision(Box<Collision>),

    /// A mandatory chain has no endpoint on the target or its bases.
    #[error("type '{type_name}' has no endpoint for chain '{name}'{}", accessor_suffix(.accessor))]
    MissingEndpoint {
        /// The target type being composed.
        type_name: String,
        /// The chained member name.
        name: String,
        /// Property accessor lacking an endpoint, if the chain is a property.
        accessor: Option<&'static str>,
        /// Behavior that declared the chain.
        origin: Option<String>,
    },

    /// The capability registry rejected a declaration.
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// A behavior catalog error.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

fn accessor_suffix(accessor: &Option<&'static str>) -> String {
    accessor.map(|a| format!(" ({})", a)).unwrap_or_default()
}

impl CompositionError {
    /// Build a collision error.
    pub fn collision(left: impl Into<Contender>, right: impl Into<Contender>) -> Self {
        CompositionError::Collision(Box::new(Collision::new(left, right)))
    }

    /// Get the collision, if this is one.
    pub fn as_collision(&self) -> Option<&Collision> {
        match self {
            CompositionError::Collision(c) => Some(c),
            _ => None,
        }
    }

    /// Check if this is a collision.
    pub fn is_collision(&self) -> bool {
        matches!(self, CompositionError::Collision(_))
    }

    /// Check if this is a missing endpoint.
    pub fn is_missing_endpoint(&self) -> bool {
        matches!(self, CompositionError::MissingEndpoint { .. })
    }
}

// ============================================================================
// Collaborator Errors
// ============================================================================

/// A capability registry refused a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("capability declaration for '{type_name}' rejected: {reason}")]
pub struct CapabilityError {
    pub type_name: String,
    pub reason: String,
}

impl CapabilityError {
    pub fn new(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the behavior catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A behavior with this name is already registered.
    #[error("duplicate behavior: {0}")]
    DuplicateBehavior(String),

    /// No behavior with this name is registered.
    #[error("unknown behavior: {0}")]
    UnknownBehavior(String),
}

// ============================================================================
// Invocation Errors
// ============================================================================

/// Errors raised while invoking members of a composed type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// No attribute with this name exists on the instance or its type.
    #[error("'{type_name}' has no attribute '{name}'")]
    MissingAttribute { type_name: String, name: String },

    /// The attribute exists but is not a method.
    #[error("'{type_name}.{name}' is not callable")]
    NotCallable { type_name: String, name: String },

    /// The attribute is a method and cannot be read as a value.
    #[error("'{type_name}.{name}' is a method, not a value")]
    NotAValue { type_name: String, name: String },

    /// A property has no setter.
    #[error("property '{name}' is read-only")]
    ReadOnly { name: String },

    /// A property has no deleter.
    #[error("property '{name}' cannot be deleted")]
    NoDeleter { name: String },

    /// Wrong number of arguments.
    #[error("expected {expected} argument(s), got {got}")]
    Arity { expected: usize, got: usize },

    /// An argument had the wrong type.
    #[error("expected {expected}, got {got}")]
    Type {
        expected: &'static str,
        got: &'static str,
    },

    /// A member implementation failed.
    #[error("{0}")]
    Failed(String),
}

impl CallError {
    /// Build a free-form failure.
    pub fn failed(msg: impl Into<String>) -> Self {
        CallError::Failed(msg.into())
    }
}
