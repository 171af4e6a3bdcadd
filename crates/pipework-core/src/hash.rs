//! Deterministic hash-based identity for behaviors and composed types.
//!
//! [`NameHash`] is a 64-bit hash computed from a qualified name. Behaviors and
//! target types hash their names under different domain constants, so a
//! behavior and a type that share a name still get distinct identities.
//!
//! # Examples
//!
//! ```
//! use pipework_core::{BehaviorId, TypeHash};
//!
//! let a = BehaviorId::from_name("audit::Logging");
//! let b = BehaviorId::from_name("audit::Logging");
//! assert_eq!(a, b); // Deterministic
//!
//! assert_ne!(a.hash(), TypeHash::from_name("audit::Logging").hash());
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Domain marker for target type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for behavior hashes
    pub const BEHAVIOR: u64 = 0x5ea77ffbcdf5f302;
}

/// A deterministic 64-bit hash of a qualified name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NameHash(pub u64);

impl NameHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: NameHash = NameHash(0);

    /// Hash `name` under the given domain constant.
    #[inline]
    pub fn with_domain(domain: u64, name: &str) -> Self {
        NameHash(domain ^ xxh64(name.as_bytes(), 0))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameHash({:#018x})", self.0)
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Identity of a declared behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorId(NameHash);

impl BehaviorId {
    /// Create a behavior id from its qualified name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        BehaviorId(NameHash::with_domain(hash_constants::BEHAVIOR, name))
    }

    /// The underlying hash.
    #[inline]
    pub const fn hash(self) -> NameHash {
        self.0
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "behavior:{}", self.0)
    }
}

/// Identity of a composed (or plain) target type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHash(NameHash);

impl TypeHash {
    /// Create a type hash from its qualified name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(NameHash::with_domain(hash_constants::TYPE, name))
    }

    /// The underlying hash.
    #[inline]
    pub const fn hash(self) -> NameHash {
        self.0
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type:{}", self.0)
    }
}
