//! Runtime value model.
//!
//! - **Value**: scalars inline, everything else behind an [`ObjectId`]
//! - **Object**: a heap object with a class and one of a few data layouts
//! - **Classes**: nominal hierarchy plus structural operation sets
//! - **Repr**: literal-style, cycle-safe rendering for diagnostics
//!
//! Heap objects live in the [`Store`](crate::Store) arena, so a mapping can
//! contain itself and cycle detection can key on the object index.

pub mod class;
pub mod ops;
pub mod repr;

pub use class::{Builtins, ClassId, ClassInfo, ClassRegistry};
pub use ops::{Op, OpSet};

use shapecheck_mem::{Id, Symbol};
use std::sync::Arc;

/// Handle to a heap object.
pub type ObjectId = Id<Object>;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null sentinel.
    None,
    /// A boolean. Its class derives from `int`, but literals never coerce.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    Str(Arc<str>),
    /// A byte string.
    Bytes(Arc<[u8]>),
    /// A value denoting a class, e.g. the argument to `Type[...]` checks.
    Class(ClassId),
    /// A heap object.
    Ref(ObjectId),
}

impl Value {
    /// Creates a string value.
    pub fn str(s: &str) -> Value {
        Value::Str(s.into())
    }

    /// Creates a bytes value.
    pub fn bytes(b: &[u8]) -> Value {
        Value::Bytes(b.into())
    }

    /// Returns `true` for the null sentinel.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the object id, if this is a heap value.
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// Literal equality: same variant and same payload, objects by identity.
    ///
    /// `Bool(true)` never equals `Int(1)`, and floats compare by value
    /// (so `NaN` matches nothing).
    pub fn literal_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a == b,
            _ => false,
        }
    }

    /// Identity key used by the cycle guard.
    pub fn key(&self) -> ValueKey {
        match self {
            Value::None => ValueKey::None,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Int(i) => ValueKey::Int(*i),
            Value::Float(f) => ValueKey::Float(f.to_bits()),
            Value::Str(s) => ValueKey::Str(Arc::clone(s)),
            Value::Bytes(b) => ValueKey::Bytes(Arc::clone(b)),
            Value::Class(c) => ValueKey::Class(*c),
            Value::Ref(id) => ValueKey::Object(*id),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<ClassId> for Value {
    fn from(c: ClassId) -> Self {
        Value::Class(c)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Ref(id)
    }
}

/// Hashable identity of a value.
///
/// Heap objects are keyed by index, scalars by value (floats by bit
/// pattern).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    /// `None`
    None,
    /// A boolean
    Bool(bool),
    /// An integer
    Int(i64),
    /// Float bits
    Float(u64),
    /// A string
    Str(Arc<str>),
    /// A byte string
    Bytes(Arc<[u8]>),
    /// A class value
    Class(ClassId),
    /// A heap object
    Object(ObjectId),
}

/// A heap object.
#[derive(Debug, Clone)]
pub struct Object {
    /// The object's class.
    pub class: ClassId,
    /// Layout-specific payload.
    pub data: ObjectData,
}

/// Payload layouts for heap objects.
#[derive(Debug, Clone)]
pub enum ObjectData {
    /// Ordered items: lists, tuples, deques, tagged tuples, iterator
    /// snapshots.
    Items(Vec<Value>),
    /// Set members.
    Members(Vec<Value>),
    /// Ordered mapping entries.
    Entries(Vec<(Value, Value)>),
    /// Plain instance attributes.
    Attrs(Vec<(Symbol, Value)>),
    /// A compiled pattern; `source` is its `.pattern` attribute.
    Pattern {
        /// The pattern source (`str` or `bytes`).
        source: Value,
    },
    /// A match result; `subject` is its `.string` attribute.
    Match {
        /// The string that was matched.
        subject: Value,
    },
    /// A callable with an optional declared arity.
    Function {
        /// Number of positional parameters, if known.
        arity: Option<usize>,
    },
    /// An opaque object with no inspectable contents (streams, coroutines).
    Opaque,
}
