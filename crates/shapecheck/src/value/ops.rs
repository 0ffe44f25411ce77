//! Structural operations a class can support.
//!
//! Capability checks (`Iterable`, `Sized`, `SupportsInt`, custom protocols)
//! never probe attributes ad hoc. Every class carries an [`OpSet`], and a
//! capability is satisfied when its required set is a subset of the value's.

use std::fmt;

/// A single structural operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    /// `__iter__`
    Iter,
    /// `__next__`
    Next,
    /// `__reversed__`
    Reversed,
    /// `__len__`
    Len,
    /// `__contains__`
    Contains,
    /// `__hash__`
    Hash,
    /// `__call__`
    Call,
    /// `__await__`
    Await,
    /// `__enter__`
    Enter,
    /// `__exit__`
    Exit,
    /// `__aenter__`
    AEnter,
    /// `__aexit__`
    AExit,
    /// `__aiter__`
    AIter,
    /// `__anext__`
    ANext,
    /// `send`
    Send,
    /// `throw`
    Throw,
    /// `__abs__`
    Abs,
    /// `__bytes__`
    Bytes,
    /// `__complex__`
    Complex,
    /// `__float__`
    Float,
    /// `__index__`
    Index,
    /// `__int__`
    Int,
    /// `__round__`
    Round,
    /// `__getitem__`
    GetItem,
    /// `__setitem__`
    SetItem,
    /// `keys`
    Keys,
    /// `read`
    Read,
    /// `write`
    Write,
}

impl Op {
    /// Every operation, in declaration order.
    pub const ALL: [Op; 28] = [
        Op::Iter,
        Op::Next,
        Op::Reversed,
        Op::Len,
        Op::Contains,
        Op::Hash,
        Op::Call,
        Op::Await,
        Op::Enter,
        Op::Exit,
        Op::AEnter,
        Op::AExit,
        Op::AIter,
        Op::ANext,
        Op::Send,
        Op::Throw,
        Op::Abs,
        Op::Bytes,
        Op::Complex,
        Op::Float,
        Op::Index,
        Op::Int,
        Op::Round,
        Op::GetItem,
        Op::SetItem,
        Op::Keys,
        Op::Read,
        Op::Write,
    ];

    /// The dunder or method name this operation stands for.
    pub const fn method_name(self) -> &'static str {
        match self {
            Op::Iter => "__iter__",
            Op::Next => "__next__",
            Op::Reversed => "__reversed__",
            Op::Len => "__len__",
            Op::Contains => "__contains__",
            Op::Hash => "__hash__",
            Op::Call => "__call__",
            Op::Await => "__await__",
            Op::Enter => "__enter__",
            Op::Exit => "__exit__",
            Op::AEnter => "__aenter__",
            Op::AExit => "__aexit__",
            Op::AIter => "__aiter__",
            Op::ANext => "__anext__",
            Op::Send => "send",
            Op::Throw => "throw",
            Op::Abs => "__abs__",
            Op::Bytes => "__bytes__",
            Op::Complex => "__complex__",
            Op::Float => "__float__",
            Op::Index => "__index__",
            Op::Int => "__int__",
            Op::Round => "__round__",
            Op::GetItem => "__getitem__",
            Op::SetItem => "__setitem__",
            Op::Keys => "keys",
            Op::Read => "read",
            Op::Write => "write",
        }
    }

    const fn bit(self) -> u32 {
        1 << self as u8
    }
}

/// A set of [`Op`]s, stored as a bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OpSet(u32);

impl OpSet {
    /// The empty set.
    pub const EMPTY: OpSet = OpSet(0);

    /// Builds a set from a slice, usable in `const` context.
    pub const fn of(ops: &[Op]) -> OpSet {
        let mut bits = 0;
        let mut i = 0;
        while i < ops.len() {
            bits |= ops[i].bit();
            i += 1;
        }
        OpSet(bits)
    }

    /// Returns `true` if `op` is in the set.
    pub const fn contains(self, op: Op) -> bool {
        self.0 & op.bit() != 0
    }

    /// Returns `true` if every op of `other` is in `self`.
    pub const fn is_superset(self, other: OpSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set union.
    #[must_use]
    pub const fn union(self, other: OpSet) -> OpSet {
        OpSet(self.0 | other.0)
    }

    /// Ops in `self` but not in `other`.
    #[must_use]
    pub const fn difference(self, other: OpSet) -> OpSet {
        OpSet(self.0 & !other.0)
    }

    /// Returns `true` if the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of ops in the set.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates over the ops in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Op> {
        Op::ALL.into_iter().filter(move |op| self.contains(*op))
    }
}

impl FromIterator<Op> for OpSet {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        iter.into_iter()
            .fold(OpSet::EMPTY, |set, op| OpSet(set.0 | op.bit()))
    }
}

impl fmt::Debug for OpSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for OpSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", op.method_name())?;
        }
        Ok(())
    }
}
