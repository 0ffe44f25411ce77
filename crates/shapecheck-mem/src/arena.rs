//! Index-addressed arena for graph-shaped data.
//!
//! Type expressions and heap objects in `shapecheck` form graphs that may
//! point back at themselves: a record whose field is typed as the record, or
//! a mapping that contains itself. Pointers cannot express that safely, so
//! nodes are stored in an [`Arena`] and referred to by a typed [`Id`].
//!
//! - **Stable ids**: an id stays valid for the lifetime of its arena
//! - **Cycles**: [`Arena::reserve`] hands out an id before the node exists,
//!   [`Arena::define`] fills it in later
//! - **Type safety**: `Id<Foo>` cannot index an `Arena<Bar>`
//!
//! # Examples
//!
//! ```
//! use shapecheck_mem::arena::Arena;
//!
//! #[derive(Debug)]
//! enum Node {
//!     Leaf(u32),
//!     Link(shapecheck_mem::Id<Node>),
//! }
//!
//! let mut arena = Arena::new();
//! let leaf = arena.alloc(Node::Leaf(7));
//!
//! // A node pointing at itself.
//! let looped = arena.reserve();
//! arena.define(looped, Node::Link(looped)).unwrap();
//!
//! assert!(matches!(arena[leaf], Node::Leaf(7)));
//! assert!(matches!(arena[looped], Node::Link(id) if id == looped));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Index;

/// Errors raised by arena bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// The id does not belong to this arena.
    OutOfBounds {
        /// Raw index of the offending id.
        index: u32,
        /// Number of slots in the arena.
        len: usize,
    },

    /// `define` was called twice for the same reserved slot.
    AlreadyDefined {
        /// Raw index of the slot.
        index: u32,
    },

    /// The arena ran out of 32-bit indices.
    Exhausted,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::OutOfBounds { index, len } => {
                write!(f, "arena id {index} out of bounds (len {len})")
            }
            ArenaError::AlreadyDefined { index } => {
                write!(f, "arena slot {index} is already defined")
            }
            ArenaError::Exhausted => write!(f, "arena exhausted: more than u32::MAX slots"),
        }
    }
}

impl std::error::Error for ArenaError {}

/// A typed index into an [`Arena<T>`].
///
/// Ids are 4 bytes, `Copy`, and compare/hash by index only. The type
/// parameter is a marker: no `T` is stored, so `Id<T>` is `Send + Sync`
/// regardless of `T`.
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Creates an id from a raw index.
    ///
    /// Mostly useful in tests; ids normally come from [`Arena::alloc`].
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.raw
    }

    /// Returns the raw index as `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.raw)
    }
}

/// Append-only storage addressed by [`Id`].
///
/// Slots are never removed, so every id handed out stays valid. A slot is
/// either defined or *pending* (reserved, waiting for [`Arena::define`]).
pub struct Arena<T> {
    slots: Vec<Option<T>>,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Creates an empty arena with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Stores `value` and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if the arena already holds `u32::MAX` slots. Use
    /// [`Arena::try_alloc`] to handle that case.
    pub fn alloc(&mut self, value: T) -> Id<T> {
        match self.try_alloc(value) {
            Ok(id) => id,
            Err(err) => panic!("{err}"),
        }
    }

    /// Stores `value` and returns its id, failing when indices run out.
    pub fn try_alloc(&mut self, value: T) -> Result<Id<T>, ArenaError> {
        let id = self.next_id()?;
        self.slots.push(Some(value));
        Ok(id)
    }

    /// Hands out an id whose value will be supplied later via
    /// [`Arena::define`].
    ///
    /// Until then [`Arena::get`] returns `None` for it.
    pub fn reserve(&mut self) -> Id<T> {
        match self.next_id() {
            Ok(id) => {
                self.slots.push(None);
                id
            }
            Err(err) => panic!("{err}"),
        }
    }

    /// Fills a reserved slot.
    pub fn define(&mut self, id: Id<T>, value: T) -> Result<(), ArenaError> {
        let len = self.slots.len();
        let slot = self.slots.get_mut(id.index()).ok_or(ArenaError::OutOfBounds {
            index: id.raw,
            len,
        })?;

        if slot.is_some() {
            return Err(ArenaError::AlreadyDefined { index: id.raw });
        }

        *slot = Some(value);
        Ok(())
    }

    /// Returns the value behind `id`, or `None` if the slot is pending or
    /// the id belongs to another arena.
    #[must_use]
    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable counterpart of [`Arena::get`].
    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Returns `true` if `id` names a slot in this arena that is still
    /// waiting for its value.
    #[must_use]
    pub fn is_pending(&self, id: Id<T>) -> bool {
        matches!(self.slots.get(id.index()), Some(None))
    }

    /// Number of slots, pending ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing was ever allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn next_id(&self) -> Result<Id<T>, ArenaError> {
        u32::try_from(self.slots.len())
            .ok()
            .filter(|&raw| raw != u32::MAX)
            .map(Id::from_raw)
            .ok_or(ArenaError::Exhausted)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().enumerate())
            .finish()
    }
}

impl<T> Index<Id<T>> for Arena<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics on pending slots and foreign ids.
    fn index(&self, id: Id<T>) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("arena slot {id:?} is pending or out of bounds"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_get() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");

        assert_ne!(a, b);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena[b], "b");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_reserve_then_define() {
        let mut arena: Arena<u32> = Arena::new();
        let id = arena.reserve();

        assert!(arena.is_pending(id));
        assert_eq!(arena.get(id), None);
        assert_eq!(arena.len(), 1);

        arena.define(id, 9).unwrap();
        assert!(!arena.is_pending(id));
        assert_eq!(arena[id], 9);
    }

    #[test]
    fn test_define_twice_fails() {
        let mut arena = Arena::new();
        let id = arena.alloc(1u8);
        assert_eq!(
            arena.define(id, 2),
            Err(ArenaError::AlreadyDefined { index: 0 })
        );
    }

    #[test]
    fn test_foreign_id() {
        let mut arena: Arena<u8> = Arena::new();
        let foreign = Id::from_raw(5);

        assert_eq!(arena.get(foreign), None);
        assert!(!arena.is_pending(foreign));
        assert_eq!(
            arena.define(foreign, 1),
            Err(ArenaError::OutOfBounds { index: 5, len: 0 })
        );
    }

    #[test]
    fn test_self_reference() {
        #[derive(Debug, PartialEq)]
        struct Node {
            next: Id<Node>,
        }

        let mut arena = Arena::new();
        let id = arena.reserve();
        arena.define(id, Node { next: id }).unwrap();

        assert_eq!(arena[arena[id].next].next, id);
    }

    #[test]
    fn test_id_is_copy_and_hashable() {
        use std::collections::HashSet;

        let a: Id<()> = Id::from_raw(1);
        let b = a;
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);

        assert_eq!(set.len(), 1);
        assert_eq!(format!("{a:?}"), "#1");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ArenaError::AlreadyDefined { index: 3 }.to_string(),
            "arena slot 3 is already defined"
        );
    }
}
