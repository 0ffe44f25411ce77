//! String interning with ID-based references.
//!
//! Class names, record field names, capability names and type-variable
//! names are interned once and compared as [`Symbol`]s afterwards. Record
//! checks look up mapping keys with [`Interner::get`], which never allocates.
//!
//! # Examples
//!
//! ```
//! use shapecheck_mem::Interner;
//!
//! let mut names = Interner::new();
//!
//! let a = names.intern("total");
//! let b = names.intern("total");
//! let c = names.intern("partial");
//!
//! assert_eq!(a, b);
//! assert_ne!(a, c);
//! assert_eq!(names.resolve(a), Some("total"));
//! assert_eq!(names.get("missing"), None);
//! ```

use hashbrown::HashMap;
use std::fmt;

/// A symbol representing an interned string.
///
/// Symbols are 32-bit identifiers and only meaningful for the interner that
/// produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Creates a symbol from a raw ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// String interner with bidirectional mapping.
///
/// - `strings`: Symbol ID to string
/// - `symbols`: string to Symbol ID
#[derive(Default, Clone)]
pub struct Interner {
    strings: Vec<Box<str>>,
    symbols: HashMap<Box<str>, Symbol>,
}

impl Interner {
    /// Creates an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a string, returning its Symbol.
    ///
    /// Re-interning returns the existing symbol without allocating.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.symbols.get(s) {
            return sym;
        }

        let sym = Symbol::new(self.strings.len() as u32);
        let owned: Box<str> = s.into();
        self.strings.push(owned.clone());
        self.symbols.insert(owned, sym);
        sym
    }

    /// Looks up a string without interning it.
    #[must_use]
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.symbols.get(s).copied()
    }

    /// Resolves a symbol back to its string.
    ///
    /// Returns `None` for symbols from another interner.
    #[must_use]
    pub fn resolve(&self, sym: Symbol) -> Option<&str> {
        self.strings.get(sym.0 as usize).map(|s| &**s)
    }

    /// Number of interned strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns `true` if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner")
            .field("len", &self.strings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes() {
        let mut names = Interner::new();
        let a = names.intern("field");
        let b = names.intern("field");

        assert_eq!(a, b);
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_symbols_are_sequential() {
        let mut names = Interner::new();
        assert_eq!(names.intern("a").as_u32(), 0);
        assert_eq!(names.intern("b").as_u32(), 1);
        assert_eq!(names.intern("a").as_u32(), 0);
    }

    #[test]
    fn test_resolve_roundtrip() {
        let mut names = Interner::new();
        let sym = names.intern("Point");
        assert_eq!(names.resolve(sym), Some("Point"));
        assert_eq!(names.resolve(Symbol::new(99)), None);
    }

    #[test]
    fn test_get_does_not_intern() {
        let mut names = Interner::new();
        assert!(names.is_empty());
        assert_eq!(names.get("x"), None);
        assert!(names.is_empty());

        let x = names.intern("x");
        assert_eq!(names.get("x"), Some(x));
    }

    #[test]
    fn test_empty_string() {
        let mut names = Interner::new();
        let sym = names.intern("");
        assert_eq!(names.resolve(sym), Some(""));
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(Symbol::new(42).to_string(), "Symbol(42)");
    }
}
