//! Annotation resolution.
//!
//! The engine never parses annotations. A [`Resolve`] implementation maps
//! a declared annotation to a fully built expression; anything it cannot
//! resolve stays a forward reference and is reported as a defect.

use crate::expr::ExprId;
use fxhash::FxHashMap;

/// Turns declared annotations into expressions.
pub trait Resolve {
    /// Resolves an annotation, or returns `None` if it is unknown.
    fn resolve(&self, annotation: &str) -> Option<ExprId>;
}

impl<F> Resolve for F
where
    F: Fn(&str) -> Option<ExprId>,
{
    fn resolve(&self, annotation: &str) -> Option<ExprId> {
        self(annotation)
    }
}

/// A table of annotation names and their expressions.
#[derive(Debug, Default, Clone)]
pub struct Annotations {
    table: FxHashMap<String, ExprId>,
}

impl Annotations {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an annotation, returning the expression it replaced.
    pub fn insert(&mut self, annotation: impl Into<String>, expr: ExprId) -> Option<ExprId> {
        self.table.insert(annotation.into(), expr)
    }

    /// Number of registered annotations.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Resolve for Annotations {
    fn resolve(&self, annotation: &str) -> Option<ExprId> {
        self.table.get(annotation.trim()).copied()
    }
}

impl<S: Into<String>> FromIterator<(S, ExprId)> for Annotations {
    fn from_iter<I: IntoIterator<Item = (S, ExprId)>>(iter: I) -> Self {
        Self {
            table: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
