//! Cycle guard for recursive evaluation.
//!
//! A `(value, expression)` pair that is already on the current recursion
//! path is treated as conforming when reached again. Pairs are removed when
//! their evaluation finishes, so sibling visits of the same pair are
//! evaluated normally.

use crate::expr::ExprId;
use crate::value::{Value, ValueKey};
use fxhash::FxHashSet;

/// Tracks the `(value, expression)` pairs under evaluation.
#[derive(Debug, Default)]
pub struct CycleGuard {
    active: FxHashSet<(ValueKey, ExprId)>,
}

/// Proof that a pair was entered; hand it back to [`CycleGuard::leave`].
#[derive(Debug)]
#[must_use = "a visit must be passed back to `CycleGuard::leave`"]
pub struct Visit((ValueKey, ExprId));

impl CycleGuard {
    /// Creates an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a pair as in flight.
    ///
    /// Returns `None` if the pair is already in flight, in which case the
    /// caller should report success without descending.
    pub fn enter(&mut self, value: &Value, expr: ExprId) -> Option<Visit> {
        let pair = (value.key(), expr);
        if self.active.contains(&pair) {
            return None;
        }
        self.active.insert(pair.clone());
        Some(Visit(pair))
    }

    /// Marks a pair as finished.
    pub fn leave(&mut self, visit: Visit) {
        self.active.remove(&visit.0);
    }

    /// Number of pairs in flight.
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Returns `true` if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapecheck_mem::Id;

    #[test]
    fn test_reentry_is_detected() {
        let mut guard = CycleGuard::new();
        let value = Value::Ref(Id::from_raw(0));
        let expr = Id::from_raw(3);

        let visit = guard.enter(&value, expr).unwrap();
        assert!(guard.enter(&value, expr).is_none());
        assert_eq!(guard.depth(), 1);

        guard.leave(visit);
        assert!(guard.is_empty());
        assert!(guard.enter(&value, expr).is_some());
    }

    #[test]
    fn test_pairs_are_distinct() {
        let mut guard = CycleGuard::new();
        let a = guard.enter(&Value::Int(1), Id::from_raw(0));
        let b = guard.enter(&Value::Int(1), Id::from_raw(1));
        let c = guard.enter(&Value::Bool(true), Id::from_raw(0));

        assert!(a.is_some() && b.is_some() && c.is_some());
        assert_eq!(guard.depth(), 3);
    }
}
