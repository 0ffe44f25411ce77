//! Failure traces and caller-visible outcomes.
//!
//! The evaluator records a failure as a [`Mismatch`]: the breadcrumb path
//! to the failing node, the node, the offending value and a structured
//! [`Reason`]. [`finish`] turns that into an [`Outcome`] or an error
//! according to the report policy, and [`Store::render`] produces the
//! human-readable message.

use crate::config::ReportPolicy;
use crate::error::{CheckError, Defect, Result};
use crate::expr::{ExprId, Kind, TypeExpr};
use crate::store::Store;
use crate::value::{ClassId, OpSet, Value};
use std::fmt;

/// Where inside a container value a step descended.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// A positional item
    Index(usize),
    /// A mapping key
    Key(Value),
}

/// One breadcrumb: which argument of which kind of node was entered.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Kind of the parent node
    pub kind: Kind,
    /// Argument index within the parent
    pub arg: usize,
    /// Element of the value that was descended into, if any
    pub at: Option<Location>,
}

impl Step {
    /// A step into an argument without descending into the value.
    pub fn arg(kind: Kind, arg: usize) -> Self {
        Self {
            kind,
            arg,
            at: None,
        }
    }

    /// A step into an argument and an element of the value.
    pub fn at(kind: Kind, arg: usize, at: Location) -> Self {
        Self {
            kind,
            arg,
            at: Some(at),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.arg)?;
        match &self.at {
            Some(Location::Index(i)) => write!(f, "[{i}]"),
            Some(Location::Key(Value::Str(s))) => write!(f, "['{s}']"),
            Some(Location::Key(_)) => write!(f, "[<key>]"),
            None => Ok(()),
        }
    }
}

/// Renders a breadcrumb path, e.g. `Sum#1 / Container#0[2]`.
pub fn render_path(path: &[Step]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(Step::to_string)
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Why a value did not conform.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    /// Not an instance of the expected class.
    NotInstance {
        /// The class the value should be an instance of
        expected: ClassId,
    },
    /// No variant of a sum matched.
    NoVariant,
    /// Not one of a literal's values.
    NotLiteral,
    /// No constraint of a type variable matched.
    NoConstraint,
    /// Required structural operations are missing.
    MissingOps {
        /// The unsupported operations
        missing: OpSet,
    },
    /// A callable's arity does not match.
    Signature {
        /// Parameters the annotation declares
        expected: usize,
        /// Parameters the callable takes
        found: usize,
    },
    /// A fixed-size tuple has the wrong length.
    ArityMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        found: usize,
    },
    /// A variadic tuple is shorter than its prefix.
    TooShort {
        /// Minimum length
        min: usize,
        /// Actual length
        found: usize,
    },
    /// A record was matched against something that is not a dict.
    NotMapping,
    /// Required record keys are absent.
    MissingKeys {
        /// The absent keys, in declaration order
        keys: Vec<String>,
    },
    /// Keys not declared by the record.
    ExtraKeys {
        /// The undeclared keys
        keys: Vec<Value>,
    },
    /// Not a tagged tuple, or its fields do not reconstruct it.
    NotTaggedTuple,
    /// A tagged tuple with different field names.
    FieldLayout {
        /// Expected field names
        expected: Vec<String>,
        /// Actual field names
        found: Vec<String>,
    },
    /// A type reference was matched against something that is not a class.
    NotAType,
    /// A class outside the type reference's target.
    NotSubclass,
}

/// A structured failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Breadcrumbs from the root to the failing node
    pub path: Vec<Step>,
    /// The failing node
    pub expr: ExprId,
    /// The offending value
    pub value: Value,
    /// Why it failed
    pub reason: Reason,
}

/// Notes attached to an outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A defective node was treated as passing under `ErrorPolicy::Warn`.
    Ignored {
        /// Path to the node
        path: Vec<Step>,
        /// The node
        expr: ExprId,
        /// What was wrong with it
        defect: Defect,
    },
    /// A stream passed on class alone; its element type was not observed.
    Provisional {
        /// Path to the node
        path: Vec<Step>,
        /// The node
        expr: ExprId,
    },
}

/// The result of a conformance check under `ReportPolicy::Return`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The value conforms.
    Pass {
        /// Notes collected along the way
        diagnostics: Vec<Diagnostic>,
    },
    /// The value does not conform.
    Fail {
        /// The deepest failure
        mismatch: Box<Mismatch>,
        /// Notes collected on the way to the failure
        diagnostics: Vec<Diagnostic>,
    },
}

impl Outcome {
    /// Returns `true` if the value conforms.
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass { .. })
    }

    /// Returns the failure, if any.
    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            Outcome::Fail { mismatch, .. } => Some(mismatch),
            Outcome::Pass { .. } => None,
        }
    }

    /// Returns the diagnostics, whether the value conformed or not.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Outcome::Pass { diagnostics } | Outcome::Fail { diagnostics, .. } => diagnostics,
        }
    }
}

/// Applies the report policy to an outcome.
pub fn finish(store: &Store, outcome: Outcome, policy: ReportPolicy) -> Result<Outcome> {
    match (policy, outcome) {
        (ReportPolicy::Raise, Outcome::Fail { mismatch, .. }) => Err(CheckError::Mismatch {
            message: store.render(&mismatch),
            mismatch,
        }),
        (_, outcome) => Ok(outcome),
    }
}

impl Store {
    /// Renders a mismatch as a one-line message.
    pub fn render(&self, m: &Mismatch) -> String {
        let value = self.repr(&m.value);
        let expr = self.display_expr(m.expr);
        let mut message = match &m.reason {
            Reason::NotInstance { expected } => {
                format!("{value} is not {}", self.class_name(*expected))
            }
            Reason::NoVariant => {
                format!("{value} does not match any type specification from {expr}")
            }
            Reason::NotLiteral => format!("{value} does not match any value from {expr}"),
            Reason::NoConstraint => {
                let constraints = match self.expr(m.expr) {
                    Some(TypeExpr::BoundedVar { constraints, .. }) => constraints
                        .iter()
                        .map(|c| self.display_expr(*c).to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    _ => String::new(),
                };
                format!("{value} does not match any constraint of {expr} ({constraints})")
            }
            Reason::MissingOps { missing } => {
                format!("{value} is not {expr}: missing {missing}")
            }
            Reason::Signature { expected, found } => format!(
                "{value} takes {found} arguments, {expr} expects {expected}"
            ),
            Reason::ArityMismatch { expected, found } => format!(
                "tuple signature mismatch: required {expected} items, got {found}"
            ),
            Reason::TooShort { min, found } => format!(
                "tuple signature mismatch: required at least {min} items, got {found}"
            ),
            Reason::NotMapping => format!("{value} is not a dict ({expr})"),
            Reason::MissingKeys { keys } => {
                format!("{expr} layout mismatch: missing keys ({})", keys.join(", "))
            }
            Reason::ExtraKeys { keys } => {
                let keys: Vec<String> = keys.iter().map(|k| self.repr(k)).collect();
                format!("{expr} layout mismatch: extra keys ({})", keys.join(", "))
            }
            Reason::NotTaggedTuple => format!("{value} is not {expr}"),
            Reason::FieldLayout { expected, found } => format!(
                "{expr} field mismatch: expected ({}), got ({})",
                expected.join(", "),
                found.join(", ")
            ),
            Reason::NotAType => format!("{value} is not a type"),
            Reason::NotSubclass => {
                let target = match self.expr(m.expr) {
                    Some(TypeExpr::TypeRef(Some(target))) => {
                        self.display_expr(*target).to_string()
                    }
                    _ => expr.to_string(),
                };
                format!("{value} is not a subclass of {target}")
            }
        };

        if !m.path.is_empty() {
            message.push_str(" (at ");
            message.push_str(&render_path(&m.path));
            message.push(')');
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch(expr: ExprId, value: Value, reason: Reason) -> Mismatch {
        Mismatch {
            path: Vec::new(),
            expr,
            value,
            reason,
        }
    }

    #[test]
    fn test_path_rendering() {
        let path = vec![
            Step::arg(Kind::Sum, 1),
            Step::at(Kind::Container, 0, Location::Index(2)),
            Step::at(Kind::Record, 0, Location::Key(Value::str("b"))),
        ];
        assert_eq!(
            render_path(&path),
            "Sum#1 / Container#0[2] / Record#0['b']"
        );
        assert_eq!(render_path(&[]), "<root>");
    }

    #[test]
    fn test_render_messages() {
        let mut store = Store::new();
        let b = *store.builtins();
        let int = store.raw(b.int);
        let literal = store.literal(vec![Value::Int(1), Value::Int(3)]);
        let tuple = store.tuple_of(vec![int, int]);

        let m = mismatch(int, Value::str("a"), Reason::NotInstance { expected: b.int });
        assert_eq!(store.render(&m), "'a' is not int");

        let m = mismatch(literal, Value::Int(2), Reason::NotLiteral);
        assert_eq!(store.render(&m), "2 does not match any value from Literal[1, 3]");

        let m = mismatch(
            tuple,
            Value::None,
            Reason::ArityMismatch {
                expected: 2,
                found: 3,
            },
        );
        assert_eq!(
            store.render(&m),
            "tuple signature mismatch: required 2 items, got 3"
        );
    }

    #[test]
    fn test_render_record_and_path() {
        let mut store = Store::new();
        let int = store.builtins().int;
        let i = store.raw(int);
        let td = store.record("TD", &[("a", i), ("b", i)], true);

        let m = Mismatch {
            path: vec![Step::arg(Kind::Nullable, 0)],
            expr: td,
            value: Value::None,
            reason: Reason::MissingKeys {
                keys: vec!["b".to_string()],
            },
        };
        assert_eq!(
            store.render(&m),
            "TD layout mismatch: missing keys (b) (at Nullable#0)"
        );
    }

    #[test]
    fn test_finish_policies() {
        let mut store = Store::new();
        let int = store.builtins().int;
        let i = store.raw(int);
        let failed = Outcome::Fail {
            mismatch: Box::new(mismatch(i, Value::None, Reason::NotInstance { expected: int })),
            diagnostics: Vec::new(),
        };

        let returned = finish(&store, failed.clone(), ReportPolicy::Return).unwrap();
        assert!(!returned.is_pass());
        assert!(returned.diagnostics().is_empty());

        let raised = finish(&store, failed, ReportPolicy::Raise).unwrap_err();
        assert_eq!(raised.to_string(), "None is not int");
        assert!(raised.mismatch().is_some());

        let passed = Outcome::Pass {
            diagnostics: Vec::new(),
        };
        assert!(finish(&store, passed, ReportPolicy::Raise).unwrap().is_pass());
    }
}
