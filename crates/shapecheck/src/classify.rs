//! Classification of type expressions.
//!
//! [`classify`] maps an expression to its [`Kind`] and the [`Action`] the
//! evaluator takes. A static table gives the base action per kind; shape
//! rules then refine it. The result depends only on the expression, never
//! on a value.

use crate::error::{CheckError, Defect, Result};
use crate::expr::{Arity, ContainerKind, ExprId, Kind, Layout, TypeExpr};
use crate::report::Step;
use crate::store::Store;
use crate::value::ClassId;
use fxhash::FxHashSet;

/// What the evaluator does with an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Always succeeds.
    Pass,
    /// Degrades to an instance check against the expression's origin class.
    TreatAsType,
    /// Dispatches to the kind's dedicated algorithm.
    Special,
    /// The expression is defective.
    Error(Defect),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Base {
    Pass,
    TreatAsType,
    Special,
    Error,
}

/// Base action per kind, indexed by `Kind as usize`.
const TABLE: [(Kind, Base); Kind::COUNT] = [
    (Kind::Any, Base::Pass),
    (Kind::Nullable, Base::Special),
    (Kind::Sum, Base::Special),
    (Kind::Literal, Base::Special),
    (Kind::BoundedVar, Base::Special),
    (Kind::Capability, Base::Special),
    (Kind::Container, Base::Special),
    (Kind::Record, Base::Special),
    (Kind::TaggedTuple, Base::Special),
    (Kind::Generic, Base::TreatAsType),
    (Kind::ForwardReference, Base::Error),
    (Kind::TypeRef, Base::Special),
    (Kind::Pattern, Base::Special),
    (Kind::Stream, Base::Special),
    (Kind::Raw, Base::TreatAsType),
    (Kind::Qualified, Base::Special),
    (Kind::Unsupported, Base::Error),
];

/// The defect for an id `store` cannot resolve: [`Defect::Dangling`] when it
/// was reserved and never defined, [`Defect::Foreign`] otherwise.
pub fn missing(store: &Store, id: ExprId) -> Defect {
    let index = id.as_u32();
    if store.is_pending(id) {
        Defect::Dangling { index }
    } else {
        Defect::Foreign { index }
    }
}

/// Classifies an expression.
///
/// An id with no expression behind it classifies as [`missing`].
pub fn classify(store: &Store, id: ExprId) -> (Kind, Action) {
    let Some(expr) = store.expr(id) else {
        return (Kind::Unsupported, Action::Error(missing(store, id)));
    };

    let kind = expr.kind();
    let action = match TABLE[kind as usize].1 {
        Base::Pass => Action::Pass,
        Base::TreatAsType => Action::TreatAsType,
        Base::Error => Action::Error(defect_of(store, expr)),
        Base::Special => refine(store, expr),
    };
    (kind, action)
}

fn defect_of(store: &Store, expr: &TypeExpr) -> Defect {
    match expr {
        TypeExpr::Forward(name) => Defect::ForwardReference {
            name: store.name(*name).to_string(),
        },
        TypeExpr::Unsupported(form) => Defect::Unsupported {
            form: store.name(*form).to_string(),
        },
        other => Defect::Unsupported {
            form: other.kind().name().to_string(),
        },
    }
}

/// Shape rules for kinds whose base action is `Special`.
fn refine(store: &Store, expr: &TypeExpr) -> Action {
    match expr {
        TypeExpr::Sum(variants) if variants.is_empty() => Action::Error(Defect::EmptySum),
        TypeExpr::Literal(values) if values.is_empty() => Action::Error(Defect::EmptyLiteral),

        TypeExpr::BoundedVar {
            bound: None,
            constraints,
            ..
        } if constraints.is_empty() => Action::Pass,

        TypeExpr::Capability {
            interface, args, ..
        } => match interface.max_args() {
            Some(max) if args.len() > max => Action::Error(Defect::ArgumentCount {
                form: interface.name().to_string(),
                expected: format!("at most {max}"),
                found: args.len(),
            }),
            _ => Action::Special,
        },

        TypeExpr::Container { kind, args, arity } => container_shape(*kind, args.len(), *arity),

        TypeExpr::TypeRef(Some(target)) => {
            let mut seen = FxHashSet::default();
            match type_target_defect(store, *target, &mut seen) {
                Some(defect) => Action::Error(defect),
                None => Action::Special,
            }
        }

        TypeExpr::Pattern { inner: None, .. } => Action::TreatAsType,

        TypeExpr::Qualified {
            qualifier,
            inner: None,
        } => Action::Error(Defect::BareQualifier {
            form: qualifier.name(),
        }),

        _ => Action::Special,
    }
}

fn container_shape(kind: ContainerKind, count: usize, arity: Arity) -> Action {
    let wrong_count = |expected: String| {
        Action::Error(Defect::ArgumentCount {
            form: kind.name().to_string(),
            expected,
            found: count,
        })
    };

    match (kind.layout(), arity) {
        (Layout::Ordered, Arity::Empty) if count > 0 => wrong_count("0 for Tuple[()]".to_string()),
        (Layout::Ordered, Arity::Empty) => Action::Special,
        (Layout::Ordered, Arity::Variadic) if count == 0 => {
            wrong_count("at least 1 before ...".to_string())
        }
        (Layout::Ordered, Arity::Fixed | Arity::Homogeneous) if count == 0 => Action::TreatAsType,
        (Layout::Ordered, Arity::Homogeneous) => Action::Error(Defect::Unsupported {
            form: "Tuple without a fixed or variadic arity".to_string(),
        }),
        (Layout::Ordered, _) => Action::Special,

        (_, Arity::Homogeneous) if count == 0 => Action::TreatAsType,
        (_, Arity::Homogeneous) if count != kind.params() => {
            wrong_count(kind.params().to_string())
        }
        (_, Arity::Homogeneous) => Action::Special,
        (_, Arity::Fixed | Arity::Variadic | Arity::Empty) => Action::Error(Defect::Unsupported {
            form: format!("{} with a tuple arity", kind.name()),
        }),
    }
}

/// Checks that a `Type[...]` target describes classes.
fn type_target_defect(
    store: &Store,
    target: ExprId,
    seen: &mut FxHashSet<ExprId>,
) -> Option<Defect> {
    if !seen.insert(target) {
        return None;
    }
    let Some(expr) = store.expr(target) else {
        return Some(missing(store, target));
    };

    match expr {
        TypeExpr::Any
        | TypeExpr::Raw(_)
        | TypeExpr::Generic { .. }
        | TypeExpr::Container { .. }
        | TypeExpr::Stream(_)
        | TypeExpr::TaggedTuple { .. } => None,
        TypeExpr::Nullable(inner) => type_target_defect(store, *inner, seen),
        TypeExpr::Sum(variants) => variants
            .iter()
            .find_map(|v| type_target_defect(store, *v, seen)),
        TypeExpr::Record { name, .. } => Some(Defect::InvalidTypeTarget {
            reason: format!("{} does not support class checks", store.name(*name)),
        }),
        _ => Some(Defect::InvalidTypeTarget {
            reason: format!("{} does not describe classes", store.display_expr(target)),
        }),
    }
}

/// The class a `TreatAsType` expression checks against.
pub fn origin(store: &Store, id: ExprId) -> Option<ClassId> {
    let b = store.builtins();
    match store.expr(id)? {
        TypeExpr::Raw(class) => Some(*class),
        TypeExpr::Generic { base, .. } => Some(*base),
        TypeExpr::Container { kind, .. } => Some(kind.origin(b)),
        TypeExpr::Pattern { kind, .. } => Some(kind.origin(b)),
        TypeExpr::Stream(kind) => Some(kind.origin(b)),
        _ => None,
    }
}

/// Walks every node reachable from `root` once and returns the first
/// defect, with the path to it.
pub fn validate(store: &Store, root: ExprId) -> Result<()> {
    let mut seen = FxHashSet::default();
    let mut stack = vec![(root, Vec::<Step>::new())];

    while let Some((id, path)) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let (kind, action) = classify(store, id);
        if let Action::Error(defect) = action {
            return Err(CheckError::Defect { defect, path });
        }
        let Some(expr) = store.expr(id) else {
            continue;
        };

        // Reverse so the first child is checked first.
        for (arg, child) in expr.children().into_iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(Step::arg(kind, arg));
            stack.push((child, child_path));
        }
    }
    Ok(())
}
