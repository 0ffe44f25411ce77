//! The conformance evaluator.
//!
//! [`conforms`] walks a type expression and a value together. Each step
//! classifies the node, then either passes, degrades to an instance check,
//! reports a defect per the error policy, or runs the kind's algorithm.
//! Recursion goes through the cycle guard, and every descent pushes a
//! breadcrumb so a failure carries the path to the deepest failing node.

use crate::classify::{self, Action};
use crate::config::{Config, ErrorPolicy, ExtraKeys, Target};
use crate::error::{CheckError, Defect, Result};
use crate::expr::{Arity, ContainerKind, ExprId, Interface, Kind, Layout, Probe, TypeExpr};
use crate::guard::CycleGuard;
use crate::report::{self, Diagnostic, Location, Mismatch, Outcome, Reason, Step, render_path};
use crate::store::Store;
use crate::value::{ClassId, OpSet, Value};
use shapecheck_log::{debug, trace, warn};
use shapecheck_mem::Symbol;
use std::borrow::Cow;

/// Result of checking one node: `Err` carries the failure.
type Verdict = std::result::Result<(), Box<Mismatch>>;

const PASS: Result<Verdict> = Ok(Ok(()));

/// Checks whether `value` conforms to `expr`.
///
/// Under [`ErrorPolicy::Error`] the whole reachable expression is validated
/// first, so a defect fails the call even in a branch the value never
/// reaches. Under [`ReportPolicy::Raise`](crate::config::ReportPolicy) a
/// failure comes back as [`CheckError::Mismatch`].
pub fn conforms(store: &Store, value: &Value, expr: ExprId, config: &Config) -> Result<Outcome> {
    debug!(
        "checking {} against {}",
        store.repr(value),
        store.display_expr(expr)
    );

    if config.errors() == ErrorPolicy::Error {
        classify::validate(store, expr)?;
    }

    let mut evaluator = Evaluator::new(store, config);
    let outcome = match evaluator.check(value, expr)? {
        Ok(()) => Outcome::Pass {
            diagnostics: evaluator.diagnostics,
        },
        Err(mismatch) => Outcome::Fail {
            mismatch,
            diagnostics: evaluator.diagnostics,
        },
    };

    debug!(
        "{} for {}",
        if outcome.is_pass() { "pass" } else { "fail" },
        store.display_expr(expr)
    );
    report::finish(store, outcome, config.report())
}

/// Per-call evaluation state.
struct Evaluator<'s> {
    store: &'s Store,
    config: &'s Config,
    guard: CycleGuard,
    path: Vec<Step>,
    diagnostics: Vec<Diagnostic>,
}

impl<'s> Evaluator<'s> {
    fn new(store: &'s Store, config: &'s Config) -> Self {
        Self {
            store,
            config,
            guard: CycleGuard::new(),
            path: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Checks one `(value, expr)` pair through the cycle guard.
    fn check(&mut self, value: &Value, expr: ExprId) -> Result<Verdict> {
        let Some(visit) = self.guard.enter(value, expr) else {
            trace!("cycle at {}, assuming success", render_path(&self.path));
            return PASS;
        };
        let verdict = self.dispatch(value, expr);
        self.guard.leave(visit);
        verdict
    }

    /// Checks a child with a breadcrumb pushed.
    fn descend(&mut self, step: Step, value: &Value, expr: ExprId) -> Result<Verdict> {
        self.path.push(step);
        let verdict = self.check(value, expr);
        self.path.pop();
        verdict
    }

    fn fail(&self, value: &Value, expr: ExprId, reason: Reason) -> Result<Verdict> {
        Ok(Err(Box::new(Mismatch {
            path: self.path.clone(),
            expr,
            value: value.clone(),
            reason,
        })))
    }

    fn dispatch(&mut self, value: &Value, expr: ExprId) -> Result<Verdict> {
        let (_, action) = classify::classify(self.store, expr);
        match action {
            Action::Pass => PASS,
            Action::TreatAsType => self.check_origin(value, expr),
            Action::Error(defect) => self.on_defect(expr, defect),
            Action::Special => self.check_special(value, expr),
        }
    }

    fn on_defect(&mut self, expr: ExprId, defect: Defect) -> Result<Verdict> {
        match self.config.errors() {
            ErrorPolicy::Error => Err(CheckError::Defect {
                defect,
                path: self.path.clone(),
            }),
            ErrorPolicy::Warn => {
                warn!(
                    "ignoring {} at {}: {}",
                    defect.description(),
                    render_path(&self.path),
                    defect
                );
                self.diagnostics.push(Diagnostic::Ignored {
                    path: self.path.clone(),
                    expr,
                    defect,
                });
                PASS
            }
            ErrorPolicy::Skip => {
                debug!("skipping {} at {}", defect, render_path(&self.path));
                PASS
            }
        }
    }

    fn check_origin(&mut self, value: &Value, expr: ExprId) -> Result<Verdict> {
        match classify::origin(self.store, expr) {
            Some(class) => self.check_instance(value, expr, class),
            None => PASS,
        }
    }

    fn check_instance(&self, value: &Value, expr: ExprId, class: ClassId) -> Result<Verdict> {
        if self.store.is_instance(value, class) {
            PASS
        } else {
            self.fail(value, expr, Reason::NotInstance { expected: class })
        }
    }

    fn check_special(&mut self, value: &Value, expr: ExprId) -> Result<Verdict> {
        let store = self.store;
        let Some(node) = store.expr(expr) else {
            return self.on_defect(expr, classify::missing(store, expr));
        };

        match node {
            TypeExpr::Any => PASS,

            TypeExpr::Nullable(inner) => {
                if value.is_none() {
                    PASS
                } else {
                    self.descend(Step::arg(Kind::Nullable, 0), value, *inner)
                }
            }

            TypeExpr::Sum(variants) => {
                if self.any_passes(Kind::Sum, value, variants)? {
                    PASS
                } else {
                    self.fail(value, expr, Reason::NoVariant)
                }
            }

            TypeExpr::Literal(values) => {
                if values.iter().any(|v| v.literal_eq(value)) {
                    PASS
                } else {
                    self.fail(value, expr, Reason::NotLiteral)
                }
            }

            TypeExpr::BoundedVar {
                bound, constraints, ..
            } => self.check_var(value, expr, *bound, constraints),

            TypeExpr::Capability {
                interface,
                ops,
                args,
                any_params,
                ..
            } => {
                let arity = (*interface == Interface::Callable && !*any_params && !args.is_empty())
                    .then(|| args.len() - 1);
                self.check_capability(value, expr, *ops, arity, *interface, args)
            }

            TypeExpr::Container { kind, args, arity } => {
                self.check_container(value, expr, *kind, args, *arity)
            }

            TypeExpr::Record { fields, total, .. } => {
                self.check_record(value, expr, fields, *total)
            }

            TypeExpr::TaggedTuple { class, fields } => {
                self.check_tagged_tuple(value, expr, *class, fields)
            }

            TypeExpr::TypeRef(target) => self.check_type_ref(value, expr, *target),

            TypeExpr::Pattern { kind, inner } => {
                let class = kind.origin(store.builtins());
                if !store.is_instance(value, class) {
                    return self.fail(value, expr, Reason::NotInstance { expected: class });
                }
                let Some(inner) = inner else {
                    return PASS;
                };
                let attr = store
                    .names()
                    .get(kind.attribute())
                    .and_then(|name| store.attr(value, name));
                match attr {
                    Some(attr) => self.descend(Step::arg(Kind::Pattern, 0), attr, *inner),
                    None => self.fail(value, expr, Reason::NotInstance { expected: class }),
                }
            }

            TypeExpr::Stream(kind) => {
                let class = kind.origin(store.builtins());
                if !store.is_instance(value, class) {
                    return self.fail(value, expr, Reason::NotInstance { expected: class });
                }
                trace!(
                    "{} accepted on class alone at {}",
                    kind.name(),
                    render_path(&self.path)
                );
                self.diagnostics.push(Diagnostic::Provisional {
                    path: self.path.clone(),
                    expr,
                });
                PASS
            }

            TypeExpr::Qualified { inner, qualifier } => match inner {
                Some(inner) => self.descend(Step::arg(Kind::Qualified, 0), value, *inner),
                None => self.on_defect(
                    expr,
                    Defect::BareQualifier {
                        form: qualifier.name(),
                    },
                ),
            },

            TypeExpr::Generic { .. } | TypeExpr::Raw(_) => self.check_origin(value, expr),

            TypeExpr::Forward(name) => self.on_defect(
                expr,
                Defect::ForwardReference {
                    name: store.name(*name).to_string(),
                },
            ),

            TypeExpr::Unsupported(form) => self.on_defect(
                expr,
                Defect::Unsupported {
                    form: store.name(*form).to_string(),
                },
            ),
        }
    }

    fn check_var(
        &mut self,
        value: &Value,
        expr: ExprId,
        bound: Option<ExprId>,
        constraints: &[ExprId],
    ) -> Result<Verdict> {
        if let Some(bound) = bound {
            return self.descend(Step::arg(Kind::BoundedVar, 0), value, bound);
        }
        if constraints.is_empty() {
            return PASS;
        }
        if self.any_passes(Kind::BoundedVar, value, constraints)? {
            PASS
        } else {
            self.fail(value, expr, Reason::NoConstraint)
        }
    }

    /// Tries `options` in order and stops at the first that passes.
    ///
    /// On success only the passing option's diagnostics are kept. When all
    /// fail, every option's diagnostics stay for the failed outcome.
    fn any_passes(&mut self, kind: Kind, value: &Value, options: &[ExprId]) -> Result<bool> {
        let start = self.diagnostics.len();
        for (i, option) in options.iter().enumerate() {
            let mark = self.diagnostics.len();
            if self.descend(Step::arg(kind, i), value, *option)?.is_ok() {
                self.diagnostics.drain(start..mark);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn check_capability(
        &mut self,
        value: &Value,
        expr: ExprId,
        ops: OpSet,
        arity: Option<usize>,
        interface: Interface,
        args: &[ExprId],
    ) -> Result<Verdict> {
        let store = self.store;
        let missing = ops.difference(store.ops_of(value));
        if !missing.is_empty() {
            return self.fail(value, expr, Reason::MissingOps { missing });
        }

        if let Some(expected) = arity.filter(|_| self.config.signatures())
            && let Some(found) = store.arity_of(value)
            && found != expected
        {
            return self.fail(value, expr, Reason::Signature { expected, found });
        }

        let Some(&element) = args.first() else {
            return PASS;
        };
        if !self.config.introspects(Target::Interface(interface)) {
            return PASS;
        }
        let Some(mut elements) = store.elements(value) else {
            return PASS;
        };

        let probe = match interface.probe() {
            Probe::None => None,
            Probe::First => elements.next().map(|item| (0, item)),
            Probe::Last => {
                let len = elements.clone().count();
                elements.next_back().map(|item| (len - 1, item))
            }
        };

        // An empty source satisfies the probe vacuously.
        match probe {
            Some((index, item)) => self.descend(
                Step::at(Kind::Capability, 0, Location::Index(index)),
                &item,
                element,
            ),
            None => PASS,
        }
    }

    fn check_container(
        &mut self,
        value: &Value,
        expr: ExprId,
        kind: ContainerKind,
        args: &[ExprId],
        arity: Arity,
    ) -> Result<Verdict> {
        let store = self.store;
        let class = kind.origin(store.builtins());
        if !store.is_instance(value, class) {
            return self.fail(value, expr, Reason::NotInstance { expected: class });
        }
        if !self.config.introspects(Target::Container(kind)) {
            return PASS;
        }

        if kind.layout() == Layout::Keyed {
            let Some(entries) = store.entries(value) else {
                return PASS;
            };
            for (key, item) in entries {
                let verdict = self.descend(
                    Step::at(Kind::Container, 0, Location::Key(key.clone())),
                    key,
                    args[0],
                )?;
                if verdict.is_err() {
                    return Ok(verdict);
                }
                if let Some(&value_type) = args.get(1) {
                    let verdict = self.descend(
                        Step::at(Kind::Container, 1, Location::Key(key.clone())),
                        item,
                        value_type,
                    )?;
                    if verdict.is_err() {
                        return Ok(verdict);
                    }
                }
            }
            return PASS;
        }

        let Some(elements) = store.elements(value) else {
            return PASS;
        };

        match arity {
            Arity::Homogeneous => {
                for (i, item) in elements.enumerate() {
                    let verdict = self.descend(
                        Step::at(Kind::Container, 0, Location::Index(i)),
                        &item,
                        args[0],
                    )?;
                    if verdict.is_err() {
                        return Ok(verdict);
                    }
                }
                PASS
            }

            Arity::Fixed => {
                let items: Vec<Cow<'_, Value>> = elements.collect();
                if items.len() != args.len() {
                    return self.fail(
                        value,
                        expr,
                        Reason::ArityMismatch {
                            expected: args.len(),
                            found: items.len(),
                        },
                    );
                }
                self.check_positions(&items, |i| (i, args[i]))
            }

            Arity::Variadic => {
                if !self.config.ellipsis() {
                    return PASS;
                }
                let prefix = args.len() - 1;
                let items: Vec<Cow<'_, Value>> = elements.collect();
                if items.len() < prefix {
                    return self.fail(
                        value,
                        expr,
                        Reason::TooShort {
                            min: prefix,
                            found: items.len(),
                        },
                    );
                }
                self.check_positions(&items, |i| {
                    let arg = i.min(prefix);
                    (arg, args[arg])
                })
            }

            Arity::Empty => {
                if !self.config.ellipsis() {
                    return PASS;
                }
                match elements.count() {
                    0 => PASS,
                    found => self.fail(
                        value,
                        expr,
                        Reason::ArityMismatch { expected: 0, found },
                    ),
                }
            }
        }
    }

    /// Checks each item against the argument `arg_for(index)` picks.
    fn check_positions(
        &mut self,
        items: &[Cow<'_, Value>],
        arg_for: impl Fn(usize) -> (usize, ExprId),
    ) -> Result<Verdict> {
        for (i, item) in items.iter().enumerate() {
            let (arg, expr) = arg_for(i);
            let verdict = self.descend(
                Step::at(Kind::Container, arg, Location::Index(i)),
                item,
                expr,
            )?;
            if verdict.is_err() {
                return Ok(verdict);
            }
        }
        PASS
    }

    fn check_record(
        &mut self,
        value: &Value,
        expr: ExprId,
        fields: &[(Symbol, ExprId)],
        total: bool,
    ) -> Result<Verdict> {
        let store = self.store;
        let entries = match store.entries(value) {
            Some(entries) if store.is_instance(value, store.builtins().dict) => entries,
            _ => return self.fail(value, expr, Reason::NotMapping),
        };

        let mut present = vec![None; fields.len()];
        let mut extra = Vec::new();
        for (i, (key, _)) in entries.iter().enumerate() {
            let slot = key
                .as_str()
                .and_then(|k| store.names().get(k))
                .and_then(|sym| fields.iter().position(|(name, _)| *name == sym));
            match slot {
                Some(pos) => present[pos] = Some(i),
                None => extra.push(key.clone()),
            }
        }

        let missing: Vec<String> = fields
            .iter()
            .zip(&present)
            .filter(|(_, slot)| slot.is_none())
            .map(|((name, _), _)| store.name(*name).to_string())
            .collect();
        if total && !missing.is_empty() {
            return self.fail(value, expr, Reason::MissingKeys { keys: missing });
        }
        if !extra.is_empty() && (total || self.config.extra_keys() == ExtraKeys::Reject) {
            return self.fail(value, expr, Reason::ExtraKeys { keys: extra });
        }

        for (pos, slot) in present.iter().enumerate() {
            let Some(i) = *slot else {
                continue;
            };
            let (key, item) = &entries[i];
            let verdict = self.descend(
                Step::at(Kind::Record, pos, Location::Key(key.clone())),
                item,
                fields[pos].1,
            )?;
            if verdict.is_err() {
                return Ok(verdict);
            }
        }
        PASS
    }

    fn check_tagged_tuple(
        &mut self,
        value: &Value,
        expr: ExprId,
        class: Option<ClassId>,
        fields: &[Symbol],
    ) -> Result<Verdict> {
        let store = self.store;
        let actual = store.class_of(value);
        if !store.classes().is_tagged_tuple(actual) {
            return self.fail(value, expr, Reason::NotTaggedTuple);
        }
        if let Some(expected) = class
            && !store.classes().is_subclass(actual, expected)
        {
            return self.fail(value, expr, Reason::NotInstance { expected });
        }

        let declared = store
            .classes()
            .get(actual)
            .map(|info| info.fields.as_slice())
            .unwrap_or_default();
        if !fields.is_empty() && fields != declared {
            let names = |syms: &[Symbol]| -> Vec<String> {
                syms.iter().map(|s| store.name(*s).to_string()).collect()
            };
            return self.fail(
                value,
                expr,
                Reason::FieldLayout {
                    expected: names(fields),
                    found: names(declared),
                },
            );
        }

        // Reading every field back must reproduce the items exactly.
        let Some(items) = store.items(value) else {
            return self.fail(value, expr, Reason::NotTaggedTuple);
        };
        let rebuilt: Option<Vec<&Value>> =
            declared.iter().map(|field| store.attr(value, *field)).collect();
        match rebuilt {
            Some(rebuilt)
                if rebuilt.len() == items.len()
                    && rebuilt.iter().zip(items).all(|(a, b)| a.key() == b.key()) =>
            {
                PASS
            }
            _ => self.fail(value, expr, Reason::NotTaggedTuple),
        }
    }

    fn check_type_ref(
        &mut self,
        value: &Value,
        expr: ExprId,
        target: Option<ExprId>,
    ) -> Result<Verdict> {
        let Value::Class(class) = value else {
            return self.fail(value, expr, Reason::NotAType);
        };
        let Some(target) = target else {
            return PASS;
        };

        let mut seen = Vec::new();
        if self.class_matches(*class, target, &mut seen) {
            PASS
        } else {
            self.fail(value, expr, Reason::NotSubclass)
        }
    }

    /// Returns `true` if `class` is within the classes `target` describes.
    fn class_matches(&self, class: ClassId, target: ExprId, seen: &mut Vec<ExprId>) -> bool {
        if seen.contains(&target) {
            return false;
        }
        seen.push(target);

        let store = self.store;
        let classes = store.classes();
        match store.expr(target) {
            Some(TypeExpr::Any) => true,
            Some(TypeExpr::Raw(base)) | Some(TypeExpr::Generic { base, .. }) => {
                classes.is_subclass(class, *base)
            }
            Some(TypeExpr::Container { kind, .. }) => {
                classes.is_subclass(class, kind.origin(store.builtins()))
            }
            Some(TypeExpr::Stream(kind)) => {
                classes.is_subclass(class, kind.origin(store.builtins()))
            }
            Some(TypeExpr::TaggedTuple { class: expected, .. }) => {
                classes.is_tagged_tuple(class)
                    && expected.is_none_or(|expected| classes.is_subclass(class, expected))
            }
            Some(TypeExpr::Nullable(inner)) => {
                class == store.builtins().none || self.class_matches(class, *inner, seen)
            }
            Some(TypeExpr::Sum(variants)) => variants
                .iter()
                .any(|v| self.class_matches(class, *v, seen)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportPolicy;
    use crate::expr::StreamKind;

    fn check(store: &Store, value: &Value, expr: ExprId) -> Outcome {
        conforms(store, value, expr, &Config::default()).unwrap()
    }

    #[test]
    fn test_raw_honors_subclassing() {
        let mut store = Store::new();
        let int = store.builtins().int;
        let i = store.raw(int);

        assert!(check(&store, &Value::Int(1), i).is_pass());
        assert!(check(&store, &Value::Bool(true), i).is_pass());
        assert!(!check(&store, &Value::str("1"), i).is_pass());
    }

    #[test]
    fn test_literal_is_kind_exact() {
        let mut store = Store::new();
        let lit = store.literal(vec![Value::Int(1)]);
        assert!(check(&store, &Value::Int(1), lit).is_pass());
        assert!(!check(&store, &Value::Bool(true), lit).is_pass());
    }

    #[test]
    fn test_failure_path_points_at_deepest_node() {
        let mut store = Store::new();
        let int = store.builtins().int;
        let i = store.raw(int);
        let inner = store.list_of(i);
        let outer = store.list_of(inner);

        let ok = store.list(vec![Value::Int(1)]);
        let bad = store.list(vec![Value::Int(2), Value::str("x")]);
        let value = store.list(vec![ok, bad]);

        let outcome = check(&store, &value, outer);
        let mismatch = outcome.mismatch().unwrap();
        assert_eq!(mismatch.expr, i);
        assert_eq!(mismatch.value, Value::str("x"));
        assert_eq!(
            mismatch.path,
            vec![
                Step::at(Kind::Container, 0, Location::Index(1)),
                Step::at(Kind::Container, 0, Location::Index(1)),
            ]
        );
    }

    #[test]
    fn test_stream_is_provisional() {
        let mut store = Store::new();
        let text = store.builtins().text_io;
        let stream = store.stream(StreamKind::Io);
        let file = store.opaque(text);

        let outcome = check(&store, &file, stream);
        assert!(outcome.is_pass());
        assert!(matches!(
            outcome.diagnostics(),
            [Diagnostic::Provisional { .. }]
        ));
    }

    #[test]
    fn test_raise_policy() {
        let mut store = Store::new();
        let int = store.builtins().int;
        let i = store.raw(int);
        let config = Config::default().with_report(ReportPolicy::Raise);

        let err = conforms(&store, &Value::str("a"), i, &config).unwrap_err();
        assert_eq!(err.to_string(), "'a' is not int");
        assert!(conforms(&store, &Value::Int(3), i, &config).is_ok());
    }

    #[test]
    fn test_type_ref() {
        let mut store = Store::new();
        let b = *store.builtins();
        let int = store.raw(b.int);
        let of_int = store.type_ref(Some(int));
        let any_type = store.type_ref(None);

        assert!(check(&store, &Value::Class(b.bool), of_int).is_pass());
        assert!(!check(&store, &Value::Class(b.str), of_int).is_pass());
        assert!(!check(&store, &Value::Int(1), any_type).is_pass());
        assert!(check(&store, &Value::Class(b.str), any_type).is_pass());
    }

    #[test]
    fn test_guard_is_empty_after_check() {
        let mut store = Store::new();
        let int = store.builtins().int;
        let i = store.raw(int);
        let list = store.list_of(i);
        let value = store.list(vec![Value::Int(1), Value::Int(2)]);
        let config = Config::default();

        let mut evaluator = Evaluator::new(&store, &config);
        assert!(evaluator.check(&value, list).unwrap().is_ok());
        assert!(evaluator.guard.is_empty());
        assert!(evaluator.path.is_empty());
    }
}
