//! Property-style tests for the conformance engine.
//!
//! These sweep generated values and expressions through `conforms` and
//! check relations that must hold for every input: sums are disjunctions,
//! nullables add exactly `None`, checks are repeatable, and a shared store
//! can be checked from many threads at once.

use shapecheck::expr::{ContainerKind, Interface};
use shapecheck::{Config, ErrorPolicy, ExprId, Outcome, Store, Value, conforms};

fn passes(store: &Store, value: &Value, expr: ExprId, config: &Config) -> bool {
    conforms(store, value, expr, config)
        .map(|outcome| outcome.is_pass())
        .unwrap_or(false)
}

/// A spread of scalar and container values.
fn sample_values(store: &mut Store) -> Vec<Value> {
    let mut values = vec![
        Value::None,
        Value::Bool(true),
        Value::Int(0),
        Value::Int(i64::MIN),
        Value::Float(f64::NAN),
        Value::Float(-0.0),
        Value::str(""),
        Value::str("λ"),
        Value::bytes(b""),
        Value::bytes(&[0xff, 0x00]),
    ];
    let b = *store.builtins();
    values.push(Value::Class(b.int));
    values.push(Value::Class(b.none));

    let ints = store.list(vec![Value::Int(1), Value::Int(2)]);
    let mixed = store.list(vec![Value::Int(1), Value::str("x")]);
    let empty = store.list(Vec::new());
    let pair = store.tuple(vec![Value::Int(1), Value::str("a")]);
    let set = store.set(vec![Value::Int(3), Value::Int(3)]);
    let dict = store.dict(vec![(Value::str("a"), ints.clone())]);
    values.extend([ints, mixed, empty, pair, set, dict]);
    values
}

/// A spread of well-formed expressions.
fn sample_exprs(store: &mut Store) -> Vec<ExprId> {
    let b = *store.builtins();
    let int = store.raw(b.int);
    let str_ = store.raw(b.str);
    let float = store.raw(b.float);
    let none = store.raw(b.none);
    let any = store.any();
    let ints = store.list_of(int);
    let set = store.set_of(int);
    let dict = store.dict_of(str_, ints);
    let pair = store.tuple_of(vec![int, str_]);
    let tail = store.tuple_variadic(Vec::new(), int);
    let opt = store.nullable(str_);
    let sum = store.sum(vec![int, str_, ints]);
    let lit = store.literal(vec![Value::Int(0), Value::str("")]);
    let sized = store.capability(Interface::Sized, Vec::new());
    let iterable = store.capability(Interface::Iterable, vec![int]);
    let mapping = store.container(ContainerKind::Mapping, vec![str_, any]);
    let of_int = store.type_ref(Some(int));

    vec![
        int, str_, float, none, any, ints, set, dict, pair, tail, opt, sum, lit, sized, iterable,
        mapping, of_int,
    ]
}

// ============================================================================
// Algebraic properties
// ============================================================================

#[test]
fn test_sum_equals_any_variant() {
    let mut store = Store::new();
    let values = sample_values(&mut store);
    let exprs = sample_exprs(&mut store);
    let config = Config::default();

    for (i, &a) in exprs.iter().enumerate() {
        for &b in &exprs[i..] {
            let sum = store.sum(vec![a, b]);
            for value in &values {
                assert_eq!(
                    passes(&store, value, sum, &config),
                    passes(&store, value, a, &config) || passes(&store, value, b, &config),
                    "{} against {}",
                    store.repr(value),
                    store.display_expr(sum)
                );
            }
        }
    }
}

#[test]
fn test_nullable_adds_only_none() {
    let mut store = Store::new();
    let values = sample_values(&mut store);
    let exprs = sample_exprs(&mut store);
    let config = Config::default();

    for &expr in &exprs {
        let opt = store.nullable(expr);
        for value in &values {
            let expected = value.is_none() || passes(&store, value, expr, &config);
            assert_eq!(passes(&store, value, opt, &config), expected);
        }
    }
}

#[test]
fn test_any_accepts_all() {
    let mut store = Store::new();
    let values = sample_values(&mut store);
    let any = store.any();
    let opt_any = store.nullable(any);
    let config = Config::default();

    for value in &values {
        assert!(passes(&store, value, any, &config));
        assert!(passes(&store, value, opt_any, &config));
    }
}

#[test]
fn test_literal_membership_is_exact() {
    let mut store = Store::new();
    let lit = store.literal((1..=3).map(Value::Int).collect());
    let config = Config::default();

    for n in -5..10 {
        assert_eq!(
            passes(&store, &Value::Int(n), lit, &config),
            (1..=3).contains(&n)
        );
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_checks_are_repeatable() {
    let mut store = Store::new();
    let values = sample_values(&mut store);
    let exprs = sample_exprs(&mut store);
    let config = Config::default();

    for &expr in &exprs {
        for value in &values {
            let first = conforms(&store, value, expr, &config).unwrap();
            let second = conforms(&store, value, expr, &config).unwrap();
            // NaN values never compare equal, so compare everything else
            assert_eq!(first.is_pass(), second.is_pass());
            assert_eq!(
                first.mismatch().map(|m| (&m.path, m.expr, &m.reason)),
                second.mismatch().map(|m| (&m.path, m.expr, &m.reason))
            );
        }
    }
}

#[test]
fn test_policies_agree_on_well_formed_exprs() {
    let mut store = Store::new();
    let values = sample_values(&mut store);
    let exprs = sample_exprs(&mut store);
    let strict = Config::default();
    let lenient = Config::default().with_errors(ErrorPolicy::Skip);

    for &expr in &exprs {
        for value in &values {
            let a = conforms(&store, value, expr, &strict).unwrap();
            let b = conforms(&store, value, expr, &lenient).unwrap();
            assert_eq!(a.is_pass(), b.is_pass());
        }
    }
}

#[test]
fn test_long_homogeneous_list() {
    let mut store = Store::new();
    let int = store.builtins().int;
    let i = store.raw(int);
    let list = store.list_of(i);
    let config = Config::default();

    let mut items: Vec<Value> = (0..10_000).map(Value::Int).collect();
    let good = store.list(items.clone());
    items.push(Value::None);
    let bad = store.list(items);

    assert!(passes(&store, &good, list, &config));
    match conforms(&store, &bad, list, &config).unwrap() {
        Outcome::Fail { mismatch, .. } => assert_eq!(mismatch.value, Value::None),
        Outcome::Pass { .. } => panic!("expected failure"),
    }
}

#[test]
fn test_deeply_nested_lists() {
    let mut store = Store::new();
    let int = store.builtins().int;
    let mut expr = store.raw(int);
    let mut value = Value::Int(7);
    for _ in 0..200 {
        expr = store.list_of(expr);
        value = store.list(vec![value]);
    }
    assert!(passes(&store, &value, expr, &Config::default()));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_checks_share_store() {
    let mut store = Store::new();
    let values = sample_values(&mut store);
    let exprs = sample_exprs(&mut store);
    let config = Config::default();

    let expected: Vec<bool> = exprs
        .iter()
        .flat_map(|&e| values.iter().map(move |v| (e, v)))
        .map(|(e, v)| passes(&store, v, e, &config))
        .collect();

    let store = &store;
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    exprs
                        .iter()
                        .flat_map(|&e| values.iter().map(move |v| (e, v)))
                        .map(|(e, v)| passes(store, v, e, &config))
                        .collect::<Vec<bool>>()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
