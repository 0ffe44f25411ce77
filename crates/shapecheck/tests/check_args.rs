// Argument checking through the function wrapper
//
// Builds checkers from signatures and annotation tables, then calls them
// with good and bad arguments.

#[cfg(test)]
mod check_args_tests {
    use shapecheck::args::names;
    use shapecheck::{
        Annotations, ArgChecker, ArgError, Config, Defect, Param, ReportPolicy, Signature, Store,
        Value,
    };

    fn setup() -> (Store, Annotations) {
        let mut store = Store::new();
        let b = *store.builtins();
        let int = store.raw(b.int);
        let str_ = store.raw(b.str);
        let ints = store.list_of(int);
        let fwd = store.forward("Later");
        let annotations = [("int", int), ("str", str_), ("List[int]", ints), ("Later", fwd)]
            .into_iter()
            .collect();
        (store, annotations)
    }

    /// A `None` default widens the annotation to a nullable
    #[test]
    fn test_none_default_widens() {
        let (mut store, annotations) = setup();
        let signature = Signature::new(
            "greet",
            vec![
                Param::new("name").annotated("str"),
                Param::new("title").annotated("str").with_default(Value::None),
            ],
        );
        let checker = ArgChecker::new(
            &mut store,
            signature,
            &names("name, title"),
            &annotations,
            Config::default(),
        )
        .unwrap();

        assert_eq!(checker.checked().collect::<Vec<_>>(), vec!["name", "title"]);
        assert!(checker.check(&store, &[Value::str("Ada")]).is_ok());
        assert!(checker.check(&store, &[Value::str("Ada"), Value::None]).is_ok());
        assert!(checker.check(&store, &[Value::str("Ada"), Value::str("Dr")]).is_ok());

        let err = checker
            .check(&store, &[Value::str("Ada"), Value::Int(1)])
            .unwrap_err();
        match err {
            ArgError::Type {
                param,
                expected,
                value,
                ..
            } => {
                assert_eq!(param, "title");
                assert_eq!(expected, "Optional[str]");
                assert_eq!(value, "1");
            }
            other => panic!("expected a type error, got {other:?}"),
        }
    }

    /// Unknown names are rejected when the checker is built
    #[test]
    fn test_unknown_name_rejected() {
        let (mut store, annotations) = setup();
        let signature = Signature::new("f", vec![Param::new("x").annotated("int")]);
        let err = ArgChecker::new(&mut store, signature, &["x", "y"], &annotations, Config::default())
            .unwrap_err();
        assert!(matches!(err, ArgError::UnknownParameter { ref name, .. } if name == "y"));
    }

    /// A named parameter needs an annotation that resolves
    #[test]
    fn test_unannotated_and_unresolved() {
        let (mut store, annotations) = setup();
        let signature = Signature::new(
            "f",
            vec![Param::new("x"), Param::new("y").annotated("Dict[str, int]")],
        );

        let err = ArgChecker::new(
            &mut store,
            signature.clone(),
            &["x"],
            &annotations,
            Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ArgError::Unannotated { .. }));

        let err = ArgChecker::new(&mut store, signature, &["y"], &annotations, Config::default())
            .unwrap_err();
        assert!(matches!(err, ArgError::Unresolved { ref annotation, .. } if annotation == "Dict[str, int]"));
    }

    /// The wrapped function only runs when every argument conforms
    #[test]
    fn test_call_runs_only_on_success() {
        let (mut store, annotations) = setup();
        let signature = Signature::new("total", vec![Param::new("xs").annotated("List[int]")]);
        let checker =
            ArgChecker::new(&mut store, signature, &[], &annotations, Config::default()).unwrap();

        let good = store.list(vec![Value::Int(1), Value::Int(2)]);
        let bad = store.list(vec![Value::Int(1), Value::str("2")]);

        let mut calls = 0;
        let result = checker.call(&store, &[good], |_| {
            calls += 1;
            3
        });
        assert_eq!(result.unwrap(), 3);

        let err = checker
            .call(&store, &[bad], |_| {
                calls += 1;
            })
            .unwrap_err();
        assert_eq!(calls, 1);
        assert_eq!(
            err.to_string(),
            "argument 'xs': '2' is not int (at Container#0[1])"
        );
    }

    /// The raise policy still produces a type error with the message
    #[test]
    fn test_raise_policy_maps_to_type_error() {
        let (mut store, annotations) = setup();
        let signature = Signature::new("f", vec![Param::new("x").annotated("int")]);
        let config = Config::default().with_report(ReportPolicy::Raise);
        let checker = ArgChecker::new(&mut store, signature, &[], &annotations, config).unwrap();

        let err = checker.check(&store, &[Value::str("a")]).unwrap_err();
        assert_eq!(err.to_string(), "argument 'x': 'a' is not int");
    }

    /// Defective annotations surface as annotation errors
    #[test]
    fn test_defective_annotation() {
        let (mut store, annotations) = setup();
        let signature = Signature::new("f", vec![Param::new("x").annotated("Later")]);
        let checker =
            ArgChecker::new(&mut store, signature, &[], &annotations, Config::default()).unwrap();

        match checker.check(&store, &[Value::Int(1)]).unwrap_err() {
            ArgError::Annotation { param, source } => {
                assert_eq!(param, "x");
                assert!(matches!(
                    source.defect(),
                    Some(Defect::ForwardReference { name }) if name == "Later"
                ));
            }
            other => panic!("expected an annotation error, got {other:?}"),
        }
    }

    /// Defaults fill in missing trailing arguments
    #[test]
    fn test_defaults_are_checked_when_named() {
        let (mut store, annotations) = setup();
        let signature = Signature::new(
            "f",
            vec![
                Param::new("a").annotated("int"),
                Param::new("b").annotated("int").with_default(Value::str("oops")),
            ],
        );
        let default_only =
            ArgChecker::new(&mut store, signature.clone(), &[], &annotations, Config::default())
                .unwrap();
        let named =
            ArgChecker::new(&mut store, signature, &["a", "b"], &annotations, Config::default())
                .unwrap();

        assert!(default_only.check(&store, &[Value::Int(1)]).is_ok());
        assert!(named.check(&store, &[Value::Int(1)]).is_err());
        assert!(named.check(&store, &[Value::Int(1), Value::Int(2)]).is_ok());
        assert_eq!(named.signature().params.len(), 2);
    }
}
