//! Argument checking for function calls.
//!
//! An [`ArgChecker`] is built once per function from its [`Signature`] and
//! an allow-list of parameter names. Each call binds positional arguments,
//! applies defaults and checks every selected parameter before the function
//! runs.
//!
//! ```
//! use shapecheck::args::{ArgChecker, Param, Signature};
//! use shapecheck::{Annotations, Config, Store, Value};
//!
//! let mut store = Store::new();
//! let int = store.builtins().int;
//! let int_expr = store.raw(int);
//! let annotations: Annotations = [("int", int_expr)].into_iter().collect();
//!
//! let signature = Signature::new("double", vec![Param::new("x").annotated("int")]);
//! let checker = ArgChecker::new(&mut store, signature, &[], &annotations, Config::default()).unwrap();
//!
//! let doubled = checker.call(&store, &[Value::Int(21)], |args| match args[0] {
//!     Value::Int(x) => x * 2,
//!     _ => unreachable!(),
//! });
//! assert_eq!(doubled.unwrap(), 42);
//! assert!(checker.check(&store, &[Value::str("21")]).is_err());
//! ```

use crate::config::Config;
use crate::error::{ArgError, CheckError};
use crate::eval::conforms;
use crate::expr::ExprId;
use crate::report::Outcome;
use crate::resolve::Resolve;
use crate::store::Store;
use crate::value::Value;
use shapecheck_log::debug;

/// A declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Declared annotation, resolved through a [`Resolve`]
    pub annotation: Option<String>,
    /// Default value
    pub default: Option<Value>,
}

impl Param {
    /// A parameter with no annotation and no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
        }
    }

    /// Sets the annotation.
    #[must_use]
    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A function signature: a name and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Function name
    pub name: String,
    /// Parameters, in order
    pub params: Vec<Param>,
}

impl Signature {
    /// Creates a signature.
    pub fn new(name: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// Splits a comma-separated list of names, dropping empty entries.
///
/// ```
/// assert_eq!(shapecheck::args::names("a, b,,c"), vec!["a", "b", "c"]);
/// ```
pub fn names(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// A parameter selected for checking.
#[derive(Debug, Clone)]
struct Check {
    index: usize,
    expr: ExprId,
}

/// Checks call arguments against a signature's annotations.
#[derive(Debug, Clone)]
pub struct ArgChecker {
    signature: Signature,
    checks: Vec<Check>,
    config: Config,
}

impl ArgChecker {
    /// Builds a checker.
    ///
    /// With an empty `allow` list, every annotated parameter without a
    /// default is checked. Named parameters are checked even when they have
    /// a default. A parameter whose default is `None` is checked against
    /// `Optional[annotation]`.
    pub fn new<R>(
        store: &mut Store,
        signature: Signature,
        allow: &[&str],
        resolver: &R,
        config: Config,
    ) -> Result<Self, ArgError>
    where
        R: Resolve + ?Sized,
    {
        let selected: Vec<usize> = if allow.is_empty() {
            signature
                .params
                .iter()
                .enumerate()
                .filter(|(_, p)| p.annotation.is_some() && p.default.is_none())
                .map(|(i, _)| i)
                .collect()
        } else {
            allow
                .iter()
                .map(|name| {
                    signature
                        .params
                        .iter()
                        .position(|p| p.name == *name)
                        .ok_or_else(|| ArgError::UnknownParameter {
                            function: signature.name.clone(),
                            name: name.to_string(),
                        })
                })
                .collect::<Result<_, _>>()?
        };

        let mut checks = Vec::with_capacity(selected.len());
        for index in selected {
            let param = &signature.params[index];
            let annotation = param
                .annotation
                .as_deref()
                .ok_or_else(|| ArgError::Unannotated {
                    param: param.name.clone(),
                })?;
            let mut expr = resolver
                .resolve(annotation)
                .ok_or_else(|| ArgError::Unresolved {
                    param: param.name.clone(),
                    annotation: annotation.to_string(),
                })?;
            if param.default.as_ref().is_some_and(Value::is_none) {
                expr = store.nullable(expr);
            }
            checks.push(Check { index, expr });
        }

        debug!(
            "checking {} of {} parameters of '{}'",
            checks.len(),
            signature.params.len(),
            signature.name
        );

        Ok(Self {
            signature,
            checks,
            config,
        })
    }

    /// The signature being checked.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Names of the checked parameters, in declaration order.
    pub fn checked(&self) -> impl Iterator<Item = &str> {
        self.checks
            .iter()
            .map(|c| self.signature.params[c.index].name.as_str())
    }

    /// Binds `args` and checks every selected parameter.
    pub fn check(&self, store: &Store, args: &[Value]) -> Result<(), ArgError> {
        let bound = self.bind(args)?;
        for check in &self.checks {
            let param = &self.signature.params[check.index];
            let value = &bound[check.index];
            let expected = || store.display_expr(check.expr).to_string();

            let detail = match conforms(store, value, check.expr, &self.config) {
                Ok(Outcome::Pass { .. }) => continue,
                Ok(Outcome::Fail { mismatch, .. }) => store.render(&mismatch),
                Err(CheckError::Mismatch { message, .. }) => message,
                Err(source @ CheckError::Defect { .. }) => {
                    return Err(ArgError::Annotation {
                        param: param.name.clone(),
                        source,
                    });
                }
            };
            return Err(ArgError::Type {
                param: param.name.clone(),
                expected: expected(),
                value: store.repr(value),
                detail,
            });
        }
        Ok(())
    }

    /// Checks `args`, then calls `f` with them.
    pub fn call<T>(
        &self,
        store: &Store,
        args: &[Value],
        f: impl FnOnce(&[Value]) -> T,
    ) -> Result<T, ArgError> {
        self.check(store, args)?;
        Ok(f(args))
    }

    /// Binds positional arguments and fills in defaults.
    fn bind(&self, args: &[Value]) -> Result<Vec<Value>, ArgError> {
        let params = &self.signature.params;
        if args.len() > params.len() {
            return Err(ArgError::TooMany {
                expected: params.len(),
                found: args.len(),
            });
        }

        params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                args.get(i)
                    .or(param.default.as_ref())
                    .cloned()
                    .ok_or_else(|| ArgError::Missing {
                        param: param.name.clone(),
                    })
            })
            .collect()
    }
}
