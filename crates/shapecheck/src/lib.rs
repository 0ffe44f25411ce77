//! `shapecheck`: runtime conformance checking of values against type
//! expressions.
//!
//! This crate provides:
//! - A value model with nominal classes and structural operation sets
//! - A closed set of type expressions, stored in an arena so recursive
//!   aliases are plain graph cycles
//! - A classifier that decides, from the expression alone, whether a node
//!   passes, degrades to an instance check, runs a dedicated algorithm or is
//!   defective
//! - An evaluator with a cycle guard, breadcrumb paths and two independent
//!   policies: one for annotation defects, one for reporting mismatches
//! - An argument-check wrapper for function signatures
//!
//! # Example
//!
//! ```
//! use shapecheck::{conforms, Config, Store, Value};
//!
//! let mut store = Store::new();
//! let b = *store.builtins();
//!
//! // Dict[str, Union[List[int], int]]
//! let int = store.raw(b.int);
//! let str_ = store.raw(b.str);
//! let list = store.list_of(int);
//! let union = store.sum(vec![list, int]);
//! let expr = store.dict_of(str_, union);
//!
//! let items = store.list(vec![Value::Int(1), Value::Int(2)]);
//! let value = store.dict(vec![(Value::str("a"), items), (Value::str("b"), Value::Int(3))]);
//!
//! let outcome = conforms(&store, &value, expr, &Config::default()).unwrap();
//! assert!(outcome.is_pass());
//! ```

#![warn(missing_docs)]

pub mod args;
pub mod classify;
pub mod config;
pub mod error;
pub mod eval;
pub mod expr;
pub mod guard;
pub mod report;
pub mod resolve;
pub mod store;
pub mod value;

pub use args::{ArgChecker, Param, Signature};
pub use classify::{Action, classify, validate};
pub use config::{Config, ErrorPolicy, ExtraKeys, ReportPolicy, Target};
pub use error::{ArgError, CheckError, Defect, Result, StoreError};
pub use eval::conforms;
pub use expr::{ExprId, Kind, TypeExpr};
pub use report::{Diagnostic, Location, Mismatch, Outcome, Reason, Step};
pub use resolve::{Annotations, Resolve};
pub use store::{Elements, Store};
pub use value::{ClassId, Object, ObjectData, ObjectId, Op, OpSet, Value};
