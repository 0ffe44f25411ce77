//! Error types for `shapecheck`.
//!
//! Two failure classes never mix:
//!
//! - [`Defect`]: the type expression itself is malformed or unsupported.
//!   Governed by the error policy.
//! - [`Mismatch`]: a well-formed expression does not match the value.
//!   Governed by the report policy; surfaces here only as
//!   [`CheckError::Mismatch`] under `ReportPolicy::Raise`.

use crate::report::{Mismatch, Step, render_path};
use std::fmt;

/// An annotation defect detected by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    /// A forward reference survived resolution.
    ForwardReference {
        /// The referenced name
        name: String,
    },

    /// A form that cannot be checked at runtime.
    Unsupported {
        /// Description of the form
        form: String,
    },

    /// Wrong number of arguments for a form.
    ArgumentCount {
        /// Name of the form
        form: String,
        /// What the form accepts, e.g. `"2"` or `"at most 1"`
        expected: String,
        /// Number of arguments supplied
        found: usize,
    },

    /// A sum with no variants.
    EmptySum,

    /// A literal with no values.
    EmptyLiteral,

    /// `ClassVar` or `Final` without an inner type.
    BareQualifier {
        /// The qualifier name
        form: &'static str,
    },

    /// The target of a type reference does not describe classes.
    InvalidTypeTarget {
        /// Why the target was rejected
        reason: String,
    },

    /// An expression id that was reserved but never defined.
    Dangling {
        /// Raw arena index
        index: u32,
    },

    /// An expression id minted by a different store.
    Foreign {
        /// Raw arena index
        index: u32,
    },
}

impl Defect {
    /// Get a short description of this defect.
    pub fn description(&self) -> &'static str {
        match self {
            Defect::ForwardReference { .. } => "unresolved forward reference",
            Defect::Unsupported { .. } => "unsupported type specification",
            Defect::ArgumentCount { .. } => "wrong number of type arguments",
            Defect::EmptySum => "empty union",
            Defect::EmptyLiteral => "empty literal",
            Defect::BareQualifier { .. } => "bare qualifier",
            Defect::InvalidTypeTarget { .. } => "invalid type reference target",
            Defect::Dangling { .. } => "dangling type expression",
            Defect::Foreign { .. } => "foreign type expression",
        }
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defect::ForwardReference { name } => write!(
                f,
                "forward reference '{name}' is not allowed; annotations are expected to be resolved"
            ),
            Defect::Unsupported { form } => {
                write!(f, "{form} is not a valid type specification")
            }
            Defect::ArgumentCount {
                form,
                expected,
                found,
            } => write!(
                f,
                "wrong number of type arguments for {form}: expected {expected}, found {found}"
            ),
            Defect::EmptySum => write!(f, "Union requires at least one variant"),
            Defect::EmptyLiteral => write!(f, "Literal requires at least one value"),
            Defect::BareQualifier { form } => {
                write!(f, "bare {form} is invalid type specification")
            }
            Defect::InvalidTypeTarget { reason } => {
                write!(f, "invalid Type[...] target: {reason}")
            }
            Defect::Dangling { index } => {
                write!(f, "type expression #{index} was reserved but never defined")
            }
            Defect::Foreign { index } => {
                write!(f, "type expression #{index} does not belong to this store")
            }
        }
    }
}

/// Errors returned by a conformance check.
#[derive(Debug, Clone)]
pub enum CheckError {
    /// An annotation defect under `ErrorPolicy::Error`.
    Defect {
        /// What is wrong with the expression
        defect: Defect,
        /// Breadcrumb path to the defective node
        path: Vec<Step>,
    },

    /// A value mismatch under `ReportPolicy::Raise`.
    Mismatch {
        /// The rendered report
        message: String,
        /// The structured failure
        mismatch: Box<Mismatch>,
    },
}

impl CheckError {
    /// Returns the defect, if this is an annotation defect.
    pub fn defect(&self) -> Option<&Defect> {
        match self {
            CheckError::Defect { defect, .. } => Some(defect),
            CheckError::Mismatch { .. } => None,
        }
    }

    /// Returns the mismatch, if this is a raised value mismatch.
    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            CheckError::Mismatch { mismatch, .. } => Some(mismatch),
            CheckError::Defect { .. } => None,
        }
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Defect { defect, path } => {
                write!(f, "{defect}")?;
                if !path.is_empty() {
                    write!(f, " (at {})", render_path(path))?;
                }
                Ok(())
            }
            CheckError::Mismatch { message, .. } => f.write_str(message),
        }
    }
}

impl std::error::Error for CheckError {}

/// Errors raised while building values in a [`Store`](crate::Store).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The target is not a heap object of this store.
    NotAnObject,

    /// The object's layout does not support the operation.
    Layout {
        /// The layout the operation needs
        expected: &'static str,
    },

    /// A shape-building call failed inside the arena.
    Arena(shapecheck_mem::ArenaError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotAnObject => write!(f, "value is not a heap object of this store"),
            StoreError::Layout { expected } => write!(f, "object is not {expected}"),
            StoreError::Arena(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<shapecheck_mem::ArenaError> for StoreError {
    fn from(err: shapecheck_mem::ArenaError) -> Self {
        StoreError::Arena(err)
    }
}

/// Errors raised by the argument-check wrapper.
#[derive(Debug, Clone)]
pub enum ArgError {
    /// An allow-list name that the signature does not declare.
    UnknownParameter {
        /// Function name
        function: String,
        /// The unknown parameter
        name: String,
    },

    /// A selected parameter without an annotation.
    Unannotated {
        /// Parameter name
        param: String,
    },

    /// The resolver could not produce an expression for an annotation.
    Unresolved {
        /// Parameter name
        param: String,
        /// The declared annotation
        annotation: String,
    },

    /// A required argument was not supplied.
    Missing {
        /// Parameter name
        param: String,
    },

    /// More positional arguments than parameters.
    TooMany {
        /// Number of parameters
        expected: usize,
        /// Number of arguments
        found: usize,
    },

    /// The annotation is defective under `ErrorPolicy::Error`.
    Annotation {
        /// Parameter name
        param: String,
        /// The underlying defect
        source: CheckError,
    },

    /// The argument does not conform to its annotation.
    Type {
        /// Parameter name
        param: String,
        /// Summary of the expected type expression
        expected: String,
        /// Repr of the offending value
        value: String,
        /// Rendered mismatch report
        detail: String,
    },
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgError::UnknownParameter { function, name } => {
                write!(f, "non-existent argument name '{name}' for function '{function}'")
            }
            ArgError::Unannotated { param } => {
                write!(f, "argument '{param}': no annotation to check against")
            }
            ArgError::Unresolved { param, annotation } => {
                write!(f, "argument '{param}': cannot resolve annotation '{annotation}'")
            }
            ArgError::Missing { param } => {
                write!(f, "missing required argument '{param}'")
            }
            ArgError::TooMany { expected, found } => {
                write!(f, "takes {expected} arguments but {found} were given")
            }
            ArgError::Annotation { param, source } => {
                write!(f, "argument '{param}': {source}")
            }
            ArgError::Type { param, detail, .. } => {
                write!(f, "argument '{param}': {detail}")
            }
        }
    }
}

impl std::error::Error for ArgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArgError::Annotation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A result type for conformance checks.
pub type Result<T> = std::result::Result<T, CheckError>;
