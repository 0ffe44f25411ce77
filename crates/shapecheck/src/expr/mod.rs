//! Type expressions.
//!
//! A [`TypeExpr`] is a node in an arena owned by the [`Store`](crate::Store).
//! Children are referenced by [`ExprId`], so recursive aliases are plain
//! graph cycles: reserve an id, build the children that point at it, then
//! define it.
//!
//! The set of forms is closed. Every consumer matches on [`TypeExpr`]
//! exhaustively, so adding a form is a compile error everywhere it matters.

mod build;
mod display;

pub use display::DisplayExpr;

use crate::value::{Builtins, ClassId, Op, OpSet, Value};
use shapecheck_mem::{Id, Symbol};
use std::fmt;

/// Handle to a type expression.
pub type ExprId = Id<TypeExpr>;

/// A type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Accepts everything.
    Any,

    /// `None` or the inner type.
    Nullable(ExprId),

    /// Any of the variants, tried in order.
    Sum(Vec<ExprId>),

    /// One of an explicit set of values, compared kind-exactly.
    Literal(Vec<Value>),

    /// A type variable: bound first, then constraints, else anything.
    BoundedVar {
        /// Variable name
        name: Symbol,
        /// Upper bound
        bound: Option<ExprId>,
        /// Value constraints
        constraints: Vec<ExprId>,
    },

    /// A structural interface.
    Capability {
        /// Which interface
        interface: Interface,
        /// Display name; the protocol name for custom protocols
        name: Symbol,
        /// Required operations
        ops: OpSet,
        /// Type arguments
        args: Vec<ExprId>,
        /// `Callable[..., R]`: `args` holds only the return type
        any_params: bool,
    },

    /// A concrete or abstract collection.
    Container {
        /// Collection kind
        kind: ContainerKind,
        /// Type arguments
        args: Vec<ExprId>,
        /// How `args` describe the contents
        arity: Arity,
    },

    /// A string-keyed mapping with a fixed key set.
    Record {
        /// Record name
        name: Symbol,
        /// Keys and their value types, in declaration order
        fields: Vec<(Symbol, ExprId)>,
        /// Whether every key is required and no extra key allowed
        total: bool,
    },

    /// A tuple subclass with named fields.
    TaggedTuple {
        /// The expected class, if any
        class: Option<ClassId>,
        /// Expected field names; empty accepts any layout
        fields: Vec<Symbol>,
    },

    /// A parameterized user class. Arguments are not inspected.
    Generic {
        /// The class
        base: ClassId,
        /// Type arguments
        args: Vec<ExprId>,
    },

    /// An unresolved name.
    Forward(Symbol),

    /// A value that is a class, optionally constrained by a target.
    TypeRef(Option<ExprId>),

    /// A compiled pattern or match result over `str` or `bytes`.
    Pattern {
        /// Pattern or match
        kind: PatternKind,
        /// Type of the designated attribute
        inner: Option<ExprId>,
    },

    /// A stream whose element type cannot be observed.
    Stream(StreamKind),

    /// A plain class.
    Raw(ClassId),

    /// `ClassVar[...]` or `Final[...]`.
    Qualified {
        /// The qualifier
        qualifier: Qualifier,
        /// The qualified type
        inner: Option<ExprId>,
    },

    /// A form with no runtime meaning.
    Unsupported(Symbol),
}

impl TypeExpr {
    /// The kind of this expression.
    pub fn kind(&self) -> Kind {
        match self {
            TypeExpr::Any => Kind::Any,
            TypeExpr::Nullable(_) => Kind::Nullable,
            TypeExpr::Sum(_) => Kind::Sum,
            TypeExpr::Literal(_) => Kind::Literal,
            TypeExpr::BoundedVar { .. } => Kind::BoundedVar,
            TypeExpr::Capability { .. } => Kind::Capability,
            TypeExpr::Container { .. } => Kind::Container,
            TypeExpr::Record { .. } => Kind::Record,
            TypeExpr::TaggedTuple { .. } => Kind::TaggedTuple,
            TypeExpr::Generic { .. } => Kind::Generic,
            TypeExpr::Forward(_) => Kind::ForwardReference,
            TypeExpr::TypeRef(_) => Kind::TypeRef,
            TypeExpr::Pattern { .. } => Kind::Pattern,
            TypeExpr::Stream(_) => Kind::Stream,
            TypeExpr::Raw(_) => Kind::Raw,
            TypeExpr::Qualified { .. } => Kind::Qualified,
            TypeExpr::Unsupported(_) => Kind::Unsupported,
        }
    }

    /// Child expressions, in argument-index order.
    ///
    /// A bounded variable lists its bound before its constraints.
    pub fn children(&self) -> Vec<ExprId> {
        match self {
            TypeExpr::Any
            | TypeExpr::Literal(_)
            | TypeExpr::TaggedTuple { .. }
            | TypeExpr::Forward(_)
            | TypeExpr::Stream(_)
            | TypeExpr::Raw(_)
            | TypeExpr::Unsupported(_) => Vec::new(),
            TypeExpr::Nullable(inner) => vec![*inner],
            TypeExpr::Sum(variants) => variants.clone(),
            TypeExpr::BoundedVar {
                bound, constraints, ..
            } => bound.iter().chain(constraints).copied().collect(),
            TypeExpr::Capability { args, .. }
            | TypeExpr::Container { args, .. }
            | TypeExpr::Generic { args, .. } => args.clone(),
            TypeExpr::Record { fields, .. } => fields.iter().map(|(_, id)| *id).collect(),
            TypeExpr::TypeRef(target) => target.iter().copied().collect(),
            TypeExpr::Pattern { inner, .. } | TypeExpr::Qualified { inner, .. } => {
                inner.iter().copied().collect()
            }
        }
    }
}

/// Classification of expression forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// [`TypeExpr::Any`]
    Any,
    /// [`TypeExpr::Nullable`]
    Nullable,
    /// [`TypeExpr::Sum`]
    Sum,
    /// [`TypeExpr::Literal`]
    Literal,
    /// [`TypeExpr::BoundedVar`]
    BoundedVar,
    /// [`TypeExpr::Capability`]
    Capability,
    /// [`TypeExpr::Container`]
    Container,
    /// [`TypeExpr::Record`]
    Record,
    /// [`TypeExpr::TaggedTuple`]
    TaggedTuple,
    /// [`TypeExpr::Generic`]
    Generic,
    /// [`TypeExpr::Forward`]
    ForwardReference,
    /// [`TypeExpr::TypeRef`]
    TypeRef,
    /// [`TypeExpr::Pattern`]
    Pattern,
    /// [`TypeExpr::Stream`]
    Stream,
    /// [`TypeExpr::Raw`]
    Raw,
    /// [`TypeExpr::Qualified`]
    Qualified,
    /// [`TypeExpr::Unsupported`]
    Unsupported,
}

impl Kind {
    /// Number of kinds.
    pub const COUNT: usize = 17;

    /// Every kind, in declaration order.
    pub const ALL: [Kind; Kind::COUNT] = [
        Kind::Any,
        Kind::Nullable,
        Kind::Sum,
        Kind::Literal,
        Kind::BoundedVar,
        Kind::Capability,
        Kind::Container,
        Kind::Record,
        Kind::TaggedTuple,
        Kind::Generic,
        Kind::ForwardReference,
        Kind::TypeRef,
        Kind::Pattern,
        Kind::Stream,
        Kind::Raw,
        Kind::Qualified,
        Kind::Unsupported,
    ];

    /// The kind's name.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Any => "Any",
            Kind::Nullable => "Nullable",
            Kind::Sum => "Sum",
            Kind::Literal => "Literal",
            Kind::BoundedVar => "BoundedVar",
            Kind::Capability => "Capability",
            Kind::Container => "Container",
            Kind::Record => "Record",
            Kind::TaggedTuple => "TaggedTuple",
            Kind::Generic => "Generic",
            Kind::ForwardReference => "ForwardReference",
            Kind::TypeRef => "TypeRef",
            Kind::Pattern => "Pattern",
            Kind::Stream => "Stream",
            Kind::Raw => "Raw",
            Kind::Qualified => "Qualified",
            Kind::Unsupported => "Unsupported",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a container's arguments describe its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// One element type for every item (or key/value pair for mappings).
    Homogeneous,
    /// One type per position, exact length.
    Fixed,
    /// Positional prefix, then the last argument repeated.
    Variadic,
    /// The empty tuple `Tuple[()]`.
    Empty,
}

/// The shape a container kind's arguments take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Tuples: positional arguments.
    Ordered,
    /// One element type.
    Homogeneous,
    /// Key and value types.
    Keyed,
}

/// Collection kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ContainerKind {
    List,
    Tuple,
    Deque,
    Set,
    FrozenSet,
    Dict,
    DefaultDict,
    OrderedDict,
    Counter,
    ChainMap,
    Sequence,
    MutableSequence,
    Mapping,
    MutableMapping,
    AbstractSet,
    MutableSet,
}

impl ContainerKind {
    /// Every kind, in declaration order.
    pub const ALL: [ContainerKind; 16] = [
        ContainerKind::List,
        ContainerKind::Tuple,
        ContainerKind::Deque,
        ContainerKind::Set,
        ContainerKind::FrozenSet,
        ContainerKind::Dict,
        ContainerKind::DefaultDict,
        ContainerKind::OrderedDict,
        ContainerKind::Counter,
        ContainerKind::ChainMap,
        ContainerKind::Sequence,
        ContainerKind::MutableSequence,
        ContainerKind::Mapping,
        ContainerKind::MutableMapping,
        ContainerKind::AbstractSet,
        ContainerKind::MutableSet,
    ];

    /// The annotation name, e.g. `List`.
    pub const fn name(self) -> &'static str {
        match self {
            ContainerKind::List => "List",
            ContainerKind::Tuple => "Tuple",
            ContainerKind::Deque => "Deque",
            ContainerKind::Set => "Set",
            ContainerKind::FrozenSet => "FrozenSet",
            ContainerKind::Dict => "Dict",
            ContainerKind::DefaultDict => "DefaultDict",
            ContainerKind::OrderedDict => "OrderedDict",
            ContainerKind::Counter => "Counter",
            ContainerKind::ChainMap => "ChainMap",
            ContainerKind::Sequence => "Sequence",
            ContainerKind::MutableSequence => "MutableSequence",
            ContainerKind::Mapping => "Mapping",
            ContainerKind::MutableMapping => "MutableMapping",
            ContainerKind::AbstractSet => "AbstractSet",
            ContainerKind::MutableSet => "MutableSet",
        }
    }

    /// Looks a kind up by annotation name.
    pub fn from_name(name: &str) -> Option<ContainerKind> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// The class a value must be an instance of.
    pub fn origin(self, b: &Builtins) -> ClassId {
        match self {
            ContainerKind::List => b.list,
            ContainerKind::Tuple => b.tuple,
            ContainerKind::Deque => b.deque,
            ContainerKind::Set => b.set,
            ContainerKind::FrozenSet => b.frozenset,
            ContainerKind::Dict => b.dict,
            ContainerKind::DefaultDict => b.default_dict,
            ContainerKind::OrderedDict => b.ordered_dict,
            ContainerKind::Counter => b.counter,
            ContainerKind::ChainMap => b.chain_map,
            ContainerKind::Sequence => b.sequence,
            ContainerKind::MutableSequence => b.mutable_sequence,
            ContainerKind::Mapping => b.mapping,
            ContainerKind::MutableMapping => b.mutable_mapping,
            ContainerKind::AbstractSet => b.abstract_set,
            ContainerKind::MutableSet => b.mutable_set,
        }
    }

    /// How this kind's arguments are laid out.
    pub const fn layout(self) -> Layout {
        match self {
            ContainerKind::Tuple => Layout::Ordered,
            ContainerKind::Dict
            | ContainerKind::DefaultDict
            | ContainerKind::OrderedDict
            | ContainerKind::ChainMap
            | ContainerKind::Mapping
            | ContainerKind::MutableMapping => Layout::Keyed,
            _ => Layout::Homogeneous,
        }
    }

    /// Number of arguments a parameterized non-tuple form takes.
    ///
    /// `Counter` is keyed but only names its key type.
    pub const fn params(self) -> usize {
        match (self, self.layout()) {
            (ContainerKind::Counter, _) => 1,
            (_, Layout::Keyed) => 2,
            _ => 1,
        }
    }
}

/// Structural interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Interface {
    Awaitable,
    Coroutine,
    Callable,
    ContextManager,
    AsyncContextManager,
    Generator,
    AsyncGenerator,
    Hashable,
    Iterable,
    AsyncIterable,
    Iterator,
    AsyncIterator,
    Reversible,
    Sized,
    Container,
    Collection,
    SupportsAbs,
    SupportsBytes,
    SupportsComplex,
    SupportsFloat,
    SupportsIndex,
    SupportsInt,
    SupportsRound,
    /// A user-declared protocol; its ops are carried on the expression.
    Protocol,
}

/// Which element a capability check inspects for its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Content is never inspected.
    None,
    /// The first element.
    First,
    /// The last element.
    Last,
}

impl Interface {
    /// Every builtin interface, in declaration order.
    pub const ALL: [Interface; 24] = [
        Interface::Awaitable,
        Interface::Coroutine,
        Interface::Callable,
        Interface::ContextManager,
        Interface::AsyncContextManager,
        Interface::Generator,
        Interface::AsyncGenerator,
        Interface::Hashable,
        Interface::Iterable,
        Interface::AsyncIterable,
        Interface::Iterator,
        Interface::AsyncIterator,
        Interface::Reversible,
        Interface::Sized,
        Interface::Container,
        Interface::Collection,
        Interface::SupportsAbs,
        Interface::SupportsBytes,
        Interface::SupportsComplex,
        Interface::SupportsFloat,
        Interface::SupportsIndex,
        Interface::SupportsInt,
        Interface::SupportsRound,
        Interface::Protocol,
    ];

    /// The annotation name, e.g. `Iterable`.
    pub const fn name(self) -> &'static str {
        match self {
            Interface::Awaitable => "Awaitable",
            Interface::Coroutine => "Coroutine",
            Interface::Callable => "Callable",
            Interface::ContextManager => "ContextManager",
            Interface::AsyncContextManager => "AsyncContextManager",
            Interface::Generator => "Generator",
            Interface::AsyncGenerator => "AsyncGenerator",
            Interface::Hashable => "Hashable",
            Interface::Iterable => "Iterable",
            Interface::AsyncIterable => "AsyncIterable",
            Interface::Iterator => "Iterator",
            Interface::AsyncIterator => "AsyncIterator",
            Interface::Reversible => "Reversible",
            Interface::Sized => "Sized",
            Interface::Container => "Container",
            Interface::Collection => "Collection",
            Interface::SupportsAbs => "SupportsAbs",
            Interface::SupportsBytes => "SupportsBytes",
            Interface::SupportsComplex => "SupportsComplex",
            Interface::SupportsFloat => "SupportsFloat",
            Interface::SupportsIndex => "SupportsIndex",
            Interface::SupportsInt => "SupportsInt",
            Interface::SupportsRound => "SupportsRound",
            Interface::Protocol => "Protocol",
        }
    }

    /// Looks an interface up by annotation name.
    pub fn from_name(name: &str) -> Option<Interface> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }

    /// Operations a value must support. Empty for [`Interface::Protocol`].
    pub const fn ops(self) -> OpSet {
        match self {
            Interface::Awaitable => OpSet::of(&[Op::Await]),
            Interface::Coroutine => OpSet::of(&[Op::Await, Op::Send, Op::Throw]),
            Interface::Callable => OpSet::of(&[Op::Call]),
            Interface::ContextManager => OpSet::of(&[Op::Enter, Op::Exit]),
            Interface::AsyncContextManager => OpSet::of(&[Op::AEnter, Op::AExit]),
            Interface::Generator => OpSet::of(&[Op::Iter, Op::Next, Op::Send, Op::Throw]),
            Interface::AsyncGenerator => OpSet::of(&[Op::AIter, Op::ANext, Op::Send, Op::Throw]),
            Interface::Hashable => OpSet::of(&[Op::Hash]),
            Interface::Iterable => OpSet::of(&[Op::Iter]),
            Interface::AsyncIterable => OpSet::of(&[Op::AIter]),
            Interface::Iterator => OpSet::of(&[Op::Iter, Op::Next]),
            Interface::AsyncIterator => OpSet::of(&[Op::AIter, Op::ANext]),
            Interface::Reversible => OpSet::of(&[Op::Iter, Op::Reversed]),
            Interface::Sized => OpSet::of(&[Op::Len]),
            Interface::Container => OpSet::of(&[Op::Contains]),
            Interface::Collection => OpSet::of(&[Op::Iter, Op::Len, Op::Contains]),
            Interface::SupportsAbs => OpSet::of(&[Op::Abs]),
            Interface::SupportsBytes => OpSet::of(&[Op::Bytes]),
            Interface::SupportsComplex => OpSet::of(&[Op::Complex]),
            Interface::SupportsFloat => OpSet::of(&[Op::Float]),
            Interface::SupportsIndex => OpSet::of(&[Op::Index]),
            Interface::SupportsInt => OpSet::of(&[Op::Int]),
            Interface::SupportsRound => OpSet::of(&[Op::Round]),
            Interface::Protocol => OpSet::EMPTY,
        }
    }

    /// Which element is checked against the first argument.
    pub const fn probe(self) -> Probe {
        match self {
            Interface::Iterable
            | Interface::Collection
            | Interface::Iterator
            | Interface::Generator => Probe::First,
            Interface::Reversible => Probe::Last,
            _ => Probe::None,
        }
    }

    /// Maximum number of type arguments; `None` when unbounded.
    pub const fn max_args(self) -> Option<usize> {
        match self {
            Interface::Callable | Interface::Protocol => None,
            Interface::Generator | Interface::Coroutine => Some(3),
            Interface::AsyncGenerator => Some(2),
            Interface::Hashable
            | Interface::Sized
            | Interface::SupportsBytes
            | Interface::SupportsComplex
            | Interface::SupportsFloat
            | Interface::SupportsIndex
            | Interface::SupportsInt => Some(0),
            _ => Some(1),
        }
    }

    /// Whether content inspection is on unless configured otherwise.
    ///
    /// Inspecting a one-shot iterator would consume it, so iterator-like
    /// and asynchronous interfaces start disabled.
    pub const fn default_introspect(self) -> bool {
        !matches!(
            self,
            Interface::Iterator
                | Interface::Generator
                | Interface::AsyncGenerator
                | Interface::AsyncIterable
                | Interface::AsyncIterator
                | Interface::Awaitable
                | Interface::Coroutine
        )
    }
}

/// Pattern-like kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// A compiled pattern; designated attribute `pattern`
    Pattern,
    /// A match result; designated attribute `string`
    Match,
}

impl PatternKind {
    /// The annotation name.
    pub const fn name(self) -> &'static str {
        match self {
            PatternKind::Pattern => "Pattern",
            PatternKind::Match => "Match",
        }
    }

    /// The class a value must be an instance of.
    pub fn origin(self, b: &Builtins) -> ClassId {
        match self {
            PatternKind::Pattern => b.pattern,
            PatternKind::Match => b.match_,
        }
    }

    /// Name of the attribute the inner type applies to.
    pub const fn attribute(self) -> &'static str {
        match self {
            PatternKind::Pattern => "pattern",
            PatternKind::Match => "string",
        }
    }
}

/// Stream kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// `IO`
    Io,
    /// `TextIO`
    Text,
    /// `BinaryIO`
    Binary,
}

impl StreamKind {
    /// The annotation name.
    pub const fn name(self) -> &'static str {
        match self {
            StreamKind::Io => "IO",
            StreamKind::Text => "TextIO",
            StreamKind::Binary => "BinaryIO",
        }
    }

    /// The class a value must be an instance of.
    pub fn origin(self, b: &Builtins) -> ClassId {
        match self {
            StreamKind::Io => b.io,
            StreamKind::Text => b.text_io,
            StreamKind::Binary => b.binary_io,
        }
    }
}

/// Annotation qualifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// `ClassVar`
    ClassVar,
    /// `Final`
    Final,
}

impl Qualifier {
    /// The annotation name.
    pub const fn name(self) -> &'static str {
        match self {
            Qualifier::ClassVar => "ClassVar",
            Qualifier::Final => "Final",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn test_kind_table_is_complete() {
        for (i, kind) in Kind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }

    #[test]
    fn test_children_order() {
        let var = TypeExpr::BoundedVar {
            name: shapecheck_mem::Symbol::new(0),
            bound: Some(Id::from_raw(1)),
            constraints: vec![Id::from_raw(2), Id::from_raw(3)],
        };
        assert_eq!(
            var.children(),
            vec![Id::from_raw(1), Id::from_raw(2), Id::from_raw(3)]
        );
        assert!(TypeExpr::Any.children().is_empty());
        assert_eq!(TypeExpr::TypeRef(None).children(), Vec::new());
    }

    #[test]
    fn test_container_layouts() {
        assert_eq!(ContainerKind::Tuple.layout(), Layout::Ordered);
        assert_eq!(ContainerKind::Dict.layout(), Layout::Keyed);
        assert_eq!(ContainerKind::Dict.params(), 2);
        assert_eq!(ContainerKind::Counter.params(), 1);
        assert_eq!(ContainerKind::List.params(), 1);
        assert_eq!(ContainerKind::from_name("ChainMap"), Some(ContainerKind::ChainMap));
    }

    #[test]
    fn test_origins_match_builtins() {
        let store = Store::new();
        let b = store.builtins();
        assert_eq!(ContainerKind::DefaultDict.origin(b), b.default_dict);
        assert_eq!(StreamKind::Text.origin(b), b.text_io);
        assert_eq!(PatternKind::Match.origin(b), b.match_);
    }

    #[test]
    fn test_interfaces() {
        assert_eq!(Interface::from_name("Sized"), Some(Interface::Sized));
        assert_eq!(Interface::Reversible.probe(), Probe::Last);
        assert_eq!(Interface::Callable.probe(), Probe::None);
        assert!(!Interface::Iterator.default_introspect());
        assert!(Interface::Iterable.default_introspect());
        assert_eq!(Interface::Sized.max_args(), Some(0));
        assert!(Interface::Iterator.ops().contains(Op::Next));
    }
}
