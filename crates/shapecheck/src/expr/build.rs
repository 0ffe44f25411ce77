//! Expression builders.
//!
//! Expressions are only ever created through the [`Store`], which is what
//! makes every [`ExprId`] valid for the store that issued it.

use super::{Arity, ContainerKind, ExprId, Interface, PatternKind, Qualifier, StreamKind, TypeExpr};
use crate::error::StoreError;
use crate::store::Store;
use crate::value::{ClassId, OpSet, Value};

impl Store {
    /// Adds an expression node.
    pub fn add(&mut self, expr: TypeExpr) -> ExprId {
        self.exprs.alloc(expr)
    }

    /// Reserves an id for a node that will be defined later.
    ///
    /// Use with [`Store::define`] to build recursive expressions.
    pub fn reserve(&mut self) -> ExprId {
        self.exprs.reserve()
    }

    /// Defines a previously reserved node.
    pub fn define(&mut self, id: ExprId, expr: TypeExpr) -> Result<(), StoreError> {
        self.exprs.define(id, expr)?;
        Ok(())
    }

    /// `Any`
    pub fn any(&mut self) -> ExprId {
        self.add(TypeExpr::Any)
    }

    /// A plain class.
    pub fn raw(&mut self, class: ClassId) -> ExprId {
        self.add(TypeExpr::Raw(class))
    }

    /// `Optional[inner]`
    pub fn nullable(&mut self, inner: ExprId) -> ExprId {
        self.add(TypeExpr::Nullable(inner))
    }

    /// `Union[variants...]`
    pub fn sum(&mut self, variants: Vec<ExprId>) -> ExprId {
        self.add(TypeExpr::Sum(variants))
    }

    /// `Literal[values...]`
    pub fn literal(&mut self, values: Vec<Value>) -> ExprId {
        self.add(TypeExpr::Literal(values))
    }

    /// A type variable.
    pub fn var(
        &mut self,
        name: &str,
        bound: Option<ExprId>,
        constraints: Vec<ExprId>,
    ) -> ExprId {
        let name = self.intern(name);
        self.add(TypeExpr::BoundedVar {
            name,
            bound,
            constraints,
        })
    }

    /// A builtin interface such as `Iterable[int]` or `Callable[[int], str]`.
    ///
    /// For `Callable`, list the parameter types followed by the return type.
    pub fn capability(&mut self, interface: Interface, args: Vec<ExprId>) -> ExprId {
        let name = self.intern(interface.name());
        self.add(TypeExpr::Capability {
            interface,
            name,
            ops: interface.ops(),
            args,
            any_params: false,
        })
    }

    /// `Callable[[params...], ret]`, or `Callable[..., ret]` when `params`
    /// is `None`.
    pub fn callable(&mut self, params: Option<Vec<ExprId>>, ret: ExprId) -> ExprId {
        let interface = Interface::Callable;
        let name = self.intern(interface.name());
        let any_params = params.is_none();
        let mut args = params.unwrap_or_default();
        args.push(ret);
        self.add(TypeExpr::Capability {
            interface,
            name,
            ops: interface.ops(),
            args,
            any_params,
        })
    }

    /// A user protocol requiring `ops`.
    pub fn protocol(&mut self, name: &str, ops: OpSet) -> ExprId {
        let name = self.intern(name);
        self.add(TypeExpr::Capability {
            interface: Interface::Protocol,
            name,
            ops,
            args: Vec::new(),
            any_params: false,
        })
    }

    /// A container with homogeneous arguments; `Fixed` for tuples.
    ///
    /// An empty `args` list is the bare, unparameterized form.
    pub fn container(&mut self, kind: ContainerKind, args: Vec<ExprId>) -> ExprId {
        let arity = match kind {
            ContainerKind::Tuple => Arity::Fixed,
            _ => Arity::Homogeneous,
        };
        self.add(TypeExpr::Container { kind, args, arity })
    }

    /// `List[item]`
    pub fn list_of(&mut self, item: ExprId) -> ExprId {
        self.container(ContainerKind::List, vec![item])
    }

    /// `Set[item]`
    pub fn set_of(&mut self, item: ExprId) -> ExprId {
        self.container(ContainerKind::Set, vec![item])
    }

    /// `Dict[key, value]`
    pub fn dict_of(&mut self, key: ExprId, value: ExprId) -> ExprId {
        self.container(ContainerKind::Dict, vec![key, value])
    }

    /// `Tuple[items...]`, exact length.
    pub fn tuple_of(&mut self, items: Vec<ExprId>) -> ExprId {
        self.container(ContainerKind::Tuple, items)
    }

    /// `Tuple[prefix..., rest, ...]`
    pub fn tuple_variadic(&mut self, prefix: Vec<ExprId>, rest: ExprId) -> ExprId {
        let mut args = prefix;
        args.push(rest);
        self.add(TypeExpr::Container {
            kind: ContainerKind::Tuple,
            args,
            arity: Arity::Variadic,
        })
    }

    /// `Tuple[()]`
    pub fn empty_tuple(&mut self) -> ExprId {
        self.add(TypeExpr::Container {
            kind: ContainerKind::Tuple,
            args: Vec::new(),
            arity: Arity::Empty,
        })
    }

    /// A record with string keys.
    pub fn record(&mut self, name: &str, fields: &[(&str, ExprId)], total: bool) -> ExprId {
        let name = self.intern(name);
        let fields = fields
            .iter()
            .map(|(key, expr)| (self.intern(key), *expr))
            .collect();
        self.add(TypeExpr::Record {
            name,
            fields,
            total,
        })
    }

    /// A tagged tuple. With a class, its declared fields are expected; the
    /// bare form accepts any tagged tuple.
    pub fn tagged_tuple(&mut self, class: Option<ClassId>) -> ExprId {
        let fields = class
            .and_then(|c| self.classes.get(c))
            .map(|info| info.fields.clone())
            .unwrap_or_default();
        self.add(TypeExpr::TaggedTuple { class, fields })
    }

    /// A parameterized user class.
    pub fn generic(&mut self, base: ClassId, args: Vec<ExprId>) -> ExprId {
        self.add(TypeExpr::Generic { base, args })
    }

    /// An unresolved name.
    pub fn forward(&mut self, name: &str) -> ExprId {
        let name = self.intern(name);
        self.add(TypeExpr::Forward(name))
    }

    /// `Type[target]`, or bare `Type`.
    pub fn type_ref(&mut self, target: Option<ExprId>) -> ExprId {
        self.add(TypeExpr::TypeRef(target))
    }

    /// `Pattern[inner]` or `Match[inner]`.
    pub fn pattern_expr(&mut self, kind: PatternKind, inner: Option<ExprId>) -> ExprId {
        self.intern(kind.attribute());
        self.add(TypeExpr::Pattern { kind, inner })
    }

    /// `IO`, `TextIO` or `BinaryIO`.
    pub fn stream(&mut self, kind: StreamKind) -> ExprId {
        self.add(TypeExpr::Stream(kind))
    }

    /// `ClassVar[inner]` or `Final[inner]`.
    pub fn qualified(&mut self, qualifier: Qualifier, inner: Option<ExprId>) -> ExprId {
        self.add(TypeExpr::Qualified { qualifier, inner })
    }

    /// A form with no runtime meaning, e.g. `NoReturn`.
    pub fn unsupported(&mut self, form: &str) -> ExprId {
        let form = self.intern(form);
        self.add(TypeExpr::Unsupported(form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Kind;

    #[test]
    fn test_recursive_definition() {
        let mut store = Store::new();
        let int = store.builtins().int;

        let json = store.reserve();
        assert!(store.expr(json).is_none());

        let leaf = store.raw(int);
        let items = store.list_of(json);
        let body = TypeExpr::Sum(vec![leaf, items]);
        store.define(json, body).unwrap();

        assert_eq!(store.expr(json).map(TypeExpr::kind), Some(Kind::Sum));
        assert!(store.define(json, TypeExpr::Any).is_err());
    }

    #[test]
    fn test_tuple_arities() {
        let mut store = Store::new();
        let int = store.builtins().int;
        let i = store.raw(int);

        let fixed = store.tuple_of(vec![i, i]);
        let variadic = store.tuple_variadic(vec![i], i);
        let empty = store.empty_tuple();

        let arity = |id| match store.expr(id) {
            Some(TypeExpr::Container { arity, .. }) => Some(*arity),
            _ => None,
        };
        assert_eq!(arity(fixed), Some(Arity::Fixed));
        assert_eq!(arity(variadic), Some(Arity::Variadic));
        assert_eq!(arity(empty), Some(Arity::Empty));
    }

    #[test]
    fn test_tagged_tuple_copies_fields() {
        let mut store = Store::new();
        let point = store.define_tagged_class("Point", &["x", "y"]);
        let id = store.tagged_tuple(Some(point));
        let Some(TypeExpr::TaggedTuple { fields, .. }) = store.expr(id) else {
            panic!("expected a tagged tuple");
        };
        let names: Vec<&str> = fields.iter().map(|f| store.name(*f)).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_capability_carries_interface_ops() {
        let mut store = Store::new();
        let sized = store.capability(Interface::Sized, Vec::new());
        let Some(TypeExpr::Capability { ops, name, .. }) = store.expr(sized) else {
            panic!("expected a capability");
        };
        assert_eq!(*ops, Interface::Sized.ops());
        assert_eq!(store.name(*name), "Sized");
    }
}
