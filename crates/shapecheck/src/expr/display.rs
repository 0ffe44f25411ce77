//! Expression pretty-printing for reports and diagnostics.
//!
//! Expressions print in annotation syntax, e.g.
//! `Dict[str, Union[List[int], int]]`. Records and tagged tuples print by
//! name, and a node reached again through its own arguments prints as
//! `...`, so recursive aliases always terminate.

use super::{Arity, ExprId, Interface, TypeExpr};
use crate::store::Store;
use std::fmt;

/// A wrapper type for displaying expressions.
pub struct DisplayExpr<'a> {
    store: &'a Store,
    id: ExprId,
}

impl<'a> DisplayExpr<'a> {
    /// Create a new display wrapper for an expression.
    pub fn new(store: &'a Store, id: ExprId) -> Self {
        Self { store, id }
    }
}

impl Store {
    /// Displays an expression in annotation syntax.
    pub fn display_expr(&self, id: ExprId) -> DisplayExpr<'_> {
        DisplayExpr::new(self, id)
    }
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut visiting = Vec::new();
        self.format_expr(self.id, f, &mut visiting)
    }
}

impl DisplayExpr<'_> {
    fn format_expr(
        &self,
        id: ExprId,
        f: &mut fmt::Formatter<'_>,
        visiting: &mut Vec<ExprId>,
    ) -> fmt::Result {
        if visiting.contains(&id) {
            return write!(f, "...");
        }
        let Some(expr) = self.store.expr(id) else {
            return write!(f, "<undefined {id:?}>");
        };

        visiting.push(id);
        let result = self.format_node(expr, f, visiting);
        visiting.pop();
        result
    }

    fn format_node(
        &self,
        expr: &TypeExpr,
        f: &mut fmt::Formatter<'_>,
        visiting: &mut Vec<ExprId>,
    ) -> fmt::Result {
        let store = self.store;
        match expr {
            TypeExpr::Any => write!(f, "Any"),

            TypeExpr::Nullable(inner) => {
                write!(f, "Optional[")?;
                self.format_expr(*inner, f, visiting)?;
                write!(f, "]")
            }

            TypeExpr::Sum(variants) => self.format_generic("Union", variants, f, visiting),

            TypeExpr::Literal(values) => {
                write!(f, "Literal[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", store.repr(value))?;
                }
                write!(f, "]")
            }

            // Type variables print like their runtime repr: `~T`
            TypeExpr::BoundedVar { name, .. } => write!(f, "~{}", store.name(*name)),

            TypeExpr::Capability {
                interface: Interface::Callable,
                args,
                any_params: true,
                ..
            } => {
                write!(f, "Callable[..., ")?;
                self.format_list(args, f, visiting)?;
                write!(f, "]")
            }

            TypeExpr::Capability {
                interface: Interface::Callable,
                args,
                ..
            } if !args.is_empty() => {
                let (ret, params) = args.split_at(args.len() - 1);
                write!(f, "Callable[[")?;
                self.format_list(params, f, visiting)?;
                write!(f, "], ")?;
                self.format_list(ret, f, visiting)?;
                write!(f, "]")
            }

            TypeExpr::Capability { name, args, .. } => {
                self.format_generic(store.name(*name), args, f, visiting)
            }

            TypeExpr::Container { kind, args, arity } => match arity {
                Arity::Empty => write!(f, "{}[()]", kind.name()),
                Arity::Variadic => {
                    write!(f, "{}[", kind.name())?;
                    self.format_list(args, f, visiting)?;
                    write!(f, ", ...]")
                }
                Arity::Homogeneous | Arity::Fixed => {
                    self.format_generic(kind.name(), args, f, visiting)
                }
            },

            TypeExpr::Record { name, .. } => write!(f, "{}", store.name(*name)),

            TypeExpr::TaggedTuple { class, .. } => match class {
                Some(class) => write!(f, "{}", store.class_name(*class)),
                None => write!(f, "NamedTuple"),
            },

            TypeExpr::Generic { base, args } => {
                self.format_generic(store.class_name(*base), args, f, visiting)
            }

            TypeExpr::Forward(name) => write!(f, "ForwardRef('{}')", store.name(*name)),

            TypeExpr::TypeRef(target) => {
                write!(f, "Type")?;
                if let Some(target) = target {
                    write!(f, "[")?;
                    self.format_expr(*target, f, visiting)?;
                    write!(f, "]")?;
                }
                Ok(())
            }

            TypeExpr::Pattern { kind, inner } => {
                write!(f, "{}", kind.name())?;
                if let Some(inner) = inner {
                    write!(f, "[")?;
                    self.format_expr(*inner, f, visiting)?;
                    write!(f, "]")?;
                }
                Ok(())
            }

            TypeExpr::Stream(kind) => write!(f, "{}", kind.name()),

            TypeExpr::Raw(class) => write!(f, "{}", store.class_name(*class)),

            TypeExpr::Qualified { qualifier, inner } => {
                write!(f, "{}", qualifier.name())?;
                if let Some(inner) = inner {
                    write!(f, "[")?;
                    self.format_expr(*inner, f, visiting)?;
                    write!(f, "]")?;
                }
                Ok(())
            }

            TypeExpr::Unsupported(form) => write!(f, "{}", store.name(*form)),
        }
    }

    /// Format `Name[args...]`, or just `Name` without arguments.
    fn format_generic(
        &self,
        name: &str,
        args: &[ExprId],
        f: &mut fmt::Formatter<'_>,
        visiting: &mut Vec<ExprId>,
    ) -> fmt::Result {
        write!(f, "{name}")?;
        if !args.is_empty() {
            write!(f, "[")?;
            self.format_list(args, f, visiting)?;
            write!(f, "]")?;
        }
        Ok(())
    }

    fn format_list(
        &self,
        args: &[ExprId],
        f: &mut fmt::Formatter<'_>,
        visiting: &mut Vec<ExprId>,
    ) -> fmt::Result {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            self.format_expr(*arg, f, visiting)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Store;
    use crate::expr::{ContainerKind, Interface, PatternKind, Qualifier, TypeExpr};
    use crate::value::Value;

    #[test]
    fn test_nested_containers() {
        let mut store = Store::new();
        let b = *store.builtins();
        let int = store.raw(b.int);
        let str_ = store.raw(b.str);
        let list = store.list_of(int);
        let union = store.sum(vec![list, int]);
        let dict = store.dict_of(str_, union);

        assert_eq!(
            store.display_expr(dict).to_string(),
            "Dict[str, Union[List[int], int]]"
        );
    }

    #[test]
    fn test_tuple_forms() {
        let mut store = Store::new();
        let int = store.builtins().int;
        let i = store.raw(int);

        let fixed = store.tuple_of(vec![i, i]);
        let variadic = store.tuple_variadic(vec![], i);
        let empty = store.empty_tuple();
        let bare = store.container(ContainerKind::Tuple, vec![]);

        assert_eq!(store.display_expr(fixed).to_string(), "Tuple[int, int]");
        assert_eq!(store.display_expr(variadic).to_string(), "Tuple[int, ...]");
        assert_eq!(store.display_expr(empty).to_string(), "Tuple[()]");
        assert_eq!(store.display_expr(bare).to_string(), "Tuple");
    }

    #[test]
    fn test_special_forms() {
        let mut store = Store::new();
        let b = *store.builtins();
        let int = store.raw(b.int);
        let str_ = store.raw(b.str);

        let callable = store.capability(Interface::Callable, vec![int, str_]);
        let literal = store.literal(vec![Value::Int(1), Value::str("a")]);
        let var = store.var("T", None, vec![]);
        let fwd = store.forward("Node");
        let pattern = store.pattern_expr(PatternKind::Pattern, Some(str_));
        let classvar = store.qualified(Qualifier::ClassVar, Some(int));
        let optional = store.nullable(int);

        let any_args = store.callable(None, str_);
        let nullary = store.callable(Some(Vec::new()), int);

        assert_eq!(store.display_expr(callable).to_string(), "Callable[[int], str]");
        assert_eq!(store.display_expr(any_args).to_string(), "Callable[..., str]");
        assert_eq!(store.display_expr(nullary).to_string(), "Callable[[], int]");
        assert_eq!(store.display_expr(literal).to_string(), "Literal[1, 'a']");
        assert_eq!(store.display_expr(var).to_string(), "~T");
        assert_eq!(store.display_expr(fwd).to_string(), "ForwardRef('Node')");
        assert_eq!(store.display_expr(pattern).to_string(), "Pattern[str]");
        assert_eq!(store.display_expr(classvar).to_string(), "ClassVar[int]");
        assert_eq!(store.display_expr(optional).to_string(), "Optional[int]");
    }

    #[test]
    fn test_recursive_alias_terminates() {
        let mut store = Store::new();
        let int = store.builtins().int;
        let json = store.reserve();
        let leaf = store.raw(int);
        let items = store.list_of(json);
        store.define(json, TypeExpr::Sum(vec![leaf, items])).unwrap();

        assert_eq!(
            store.display_expr(json).to_string(),
            "Union[int, List[...]]"
        );
    }

    #[test]
    fn test_pending_node() {
        let mut store = Store::new();
        let pending = store.reserve();
        let rendered = store.display_expr(pending).to_string();
        assert!(rendered.starts_with("<undefined"));
    }
}
