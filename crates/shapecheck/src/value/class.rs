//! Class registry: nominal types with bases and structural operations.
//!
//! Every value has exactly one class. Raw, generic and container checks are
//! nominal (`is_subclass`), capability checks are structural (the class's
//! effective [`OpSet`]). A fixed set of builtin classes is registered when
//! the registry is created so container kinds, stream kinds and pattern
//! kinds have an origin to check against.

use super::ops::{Op, OpSet};
use shapecheck_mem::{Arena, Id, Interner, Symbol};

/// Handle to a registered class.
pub type ClassId = Id<ClassInfo>;

/// Information about a class definition.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Class name
    pub name: Symbol,
    /// Direct bases, in declaration order
    pub bases: Vec<ClassId>,
    /// Effective operations: declared ones plus everything inherited
    pub ops: OpSet,
    /// Ordered field names; non-empty only for tagged-tuple classes
    pub fields: Vec<Symbol>,
}

/// Ids of the classes every registry starts with.
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub struct Builtins {
    pub object: ClassId,
    pub none: ClassId,
    pub int: ClassId,
    pub bool: ClassId,
    pub float: ClassId,
    pub str: ClassId,
    pub bytes: ClassId,
    pub type_: ClassId,
    pub function: ClassId,

    pub sequence: ClassId,
    pub mutable_sequence: ClassId,
    pub mapping: ClassId,
    pub mutable_mapping: ClassId,
    pub abstract_set: ClassId,
    pub mutable_set: ClassId,

    pub list: ClassId,
    pub tuple: ClassId,
    pub deque: ClassId,
    pub set: ClassId,
    pub frozenset: ClassId,
    pub dict: ClassId,
    pub default_dict: ClassId,
    pub ordered_dict: ClassId,
    pub counter: ClassId,
    pub chain_map: ClassId,

    pub iterator: ClassId,
    pub generator: ClassId,
    pub coroutine: ClassId,

    pub pattern: ClassId,
    pub match_: ClassId,
    pub io: ClassId,
    pub text_io: ClassId,
    pub binary_io: ClassId,
}

/// Registry of all classes known to a [`Store`](crate::Store).
#[derive(Debug)]
pub struct ClassRegistry {
    classes: Arena<ClassInfo>,
    builtins: Builtins,
}

const NUMBER: OpSet = OpSet::of(&[Op::Hash, Op::Abs, Op::Float, Op::Int, Op::Round]);
const SEQUENCE: OpSet = OpSet::of(&[Op::Iter, Op::Len, Op::Contains, Op::GetItem, Op::Reversed]);
const MAPPING: OpSet = OpSet::of(&[
    Op::Iter,
    Op::Len,
    Op::Contains,
    Op::GetItem,
    Op::SetItem,
    Op::Keys,
    Op::Reversed,
]);
const SET: OpSet = OpSet::of(&[Op::Iter, Op::Len, Op::Contains]);
/// Mutable containers opt out of the `__hash__` every class gets from `object`.
const UNHASHABLE: OpSet = OpSet::of(&[Op::Hash]);

impl ClassRegistry {
    /// Creates a registry holding the builtin classes.
    pub fn new(names: &mut Interner) -> Self {
        let mut classes = Arena::with_capacity(64);
        let mut def = |name: &str, bases: &[ClassId], ops: OpSet, hidden: OpSet| {
            Self::insert(&mut classes, names.intern(name), bases, ops, hidden, Vec::new())
        };
        let keep = OpSet::EMPTY;

        let object = def("object", &[], OpSet::of(&[Op::Hash]), keep);
        let none = def("NoneType", &[object], OpSet::EMPTY, keep);
        let int = def("int", &[object], NUMBER.union(OpSet::of(&[Op::Index, Op::Complex])), keep);
        let bool = def("bool", &[int], OpSet::EMPTY, keep);
        let float = def("float", &[object], NUMBER.union(OpSet::of(&[Op::Complex])), keep);
        let type_ = def("type", &[object], OpSet::of(&[Op::Call]), keep);
        let function = def("function", &[object], OpSet::of(&[Op::Call]), keep);

        let sequence = def("Sequence", &[object], OpSet::EMPTY, keep);
        let mutable_sequence = def("MutableSequence", &[sequence], OpSet::EMPTY, UNHASHABLE);
        let mapping = def("Mapping", &[object], OpSet::EMPTY, UNHASHABLE);
        let mutable_mapping = def("MutableMapping", &[mapping], OpSet::EMPTY, keep);
        let abstract_set = def("AbstractSet", &[object], OpSet::EMPTY, UNHASHABLE);
        let mutable_set = def("MutableSet", &[abstract_set], OpSet::EMPTY, keep);

        let str = def("str", &[sequence], SEQUENCE, keep);
        let bytes = def("bytes", &[sequence], SEQUENCE.union(OpSet::of(&[Op::Bytes])), keep);

        let list = def(
            "list",
            &[mutable_sequence],
            SEQUENCE.union(OpSet::of(&[Op::SetItem, Op::Reversed])),
            keep,
        );
        let tuple = def("tuple", &[sequence], SEQUENCE, keep);
        let deque = def(
            "deque",
            &[mutable_sequence],
            SEQUENCE.union(OpSet::of(&[Op::SetItem, Op::Reversed])),
            keep,
        );
        let set = def("set", &[mutable_set], SET, keep);
        let frozenset = def("frozenset", &[abstract_set], SET.union(OpSet::of(&[Op::Hash])), keep);
        let dict = def("dict", &[mutable_mapping], MAPPING, keep);
        let default_dict = def("defaultdict", &[dict], OpSet::EMPTY, keep);
        let ordered_dict = def("OrderedDict", &[dict], OpSet::EMPTY, keep);
        let counter = def("Counter", &[dict], OpSet::EMPTY, keep);
        let chain_map = def("ChainMap", &[mutable_mapping], MAPPING, keep);

        let iterator = def("iterator", &[object], OpSet::of(&[Op::Iter, Op::Next]), keep);
        let generator = def("generator", &[iterator], OpSet::of(&[Op::Send, Op::Throw]), keep);
        let coroutine = def(
            "coroutine",
            &[object],
            OpSet::of(&[Op::Await, Op::Send, Op::Throw]),
            keep,
        );

        let pattern = def("Pattern", &[object], OpSet::EMPTY, keep);
        let match_ = def("Match", &[object], OpSet::of(&[Op::GetItem]), keep);
        let io = def(
            "IOBase",
            &[object],
            OpSet::of(&[Op::Iter, Op::Next, Op::Enter, Op::Exit, Op::Read, Op::Write]),
            keep,
        );
        let text_io = def("TextIOBase", &[io], OpSet::EMPTY, keep);
        let binary_io = def("BufferedIOBase", &[io], OpSet::EMPTY, keep);

        let builtins = Builtins {
            object,
            none,
            int,
            bool,
            float,
            str,
            bytes,
            type_,
            function,
            sequence,
            mutable_sequence,
            mapping,
            mutable_mapping,
            abstract_set,
            mutable_set,
            list,
            tuple,
            deque,
            set,
            frozenset,
            dict,
            default_dict,
            ordered_dict,
            counter,
            chain_map,
            iterator,
            generator,
            coroutine,
            pattern,
            match_,
            io,
            text_io,
            binary_io,
        };

        Self { classes, builtins }
    }

    fn insert(
        classes: &mut Arena<ClassInfo>,
        name: Symbol,
        bases: &[ClassId],
        declared: OpSet,
        hidden: OpSet,
        fields: Vec<Symbol>,
    ) -> ClassId {
        let inherited = bases
            .iter()
            .filter_map(|base| classes.get(*base))
            .fold(OpSet::EMPTY, |acc, info| acc.union(info.ops));

        classes.alloc(ClassInfo {
            name,
            bases: bases.to_vec(),
            ops: declared.union(inherited.difference(hidden)),
            fields,
        })
    }

    /// Registers a class. Its effective ops are `ops` plus every base's.
    ///
    /// A class inheriting from `list`, `dict` or another mutable container
    /// inherits the missing `__hash__` as well.
    ///
    /// Bases must already be registered, so inheritance is always acyclic.
    /// An empty `bases` list means `[object]`.
    pub fn define(&mut self, name: Symbol, bases: &[ClassId], ops: OpSet) -> ClassId {
        let object = [self.builtins.object];
        let bases = if bases.is_empty() { &object[..] } else { bases };
        Self::insert(&mut self.classes, name, bases, ops, OpSet::EMPTY, Vec::new())
    }

    /// Registers a tagged-tuple class derived directly from `tuple`.
    pub fn define_tagged(&mut self, name: Symbol, fields: Vec<Symbol>) -> ClassId {
        let tuple = self.builtins.tuple;
        Self::insert(&mut self.classes, name, &[tuple], OpSet::EMPTY, OpSet::EMPTY, fields)
    }

    /// Returns the builtin class ids.
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Looks up a class.
    pub fn get(&self, id: ClassId) -> Option<&ClassInfo> {
        self.classes.get(id)
    }

    /// Effective operations of a class; empty for foreign ids.
    pub fn ops(&self, id: ClassId) -> OpSet {
        self.get(id).map_or(OpSet::EMPTY, |info| info.ops)
    }

    /// Returns `true` if `class` is `ancestor` or inherits from it.
    pub fn is_subclass(&self, class: ClassId, ancestor: ClassId) -> bool {
        if class == ancestor {
            return true;
        }

        let mut stack = vec![class];
        while let Some(current) = stack.pop() {
            let Some(info) = self.get(current) else {
                continue;
            };
            for &base in &info.bases {
                if base == ancestor {
                    return true;
                }
                stack.push(base);
            }
        }
        false
    }

    /// Returns `true` if `class` derives directly and only from `tuple` and
    /// declares field names.
    pub fn is_tagged_tuple(&self, class: ClassId) -> bool {
        self.get(class).is_some_and(|info| {
            info.bases.as_slice() == [self.builtins.tuple] && !info.fields.is_empty()
        })
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always `false`: builtins are registered on creation.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (ClassRegistry, Interner) {
        let mut names = Interner::new();
        let classes = ClassRegistry::new(&mut names);
        (classes, names)
    }

    #[test]
    fn test_builtin_hierarchy() {
        let (classes, _) = registry();
        let b = *classes.builtins();

        assert!(classes.is_subclass(b.bool, b.int));
        assert!(!classes.is_subclass(b.int, b.bool));
        assert!(classes.is_subclass(b.list, b.sequence));
        assert!(classes.is_subclass(b.counter, b.mapping));
        assert!(classes.is_subclass(b.frozenset, b.abstract_set));
        assert!(!classes.is_subclass(b.frozenset, b.mutable_set));
        assert!(classes.is_subclass(b.text_io, b.io));
    }

    #[test]
    fn test_ops_are_inherited() {
        let (classes, _) = registry();
        let b = *classes.builtins();

        assert!(classes.ops(b.bool).contains(Op::Index));
        assert!(classes.ops(b.counter).contains(Op::Keys));
        assert!(classes.ops(b.generator).contains(Op::Next));
        assert!(!classes.ops(b.list).contains(Op::Hash));
    }

    #[test]
    fn test_hash_comes_from_object() {
        let (mut classes, mut names) = registry();
        let b = *classes.builtins();

        for hashable in [b.object, b.none, b.int, b.str, b.bytes, b.tuple, b.frozenset, b.type_] {
            assert!(classes.ops(hashable).contains(Op::Hash));
        }
        for unhashable in [b.list, b.deque, b.set, b.dict, b.counter, b.chain_map, b.mapping] {
            assert!(!classes.ops(unhashable).contains(Op::Hash));
        }

        let plain = classes.define(names.intern("Plain"), &[], OpSet::EMPTY);
        let bag = classes.define(names.intern("Bag"), &[b.list], OpSet::EMPTY);
        let keyed = classes.define(names.intern("Keyed"), &[b.dict], OpSet::of(&[Op::Hash]));
        assert!(classes.ops(plain).contains(Op::Hash));
        assert!(!classes.ops(bag).contains(Op::Hash));
        assert!(classes.ops(keyed).contains(Op::Hash));
    }

    #[test]
    fn test_define_user_class() {
        let (mut classes, mut names) = registry();
        let b = *classes.builtins();

        let base = classes.define(names.intern("Base"), &[], OpSet::of(&[Op::Len]));
        let child = classes.define(names.intern("Child"), &[base], OpSet::of(&[Op::Iter]));

        assert!(classes.is_subclass(child, base));
        assert!(classes.is_subclass(child, b.object));
        assert!(classes.ops(child).is_superset(OpSet::of(&[Op::Len, Op::Iter])));
    }

    #[test]
    fn test_tagged_tuple_class() {
        let (mut classes, mut names) = registry();
        let b = *classes.builtins();

        let fields = vec![names.intern("x"), names.intern("y")];
        let point = classes.define_tagged(names.intern("Point"), fields);

        assert!(classes.is_tagged_tuple(point));
        assert!(classes.is_subclass(point, b.tuple));
        assert!(!classes.is_tagged_tuple(b.tuple));

        let sub = classes.define(names.intern("Point3"), &[point], OpSet::EMPTY);
        assert!(!classes.is_tagged_tuple(sub));
    }
}
