//! The store: every name, class, heap object and type expression a check
//! can see.
//!
//! A [`Store`] is built up front with `&mut self` methods, then shared
//! immutably while checks run. Nothing in a conformance check mutates it,
//! so one store can serve any number of concurrent checks.

use crate::error::StoreError;
use crate::expr::{ExprId, TypeExpr};
use crate::value::{
    Builtins, ClassId, ClassRegistry, Object, ObjectData, ObjectId, OpSet, Value,
};
use shapecheck_mem::{Arena, Interner, Symbol};
use std::borrow::Cow;
use std::{slice, str};

/// Owner of all interned names, classes, objects and expressions.
#[derive(Debug)]
pub struct Store {
    pub(crate) names: Interner,
    pub(crate) classes: ClassRegistry,
    pub(crate) objects: Arena<Object>,
    pub(crate) exprs: Arena<TypeExpr>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates a store with the builtin classes registered.
    pub fn new() -> Self {
        let mut names = Interner::new();
        let classes = ClassRegistry::new(&mut names);
        Self {
            names,
            classes,
            objects: Arena::with_capacity(64),
            exprs: Arena::with_capacity(64),
        }
    }

    // ========================================================================
    // Names and classes
    // ========================================================================

    /// Interns a name.
    pub fn intern(&mut self, name: &str) -> Symbol {
        self.names.intern(name)
    }

    /// Resolves an interned name. Foreign symbols render as `"?"`.
    pub fn name(&self, sym: Symbol) -> &str {
        self.names.resolve(sym).unwrap_or("?")
    }

    /// Returns the name interner.
    pub fn names(&self) -> &Interner {
        &self.names
    }

    /// Returns the class registry.
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Returns the builtin class ids.
    pub fn builtins(&self) -> &Builtins {
        self.classes.builtins()
    }

    /// Defines a class. An empty `bases` list means `[object]`.
    pub fn define_class(&mut self, name: &str, bases: &[ClassId], ops: OpSet) -> ClassId {
        let name = self.names.intern(name);
        self.classes.define(name, bases, ops)
    }

    /// Defines a tagged-tuple class with the given ordered field names.
    pub fn define_tagged_class(&mut self, name: &str, fields: &[&str]) -> ClassId {
        let name = self.names.intern(name);
        let fields = fields.iter().map(|f| self.names.intern(f)).collect();
        self.classes.define_tagged(name, fields)
    }

    /// Returns a class's name.
    pub fn class_name(&self, class: ClassId) -> &str {
        self.classes
            .get(class)
            .map_or("?", |info| self.name(info.name))
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Allocates a heap object.
    pub fn alloc(&mut self, class: ClassId, data: ObjectData) -> Value {
        Value::Ref(self.objects.alloc(Object { class, data }))
    }

    /// Looks up a heap object.
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id)
    }

    /// Creates a `list`.
    pub fn list(&mut self, items: Vec<Value>) -> Value {
        let class = self.builtins().list;
        self.alloc(class, ObjectData::Items(items))
    }

    /// Creates a `tuple`.
    pub fn tuple(&mut self, items: Vec<Value>) -> Value {
        let class = self.builtins().tuple;
        self.alloc(class, ObjectData::Items(items))
    }

    /// Creates a `deque`.
    pub fn deque(&mut self, items: Vec<Value>) -> Value {
        let class = self.builtins().deque;
        self.alloc(class, ObjectData::Items(items))
    }

    /// Creates a `set`. Duplicate members are dropped.
    pub fn set(&mut self, members: Vec<Value>) -> Value {
        let class = self.builtins().set;
        self.alloc(class, ObjectData::Members(dedup(members)))
    }

    /// Creates a `frozenset`. Duplicate members are dropped.
    pub fn frozenset(&mut self, members: Vec<Value>) -> Value {
        let class = self.builtins().frozenset;
        self.alloc(class, ObjectData::Members(dedup(members)))
    }

    /// Creates a `dict`. Later duplicates overwrite earlier entries.
    pub fn dict(&mut self, entries: Vec<(Value, Value)>) -> Value {
        let class = self.builtins().dict;
        self.mapping(class, entries)
    }

    /// Creates a mapping of any mapping class, e.g. `Counter`.
    pub fn mapping(&mut self, class: ClassId, entries: Vec<(Value, Value)>) -> Value {
        let mut merged: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match merged.iter_mut().find(|(k, _)| k.key() == key.key()) {
                Some(slot) => slot.1 = value,
                None => merged.push((key, value)),
            }
        }
        self.alloc(class, ObjectData::Entries(merged))
    }

    /// Creates a sequence-like object of any class, e.g. an iterator
    /// snapshot or a user `list` subclass.
    pub fn sequence(&mut self, class: ClassId, items: Vec<Value>) -> Value {
        self.alloc(class, ObjectData::Items(items))
    }

    /// Creates a plain instance with named attributes.
    pub fn instance(&mut self, class: ClassId, attrs: &[(&str, Value)]) -> Value {
        let attrs = attrs
            .iter()
            .map(|(name, value)| (self.names.intern(name), value.clone()))
            .collect();
        self.alloc(class, ObjectData::Attrs(attrs))
    }

    /// Creates an instance of a tagged-tuple class.
    pub fn tagged(&mut self, class: ClassId, items: Vec<Value>) -> Value {
        self.alloc(class, ObjectData::Items(items))
    }

    /// Creates a compiled pattern over a `str` or `bytes` source.
    pub fn pattern(&mut self, source: Value) -> Value {
        let class = self.builtins().pattern;
        self.alloc(class, ObjectData::Pattern { source })
    }

    /// Creates a match result over a `str` or `bytes` subject.
    pub fn matched(&mut self, subject: Value) -> Value {
        let class = self.builtins().match_;
        self.alloc(class, ObjectData::Match { subject })
    }

    /// Creates a function with an optional positional arity.
    pub fn function(&mut self, arity: Option<usize>) -> Value {
        let class = self.builtins().function;
        self.alloc(class, ObjectData::Function { arity })
    }

    /// Creates an object with no inspectable contents.
    pub fn opaque(&mut self, class: ClassId) -> Value {
        self.alloc(class, ObjectData::Opaque)
    }

    /// Appends an item to a sequence or a member to a set.
    ///
    /// Lets a container hold itself.
    pub fn push(&mut self, target: &Value, item: Value) -> Result<(), StoreError> {
        let object = self.object_mut(target)?;
        match &mut object.data {
            ObjectData::Items(items) => items.push(item),
            ObjectData::Members(members) => {
                if !members.iter().any(|m| m.key() == item.key()) {
                    members.push(item);
                }
            }
            _ => {
                return Err(StoreError::Layout {
                    expected: "a sequence or set",
                });
            }
        }
        Ok(())
    }

    /// Inserts or replaces a mapping entry.
    ///
    /// Lets a mapping hold itself.
    pub fn insert(&mut self, target: &Value, key: Value, value: Value) -> Result<(), StoreError> {
        let object = self.object_mut(target)?;
        let ObjectData::Entries(entries) = &mut object.data else {
            return Err(StoreError::Layout {
                expected: "a mapping",
            });
        };
        match entries.iter_mut().find(|(k, _)| k.key() == key.key()) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
        Ok(())
    }

    fn object_mut(&mut self, target: &Value) -> Result<&mut Object, StoreError> {
        let id = target.as_object().ok_or(StoreError::NotAnObject)?;
        self.objects.get_mut(id).ok_or(StoreError::NotAnObject)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the class of a value.
    pub fn class_of(&self, value: &Value) -> ClassId {
        let b = self.builtins();
        match value {
            Value::None => b.none,
            Value::Bool(_) => b.bool,
            Value::Int(_) => b.int,
            Value::Float(_) => b.float,
            Value::Str(_) => b.str,
            Value::Bytes(_) => b.bytes,
            Value::Class(_) => b.type_,
            Value::Ref(id) => self.object(*id).map_or(b.object, |obj| obj.class),
        }
    }

    /// Nominal instance check.
    pub fn is_instance(&self, value: &Value, class: ClassId) -> bool {
        self.classes.is_subclass(self.class_of(value), class)
    }

    /// Effective operations of a value's class.
    pub fn ops_of(&self, value: &Value) -> OpSet {
        self.classes.ops(self.class_of(value))
    }

    /// Iterates a value's elements: sequence items, set members, mapping
    /// keys, characters of a `str` or integers of a `bytes`.
    ///
    /// Returns `None` for values with nothing to iterate.
    pub fn elements<'a>(&'a self, value: &'a Value) -> Option<Elements<'a>> {
        match value {
            Value::Str(s) => Some(Elements::Chars(s.chars())),
            Value::Bytes(b) => Some(Elements::Bytes(b.iter())),
            Value::Ref(id) => match &self.object(*id)?.data {
                ObjectData::Items(items) | ObjectData::Members(items) => {
                    Some(Elements::Items(items.iter()))
                }
                ObjectData::Entries(entries) => Some(Elements::Keys(entries.iter())),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns a sequence's items (tuples, lists, tagged tuples).
    pub fn items(&self, value: &Value) -> Option<&[Value]> {
        match &self.object(value.as_object()?)?.data {
            ObjectData::Items(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a mapping's entries.
    pub fn entries(&self, value: &Value) -> Option<&[(Value, Value)]> {
        match &self.object(value.as_object()?)?.data {
            ObjectData::Entries(entries) => Some(entries),
            _ => None,
        }
    }

    /// Declared positional arity of a function value.
    pub fn arity_of(&self, value: &Value) -> Option<usize> {
        match &self.object(value.as_object()?)?.data {
            ObjectData::Function { arity } => *arity,
            _ => None,
        }
    }

    /// Reads an attribute.
    ///
    /// Tagged-tuple fields map to items by position, pattern objects expose
    /// `pattern`, and match objects expose `string`.
    pub fn attr(&self, value: &Value, name: Symbol) -> Option<&Value> {
        let object = self.object(value.as_object()?)?;
        match &object.data {
            ObjectData::Attrs(attrs) => attrs.iter().find(|(n, _)| *n == name).map(|(_, v)| v),
            ObjectData::Items(items) => {
                let info = self.classes.get(object.class)?;
                let pos = info.fields.iter().position(|f| *f == name)?;
                items.get(pos)
            }
            ObjectData::Pattern { source } => {
                (self.names.get("pattern") == Some(name)).then_some(source)
            }
            ObjectData::Match { subject } => {
                (self.names.get("string") == Some(name)).then_some(subject)
            }
            _ => None,
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Looks up a type expression. `None` for ids that are still pending.
    pub fn expr(&self, id: ExprId) -> Option<&TypeExpr> {
        self.exprs.get(id)
    }

    /// Returns `true` if `id` was reserved in this store and not yet defined.
    pub fn is_pending(&self, id: ExprId) -> bool {
        self.exprs.is_pending(id)
    }

    /// Number of allocated expression slots.
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

fn dedup(values: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !out.iter().any(|v| v.key() == value.key()) {
            out.push(value);
        }
    }
    out
}

/// Iterator over the elements of a value. See [`Store::elements`].
#[derive(Debug, Clone)]
pub enum Elements<'a> {
    /// Sequence items or set members
    Items(slice::Iter<'a, Value>),
    /// Mapping keys
    Keys(slice::Iter<'a, (Value, Value)>),
    /// Characters of a string, each a one-character `str`
    Chars(str::Chars<'a>),
    /// Bytes of a byte string, each an `int`
    Bytes(slice::Iter<'a, u8>),
}

impl<'a> Iterator for Elements<'a> {
    type Item = Cow<'a, Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Elements::Items(it) => it.next().map(Cow::Borrowed),
            Elements::Keys(it) => it.next().map(|(k, _)| Cow::Borrowed(k)),
            Elements::Chars(it) => it.next().map(|c| Cow::Owned(Value::str(c.encode_utf8(&mut [0; 4])))),
            Elements::Bytes(it) => it.next().map(|b| Cow::Owned(Value::Int(i64::from(*b)))),
        }
    }
}

impl DoubleEndedIterator for Elements<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self {
            Elements::Items(it) => it.next_back().map(Cow::Borrowed),
            Elements::Keys(it) => it.next_back().map(|(k, _)| Cow::Borrowed(k)),
            Elements::Chars(it) => it
                .next_back()
                .map(|c| Cow::Owned(Value::str(c.encode_utf8(&mut [0; 4])))),
            Elements::Bytes(it) => it.next_back().map(|b| Cow::Owned(Value::Int(i64::from(*b)))),
        }
    }
}
