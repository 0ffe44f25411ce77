//! Value reprs for reports.
//!
//! Reprs are truncated to [`REPR_LIMIT`] characters, and a container
//! reached again while it is being printed renders as `[...]` or `{...}`.

use super::{ObjectData, ObjectId, Value};
use crate::store::Store;
use std::fmt::Write;

/// Maximum number of characters in a rendered repr.
pub const REPR_LIMIT: usize = 100;

impl Store {
    /// Renders `value` as a quoted, bracketed literal, truncated to
    /// [`REPR_LIMIT`] characters.
    pub fn repr(&self, value: &Value) -> String {
        let mut out = String::new();
        let mut visiting = Vec::new();
        self.write_repr(value, &mut out, &mut visiting);
        truncate(&mut out, REPR_LIMIT);
        out
    }

    fn write_repr(&self, value: &Value, out: &mut String, visiting: &mut Vec<ObjectId>) {
        if out.len() > REPR_LIMIT {
            return;
        }
        match value {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(i) => {
                let _ = write!(out, "{i}");
            }
            Value::Float(x) => write_float(*x, out),
            Value::Str(s) => write_str(s, out),
            Value::Bytes(b) => write_bytes(b, out),
            Value::Class(class) => {
                let _ = write!(out, "<class '{}'>", self.class_name(*class));
            }
            Value::Ref(id) => self.write_object(*id, out, visiting),
        }
    }

    fn write_object(&self, id: ObjectId, out: &mut String, visiting: &mut Vec<ObjectId>) {
        let Some(object) = self.object(id) else {
            out.push_str("<dangling object>");
            return;
        };
        let b = self.builtins();
        let class = object.class;
        let name = self.class_name(class);

        if visiting.contains(&id) {
            out.push_str(match object.data {
                ObjectData::Entries(_) | ObjectData::Members(_) => "{...}",
                ObjectData::Items(_) if class == b.tuple => "(...)",
                _ => "[...]",
            });
            return;
        }
        visiting.push(id);

        match &object.data {
            ObjectData::Items(items) if self.classes.is_tagged_tuple(class) => {
                let fields = self
                    .classes
                    .get(class)
                    .map(|info| info.fields.as_slice())
                    .unwrap_or_default();
                let _ = write!(out, "{name}(");
                for (i, (field, item)) in fields.iter().zip(items).enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}=", self.name(*field));
                    self.write_repr(item, out, visiting);
                }
                out.push(')');
            }
            ObjectData::Items(items) if class == b.tuple => {
                out.push('(');
                self.write_items(items, out, visiting);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            ObjectData::Items(items) if class == b.list => {
                out.push('[');
                self.write_items(items, out, visiting);
                out.push(']');
            }
            ObjectData::Items(_) if self.classes.is_subclass(class, b.iterator) => {
                let _ = write!(out, "<{name} object>");
            }
            ObjectData::Items(items) => {
                let _ = write!(out, "{name}([");
                self.write_items(items, out, visiting);
                out.push_str("])");
            }
            ObjectData::Members(members) => {
                if class == b.set && members.is_empty() {
                    out.push_str("set()");
                } else if class == b.set {
                    out.push('{');
                    self.write_items(members, out, visiting);
                    out.push('}');
                } else {
                    let _ = write!(out, "{name}({{");
                    self.write_items(members, out, visiting);
                    out.push_str("})");
                }
            }
            ObjectData::Entries(entries) => {
                let plain = class == b.dict;
                if !plain {
                    let _ = write!(out, "{name}(");
                }
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if out.len() > REPR_LIMIT {
                        break;
                    }
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_repr(key, out, visiting);
                    out.push_str(": ");
                    self.write_repr(value, out, visiting);
                }
                out.push('}');
                if !plain {
                    out.push(')');
                }
            }
            ObjectData::Pattern { source } => {
                out.push_str("re.compile(");
                self.write_repr(source, out, visiting);
                out.push(')');
            }
            ObjectData::Match { subject } => {
                out.push_str("<re.Match object; string=");
                self.write_repr(subject, out, visiting);
                out.push('>');
            }
            ObjectData::Function { .. } => {
                let _ = write!(out, "<function at {id:?}>");
            }
            ObjectData::Attrs(_) | ObjectData::Opaque => {
                let _ = write!(out, "<{name} object>");
            }
        }

        visiting.pop();
    }

    fn write_items(&self, items: &[Value], out: &mut String, visiting: &mut Vec<ObjectId>) {
        for (i, item) in items.iter().enumerate() {
            if out.len() > REPR_LIMIT {
                break;
            }
            if i > 0 {
                out.push_str(", ");
            }
            self.write_repr(item, out, visiting);
        }
    }
}

fn write_float(x: f64, out: &mut String) {
    if x.is_nan() {
        out.push_str("nan");
    } else if x.is_infinite() {
        out.push_str(if x > 0.0 { "inf" } else { "-inf" });
    } else {
        let _ = write!(out, "{x:?}");
    }
}

fn write_str(s: &str, out: &mut String) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

fn write_bytes(b: &[u8], out: &mut String) {
    out.push_str("b'");
    for &byte in b {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
    out.push('\'');
}

fn truncate(s: &mut String, limit: usize) {
    if let Some((idx, _)) = s.char_indices().nth(limit) {
        s.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        let store = Store::new();
        assert_eq!(store.repr(&Value::None), "None");
        assert_eq!(store.repr(&Value::Bool(true)), "True");
        assert_eq!(store.repr(&Value::Int(-3)), "-3");
        assert_eq!(store.repr(&Value::Float(1.0)), "1.0");
        assert_eq!(store.repr(&Value::Float(f64::NAN)), "nan");
        assert_eq!(store.repr(&Value::str("a")), "'a'");
        assert_eq!(store.repr(&Value::str("it's")), "\"it's\"");
        assert_eq!(store.repr(&Value::bytes(b"a\x00")), "b'a\\x00'");

        let int = store.builtins().int;
        assert_eq!(store.repr(&Value::Class(int)), "<class 'int'>");
    }

    #[test]
    fn test_containers() {
        let mut store = Store::new();
        let one = store.tuple(vec![Value::Int(1)]);
        let list = store.list(vec![Value::Int(1), Value::str("x")]);
        let empty = store.set(vec![]);
        let dict = store.dict(vec![(Value::str("k"), list.clone())]);
        let deque = store.deque(vec![Value::Int(2)]);

        assert_eq!(store.repr(&one), "(1,)");
        assert_eq!(store.repr(&list), "[1, 'x']");
        assert_eq!(store.repr(&empty), "set()");
        assert_eq!(store.repr(&dict), "{'k': [1, 'x']}");
        assert_eq!(store.repr(&deque), "deque([2])");
    }

    #[test]
    fn test_special_objects() {
        let mut store = Store::new();
        let point = store.define_tagged_class("Point", &["x", "y"]);
        let p = store.tagged(point, vec![Value::Int(1), Value::Int(2)]);
        let pat = store.pattern(Value::str("a+"));
        let counter = store.builtins().counter;
        let c = store.mapping(counter, vec![(Value::str("a"), Value::Int(2))]);

        assert_eq!(store.repr(&p), "Point(x=1, y=2)");
        assert_eq!(store.repr(&pat), "re.compile('a+')");
        assert_eq!(store.repr(&c), "Counter({'a': 2})");
    }

    #[test]
    fn test_self_reference() {
        let mut store = Store::new();
        let d = store.dict(vec![]);
        store.insert(&d, Value::str("me"), d.clone()).unwrap();
        assert_eq!(store.repr(&d), "{'me': {...}}");

        let l = store.list(vec![]);
        store.push(&l, l.clone()).unwrap();
        assert_eq!(store.repr(&l), "[[...]]");
    }

    #[test]
    fn test_truncation() {
        let mut store = Store::new();
        let items = (0..100).map(Value::Int).collect();
        let list = store.list(items);
        let repr = store.repr(&list);
        assert_eq!(repr.chars().count(), REPR_LIMIT);
        assert!(repr.starts_with("[0, 1, 2"));
    }
}
