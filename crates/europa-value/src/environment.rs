use europa_table::Table;

use crate::object::HeapObject;
use crate::value::Value;

/// A table used as a lexical environment: its own bindings plus a link to
/// the enclosing scope. `rget`/`rset!` walk `parent` on a local miss; plain
/// `get`/`define` never do, which is exactly the asymmetry the reference VM
/// relies on (`REFER`/`ASSIGN` use the parent-chained lookup, `DEFINE`
/// always writes into the current frame without shadowing a parent binding
/// by walking past it).
pub struct Environment {
    table: Table<Value, Value>,
    parent: Option<europa_gc::Gc<HeapObject>>,
}

impl Environment {
    pub fn new(parent: Option<europa_gc::Gc<HeapObject>>) -> Self {
        Environment {
            table: Table::new(),
            parent,
        }
    }

    pub fn with_capacity(capacity: usize, parent: Option<europa_gc::Gc<HeapObject>>) -> Self {
        Environment {
            table: Table::with_capacity(capacity),
            parent,
        }
    }

    pub fn parent(&self) -> Option<europa_gc::Gc<HeapObject>> {
        self.parent
    }

    /// Binds `key` in this frame only, overwriting any existing local
    /// binding. Never touches `parent` - this is `DEFINE`'s behavior.
    pub fn define(&mut self, key: Value, value: Value) {
        self.table.insert(key, value);
    }

    pub fn get_local(&self, key: &Value) -> Option<Value> {
        self.table.get(key).copied()
    }

    /// Recursive lookup through the parent chain, used by `REFER`.
    pub fn rget(&self, key: &Value) -> Option<Value> {
        if let Some(v) = self.get_local(key) {
            return Some(v);
        }
        match self.parent {
            Some(parent) => match &*parent {
                HeapObject::Table(env) => env.borrow().rget(key),
                _ => None,
            },
            None => None,
        }
    }

    /// Overwrites an existing binding found anywhere in the parent chain.
    /// Returns `false` if `key` is unbound everywhere, matching `ASSIGN`'s
    /// "errors if unbound" contract (the caller turns that into a
    /// `bad-argument` error).
    pub fn rset(&mut self, key: Value, value: Value) -> bool {
        if self.table.contains_key(&key) {
            self.table.insert(key, value);
            return true;
        }
        match self.parent {
            Some(parent) => match &*parent {
                HeapObject::Table(env) => env.borrow_mut().rset(key, value),
                _ => false,
            },
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.table.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Heap, HeapObject};
    use europa_gc::GcConfig;
    use std::cell::RefCell;

    fn make_env_heap() -> Heap {
        Heap::new(GcConfig::default())
    }

    #[test]
    fn local_define_does_not_leak_to_parent_lookup_before_child_exists() {
        let mut env = Environment::new(None);
        env.define(Value::Fixnum(1), Value::Fixnum(100));
        assert!(matches!(env.rget(&Value::Fixnum(1)), Some(Value::Fixnum(100))));
        assert!(env.rget(&Value::Fixnum(2)).is_none());
    }

    #[test]
    fn rget_walks_up_to_parent_on_local_miss() {
        let mut heap = make_env_heap();
        let mut parent_env = Environment::new(None);
        parent_env.define(Value::Fixnum(1), Value::Fixnum(42));
        let parent_gc = heap.alloc(HeapObject::Table(RefCell::new(parent_env)));

        let child = Environment::new(Some(parent_gc));
        match child.rget(&Value::Fixnum(1)) {
            Some(Value::Fixnum(42)) => {}
            _ => panic!("expected to find binding in parent"),
        }
    }

    #[test]
    fn rset_requires_existing_binding_somewhere_in_chain() {
        let mut heap = make_env_heap();
        let parent_env = Environment::new(None);
        let parent_gc = heap.alloc(HeapObject::Table(RefCell::new(parent_env)));

        let mut child = Environment::new(Some(parent_gc));
        assert!(!child.rset(Value::Fixnum(1), Value::Fixnum(9)));
    }
}
