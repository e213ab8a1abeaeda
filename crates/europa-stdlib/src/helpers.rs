use europa_value::object::{Gc, Heap};
use europa_value::{Closure, ErrorKind, ErrorObj, HeapObject, SymbolTable, Value};

/// Binds `name` to a native closure in `env`, interning the name through
/// `symbols` the same way the compiler interns every other identifier.
pub fn define_native(
    heap: &mut Heap,
    symbols: &mut SymbolTable,
    env: &mut europa_value::Environment,
    name: &str,
    f: europa_value::NativeFn,
) {
    let key = Value::Object(symbols.intern(heap, name));
    let closure_gc = heap.alloc(HeapObject::Closure(Closure::native(f)));
    env.define(key, Value::Object(closure_gc));
}

pub fn bad_argument(message: impl Into<String>) -> ErrorObj {
    ErrorObj::new(ErrorKind::BadArgument, message)
}

pub fn arity_error(name: &str, expected: &str, got: usize) -> ErrorObj {
    bad_argument(format!("{name}: expected {expected} arguments, got {got}"))
}

pub fn cons(heap: &mut Heap, car: Value, cdr: Value) -> Value {
    Value::Object(heap.alloc(HeapObject::Pair(car.into(), cdr.into())))
}

pub fn as_pair(v: Value) -> Option<Gc> {
    let gc = v.as_object()?;
    gc.as_pair().is_some().then_some(gc)
}

/// Walks a (supposedly proper) Scheme list into a Rust `Vec`, erroring with
/// `what` in the message if it turns out improper.
pub fn list_to_vec(mut v: Value, what: &str) -> Result<Vec<Value>, ErrorObj> {
    let mut items = Vec::new();
    loop {
        match v {
            Value::Null => return Ok(items),
            Value::Object(gc) => match &*gc {
                HeapObject::Pair(car, cdr) => {
                    items.push(car.get());
                    v = cdr.get();
                }
                _ => return Err(bad_argument(format!("{what}: improper list"))),
            },
            _ => return Err(bad_argument(format!("{what}: improper list"))),
        }
    }
}

pub fn vec_to_list(heap: &mut Heap, items: &[Value]) -> Value {
    let mut tail = Value::Null;
    for v in items.iter().rev() {
        tail = cons(heap, *v, tail);
    }
    tail
}
