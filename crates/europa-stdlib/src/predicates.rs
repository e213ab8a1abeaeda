use europa_value::equality::{eq, equal, eqv};
use europa_value::object::NativeContext;
use europa_value::{ErrorObj, HeapObject, Value};

use crate::helpers::{arity_error, bad_argument, define_native};

fn not(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(!v.is_truthy())),
        _ => Err(arity_error("not", "1", args.len())),
    }
}

fn boolean_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(matches!(v, Value::Boolean(_)))),
        _ => Err(arity_error("boolean?", "1", args.len())),
    }
}

fn eq_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [a, b] => Ok(Value::Boolean(eq(a, b))),
        _ => Err(arity_error("eq?", "2", args.len())),
    }
}

fn eqv_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [a, b] => Ok(Value::Boolean(eqv(a, b))),
        _ => Err(arity_error("eqv?", "2", args.len())),
    }
}

fn equal_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [a, b] => Ok(Value::Boolean(equal(a, b))),
        _ => Err(arity_error("equal?", "2", args.len())),
    }
}

fn symbol_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(
            v.as_object().is_some_and(|gc| matches!(&*gc, HeapObject::Symbol(_))),
        )),
        _ => Err(arity_error("symbol?", "1", args.len())),
    }
}

fn string_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(
            v.as_object().is_some_and(|gc| matches!(&*gc, HeapObject::Str(_))),
        )),
        _ => Err(arity_error("string?", "1", args.len())),
    }
}

fn char_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(matches!(v, Value::Character(_)))),
        _ => Err(arity_error("char?", "1", args.len())),
    }
}

fn vector_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(
            v.as_object().is_some_and(|gc| matches!(&*gc, HeapObject::Vector(_))),
        )),
        _ => Err(arity_error("vector?", "1", args.len())),
    }
}

fn procedure_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(v.as_object().is_some_and(|gc| {
            matches!(&*gc, HeapObject::Closure(_) | HeapObject::Continuation(_))
        }))),
        _ => Err(arity_error("procedure?", "1", args.len())),
    }
}

fn boolean_eq_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    if args.len() < 2 {
        return Err(arity_error("boolean=?", "at least 2", args.len()));
    }
    let mut bools = Vec::with_capacity(args.len());
    for v in args {
        match v {
            Value::Boolean(b) => bools.push(*b),
            _ => return Err(bad_argument("boolean=?: not a boolean")),
        }
    }
    let first = bools[0];
    Ok(Value::Boolean(bools.iter().all(|&b| b == first)))
}

pub fn register(
    heap: &mut europa_value::object::Heap,
    symbols: &mut europa_value::SymbolTable,
    env: &mut europa_value::Environment,
) {
    define_native(heap, symbols, env, "not", not);
    define_native(heap, symbols, env, "boolean?", boolean_p);
    define_native(heap, symbols, env, "eq?", eq_p);
    define_native(heap, symbols, env, "eqv?", eqv_p);
    define_native(heap, symbols, env, "equal?", equal_p);
    define_native(heap, symbols, env, "symbol?", symbol_p);
    define_native(heap, symbols, env, "string?", string_p);
    define_native(heap, symbols, env, "char?", char_p);
    define_native(heap, symbols, env, "vector?", vector_p);
    define_native(heap, symbols, env, "procedure?", procedure_p);
    define_native(heap, symbols, env, "boolean=?", boolean_eq_p);
}
