use std::cell::RefCell;

use europa_value::object::NativeContext;
use europa_value::{ErrorObj, HeapObject, Value};

use crate::helpers::{arity_error, bad_argument, define_native};

fn as_string_gc(v: Value, name: &str) -> Result<europa_gc::Gc<HeapObject>, ErrorObj> {
    v.as_object()
        .filter(|gc| matches!(&**gc, HeapObject::Str(_)))
        .ok_or_else(|| bad_argument(format!("{name}: not a string")))
}

fn string_length(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => {
            let gc = as_string_gc(*v, "string-length")?;
            let HeapObject::Str(s) = &*gc else { unreachable!() };
            Ok(Value::Fixnum(s.borrow().chars().count() as i64))
        }
        _ => Err(arity_error("string-length", "1", args.len())),
    }
}

fn string_append(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let mut out = String::new();
    for v in args {
        let gc = as_string_gc(*v, "string-append")?;
        let HeapObject::Str(s) = &*gc else { unreachable!() };
        out.push_str(&s.borrow());
    }
    Ok(Value::Object(ctx.heap.alloc(HeapObject::Str(RefCell::new(out)))))
}

fn string_eq(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    if args.len() < 2 {
        return Err(arity_error("string=?", "at least 2", args.len()));
    }
    let first = as_string_gc(args[0], "string=?")?;
    let HeapObject::Str(first) = &*first else { unreachable!() };
    for v in &args[1..] {
        let gc = as_string_gc(*v, "string=?")?;
        let HeapObject::Str(s) = &*gc else { unreachable!() };
        if *s.borrow() != *first.borrow() {
            return Ok(Value::FALSE);
        }
    }
    Ok(Value::TRUE)
}

fn string_to_symbol(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => {
            let gc = as_string_gc(*v, "string->symbol")?;
            let HeapObject::Str(s) = &*gc else { unreachable!() };
            let text = s.borrow().clone();
            Ok(Value::Object(ctx.symbols.intern(ctx.heap, &text)))
        }
        _ => Err(arity_error("string->symbol", "1", args.len())),
    }
}

fn symbol_to_string(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => {
            let gc = v
                .as_object()
                .filter(|gc| matches!(&**gc, HeapObject::Symbol(_)))
                .ok_or_else(|| bad_argument("symbol->string: not a symbol"))?;
            let HeapObject::Symbol(sym) = &*gc else { unreachable!() };
            let text = ctx.symbols.resolve(*sym).to_owned();
            Ok(Value::Object(ctx.heap.alloc(HeapObject::Str(RefCell::new(text)))))
        }
        _ => Err(arity_error("symbol->string", "1", args.len())),
    }
}

pub fn register(
    heap: &mut europa_value::object::Heap,
    symbols: &mut europa_value::SymbolTable,
    env: &mut europa_value::Environment,
) {
    define_native(heap, symbols, env, "string-length", string_length);
    define_native(heap, symbols, env, "string-append", string_append);
    define_native(heap, symbols, env, "string=?", string_eq);
    define_native(heap, symbols, env, "string->symbol", string_to_symbol);
    define_native(heap, symbols, env, "symbol->string", symbol_to_string);
}
