use europa_value::object::NativeContext;
use europa_value::{ErrorObj, HeapObject, Value};

use crate::helpers::{arity_error, as_pair, bad_argument, cons, list_to_vec, vec_to_list};

fn pair(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [a, b] => Ok(cons(ctx.heap, *a, *b)),
        _ => Err(arity_error("cons", "2", args.len())),
    }
}

fn require_pair(args: &[Value], name: &str) -> Result<(Value, Value), ErrorObj> {
    match args {
        [v] => match as_pair(*v) {
            Some(gc) => {
                let (car, cdr) = gc.as_pair().unwrap();
                Ok((car.get(), cdr.get()))
            }
            None => Err(bad_argument(format!("{name}: not a pair"))),
        },
        _ => Err(arity_error(name, "1", args.len())),
    }
}

fn car(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    require_pair(args, "car").map(|(car, _)| car)
}

fn cdr(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    require_pair(args, "cdr").map(|(_, cdr)| cdr)
}

fn set_car(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v, new_car] => {
            let gc = as_pair(*v).ok_or_else(|| bad_argument("set-car!: not a pair"))?;
            let (car, _) = gc.as_pair().unwrap();
            car.set(*new_car);
            Ok(Value::Null)
        }
        _ => Err(arity_error("set-car!", "2", args.len())),
    }
}

fn set_cdr(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v, new_cdr] => {
            let gc = as_pair(*v).ok_or_else(|| bad_argument("set-cdr!: not a pair"))?;
            let (_, cdr) = gc.as_pair().unwrap();
            cdr.set(*new_cdr);
            Ok(Value::Null)
        }
        _ => Err(arity_error("set-cdr!", "2", args.len())),
    }
}

fn pair_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(
            v.as_object().is_some_and(|gc| matches!(&*gc, HeapObject::Pair(..))),
        )),
        _ => Err(arity_error("pair?", "1", args.len())),
    }
}

fn null_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(v.is_null())),
        _ => Err(arity_error("null?", "1", args.len())),
    }
}

fn list(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    Ok(vec_to_list(ctx.heap, args))
}

fn list_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(list_to_vec(*v, "list?").is_ok())),
        _ => Err(arity_error("list?", "1", args.len())),
    }
}

fn length(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => {
            let items = list_to_vec(*v, "length")?;
            Ok(Value::Fixnum(items.len() as i64))
        }
        _ => Err(arity_error("length", "1", args.len())),
    }
}

fn append(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    if args.is_empty() {
        return Ok(Value::Null);
    }
    let (last, init) = args.split_last().unwrap();
    let mut items = Vec::new();
    for v in init {
        items.extend(list_to_vec(*v, "append")?);
    }
    let mut result = *last;
    for v in items.into_iter().rev() {
        result = cons(ctx.heap, v, result);
    }
    Ok(result)
}

fn reverse(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => {
            let mut items = list_to_vec(*v, "reverse")?;
            items.reverse();
            Ok(vec_to_list(ctx.heap, &items))
        }
        _ => Err(arity_error("reverse", "1", args.len())),
    }
}

pub fn register(heap: &mut europa_value::object::Heap, symbols: &mut europa_value::SymbolTable, env: &mut europa_value::Environment) {
    use crate::helpers::define_native;
    define_native(heap, symbols, env, "cons", pair);
    define_native(heap, symbols, env, "car", car);
    define_native(heap, symbols, env, "cdr", cdr);
    define_native(heap, symbols, env, "set-car!", set_car);
    define_native(heap, symbols, env, "set-cdr!", set_cdr);
    define_native(heap, symbols, env, "pair?", pair_p);
    define_native(heap, symbols, env, "null?", null_p);
    define_native(heap, symbols, env, "list", list);
    define_native(heap, symbols, env, "list?", list_p);
    define_native(heap, symbols, env, "length", length);
    define_native(heap, symbols, env, "append", append);
    define_native(heap, symbols, env, "reverse", reverse);
}
