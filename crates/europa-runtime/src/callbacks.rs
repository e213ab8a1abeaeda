//! `apply`, `map`, and `for-each`: the only standard procedures that need
//! to call back into the fetch-decode-execute loop mid-native-call, which
//! is why they live here instead of in `europa-stdlib` (that crate has no
//! dependency on `europa-vm`, deliberately, to avoid a dependency cycle
//! with this one).

use europa_value::object::{Gc, Heap, NativeContext};
use europa_value::{ErrorKind, ErrorObj, HeapObject, SymbolTable, Value};
use europa_vm::{do_closure, make_arglist, State, VmError};

/// Accepts only closures, not continuations: `do_closure` has no path for
/// resuming a captured continuation (that only happens inline inside a
/// running `execute` loop via `prepare_for_continuation`), so a
/// continuation value handed to `apply`/`map`/`for-each` is rejected
/// rather than mishandled.
fn as_callable(v: Value, name: &str) -> Result<Gc, ErrorObj> {
    match v.as_object() {
        Some(gc) if gc.as_closure().is_some() => Ok(gc),
        _ => Err(ErrorObj::new(ErrorKind::BadArgument, format!("{name}: not a procedure"))),
    }
}

fn list_to_vec(mut v: Value, name: &str) -> Result<Vec<Value>, ErrorObj> {
    let mut items = Vec::new();
    loop {
        match v {
            Value::Null => return Ok(items),
            Value::Object(gc) => match &*gc {
                HeapObject::Pair(car, cdr) => {
                    items.push(car.get());
                    v = cdr.get();
                }
                _ => return Err(ErrorObj::new(ErrorKind::BadArgument, format!("{name}: improper list"))),
            },
            _ => return Err(ErrorObj::new(ErrorKind::BadArgument, format!("{name}: improper list"))),
        }
    }
}

fn vec_to_list(heap: &mut Heap, items: &[Value]) -> Value {
    make_arglist(heap, items)
}

/// Invokes `proc` with `args` by driving a fresh fetch-decode-execute loop
/// to completion, the reentrant call the doc comment on
/// `europa_vm::execute` describes as a native procedure's way of running a
/// passed-in closure. `proc`'s own captured environment doubles as the
/// nested loop's "global" environment - it is only consulted once the
/// nested continuation stack fully unwinds, which happens exactly when
/// this call is done.
fn call_procedure(heap: &mut Heap, symbols: &mut SymbolTable, proc: Gc, args: Value) -> Result<Value, ErrorObj> {
    let fallback_env = proc.as_closure().and_then(|c| c.env).unwrap_or(proc);
    let mut state = State::new(heap, symbols, fallback_env);
    do_closure(&mut state, heap, symbols, proc, args).map_err(|err| match err {
        VmError::Raised(obj) => obj,
        other => ErrorObj::new(ErrorKind::Invalid, other.to_string()),
    })
}

fn apply(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let [proc, rest @ ..] = args else {
        return Err(ErrorObj::new(ErrorKind::BadArgument, "apply: expected at least 2 arguments"));
    };
    let proc = as_callable(*proc, "apply")?;

    let (spread, leading) = rest
        .split_last()
        .ok_or_else(|| ErrorObj::new(ErrorKind::BadArgument, "apply: expected at least 2 arguments"))?;
    let mut flat: Vec<Value> = leading.to_vec();
    flat.extend(list_to_vec(*spread, "apply")?);

    let arglist = vec_to_list(ctx.heap, &flat);
    call_procedure(ctx.heap, ctx.symbols, proc, arglist)
}

fn map(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let [proc, lists @ ..] = args else {
        return Err(ErrorObj::new(ErrorKind::BadArgument, "map: expected at least 2 arguments"));
    };
    if lists.is_empty() {
        return Err(ErrorObj::new(ErrorKind::BadArgument, "map: expected at least 2 arguments"));
    }
    let proc = as_callable(*proc, "map")?;

    let columns: Vec<Vec<Value>> = lists.iter().map(|v| list_to_vec(*v, "map")).collect::<Result<_, _>>()?;
    let len = columns.iter().map(Vec::len).min().unwrap_or(0);

    let mut results = Vec::with_capacity(len);
    for i in 0..len {
        let row: Vec<Value> = columns.iter().map(|col| col[i]).collect();
        let arglist = vec_to_list(ctx.heap, &row);
        results.push(call_procedure(ctx.heap, ctx.symbols, proc, arglist)?);
    }
    Ok(vec_to_list(ctx.heap, &results))
}

fn for_each(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let [proc, lists @ ..] = args else {
        return Err(ErrorObj::new(ErrorKind::BadArgument, "for-each: expected at least 2 arguments"));
    };
    if lists.is_empty() {
        return Err(ErrorObj::new(ErrorKind::BadArgument, "for-each: expected at least 2 arguments"));
    }
    let proc = as_callable(*proc, "for-each")?;

    let columns: Vec<Vec<Value>> = lists.iter().map(|v| list_to_vec(*v, "for-each")).collect::<Result<_, _>>()?;
    let len = columns.iter().map(Vec::len).min().unwrap_or(0);

    for i in 0..len {
        let row: Vec<Value> = columns.iter().map(|col| col[i]).collect();
        let arglist = vec_to_list(ctx.heap, &row);
        call_procedure(ctx.heap, ctx.symbols, proc, arglist)?;
    }
    Ok(Value::Null)
}

// `call/cc` and `call-with-current-continuation` are not bound here: the
// compiler recognizes both names as a special form (`compile_call_cc`) and
// lowers them straight to the VM's own continuation-capturing opcode, the
// same way the reference compiler treats them as syntax rather than a
// procedure a host could rebind.

pub fn register(heap: &mut Heap, symbols: &mut SymbolTable, env: &mut europa_value::Environment) {
    europa_stdlib_helpers::define(heap, symbols, env, "apply", apply);
    europa_stdlib_helpers::define(heap, symbols, env, "map", map);
    europa_stdlib_helpers::define(heap, symbols, env, "for-each", for_each);
}

/// A thin re-export of the same native-binding helper `europa-stdlib` uses
/// internally, duplicated here rather than made `pub` across the crate
/// boundary - it is three lines and not worth widening that crate's public
/// surface for.
mod europa_stdlib_helpers {
    use europa_value::object::{Gc, Heap};
    use europa_value::{Closure, HeapObject, NativeFn, SymbolTable, Value};

    pub fn define(
        heap: &mut Heap,
        symbols: &mut SymbolTable,
        env: &mut europa_value::Environment,
        name: &str,
        f: NativeFn,
    ) {
        let key = Value::Object(symbols.intern(heap, name));
        let closure_gc: Gc = heap.alloc(HeapObject::Closure(Closure::native(f)));
        env.define(key, Value::Object(closure_gc));
    }
}
