use std::cell::{Cell, RefCell};

use europa_value::object::{Gc, Heap};
use europa_value::{Closure, Environment, Formals, HeapObject, SymbolTable, Value};

use crate::error::{VmError, VmResult};
use crate::state::State;

/// Turns whatever is in the accumulator into something `APPLY` can run: a
/// closure or a continuation pass through untouched; a first-class
/// callable table is resolved through its `@@call` entry, with the table
/// itself prepended to the rib as the callee's first argument.
pub(crate) fn solve_value_application(state: &mut State, heap: &mut Heap) -> VmResult<()> {
    let gc = match state.acc {
        Value::Object(gc) => gc,
        other => return Err(VmError::NotApplicable(other.type_name())),
    };

    if gc.as_closure().is_some() || gc.as_continuation().is_some() {
        return Ok(());
    }

    if let Some(env_cell) = gc.as_environment() {
        let callee = env_cell
            .borrow()
            .rget(&state.call_meta)
            .ok_or(VmError::TableNotCallable)?;
        let callee_gc = callee
            .as_object()
            .filter(|g| g.as_closure().is_some())
            .ok_or(VmError::TableNotCallable)?;

        let pair_gc = heap.alloc(HeapObject::Pair(Cell::new(state.acc), Cell::new(state.rib)));
        state.rib = Value::Object(pair_gc);
        state.acc = Value::Object(callee_gc);
        return Ok(());
    }

    Err(VmError::NotApplicable(gc.type_name()))
}

/// Appends `value` to the end of the rib, updating `rib_last` for O(1)
/// future appends - the Rust stand-in for the reference VM's raw
/// `rib_lastpos` slot pointer.
pub(crate) fn append_rib(state: &mut State, heap: &mut Heap, value: Value) {
    let pair_gc = heap.alloc(HeapObject::Pair(Cell::new(value), Cell::new(Value::Null)));
    match state.rib_last {
        None => {
            state.rib = Value::Object(pair_gc);
        }
        Some(last) => {
            if let HeapObject::Pair(_, cdr) = &*last {
                cdr.set(Value::Object(pair_gc));
            }
        }
    }
    state.rib_last = Some(pair_gc);
}

/// Extends the environment for a closure application (`prepare_environment`
/// in the reference VM): a native closure keeps the rib as its argument
/// list and runs against its creation environment; a closure with
/// `own_env == false` runs directly in its creation environment with an
/// empty rib; an ordinary Scheme closure builds a fresh environment frame
/// binding formals to rib elements.
pub(crate) fn prepare_environment(
    state: &mut State,
    heap: &mut Heap,
    symbols: &mut SymbolTable,
    closure: &Closure,
    args: Value,
) -> VmResult<()> {
    if closure.is_native() {
        state.env = closure.env;
        state.rib = args;
        state.rib_last = None;
        return Ok(());
    }

    if !closure.own_env {
        state.env = closure.env;
        state.rib = Value::Null;
        state.rib_last = None;
        return Ok(());
    }

    let proto_gc = closure.proto.expect("a Scheme closure always carries a prototype");
    let formals = proto_gc
        .as_prototype()
        .expect("closure.proto always points at a Prototype")
        .formals
        .clone();

    let mut env = Environment::with_capacity(formals.required_count(), closure.env);
    let mut cur = args;

    let names: &[europa_util::Symbol] = match &formals {
        Formals::Fixed(names) | Formals::Variadic(names, _) => names,
        Formals::AllRest(_) => &[],
    };

    for (i, name) in names.iter().enumerate() {
        let (head, tail) = match cur {
            Value::Object(gc) => match &*gc {
                HeapObject::Pair(car, cdr) => (car.get(), cdr.get()),
                _ => return Err(VmError::ImproperArgumentList),
            },
            Value::Null => {
                return Err(VmError::Arity {
                    expected: arity_description(&formals),
                    got: i,
                })
            }
            _ => return Err(VmError::ImproperArgumentList),
        };
        let key = Value::Object(symbols.intern_symbol(heap, *name));
        env.define(key, head);
        cur = tail;
    }

    match &formals {
        Formals::Fixed(_) => {
            if !cur.is_null() {
                return Err(VmError::Arity {
                    expected: arity_description(&formals),
                    got: names.len() + extra_rib_len(cur),
                });
            }
        }
        Formals::Variadic(_, rest) => {
            let key = Value::Object(symbols.intern_symbol(heap, *rest));
            env.define(key, cur);
        }
        Formals::AllRest(rest) => {
            let key = Value::Object(symbols.intern_symbol(heap, *rest));
            env.define(key, args);
        }
    }

    state.env = Some(heap.alloc(HeapObject::Table(RefCell::new(env))));
    state.rib = Value::Null;
    state.rib_last = None;
    Ok(())
}

fn extra_rib_len(mut rib: Value) -> usize {
    let mut n = 0;
    while let Value::Object(gc) = rib {
        match &*gc {
            HeapObject::Pair(_, cdr) => {
                n += 1;
                rib = cdr.get();
            }
            _ => break,
        }
    }
    n
}

fn arity_description(formals: &Formals) -> String {
    match formals {
        Formals::Fixed(names) => format!("{}", names.len()),
        Formals::Variadic(names, _) => format!("at least {}", names.len()),
        Formals::AllRest(_) => "any number of".to_string(),
    }
}

pub(crate) fn prepare_for_closure(
    state: &mut State,
    heap: &mut Heap,
    symbols: &mut SymbolTable,
    closure: &Closure,
    closure_gc: Gc,
) -> VmResult<()> {
    let args = state.rib;
    prepare_environment(state, heap, symbols, closure, args)?;
    state.ccl = Some(closure_gc);
    state.set_pc(0);
    Ok(())
}

/// Switches to running `cont` (or, if `None`, stops the loop) without
/// touching the accumulator - used by `RETURN`/`HALT` and by a native
/// closure's return, none of which should disturb whatever result is
/// already sitting in `acc`.
pub(crate) fn set_cc(state: &mut State, cont: Option<Gc>) {
    let Some(cont_gc) = cont else {
        state.ccl = None;
        state.env = Some(state.global_env);
        state.set_pc(0);
        return;
    };

    let cont = cont_gc
        .as_continuation()
        .expect("set_cc is only called with a Continuation")
        .clone();

    state.ccl = cont.closure;
    state.previous = cont.previous;
    state.set_pc(cont.pc);
    state.env = cont.env;
    state.rib = cont.rib;
    state.rib_last = cont.rib_last;
}

/// Marks `closure_gc` as the frame now running, resetting the rib unless
/// `closure` is native (whose arguments stay put in the rib, set up by
/// `prepare_environment`).
pub(crate) fn set_closure(state: &mut State, closure_gc: Gc, closure: &Closure) {
    state.ccl = Some(closure_gc);
    if !closure.is_native() {
        state.rib = Value::Null;
        state.rib_last = None;
    }
    state.set_pc(0);
}

/// Restores a captured continuation verbatim, setting the accumulator to
/// the rib's head (the sole argument to the continuation call) or to the
/// whole rib if it isn't a proper non-empty list.
pub(crate) fn prepare_for_continuation(state: &mut State, cont_gc: Gc) {
    let cont = cont_gc
        .as_continuation()
        .expect("prepare_for_continuation is only called with a Continuation")
        .clone();

    let first = match state.rib {
        Value::Object(gc) => match &*gc {
            HeapObject::Pair(car, _) => car.get(),
            _ => state.rib,
        },
        _ => state.rib,
    };

    state.ccl = cont.closure;
    state.previous = cont.previous;
    state.set_pc(cont.pc);
    state.env = cont.env;
    state.rib = cont.rib;
    state.rib_last = cont.rib_last;
    state.acc = first;
}

/// Flattens a (supposedly proper) rib into argument values for a native
/// procedure call.
pub(crate) fn rib_to_vec(rib: Value) -> VmResult<Vec<Value>> {
    let mut items = Vec::new();
    let mut cur = rib;
    loop {
        match cur {
            Value::Null => break,
            Value::Object(gc) => match &*gc {
                HeapObject::Pair(car, cdr) => {
                    items.push(car.get());
                    cur = cdr.get();
                }
                _ => return Err(VmError::ImproperArgumentList),
            },
            _ => return Err(VmError::ImproperArgumentList),
        }
    }
    Ok(items)
}
