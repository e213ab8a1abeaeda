use std::cell::Cell;

use europa_compiler::{unpack, unpack_offset, Opcode};
use europa_value::object::{Gc, Heap, NativeContext};
use europa_value::{HeapObject, SymbolTable, Value};

use crate::apply::{
    append_rib, prepare_for_closure, prepare_for_continuation, rib_to_vec, solve_value_application,
};
use crate::error::{VmError, VmResult};
use crate::state::State;

fn check_constant(proto: &europa_value::Prototype, idx: u32, inst: &'static str) -> VmResult<usize> {
    let idx = idx as usize;
    if idx >= proto.constants.len() {
        return Err(VmError::InvalidConstantIndex { inst });
    }
    Ok(idx)
}

fn check_subproto(proto: &europa_value::Prototype, idx: u32, inst: &'static str) -> VmResult<usize> {
    let idx = idx as usize;
    if idx >= proto.sub_protos.len() {
        return Err(VmError::InvalidSubprotoIndex { inst });
    }
    Ok(idx)
}

/// Offsets are relative to the jumping instruction's own index (see
/// `europa_compiler`'s `patch` doc comment for why); we only need to
/// bounds-check that the destination lands inside the code buffer.
fn offset_pc(proto: &europa_value::Prototype, pc: usize, offset: i32, inst: &'static str) -> VmResult<usize> {
    let target = pc as i64 + offset as i64;
    if target < 0 || target as usize > proto.code.len() {
        return Err(VmError::InvalidJumpOffset { inst });
    }
    Ok(target as usize)
}

fn current_closure(state: &State) -> Gc {
    state.ccl.expect("execute is only called while a closure is running")
}

/// Runs a collection cycle, rooted at everything `state` keeps reachable,
/// once the heap has allocated past `GcConfig::collect_threshold` since the
/// last cycle. Called at each loop boundary rather than mid-instruction, so
/// every live root is already sitting in a `State` field when it runs.
fn maybe_collect(state: &State, heap: &mut Heap) -> VmResult<()> {
    if heap.should_collect() {
        let stats = heap.collect(state.roots())?;
        tracing::debug!(live = stats.live, freed = stats.freed, "vm triggered a gc cycle");
    }
    Ok(())
}

/// Runs the fetch-decode-execute loop until the closure stack is exhausted
/// (`HALT`/top-level `RETURN`) or an error occurs. `state.acc` holds the
/// result on a clean stop.
///
/// Native closures are invoked directly as a Rust function call instead of
/// going through the reference implementation's `EU_RESULT_OK`/`CONTINUE`
/// status-code channel - there is no C-style "return status" to distinguish,
/// since a native procedure either returns a value, raises an error, or (by
/// calling back into `execute` itself, e.g. to invoke a passed-in closure)
/// produces its result synchronously.
pub fn execute(state: &mut State, heap: &mut Heap, symbols: &mut SymbolTable) -> VmResult<()> {
    'run: while state.is_running() {
        maybe_collect(state, heap)?;

        let closure_gc = current_closure(state);
        let closure = closure_gc
            .as_closure()
            .expect("ccl always points at a Closure")
            .clone();

        if let Some(native) = closure.native {
            let args = rib_to_vec(state.rib)?;
            let mut ctx = NativeContext { heap, symbols };
            match native(&mut ctx, &args) {
                Ok(value) => {
                    state.acc = value;
                    let previous = state.previous;
                    crate::apply::set_cc(state, previous);
                    continue 'run;
                }
                Err(err) => return Err(VmError::Raised(err)),
            }
        }

        let proto_gc = closure.proto.expect("non-native closure always carries a prototype");

        'fetch: loop {
            maybe_collect(state, heap)?;

            let pc = state.pc();
            let word = {
                let proto = proto_gc.as_prototype().expect("proto_gc always points at a Prototype");
                if pc >= proto.code.len() {
                    return Err(VmError::PcOutOfBounds);
                }
                proto.code[pc]
            };

            let (opcode, payload) = unpack(word).map_err(VmError::UnknownOpcode)?;

            match opcode {
                Opcode::Nop => {}

                Opcode::Refer => {
                    let proto = proto_gc.as_prototype().unwrap();
                    let idx = check_constant(proto, payload, "REFER")?;
                    let key = proto.constants[idx];
                    let env_gc = state.env.ok_or(VmError::NoEnvironment)?;
                    let env = env_gc.as_environment().expect("state.env always points at a Table");
                    let value = env.borrow().rget(&key).ok_or(VmError::UnboundVariable)?;
                    state.acc = value;
                }

                Opcode::Const => {
                    let proto = proto_gc.as_prototype().unwrap();
                    let idx = check_constant(proto, payload, "CONST")?;
                    state.acc = proto.constants[idx];
                }

                Opcode::Close => {
                    let proto = proto_gc.as_prototype().unwrap();
                    let idx = check_subproto(proto, payload, "CLOSE")?;
                    let sub = proto.sub_protos[idx];
                    let env = state.env;
                    let closure = europa_value::Closure::scheme(sub, env.expect("CLOSE requires an environment"));
                    state.acc = Value::Object(heap.alloc(HeapObject::Closure(closure)));
                }

                Opcode::Test => {
                    let proto = proto_gc.as_prototype().unwrap();
                    let offset = unpack_offset(payload);
                    let target = offset_pc(proto, pc, offset, "TEST")?;
                    if !state.acc.is_truthy() {
                        state.set_pc(target);
                        continue 'fetch;
                    }
                }

                Opcode::Jump => {
                    let proto = proto_gc.as_prototype().unwrap();
                    let offset = unpack_offset(payload);
                    let target = offset_pc(proto, pc, offset, "JUMP")?;
                    state.set_pc(target);
                    continue 'fetch;
                }

                Opcode::Assign => {
                    let proto = proto_gc.as_prototype().unwrap();
                    let idx = check_constant(proto, payload, "ASSIGN")?;
                    let key = proto.constants[idx];
                    let env_gc = state.env.ok_or(VmError::NoEnvironment)?;
                    let env = env_gc.as_environment().expect("state.env always points at a Table");
                    if !env.borrow_mut().rset(key, state.acc) {
                        return Err(VmError::UnboundAssignment);
                    }
                }

                Opcode::Define => {
                    let proto = proto_gc.as_prototype().unwrap();
                    let idx = check_constant(proto, payload, "DEFINE")?;
                    let key = proto.constants[idx];
                    let env_gc = state.env.ok_or(VmError::NoEnvironment)?;
                    let env = env_gc.as_environment().expect("state.env always points at a Table");
                    env.borrow_mut().define(key, state.acc);
                }

                Opcode::Argument => {
                    let value = state.acc;
                    append_rib(state, heap, value);
                }

                Opcode::Frame => {
                    let proto = proto_gc.as_prototype().unwrap();
                    let offset = unpack_offset(payload);
                    let target = offset_pc(proto, pc, offset, "FRAME")?;
                    let cont = europa_value::Continuation {
                        previous: state.previous,
                        env: state.env,
                        closure: state.ccl,
                        rib: state.rib,
                        rib_last: state.rib_last,
                        pc: target,
                    };
                    let cont_gc = heap.alloc(HeapObject::Continuation(cont));
                    state.previous = Some(cont_gc);
                    state.rib = Value::Null;
                    state.rib_last = None;
                }

                Opcode::Conti => {
                    let proto = proto_gc.as_prototype().unwrap();
                    let offset = unpack_offset(payload);
                    let target = offset_pc(proto, pc, offset, "CONTI")?;
                    let cont = europa_value::Continuation {
                        previous: state.previous,
                        env: state.env,
                        closure: state.ccl,
                        rib: state.rib,
                        rib_last: state.rib_last,
                        pc: target,
                    };
                    let cont_gc = heap.alloc(HeapObject::Continuation(cont));
                    state.acc = Value::Object(cont_gc);
                }

                Opcode::Apply => {
                    solve_value_application(state, heap)?;
                    let target_gc = state.acc.as_object().expect("solve_value_application yields a heap value");

                    if let Some(cl) = target_gc.as_closure().cloned() {
                        prepare_for_closure(state, heap, symbols, &cl, target_gc)?;
                    } else {
                        let cont_gc = target_gc;
                        prepare_for_continuation(state, cont_gc);
                    }
                    continue 'run;
                }

                Opcode::Return => {
                    let previous = state.previous;
                    crate::apply::set_cc(state, previous);
                    continue 'run;
                }

                Opcode::Halt => {
                    crate::apply::set_cc(state, None);
                    continue 'run;
                }
            }

            state.set_pc(pc + 1);
        }
    }

    Ok(())
}

/// Runs `closure` with `args` (a proper argument list) to completion,
/// returning its result. Sets up a fresh top-level frame with no caller to
/// return to - a `RETURN` at this depth stops the loop the same way `HALT`
/// does.
pub fn do_closure(
    state: &mut State,
    heap: &mut Heap,
    symbols: &mut SymbolTable,
    closure_gc: Gc,
    args: Value,
) -> VmResult<Value> {
    let closure = closure_gc.as_closure().expect("do_closure requires a Closure").clone();
    crate::apply::prepare_environment(state, heap, symbols, &closure, args)?;
    crate::apply::set_closure(state, closure_gc, &closure);
    execute(state, heap, symbols)?;
    Ok(state.acc)
}

/// Builds a proper argument list out of Rust-side values, for embedding code
/// calling into `do_closure`.
pub fn make_arglist(heap: &mut Heap, values: &[Value]) -> Value {
    let mut tail = Value::Null;
    for value in values.iter().rev() {
        let pair_gc = heap.alloc(HeapObject::Pair(Cell::new(*value), Cell::new(tail)));
        tail = Value::Object(pair_gc);
    }
    tail
}
