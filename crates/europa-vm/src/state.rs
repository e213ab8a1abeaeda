use europa_value::object::{Gc, Heap};
use europa_value::{SymbolTable, Value};

/// Everything the fetch-decode-execute loop needs between instructions:
/// the accumulator, the environment and closure in effect, the previous
/// (caller) continuation, the argument rib under construction, and the
/// program counter. One `State` runs one computation to completion (or to
/// an error) - there is no suspension point other than calling into a
/// native procedure.
pub struct State {
    pub acc: Value,
    pub env: Option<Gc>,
    pub ccl: Option<Gc>,
    pub previous: Option<Gc>,
    pub rib: Value,
    /// The pair at the tail of `rib`, or `None` when `rib` itself is the
    /// append point (empty rib, or a native closure's environment reset).
    pub rib_last: Option<Gc>,
    pc: usize,
    /// The interned `@@call` symbol, used by `APPLY` to dispatch
    /// first-class callable tables.
    pub(crate) call_meta: Value,
    /// The environment a fully-unwound state (`ccl == None`) resets to,
    /// mirroring `set_cc`'s `s->env = _eu_global_env(s)` when handed a null
    /// continuation.
    pub(crate) global_env: Gc,
}

impl State {
    pub fn new(heap: &mut Heap, symbols: &mut SymbolTable, global_env: Gc) -> Self {
        let call_meta = Value::Object(symbols.intern(heap, "@@call"));
        State {
            acc: Value::Null,
            env: Some(global_env),
            ccl: None,
            previous: None,
            rib: Value::Null,
            rib_last: None,
            call_meta,
            global_env,
            pc: 0,
        }
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub(crate) fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    /// Roots the GC needs to keep reachable for a collection run mid-loop;
    /// callers layer their own value roots (e.g. a native procedure's own
    /// pending arguments) on top.
    pub fn roots(&self) -> impl Iterator<Item = Gc> + '_ {
        [
            self.acc.as_object(),
            self.env,
            self.ccl,
            self.previous,
            self.rib.as_object(),
            self.rib_last,
            Some(self.global_env),
        ]
        .into_iter()
        .flatten()
    }

    /// Whether the loop has a frame left to execute.
    pub fn is_running(&self) -> bool {
        self.ccl.is_some()
    }
}
