//! Embedding surface: a `Runtime` owns one heap, one symbol table, and one
//! global environment, and drives read -> compile -> execute for a host the
//! way `eu_do_string`/`eu_do_file` do over a `eu_state`.

mod callbacks;
pub mod config;
pub mod error;

use std::cell::RefCell;
use std::path::Path;

use europa_compiler::Compiler;
use europa_port::{FilePort, StderrPort, StdinPort, StdoutPort};
use europa_reader::Reader;
use europa_value::object::{Gc, Heap};
use europa_value::{Closure, Environment, ErrorKind, ErrorObj, HeapObject, SymbolTable, Value};
use europa_vm::{do_closure, State};

pub use config::RuntimeConfig;
pub use error::{RuntimeError, RuntimeResult};

/// One embeddable interpreter instance: a heap, an intern table, a global
/// environment, and whatever error a previous call left pending. Mirrors
/// the reference implementation's `eu_state`/`eu_global` pair collapsed
/// into a single owner, since Rust's ownership already gives each
/// `Runtime` exclusive access to its heap without a separate "main state
/// vs. other states sharing a Global" distinction.
pub struct Runtime {
    heap: Heap,
    symbols: SymbolTable,
    global_env: Gc,
    pending_error: Option<ErrorObj>,
    config: RuntimeConfig,
}

impl Runtime {
    /// Creates a fresh interpreter with an empty global environment. Does
    /// not bind the standard library or standard ports - call
    /// [`Runtime::register_standard_library`] and
    /// [`Runtime::set_standard_ports`] afterward, the same two-step
    /// sequence the embedding API documents.
    pub fn new(config: RuntimeConfig) -> Self {
        let mut heap = Heap::new(config.gc.into());
        let symbols = SymbolTable::new();
        let global_env = heap.alloc(HeapObject::Table(RefCell::new(Environment::new(None))));
        Runtime {
            heap,
            symbols,
            global_env,
            pending_error: None,
            config,
        }
    }

    /// Finalizes the runtime. Heap reclamation already happens on drop;
    /// this only exists to give a host a named point to call, and
    /// optionally runs one last collection pass first so a native
    /// extension's use-after-free bugs surface during development instead
    /// of silently relying on process exit to clean up.
    pub fn terminate(mut self) {
        if self.config.collect_on_terminate {
            let _ = self.heap.collect(std::iter::once(self.global_env));
        }
    }

    /// Binds every native procedure from the standard library (pairs,
    /// numbers, predicates, strings, I/O, plus the VM-reentrant `apply`,
    /// `map`, `for-each`) into the global environment.
    pub fn register_standard_library(&mut self) {
        let env_gc = self.global_env;
        let HeapObject::Table(env_cell) = &*env_gc else {
            unreachable!("global_env always points at a Table")
        };
        let mut env = env_cell.borrow_mut();
        europa_stdlib::register_standard_library(&mut self.heap, &mut self.symbols, &mut env);
        callbacks::register(&mut self.heap, &mut self.symbols, &mut env);
    }

    /// Binds `current-input-port`/`current-output-port`/`current-error-port`
    /// to fresh stdio-backed ports in the global environment.
    pub fn set_standard_ports(&mut self) {
        self.bind_port("current-input-port", StdinPort::default());
        self.bind_port("current-output-port", StdoutPort::default());
        self.bind_port("current-error-port", StderrPort::default());
    }

    fn bind_port(&mut self, name: &str, backend: impl europa_value::PortBackend + 'static) {
        let port_gc = self.heap.alloc(HeapObject::Port(RefCell::new(Box::new(backend))));
        let key = Value::Object(self.symbols.intern(&mut self.heap, name));
        let env_gc = self.global_env;
        let HeapObject::Table(env_cell) = &*env_gc else {
            unreachable!("global_env always points at a Table")
        };
        env_cell.borrow_mut().define(key, Value::Object(port_gc));
    }

    /// Reads and evaluates every top-level form in `text` in sequence,
    /// returning the value of the last one. On failure, stashes the
    /// translated error for a later [`Runtime::recover`] call in addition
    /// to returning it, matching `do_string`'s "leaves the state in an
    /// error status" contract.
    pub fn do_string(&mut self, text: &str) -> RuntimeResult<Value> {
        self.eval_source(text).inspect_err(|err| {
            tracing::warn!(%err, "do_string failed, error is now pending");
            self.pending_error = Some(err.to_error_obj());
        })
    }

    /// Same as [`Runtime::do_string`], reading the source from a file
    /// first.
    pub fn do_file(&mut self, path: impl AsRef<Path>) -> RuntimeResult<Value> {
        let text = std::fs::read_to_string(path)?;
        self.do_string(&text)
    }

    fn eval_source(&mut self, text: &str) -> RuntimeResult<Value> {
        let datums = {
            let mut reader = Reader::new(&mut self.heap, &mut self.symbols);
            reader.read_all(text)?
        };

        let proto_gc = {
            let mut compiler = Compiler::new(&mut self.heap, &mut self.symbols);
            compiler.compile_toplevel(&datums)?
        };

        let closure = Closure {
            native: None,
            proto: Some(proto_gc),
            env: Some(self.global_env),
            own_env: false,
            name: None,
        };
        let closure_gc = self.heap.alloc(HeapObject::Closure(closure));

        let mut state = State::new(&mut self.heap, &mut self.symbols, self.global_env);
        let value = do_closure(&mut state, &mut self.heap, &mut self.symbols, closure_gc, Value::Null)?;
        Ok(value)
    }

    /// Raises an error on the runtime without unwinding a call in
    /// progress - for a host that wants to report a problem discovered
    /// outside any `do_string`/`do_file` call (e.g. a failed native
    /// resource open before the embedder decides to surface it to Scheme
    /// code at all).
    pub fn set_error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.pending_error = Some(ErrorObj::new(kind, message));
    }

    /// Same as [`Runtime::set_error`], but with a nested cause - the
    /// `set_error_nf(..., fmt, ...)` varargs form is just `set_error` plus
    /// `format!` at the call site in Rust, so there is no separate
    /// formatting entry point.
    pub fn set_error_nested(&mut self, kind: ErrorKind, message: impl Into<String>, nested: Gc) {
        self.pending_error = Some(ErrorObj::with_nested(kind, message, nested));
    }

    /// Pops and returns whatever error is pending, clearing it - the same
    /// one-shot contract the REPL relies on to print and continue.
    pub fn recover(&mut self) -> Option<ErrorObj> {
        self.pending_error.take()
    }

    /// Opens a real file at `path` as an input or output port and binds it
    /// under `name` in the global environment, for a host that wants to
    /// expose a path outside the process's working directory without
    /// going through `open-input-file`/`open-output-file` from Scheme.
    pub fn bind_file_port(&mut self, name: &str, path: impl AsRef<Path>, input: bool, output: bool) -> RuntimeResult<()> {
        let port = FilePort::open(path, input, output)?;
        self.bind_port(name, port);
        Ok(())
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> Runtime {
        let mut rt = Runtime::new(RuntimeConfig::default());
        rt.register_standard_library();
        rt.set_standard_ports();
        rt
    }

    #[test]
    fn a_syntax_error_is_both_returned_and_recoverable() {
        let mut rt = runtime();
        assert!(rt.do_string("(unterminated").is_err());
        assert!(rt.recover().is_some());
        assert!(rt.recover().is_none());
    }

    #[test]
    fn apply_spreads_the_final_list_argument() {
        let mut rt = runtime();
        let v = rt.do_string("(apply + 1 2 (list 3 4))").unwrap();
        assert!(matches!(v, Value::Fixnum(10)));
    }

    #[test]
    fn map_collects_results_in_order() {
        let mut rt = runtime();
        let v = rt.do_string("(map (lambda (x) (* x x)) (list 1 2 3))").unwrap();
        assert_eq!(europa_stdlib::write_string(rt.symbols(), v), "(1 4 9)");
    }

    #[test]
    fn for_each_runs_for_side_effects_and_returns_unspecified() {
        let mut rt = runtime();
        rt.do_string("(define total 0)").unwrap();
        rt.do_string("(for-each (lambda (x) (set! total (+ total x))) (list 1 2 3))").unwrap();
        let v = rt.do_string("total").unwrap();
        assert!(matches!(v, Value::Fixnum(6)));
    }

    #[test]
    fn applying_a_continuation_through_apply_is_rejected() {
        let mut rt = runtime();
        let err = rt.do_string("(apply (call/cc (lambda (k) k)) (list 1))").unwrap_err();
        assert!(matches!(err, RuntimeError::Vm(europa_vm::VmError::Raised(_))));
    }
}
