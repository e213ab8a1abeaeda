//! The tagged `Value` type and the heap object variants it can point at.
//!
//! Mirrors `enum eu_type`/`union eu_values` from the reference
//! implementation's `object.h`, but as a single Rust sum type instead of a
//! tag byte plus untagged union - see `SPEC_FULL.md` §9's note on this
//! being a deliberate simplification, not a loss of fidelity.

pub mod environment;
pub mod equality;
pub mod error;
pub mod object;
pub mod port;
pub mod symbols;
pub mod trace;
pub mod value;

pub use environment::Environment;
pub use error::{ErrorKind, ErrorObj};
pub use object::{Closure, Continuation, Formals, HeapObject, NativeContext, NativeFn, Prototype};
pub use port::PortBackend;
pub use symbols::SymbolTable;
pub use value::Value;

pub type Heap = europa_gc::Heap<HeapObject>;
pub type Gc = europa_gc::Gc<HeapObject>;
