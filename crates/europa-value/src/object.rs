use std::cell::{Cell, RefCell};

use europa_util::Symbol;

use crate::environment::Environment;
use crate::error::ErrorObj;
use crate::port::PortBackend;
use crate::symbols::SymbolTable;
use crate::value::Value;

pub type Heap = europa_gc::Heap<HeapObject>;
pub type Gc = europa_gc::Gc<HeapObject>;

/// Context passed to a native (Rust-implemented) procedure: just enough to
/// allocate new heap objects. Deliberately not the whole VM `State` - a
/// native function works on already-evaluated argument values, the same
/// way the reference implementation's C closures receive a rib of already
/// computed argument values rather than unevaluated syntax.
pub struct NativeContext<'a> {
    pub heap: &'a mut Heap,
    /// Read/write access to the symbol intern table - needed by
    /// `string->symbol`/`symbol->string` and by `display`/`write` to
    /// resolve a symbol's text.
    pub symbols: &'a mut SymbolTable,
}

pub type NativeFn = fn(&mut NativeContext, &[Value]) -> Result<Value, ErrorObj>;

/// How a closure's formal parameter list is shaped, mirroring
/// `check_formals`'s three accepted shapes in the reference compiler.
#[derive(Debug, Clone)]
pub enum Formals {
    /// `(a b c)` - exactly this many arguments.
    Fixed(Vec<Symbol>),
    /// `(a b . rest)` - at least this many, with the remainder bound to
    /// `rest` as a list.
    Variadic(Vec<Symbol>, Symbol),
    /// A bare symbol formals list - the whole argument rib is bound to it.
    AllRest(Symbol),
}

impl Formals {
    pub fn required_count(&self) -> usize {
        match self {
            Formals::Fixed(names) => names.len(),
            Formals::Variadic(names, _) => names.len(),
            Formals::AllRest(_) => 0,
        }
    }

    pub fn is_variadic(&self) -> bool {
        !matches!(self, Formals::Fixed(_))
    }
}

/// A compiled function body: instruction stream, constant pool and nested
/// sub-prototypes (each itself a `HeapObject::Prototype`, closed over at
/// `CLOSE` time). Field names follow `code.c`'s `eu_proto` closely.
#[derive(Debug, Clone)]
pub struct Prototype {
    pub formals: Formals,
    /// Packed instruction words: opcode in the high byte, operand in the
    /// low 24 bits, per `SPEC_FULL.md` §4.5's instruction encoding.
    pub code: Vec<u32>,
    pub constants: Vec<Value>,
    pub sub_protos: Vec<europa_gc::Gc<HeapObject>>,
    pub name: Option<Symbol>,
}

impl Prototype {
    pub fn new(formals: Formals) -> Self {
        Prototype {
            formals,
            code: Vec::new(),
            constants: Vec::new(),
            sub_protos: Vec::new(),
            name: None,
        }
    }

    /// Structural (`equal?`) dedup of the constant pool, matching
    /// `euproto_add_constant`'s linear search-or-insert contract.
    pub fn add_constant(&mut self, value: Value, eq: impl Fn(&Value, &Value) -> bool) -> u32 {
        for (i, existing) in self.constants.iter().enumerate() {
            if eq(existing, &value) {
                return i as u32;
            }
        }
        self.constants.push(value);
        (self.constants.len() - 1) as u32
    }

    pub fn add_sub_proto(&mut self, proto: europa_gc::Gc<HeapObject>) -> u32 {
        self.sub_protos.push(proto);
        (self.sub_protos.len() - 1) as u32
    }
}

/// A closure pairs a callable (native function or compiled prototype) with
/// a captured environment. `own_env == false` means applying it runs
/// directly inside `env` instead of creating a fresh child frame - this is
/// how the reference implementation's top-level closure (built by
/// `eucode_compile`) executes straight in the global environment rather
/// than shadowing it with an empty one.
#[derive(Clone)]
pub struct Closure {
    pub native: Option<NativeFn>,
    pub proto: Option<europa_gc::Gc<HeapObject>>,
    pub env: Option<europa_gc::Gc<HeapObject>>,
    pub own_env: bool,
    pub name: Option<Symbol>,
}

impl Closure {
    pub fn scheme(proto: europa_gc::Gc<HeapObject>, env: europa_gc::Gc<HeapObject>) -> Self {
        Closure {
            native: None,
            proto: Some(proto),
            env: Some(env),
            own_env: true,
            name: None,
        }
    }

    pub fn native(f: NativeFn) -> Self {
        Closure {
            native: Some(f),
            proto: None,
            env: None,
            own_env: false,
            name: None,
        }
    }

    pub fn is_native(&self) -> bool {
        self.native.is_some()
    }
}

/// A captured point of execution, enough to resume a computation exactly
/// where `call/cc` captured it: the caller-side frame (`previous`), the
/// environment and closure in effect, the program counter to resume at, and
/// the argument rib under construction (with `rib_last` tracking the tail
/// pair for O(1) append, replacing the original's raw slot pointer).
#[derive(Clone)]
pub struct Continuation {
    pub previous: Option<europa_gc::Gc<HeapObject>>,
    pub env: Option<europa_gc::Gc<HeapObject>>,
    pub closure: Option<europa_gc::Gc<HeapObject>>,
    pub rib: Value,
    pub rib_last: Option<europa_gc::Gc<HeapObject>>,
    pub pc: usize,
}

/// The closed set of heap object variants, matching `enum eu_type`'s
/// collectable members (`STATE`/`GLOBAL`/`CPOINTER` are not represented
/// here - see `DESIGN.md`'s Open Questions, they are plain owning structs
/// and an immediate value respectively, never GC-managed payloads).
pub enum HeapObject {
    Symbol(Symbol),
    Str(RefCell<String>),
    Error(ErrorObj),
    Pair(Cell<Value>, Cell<Value>),
    Vector(RefCell<Vec<Value>>),
    Bytevector(RefCell<Vec<u8>>),
    Table(RefCell<Environment>),
    Port(RefCell<Box<dyn PortBackend>>),
    Prototype(Prototype),
    Closure(Closure),
    Continuation(Continuation),
}

impl HeapObject {
    pub fn type_name(&self) -> &'static str {
        match self {
            HeapObject::Symbol(_) => "symbol",
            HeapObject::Str(_) => "string",
            HeapObject::Error(_) => "error",
            HeapObject::Pair(..) => "pair",
            HeapObject::Vector(_) => "vector",
            HeapObject::Bytevector(_) => "bytevector",
            HeapObject::Table(_) => "table",
            HeapObject::Port(_) => "port",
            HeapObject::Prototype(_) => "prototype",
            HeapObject::Closure(_) => "closure",
            HeapObject::Continuation(_) => "continuation",
        }
    }

    pub fn as_pair(&self) -> Option<(&Cell<Value>, &Cell<Value>)> {
        match self {
            HeapObject::Pair(car, cdr) => Some((car, cdr)),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            HeapObject::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Closure> {
        match self {
            HeapObject::Closure(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_continuation(&self) -> Option<&Continuation> {
        match self {
            HeapObject::Continuation(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_prototype(&self) -> Option<&Prototype> {
        match self {
            HeapObject::Prototype(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_environment(&self) -> Option<&RefCell<Environment>> {
        match self {
            HeapObject::Table(env) => Some(env),
            _ => None,
        }
    }
}
