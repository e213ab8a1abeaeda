use europa_value::ErrorObj;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("invalid constant index at {inst} instruction")]
    InvalidConstantIndex { inst: &'static str },

    #[error("invalid subproto index at {inst} instruction")]
    InvalidSubprotoIndex { inst: &'static str },

    #[error("invalid jump offset for {inst} instruction")]
    InvalidJumpOffset { inst: &'static str },

    #[error("unrecognized opcode byte {0}")]
    UnknownOpcode(u8),

    #[error("program counter ran past the end of the code buffer")]
    PcOutOfBounds,

    #[error("no environment in effect")]
    NoEnvironment,

    #[error("could not reference an unbound variable")]
    UnboundVariable,

    #[error("could not set an unbound variable")]
    UnboundAssignment,

    #[error("tried applying/calling something of invalid type {0}")]
    NotApplicable(&'static str),

    #[error("could not call table: invalid or missing @@call entry")]
    TableNotCallable,

    #[error("closure application arguments aren't a proper list")]
    ImproperArgumentList,

    #[error("expected {expected} arguments in closure application, got {got}")]
    Arity { expected: String, got: usize },

    /// A Scheme-level error raised by a native procedure or by the VM
    /// itself; carries the heap-allocated error object so callers can
    /// inspect/report it the way `state->error` does in the reference
    /// implementation.
    #[error("{0}")]
    Raised(ErrorObj),

    #[error("garbage collection failed: {0}")]
    Collect(#[from] europa_gc::GcError),
}

pub type VmResult<T> = std::result::Result<T, VmError>;
