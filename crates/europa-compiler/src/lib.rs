//! Single-pass compiler from `Value` datums to register-and-rib bytecode.

mod compiler;
mod error;
mod opcode;

pub use compiler::Compiler;
pub use error::{CompileError, CompileResult};
pub use opcode::{pack, pack_offset, unpack, unpack_offset, Opcode};
