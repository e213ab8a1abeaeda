//! Textual disassembly of compiled code, for debugging and the REPL's
//! optional `,disassemble` style inspection. Not used by `execute` itself.

use std::fmt::{self, Write as _};

use europa_compiler::{unpack, unpack_offset, Opcode};
use europa_value::object::Gc;
use europa_value::{HeapObject, Prototype, SymbolTable};

fn opcode_mnemonic(op: Opcode) -> &'static str {
    match op {
        Opcode::Nop => "NOP",
        Opcode::Refer => "REFER",
        Opcode::Const => "CONST",
        Opcode::Close => "CLOSE",
        Opcode::Test => "TEST",
        Opcode::Jump => "JUMP",
        Opcode::Assign => "ASSIGN",
        Opcode::Define => "DEFINE",
        Opcode::Argument => "ARGUMENT",
        Opcode::Frame => "FRAME",
        Opcode::Conti => "CONTI",
        Opcode::Apply => "APPLY",
        Opcode::Return => "RETURN",
        Opcode::Halt => "HALT",
    }
}

/// Writes one prototype's code listing, recursing into its sub-prototypes.
/// `symbols` lets `REFER`/`ASSIGN`/`DEFINE` operands print the variable
/// name instead of just a constant-pool index.
pub fn disassemble_proto(out: &mut impl fmt::Write, proto: &Prototype, symbols: &SymbolTable, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    writeln!(
        out,
        "{indent}proto {} ({} instructions, {} constants, {} sub-protos)",
        proto.name.map(|s| symbols.resolve(s)).unwrap_or("<anonymous>"),
        proto.code.len(),
        proto.constants.len(),
        proto.sub_protos.len()
    )?;

    for (pc, &word) in proto.code.iter().enumerate() {
        match unpack(word) {
            Ok((op, payload)) => {
                write!(out, "{indent}  {pc:>4}: {}", opcode_mnemonic(op))?;
                if op.takes_offset() {
                    let offset = unpack_offset(payload);
                    let target = pc as i64 + offset as i64;
                    writeln!(out, " {offset:+} -> {target}")?;
                } else if matches!(op, Opcode::Refer | Opcode::Assign | Opcode::Define) {
                    let name = proto
                        .constants
                        .get(payload as usize)
                        .and_then(|v| v.as_object())
                        .and_then(|gc| gc.as_symbol())
                        .map(|s| symbols.resolve(s))
                        .unwrap_or("?");
                    writeln!(out, " {payload}  ; {name}")?;
                } else {
                    writeln!(out, " {payload}")?;
                }
            }
            Err(byte) => writeln!(out, "{indent}  {pc:>4}: <unknown opcode {byte}>")?,
        }
    }

    for sub in &proto.sub_protos {
        if let Some(sub_proto) = sub.as_prototype() {
            disassemble_proto(out, sub_proto, symbols, depth + 1)?;
        }
    }

    Ok(())
}

/// Disassembles whatever heap value is handed in: a prototype directly, a
/// closure's prototype (native closures print as an opaque stub), or a
/// continuation's resumption point.
pub fn disassemble(value: Gc, symbols: &SymbolTable) -> String {
    let mut out = String::new();
    match &*value {
        HeapObject::Prototype(proto) => {
            let _ = disassemble_proto(&mut out, proto, symbols, 0);
        }
        HeapObject::Closure(closure) => {
            if let Some(native) = closure.native {
                let _ = writeln!(out, "<native closure at {:p}>", native as *const ());
            } else if let Some(proto_gc) = closure.proto {
                if let Some(proto) = proto_gc.as_prototype() {
                    let _ = disassemble_proto(&mut out, proto, symbols, 0);
                }
            }
        }
        HeapObject::Continuation(cont) => {
            let _ = writeln!(out, "<continuation resuming at pc {}>", cont.pc);
        }
        other => {
            let _ = writeln!(out, "<cannot disassemble a {}>", other.type_name());
        }
    }
    out
}
