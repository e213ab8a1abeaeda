//! Textual rendering of values for `display`/`write`, grounded on `write.c`'s
//! `euport_write_simple`/`euport_display`. Builds a `String` in memory rather
//! than writing byte-by-byte to a port, since every port this crate knows
//! about buffers UTF-8 text anyway.

use std::fmt::Write as _;

use europa_value::{HeapObject, SymbolTable, Value};

fn write_char_literal(out: &mut String, c: char) {
    out.push_str("#\\");
    match c {
        '\n' => out.push_str("newline"),
        ' ' => out.push_str("space"),
        '\0' => out.push_str("null"),
        '\t' => out.push_str("tab"),
        '\u{8}' => out.push_str("backspace"),
        _ => out.push(c),
    }
}

fn write_string_literal(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

fn write_pair(out: &mut String, symbols: &SymbolTable, mut v: Value, write: bool) {
    out.push('(');
    let mut first = true;
    loop {
        match v {
            Value::Object(gc) => match &*gc {
                HeapObject::Pair(car, cdr) => {
                    if !first {
                        out.push(' ');
                    }
                    first = false;
                    render(out, symbols, car.get(), write);
                    v = cdr.get();
                }
                _ => {
                    out.push_str(" . ");
                    render(out, symbols, v, write);
                    break;
                }
            },
            Value::Null => break,
            _ => {
                out.push_str(" . ");
                render(out, symbols, v, write);
                break;
            }
        }
    }
    out.push(')');
}

fn render(out: &mut String, symbols: &SymbolTable, v: Value, write: bool) {
    match v {
        Value::Null => out.push_str("()"),
        Value::Boolean(b) => out.push_str(if b { "#t" } else { "#f" }),
        Value::Fixnum(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Real(r) => {
            let _ = write!(out, "{r}");
        }
        Value::Character(c) => {
            if write {
                write_char_literal(out, c);
            } else {
                out.push(c);
            }
        }
        Value::Eof => out.push_str("#<eof>"),
        Value::CPointer(_) => out.push_str("#<cpointer>"),
        Value::Object(gc) => match &*gc {
            HeapObject::Symbol(sym) => out.push_str(symbols.resolve(*sym)),
            HeapObject::Str(s) => {
                if write {
                    write_string_literal(out, &s.borrow());
                } else {
                    out.push_str(&s.borrow());
                }
            }
            HeapObject::Error(err) => {
                let _ = write!(out, "#<error: {}>", err.message);
            }
            HeapObject::Pair(..) => write_pair(out, symbols, v, write),
            HeapObject::Vector(items) => {
                out.push_str("#(");
                for (i, item) in items.borrow().iter().enumerate() {
                    if i != 0 {
                        out.push(' ');
                    }
                    render(out, symbols, *item, write);
                }
                out.push(')');
            }
            HeapObject::Bytevector(bytes) => {
                out.push_str("#u8(");
                for (i, b) in bytes.borrow().iter().enumerate() {
                    if i != 0 {
                        out.push(' ');
                    }
                    let _ = write!(out, "{b}");
                }
                out.push(')');
            }
            HeapObject::Table(_) => out.push_str("#<table>"),
            HeapObject::Port(_) => out.push_str("#<port>"),
            HeapObject::Prototype(_) => out.push_str("#<prototype>"),
            HeapObject::Closure(_) => out.push_str("#<procedure>"),
            HeapObject::Continuation(_) => out.push_str("#<continuation>"),
        },
    }
}

pub fn write_string(symbols: &SymbolTable, v: Value) -> String {
    let mut out = String::new();
    render(&mut out, symbols, v, true);
    out
}

pub fn display_string(symbols: &SymbolTable, v: Value) -> String {
    let mut out = String::new();
    render(&mut out, symbols, v, false);
    out
}
