use europa_util::Symbol;
use europa_value::equality::equal;
use europa_value::object::{Gc, Heap};
use europa_value::{Formals, HeapObject, Prototype, SymbolTable, Value};

use crate::error::{CompileError, CompileResult};
use crate::opcode::{pack, pack_offset, unpack, unpack_offset, Opcode};

struct Keywords {
    quote: Symbol,
    lambda: Symbol,
    if_: Symbol,
    set_bang: Symbol,
    define: Symbol,
    call_cc: Symbol,
    call_with_current_continuation: Symbol,
    begin: Symbol,
}

/// Single-pass compiler: one walk over a `Value` datum produces one
/// `Prototype`, with sub-prototypes for every `lambda`/`define`-with-formals
/// nested inside it.
pub struct Compiler<'h> {
    heap: &'h mut Heap,
    keywords: Keywords,
}

impl<'h> Compiler<'h> {
    pub fn new(heap: &'h mut Heap, symbols: &mut SymbolTable) -> Self {
        let keywords = Keywords {
            quote: intern(heap, symbols, "quote"),
            lambda: intern(heap, symbols, "lambda"),
            if_: intern(heap, symbols, "if"),
            set_bang: intern(heap, symbols, "set!"),
            define: intern(heap, symbols, "define"),
            call_cc: intern(heap, symbols, "call/cc"),
            call_with_current_continuation: intern(heap, symbols, "call-with-current-continuation"),
            begin: intern(heap, symbols, "begin"),
        };
        Compiler { heap, keywords }
    }

    /// Compiles a whole program (a sequence of top-level datums) into one
    /// prototype whose body is an implicit `begin` over all of them,
    /// in tail position so the last form's value becomes the result.
    pub fn compile_toplevel(&mut self, forms: &[Value]) -> CompileResult<Gc> {
        let mut proto = Prototype::new(Formals::Fixed(Vec::new()));
        self.compile_body(&mut proto, forms, true)?;
        proto.code.push(pack(Opcode::Return, 0));
        Ok(self.heap.alloc(HeapObject::Prototype(proto)))
    }

    fn compile_body(&mut self, proto: &mut Prototype, forms: &[Value], tail: bool) -> CompileResult<()> {
        if forms.is_empty() {
            return Err(CompileError::Arity {
                form: "body",
                expected: "at least 1",
                got: 0,
            });
        }
        let (last, init) = forms.split_last().unwrap();
        for form in init {
            self.compile(proto, *form, false)?;
        }
        self.compile(proto, *last, tail)
    }

    fn compile(&mut self, proto: &mut Prototype, datum: Value, tail: bool) -> CompileResult<()> {
        match datum {
            Value::Null => Err(CompileError::EmptyApplication),
            Value::Object(gc) => match &*gc {
                HeapObject::Symbol(_) => {
                    let k = proto.add_constant(datum, equal);
                    proto.code.push(pack(Opcode::Refer, k));
                    Ok(())
                }
                HeapObject::Pair(car, cdr) => {
                    let head = car.get();
                    let rest = cdr.get();
                    if let Some(sym) = head.as_object().and_then(|g| g.as_symbol()) {
                        if sym == self.keywords.quote {
                            return self.compile_quote(proto, rest);
                        } else if sym == self.keywords.lambda {
                            return self.compile_lambda_form(proto, rest);
                        } else if sym == self.keywords.if_ {
                            return self.compile_if(proto, rest, tail);
                        } else if sym == self.keywords.set_bang {
                            return self.compile_set(proto, rest);
                        } else if sym == self.keywords.define {
                            return self.compile_define(proto, rest);
                        } else if sym == self.keywords.call_cc
                            || sym == self.keywords.call_with_current_continuation
                        {
                            return self.compile_call_cc(proto, rest, tail);
                        } else if sym == self.keywords.begin {
                            let (items, list_tail) = decompose_list(rest);
                            check_proper(&list_tail, "begin")?;
                            return self.compile_body(proto, &items, tail);
                        }
                    }
                    self.compile_application(proto, datum, tail)
                }
                _ => self.compile_literal(proto, datum),
            },
            _ => self.compile_literal(proto, datum),
        }
    }

    fn compile_literal(&mut self, proto: &mut Prototype, datum: Value) -> CompileResult<()> {
        let k = proto.add_constant(datum, equal);
        proto.code.push(pack(Opcode::Const, k));
        Ok(())
    }

    fn compile_quote(&mut self, proto: &mut Prototype, args: Value) -> CompileResult<()> {
        let (items, list_tail) = decompose_list(args);
        check_proper(&list_tail, "quote")?;
        if items.len() != 1 {
            return Err(CompileError::Arity {
                form: "quote",
                expected: "1",
                got: items.len(),
            });
        }
        self.compile_literal(proto, items[0])
    }

    fn compile_lambda_form(&mut self, proto: &mut Prototype, args: Value) -> CompileResult<()> {
        let (items, list_tail) = decompose_list(args);
        check_proper(&list_tail, "lambda")?;
        if items.is_empty() {
            return Err(CompileError::Malformed {
                form: "lambda",
                detail: "missing formals".into(),
            });
        }
        self.compile_lambda_body(proto, items[0], &items[1..])
    }

    /// Shared by `lambda` and `define`'s function shorthand: builds a fresh
    /// sub-prototype, compiles `body` into it in tail position, and emits a
    /// `CLOSE` referencing it in `proto`.
    fn compile_lambda_body(
        &mut self,
        proto: &mut Prototype,
        formals: Value,
        body: &[Value],
    ) -> CompileResult<()> {
        let formals = check_formals(formals)?;
        let mut sub = Prototype::new(formals);
        self.compile_body(&mut sub, body, true)?;
        sub.code.push(pack(Opcode::Return, 0));
        let sub_gc = self.heap.alloc(HeapObject::Prototype(sub));
        let idx = proto.add_sub_proto(sub_gc);
        proto.code.push(pack(Opcode::Close, idx));
        Ok(())
    }

    fn compile_if(&mut self, proto: &mut Prototype, args: Value, tail: bool) -> CompileResult<()> {
        let (items, list_tail) = decompose_list(args);
        check_proper(&list_tail, "if")?;
        if items.len() != 2 && items.len() != 3 {
            return Err(CompileError::Arity {
                form: "if",
                expected: "2 or 3",
                got: items.len(),
            });
        }
        self.compile(proto, items[0], false)?;
        let test_at = proto.code.len();
        proto.code.push(pack_offset(Opcode::Test, 0));
        self.compile(proto, items[1], tail)?;
        if let Some(&else_form) = items.get(2) {
            let jump_at = proto.code.len();
            proto.code.push(pack_offset(Opcode::Jump, 0));
            patch(proto, test_at, proto.code.len());
            self.compile(proto, else_form, tail)?;
            patch(proto, jump_at, proto.code.len());
        } else {
            patch(proto, test_at, proto.code.len());
        }
        Ok(())
    }

    fn compile_set(&mut self, proto: &mut Prototype, args: Value) -> CompileResult<()> {
        let (items, list_tail) = decompose_list(args);
        check_proper(&list_tail, "set!")?;
        if items.len() != 2 {
            return Err(CompileError::Arity {
                form: "set!",
                expected: "2",
                got: items.len(),
            });
        }
        require_symbol(items[0], "set!")?;
        self.compile(proto, items[1], false)?;
        let k = proto.add_constant(items[0], equal);
        proto.code.push(pack(Opcode::Assign, k));
        Ok(())
    }

    fn compile_define(&mut self, proto: &mut Prototype, args: Value) -> CompileResult<()> {
        let (items, list_tail) = decompose_list(args);
        check_proper(&list_tail, "define")?;
        if items.is_empty() {
            return Err(CompileError::Arity {
                form: "define",
                expected: "at least 1",
                got: 0,
            });
        }
        match items[0] {
            Value::Object(gc) if gc.as_symbol().is_some() => {
                if items.len() != 2 {
                    return Err(CompileError::Arity {
                        form: "define",
                        expected: "2",
                        got: items.len(),
                    });
                }
                self.compile(proto, items[1], false)?;
                let k = proto.add_constant(items[0], equal);
                proto.code.push(pack(Opcode::Define, k));
                Ok(())
            }
            Value::Object(gc) => match &*gc {
                HeapObject::Pair(car, cdr) => {
                    let name = car.get();
                    require_symbol(name, "define")?;
                    let formals = cdr.get();
                    self.compile_lambda_body(proto, formals, &items[1..])?;
                    let k = proto.add_constant(name, equal);
                    proto.code.push(pack(Opcode::Define, k));
                    Ok(())
                }
                _ => Err(CompileError::Malformed {
                    form: "define",
                    detail: "first argument must be a symbol or (name . formals)".into(),
                }),
            },
            _ => Err(CompileError::Malformed {
                form: "define",
                detail: "first argument must be a symbol or (name . formals)".into(),
            }),
        }
    }

    fn compile_call_cc(&mut self, proto: &mut Prototype, args: Value, tail: bool) -> CompileResult<()> {
        let (items, list_tail) = decompose_list(args);
        check_proper(&list_tail, "call/cc")?;
        if items.len() != 1 {
            return Err(CompileError::Arity {
                form: "call/cc",
                expected: "1",
                got: items.len(),
            });
        }
        let conti_at = proto.code.len();
        proto.code.push(pack_offset(Opcode::Conti, 0));
        let frame_at = if !tail {
            let at = proto.code.len();
            proto.code.push(pack_offset(Opcode::Frame, 0));
            Some(at)
        } else {
            None
        };
        proto.code.push(pack(Opcode::Argument, 0));
        self.compile(proto, items[0], false)?;
        proto.code.push(pack(Opcode::Apply, 0));
        if let Some(at) = frame_at {
            patch(proto, at, proto.code.len());
        }
        patch(proto, conti_at, proto.code.len());
        Ok(())
    }

    fn compile_application(&mut self, proto: &mut Prototype, datum: Value, tail: bool) -> CompileResult<()> {
        let (items, list_tail) = decompose_list(datum);
        check_proper(&list_tail, "application")?;
        let frame_at = if !tail {
            let at = proto.code.len();
            proto.code.push(pack_offset(Opcode::Frame, 0));
            Some(at)
        } else {
            None
        };
        for arg in &items[1..] {
            self.compile(proto, *arg, false)?;
            proto.code.push(pack(Opcode::Argument, 0));
        }
        self.compile(proto, items[0], false)?;
        proto.code.push(pack(Opcode::Apply, 0));
        if let Some(at) = frame_at {
            patch(proto, at, proto.code.len());
        }
        Ok(())
    }
}

fn intern(heap: &mut Heap, symbols: &mut SymbolTable, text: &str) -> Symbol {
    symbols
        .intern(heap, text)
        .as_symbol()
        .expect("SymbolTable::intern always allocates HeapObject::Symbol")
}

/// Offsets are relative to the jumping instruction's own index - the VM adds
/// the offset to `pc` without first advancing past the current instruction,
/// matching `code.c`'s `ITEST(length + 1 - index)`-style patch formulas.
fn patch(proto: &mut Prototype, at: usize, target: usize) {
    let (op, _) = unpack(proto.code[at]).expect("patched instruction was emitted by this compiler");
    let offset = target as i32 - at as i32;
    proto.code[at] = pack_offset(op, offset);
}

/// Walks a Scheme list, returning its elements and whatever the final `cdr`
/// is (`Value::Null` for a proper list, anything else for an improper one
/// or a bare non-pair "list").
fn decompose_list(mut value: Value) -> (Vec<Value>, Value) {
    let mut items = Vec::new();
    loop {
        match value {
            Value::Object(gc) => match &*gc {
                HeapObject::Pair(car, cdr) => {
                    items.push(car.get());
                    value = cdr.get();
                }
                _ => break,
            },
            _ => break,
        }
    }
    (items, value)
}

fn check_proper(tail: &Value, form: &'static str) -> CompileResult<()> {
    if tail.is_null() {
        Ok(())
    } else {
        Err(CompileError::ImproperList { form })
    }
}

fn require_symbol(value: Value, form: &'static str) -> CompileResult<()> {
    match value.as_object().and_then(|gc| gc.as_symbol()) {
        Some(_) => Ok(()),
        None => Err(CompileError::Malformed {
            form,
            detail: "expected a symbol".into(),
        }),
    }
}

/// `check_formals`: a formals list must be a symbol, a proper list of
/// symbols, or an improper list of symbols (dotted tail symbol).
fn check_formals(formals: Value) -> CompileResult<Formals> {
    let (items, tail) = decompose_list(formals);
    if items.is_empty() {
        return match tail {
            Value::Null => Ok(Formals::Fixed(Vec::new())),
            Value::Object(gc) => match gc.as_symbol() {
                Some(sym) => Ok(Formals::AllRest(sym)),
                None => Err(CompileError::InvalidFormals { form: "lambda" }),
            },
            _ => Err(CompileError::InvalidFormals { form: "lambda" }),
        };
    }

    let mut names = Vec::with_capacity(items.len());
    for item in &items {
        match item.as_object().and_then(|gc| gc.as_symbol()) {
            Some(sym) => names.push(sym),
            None => return Err(CompileError::InvalidFormals { form: "lambda" }),
        }
    }

    match tail {
        Value::Null => Ok(Formals::Fixed(names)),
        Value::Object(gc) => match gc.as_symbol() {
            Some(sym) => Ok(Formals::Variadic(names, sym)),
            None => Err(CompileError::InvalidFormals { form: "lambda" }),
        },
        _ => Err(CompileError::InvalidFormals { form: "lambda" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use europa_gc::GcConfig;
    use europa_reader::Reader;

    fn compile_source(source: &str) -> Prototype {
        let mut heap = Heap::new(GcConfig::default());
        let mut symbols = SymbolTable::new();
        let forms = {
            let mut reader = Reader::new(&mut heap, &mut symbols);
            reader.read_all(source).expect("read should succeed")
        };
        let mut compiler = Compiler::new(&mut heap, &mut symbols);
        let proto_gc = compiler.compile_toplevel(&forms).expect("compile should succeed");
        proto_gc.as_prototype().expect("toplevel is a prototype").clone()
    }

    fn opcodes(proto: &Prototype) -> Vec<Opcode> {
        proto
            .code
            .iter()
            .map(|&w| unpack(w).unwrap().0)
            .collect()
    }

    #[test]
    fn quote_emits_a_single_const() {
        let proto = compile_source("(quote (1 2))");
        assert_eq!(opcodes(&proto), vec![Opcode::Const, Opcode::Return]);
    }

    #[test]
    fn variable_reference_emits_refer() {
        let proto = compile_source("x");
        assert_eq!(opcodes(&proto), vec![Opcode::Refer, Opcode::Return]);
    }

    #[test]
    fn if_with_else_emits_test_then_jump_then_else() {
        let proto = compile_source("(if #t 1 2)");
        assert_eq!(
            opcodes(&proto),
            vec![Opcode::Const, Opcode::Test, Opcode::Const, Opcode::Jump, Opcode::Const, Opcode::Return]
        );
    }

    #[test]
    fn tail_application_emits_no_frame() {
        let proto = compile_source("(lambda (f) (f 1))");
        // top level: CLOSE, RETURN. inner sub-proto compiled separately -
        // check via sub_protos[0].
        assert_eq!(opcodes(&proto), vec![Opcode::Close, Opcode::Return]);
        let sub = proto.sub_protos[0].as_prototype().unwrap();
        // tail call: operand, ARGUMENT, operator, APPLY - no FRAME.
        assert_eq!(
            opcodes(sub),
            vec![Opcode::Const, Opcode::Argument, Opcode::Refer, Opcode::Apply, Opcode::Return]
        );
    }

    #[test]
    fn non_tail_application_emits_frame_first() {
        let proto = compile_source("(+ (f 1) 2)");
        let ops = opcodes(&proto);
        assert_eq!(ops[0], Opcode::Frame);
        assert_eq!(*ops.last().unwrap(), Opcode::Return);
    }

    #[test]
    fn call_cc_emits_conti_before_frame() {
        let proto = compile_source("(+ 1 (call/cc (lambda (k) 2)))");
        let ops = opcodes(&proto);
        let conti_pos = ops.iter().position(|o| *o == Opcode::Conti).unwrap();
        let frame_positions: Vec<_> = ops.iter().enumerate().filter(|(_, o)| **o == Opcode::Frame).map(|(i, _)| i).collect();
        // the outer `+` application's FRAME comes first (outer form is not
        // tail either), but call/cc's OWN frame (for its non-tail argument
        // position) must still follow its CONTI.
        assert!(frame_positions.iter().any(|&p| p > conti_pos));
    }

    #[test]
    fn define_with_function_shorthand_rewrites_to_lambda_then_close_then_define() {
        let proto = compile_source("(define (f x) x)");
        assert_eq!(opcodes(&proto), vec![Opcode::Close, Opcode::Define, Opcode::Return]);
    }

    #[test]
    fn invalid_formals_is_rejected() {
        let mut heap = Heap::new(GcConfig::default());
        let mut symbols = SymbolTable::new();
        let forms = {
            let mut reader = Reader::new(&mut heap, &mut symbols);
            reader.read_all("(lambda (1 2) 3)").unwrap()
        };
        let mut compiler = Compiler::new(&mut heap, &mut symbols);
        assert!(compiler.compile_toplevel(&forms).is_err());
    }
}
