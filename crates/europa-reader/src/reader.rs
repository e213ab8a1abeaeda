use europa_value::object::Heap;
use europa_value::{HeapObject, SymbolTable, Value};

use crate::cursor::Cursor;
use crate::error::{ReadError, ReadResult};
use crate::number::parse_number;

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';' | '\'' | '`' | ',' | '|')
}

/// Reads data directly off a character stream into `Value`s - no separate
/// token stream, per `SPEC_FULL.md` §4.3. `heap`/`symbols` are borrowed for
/// the duration of a read so every allocated pair/vector/string/symbol
/// lands in the same heap and the same intern table as everything else the
/// runtime owns.
pub struct Reader<'h> {
    heap: &'h mut Heap,
    symbols: &'h mut SymbolTable,
}

impl<'h> Reader<'h> {
    pub fn new(heap: &'h mut Heap, symbols: &'h mut SymbolTable) -> Self {
        Reader { heap, symbols }
    }

    /// Reads every datum in `source`, matching `do_string`'s "read and
    /// evaluate each top-level form" contract.
    pub fn read_all(&mut self, source: &str) -> ReadResult<Vec<Value>> {
        let mut cursor = Cursor::new(source);
        let mut forms = Vec::new();
        while let Some(v) = self.read_datum(&mut cursor)? {
            forms.push(v);
        }
        Ok(forms)
    }

    pub fn read_one(&mut self, source: &str) -> ReadResult<Option<Value>> {
        let mut cursor = Cursor::new(source);
        self.read_datum(&mut cursor)
    }

    fn skip_atmosphere(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<()> {
        loop {
            match cursor.peek() {
                Some(c) if c.is_whitespace() => {
                    cursor.advance();
                }
                Some(';') => {
                    while let Some(c) = cursor.peek() {
                        cursor.advance();
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('#') if cursor.peek2() == Some('|') => {
                    cursor.advance();
                    cursor.advance();
                    self.skip_block_comment(cursor)?;
                }
                Some('#') if cursor.peek2() == Some(';') => {
                    cursor.advance();
                    cursor.advance();
                    self.skip_atmosphere(cursor)?;
                    self.read_datum(cursor)?.ok_or(ReadError::UnexpectedEof {
                        context: "datum comment",
                    })?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<()> {
        let mut depth = 1;
        loop {
            match cursor.peek() {
                None => return Err(ReadError::UnterminatedComment),
                Some('#') if cursor.peek2() == Some('|') => {
                    cursor.advance();
                    cursor.advance();
                    depth += 1;
                }
                Some('|') if cursor.peek2() == Some('#') => {
                    cursor.advance();
                    cursor.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {
                    cursor.advance();
                }
            }
        }
    }

    fn read_datum(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<Option<Value>> {
        self.skip_atmosphere(cursor)?;
        let Some(c) = cursor.peek() else {
            return Ok(None);
        };

        let value = match c {
            '(' => {
                cursor.advance();
                self.read_list(cursor, ')')?
            }
            ')' => {
                return Err(ReadError::UnexpectedChar {
                    found: c,
                    context: "top level",
                })
            }
            '\'' => {
                cursor.advance();
                self.read_abbreviation(cursor, "quote")?
            }
            '`' => {
                cursor.advance();
                self.read_abbreviation(cursor, "quasiquote")?
            }
            ',' => {
                cursor.advance();
                if cursor.match_char('@') {
                    self.read_abbreviation(cursor, "unquote-splicing")?
                } else {
                    self.read_abbreviation(cursor, "unquote")?
                }
            }
            '"' => {
                cursor.advance();
                self.read_string(cursor)?
            }
            '#' => self.read_hash(cursor)?,
            _ => self.read_atom(cursor)?,
        };
        Ok(Some(value))
    }

    fn read_abbreviation(&mut self, cursor: &mut Cursor<'_>, keyword: &str) -> ReadResult<Value> {
        self.skip_atmosphere(cursor)?;
        let inner = self
            .read_datum(cursor)?
            .ok_or(ReadError::UnexpectedEof { context: keyword })?;
        let sym = self.intern_symbol(keyword);
        let tail = self.cons(inner, Value::Null);
        Ok(self.cons(sym, tail))
    }

    fn read_list(&mut self, cursor: &mut Cursor<'_>, close: char) -> ReadResult<Value> {
        let mut items = Vec::new();
        let mut tail = Value::Null;
        loop {
            self.skip_atmosphere(cursor)?;
            match cursor.peek() {
                None => {
                    return Err(ReadError::UnexpectedEof {
                        context: "list",
                    })
                }
                Some(c) if c == close => {
                    cursor.advance();
                    break;
                }
                Some('.') if cursor.peek2().map(is_delimiter).unwrap_or(true) => {
                    cursor.advance();
                    self.skip_atmosphere(cursor)?;
                    tail = self
                        .read_datum(cursor)?
                        .ok_or(ReadError::UnexpectedEof { context: "dotted tail" })?;
                    self.skip_atmosphere(cursor)?;
                    if cursor.peek() != Some(close) {
                        return Err(ReadError::UnexpectedChar {
                            found: cursor.peek().unwrap_or(close),
                            context: "dotted list close",
                        });
                    }
                    cursor.advance();
                    break;
                }
                _ => {
                    let item = self
                        .read_datum(cursor)?
                        .ok_or(ReadError::UnexpectedEof { context: "list item" })?;
                    items.push(item);
                }
            }
        }
        let mut result = tail;
        for item in items.into_iter().rev() {
            result = self.cons(item, result);
        }
        Ok(result)
    }

    fn read_string(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<Value> {
        let mut out = String::new();
        loop {
            match cursor.advance() {
                None => return Err(ReadError::UnterminatedString),
                Some('"') => break,
                Some('\\') => out.push(self.read_escape(cursor)?),
                Some(c) => out.push(c),
            }
        }
        Ok(self.alloc_string(out))
    }

    fn read_escape(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<char> {
        match cursor.advance() {
            None => Err(ReadError::UnterminatedString),
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('a') => Ok('\u{7}'),
            Some('b') => Ok('\u{8}'),
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some('x') | Some('X') => {
                let mut code = 0u32;
                let mut any = false;
                while let Some(c) = cursor.peek() {
                    if let Some(d) = c.to_digit(16) {
                        code = code * 16 + d;
                        any = true;
                        cursor.advance();
                    } else {
                        break;
                    }
                }
                if !any || cursor.peek() != Some(';') {
                    return Err(ReadError::UnknownEscape("\\x...;".into()));
                }
                cursor.advance();
                char::from_u32(code).ok_or(ReadError::UnknownEscape("\\x...;".into()))
            }
            Some(other) => Err(ReadError::UnknownEscape(other.to_string())),
        }
    }

    fn read_hash(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<Value> {
        cursor.advance(); // '#'
        match cursor.peek() {
            Some('t') => {
                self.consume_word(cursor);
                Ok(Value::Boolean(true))
            }
            Some('f') => {
                self.consume_word(cursor);
                Ok(Value::Boolean(false))
            }
            Some('\\') => {
                cursor.advance();
                self.read_character(cursor)
            }
            Some('(') => {
                cursor.advance();
                self.read_vector(cursor)
            }
            Some('u') if cursor.peek2() == Some('8') => {
                cursor.advance();
                cursor.advance();
                if !cursor.match_char('(') {
                    return Err(ReadError::UnexpectedChar {
                        found: cursor.peek().unwrap_or('u'),
                        context: "bytevector literal",
                    });
                }
                self.read_bytevector(cursor)
            }
            Some(c) if matches!(c, 'b' | 'o' | 'd' | 'x' | 'e' | 'i' | 'B' | 'O' | 'D' | 'X' | 'E' | 'I') => {
                self.read_prefixed_number(cursor)
            }
            Some(c) => Err(ReadError::UnexpectedChar {
                found: c,
                context: "# syntax",
            }),
            None => Err(ReadError::UnexpectedEof { context: "# syntax" }),
        }
    }

    fn consume_word(&mut self, cursor: &mut Cursor<'_>) {
        while let Some(c) = cursor.peek() {
            if is_delimiter(c) {
                break;
            }
            cursor.advance();
        }
    }

    fn read_character(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<Value> {
        let start = cursor.snapshot();
        let first = cursor
            .advance()
            .ok_or(ReadError::UnexpectedEof { context: "character literal" })?;
        // A single non-alphabetic char, or any char followed by a
        // delimiter, is the character itself; otherwise it's a named
        // character (#\space, #\newline, ...).
        if !first.is_alphabetic() || cursor.peek().map(is_delimiter).unwrap_or(true) {
            return Ok(Value::Character(first));
        }
        while let Some(c) = cursor.peek() {
            if is_delimiter(c) {
                break;
            }
            cursor.advance();
        }
        let name = cursor.slice_from(start);
        let ch = match name {
            "space" => ' ',
            "newline" | "linefeed" => '\n',
            "tab" => '\t',
            "return" => '\r',
            "null" | "nul" => '\0',
            "altmode" | "escape" => '\u{1b}',
            "backspace" => '\u{8}',
            "delete" | "rubout" => '\u{7f}',
            "alarm" => '\u{7}',
            "page" => '\u{c}',
            _ if name.chars().count() == 1 => name.chars().next().unwrap(),
            _ => {
                return Err(ReadError::UnknownEscape(format!("#\\{name}")));
            }
        };
        Ok(Value::Character(ch))
    }

    fn read_vector(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<Value> {
        let mut items = Vec::new();
        loop {
            self.skip_atmosphere(cursor)?;
            match cursor.peek() {
                None => return Err(ReadError::UnexpectedEof { context: "vector" }),
                Some(')') => {
                    cursor.advance();
                    break;
                }
                _ => {
                    let item = self
                        .read_datum(cursor)?
                        .ok_or(ReadError::UnexpectedEof { context: "vector item" })?;
                    items.push(item);
                }
            }
        }
        Ok(Value::Object(
            self.heap.alloc(HeapObject::Vector(std::cell::RefCell::new(items))),
        ))
    }

    fn read_bytevector(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<Value> {
        let mut bytes = Vec::new();
        loop {
            self.skip_atmosphere(cursor)?;
            match cursor.peek() {
                None => return Err(ReadError::UnexpectedEof { context: "bytevector" }),
                Some(')') => {
                    cursor.advance();
                    break;
                }
                _ => match self.read_datum(cursor)? {
                    Some(Value::Fixnum(n)) if (0..=255).contains(&n) => bytes.push(n as u8),
                    Some(Value::Fixnum(n)) => return Err(ReadError::ByteOutOfRange(n)),
                    _ => {
                        return Err(ReadError::MalformedNumber(
                            "bytevector element must be an exact byte".into(),
                        ))
                    }
                },
            }
        }
        Ok(Value::Object(
            self.heap
                .alloc(HeapObject::Bytevector(std::cell::RefCell::new(bytes))),
        ))
    }

    fn read_prefixed_number(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<Value> {
        let mut radix = None;
        let mut exact = None;
        // The leading '#' of this first prefix letter was already consumed
        // by read_hash; subsequent prefixes each start with their own '#'.
        loop {
            match cursor.peek() {
                Some('b') | Some('B') => {
                    cursor.advance();
                    radix = Some(2);
                }
                Some('o') | Some('O') => {
                    cursor.advance();
                    radix = Some(8);
                }
                Some('d') | Some('D') => {
                    cursor.advance();
                    radix = Some(10);
                }
                Some('x') | Some('X') => {
                    cursor.advance();
                    radix = Some(16);
                }
                Some('e') | Some('E') => {
                    cursor.advance();
                    exact = Some(true);
                }
                Some('i') | Some('I') => {
                    cursor.advance();
                    exact = Some(false);
                }
                _ => break,
            }
            if cursor.peek() == Some('#') {
                cursor.advance();
            } else {
                break;
            }
        }
        let start = cursor.snapshot();
        while let Some(c) = cursor.peek() {
            if is_delimiter(c) {
                break;
            }
            cursor.advance();
        }
        let text = cursor.slice_from(start);
        parse_number(text, radix.unwrap_or(10), exact)
    }

    fn read_atom(&mut self, cursor: &mut Cursor<'_>) -> ReadResult<Value> {
        let start = cursor.snapshot();
        cursor.advance();
        while let Some(c) = cursor.peek() {
            if is_delimiter(c) {
                break;
            }
            cursor.advance();
        }
        let text = cursor.slice_from(start);
        if let Ok(number) = parse_number(text, 10, None) {
            return Ok(number);
        }
        Ok(self.intern_symbol(text))
    }

    fn intern_symbol(&mut self, text: &str) -> Value {
        Value::Object(self.symbols.intern(self.heap, text))
    }

    fn alloc_string(&mut self, text: String) -> Value {
        Value::Object(self.heap.alloc(HeapObject::Str(std::cell::RefCell::new(text))))
    }

    fn cons(&mut self, car: Value, cdr: Value) -> Value {
        Value::Object(
            self.heap
                .alloc(HeapObject::Pair(std::cell::Cell::new(car), std::cell::Cell::new(cdr))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use europa_gc::GcConfig;
    use europa_value::equality;

    fn read_forms(source: &str) -> Vec<Value> {
        let mut heap = Heap::new(GcConfig::default());
        let mut symbols = SymbolTable::new();
        let mut reader = Reader::new(&mut heap, &mut symbols);
        reader.read_all(source).expect("read should succeed")
    }

    #[test]
    fn reads_a_simple_list() {
        let forms = read_forms("(+ 1 2)");
        assert_eq!(forms.len(), 1);
        let HeapObject::Pair(car, cdr) = (&*forms[0].as_object().unwrap()) else {
            panic!("expected pair")
        };
        assert!(matches!(&*car.get().as_object().unwrap(), HeapObject::Symbol(_)));
        let _ = cdr;
    }

    #[test]
    fn reads_binary_negative_fixnum() {
        let forms = read_forms("#b-1001");
        match forms[0] {
            Value::Fixnum(-9) => {}
            _ => panic!("expected -9"),
        }
    }

    #[test]
    fn reads_binary_inexact_fraction() {
        let forms = read_forms("#b#i1001.1");
        match forms[0] {
            Value::Real(r) => assert!((r - 9.5).abs() < 1e-9),
            _ => panic!("expected real 9.5"),
        }
    }

    #[test]
    fn reads_escaped_string() {
        let forms = read_forms("\"escaped \\x35;\\n\"");
        let HeapObject::Str(s) = &*forms[0].as_object().unwrap() else {
            panic!("expected string")
        };
        assert_eq!(*s.borrow(), "escaped 5\n");
    }

    #[test]
    fn same_symbol_text_interns_to_the_same_object() {
        let mut heap = Heap::new(GcConfig::default());
        let mut symbols = SymbolTable::new();
        let mut reader = Reader::new(&mut heap, &mut symbols);
        let forms = reader.read_all("(a a)").unwrap();
        let HeapObject::Pair(car, cdr) = &*forms[0].as_object().unwrap() else {
            panic!("expected pair")
        };
        let second = cdr.get().as_object().unwrap();
        let HeapObject::Pair(car2, _) = &*second else {
            panic!("expected pair")
        };
        assert!(equality::eqv(&car.get(), &car2.get()));
    }

    #[test]
    fn datum_comment_skips_next_form() {
        let forms = read_forms("(1 #;2 3)");
        // (1 3) once the commented datum is dropped.
        let HeapObject::Pair(car, cdr) = &*forms[0].as_object().unwrap() else {
            panic!("expected pair")
        };
        assert!(matches!(car.get(), Value::Fixnum(1)));
        let second = cdr.get();
        let HeapObject::Pair(car2, _) = &*second.as_object().unwrap() else {
            panic!("expected pair")
        };
        assert!(matches!(car2.get(), Value::Fixnum(3)));
    }
}
