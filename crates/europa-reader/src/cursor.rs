//! A small character cursor over an in-memory source string, with
//! snapshot/restore for the lookahead the grammar needs (e.g. deciding
//! between a number and a peculiar identifier after seeing a leading `+`,
//! `-` or `.`).

pub struct Cursor<'a> {
    source: &'a str,
    position: usize,
}

#[derive(Clone, Copy)]
pub struct CursorSnapshot {
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Cursor { source, position: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    pub fn peek2(&self) -> Option<char> {
        let mut chars = self.source[self.position..].chars();
        chars.next();
        chars.next()
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    pub fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            position: self.position,
        }
    }

    pub fn restore(&mut self, snapshot: CursorSnapshot) {
        self.position = snapshot.position;
    }

    pub fn slice_from(&self, snapshot: CursorSnapshot) -> &'a str {
        &self.source[snapshot.position..self.position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_walks_utf8_codepoints_not_bytes() {
        let mut c = Cursor::new("aé好");
        assert_eq!(c.advance(), Some('a'));
        assert_eq!(c.advance(), Some('é'));
        assert_eq!(c.advance(), Some('好'));
        assert!(c.is_at_end());
    }

    #[test]
    fn snapshot_restore_roundtrips() {
        let mut c = Cursor::new("hello");
        c.advance();
        c.advance();
        let snap = c.snapshot();
        c.advance();
        c.advance();
        c.restore(snap);
        assert_eq!(c.peek(), Some('l'));
    }

    #[test]
    fn slice_from_returns_consumed_text() {
        let mut c = Cursor::new("hello world");
        let start = c.snapshot();
        for _ in 0..5 {
            c.advance();
        }
        assert_eq!(c.slice_from(start), "hello");
    }
}
