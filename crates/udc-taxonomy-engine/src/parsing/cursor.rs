/// A byte cursor over a classification expression.
///
/// Codes are ASCII apart from titles, so byte-wise stepping is enough for the
/// tokenizer; slices are only taken at ASCII boundaries.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The expression being tokenized.
    pub s: &'a str,
    /// Current index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// Peeks `n` bytes ahead of the current position.
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.s.as_bytes().get(self.i + n).copied()
    }

    /// Advances by one byte, returning the consumed byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    /// Advances past one whole char, so skipping never splits a UTF-8 sequence.
    pub fn bump_char(&mut self) {
        if let Some(c) = self.s[self.i..].chars().next() {
            self.i += c.len_utf8();
        }
    }

    /// Consumes bytes while `pred` holds.
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.i += 1;
        }
    }

    /// Text between `start` and the current position.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.s[start..self.i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("621.3");
        assert_eq!(cur.pos(), 0);
        assert!(!cur.eof());
        assert_eq!(cur.peek(), Some(b'6'));
        assert_eq!(cur.bump(), Some(b'6'));
        assert_eq!(cur.pos(), 1);
    }

    #[test]
    fn empty_string_input() {
        let cur = Cursor::new("");
        assert!(cur.eof());
        assert_eq!(cur.peek(), None);
        assert_eq!(cur.peek_at(1), None);
    }

    #[test]
    fn eat_while_stops_at_predicate() {
        let mut cur = Cursor::new("681:5");
        cur.eat_while(|b| b.is_ascii_digit());
        assert_eq!(cur.slice_from(0), "681");
        assert_eq!(cur.peek(), Some(b':'));
    }

    #[test]
    fn bump_char_skips_multibyte() {
        let mut cur = Cursor::new("é1");
        cur.bump_char();
        assert_eq!(cur.peek(), Some(b'1'));
    }

    #[test]
    fn bump_at_eof_returns_none() {
        let mut cur = Cursor::new("x");
        assert_eq!(cur.bump(), Some(b'x'));
        assert_eq!(cur.bump(), None);
        assert_eq!(cur.bump(), None);
    }
}
