use super::cursor::Cursor;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositeError {
    #[error("invalid UDC code: {0}")]
    InvalidExpression(String),
}

const GROUP_OPEN: u8 = b'(';
const GROUP_CLOSE: u8 = b')';

/// Splits a composite expression such as `621.3:681.5(075)` into its atomic
/// parts, left to right.
///
/// A part is either a run of digits with interior dots or a non-empty
/// parenthesized group. Whitespace is dropped first; operators (`:`) and any
/// other characters between parts only separate. An expression with no parts
/// at all is rejected.
pub fn tokenize(expr: &str) -> Result<Vec<String>, CompositeError> {
    let compact: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
    let mut cur = Cursor::new(&compact);
    let mut tokens = Vec::new();

    while !cur.eof() {
        if let Some(token) = try_parse_number(&mut cur) {
            tokens.push(token.to_string());
            continue;
        }
        if let Some(token) = try_parse_group(&mut cur) {
            tokens.push(token.to_string());
            continue;
        }
        cur.bump_char();
    }

    if tokens.is_empty() {
        return Err(CompositeError::InvalidExpression(expr.to_string()));
    }
    Ok(tokens)
}

/// `\d+(\.\d+)*` at the cursor. A trailing dot is left unconsumed.
fn try_parse_number<'a>(cur: &mut Cursor<'a>) -> Option<&'a str> {
    if !cur.peek().is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }

    let start = cur.pos();
    cur.eat_while(|b| b.is_ascii_digit());
    while cur.peek() == Some(b'.') && cur.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
        cur.bump(); // .
        cur.eat_while(|b| b.is_ascii_digit());
    }
    Some(cur.slice_from(start))
}

/// A `(...)` group with at least one character inside.
///
/// Unclosed or empty groups restore the cursor and return `None`, so the
/// opening parenthesis is skipped like any other separator.
fn try_parse_group<'a>(cur: &mut Cursor<'a>) -> Option<&'a str> {
    if cur.peek() != Some(GROUP_OPEN) {
        return None;
    }

    let saved = cur.clone();
    let start = cur.pos();
    cur.bump(); // (
    let inner_start = cur.pos();
    cur.eat_while(|b| b != GROUP_CLOSE);

    if cur.peek() != Some(GROUP_CLOSE) || cur.pos() == inner_start {
        *cur = saved;
        return None;
    }
    cur.bump(); // )
    Some(cur.slice_from(start))
}
