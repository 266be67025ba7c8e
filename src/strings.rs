//! Escapes inside string literals. Only `\n`, `\t`, `\"` and `\\` exist;
//! any other character after a backslash makes the literal illegal.

use bimap::BiMap;
use std::fmt;

lazy_static! {
    /// Escape code (the character after the backslash) on the left, the
    /// character it stands for on the right.
    static ref ESCAPE_CODES: BiMap<char, char> = {
        let mut codes = BiMap::new();
        for &(code, decoded) in [('n', '\n'), ('t', '\t'), ('"', '"'), ('\\', '\\')].iter() {
            codes.insert(code, decoded);
        }
        codes
    };
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum EscapeError {
    /// `\c` where `c` is not an escape code; `offset` is the backslash's
    /// byte offset inside the literal body.
    Unknown { code: char, offset: usize },
    DanglingBackslash,
}

impl fmt::Display for EscapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscapeError::Unknown { code, offset } => {
                write!(f, "unknown escape \\{} at byte {}", code, offset)
            }
            EscapeError::DanglingBackslash => write!(f, "backslash at end of literal"),
        }
    }
}

/// Decodes the body of a string literal, the text between its quotes.
pub(crate) fn unescape(body: &str) -> Result<String, EscapeError> {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    while let Some((offset, c)) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        let code = chars
            .next()
            .map(|(_, code)| code)
            .ok_or(EscapeError::DanglingBackslash)?;
        match ESCAPE_CODES.get_by_left(&code) {
            Some(&decoded) => value.push(decoded),
            None => return Err(EscapeError::Unknown { code, offset }),
        }
    }
    Ok(value)
}

/// Writes `value` back as a literal, quotes included.
pub(crate) fn quoted(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for c in value.chars() {
        match ESCAPE_CODES.get_by_right(&c) {
            Some(&code) => {
                literal.push('\\');
                literal.push(code);
            }
            None => literal.push(c),
        }
    }
    literal.push('"');
    literal
}
