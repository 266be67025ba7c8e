use crate::strings;
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,
    // Identifiers and literals
    Ident,
    Int,
    Str,
    // Operators
    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Lt,
    Gt,
    Eq,
    NotEq,
    Lte,
    Gte,
    // Delimiters
    Comma,
    Semicolon,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    // Keywords
    Function,
    Let,
    True,
    False,
    If,
    Else,
    Return,
    Macro,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let text = match self {
            Illegal => "ILLEGAL",
            Eof => "EOF",
            Ident => "IDENT",
            Int => "INT",
            Str => "STRING",
            Assign => "=",
            Plus => "+",
            Minus => "-",
            Bang => "!",
            Asterisk => "*",
            Slash => "/",
            Lt => "<",
            Gt => ">",
            Eq => "==",
            NotEq => "!=",
            Lte => "<=",
            Gte => ">=",
            Comma => ",",
            Semicolon => ";",
            Colon => ":",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            Function => "fn",
            Let => "let",
            True => "true",
            False => "false",
            If => "if",
            Else => "else",
            Return => "return",
            Macro => "macro",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
        }
    }

    pub fn eof() -> Self {
        Self::new(TokenKind::Eof, "")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident | TokenKind::Int | TokenKind::Str | TokenKind::Illegal => {
                write!(f, "{} {:?}", self.kind, self.literal)
            }
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// The one capability the parser needs from a lexer. Once the input is
/// exhausted every further call yields an `Eof` token.
pub trait TokenStream {
    fn next_token(&mut self) -> Token;
}

impl TokenStream for std::vec::IntoIter<Token> {
    fn next_token(&mut self) -> Token {
        self.next().unwrap_or_else(Token::eof)
    }
}

fn lookup_keyword(word: &str) -> TokenKind {
    match word {
        "fn" => TokenKind::Function,
        "let" => TokenKind::Let,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "return" => TokenKind::Return,
        "macro" => TokenKind::Macro,
        _ => TokenKind::Ident,
    }
}

fn create_token(captured: &str) -> Token {
    use TokenKind::*;
    let first_char = match captured.chars().next() {
        Some(c) => c,
        None => return Token::eof(),
    };
    if first_char == '"' {
        return tokenize_string_literal(captured);
    }
    if first_char.is_ascii_digit() {
        return Token::new(Int, captured);
    }
    if first_char.is_alphabetic() || first_char == '_' {
        return Token::new(lookup_keyword(captured), captured);
    }
    let kind = match captured {
        "==" => Eq,
        "!=" => NotEq,
        "<=" => Lte,
        ">=" => Gte,
        "=" => Assign,
        "+" => Plus,
        "-" => Minus,
        "!" => Bang,
        "*" => Asterisk,
        "/" => Slash,
        "<" => Lt,
        ">" => Gt,
        "," => Comma,
        ";" => Semicolon,
        ":" => Colon,
        "(" => LParen,
        ")" => RParen,
        "{" => LBrace,
        "}" => RBrace,
        "[" => LBracket,
        "]" => RBracket,
        _ => Illegal,
    };
    Token::new(kind, captured)
}

fn tokenize_string_literal(captured: &str) -> Token {
    let bytes = captured.as_bytes();
    if bytes.len() == 1 || bytes[bytes.len() - 1] != b'"' {
        return Token::new(TokenKind::Illegal, captured);
    }

    let trailing_backslashes = bytes
        .iter()
        .rev()
        .skip(1)
        .take_while(|&&byte| byte == b'\\')
        .count();
    if trailing_backslashes % 2 == 1 {
        return Token::new(TokenKind::Illegal, captured);
    }

    // Both ends are ASCII quotes, so slicing on bytes is safe here.
    match strings::unescape(&captured[1..captured.len() - 1]) {
        Ok(payload) => Token::new(TokenKind::Str, payload),
        Err(e) => {
            log::debug!("rejecting string literal {}: {}", captured, e);
            Token::new(TokenKind::Illegal, captured)
        }
    }
}

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(
        r#"(?x)                          # ignore whitespace in this pattern & allow comments
            ^\s*                         # leading whitespace, ignored
            (                            # token capture group
                "(?:                     # string literal. its contents, not captured, include:
                    \\.                  #    escapes
                    |[^\\"]              #    anything which isn't a backslash or a quote
                  )*
                  "?                     #    possibly missing a closing quote
                |==|!=|<=|>=             # two-character operators
                |[-+*/!<>=,;:(){}\[\]]   # single-character operators and delimiters
                |[0-9]+                  # integers
                |[\p{L}_][\p{L}\p{N}_]*  # identifiers and keywords
                |.                       # anything else is illegal
            )
        "#
    )
    .unwrap();
}

/// Scans source text lazily, one token per `next_token` call.
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }
}

impl TokenStream for Lexer<'_> {
    fn next_token(&mut self) -> Token {
        let rest = self.input.trim_start();
        if rest.is_empty() {
            self.input = rest;
            return Token::eof();
        }
        let (captured, consumed) = match TOKEN_RE.captures(rest) {
            Some(caps) => match (caps.get(0), caps.get(1)) {
                (Some(whole), Some(token)) => (token.as_str(), whole.end()),
                _ => (rest, rest.len()),
            },
            None => (rest, rest.len()),
        };
        self.input = &rest[consumed..];
        create_token(captured)
    }
}

/// Convenience for tests and diagnostics: the whole token sequence, `Eof`
/// included.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TokenKind::*;
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn operators_and_delimiters() {
        assert_eq!(
            kinds("= + - ! * / < > == != <= >= , ; : ( ) { } [ ]"),
            vec![
                Assign, Plus, Minus, Bang, Asterisk, Slash, Lt, Gt, Eq, NotEq, Lte, Gte, Comma,
                Semicolon, Colon, LParen, RParen, LBrace, RBrace, LBracket, RBracket, Eof
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        let tokens = tokenize("let five = fn(x_1) { return true; } else false if macro");
        let expected = vec![
            (Let, "let"),
            (Ident, "five"),
            (Assign, "="),
            (Function, "fn"),
            (LParen, "("),
            (Ident, "x_1"),
            (RParen, ")"),
            (LBrace, "{"),
            (Return, "return"),
            (True, "true"),
            (Semicolon, ";"),
            (RBrace, "}"),
            (Else, "else"),
            (False, "false"),
            (If, "if"),
            (Macro, "macro"),
            (Eof, ""),
        ];
        let got: Vec<_> = tokens.iter().map(|t| (t.kind, t.literal.as_str())).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn integers_need_no_whitespace() {
        let tokens = tokenize("10==10");
        assert_eq!(tokens[0], Token::new(Int, "10"));
        assert_eq!(tokens[1].kind, Eq);
        assert_eq!(tokens[2], Token::new(Int, "10"));
    }

    #[test]
    fn strings_are_unescaped() {
        let tokens = tokenize(r#""hello world" "a\"b""#);
        assert_eq!(tokens[0], Token::new(Str, "hello world"));
        assert_eq!(tokens[1], Token::new(Str, "a\"b"));
    }

    #[test]
    fn malformed_input_is_illegal() {
        assert_eq!(kinds(r#""unterminated"#), vec![Illegal, Eof]);
        assert_eq!(kinds(r#""bad \q escape""#), vec![Illegal, Eof]);
        assert_eq!(kinds("@"), vec![Illegal, Eof]);
    }

    #[test]
    fn eof_repeats() {
        let mut lexer = Lexer::new("  ");
        assert_eq!(lexer.next_token().kind, Eof);
        assert_eq!(lexer.next_token().kind, Eof);
        let mut tokens = vec![Token::new(Int, "1")].into_iter();
        assert_eq!(tokens.next_token().kind, Int);
        assert_eq!(tokens.next_token().kind, Eof);
        assert_eq!(tokens.next_token().kind, Eof);
    }
}
