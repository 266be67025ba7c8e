use crate::ast::{
    BlockStatement, Expression, Identifier, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::tokens::{Lexer, Token, TokenKind, TokenStream};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedToken { expected: TokenKind, got: Token },
    NoPrefixRule(Token),
    BadInteger(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, got } => write!(
                f,
                "expected next token to be {}, got {} instead",
                expected, got
            ),
            ParseError::NoPrefixRule(token) => {
                write!(f, "no prefix parse function for {} found", token)
            }
            ParseError::BadInteger(literal) => {
                write!(f, "could not parse {:?} as integer", literal)
            }
        }
    }
}

/// Binding power of operators, weakest first. `/` sits one level above `*`,
/// so `a * b / c` groups as `a * (b / c)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Divide,
    Prefix,
    Call,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    use TokenKind::*;
    match kind {
        Eq | NotEq => Precedence::Equals,
        Lt | Gt | Lte | Gte => Precedence::LessGreater,
        Plus | Minus => Precedence::Sum,
        Asterisk => Precedence::Product,
        Slash => Precedence::Divide,
        LParen | LBracket => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

fn infix_operator(kind: TokenKind) -> Option<InfixOperator> {
    use TokenKind::*;
    let operator = match kind {
        Plus => InfixOperator::Plus,
        Minus => InfixOperator::Minus,
        Asterisk => InfixOperator::Asterisk,
        Slash => InfixOperator::Slash,
        Eq => InfixOperator::Eq,
        NotEq => InfixOperator::NotEq,
        Lt => InfixOperator::Lt,
        Gt => InfixOperator::Gt,
        Lte => InfixOperator::Lte,
        Gte => InfixOperator::Gte,
        _ => return None,
    };
    Some(operator)
}

type ParseResult<T> = Option<T>;

/// Pratt parser over any token stream. Errors are collected rather than
/// returned, so one bad statement does not hide the ones after it.
pub struct Parser<T: TokenStream> {
    tokens: T,
    current: Token,
    peek: Token,
    position: usize,
    errors: Vec<ParseError>,
}

impl<T: TokenStream> Parser<T> {
    pub fn new(mut tokens: T) -> Self {
        let current = tokens.next_token();
        let peek = tokens.next_token();
        Self {
            tokens,
            current,
            peek,
            position: 0,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.current_is(TokenKind::Eof) {
            let start = self.position;
            match self.parse_statement() {
                Some(statement) => {
                    statements.push(statement);
                    self.advance();
                }
                None => self.synchronize(start, &[]),
            }
        }
        Program { statements }
    }

    fn advance(&mut self) {
        if self.current_is(TokenKind::Eof) {
            return;
        }
        let next = self.tokens.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
        self.position += 1;
    }

    fn starts_statement(&self) -> bool {
        matches!(self.current.kind, TokenKind::Let | TokenKind::Return)
    }

    /// Moves past a statement that failed to parse, which began at token
    /// `start`. Stops after the next `;`, or on the next `let`, `return`,
    /// token in `stops`, or end of input.
    fn synchronize(&mut self, start: usize, stops: &[TokenKind]) {
        if self.position == start {
            self.advance();
        }
        while !self.current_is(TokenKind::Eof)
            && !self.current_is(TokenKind::Semicolon)
            && !self.starts_statement()
            && !stops.contains(&self.current.kind)
        {
            self.advance();
        }
        if self.current_is(TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn current_is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    fn expect_peek(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.peek_is(kind) {
            self.advance();
            Some(())
        } else {
            self.errors.push(ParseError::UnexpectedToken {
                expected: kind,
                got: self.peek.clone(),
            });
            None
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.current.kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Ident if self.peek_is(TokenKind::Assign) => self.parse_assignment(),
            _ => self.parse_expression_statement(),
        }
    }

    fn skip_optional_semicolon(&mut self) {
        if self.peek_is(TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn parse_let(&mut self) -> ParseResult<Statement> {
        self.expect_peek(TokenKind::Ident)?;
        let name = Identifier(self.current.literal.clone());
        self.expect_peek(TokenKind::Assign)?;
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Statement::Let { name, value })
    }

    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Statement::Return { value })
    }

    fn parse_assignment(&mut self) -> ParseResult<Statement> {
        let name = Identifier(self.current.literal.clone());
        self.advance();
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Statement::Assignment { name, value })
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Statement> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Statement::Expression(expr))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        let mut left = self.parse_prefix()?;
        while !self.peek_is(TokenKind::Semicolon) && precedence < precedence_of(self.peek.kind) {
            self.advance();
            left = self.parse_infix(left)?;
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expression> {
        use TokenKind::*;
        match self.current.kind {
            Ident => Some(Expression::Identifier(Identifier(self.current.literal.clone()))),
            Int => self.parse_integer(),
            Str => Some(Expression::StringLiteral(self.current.literal.clone())),
            True => Some(Expression::Boolean(true)),
            False => Some(Expression::Boolean(false)),
            Bang => self.parse_prefix_operator(PrefixOperator::Bang),
            Minus => self.parse_prefix_operator(PrefixOperator::Minus),
            LParen => self.parse_grouped(),
            LBracket => self
                .parse_expression_list(RBracket)
                .map(Expression::ArrayLiteral),
            LBrace => self.parse_hash(),
            If => self.parse_if(),
            Function => {
                let (parameters, body) = self.parse_callable_literal()?;
                Some(Expression::FunctionLiteral { parameters, body })
            }
            Macro => {
                let (parameters, body) = self.parse_callable_literal()?;
                Some(Expression::MacroLiteral { parameters, body })
            }
            _ => {
                self.errors
                    .push(ParseError::NoPrefixRule(self.current.clone()));
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expression) -> ParseResult<Expression> {
        match self.current.kind {
            TokenKind::LParen => {
                let arguments = self.parse_expression_list(TokenKind::RParen)?;
                Some(Expression::Call {
                    callee: Box::new(left),
                    arguments,
                })
            }
            TokenKind::LBracket => {
                self.advance();
                let index = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RBracket)?;
                Some(Expression::Index {
                    collection: Box::new(left),
                    index: Box::new(index),
                })
            }
            kind => {
                // Only tokens with an infix rule have a precedence above Lowest.
                let operator = infix_operator(kind)?;
                let precedence = precedence_of(kind);
                self.advance();
                let right = self.parse_expression(precedence)?;
                Some(Expression::Infix {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
        }
    }

    fn parse_integer(&mut self) -> ParseResult<Expression> {
        match self.current.literal.parse::<i64>() {
            Ok(value) => Some(Expression::IntegerLiteral(value)),
            Err(_) => {
                self.errors
                    .push(ParseError::BadInteger(self.current.literal.clone()));
                None
            }
        }
    }

    fn parse_prefix_operator(&mut self, operator: PrefixOperator) -> ParseResult<Expression> {
        self.advance();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped(&mut self) -> ParseResult<Expression> {
        self.advance();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Some(expr)
    }

    /// Parses `e, e, ...` up to `end`; `current` is the opening delimiter.
    fn parse_expression_list(&mut self, end: TokenKind) -> ParseResult<Vec<Expression>> {
        let mut elements = Vec::new();
        if self.peek_is(end) {
            self.advance();
            return Some(elements);
        }
        self.advance();
        elements.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.advance();
            self.advance();
            elements.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;
        Some(elements)
    }

    fn parse_hash(&mut self) -> ParseResult<Expression> {
        let mut pairs = Vec::new();
        while !self.peek_is(TokenKind::RBrace) {
            self.advance();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::Colon)?;
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if !self.peek_is(TokenKind::RBrace) {
                self.expect_peek(TokenKind::Comma)?;
            }
        }
        self.expect_peek(TokenKind::RBrace)?;
        Some(Expression::HashLiteral(pairs))
    }

    fn parse_if(&mut self) -> ParseResult<Expression> {
        self.expect_peek(TokenKind::LParen)?;
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_block()?;
        let alternative = if self.peek_is(TokenKind::Else) {
            self.advance();
            self.expect_peek(TokenKind::LBrace)?;
            Some(self.parse_block()?)
        } else {
            None
        };
        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    /// `fn` and `macro` literals share their shape: `(params) { body }`.
    fn parse_callable_literal(&mut self) -> ParseResult<(Vec<Identifier>, BlockStatement)> {
        self.expect_peek(TokenKind::LParen)?;
        let parameters = self.parse_parameters()?;
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block()?;
        Some((parameters, body))
    }

    fn parse_parameters(&mut self) -> ParseResult<Vec<Identifier>> {
        let mut parameters = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            self.advance();
            return Some(parameters);
        }
        self.expect_peek(TokenKind::Ident)?;
        parameters.push(Identifier(self.current.literal.clone()));
        while self.peek_is(TokenKind::Comma) {
            self.advance();
            self.expect_peek(TokenKind::Ident)?;
            parameters.push(Identifier(self.current.literal.clone()));
        }
        self.expect_peek(TokenKind::RParen)?;
        Some(parameters)
    }

    /// Parses statements up to the matching `}`; `current` is the `{`.
    fn parse_block(&mut self) -> ParseResult<BlockStatement> {
        let mut statements = Vec::new();
        self.advance();
        while !self.current_is(TokenKind::RBrace) {
            if self.current_is(TokenKind::Eof) {
                self.errors.push(ParseError::UnexpectedToken {
                    expected: TokenKind::RBrace,
                    got: self.current.clone(),
                });
                return None;
            }
            let start = self.position;
            match self.parse_statement() {
                Some(statement) => {
                    statements.push(statement);
                    self.advance();
                }
                None => self.synchronize(start, &[TokenKind::RBrace]),
            }
        }
        Some(BlockStatement(statements))
    }
}

/// Lexes and parses `source`, returning the program alongside every parse
/// error encountered.
pub fn parse_program(source: &str) -> (Program, Vec<ParseError>) {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    log::trace!("parsed {} statement(s)", program.statements.len());
    (program, parser.errors)
}
