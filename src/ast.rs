use crate::strings;
use derive_more::{Deref, DerefMut};
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref)]
pub struct Identifier(pub String);

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier(name.to_string())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Bang,
    Minus,
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOperator::Bang => write!(f, "!"),
            PrefixOperator::Minus => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Eq,
    NotEq,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use InfixOperator::*;
        let symbol = match self {
            Plus => "+",
            Minus => "-",
            Asterisk => "*",
            Slash => "/",
            Eq => "==",
            NotEq => "!=",
            Lt => "<",
            Gt => ">",
            Lte => "<=",
            Gte => ">=",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deref, DerefMut)]
pub struct BlockStatement(pub Vec<Statement>);

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "{{ }}")
        } else {
            write!(f, "{{ {} }}", self.iter().join("; "))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let { name: Identifier, value: Expression },
    Return { value: Expression },
    Assignment { name: Identifier, value: Expression },
    Expression(Expression),
    Block(BlockStatement),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {} = {}", name, value),
            Statement::Return { value } => write!(f, "return {}", value),
            Statement::Assignment { name, value } => write!(f, "{} = {}", name, value),
            Statement::Expression(expr) => write!(f, "{}", expr),
            Statement::Block(block) => write!(f, "{}", block),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    IntegerLiteral(i64),
    StringLiteral(String),
    Boolean(bool),
    Identifier(Identifier),
    ArrayLiteral(Vec<Expression>),
    HashLiteral(Vec<(Expression, Expression)>),
    Prefix {
        operator: PrefixOperator,
        right: Box<Expression>,
    },
    Infix {
        operator: InfixOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    FunctionLiteral {
        parameters: Vec<Identifier>,
        body: BlockStatement,
    },
    MacroLiteral {
        parameters: Vec<Identifier>,
        body: BlockStatement,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Index {
        collection: Box<Expression>,
        index: Box<Expression>,
    },
}

impl Expression {
    pub fn identifier(name: &str) -> Self {
        Expression::Identifier(Identifier::from(name))
    }

    /// The callee name when this is a call of a plain identifier, e.g. `f` in `f(1)`.
    pub(crate) fn called_name(&self) -> Option<&str> {
        match self {
            Expression::Call { callee, .. } => match callee.as_ref() {
                Expression::Identifier(name) => Some(name.as_ref()),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Expression::*;
        match self {
            IntegerLiteral(value) => write!(f, "{}", value),
            StringLiteral(value) => write!(f, "{}", strings::quoted(value)),
            Boolean(value) => write!(f, "{}", value),
            Expression::Identifier(name) => write!(f, "{}", name),
            ArrayLiteral(elements) => write!(f, "[{}]", elements.iter().join(", ")),
            HashLiteral(pairs) => write!(
                f,
                "{{{}}}",
                pairs.iter().map(|(k, v)| format!("{}: {}", k, v)).join(", ")
            ),
            Prefix { operator, right } => write!(f, "({}{})", operator, right),
            Infix {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            FunctionLiteral { parameters, body } => {
                write!(f, "fn({}) {}", parameters.iter().join(", "), body)
            }
            MacroLiteral { parameters, body } => {
                write!(f, "macro({}) {}", parameters.iter().join(", "), body)
            }
            Call { callee, arguments } => write!(f, "{}({})", callee, arguments.iter().join(", ")),
            Index { collection, index } => write!(f, "({}[{}])", collection, index),
        }
    }
}

/// The root of a parsed source text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statements.iter().join("; "))
    }
}

/// Any node of the tree, as handed to a rewrite function by `modify`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program(Program),
    Statement(Statement),
    Expression(Expression),
}

impl Node {
    pub(crate) fn family(&self) -> &'static str {
        match self {
            Node::Program(_) => "program",
            Node::Statement(Statement::Block(_)) => "block",
            Node::Statement(_) => "statement",
            Node::Expression(_) => "expression",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Program(p) => write!(f, "{}", p),
            Node::Statement(s) => write!(f, "{}", s),
            Node::Expression(e) => write!(f, "{}", e),
        }
    }
}
