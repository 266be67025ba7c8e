//! Structural rewriting of syntax trees.
//!
//! `try_modify` rebuilds every child of a node first and then hands the
//! rebuilt node to the rewrite function. Every statement and expression
//! variant is matched explicitly here, so a new variant cannot be skipped
//! silently.

use crate::ast::{BlockStatement, Expression, Node, Program, Statement};
use std::fmt;

/// A rewrite returned a node that cannot occupy the slot it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyError {
    pub expected: &'static str,
    pub got: &'static str,
}

impl fmt::Display for ModifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rewrite produced a {} where a {} was required",
            self.got, self.expected
        )
    }
}

/// Rewrites `node` bottom-up with an infallible rewrite function.
pub fn modify<F>(node: Node, modifier: &mut F) -> Result<Node, ModifyError>
where
    F: FnMut(Node) -> Node,
{
    try_modify(node, &mut |node| Ok::<_, ModifyError>(modifier(node)))
}

/// Rewrites `node` bottom-up. The first error returned by `modifier` aborts
/// the walk.
pub fn try_modify<F, E>(node: Node, modifier: &mut F) -> Result<Node, E>
where
    F: FnMut(Node) -> Result<Node, E>,
    E: From<ModifyError>,
{
    let rebuilt = match node {
        Node::Program(program) => Node::Program(Program {
            statements: modify_statements(program.statements, modifier)?,
        }),
        Node::Statement(statement) => Node::Statement(match statement {
            Statement::Let { name, value } => Statement::Let {
                name,
                value: modify_expression(value, modifier)?,
            },
            Statement::Return { value } => Statement::Return {
                value: modify_expression(value, modifier)?,
            },
            Statement::Assignment { name, value } => Statement::Assignment {
                name,
                value: modify_expression(value, modifier)?,
            },
            Statement::Expression(expr) => {
                Statement::Expression(modify_expression(expr, modifier)?)
            }
            Statement::Block(block) => {
                Statement::Block(BlockStatement(modify_statements(block.0, modifier)?))
            }
        }),
        Node::Expression(expr) => Node::Expression(modify_children(expr, modifier)?),
    };
    modifier(rebuilt)
}

fn modify_children<F, E>(expr: Expression, modifier: &mut F) -> Result<Expression, E>
where
    F: FnMut(Node) -> Result<Node, E>,
    E: From<ModifyError>,
{
    use Expression::*;
    let expr = match expr {
        IntegerLiteral(_) | StringLiteral(_) | Boolean(_) | Identifier(_) => expr,
        ArrayLiteral(elements) => ArrayLiteral(modify_expressions(elements, modifier)?),
        HashLiteral(pairs) => {
            let mut rebuilt = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                let key = modify_expression(key, modifier)?;
                let value = modify_expression(value, modifier)?;
                rebuilt.push((key, value));
            }
            HashLiteral(rebuilt)
        }
        Prefix { operator, right } => Prefix {
            operator,
            right: modify_boxed(right, modifier)?,
        },
        Infix {
            operator,
            left,
            right,
        } => Infix {
            operator,
            left: modify_boxed(left, modifier)?,
            right: modify_boxed(right, modifier)?,
        },
        If {
            condition,
            consequence,
            alternative,
        } => If {
            condition: modify_boxed(condition, modifier)?,
            consequence: modify_block(consequence, modifier)?,
            alternative: match alternative {
                Some(block) => Some(modify_block(block, modifier)?),
                None => None,
            },
        },
        FunctionLiteral { parameters, body } => FunctionLiteral {
            parameters,
            body: modify_block(body, modifier)?,
        },
        MacroLiteral { parameters, body } => MacroLiteral {
            parameters,
            body: modify_block(body, modifier)?,
        },
        Call { callee, arguments } => Call {
            callee: modify_boxed(callee, modifier)?,
            arguments: modify_expressions(arguments, modifier)?,
        },
        Index { collection, index } => Index {
            collection: modify_boxed(collection, modifier)?,
            index: modify_boxed(index, modifier)?,
        },
    };
    Ok(expr)
}

fn modify_expression<F, E>(expr: Expression, modifier: &mut F) -> Result<Expression, E>
where
    F: FnMut(Node) -> Result<Node, E>,
    E: From<ModifyError>,
{
    match try_modify(Node::Expression(expr), modifier)? {
        Node::Expression(expr) | Node::Statement(Statement::Expression(expr)) => Ok(expr),
        other => Err(ModifyError {
            expected: "expression",
            got: other.family(),
        }
        .into()),
    }
}

fn modify_boxed<F, E>(expr: Box<Expression>, modifier: &mut F) -> Result<Box<Expression>, E>
where
    F: FnMut(Node) -> Result<Node, E>,
    E: From<ModifyError>,
{
    modify_expression(*expr, modifier).map(Box::new)
}

fn modify_expressions<F, E>(exprs: Vec<Expression>, modifier: &mut F) -> Result<Vec<Expression>, E>
where
    F: FnMut(Node) -> Result<Node, E>,
    E: From<ModifyError>,
{
    exprs
        .into_iter()
        .map(|expr| modify_expression(expr, modifier))
        .collect()
}

fn modify_statements<F, E>(stmts: Vec<Statement>, modifier: &mut F) -> Result<Vec<Statement>, E>
where
    F: FnMut(Node) -> Result<Node, E>,
    E: From<ModifyError>,
{
    let mut rebuilt = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        rebuilt.push(match try_modify(Node::Statement(stmt), modifier)? {
            Node::Statement(stmt) => stmt,
            Node::Expression(expr) => Statement::Expression(expr),
            other => {
                return Err(ModifyError {
                    expected: "statement",
                    got: other.family(),
                }
                .into())
            }
        });
    }
    Ok(rebuilt)
}

fn modify_block<F, E>(block: BlockStatement, modifier: &mut F) -> Result<BlockStatement, E>
where
    F: FnMut(Node) -> Result<Node, E>,
    E: From<ModifyError>,
{
    match try_modify(Node::Statement(Statement::Block(block)), modifier)? {
        Node::Statement(Statement::Block(block)) => Ok(block),
        other => Err(ModifyError {
            expected: "block",
            got: other.family(),
        }
        .into()),
    }
}
