use crate::ast::{BlockStatement, Expression, Identifier, Node, Statement};
use crate::environment::Environment;
use crate::evaluator::{eval_block, eval_expression, Error, Result};
use crate::modify::{try_modify, ModifyError};
use crate::types::{truthy, Arity, Closure, Object};
use std::rc::Rc;

pub fn apply_let(name: &Identifier, value: &Expression, env: &Rc<Environment>) -> Result {
    let value = eval_expression(value, env)?;
    log::debug!("define {} as {}", name, value);
    env.set(name.as_ref(), value);
    Ok(Object::Null)
}

/// `name = value`: only rebinds names that already exist somewhere in the
/// scope chain.
pub fn apply_assignment(name: &Identifier, value: &Expression, env: &Rc<Environment>) -> Result {
    if !env.contains(name) {
        return Err(Error::Uninitialized(name.to_string()));
    }
    let value = eval_expression(value, env)?;
    log::debug!("assign {} = {}", name, value);
    env.assign(name, value)
        .map_err(|_| Error::Uninitialized(name.to_string()))?;
    Ok(Object::Null)
}

pub fn apply_if(
    condition: &Expression,
    consequence: &BlockStatement,
    alternative: Option<&BlockStatement>,
    env: &Rc<Environment>,
) -> Result {
    let condition = eval_expression(condition, env)?;
    if truthy(&condition) {
        eval_block(consequence, env)
    } else if let Some(alternative) = alternative {
        eval_block(alternative, env)
    } else {
        Ok(Object::Null)
    }
}

pub fn apply_fn(parameters: &[Identifier], body: &BlockStatement, env: &Rc<Environment>) -> Result {
    let closure = Closure {
        parameters: parameters.to_vec(),
        body: body.clone(),
        env: env.clone(),
    };
    Ok(Object::Function(Rc::new(closure)))
}

/// `quote(expr)`: captures `expr` unevaluated, except that every
/// `unquote(x)` inside it is replaced by the syntax for the value of `x`.
pub fn apply_quote(args: &[Expression], env: &Rc<Environment>) -> Result {
    Arity::exactly(1).validate_for(args.len(), "quote")?;
    let quoted = try_modify(Node::Expression(args[0].clone()), &mut |node| {
        evaluate_unquote(node, env)
    })?;
    match quoted {
        Node::Expression(expr) | Node::Statement(Statement::Expression(expr)) => {
            Ok(Object::Quote(Rc::new(expr)))
        }
        other => Err(ModifyError {
            expected: "expression",
            got: other.family(),
        }
        .into()),
    }
}

fn is_unquote(callee: &Expression) -> bool {
    match callee {
        Expression::Identifier(name) => name.as_ref() == "unquote",
        _ => false,
    }
}

fn evaluate_unquote(node: Node, env: &Rc<Environment>) -> Result<Node> {
    match node {
        Node::Expression(Expression::Call { callee, arguments }) if is_unquote(&callee) => {
            Arity::exactly(1).validate_for(arguments.len(), "unquote")?;
            let value = eval_expression(&arguments[0], env)?;
            log::trace!("unquote {} -> {}", arguments[0], value);
            Ok(Node::Expression(object_to_syntax(value)?))
        }
        other => Ok(other),
    }
}

fn object_to_syntax(value: Object) -> Result<Expression> {
    match value {
        Object::Integer(n) => Ok(Expression::IntegerLiteral(n)),
        Object::Boolean(b) => Ok(Expression::Boolean(b)),
        Object::String(s) => Ok(Expression::StringLiteral(s)),
        Object::Quote(node) => Ok(Rc::try_unwrap(node).unwrap_or_else(|shared| (*shared).clone())),
        other => Err(Error::Unquotable(other.type_name())),
    }
}
