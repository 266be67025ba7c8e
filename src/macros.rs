//! The expansion pass that runs between parsing and evaluation.
//!
//! `define_macros` lifts top-level `let name = macro(...) { ... }` statements
//! out of the program into a dedicated environment, then `expand_macros`
//! replaces every call of one of those macros with the syntax its body
//! quotes. Arguments reach the macro body as unevaluated `Quote` objects.

use crate::ast::{Expression, Node, Program, Statement};
use crate::environment::Environment;
use crate::evaluator::{eval_block, make_closure_env, unwrap_return_value, Error, Result};
use crate::modify::{try_modify, ModifyError};
use crate::types::{Closure, Object};
use std::rc::Rc;

/// Moves every top-level macro definition from `program` into `env`. All
/// other statements keep their order.
pub fn define_macros(program: &mut Program, env: &Rc<Environment>) {
    let statements = std::mem::take(&mut program.statements);
    for statement in statements {
        match statement {
            Statement::Let {
                name,
                value: Expression::MacroLiteral { parameters, body },
            } => {
                log::debug!("define macro {}", name);
                let closure = Closure {
                    parameters,
                    body,
                    env: env.clone(),
                };
                env.set(name.0, Object::Macro(Rc::new(closure)));
            }
            other => program.statements.push(other),
        }
    }
}

pub fn expand_macros(program: Program, env: &Rc<Environment>) -> Result<Program> {
    match try_modify(Node::Program(program), &mut |node| expand_call(node, env))? {
        Node::Program(program) => Ok(program),
        other => Err(ModifyError {
            expected: "program",
            got: other.family(),
        }
        .into()),
    }
}

fn lookup_macro(name: &str, env: &Environment) -> Option<Rc<Closure>> {
    match env.get(name) {
        Some(Object::Macro(closure)) => Some(closure),
        _ => None,
    }
}

fn expand_call(node: Node, env: &Rc<Environment>) -> Result<Node> {
    let name = match &node {
        Node::Expression(expr) => expr.called_name().map(str::to_string),
        _ => None,
    };
    let (name, closure) = match name {
        Some(name) => match lookup_macro(&name, env) {
            Some(closure) => (name, closure),
            None => return Ok(node),
        },
        None => return Ok(node),
    };
    let arguments = match node {
        Node::Expression(Expression::Call { arguments, .. }) => arguments,
        other => return Ok(other),
    };

    let quoted: Vec<Object> = arguments
        .into_iter()
        .map(|arg| Object::Quote(Rc::new(arg)))
        .collect();
    let scope = make_closure_env(&closure, &quoted)?;
    match unwrap_return_value(eval_block(&closure.body, &scope)?) {
        Object::Quote(expansion) => {
            let expansion = Rc::try_unwrap(expansion).unwrap_or_else(|shared| (*shared).clone());
            log::debug!("expanded macro {} to {}", name, expansion);
            Ok(Node::Expression(expansion))
        }
        other => Err(Error::MacroResultNotQuoted {
            name,
            got: other.type_name(),
        }),
    }
}
