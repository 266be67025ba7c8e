use crate::ast::Program;
use crate::environment::Environment;
use crate::parser::{parse_program, ParseError};
use crate::types::Object;
use crate::{evaluator, macros};
use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
pub enum Error {
    Parse(Vec<ParseError>),
    Expand(evaluator::Error),
    Eval(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(errors) => {
                write!(f, "{}", errors.iter().map(|e| format!("\t{}", e)).join("\n"))
            }
            Error::Expand(e) => write!(f, "{}", e),
            Error::Eval(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// How a failure is shown to a REPL user: parse errors as they are,
    /// anything else as an inspected error object.
    pub fn render(&self) -> String {
        match self {
            Error::Parse(_) => self.to_string(),
            other => Object::Error(other.to_string()).to_string(),
        }
    }
}

pub type Result<T = Object> = std::result::Result<T, Error>;

/// A read → expand → eval pipeline whose value and macro environments
/// outlive any single piece of source, so REPL lines can build on each other.
pub struct Interpreter {
    env: Rc<Environment>,
    macro_env: Rc<Environment>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            macro_env: Environment::new(),
        }
    }

    pub fn env(&self) -> &Rc<Environment> {
        &self.env
    }

    pub fn read(&self, source: &str) -> Result<Program> {
        let (program, errors) = parse_program(source);
        match errors.is_empty() {
            true => Ok(program),
            false => Err(Error::Parse(errors)),
        }
    }

    pub fn expand(&self, mut program: Program) -> Result<Program> {
        macros::define_macros(&mut program, &self.macro_env);
        macros::expand_macros(program, &self.macro_env).map_err(Error::Expand)
    }

    pub fn run(&self, source: &str) -> Result {
        let program = self.expand(self.read(source)?)?;
        log::trace!("evaluating {}", program);
        match evaluator::eval(&program, &self.env) {
            Object::Error(message) => Err(Error::Eval(message)),
            value => Ok(value),
        }
    }

    /// One REPL step: the inspected result, `ERROR: ...` for a failed
    /// evaluation, or the parse errors one per line.
    pub fn rep(&self, line: &str) -> String {
        match self.run(line) {
            Ok(value) => value.to_string(),
            Err(e) => e.render(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_persists_between_runs() {
        let interpreter = Interpreter::new();
        assert_eq!(interpreter.run("let x = 2;").unwrap(), Object::Null);
        assert_eq!(interpreter.run("x * 21").unwrap(), Object::Integer(42));
    }

    #[test]
    fn macros_persist_between_runs() {
        let interpreter = Interpreter::new();
        interpreter
            .run("let double = macro(x) { quote(unquote(x) * 2) };")
            .unwrap();
        assert_eq!(interpreter.run("double(21)").unwrap(), Object::Integer(42));
        assert!(interpreter.env().get("double").is_none());
    }

    #[test]
    fn rep_renders_results_and_errors() {
        let interpreter = Interpreter::new();
        assert_eq!(interpreter.rep(r#""a" + "b""#), r#""ab""#);
        assert_eq!(interpreter.rep("[1, true]"), "[1, true]");
        assert_eq!(interpreter.rep("1 + true"), "ERROR: type mismatch: INTEGER + BOOLEAN");
        assert_eq!(
            interpreter.rep("let m = macro() { 1 }; m()"),
            "ERROR: macro m must return a quoted expression, got INTEGER"
        );
        assert_eq!(
            interpreter.rep("let = 1; (2"),
            "\texpected next token to be IDENT, got = instead\n\
             \texpected next token to be ), got EOF instead"
        );
    }

    #[test]
    fn read_rejects_any_parse_error() {
        match Interpreter::new().read("let x 5;") {
            Err(Error::Parse(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }
}
