use crate::ast::{Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::environment::{Environment, UnknownSymbol};
use crate::modify::ModifyError;
use crate::types::{truthy, BadArgCount, Builtin, Closure, HashPair, MonkeyInt, Object};
use crate::{core, special_forms};
use derive_more::Display;
use indexmap::IndexMap;
use itertools::Itertools;
use std::convert::TryFrom;
use std::rc::Rc;

pub type Result<T = Object> = std::result::Result<T, Error>;

#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "identifier not found: {}", _0)]
    UnknownIdentifier(String),
    #[display(fmt = "variable {} hasn't been initialized", _0)]
    Uninitialized(String),
    #[display(fmt = "unknown operator: {}{}", operator, operand)]
    UnknownPrefixOperator {
        operator: PrefixOperator,
        operand: &'static str,
    },
    #[display(fmt = "unknown operator: {} {} {}", left, operator, right)]
    UnknownInfixOperator {
        left: &'static str,
        operator: InfixOperator,
        right: &'static str,
    },
    #[display(fmt = "type mismatch: {} {} {}", left, operator, right)]
    TypeMismatch {
        left: &'static str,
        operator: InfixOperator,
        right: &'static str,
    },
    #[display(fmt = "division by zero")]
    DivisionByZero,
    #[display(fmt = "key of type {} is not hashable", _0)]
    Unhashable(&'static str),
    #[display(fmt = "index operator not supported: {}[{}]", collection, index)]
    IndexNotSupported {
        collection: &'static str,
        index: &'static str,
    },
    #[display(fmt = "not a function: {}", _0)]
    NotCallable(&'static str),
    #[display(fmt = "{}", _0)]
    BadArgCount(BadArgCount),
    #[display(fmt = "argument to `{}` not supported. got {}", builtin, got)]
    UnsupportedArgument {
        builtin: &'static str,
        got: &'static str,
    },
    #[display(fmt = "{} to `{}` must be {}, got {}", position, builtin, expected, got)]
    WrongArgumentType {
        position: &'static str,
        builtin: &'static str,
        expected: &'static str,
        got: &'static str,
    },
    #[display(fmt = "cannot unquote a value of type {}", _0)]
    Unquotable(&'static str),
    #[display(fmt = "macro {} must return a quoted expression, got {}", name, got)]
    MacroResultNotQuoted { name: String, got: &'static str },
    #[display(fmt = "macro literal is only allowed as the value of a top-level let")]
    MisplacedMacroLiteral,
    #[display(fmt = "{}", _0)]
    Modify(ModifyError),
}

impl From<BadArgCount> for Error {
    fn from(e: BadArgCount) -> Self {
        Self::BadArgCount(e)
    }
}

impl From<ModifyError> for Error {
    fn from(e: ModifyError) -> Self {
        Self::Modify(e)
    }
}

impl From<UnknownSymbol> for Error {
    fn from(UnknownSymbol(name): UnknownSymbol) -> Self {
        Self::UnknownIdentifier(name)
    }
}

impl std::error::Error for Error {}

/// Evaluates a whole program. Failures come back as an `Object::Error`
/// carrying the message, never as a panic.
pub fn eval(program: &Program, env: &Rc<Environment>) -> Object {
    match eval_program(program, env) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("evaluation failed: {}", e);
            Object::Error(e.to_string())
        }
    }
}

/// Like a block, except that a `return` stops the program and yields the
/// returned value itself.
pub(crate) fn eval_program(program: &Program, env: &Rc<Environment>) -> Result {
    let mut result = Object::Null;
    for statement in &program.statements {
        match eval_statement(statement, env)? {
            Object::ReturnValue(value) => return Ok(*value),
            value => result = value,
        }
    }
    Ok(result)
}

pub(crate) fn eval_block(block: &[Statement], env: &Rc<Environment>) -> Result {
    let mut result = Object::Null;
    for statement in block {
        result = eval_statement(statement, env)?;
        if let Object::ReturnValue(_) = result {
            break;
        }
    }
    Ok(result)
}

fn eval_statement(statement: &Statement, env: &Rc<Environment>) -> Result {
    match statement {
        Statement::Let { name, value } => special_forms::apply_let(name, value, env),
        Statement::Assignment { name, value } => special_forms::apply_assignment(name, value, env),
        Statement::Return { value } => {
            let value = eval_expression(value, env)?;
            Ok(Object::ReturnValue(Box::new(value)))
        }
        Statement::Expression(expr) => eval_expression(expr, env),
        Statement::Block(block) => eval_block(block, env),
    }
}

pub(crate) fn eval_expression(expr: &Expression, env: &Rc<Environment>) -> Result {
    use Expression::*;
    match expr {
        IntegerLiteral(value) => Ok(Object::Integer(*value)),
        StringLiteral(value) => Ok(Object::String(value.clone())),
        Boolean(value) => Ok(Object::Boolean(*value)),
        Identifier(name) => lookup_identifier(name, env),
        ArrayLiteral(elements) => evaluate_expressions(elements, env).map(Object::wrap_array),
        HashLiteral(pairs) => eval_hash_literal(pairs, env),
        Prefix { operator, right } => {
            let right = eval_expression(right, env)?;
            eval_prefix(*operator, right)
        }
        Infix {
            operator,
            left,
            right,
        } => {
            let left = eval_expression(left, env)?;
            let right = eval_expression(right, env)?;
            eval_infix(*operator, left, right)
        }
        If {
            condition,
            consequence,
            alternative,
        } => special_forms::apply_if(condition, consequence, alternative.as_ref(), env),
        FunctionLiteral { parameters, body } => special_forms::apply_fn(parameters, body, env),
        MacroLiteral { .. } => Err(Error::MisplacedMacroLiteral),
        Call { callee, arguments } => {
            if expr.called_name() == Some("quote") {
                return special_forms::apply_quote(arguments, env);
            }
            let callee = eval_expression(callee, env)?;
            let arguments = evaluate_expressions(arguments, env)?;
            apply(&callee, &arguments)
        }
        Index { collection, index } => {
            let collection = eval_expression(collection, env)?;
            let index = eval_expression(index, env)?;
            eval_index(&collection, &index)
        }
    }
}

fn lookup_identifier(name: &str, env: &Rc<Environment>) -> Result {
    match env.fetch(name) {
        Ok(value) => Ok(value),
        Err(unknown) => core::lookup(name)
            .map(Object::Builtin)
            .ok_or_else(|| unknown.into()),
    }
}

fn evaluate_expressions(exprs: &[Expression], env: &Rc<Environment>) -> Result<Vec<Object>> {
    exprs.iter().map(|expr| eval_expression(expr, env)).collect()
}

fn eval_hash_literal(pairs: &[(Expression, Expression)], env: &Rc<Environment>) -> Result {
    let mut evaluated = IndexMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        let key = eval_expression(key, env)?;
        let hash_key = key.hash_key().ok_or(Error::Unhashable(key.type_name()))?;
        let value = eval_expression(value, env)?;
        evaluated.insert(hash_key, HashPair { key, value });
    }
    Ok(Object::wrap_hash(evaluated))
}

fn eval_prefix(operator: PrefixOperator, right: Object) -> Result {
    match (operator, right) {
        (PrefixOperator::Bang, right) => Ok(Object::Boolean(!truthy(&right))),
        (PrefixOperator::Minus, Object::Integer(value)) => {
            Ok(Object::Integer(value.wrapping_neg()))
        }
        (PrefixOperator::Minus, right) => Err(Error::UnknownPrefixOperator {
            operator,
            operand: right.type_name(),
        }),
    }
}

fn eval_infix(operator: InfixOperator, left: Object, right: Object) -> Result {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(operator, *l, *r),
        (Object::String(l), Object::String(r)) => match operator {
            InfixOperator::Plus => Ok(Object::String(format!("{}{}", l, r))),
            InfixOperator::Eq => Ok(Object::Boolean(l == r)),
            InfixOperator::NotEq => Ok(Object::Boolean(l != r)),
            _ => Err(unknown_infix(operator, &left, &right)),
        },
        (Object::Boolean(l), Object::Boolean(r)) => match operator {
            InfixOperator::Eq => Ok(Object::Boolean(l == r)),
            InfixOperator::NotEq => Ok(Object::Boolean(l != r)),
            _ => Err(unknown_infix(operator, &left, &right)),
        },
        _ if left.type_name() != right.type_name() => Err(Error::TypeMismatch {
            left: left.type_name(),
            operator,
            right: right.type_name(),
        }),
        _ => Err(unknown_infix(operator, &left, &right)),
    }
}

fn unknown_infix(operator: InfixOperator, left: &Object, right: &Object) -> Error {
    Error::UnknownInfixOperator {
        left: left.type_name(),
        operator,
        right: right.type_name(),
    }
}

fn eval_integer_infix(operator: InfixOperator, l: MonkeyInt, r: MonkeyInt) -> Result {
    use InfixOperator::*;
    let value = match operator {
        Plus => Object::Integer(l.wrapping_add(r)),
        Minus => Object::Integer(l.wrapping_sub(r)),
        Asterisk => Object::Integer(l.wrapping_mul(r)),
        Slash => match r {
            0 => return Err(Error::DivisionByZero),
            _ => Object::Integer(l.wrapping_div(r)),
        },
        Eq => Object::Boolean(l == r),
        NotEq => Object::Boolean(l != r),
        Lt => Object::Boolean(l < r),
        Gt => Object::Boolean(l > r),
        Lte => Object::Boolean(l <= r),
        Gte => Object::Boolean(l >= r),
    };
    Ok(value)
}

fn eval_index(collection: &Object, index: &Object) -> Result {
    match (collection, index) {
        (Object::Array(elements), Object::Integer(i)) => {
            let elements = elements.borrow();
            let element = usize::try_from(*i).ok().and_then(|i| elements.get(i));
            Ok(element.cloned().unwrap_or(Object::Null))
        }
        (Object::Hash(pairs), key) => {
            let hash_key = key.hash_key().ok_or(Error::Unhashable(key.type_name()))?;
            Ok(pairs
                .get(&hash_key)
                .map(|pair| pair.value.clone())
                .unwrap_or(Object::Null))
        }
        _ => Err(Error::IndexNotSupported {
            collection: collection.type_name(),
            index: index.type_name(),
        }),
    }
}

pub(crate) fn pretty_print_args(args: &[Object]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => format!("\n\t{}", args.iter().join("\n\t")),
    }
}

/// Calls a function or builtin with already-evaluated arguments.
pub(crate) fn apply(callable: &Object, args: &[Object]) -> Result {
    match callable {
        Object::Builtin(builtin) => call_builtin(builtin, args),
        Object::Function(closure) => {
            let env = make_closure_env(closure, args)?;
            let result = eval_block(&closure.body, &env)?;
            Ok(unwrap_return_value(result))
        }
        other => Err(Error::NotCallable(other.type_name())),
    }
}

pub(crate) fn unwrap_return_value(obj: Object) -> Object {
    match obj {
        Object::ReturnValue(value) => *value,
        other => other,
    }
}

pub fn call_builtin(builtin: &Builtin, args: &[Object]) -> Result {
    builtin.arity.validate_for(args.len(), builtin.name)?;
    log::trace!("Call {} with {}", builtin.name, pretty_print_args(args));
    let result = (builtin.fn_ptr)(args);
    match &result {
        Ok(val) => log::trace!("Call to {} resulted in {}", builtin.name, val),
        Err(e) => log::trace!("Call to {} failed: {}", builtin.name, e),
    }
    result
}

/// A fresh scope under the closure's captured environment with each
/// parameter bound to its argument.
pub(crate) fn make_closure_env(func: &Closure, args: &[Object]) -> Result<Rc<Environment>> {
    log::trace!("Call fn{} with {}", func, pretty_print_args(args));
    func.arity().validate_for(args.len(), "closure")?;
    let env = Environment::spawn_from(&func.env);
    for (parameter, value) in func.parameters.iter().zip(args) {
        env.set(parameter.as_ref(), value.clone());
    }
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn run(source: &str) -> Object {
        let (program, errors) = parse_program(source);
        assert!(errors.is_empty(), "parse errors for {:?}: {:?}", source, errors);
        eval(&program, &Environment::new())
    }

    fn int(n: MonkeyInt) -> Object {
        Object::Integer(n)
    }

    fn error(message: &str) -> Object {
        Object::Error(message.to_string())
    }

    #[test]
    fn integer_arithmetic() {
        let cases = [
            ("5", 5),
            ("-10", -10),
            ("--5", 5),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("-50 + 100 + -50", 0),
            ("20 + 2 * -10", 0),
            ("50 / 2 * 2 + 10", 60),
            ("2 * (5 + 10)", 30),
            ("3 * 3 * 3 + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
            ("7 / 2", 3),
            ("-7 / 2", -3),
            ("8 / 4 * 2", 4),
            ("2 * 8 / 4", 4),
            ("100 / 10 * 5", 50),
        ];
        for (source, expected) in cases.iter() {
            assert_eq!(run(source), int(*expected), "source: {}", source);
        }
    }

    #[test]
    fn arithmetic_edges() {
        assert_eq!(run("1 / 0"), error("division by zero"));
        assert_eq!(run("9223372036854775807 + 1"), int(MonkeyInt::MIN));
        assert_eq!(
            run("let min = -9223372036854775807 - 1; min / -1"),
            int(MonkeyInt::MIN)
        );
    }

    #[test]
    fn boolean_expressions() {
        let cases = [
            ("true", true),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 <= 1", true),
            ("2 >= 3", false),
            ("1 == 1", true),
            ("1 != 1", false),
            ("true == true", true),
            ("true != false", true),
            ("(1 < 2) == true", true),
            ("(1 > 2) == true", false),
            ("!true", false),
            ("!!5", true),
            ("!0", true),
            (r#""a" == "a""#, true),
            (r#""a" != "b""#, true),
        ];
        for (source, expected) in cases.iter() {
            assert_eq!(run(source), Object::Boolean(*expected), "source: {}", source);
        }
    }

    #[test]
    fn conditionals() {
        assert_eq!(run("if (true) { 10 }"), int(10));
        assert_eq!(run("if (false) { 10 }"), Object::Null);
        assert_eq!(run("if (0) { 1 }"), Object::Null);
        assert_eq!(run("if (1) { 1 }"), int(1));
        assert_eq!(run("if (1 > 2) { 10 } else { 20 }"), int(20));
        assert_eq!(run(r#"if ("") { 1 } else { 2 }"#), int(1));
    }

    #[test]
    fn return_statements() {
        assert_eq!(run("return 10; 9;"), int(10));
        assert_eq!(run("9; return 2 * 5; 9;"), int(10));
        assert_eq!(
            run("if (10 > 1) { if (10 > 1) { return 10; } return 1; }"),
            int(10)
        );
        assert_eq!(
            run("let f = fn(x) { return x; x + 10; }; f(10);"),
            int(10)
        );
        assert_eq!(
            run("let f = fn(x) { let result = x + 10; return result; return 10; }; f(10);"),
            int(20)
        );
    }

    #[test]
    fn error_messages() {
        let cases = [
            ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
            ("5; true + false; 5", "unknown operator: BOOLEAN + BOOLEAN"),
            ("if (10 > 1) { true + false; }", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "if (10 > 1) { if (10 > 1) { return true + false; } return 1; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: foobar"),
            (r#""Hello" - "World""#, "unknown operator: STRING - STRING"),
            (r#"{"name": "Monkey"}[fn(x) { x }];"#, "key of type FUNCTION is not hashable"),
            (r#"{[1]: 2}"#, "key of type ARRAY is not hashable"),
            ("1[0]", "index operator not supported: INTEGER[INTEGER]"),
            ("[1][true]", "index operator not supported: ARRAY[BOOLEAN]"),
            ("5(1)", "not a function: INTEGER"),
            ("let f = fn(x) { x }; f(1, 2)", "wrong number of arguments. got=2, want=1"),
            ("let f = fn(x, y) { x }; f(1)", "wrong number of arguments. got=1, want=2"),
            ("let m = macro(x) { x }; 1", "macro literal is only allowed as the value of a top-level let"),
            ("null == null", "identifier not found: null"),
        ];
        for (source, expected) in cases.iter() {
            assert_eq!(run(source), error(expected), "source: {}", source);
        }
    }

    #[test]
    fn errors_stop_evaluation() {
        let env = Environment::new();
        let (program, _) = parse_program("let a = 1; a + true; let a = 2;");
        assert_eq!(eval(&program, &env), error("type mismatch: INTEGER + BOOLEAN"));
        assert_eq!(env.get("a"), Some(int(1)));

        let (program, _) = parse_program("[1, missing, 3]");
        assert_eq!(eval(&program, &env), error("identifier not found: missing"));
    }

    #[test]
    fn bindings_and_closures() {
        assert_eq!(run("let a = 5; a;"), int(5));
        assert_eq!(run("let a = 5; let b = a; let c = a + b + 5; c;"), int(15));
        assert_eq!(run("let identity = fn(x) { x; }; identity(5);"), int(5));
        assert_eq!(run("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));"), int(20));
        assert_eq!(run("fn(x) { x; }(5)"), int(5));
        assert_eq!(
            run("let add = fn(x) { fn(y) { x + y } }; let addTwo = add(2); addTwo(4);"),
            int(6)
        );
        assert_eq!(
            run("let fib = fn(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } }; fib(15)"),
            int(610)
        );
    }

    #[test]
    fn function_objects() {
        match run("fn(x) { x + 2; };") {
            Object::Function(closure) => {
                assert_eq!(closure.parameters.len(), 1);
                assert_eq!(closure.body.to_string(), "{ (x + 2) }");
            }
            other => panic!("not a function: {:?}", other),
        }
    }

    #[test]
    fn strings() {
        assert_eq!(run(r#""Hello World!""#), Object::String("Hello World!".into()));
        assert_eq!(
            run(r#""Hello" + " " + "World!""#),
            Object::String("Hello World!".into())
        );
    }

    #[test]
    fn builtins() {
        assert_eq!(run(r#"len("")"#), int(0));
        assert_eq!(run(r#"len("hello world")"#), int(11));
        assert_eq!(run("len([1, 2, 3])"), int(3));
        assert_eq!(run("len(1)"), error("argument to `len` not supported. got INTEGER"));
        assert_eq!(
            run(r#"len("one", "two")"#),
            error("wrong number of arguments. got=2, want=1")
        );
        assert_eq!(run("first([1, 2, 3])"), int(1));
        assert_eq!(run("last([1, 2, 3])"), int(3));
        assert_eq!(run("rest([1, 2, 3])").to_string(), "[2, 3]");
        assert_eq!(run("rest([])"), Object::Null);
        assert_eq!(run("let a = [1]; push(a, 2); a").to_string(), "[1, 2]");
        assert_eq!(run("let len = fn(x) { 42 }; len([])"), int(42));
        assert_eq!(run("len").to_string(), "builtin function len");
    }

    #[test]
    fn arrays_and_indexing() {
        assert_eq!(run("[1, 2 * 2, 3 + 3]").to_string(), "[1, 4, 6]");
        assert_eq!(run("[1, 2, 3][0]"), int(1));
        assert_eq!(run("[1, 2, 3][1 + 1]"), int(3));
        assert_eq!(run("let i = 0; [1][i]"), int(1));
        assert_eq!(run("let a = [1, 2, 3]; a[0] + a[1] + a[2]"), int(6));
        assert_eq!(run("[1, 2, 3][3]"), Object::Null);
        assert_eq!(run("[1, 2, 3][-1]"), Object::Null);
        assert_eq!(run("let a = [5]; a[5]"), Object::Null);
    }

    #[test]
    fn hashes() {
        let source = r#"let two = "two";
            {"one": 10 - 9, two: 1 + 1, "thr" + "ee": 6 / 2, 4: 4, true: 5, false: 6}"#;
        assert_eq!(
            run(source).to_string(),
            r#"{"one": 1, "two": 2, "three": 3, 4: 4, true: 5, false: 6}"#
        );
        assert_eq!(run(r#"{"foo": 5}["foo"]"#), int(5));
        assert_eq!(run(r#"{"foo": 5}["bar"]"#), Object::Null);
        assert_eq!(run(r#"let key = "foo"; {"foo": 5}[key]"#), int(5));
        assert_eq!(run(r#"{}["foo"]"#), Object::Null);
        assert_eq!(run("{5: 5}[5]"), int(5));
        assert_eq!(run("{true: 5}[true]"), int(5));
        assert_eq!(run(r#"{"a": 1, "a": 2}["a"]"#), int(2));
    }

    #[test]
    fn arrays_are_shared_between_aliases() {
        assert_eq!(
            run("let a = [1]; let b = a; let add = fn(arr) { push(arr, 3) }; push(b, 2); add(a); a")
                .to_string(),
            "[1, 2, 3]"
        );
    }

    #[test]
    fn macros_are_not_callable_values() {
        let env = Environment::new();
        env.set(
            "m",
            Object::Macro(Rc::new(Closure {
                parameters: vec![],
                body: Default::default(),
                env: env.clone(),
            })),
        );
        let (program, _) = parse_program("m()");
        assert_eq!(eval(&program, &env), error("not a function: MACRO"));
    }

    #[test]
    fn empty_program_is_null() {
        assert_eq!(run(""), Object::Null);
        assert_eq!(run("fn() { }()"), Object::Null);
    }
}
