use monkie::ast::{Expression, Node, Program, Statement};
use monkie::interpreter::{self, Interpreter};
use monkie::macros::{define_macros, expand_macros};
use monkie::modify::modify;
use monkie::parser::parse_program;
use monkie::environment::Environment;
use monkie::types::{HashKey, HashPair, Object};
use std::collections::HashMap;

fn run(source: &str) -> Object {
    match Interpreter::new().run(source) {
        Ok(value) => value,
        Err(interpreter::Error::Eval(message)) => Object::Error(message),
        Err(e) => panic!("{:?} failed before evaluation: {}", source, e),
    }
}

fn parse(source: &str) -> Program {
    let (program, errors) = parse_program(source);
    assert!(errors.is_empty(), "parse errors for {:?}: {:?}", source, errors);
    program
}

#[test]
fn integer_literals_evaluate_to_themselves() {
    for n in [0, 1, 42, -7, 123_456_789, i64::MAX].iter() {
        assert_eq!(run(&n.to_string()), Object::Integer(*n));
    }
}

#[test]
fn division_binds_tighter_than_multiplication() {
    assert_eq!(run("50 / 2 * 2 + 10"), Object::Integer(60));
    assert_eq!(parse("a * b / c").to_string(), "(a * (b / c))");
}

#[test]
fn zero_is_falsy() {
    assert_eq!(run("if (0) { 1 }"), Object::Null);
    assert_eq!(run("if (1) { 1 }"), Object::Integer(1));
}

#[test]
fn the_first_error_ends_evaluation() {
    assert_eq!(
        run("5 + true; 5"),
        Object::Error("type mismatch: INTEGER + BOOLEAN".into())
    );
    let interpreter = Interpreter::new();
    interpreter.run("let log = [];").unwrap();
    assert!(interpreter.run("5 + true; push(log, 1);").is_err());
    assert_eq!(interpreter.run("len(log)").unwrap(), Object::Integer(0));
}

#[test]
fn closures_capture_their_environment() {
    assert_eq!(
        run("let add = fn(x) { fn(y) { x + y } }; let addTwo = add(2); addTwo(4);"),
        Object::Integer(6)
    );
}

#[test]
fn assignment_requires_a_declaration() {
    assert_eq!(
        run("a = 5;"),
        Object::Error("variable a hasn't been initialized".into())
    );
    assert_eq!(run("let a = 1; a = 5; a"), Object::Integer(5));
}

#[test]
fn out_of_range_indexes_are_null() {
    assert_eq!(run("let a=[5]; a[5]"), Object::Null);
    assert_eq!(run("let a=[5]; a[-1]"), Object::Null);
}

#[test]
fn hash_lookup_uses_structural_keys() {
    let stored = Object::String("name".into());
    let probe = Object::String("name".into());
    let mut pairs = single_pair_map(stored, Object::Integer(1));
    assert_eq!(
        pairs.remove(&probe.hash_key().unwrap()).map(|pair| pair.value),
        Some(Object::Integer(1))
    );
    assert_eq!(
        run(r#"let h = {"name": 1}; let k = "na" + "me"; h[k]"#),
        Object::Integer(1)
    );
}

fn single_pair_map(key: Object, value: Object) -> HashMap<HashKey, HashPair> {
    let mut map = HashMap::new();
    map.insert(key.hash_key().unwrap(), HashPair { key, value });
    map
}

#[test]
fn expansion_leaves_macro_free_programs_alone() {
    let source = r#"let f = fn(x, y) { if (x > y) { return x; } [x, {"y": y}] }; f(1, 2)[1]; quote(3)"#;
    let env = Environment::new();
    let mut program = parse(source);
    define_macros(&mut program, &env);
    assert_eq!(expand_macros(program, &env).unwrap(), parse(source));
}

#[test]
fn quote_and_unquote_rewrite_macro_calls() {
    let source = "let reverse = macro(a, b) { quote(unquote(b) - unquote(a)); }; reverse(2 + 2, 10 - 5);";
    let interpreter = Interpreter::new();
    let expanded = interpreter.expand(interpreter.read(source).unwrap()).unwrap();
    assert_eq!(expanded, parse("(10 - 5) - (2 + 2)"));
    assert_eq!(expanded.to_string(), "((10 - 5) - (2 + 2))");
    assert_eq!(interpreter.run(source).unwrap(), Object::Integer(1));
}

#[test]
fn unless_macro() {
    let interpreter = Interpreter::new();
    let result = interpreter.run(
        r#"let unless = macro(condition, consequence, alternative) {
            quote(if (!(unquote(condition))) { unquote(consequence); } else { unquote(alternative); });
        };
        unless(10 > 5, "not greater", "greater");"#,
    );
    assert_eq!(result.unwrap(), Object::String("greater".into()));
}

#[test]
fn one_bad_statement_yields_one_error() {
    let (program, errors) = parse_program("let = 5; let y = 10;");
    assert_eq!(errors.len(), 1);
    assert_eq!(program.statements.len(), 1);
    assert_eq!(program.to_string(), "let y = 10");
}

#[test]
fn modify_is_reusable_outside_macros() {
    let program = parse("let x = 1 + 2; fn(a) { a * 1 }");
    let doubled = modify(Node::Program(program), &mut |node| match node {
        Node::Expression(Expression::IntegerLiteral(n)) => {
            Node::Expression(Expression::IntegerLiteral(n * 2))
        }
        other => other,
    })
    .unwrap();
    match doubled {
        Node::Program(program) => {
            assert_eq!(program.to_string(), "let x = (2 + 4); fn(a) { (a * 2) }");
            assert!(matches!(program.statements[0], Statement::Let { .. }));
        }
        other => panic!("expected a program, got {}", other),
    }
}

#[test]
fn arrays_are_shared_by_reference() {
    assert_eq!(
        run("let a = [1]; let alias = a; push(alias, 2); len(a)"),
        Object::Integer(2)
    );
}
