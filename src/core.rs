use crate::evaluator::{self, Error};
use crate::printer::{pr_str, PrintMode};
use crate::types::{Arity, Builtin, MonkeyInt, Object};
use itertools::Itertools;
use std::collections::HashMap;

fn array_argument(builtin: &'static str, arg: &Object) -> evaluator::Result<Vec<Object>> {
    match arg {
        Object::Array(array) => Ok(array.borrow().clone()),
        other => Err(Error::WrongArgumentType {
            position: "argument",
            builtin,
            expected: "ARRAY",
            got: other.type_name(),
        }),
    }
}

// Each builtin is a `static` descriptor next to the function it points at;
// the registry below hands out `&'static` references to them.
macro_rules! builtin {
    ($NAME:ident, $fn_ptr:ident, $arity:expr) => {
        paste::item! {
            static [<$NAME:upper>]: Builtin = Builtin {
                name: stringify!($NAME),
                fn_ptr: $fn_ptr,
                arity: $arity,
            };
        }
    };
}

builtin!(len, len_, Arity::exactly(1));
fn len_(args: &[Object]) -> evaluator::Result {
    let length = match &args[0] {
        Object::String(s) => s.len(),
        Object::Array(array) => array.borrow().len(),
        other => {
            return Err(Error::UnsupportedArgument {
                builtin: "len",
                got: other.type_name(),
            })
        }
    };
    Ok(Object::Integer(length as MonkeyInt))
}

builtin!(first, first_, Arity::exactly(1));
fn first_(args: &[Object]) -> evaluator::Result {
    let elements = array_argument("first", &args[0])?;
    Ok(elements.into_iter().next().unwrap_or(Object::Null))
}

builtin!(last, last_, Arity::exactly(1));
fn last_(args: &[Object]) -> evaluator::Result {
    let elements = array_argument("last", &args[0])?;
    Ok(elements.into_iter().last().unwrap_or(Object::Null))
}

builtin!(rest, rest_, Arity::exactly(1));
fn rest_(args: &[Object]) -> evaluator::Result {
    match array_argument("rest", &args[0])?.split_first() {
        Some((_, tail)) => Ok(Object::wrap_array(tail.to_vec())),
        None => Ok(Object::Null),
    }
}

builtin!(push, push_, Arity::exactly(2));
fn push_(args: &[Object]) -> evaluator::Result {
    match &args[0] {
        Object::Array(array) => {
            array.borrow_mut().push(args[1].clone());
            Ok(Object::Null)
        }
        other => Err(Error::WrongArgumentType {
            position: "first argument",
            builtin: "push",
            expected: "ARRAY",
            got: other.type_name(),
        }),
    }
}

builtin!(print, print_, Arity::at_least(0));
fn print_(args: &[Object]) -> evaluator::Result {
    print!("{}", print_line(args));
    Ok(Object::Null)
}

/// What `print` writes: every argument shown directly, nothing between
/// them, then a newline.
fn print_line(args: &[Object]) -> String {
    let mut line = args
        .iter()
        .map(|arg| pr_str(arg, PrintMode::Directly))
        .join("");
    line.push('\n');
    line
}

type Namespace = HashMap<&'static str, &'static Builtin>;
lazy_static! {
    static ref CORE: Namespace = {
        let mut map = Namespace::new();
        for func in [&LEN, &FIRST, &LAST, &REST, &PUSH, &PRINT].iter() {
            map.insert(func.name, *func);
        }
        map
    };
}

/// The builtin registered under `name`, if any.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    CORE.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Object>) -> evaluator::Result {
        let builtin = lookup(name).unwrap();
        builtin.arity.validate_for(args.len(), name)?;
        (builtin.fn_ptr)(&args)
    }

    fn ints(values: &[MonkeyInt]) -> Object {
        Object::wrap_array(values.iter().copied().map(Object::Integer).collect())
    }

    #[test]
    fn registry_knows_every_builtin() {
        for name in ["len", "first", "last", "rest", "push", "print"].iter() {
            assert_eq!(lookup(name).map(|b| b.name), Some(*name));
        }
        assert!(lookup("puts").is_none());
    }

    #[test]
    fn len_counts_bytes_and_elements() {
        assert_eq!(call("len", vec![Object::String("".into())]).unwrap(), Object::Integer(0));
        assert_eq!(call("len", vec![Object::String("four".into())]).unwrap(), Object::Integer(4));
        assert_eq!(call("len", vec![ints(&[1, 2, 3])]).unwrap(), Object::Integer(3));
        assert_eq!(
            call("len", vec![Object::Integer(1)]).unwrap_err().to_string(),
            "argument to `len` not supported. got INTEGER"
        );
        assert_eq!(
            call("len", vec![Object::Null, Object::Null]).unwrap_err().to_string(),
            "wrong number of arguments. got=2, want=1"
        );
    }

    #[test]
    fn first_last_and_rest() {
        assert_eq!(call("first", vec![ints(&[1, 2, 3])]).unwrap(), Object::Integer(1));
        assert_eq!(call("last", vec![ints(&[1, 2, 3])]).unwrap(), Object::Integer(3));
        assert_eq!(call("rest", vec![ints(&[1, 2, 3])]).unwrap(), ints(&[2, 3]));
        assert_eq!(call("first", vec![ints(&[])]).unwrap(), Object::Null);
        assert_eq!(call("last", vec![ints(&[])]).unwrap(), Object::Null);
        assert_eq!(call("rest", vec![ints(&[])]).unwrap(), Object::Null);
        assert_eq!(
            call("first", vec![Object::Integer(1)]).unwrap_err().to_string(),
            "argument to `first` must be ARRAY, got INTEGER"
        );
        assert_eq!(
            call("rest", vec![Object::String("x".into())]).unwrap_err().to_string(),
            "argument to `rest` must be ARRAY, got STRING"
        );
    }

    #[test]
    fn push_mutates_the_shared_array() {
        let array = ints(&[1]);
        let alias = array.clone();
        assert_eq!(call("push", vec![array, Object::Integer(2)]).unwrap(), Object::Null);
        assert_eq!(alias, ints(&[1, 2]));
        assert_eq!(
            call("push", vec![Object::Integer(1), Object::Integer(2)])
                .unwrap_err()
                .to_string(),
            "first argument to `push` must be ARRAY, got INTEGER"
        );
    }

    #[test]
    fn print_returns_null() {
        assert_eq!(call("print", vec![]).unwrap(), Object::Null);
        assert_eq!(
            call("print", vec![Object::String("a".into()), Object::Integer(1)]).unwrap(),
            Object::Null
        );
    }

    #[test]
    fn print_concatenates_without_separators() {
        let args = vec![
            Object::String("a b".into()),
            Object::Integer(1),
            Object::Boolean(true),
            ints(&[2, 3]),
        ];
        assert_eq!(print_line(&args), "a b1true[2, 3]\n");
        assert_eq!(print_line(&[]), "\n");
    }
}
