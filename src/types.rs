use crate::ast::{BlockStatement, Expression, Identifier};
use crate::environment::Environment;
use crate::evaluator;
use derive_more::{Deref, DerefMut};
use indexmap::IndexMap;
use itertools::Itertools;
use rustc_hash::FxHasher;
use std::cell::RefCell;
use std::fmt;
use std::hash::Hasher;
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

pub type MonkeyInt = i64;

#[derive(Deref, DerefMut, Debug, Default)]
pub struct MonkeyArray(pub RefCell<Vec<Object>>);

#[derive(Deref, DerefMut, Debug, Default)]
pub struct MonkeyHash(pub IndexMap<HashKey, HashPair>);

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKind {
    Integer,
    Boolean,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: HashKind,
    pub value: u64,
}

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug)]
pub struct BadArgCount {
    pub name: String,
    pub expected: Arity,
    pub got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrong number of arguments. got={}, want={}",
            self.got, self.expected
        )
    }
}

impl Arity {
    pub(crate) const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub(crate) const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name: name.to_string(),
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "{}", r.start())
                } else {
                    write!(f, "{}..{}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "{}+", r.start),
        }
    }
}

pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: fn(&[Object]) -> evaluator::Result,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "builtin function #<{}>", self.name)
    }
}

/// A function or macro body together with the environment it closes over.
#[derive(Clone)]
pub struct Closure {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: Rc<Environment>,
}

impl Closure {
    pub fn arity(&self) -> Arity {
        Arity::exactly(self.parameters.len())
    }
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the env: the env may well contain this Closure!
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{parameters: {:?}, body: {:?}}}",
            self.parameters, self.body
        )
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", self.parameters.iter().join(", "), self.body)
    }
}

#[derive(Debug, Clone)]
pub enum Object {
    Integer(MonkeyInt),
    Boolean(bool),
    String(String),
    Null,
    ReturnValue(Box<Object>),
    Error(String),
    Array(Rc<MonkeyArray>),
    Hash(Rc<MonkeyHash>),
    Function(Rc<Closure>),
    Macro(Rc<Closure>),
    Builtin(&'static Builtin),
    Quote(Rc<Expression>),
}

pub(crate) fn truthy(obj: &Object) -> bool {
    use Object::*;
    match obj {
        Boolean(b) => *b,
        Null => false,
        Integer(n) => *n != 0,
        String(_) | ReturnValue(_) | Error(_) | Array(_) | Hash(_) | Function(_) | Macro(_)
        | Builtin(_) | Quote(_) => true,
    }
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        use Object::*;
        match self {
            Integer(_) => "INTEGER",
            Boolean(_) => "BOOLEAN",
            String(_) => "STRING",
            Null => "NULL",
            ReturnValue(_) => "RETURN_VALUE",
            Error(_) => "ERROR",
            Array(_) => "ARRAY",
            Hash(_) => "HASH",
            Function(_) => "FUNCTION",
            Macro(_) => "MACRO",
            Builtin(_) => "BUILTIN",
            Quote(_) => "QUOTE",
        }
    }

    /// The key this object is stored under in a hash, or `None` when its
    /// type cannot be hashed.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(n) => Some(HashKey {
                kind: HashKind::Integer,
                value: *n as u64,
            }),
            Object::Boolean(b) => Some(HashKey {
                kind: HashKind::Boolean,
                value: *b as u64,
            }),
            Object::String(s) => {
                let mut hasher = FxHasher::default();
                hasher.write(s.as_bytes());
                Some(HashKey {
                    kind: HashKind::String,
                    value: hasher.finish(),
                })
            }
            _ => None,
        }
    }

    pub(crate) fn wrap_array(elements: Vec<Object>) -> Self {
        Self::Array(Rc::new(MonkeyArray(RefCell::new(elements))))
    }

    pub(crate) fn wrap_hash(pairs: IndexMap<HashKey, HashPair>) -> Self {
        Self::Hash(Rc::new(MonkeyHash(pairs)))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        use Object::*;
        match (self, other) {
            (Integer(x), Integer(y)) => x == y,
            (Boolean(x), Boolean(y)) => x == y,
            (String(x), String(y)) => x == y,
            (Null, Null) => true,
            (ReturnValue(x), ReturnValue(y)) => x == y,
            (Error(x), Error(y)) => x == y,
            (Array(x), Array(y)) => Rc::ptr_eq(x, y) || *x.borrow() == *y.borrow(),
            (Hash(x), Hash(y)) => x.0 == y.0,
            (Function(x), Function(y)) | (Macro(x), Macro(y)) => Rc::ptr_eq(x, y),
            (Builtin(x), Builtin(y)) => x.name == y.name,
            (Quote(x), Quote(y)) => x == y,
            (_, _) => false,
        }
    }
}
