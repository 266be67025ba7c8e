use crate::types::Object;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSymbol(pub String);

/// One scope of name bindings, chained to the scope it was created in.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: RefCell<FxHashMap<String, Object>>,
    outer: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn spawn_from(outer: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(FxHashMap::default()),
            outer: Some(outer.clone()),
        })
    }

    /// Binds `key` in this scope, shadowing any outer binding of the same name.
    pub fn set<T>(&self, key: T, value: Object) -> Option<Object>
    where
        T: Into<String>,
    {
        self.bindings.borrow_mut().insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<Object> {
        match self.bindings.borrow().get(key) {
            Some(value) => Some(value.clone()),
            None => self.outer.as_ref().and_then(|outer| outer.get(key)),
        }
    }

    pub fn fetch(&self, key: &str) -> Result<Object, UnknownSymbol> {
        self.get(key).ok_or_else(|| UnknownSymbol(key.to_string()))
    }

    /// Overwrites the nearest existing binding of `key`, walking outwards.
    pub fn assign(&self, key: &str, value: Object) -> Result<(), UnknownSymbol> {
        let mut bindings = self.bindings.borrow_mut();
        match bindings.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => match &self.outer {
                Some(outer) => outer.assign(key, value),
                None => Err(UnknownSymbol(key.to_string())),
            },
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.bindings.borrow().contains_key(key)
            || self.outer.as_ref().map_or(false, |outer| outer.contains(key))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.bindings.borrow().keys().sorted().join(", "))?;
        if let Some(outer) = &self.outer {
            write!(f, " -> {}", outer)?;
        }
        Ok(())
    }
}
