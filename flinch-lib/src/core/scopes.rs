//! Scopes is the global mapping plus a stack of per-call mappings.
//!
//! A single scope is not owned by the stack. Every [`VariableRef`] holds its own handle to
//! the scope it was resolved in, so a reference that was taken inside a call stays usable
//! after that call returned and its scope was collapsed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::core::{Value, VariableRef};

/// A shared, mutable mapping from variable name to value
#[derive(Clone, Default)]
pub struct Scope(Rc<RefCell<HashMap<String, Value>>>);

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// creates the variable, or resets it if it already exists
    pub fn declare(&self, name: &str) {
        self.set(name, Value::Integer(0));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        // the replaced value is dropped after the borrow ended, it might hold the last
        // handle to some other scope
        let _old = self.0.borrow_mut().insert(name.to_owned(), value);
    }

    /// true if both handles point to the same mapping
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// all entries, sorted by name
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<_> = self
            .0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

// Values can point back into the scope that holds them, so only the names are printed
impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries();
        f.debug_set().entries(entries.iter().map(|(k, _)| k)).finish()
    }
}

/// The global scope, and one local scope for each active call
#[derive(Debug, Default)]
pub struct Scopes {
    global: Scope,
    /// the last one is the innermost
    locals: Vec<Scope>,
}

impl Scopes {
    /// open a new local scope
    pub fn open_new(&mut self) {
        self.locals.push(Scope::new());
    }

    /// remove the innermost local scope from the chain. Returns None at top level, the
    /// global scope is never collapsed
    pub fn collapse_innermost(&mut self) -> Option<Scope> {
        self.locals.pop()
    }

    pub fn global(&self) -> &Scope {
        &self.global
    }

    /// the innermost scope, which is the global one while nothing is called
    pub fn top(&self) -> &Scope {
        self.locals.last().unwrap_or(&self.global)
    }

    pub fn depth(&self) -> usize {
        self.locals.len()
    }

    /// `$name$` and `name$`: (re)declares name in the innermost scope
    pub fn declare(&self, name: &str) -> VariableRef {
        let top = self.top();
        top.declare(name);
        VariableRef::new(top.clone(), name)
    }

    /// `$name`: binds to the innermost scope if it has the name, and to the global scope
    /// otherwise. Whether the name exists globally is only checked when the reference is
    /// used
    pub fn resolve(&self, name: &str) -> VariableRef {
        let top = self.top();
        if top.contains(name) {
            VariableRef::new(top.clone(), name)
        } else {
            VariableRef::new(self.global.clone(), name)
        }
    }

    /// bare `name`: the current value, with the same lookup rules as [`Scopes::resolve`]
    pub fn read(&self, name: &str) -> Option<Value> {
        self.top().get(name).or_else(|| self.global.get(name))
    }
}
