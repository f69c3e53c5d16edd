//! Deals with run-time data representation
//!
//! There are exactly five kinds of values. Numbers are stored inline, functions and
//! variables are handles. A variable handle points at a scope instance rather than a
//! stack slot, see [`crate::core::scopes`].

use derive_more::{Display, From};

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::core::{FunctionDef, Scope};

#[derive(Debug, Clone, PartialEq, Display, From)]
pub enum Value {
    #[display(fmt = "{}", _0)]
    Integer(i64),
    // {:?} keeps the decimal point on integral floats
    #[display(fmt = "{:?}", _0)]
    Real(f64),
    #[display(fmt = "{}", _0)]
    Function(FunctionRef),
    #[display(fmt = "{}", _0)]
    Variable(VariableRef),
    #[display(fmt = "{}", _0)]
    Label(LabelRef),
}

/// A function as a first class value
#[derive(Debug, Clone, PartialEq, Display)]
#[display(fmt = "^{}", "_0.name")]
pub struct FunctionRef(pub Rc<FunctionDef>);

/// Points to one variable in one specific scope
#[derive(Clone, Display)]
#[display(fmt = "${}", name)]
pub struct VariableRef {
    scope: Scope,
    name: Rc<str>,
}

/// A jump target inside the function that was executing when the label was looked up
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = ":{}", name)]
pub struct LabelRef {
    pub name: Rc<str>,
    /// index of the `name:` token
    pub index: usize,
}

impl Value {
    /// name of the kind of value, used in error messages
    pub fn kind(&self) -> &'static str {
        use Value::*;
        match self {
            Integer(_) => "integer",
            Real(_) => "real",
            Function(_) => "function",
            Variable(_) => "variable reference",
            Label(_) => "label",
        }
    }

    /// zero is false, every other number and every reference is true
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Integer(i) => *i != 0,
            Real(x) => *x != 0.0,
            Function(_) | Variable(_) | Label(_) => true,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Integer(b as i64)
    }
}

impl Deref for FunctionRef {
    type Target = FunctionDef;
    fn deref(&self) -> &FunctionDef {
        &self.0
    }
}

impl VariableRef {
    pub fn new(scope: Scope, name: &str) -> Self {
        VariableRef {
            scope,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// None if the variable does not exist (yet) in the scope
    pub fn get(&self) -> Option<Value> {
        self.scope.get(&self.name)
    }

    pub fn set(&self, value: Value) {
        self.scope.set(&self.name, value);
    }
}

impl PartialEq for VariableRef {
    fn eq(&self, other: &Self) -> bool {
        self.scope.ptr_eq(&other.scope) && self.name == other.name
    }
}

// a scope can contain a reference to itself, so the scope is not printed
impl fmt::Debug for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VariableRef").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_display() {
        let f = FunctionRef(Rc::new(FunctionDef {
            name: "fact".into(),
            start: 0,
            len: 3,
            labels: HashMap::new(),
        }));
        let values: Vec<Value> = vec![
            5i64.into(),
            (-3.5f64).into(),
            2.0f64.into(),
            f.into(),
            VariableRef::new(Scope::new(), "x").into(),
            LabelRef {
                name: "loop".into(),
                index: 4,
            }
            .into(),
        ];
        let shown: Vec<_> = values.iter().map(|v| v.to_string()).collect();
        assert_eq!(shown, vec!["5", "-3.5", "2.0", "^fact", "$x", ":loop"]);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Integer(-1).is_truthy());
        assert!(!Value::Real(0.0).is_truthy());
        assert!(Value::Real(f64::NAN).is_truthy());
        assert!(Value::from(LabelRef {
            name: "l".into(),
            index: 0
        })
        .is_truthy());
        assert_eq!(Value::from(true), Value::Integer(1));
    }

    #[test]
    fn test_variable_ref_identity() {
        let a = Scope::new();
        let b = Scope::new();
        assert_eq!(VariableRef::new(a.clone(), "x"), VariableRef::new(a.clone(), "x"));
        assert_ne!(VariableRef::new(a.clone(), "x"), VariableRef::new(b, "x"));
        assert_ne!(VariableRef::new(a.clone(), "x"), VariableRef::new(a, "y"));
    }
}
