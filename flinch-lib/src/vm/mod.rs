//! contains everything that is needed to execute a [`Program`](crate::core::Program)

use strum_macros::EnumDiscriminants;
use thiserror::Error;

use std::result::Result as StdResult;

pub mod builtins;
pub mod control;
pub mod ops;
pub mod runner;
pub mod stack;

pub use control::*;
pub use runner::*;
pub use stack::*;

/// Everything that can go wrong while a token is executed. Every fault ends the run.
#[derive(Error, Debug, EnumDiscriminants)]
#[strum_discriminants(name(FaultKind))]
pub enum Fault {
    #[error("unrecognized token `{0}`")]
    UnresolvedToken(String),

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("unknown label `{0}`")]
    UnknownLabel(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("`{op}` expected {expected}, found {found}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("tried to pop from an empty stack frame")]
    StackUnderflow,

    #[error("malformed nesting: {0}")]
    MalformedNesting(String),

    #[error("arithmetic error: {0}")]
    Arithmetic(&'static str),

    #[error("unknown builtin `!{0}`")]
    UnknownBuiltin(String),

    #[error("writing output failed: {0}")]
    Output(#[from] std::io::Error),
}

/// A fault, together with the position of the token that caused it
#[derive(Error, Debug)]
#[error("line {line}, token #{index} `{token}`: {fault}")]
pub struct RuntimeError {
    /// 1-based source line
    pub line: usize,
    pub index: usize,
    pub token: String,
    #[source]
    pub fault: Fault,
}

impl RuntimeError {
    pub fn kind(&self) -> FaultKind {
        FaultKind::from(&self.fault)
    }
}

pub type Result<T> = StdResult<T, Fault>;

macro_rules! bail {
    ($($err:tt)*) => {
        return Err($crate::vm::Fault::$($err)*)
    };
}
pub(crate) use bail;

macro_rules! nesting_err {
    ($msg:literal $(, $args:expr)*) => {
        $crate::vm::Fault::MalformedNesting(format!($msg $(, $args)*))
    };
}
pub(crate) use nesting_err;

/// builds a TypeMismatch for a value that some operation could not use
pub(crate) fn type_mismatch(
    op: &'static str,
    expected: &'static str,
    found: &crate::core::Value,
) -> Fault {
    Fault::TypeMismatch {
        op,
        expected,
        found: format!("{} {}", found.kind(), found),
    }
}
