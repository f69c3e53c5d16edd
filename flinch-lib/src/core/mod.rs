//! contains all important data structures

pub mod program;
pub use program::*;

pub mod value;
pub use value::*;

pub mod scopes;
pub use scopes::*;

pub mod form;
pub use form::*;
