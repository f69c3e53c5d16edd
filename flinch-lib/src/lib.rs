//! What you need to do to execute a script:
//! 1. load a source file into a string.
//! 1. split it into tokens using [`parser::tokenize`]. There is no further compilation,
//!    the token sequence is executed as it is.
//! 1. create a [`vm::Runner`] from the resulting [`core::Program`]
//! 1. either call [`vm::Runner::run`], or drive the loop yourself with
//!    [`vm::Runner::step`] and add error handling:
//!
//!    ```
//!    use flinch_lib::{parser, vm};
//!
//!    let program = parser::tokenize("1 2 + 3 *").unwrap();
//!    let mut runner = vm::Runner::new(program);
//!    loop {
//!        match runner.step() {
//!            vm::StepResult::Ok => {}
//!            vm::StepResult::Done => break,
//!            vm::StepResult::Err(e) => panic!("{}", e),
//!        }
//!    }
//!    assert_eq!(runner.stack.base().to_string(), "[9]");
//!    ```
//!
//! After a successful run, the base frame of [`vm::Runner::stack`] holds whatever the
//! script left behind.
pub mod core;
pub mod parser;
pub mod vm;
