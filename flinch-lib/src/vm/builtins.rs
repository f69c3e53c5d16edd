//! Builtins are invoked with `!name` and work on the top frame directly

use std::io::Write;

use crate::vm::{bail, EvalStack, Result};

pub fn call(name: &str, stack: &mut EvalStack, out: &mut dyn Write) -> Result<()> {
    match name {
        "print" => print(stack, out),
        _ => bail!(UnknownBuiltin(name.into())),
    }
}

/// pops one value and writes it on its own line
fn print(stack: &mut EvalStack, out: &mut dyn Write) -> Result<()> {
    let v = stack.pop()?;
    writeln!(out, "{}", v)?;
    Ok(())
}
