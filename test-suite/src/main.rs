//! Runs every `tests/*.fl` script with the release build of `flinch` and compares its
//! stdout with `tests/<name>.out`. Has to be started from the test-suite directory.

use anyhow::{anyhow, Context, Result};
use glob::glob;
use std::result::Result as StdResult;

use std::fs;
use std::path::Path;
use std::process::Command;

const INTERPRETER: &str = "../target/release/flinch";

fn main() -> Result<()> {
    compile_flinch().context("compiling interpreter")?;

    let scripts: Vec<_> = glob("tests/*.fl")?.collect::<StdResult<_, _>>()?;
    let mut failed = 0;
    for script in &scripts {
        let expected_path = script.with_extension("out");
        let expected_output = fs::read_to_string(&expected_path)
            .with_context(|| format!("loading expected output: {}", expected_path.display()))?;
        let output = run_script(script)?;
        if output == expected_output {
            println!("{}: passed", script.display());
        } else {
            failed += 1;
            println!("{}: failed\nactual output:\n{}", script.display(), output);
        }
    }
    println!("{} of {} scripts passed", scripts.len() - failed, scripts.len());
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn run_script(script: &Path) -> Result<String> {
    let output_bytes = Command::new(INTERPRETER)
        .arg(script)
        .output()
        .with_context(|| format!("running script {}", script.display()))?
        .stdout;
    Ok(String::from_utf8(output_bytes)?)
}

fn compile_flinch() -> Result<()> {
    let st = Command::new("cargo")
        .args(["build", "--release", "-p", "flinch"])
        .current_dir("..")
        .status()?;
    if st.success() {
        Ok(())
    } else {
        Err(anyhow!("compiling the interpreter failed"))
    }
}
