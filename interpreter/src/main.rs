use anyhow::{Context, Result};
use clap::Parser;

use flinch_lib::parser;
use flinch_lib::vm::Runner;
use tracing::debug;

use std::path::PathBuf;

#[cfg(feature = "dev")]
mod debugger;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    script: PathBuf,

    #[cfg(feature = "dev")]
    #[arg(short = 't', long)]
    show_tokens: bool,

    #[cfg(feature = "dev")]
    #[arg(short = 'b', long)]
    debug: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let src = std::fs::read_to_string(&cli.script)
        .with_context(|| format!("could not read {}", cli.script.display()))?;
    let program = parser::tokenize(&src)?;
    debug!(script = %cli.script.display(), tokens = program.len(), "tokenized");

    #[cfg(feature = "dev")]
    if cli.show_tokens {
        for (i, token) in program.tokens().iter().enumerate() {
            println!("{:>5} {:>4}: {}", i, token.line, token.text);
        }
        return Ok(());
    }

    #[cfg(feature = "dev")]
    if cli.debug {
        use crossterm::{self as ct, terminal};
        let mut stdout = std::io::stdout();
        ct::execute!(stdout, terminal::EnterAlternateScreen)?;
        let res = debugger::run(Runner::new(program), &src, &mut stdout);
        ct::execute!(stdout, terminal::LeaveAlternateScreen)?;
        return res;
    }

    let mut runner = Runner::new(program);
    match runner.run() {
        Ok(()) => {
            println!("done!");
            println!("{}", runner.stack.base());
            Ok(())
        }
        Err(e) => {
            println!("error on line {}", e.line);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Installs a stderr subscriber, but only if `RUST_LOG` is set, e.g.
/// `RUST_LOG=flinch_lib=debug`
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}
