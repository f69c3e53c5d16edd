use std::io::{Stdout, Write};

use anyhow::{anyhow, bail, Result};
use crossterm::{self as ct, terminal};
use flinch_lib::vm::{Runner, StepResult};
use rustyline::{error::ReadlineError, DefaultEditor};

#[derive(PartialEq, Clone)]
enum UserCommand {
    Next,
    LastCommand,
    ShowStack,
    ShowScopes,
    ShowCalls,
    ShowFunctions,
    Quit,
}

pub fn run(mut runner: Runner, src: &str, stdout: &mut Stdout) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut last_cmd = None;

    use UserCommand::*;
    loop {
        render_state(stdout, &runner, src)?;
        stdout.flush()?;
        let mut cmd = read_line(&mut rl)?;
        if cmd == LastCommand {
            if let Some(last) = &last_cmd {
                cmd = last.clone();
            }
        }
        match &cmd {
            LastCommand => {
                // only reached if there was no last command, nothing to do then
            }
            Next => match runner.step() {
                StepResult::Ok => {}
                StepResult::Done => {
                    println!("done! {}", runner.stack.base());
                    return wait_for_exit(&mut rl);
                }
                StepResult::Err(e) => bail!("Runtime error: {}", e),
            },
            ShowStack => {
                for (i, frame) in runner.stack.iter().enumerate().rev() {
                    println!("{}: {}", i, frame);
                }
            }
            ShowScopes => {
                let scopes = runner.control.scopes();
                println!("global: {}", format_entries(&scopes.global().entries()));
                if scopes.depth() > 0 {
                    println!("local: {}", format_entries(&scopes.top().entries()));
                }
            }
            ShowCalls => {
                for (i, call) in runner.control.calls().iter().enumerate().rev() {
                    let kind = if call.value_context { "call_eval" } else { "call" };
                    println!("{}: ^{} via {} at #{}", i, call.function.name, kind, call.resume_at);
                }
            }
            ShowFunctions => {
                let mut names: Vec<_> = runner.functions.values().collect();
                names.sort_by_key(|f| f.start);
                for f in names {
                    println!("^{} #{}..#{} labels: {:?}", f.name, f.start, f.end(), f.labels);
                }
            }
            Quit => return Ok(()),
        }
        last_cmd = Some(cmd);
    }
}

fn format_entries(entries: &[(String, flinch_lib::core::Value)]) -> String {
    let inner: Vec<_> = entries.iter().map(|(k, v)| format!("{} = {}", k, v)).collect();
    format!("{{{}}}", inner.join(", "))
}

fn wait_for_exit(rl: &mut DefaultEditor) -> Result<()> {
    loop {
        if read_line(rl)? == UserCommand::Quit {
            return Ok(());
        }
        println!("the program has finished, q to quit");
    }
}

fn read_line(rl: &mut DefaultEditor) -> Result<UserCommand> {
    loop {
        let line = rl.readline("> ");
        use ReadlineError::*;
        match line {
            Ok(line) => match parse_line(&line) {
                Ok(cmd) => return Ok(cmd),
                Err(e) => eprintln!("Error: {}", e),
            },
            Err(Interrupted | Eof) => return Ok(UserCommand::Quit),
            Err(other) => return Err(other.into()),
        }
    }
}

fn parse_line(line: &str) -> Result<UserCommand> {
    use UserCommand::*;
    let elems: Vec<_> = line.split_whitespace().collect();
    match elems.as_slice() {
        [] => Ok(LastCommand),
        ["n" | "next"] => Ok(Next),
        ["q" | "quit"] => Ok(Quit),
        ["s" | "show", what] => parse_show(what),
        ["s" | "show"] => Err(anyhow!("show needs an argument")),
        _ => Err(anyhow!("Invalid Command")),
    }
}

fn parse_show(what: &str) -> Result<UserCommand> {
    Ok(match what {
        "s" | "stack" => UserCommand::ShowStack,
        "v" | "scopes" => UserCommand::ShowScopes,
        "c" | "calls" => UserCommand::ShowCalls,
        "f" | "functions" => UserCommand::ShowFunctions,
        _ => bail!("Invalid word after show"),
    })
}

struct Rect {
    w: u16,
    h: u16,
    x: u16,
    y: u16,
}

struct Rects {
    src: Rect,
    tokens: Rect,
    stack: Rect,
    scopes: Rect,
}

impl Rect {
    pub fn render(
        &self,
        stdout: &mut Stdout,
        lines: impl IntoIterator<Item = String>,
    ) -> Result<()> {
        let wu = self.w as usize;
        let mut lines = lines.into_iter();
        for i in 0..self.h {
            ct::queue!(stdout, ct::cursor::MoveTo(self.x, self.y + i))?;
            let line = lines.next().unwrap_or_default();
            let shown: String = line.chars().take(wu).collect();
            let pad = wu.saturating_sub(shown.chars().count());
            write!(stdout, "{}{}", shown, " ".repeat(pad))?;
        }
        Ok(())
    }
}

fn render_state(stdout: &mut Stdout, runner: &Runner, src: &str) -> Result<()> {
    let curr_cursor = ct::cursor::position()?;
    let rects = compute_rects(terminal::size()?);
    render_src(stdout, &rects.src, src, runner.current_token().line)?;
    render_tokens(stdout, &rects.tokens, runner)?;
    render_stack(stdout, &rects.stack, runner)?;
    render_scopes(stdout, &rects.scopes, runner)?;
    ct::queue!(stdout, ct::cursor::MoveTo(curr_cursor.0, curr_cursor.1))?;
    Ok(())
}

/// the source, scrolled so the current line stays visible and marked
fn render_src(stdout: &mut Stdout, rect: &Rect, src: &str, line: usize) -> Result<()> {
    let skip = line.saturating_sub(rect.h as usize / 2 + 1);
    let lines = src.lines().enumerate().skip(skip).map(|(i, text)| {
        let marker = if i + 1 == line { '>' } else { ' ' };
        format!("{}{:>4} {}", marker, i + 1, text)
    });
    rect.render(stdout, lines)
}

fn render_tokens(stdout: &mut Stdout, rect: &Rect, runner: &Runner) -> Result<()> {
    let lines = runner
        .program
        .tokens()
        .iter()
        .enumerate()
        .skip(runner.ip)
        .map(|(i, token)| format!("{}: {}", i, token.text));
    let header = format!("depth {}", runner.control.depth());
    rect.render(stdout, std::iter::once(header).chain(lines))
}

fn render_stack(stdout: &mut Stdout, rect: &Rect, runner: &Runner) -> Result<()> {
    let values: Vec<_> = runner
        .stack
        .iter()
        .enumerate()
        .flat_map(|(f, frame)| {
            std::iter::once(format!("--- frame {}", f))
                .chain(frame.iter().map(|v| format!("  {}", v)))
        })
        .collect();
    let padding = (rect.h as usize).saturating_sub(values.len());
    let shown = values.len().min(rect.h as usize);
    let lines = std::iter::repeat(String::new())
        .take(padding)
        .chain(values[values.len() - shown..].iter().cloned());
    rect.render(stdout, lines)
}

fn render_scopes(stdout: &mut Stdout, rect: &Rect, runner: &Runner) -> Result<()> {
    let scopes = runner.control.scopes();
    let mut lines = vec!["Scope:".to_string()];
    lines.extend(
        scopes
            .top()
            .entries()
            .into_iter()
            .map(|(k, v)| format!("{} = {}", k, v)),
    );
    rect.render(stdout, lines)
}

fn compute_rects((term_w, term_h): (u16, u16)) -> Rects {
    let width14 = term_w / 4;
    let width12 = term_w / 2;
    let width34 = term_w * 3 / 4;
    let height45 = term_h * 4 / 5;
    let height12 = term_h / 2;

    Rects {
        src: Rect {
            x: 0,
            y: 0,
            w: width12,
            h: height45,
        },
        tokens: Rect {
            x: width12,
            y: 0,
            w: width14,
            h: height45,
        },
        stack: Rect {
            x: width34,
            y: 0,
            w: width14,
            h: height12,
        },
        scopes: Rect {
            x: width34,
            y: height12,
            w: width14,
            h: height45 - height12,
        },
    }
}
