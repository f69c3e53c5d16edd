//! The dispatch loop.
//!
//! There is no compile step. The runner looks at the token under the instruction pointer,
//! decides what it means from its text alone, executes it and moves on by one. Jumps and
//! calls set the pointer to the index of a marker token (`name:` or `name^`), so
//! execution continues right behind it.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::core::*;
use crate::vm::builtins;
use crate::vm::ops;
use crate::vm::{
    bail, nesting_err, type_mismatch, CallFrame, ControlStack, EvalStack, Fault, Result,
    RuntimeError,
};

/// Owns the program and all state that is needed to execute it
pub struct Runner {
    pub program: Rc<Program>,
    /// index of the token that is executed next
    pub ip: usize,
    pub stack: EvalStack,
    pub control: ControlStack,
    /// every function whose definition was scanned so far
    pub functions: HashMap<String, FunctionRef>,
    out: Box<dyn Write>,
}

pub enum StepResult {
    Ok,
    /// the end of the program was reached
    Done,
    Err(RuntimeError),
}

impl Runner {
    /// creates a runner that writes the output of builtins to stdout
    pub fn new(program: Program) -> Self {
        Self::with_output(program, Box::new(io::stdout()))
    }

    pub fn with_output(program: Program, out: Box<dyn Write>) -> Self {
        Runner {
            program: Rc::new(program),
            ip: 0,
            stack: EvalStack::default(),
            control: ControlStack::default(),
            functions: HashMap::new(),
            out,
        }
    }

    /// the token that is executed by the next call to [`Runner::step`]
    pub fn current_token(&self) -> &Token {
        self.program.token(self.ip)
    }

    /// executes tokens until the end of the program or the first fault
    pub fn run(&mut self) -> std::result::Result<(), RuntimeError> {
        loop {
            match self.step() {
                StepResult::Ok => {}
                StepResult::Done => return Ok(()),
                StepResult::Err(e) => return Err(e),
            }
        }
    }

    /// executes the current token and advances the instruction pointer
    pub fn step(&mut self) -> StepResult {
        let program = Rc::clone(&self.program);
        let index = self.ip;
        let token = program.token(index);
        if token.is_end() {
            return StepResult::Done;
        }
        trace!(index, line = token.line, token = %token.text, "dispatch");
        match self.exec(&token.text) {
            Ok(()) => {
                self.ip += 1;
                StepResult::Ok
            }
            Err(fault) => StepResult::Err(RuntimeError {
                line: token.line,
                index,
                token: token.text.clone(),
                fault,
            }),
        }
    }

    fn exec(&mut self, text: &str) -> Result<()> {
        match Form::of(text) {
            Form::FuncDef(name) => self.define(name)?,
            Form::FuncRef(name) => {
                let f = self
                    .functions
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Fault::UnknownFunction(name.into()))?;
                self.stack.push(f);
            }
            Form::DeclareRef(name) => {
                let var = self.control.scopes().declare(name);
                self.stack.push(var);
            }
            Form::Ref(name) => {
                let var = self.control.scopes().resolve(name);
                self.stack.push(var);
            }
            Form::Declare(name) => {
                self.control.scopes().declare(name);
            }
            Form::LabelRef(name) => {
                let label = self.label(name)?;
                self.stack.push(label);
            }
            Form::LabelDef(_) => {}
            Form::Keyword(kw) => self.exec_keyword(kw)?,
            Form::Operator(op) => {
                let b = self.stack.pop()?;
                let a = self.stack.pop()?;
                self.stack.push(ops::binary(op, &a, &b)?);
            }
            Form::Builtin(name) => builtins::call(name, &mut self.stack, self.out.as_mut())?,
            Form::Integer(i) => self.stack.push(i),
            Form::IntegerOutOfRange => bail!(Arithmetic("integer literal out of range")),
            Form::Real(x) => self.stack.push(x),
            Form::Read(name) => {
                let v = self
                    .control
                    .scopes()
                    .read(name)
                    .ok_or_else(|| Fault::UnknownVariable(name.into()))?;
                self.stack.push(v);
            }
            Form::Unresolved => bail!(UnresolvedToken(text.into())),
        }
        Ok(())
    }

    /// Scans the definition that starts at the current token up to its `^^` without
    /// executing anything, registers it and leaves the pointer on the `^^`.
    fn define(&mut self, name: &str) -> Result<()> {
        if !self.control.is_top_level() {
            return Err(nesting_err!(
                "function `{}` is defined while a call is active",
                name
            ));
        }
        let start = self.ip;
        let mut labels = HashMap::new();
        let mut i = start + 1;
        loop {
            let token = self.program.token(i);
            if token.is_end() {
                return Err(nesting_err!("function `{}` is never closed with `^^`", name));
            }
            if token.text == "^^" {
                break;
            }
            if let Some(label) = label_name(&token.text) {
                labels.insert(label.to_owned(), i);
            }
            i += 1;
        }
        debug!(function = name, start, end = i, labels = labels.len(), "defined");
        let def = FunctionDef {
            name: name.to_owned(),
            start,
            len: i - start,
            labels,
        };
        self.functions
            .insert(name.to_owned(), FunctionRef(Rc::new(def)));
        self.ip = i;
        Ok(())
    }

    fn label(&self, name: &str) -> Result<LabelRef> {
        let index = self
            .control
            .current_function()
            .and_then(|f| f.label(name))
            .ok_or_else(|| Fault::UnknownLabel(name.into()))?;
        Ok(LabelRef {
            name: name.into(),
            index,
        })
    }

    fn exec_keyword(&mut self, kw: Keyword) -> Result<()> {
        use Keyword::*;
        match kw {
            FuncEnd => {
                let frame = self.leave("^^")?;
                if frame.value_context {
                    self.stack.push(0i64);
                }
            }
            Return => {
                let frame = self.leave("return")?;
                let v = self.stack.pop()?;
                if frame.value_context {
                    self.stack.push(v);
                }
            }
            Call | CallEval => {
                let function = match self.stack.pop()? {
                    Value::Function(f) => f,
                    other => return Err(type_mismatch(kw.as_str(), "a function", &other)),
                };
                debug!(
                    function = %function.name,
                    depth = self.control.depth() + 1,
                    value_context = kw == CallEval,
                    "call"
                );
                let start = function.start;
                self.control.enter(CallFrame {
                    resume_at: self.ip,
                    value_context: kw == CallEval,
                    function,
                });
                self.ip = start;
            }
            Assign => {
                let var = self.pop_variable(kw)?;
                let v = self.stack.pop()?;
                var.set(v);
            }
            AddAssign => self.compound_assign(kw, Operator::Add)?,
            SubAssign => self.compound_assign(kw, Operator::Sub)?,
            MulAssign => self.compound_assign(kw, Operator::Mul)?,
            DivAssign => self.compound_assign(kw, Operator::Div)?,
            ModAssign => self.compound_assign(kw, Operator::Mod)?,
            Load => match self.stack.pop()? {
                Value::Variable(var) => {
                    let v = var
                        .get()
                        .ok_or_else(|| Fault::UnknownVariable(var.name().into()))?;
                    self.stack.push(v);
                }
                other => self.stack.push(other),
            },
            FrameOpen => self.stack.open_frame(),
            FrameClose => {
                self.stack.close_frame()?;
            }
            Goto => {
                let dest = self.pop_label(kw)?;
                self.ip = dest.index;
            }
            IfGoto => {
                let dest = self.pop_label(kw)?;
                if self.stack.pop()?.is_truthy() {
                    self.ip = dest.index;
                }
            }
            IncGotoUntil => {
                let dest = self.pop_label(kw)?;
                let limit = match self.stack.pop()? {
                    Value::Integer(i) => i,
                    other => return Err(type_mismatch(kw.as_str(), "an integer limit", &other)),
                };
                let var = self.pop_variable(kw)?;
                let counter = match var.get() {
                    Some(Value::Integer(i)) => i,
                    Some(other) => {
                        return Err(type_mismatch(kw.as_str(), "an integer counter", &other))
                    }
                    None => bail!(UnknownVariable(var.name().into())),
                };
                let counter = counter
                    .checked_add(1)
                    .ok_or(Fault::Arithmetic("integer overflow"))?;
                var.set(counter.into());
                if counter <= limit {
                    self.ip = dest.index;
                }
            }
        }
        Ok(())
    }

    /// `operand $var +=` and friends: applies `op` to the current value and the operand
    fn compound_assign(&mut self, kw: Keyword, op: Operator) -> Result<()> {
        let var = self.pop_variable(kw)?;
        let operand = self.stack.pop()?;
        let current = var
            .get()
            .ok_or_else(|| Fault::UnknownVariable(var.name().into()))?;
        var.set(ops::binary(op, &current, &operand)?);
        Ok(())
    }

    /// ends the current call and moves the pointer back to its call token
    fn leave(&mut self, token: &str) -> Result<CallFrame> {
        let frame = self
            .control
            .leave()
            .ok_or_else(|| nesting_err!("`{}` outside of a function", token))?;
        debug!(
            function = %frame.function.name,
            depth = self.control.depth(),
            "return"
        );
        self.ip = frame.resume_at;
        Ok(frame)
    }

    fn pop_variable(&mut self, kw: Keyword) -> Result<VariableRef> {
        match self.stack.pop()? {
            Value::Variable(var) => Ok(var),
            other => Err(type_mismatch(kw.as_str(), "a variable reference", &other)),
        }
    }

    fn pop_label(&mut self, kw: Keyword) -> Result<LabelRef> {
        match self.stack.pop()? {
            Value::Label(label) => Ok(label),
            other => Err(type_mismatch(kw.as_str(), "a label", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenize;
    use crate::vm::FaultKind;
    use std::cell::RefCell;

    #[derive(Clone, Default)]
    struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run(src: &str) -> Runner {
        let mut runner = Runner::new(tokenize(src).unwrap());
        if let Err(e) = runner.run() {
            panic!("{} failed: {}", src, e);
        }
        runner
    }

    fn result_of(src: &str) -> String {
        run(src).stack.base().to_string()
    }

    fn fault(src: &str) -> RuntimeError {
        let mut runner = Runner::new(tokenize(src).unwrap());
        runner.run().unwrap_err()
    }

    #[test]
    fn test_reverse_polish() {
        assert_eq!(result_of("1 2 + 3 * 10 4 - 2.5"), "[9, 6, 2.5]");
        assert_eq!(result_of("2 3 4 * + 1 -"), "[13]");
        assert_eq!(result_of(""), "[]");
    }

    #[test]
    fn test_special_reals_are_literals() {
        assert_eq!(result_of("inf -inf"), "[inf, -inf]");
        assert_eq!(result_of("nan"), "[NaN]");
        assert_eq!(result_of("1 inf <= nan nan =="), "[1, 0]");
    }

    #[test]
    fn test_integer_literal_out_of_range() {
        assert_eq!(result_of("9223372036854775807"), "[9223372036854775807]");
        let err = fault("1\n9223372036854775808");
        assert_eq!(err.kind(), FaultKind::Arithmetic);
        assert_eq!((err.line, err.index), (2, 1));
        assert!(err.to_string().ends_with("integer literal out of range"));
    }

    #[test]
    fn test_division_rules() {
        assert_eq!(result_of("7 2 / 7.0 2 / -7 2 %"), "[3, 3.5, 1]");
    }

    #[test]
    fn test_jump_lands_behind_label() {
        let src = "f^
                     :skip goto
                     111
                     skip: 222
                   ^^
                   ^f call";
        let runner = run(src);
        assert_eq!(runner.stack.base().to_string(), "[222]");
        let f = &runner.functions["f"];
        assert_eq!((f.start, f.len, f.end()), (0, 6, 6));
        assert_eq!(f.label("skip"), Some(4));
    }

    #[test]
    fn test_if_goto() {
        let src = |cond| format!("f^ {} :skip if_goto 111 skip: 222 ^^ ^f call", cond);
        assert_eq!(result_of(&src(0)), "[111, 222]");
        assert_eq!(result_of(&src(1)), "[222]");
    }

    #[test]
    fn test_call_and_call_eval() {
        assert_eq!(result_of("f^ ^^ ^f call"), "[]");
        assert_eq!(result_of("f^ ^^ ^f call_eval"), "[0]");
        assert_eq!(result_of("f^ 42 return ^^ ^f call"), "[]");
        assert_eq!(result_of("f^ 42 return ^^ ^f call_eval"), "[42]");
        // execution continues right after the call
        assert_eq!(result_of("f^ ^^ 1 ^f call_eval 2"), "[1, 0, 2]");
    }

    #[test]
    fn test_reference_escapes_its_call() {
        let src = "g$
                   f^
                     $x$ $g <-
                   ^^
                   ^f call
                   5 g <-
                   g ::";
        let runner = run(src);
        assert_eq!(runner.stack.base().to_string(), "[5]");
        assert!(runner.control.is_top_level());
        let Some(Value::Variable(escaped)) = runner.control.scopes().global().get("g") else {
            panic!("g should hold a reference");
        };
        assert_eq!(escaped.name(), "x");
        assert!(!escaped.scope().ptr_eq(runner.control.scopes().global()));
        assert_eq!(escaped.get(), Some(Value::Integer(5)));
    }

    #[test]
    fn test_each_call_gets_a_fresh_scope() {
        let src = "first$ second$
                   f^ $x$ return ^^
                   ^f call_eval $first <-
                   ^f call_eval $second <-
                   1 first <- 2 second <-
                   first :: second ::";
        assert_eq!(result_of(src), "[1, 2]");
    }

    #[test]
    fn test_locals_shadow_globals() {
        let src = "x$ 5 $x <-
                   f^ x$ 7 $x <- x return ^^
                   ^f call_eval x";
        assert_eq!(result_of(src), "[7, 5]");
    }

    #[test]
    fn test_functions_see_globals() {
        assert_eq!(result_of("y$ 3 $y <- f^ y 1 + $y <- ^^ ^f call y"), "[4]");
    }

    #[test]
    fn test_recursion() {
        let src = "fact^
                     n$ $n <-
                     n 1 <= :base if_goto
                     n n 1 - ^fact call_eval * return
                     base:
                     1 return
                   ^^
                   5 ^fact call_eval
                   10 ^fact call_eval";
        assert_eq!(result_of(src), "[120, 3628800]");
    }

    #[test]
    fn test_loop() {
        let src = "count^
                     i$
                     loop:
                       i 1 + $i <-
                       i 4 <= :loop if_goto
                     i return
                   ^^
                   ^count call_eval";
        assert_eq!(result_of(src), "[5]");
    }

    #[test]
    fn test_counted_loop_and_compound_assignment() {
        let src = "total$
                   sum^
                     i$
                     loop:
                       i $total +=
                     $i 10 :loop inc_goto_until
                   ^^
                   ^sum call total
                   3 $total *= 5 $total -= 4 $total /= 7 $total %= total";
        assert_eq!(result_of(src), "[55, 5]");
    }

    #[test]
    fn test_functions_are_values() {
        assert_eq!(result_of("f^ 9 return ^^ fn$ ^f $fn <- fn call_eval"), "[9]");
        let redefined = "f^ 1 return ^^
                         old$ ^f $old <-
                         f^ 2 return ^^
                         old call_eval ^f call_eval";
        assert_eq!(result_of(redefined), "[1, 2]");
    }

    #[test]
    fn test_frames() {
        assert_eq!(result_of("1 <<< 2 3 >>> 4"), "[1, 4]");
        assert_eq!(result_of("<<< <<< 1 >>> 2 >>> 3"), "[3]");
    }

    #[test]
    fn test_load_passes_non_references() {
        assert_eq!(result_of("4 :: x$ 6 $x <- $x ::"), "[4, 6]");
    }

    #[test]
    fn test_print() {
        let out = Captured::default();
        let program = tokenize("1 2 + !print 4.0 !print 7").unwrap();
        let mut runner = Runner::with_output(program, Box::new(out.clone()));
        runner.run().unwrap();
        assert_eq!(String::from_utf8(out.0.borrow().clone()).unwrap(), "3\n4.0\n");
        assert_eq!(runner.stack.base().to_string(), "[7]");
    }

    #[test]
    fn test_unknown_variable_reports_line() {
        let err = fault("1 2 +\n\nfoo");
        assert_eq!(err.kind(), FaultKind::UnknownVariable);
        assert_eq!(err.line, 3);
        assert_eq!(err.index, 3);
        assert_eq!(err.token, "foo");
        assert_eq!(err.to_string(), "line 3, token #3 `foo`: unknown variable `foo`");
    }

    #[test]
    fn test_fault_kinds() {
        use FaultKind::*;
        let cases = [
            ("^nope", UnknownFunction),
            ("1 call", TypeMismatch),
            ("5 7 <-", TypeMismatch),
            ("1 :: 2 goto", TypeMismatch),
            ("f^ ^^ ^f 1 +", TypeMismatch),
            ("+", StackUnderflow),
            ("1 <<< +", StackUnderflow),
            ("f^ return ^^ ^f call", StackUnderflow),
            ("return", MalformedNesting),
            ("^^", MalformedNesting),
            (">>>", MalformedNesting),
            ("f^ 1 2", MalformedNesting),
            ("f^ g^ ^^ ^f call", MalformedNesting),
            (":somewhere", UnknownLabel),
            ("f^ :nope goto ^^ ^f call", UnknownLabel),
            ("@@", UnresolvedToken),
            ("!nope", UnknownBuiltin),
            ("1 0 /", Arithmetic),
            ("$never ::", UnknownVariable),
            ("1 $never +=", UnknownVariable),
        ];
        for (src, kind) in cases {
            assert_eq!(fault(src).kind(), kind, "{}", src);
        }
    }

    #[test]
    fn test_unterminated_definition_reports_its_start() {
        let err = fault("1\nf^\n2 3");
        assert_eq!(err.kind(), FaultKind::MalformedNesting);
        assert_eq!((err.line, err.index), (2, 1));
    }

    #[test]
    fn test_step() {
        let mut runner = Runner::new(tokenize("1 2").unwrap());
        assert!(matches!(runner.step(), StepResult::Ok));
        assert_eq!(runner.current_token().text, "2");
        assert!(matches!(runner.step(), StepResult::Ok));
        assert!(runner.current_token().is_end());
        assert!(matches!(runner.step(), StepResult::Done));
        assert_eq!(runner.ip, 2);
    }
}
