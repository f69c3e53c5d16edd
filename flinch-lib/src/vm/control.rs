use crate::core::{FunctionRef, Scopes};

/// what is remembered about a call until it returns
#[derive(Debug, Clone)]
pub struct CallFrame {
    /// the index of the call token. Execution continues after it.
    pub resume_at: usize,
    /// true for `call_eval`, whose caller expects a value back
    pub value_context: bool,
    /// the executing function, labels are resolved in it
    pub function: FunctionRef,
}

/// The call stack and the scope chain.
///
/// Each call pushes a frame and opens a local scope, each return pops both. They are only
/// ever changed together through [`ControlStack::enter`] and [`ControlStack::leave`], so
/// their depth is always the same.
#[derive(Debug, Default)]
pub struct ControlStack {
    calls: Vec<CallFrame>,
    scopes: Scopes,
}

impl ControlStack {
    pub fn enter(&mut self, frame: CallFrame) {
        self.calls.push(frame);
        self.scopes.open_new();
    }

    /// None if there is no active call
    pub fn leave(&mut self) -> Option<CallFrame> {
        let frame = self.calls.pop()?;
        self.scopes.collapse_innermost();
        debug_assert_eq!(self.calls.len(), self.scopes.depth());
        Some(frame)
    }

    /// 0 while executing at top level
    pub fn depth(&self) -> usize {
        self.calls.len()
    }

    pub fn is_top_level(&self) -> bool {
        self.calls.is_empty()
    }

    /// the function that is currently executing
    pub fn current_function(&self) -> Option<&FunctionRef> {
        self.calls.last().map(|c| &c.function)
    }

    pub fn calls(&self) -> &[CallFrame] {
        &self.calls
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }
}
