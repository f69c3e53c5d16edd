use crate::core::Value;
use crate::vm::{nesting_err, Fault, Result};

use std::fmt;
use std::ops::{Deref, DerefMut};

/// One value stack
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame(pub Vec<Value>);

/// The stack of frames that all values are pushed to. Only the top frame is ever
/// touched by push and pop, `<<<` and `>>>` open and discard whole frames.
#[derive(Debug)]
pub struct EvalStack(Vec<Frame>);

impl Default for EvalStack {
    fn default() -> Self {
        EvalStack(vec![Frame::default()])
    }
}

impl EvalStack {
    pub fn push(&mut self, v: impl Into<Value>) {
        self.top_mut().push(v.into());
    }

    pub fn pop(&mut self) -> Result<Value> {
        self.top_mut().pop().ok_or(Fault::StackUnderflow)
    }

    /// `<<<`
    pub fn open_frame(&mut self) {
        self.0.push(Frame::default());
    }

    /// `>>>`, whatever is left in the frame is dropped
    pub fn close_frame(&mut self) -> Result<Frame> {
        if self.0.len() == 1 {
            return Err(nesting_err!("`>>>` without a matching `<<<`"));
        }
        Ok(self.0.pop().unwrap_or_default())
    }

    /// the frame that exists from the start, what the script leaves here is its result
    pub fn base(&self) -> &Frame {
        &self.0[0]
    }

    pub fn top(&self) -> &Frame {
        self.0.last().unwrap_or(&self.0[0])
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.0.len() - 1;
        &mut self.0[last]
    }
}

impl Deref for EvalStack {
    type Target = Vec<Frame>;
    fn deref(&self) -> &Vec<Frame> {
        &self.0
    }
}

impl Deref for Frame {
    type Target = Vec<Value>;
    fn deref(&self) -> &Vec<Value> {
        &self.0
    }
}

impl DerefMut for Frame {
    fn deref_mut(&mut self) -> &mut Vec<Value> {
        &mut self.0
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::FaultKind;

    #[test]
    fn test_frames_are_isolated() {
        let mut stack = EvalStack::default();
        stack.push(1i64);
        stack.open_frame();
        assert!(stack.top().is_empty());
        stack.push(2i64);
        stack.push(3i64);
        assert_eq!(stack.pop().unwrap(), Value::Integer(3));
        let discarded = stack.close_frame().unwrap();
        assert_eq!(discarded.0, vec![Value::Integer(2)]);
        assert_eq!(stack.base().0, vec![Value::Integer(1)]);
    }

    #[test]
    fn test_pop_does_not_reach_into_lower_frame() {
        let mut stack = EvalStack::default();
        stack.push(1i64);
        stack.open_frame();
        let err = stack.pop().unwrap_err();
        assert_eq!(FaultKind::from(&err), FaultKind::StackUnderflow);
    }

    #[test]
    fn test_base_frame_cannot_be_closed() {
        let mut stack = EvalStack::default();
        let err = stack.close_frame().unwrap_err();
        assert_eq!(FaultKind::from(&err), FaultKind::MalformedNesting);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_display() {
        let mut stack = EvalStack::default();
        assert_eq!(stack.base().to_string(), "[]");
        stack.push(1i64);
        stack.push(3.5f64);
        assert_eq!(stack.base().to_string(), "[1, 3.5]");
    }
}
