use std::ops::{Index, IndexMut};

use crate::runtime::value::Value;

/// System-wide frame capacity.
///
/// Every call site and every function body must respect it; a compiled body
/// needing more is a compiler-side error, a call site exceeding it is a
/// contract violation here.
pub const MAX_FRAME: usize = 8;

/// Fixed-capacity, caller-owned argument/result array.
///
/// The same slots carry arguments into a call and results out of it. A frame
/// never escapes a single call and has no lifetime of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    slots: [Value; MAX_FRAME],
}

impl Frame {
    /// Fresh frame, all slots nil.
    pub fn new() -> Frame {
        Frame::default()
    }

    /// Frame pre-loaded with arguments; remaining slots are nil.
    pub fn from_args(args: &[Value]) -> Frame {
        assert!(
            args.len() <= MAX_FRAME,
            "call site supplied {} arguments, frame capacity is {}",
            args.len(),
            MAX_FRAME
        );
        let mut frame = Frame::new();
        frame.slots[..args.len()].clone_from_slice(args);
        frame
    }

    pub fn get(&self, index: usize) -> &Value {
        &self.slots[index]
    }

    pub fn set(&mut self, index: usize, value: Value) {
        self.slots[index] = value;
    }

    /// Moves a value out of a slot, leaving nil behind so the slot cannot be
    /// released twice.
    pub fn take(&mut self, index: usize) -> Value {
        std::mem::take(&mut self.slots[index])
    }

    pub fn slots(&self) -> &[Value] {
        &self.slots
    }
}

impl Index<usize> for Frame {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.slots[index]
    }
}

impl IndexMut<usize> for Frame {
    fn index_mut(&mut self, index: usize) -> &mut Value {
        &mut self.slots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_new_frame_is_all_nil() {
        let frame = Frame::new();
        assert!(frame.slots().iter().all(|v| *v == Value::Nil));
    }

    #[test]
    fn test_from_args_fills_leading_slots() {
        let frame = Frame::from_args(&[Value::Int(1), Value::Bool(true)]);
        assert_eq!(frame[0], Value::Int(1));
        assert_eq!(frame[1], Value::Bool(true));
        assert_eq!(frame[2], Value::Nil);
    }

    #[test]
    fn test_take_releases_the_slot() {
        let list = Value::list(vec![Value::Int(1)]);
        let mut frame = Frame::from_args(&[list.clone()]);
        match &list {
            Value::List(l) => assert_eq!(Rc::strong_count(l), 2),
            _ => unreachable!(),
        }

        let taken = frame.take(0);
        assert_eq!(frame[0], Value::Nil);
        drop(taken);
        match &list {
            Value::List(l) => assert_eq!(Rc::strong_count(l), 1),
            _ => unreachable!(),
        }
    }

    #[test]
    #[should_panic(expected = "frame capacity")]
    fn test_overfull_call_site_is_a_contract_violation() {
        let args = vec![Value::Nil; MAX_FRAME + 1];
        let _ = Frame::from_args(&args);
    }
}
