//! Shared fixtures: a minimal bytecode engine driving the call protocol.
//!
//! The real interpreter is out of scope for the runtime core, so these tests
//! use a one-opcode-per-body engine. Each body's first bytecode byte selects
//! its behavior; the engine still allocates a register file per the code
//! object's sizing, moves arguments in, and reports tail calls through
//! [`Step::Tail`] instead of recursing.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use rill::runtime::call::{Engine, Step};
use rill::runtime::code_object::CodeObject;
use rill::runtime::error::RuntimeError;
use rill::runtime::frame::Frame;
use rill::runtime::value::Value;

/// `frame[0] = constants[0]`
pub const OP_CONST0: u8 = 0;
/// Countdown: with `n` in slot 0, finish with 0 or tail-call `scope[0]`
/// with `n - 1`.
pub const OP_COUNTDOWN: u8 = 1;
/// Accumulate: `scope[0] += frame[0]`, result is the running total.
pub const OP_ACCUMULATE: u8 = 2;

pub struct TestEngine;

impl Engine for TestEngine {
    fn exec(
        &mut self,
        code: &Rc<CodeObject>,
        scope: Value,
        frame: &mut Frame,
    ) -> Result<Step, RuntimeError> {
        let mut regs = vec![Value::Nil; code.registers() as usize];
        for i in 0..code.arity() as usize {
            regs[i] = frame.take(i);
        }

        match code.bytecode().first().copied() {
            Some(OP_CONST0) => {
                frame.set(0, code.constants()[0].clone());
                Ok(Step::Done)
            }
            Some(OP_COUNTDOWN) => {
                let n = as_int(&regs[0])?;
                if n == 0 {
                    frame.set(0, Value::Int(0));
                    Ok(Step::Done)
                } else {
                    let callee = {
                        let cells = as_list(&scope)?;
                        let cells = cells.borrow();
                        cells[0].as_callable()?
                    };
                    frame.set(0, Value::Int(n - 1));
                    Ok(Step::Tail(callee, 1))
                }
            }
            Some(OP_ACCUMULATE) => {
                let n = as_int(&regs[0])?;
                let cells = as_list(&scope)?;
                let total = as_int(&cells.borrow()[0])? + n;
                cells.borrow_mut()[0] = Value::Int(total);
                frame.set(0, Value::Int(total));
                Ok(Step::Done)
            }
            other => Err(RuntimeError::msg(format!("unknown opcode: {:?}", other))),
        }
    }
}

pub fn as_int(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(RuntimeError::msg(format!(
            "expected Int, got {}",
            other.type_name()
        ))),
    }
}

pub fn as_list(value: &Value) -> Result<Rc<RefCell<Vec<Value>>>, RuntimeError> {
    match value {
        Value::List(l) => Ok(l.clone()),
        other => Err(RuntimeError::msg(format!(
            "expected List, got {}",
            other.type_name()
        ))),
    }
}
