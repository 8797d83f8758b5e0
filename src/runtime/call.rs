use std::rc::Rc;

use crate::runtime::{
    callable::{Body, Builtin, Callable, CallableRef},
    code_object::CodeObject,
    error::RuntimeError,
    frame::{Frame, MAX_FRAME},
    value::Value,
};

/// Outcome of one dispatch step.
///
/// `Tail` tells the trampoline to re-enter dispatch with the given callable;
/// the arguments are already in the frame. The frame itself is reused in
/// place, so user-level tail recursion never grows the native stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Call completed; results are in the frame.
    Done,
    /// Re-enter dispatch with this callable and argument count.
    Tail(CallableRef, u8),
}

/// Interpreter seam for compiled bodies.
///
/// The engine executes a code object's bytecode against a register file it
/// allocates itself (sized to [`CodeObject::registers`]), reading arguments
/// from the frame and writing results back. A body ending in a tail call
/// must return [`Step::Tail`] instead of recursing.
pub trait Engine {
    fn exec(
        &mut self,
        code: &Rc<CodeObject>,
        scope: Value,
        frame: &mut Frame,
    ) -> Result<Step, RuntimeError>;
}

/// Engine for hosts that only ever call native functions.
pub struct NoEngine;

impl Engine for NoEngine {
    fn exec(
        &mut self,
        _code: &Rc<CodeObject>,
        _scope: Value,
        _frame: &mut Frame,
    ) -> Result<Step, RuntimeError> {
        Err(RuntimeError::msg("no bytecode engine attached"))
    }
}

/// Binds `argc` supplied arguments to a callee's parameters, in place.
///
/// Missing parameters read as nil. Excess arguments are dropped for
/// non-variadic callees; a variadic callee collects everything from its last
/// parameter onward into a list bound to that slot (an empty list when
/// nothing was supplied for it).
fn bind(arity: u8, variadic: bool, argc: u8, frame: &mut Frame) {
    let argc = argc as usize;
    let arity = arity as usize;
    assert!(argc <= MAX_FRAME, "argument count exceeds frame capacity");
    debug_assert!(arity <= MAX_FRAME);

    if variadic {
        let rest_slot = arity - 1;
        let mut rest = Vec::new();
        for i in rest_slot..argc {
            rest.push(frame.take(i));
        }
        for i in argc..rest_slot {
            frame.set(i, Value::Nil);
        }
        frame.set(rest_slot, Value::list(rest));
    } else {
        for i in argc.min(arity)..argc.max(arity) {
            frame.set(i, Value::Nil);
        }
    }
}

/// The trampoline: consumes tail continuations iteratively, never by native
/// recursion.
fn run_to_done(
    engine: &mut dyn Engine,
    mut step: Step,
    frame: &mut Frame,
) -> Result<(), RuntimeError> {
    while let Step::Tail(next, next_argc) = step {
        step = next.tcall(engine, next_argc, frame)?;
    }
    Ok(())
}

impl Builtin {
    /// One dispatch step for a static built-in; no engine involved.
    pub fn tcall(&self, argc: u8, frame: &mut Frame) -> Result<Step, RuntimeError> {
        bind(self.arity, self.variadic, argc, frame);
        (self.native.func)(frame)
    }
}

impl Callable {
    /// One dispatch step: binds arguments, then runs the body until it
    /// completes or reaches a tail call.
    ///
    /// Argument binding fully completes before any side effect of the callee
    /// is observed.
    pub fn tcall(
        &self,
        engine: &mut dyn Engine,
        argc: u8,
        frame: &mut Frame,
    ) -> Result<Step, RuntimeError> {
        bind(self.arity(), self.is_variadic(), argc, frame);
        match &self.body {
            Body::Native(native) => (native.func)(frame),
            Body::Scoped(scoped) => {
                let scope = self.closure.get()?;
                (scoped.func)(scope, frame)
            }
            Body::Code(code) => {
                let scope = self.closure.get()?;
                engine.exec(code, scope, frame)
            }
        }
    }

    /// Canonical call entry point: dispatch plus the trampoline loop.
    ///
    /// Results are visible in the frame only after this returns. Native call
    /// depth stays constant no matter how long the tail-call chain is.
    pub fn fcall(
        &self,
        engine: &mut dyn Engine,
        argc: u8,
        frame: &mut Frame,
    ) -> Result<(), RuntimeError> {
        let step = self.tcall(engine, argc, frame)?;
        run_to_done(engine, step, frame)
    }

    /// Convenience entry point for host code outside the interpreter's frame
    /// discipline: builds a frame from a slice, calls, and returns the first
    /// result. Remaining frame slots are released with the frame.
    pub fn vcall(
        &self,
        engine: &mut dyn Engine,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        let mut frame = Frame::from_args(args);
        self.fcall(engine, args.len() as u8, &mut frame)?;
        Ok(frame.take(0))
    }

    /// Iteration step: treats this callable as a generator.
    ///
    /// Runs one call; returns `true` with the produced item in slot 0, or
    /// `false` once the sequence is exhausted. All generator state lives in
    /// the closure, so a drained callable stays drained.
    pub fn next(
        &self,
        engine: &mut dyn Engine,
        argc: u8,
        frame: &mut Frame,
    ) -> Result<bool, RuntimeError> {
        self.fcall(engine, argc, frame)?;
        Ok(!matches!(frame.get(0), Value::Nil))
    }
}

impl CallableRef {
    /// One dispatch step through the handle; see [`Callable::tcall`].
    pub fn tcall(
        &self,
        engine: &mut dyn Engine,
        argc: u8,
        frame: &mut Frame,
    ) -> Result<Step, RuntimeError> {
        match self {
            CallableRef::Heap(c) => c.tcall(engine, argc, frame),
            CallableRef::Static(b) => b.tcall(argc, frame),
        }
    }

    /// Canonical call entry point; see [`Callable::fcall`].
    pub fn fcall(
        &self,
        engine: &mut dyn Engine,
        argc: u8,
        frame: &mut Frame,
    ) -> Result<(), RuntimeError> {
        let step = self.tcall(engine, argc, frame)?;
        run_to_done(engine, step, frame)
    }

    /// Host-side convenience call; see [`Callable::vcall`].
    pub fn vcall(
        &self,
        engine: &mut dyn Engine,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        let mut frame = Frame::from_args(args);
        self.fcall(engine, args.len() as u8, &mut frame)?;
        Ok(frame.take(0))
    }

    /// Iteration step; see [`Callable::next`].
    pub fn next(
        &self,
        engine: &mut dyn Engine,
        argc: u8,
        frame: &mut Frame,
    ) -> Result<bool, RuntimeError> {
        self.fcall(engine, argc, frame)?;
        Ok(!matches!(frame.get(0), Value::Nil))
    }
}
