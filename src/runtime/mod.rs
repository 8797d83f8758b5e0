//! Runtime core types for first-class functions.
//!
//! # Ownership Invariant
//! Rill runtime values are reference counted with `Rc`, so the value graph
//! must remain acyclic. Closures may capture values, but a closure that
//! transitively captures its own callable (a recursive function capturing
//! itself) must be attached through the weak-capture constructor
//! ([`callable::Callable::from_code_weak`]); a strong back-edge would make the
//! pair uncollectable.
//!
//! Code objects are immutable after construction and may be shared by any
//! number of callables. Mutation only ever happens inside a closure's own
//! captured values, which is the closure's concern, not this module's.
//!
//! Reference counts are not atomic; this core assumes a single logical thread
//! of control. A multi-threaded host would need atomic counting or per-thread
//! sharding first.
use crate::runtime::call::Step;
use crate::runtime::error::RuntimeError;
use crate::runtime::frame::Frame;
use crate::runtime::value::Value;

pub mod call;
pub mod callable;
pub mod code_object;
pub mod error;
pub mod frame;
pub mod leak_detector;
pub mod value;

/// Bare native function: reads its arguments from the frame and writes its
/// results back into the same slots.
pub type NativeFn = fn(&mut Frame) -> Result<Step, RuntimeError>;

/// Closure-extended native function: receives the callable's closure value
/// as an explicit first argument on every call.
pub type ScopedNativeFn = fn(Value, &mut Frame) -> Result<Step, RuntimeError>;
