use std::fmt;
use std::rc::Rc;

use crate::runtime::{
    NativeFn, ScopedNativeFn,
    code_object::CodeObject,
    error::RuntimeError,
    leak_detector,
    value::{Value, WeakValue},
};

/// Named bare native function.
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Named closure-extended native function.
#[derive(Clone, Copy)]
pub struct ScopedNativeFunction {
    pub name: &'static str,
    pub func: ScopedNativeFn,
}

impl fmt::Debug for ScopedNativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopedNativeFunction({})", self.name)
    }
}

impl PartialEq for ScopedNativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Statically allocatable built-in: a bare native function plus its calling
/// convention.
///
/// Built-ins live in `static`s and are wrapped in [`CallableRef::Static`];
/// cloning and dropping such a reference are no-ops with respect to memory
/// lifetime, so the instance is immortal by construction rather than by a
/// pinned reference count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Builtin {
    pub arity: u8,
    pub variadic: bool,
    pub native: NativeFunction,
}

impl Builtin {
    pub const fn new(name: &'static str, arity: u8, func: NativeFn) -> Builtin {
        Builtin {
            arity,
            variadic: false,
            native: NativeFunction { name, func },
        }
    }

    /// Opts this built-in into variadic calling.
    pub const fn variadic(mut self) -> Builtin {
        assert!(self.arity >= 1, "variadic callable needs a rest parameter");
        self.variadic = true;
        self
    }
}

/// The one body representation a callable holds, fixed at construction.
///
/// Dispatch over this enum is exhaustive; there is no runtime morphing
/// between variants.
#[derive(Debug, Clone)]
pub enum Body {
    /// Bare native function.
    Native(NativeFunction),
    /// Native function receiving the closure as its first argument.
    Scoped(ScopedNativeFunction),
    /// Compiled body executed by the host interpreter.
    Code(Rc<CodeObject>),
}

/// How a callable holds its captured environment.
#[derive(Debug, Clone)]
pub enum ClosureSlot {
    /// No closure attached.
    None,
    /// Owned capture; released when the callable is.
    Strong(Value),
    /// Weak capture for closures that transitively contain this very
    /// callable. The closure's reachability does not depend on us, so no
    /// reference cycle forms.
    Weak(WeakValue),
}

impl ClosureSlot {
    /// Resolves the captured value for a call.
    ///
    /// An absent closure reads as `Nil`; a dead weak capture is a checked
    /// runtime error, never a dangling access.
    pub fn get(&self) -> Result<Value, RuntimeError> {
        match self {
            ClosureSlot::None => Ok(Value::Nil),
            ClosureSlot::Strong(v) => Ok(v.clone()),
            ClosureSlot::Weak(w) => w.upgrade().ok_or(RuntimeError::ClosureGone),
        }
    }
}

/// First-class function value: one calling interface over native and
/// compiled bodies.
#[derive(Debug, Clone)]
pub struct Callable {
    arity: u8,
    variadic: bool,
    pub(crate) body: Body,
    pub(crate) closure: ClosureSlot,
}

impl Callable {
    /// Bare native function, no closure.
    pub fn from_native(arity: u8, native: NativeFunction) -> Callable {
        leak_detector::record_callable();
        Callable {
            arity,
            variadic: false,
            body: Body::Native(native),
            closure: ClosureSlot::None,
        }
    }

    /// Native function paired with a strongly captured closure.
    pub fn from_scoped(arity: u8, scoped: ScopedNativeFunction, closure: Value) -> Callable {
        leak_detector::record_callable();
        Callable {
            arity,
            variadic: false,
            body: Body::Scoped(scoped),
            closure: ClosureSlot::Strong(closure),
        }
    }

    /// Compiled function with a strongly captured closure.
    ///
    /// Arity comes from the code object. A `Nil` closure means no capture.
    pub fn from_code(code: Rc<CodeObject>, closure: Value) -> Callable {
        leak_detector::record_callable();
        let arity = code.arity();
        Callable {
            arity,
            variadic: false,
            body: Body::Code(code),
            closure: match closure {
                Value::Nil => ClosureSlot::None,
                v => ClosureSlot::Strong(v),
            },
        }
    }

    /// Compiled function with a weakly captured closure.
    ///
    /// Required when the closure transitively contains this callable (a
    /// recursive function capturing itself); a strong capture would be an
    /// uncollectable cycle under reference counting.
    pub fn from_code_weak(code: Rc<CodeObject>, closure: &Value) -> Callable {
        leak_detector::record_callable();
        let arity = code.arity();
        Callable {
            arity,
            variadic: false,
            body: Body::Code(code),
            closure: ClosureSlot::Weak(closure.downgrade()),
        }
    }

    /// Opts this callable into variadic calling: excess arguments are packed
    /// into a list bound to the last parameter slot.
    pub fn variadic(mut self) -> Callable {
        assert!(self.arity >= 1, "variadic callable needs a rest parameter");
        self.variadic = true;
        self
    }

    /// Declared parameter count.
    pub fn arity(&self) -> u8 {
        self.arity
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// The compiled body, if this is a compiled callable.
    pub fn code(&self) -> Option<Rc<CodeObject>> {
        match &self.body {
            Body::Code(c) => Some(c.clone()),
            _ => None,
        }
    }

    /// The captured closure value; see [`ClosureSlot::get`].
    pub fn closure(&self) -> Result<Value, RuntimeError> {
        self.closure.get()
    }

    /// Runtime type label: `Builtin` for natives, `Closure` for compiled
    /// callables with a capture, `Function` otherwise.
    pub fn type_name(&self) -> &'static str {
        match &self.body {
            Body::Native(_) | Body::Scoped(_) => "Builtin",
            Body::Code(_) => match &self.closure {
                ClosureSlot::None => "Function",
                _ => "Closure",
            },
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            Body::Native(n) => write!(f, "<builtin {}>", n.name),
            Body::Scoped(n) => write!(f, "<builtin {}>", n.name),
            Body::Code(_) => match &self.closure {
                ClosureSlot::None => write!(f, "<function>"),
                _ => write!(f, "<closure>"),
            },
        }
    }
}

/// Ownership handle for callables.
///
/// `Heap` is the ordinary counted reference. `Static` points at a statically
/// allocated [`Builtin`], exempt from reference-count-driven destruction: no
/// amount of clone/drop churn can free or corrupt it.
#[derive(Debug, Clone)]
pub enum CallableRef {
    Heap(Rc<Callable>),
    Static(&'static Builtin),
}

impl CallableRef {
    pub fn arity(&self) -> u8 {
        match self {
            CallableRef::Heap(c) => c.arity(),
            CallableRef::Static(b) => b.arity,
        }
    }

    pub fn is_variadic(&self) -> bool {
        match self {
            CallableRef::Heap(c) => c.is_variadic(),
            CallableRef::Static(b) => b.variadic,
        }
    }

    pub fn code(&self) -> Option<Rc<CodeObject>> {
        match self {
            CallableRef::Heap(c) => c.code(),
            CallableRef::Static(_) => None,
        }
    }

    pub fn closure(&self) -> Result<Value, RuntimeError> {
        match self {
            CallableRef::Heap(c) => c.closure(),
            CallableRef::Static(_) => Ok(Value::Nil),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CallableRef::Heap(c) => c.type_name(),
            CallableRef::Static(_) => "Builtin",
        }
    }
}

impl fmt::Display for CallableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallableRef::Heap(c) => c.fmt(f),
            CallableRef::Static(b) => write!(f, "<builtin {}>", b.native.name),
        }
    }
}

/// Callables compare by identity, not structure.
impl PartialEq for CallableRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CallableRef::Heap(a), CallableRef::Heap(b)) => Rc::ptr_eq(a, b),
            (CallableRef::Static(a), CallableRef::Static(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{call::Step, frame::Frame};

    fn noop(_frame: &mut Frame) -> Result<Step, RuntimeError> {
        Ok(Step::Done)
    }

    static NOOP: Builtin = Builtin::new("noop", 0, noop);

    fn leaf_code() -> Rc<CodeObject> {
        CodeObject::new(1, 1, 0, vec![], vec![], vec![])
    }

    #[test]
    fn test_static_builtin_identity_survives_clone_churn() {
        let first = Value::from(&NOOP);
        for _ in 0..10_000 {
            let copy = first.clone();
            drop(copy);
        }
        let second = Value::from(&NOOP);
        assert_eq!(first, second);
        assert_eq!(first.type_name(), "Builtin");
        assert_eq!(first.to_string(), "<builtin noop>");
    }

    #[test]
    fn test_heap_callables_compare_by_identity() {
        let code = leaf_code();
        let a = Rc::new(Callable::from_code(code.clone(), Value::Nil));
        let b = Rc::new(Callable::from_code(code, Value::Nil));
        let a_ref = CallableRef::Heap(a.clone());

        assert_eq!(a_ref, CallableRef::Heap(a));
        assert_ne!(a_ref, CallableRef::Heap(b));
    }

    #[test]
    fn test_display_and_type_names() {
        let native = Callable::from_native(0, NativeFunction {
            name: "len",
            func: noop,
        });
        assert_eq!(native.to_string(), "<builtin len>");
        assert_eq!(native.type_name(), "Builtin");

        let plain = Callable::from_code(leaf_code(), Value::Nil);
        assert_eq!(plain.to_string(), "<function>");
        assert_eq!(plain.type_name(), "Function");

        let scoped = Callable::from_code(leaf_code(), Value::list(vec![]));
        assert_eq!(scoped.to_string(), "<closure>");
        assert_eq!(scoped.type_name(), "Closure");
    }

    #[test]
    fn test_weak_capture_reports_gone_closure() {
        let captured = Value::list(vec![Value::Int(1)]);
        let callable = Callable::from_code_weak(leaf_code(), &captured);
        assert_eq!(callable.closure(), Ok(captured.clone()));

        drop(captured);
        assert_eq!(callable.closure(), Err(RuntimeError::ClosureGone));
    }

    #[test]
    fn test_from_code_takes_one_reference_each() {
        let code = leaf_code();
        let captured = Value::list(vec![]);
        let callable = Callable::from_code(code.clone(), captured.clone());

        assert_eq!(Rc::strong_count(&code), 2);
        match &captured {
            Value::List(l) => assert_eq!(Rc::strong_count(l), 2),
            _ => unreachable!(),
        }

        drop(callable);
        assert_eq!(Rc::strong_count(&code), 1);
        match &captured {
            Value::List(l) => assert_eq!(Rc::strong_count(l), 1),
            _ => unreachable!(),
        }
    }

    #[test]
    #[should_panic(expected = "rest parameter")]
    fn test_variadic_requires_a_parameter() {
        let _ = Callable::from_native(0, NativeFunction {
            name: "noop",
            func: noop,
        })
        .variadic();
    }
}
