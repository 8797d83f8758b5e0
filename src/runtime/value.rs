use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::runtime::{
    callable::{Builtin, Callable, CallableRef},
    code_object::CodeObject,
    error::RuntimeError,
    leak_detector,
};

/// Tagged runtime value shared by frames, constants, and closures.
///
/// Immediates (`Nil`, `Bool`, `Int`, `Float`) are unboxed; heap kinds use
/// `Rc` so cloning is an increment, not a copy. Cloning and dropping a value
/// are the generic increment/decrement of the reference-counting protocol:
/// the "exactly one release per acquisition" invariant is structural, not a
/// pair of calls to keep in sync.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of value.
    Nil,
    /// Boolean immediate.
    Bool(bool),
    /// 64-bit signed integer immediate.
    Int(i64),
    /// 64-bit floating point immediate.
    Float(f64),
    /// UTF-8 string value.
    Str(Rc<str>),
    /// Mutable ordered collection; the aggregate closures capture into.
    List(Rc<RefCell<Vec<Value>>>),
    /// Compiled function body.
    Code(Rc<CodeObject>),
    /// First-class function value.
    Callable(CallableRef),
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "\"{}\"", v),
            Value::List(elements) => {
                let items: Vec<String> =
                    elements.borrow().iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Code(_) => write!(f, "<code>"),
            Value::Callable(c) => write!(f, "{}", c),
        }
    }
}

impl Value {
    /// Builds a list value, recording the allocation for leak telemetry.
    pub fn list(items: Vec<Value>) -> Value {
        leak_detector::record_list();
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// Returns the canonical runtime type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::List(_) => "List",
            Value::Code(_) => "Code",
            Value::Callable(c) => c.type_name(),
        }
    }

    /// Returns whether this value is truthy according to Rill semantics.
    ///
    /// Only `Bool(false)` and `Nil` are falsy; all other values are truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Nil)
    }

    /// Boundary assertion of the call protocol: resolves this value to a
    /// callable handle, or reports what was invoked instead.
    pub fn as_callable(&self) -> Result<CallableRef, RuntimeError> {
        match self {
            Value::Callable(c) => Ok(c.clone()),
            other => Err(RuntimeError::NotCallable(other.type_name())),
        }
    }

    /// Resolves this value to a compiled body, if it is one.
    pub fn as_code(&self) -> Option<Rc<CodeObject>> {
        match self {
            Value::Code(c) => Some(c.clone()),
            _ => None,
        }
    }

    /// Creates a weak handle to this value.
    ///
    /// Heap kinds are downgraded to `rc::Weak`; immediates and statically
    /// allocated callables are held inline since they are never collected.
    pub fn downgrade(&self) -> WeakValue {
        match self {
            Value::Str(v) => WeakValue::Str(Rc::downgrade(v)),
            Value::List(v) => WeakValue::List(Rc::downgrade(v)),
            Value::Code(v) => WeakValue::Code(Rc::downgrade(v)),
            Value::Callable(CallableRef::Heap(v)) => WeakValue::Callable(Rc::downgrade(v)),
            pinned => WeakValue::Pinned(pinned.clone()),
        }
    }
}

impl From<Rc<Callable>> for Value {
    fn from(c: Rc<Callable>) -> Self {
        Value::Callable(CallableRef::Heap(c))
    }
}

impl From<&'static Builtin> for Value {
    fn from(b: &'static Builtin) -> Self {
        Value::Callable(CallableRef::Static(b))
    }
}

/// Weak handle to a [`Value`]: holding one does not keep the value alive.
///
/// [`WeakValue::upgrade`] is the only way back; the "referent may have
/// vanished" case is a checked `Option`, never a dangling access.
#[derive(Debug, Clone)]
pub enum WeakValue {
    /// Immediates and static callables, which are never collected.
    Pinned(Value),
    Str(Weak<str>),
    List(Weak<RefCell<Vec<Value>>>),
    Code(Weak<CodeObject>),
    Callable(Weak<Callable>),
}

impl WeakValue {
    /// Attempts to recover the referent, returning `None` if it was already
    /// released.
    pub fn upgrade(&self) -> Option<Value> {
        match self {
            WeakValue::Pinned(v) => Some(v.clone()),
            WeakValue::Str(w) => w.upgrade().map(Value::Str),
            WeakValue::List(w) => w.upgrade().map(Value::List),
            WeakValue::Code(w) => w.upgrade().map(Value::Code),
            WeakValue::Callable(w) => {
                w.upgrade().map(|c| Value::Callable(CallableRef::Heap(c)))
            }
        }
    }
}
