use std::rc::Rc;

use crate::runtime::{leak_detector, value::Value};

/// Compiled function body: constants, nested bodies, and bytecode.
///
/// A code object is immutable once built, which is what lets one body be
/// shared by many callables with different closures (a function literal in a
/// loop compiles once). The compiler builds these bottom-up: a child is
/// finished and handed over before its parent is constructed.
///
/// Sections are owned: releasing the last `Rc<CodeObject>` drops every
/// constant and every child exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeObject {
    arity: u8,
    /// Reserved for per-body attributes; call flags live on the callable.
    flags: u8,
    registers: u8,
    scope_size: u8,
    constants: Box<[Value]>,
    children: Box<[Rc<CodeObject>]>,
    bytecode: Box<[u8]>,
}

impl CodeObject {
    /// Builds a code object, taking ownership of its sections.
    ///
    /// Section lengths are fixed here and never change.
    pub fn new(
        arity: u8,
        registers: u8,
        scope_size: u8,
        constants: Vec<Value>,
        children: Vec<Rc<CodeObject>>,
        bytecode: Vec<u8>,
    ) -> Rc<CodeObject> {
        leak_detector::record_code_object();
        Rc::new(CodeObject {
            arity,
            flags: 0,
            registers,
            scope_size,
            constants: constants.into_boxed_slice(),
            children: children.into_boxed_slice(),
            bytecode: bytecode.into_boxed_slice(),
        })
    }

    /// Declared parameter count.
    pub fn arity(&self) -> u8 {
        self.arity
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Register-file size the interpreter must allocate for this body.
    pub fn registers(&self) -> u8 {
        self.registers
    }

    /// Scope size hint for the interpreter.
    pub fn scope_size(&self) -> u8 {
        self.scope_size
    }

    /// Constant pool, in emission order.
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Nested function bodies owned by this one.
    pub fn children(&self) -> &[Rc<CodeObject>] {
        &self.children
    }

    /// Raw instruction stream.
    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }
}
