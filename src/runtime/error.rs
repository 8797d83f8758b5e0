use thiserror::Error;

/// Runtime errors raised by the call protocol or by a callee.
///
/// These are the recoverable failures: they propagate unchanged through
/// `fcall`/`tcall`/`vcall` to the immediate caller. Contract violations
/// (frame-capacity misuse, a variadic callable with zero parameters) are
/// programmer errors and assert instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A non-callable value was invoked.
    #[error("not a function: {0}")]
    NotCallable(&'static str),

    /// A weakly captured closure was released before the call.
    #[error("closure is no longer reachable")]
    ClosureGone,

    /// Free-form failure reported by a native function.
    #[error("{0}")]
    Message(String),
}

impl RuntimeError {
    /// Convenience constructor for native functions reporting failure.
    pub fn msg(text: impl Into<String>) -> Self {
        RuntimeError::Message(text.into())
    }
}
