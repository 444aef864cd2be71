//! Runtime errors for the interpreter
//!
//! Every failure inside the engine, including values raised by scripts,
//! travels as a `RuntimeError` until a resume point claims it or the
//! driver gives up and hands it back to the host with a trace.

use super::frame::Frame;
use super::value::Value;
use serde::Serialize;
use std::fmt;

/// Runtime error during interpretation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// The script value for `Raised` errors
    pub payload: Option<Value>,
    /// Frames discarded while unwinding, most recent first
    pub trace: Vec<TraceEntry>,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operand or argument of the wrong kind
    TypeError,
    /// Missing key or index out of range
    KeyError,
    /// Right kind, bad value
    ValueError,
    /// File access failed
    IoError,
    /// `assert` failed
    AssertionError,
    /// Engine limits and malformed bytecode
    RuntimeError,
    /// Arbitrary value thrown by RAISE
    Raised,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::KeyError => "KeyError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::IoError => "IOError",
            ErrorKind::AssertionError => "AssertionError",
            ErrorKind::RuntimeError => "RuntimeError",
            ErrorKind::Raised => "Exception",
        }
    }
}

/// Diagnostic snapshot of one unwound frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub filename: String,
    pub lineno: u16,
    pub name: String,
    pub line: String,
}

impl From<&Frame> for TraceEntry {
    fn from(frame: &Frame) -> Self {
        TraceEntry {
            filename: frame.filename.clone(),
            lineno: frame.lineno,
            name: frame.name.clone(),
            line: frame.line.clone(),
        }
    }
}

impl RuntimeError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
            payload: None,
            trace: Vec::new(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn key_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IoError, message)
    }

    pub fn assertion_failed() -> Self {
        Self::new(ErrorKind::AssertionError, "assertion failed")
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RuntimeError, message)
    }

    /// Wrap a script value thrown by RAISE
    pub fn raised(value: Value) -> Self {
        RuntimeError {
            kind: ErrorKind::Raised,
            message: value.to_string(),
            payload: Some(value),
            trace: Vec::new(),
        }
    }

    /// The value a script observes for this error
    pub fn exception_value(&self) -> Value {
        match &self.payload {
            Some(value) => value.clone(),
            None => Value::str(self.to_string()),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.payload) {
            (ErrorKind::Raised, Some(value)) => write!(f, "{value}"),
            (kind, _) => write!(f, "{}: {}", kind.name(), self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
