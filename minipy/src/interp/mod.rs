//! Bytecode interpreter
//!
//! Value model, prototype dicts, the attribute protocol and the frame-based
//! evaluator.

mod attr;
mod builtins;
mod dict;
mod error;
mod eval;
mod frame;
mod methods;
mod ops;
mod value;

pub use dict::{lookup, Dict, DictRef, MAX_LOOKUP_DEPTH};
pub use error::{ErrorKind, InterpResult, RuntimeError, TraceEntry};
pub use eval::{Interpreter, BOOTSTRAP_MODULE};
pub use methods::{arg, dict_at, function_at, list_at, number_at, str_at};
pub use value::{compare, equals, Function, FunctionKind, ListRef, NativeFn, Value};
