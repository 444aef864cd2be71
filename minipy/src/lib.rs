//! minipy
//!
//! Embeddable register-based bytecode VM for a small Python-like language.

pub mod bytecode;
pub mod config;
pub mod error;
pub mod interp;
pub mod modules;
pub mod util;

pub use config::EngineConfig;
pub use error::{format_uncaught, Error, Result};
pub use interp::{Interpreter, RuntimeError, Value};
