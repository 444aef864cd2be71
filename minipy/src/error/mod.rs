//! Host-facing errors and reporting

use crate::bytecode::AssembleError;
use crate::interp::RuntimeError;
use std::fmt::Write;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error surfaced to embedders and the CLI
#[derive(Debug, Error)]
pub enum Error {
    /// Script error no resume point claimed
    #[error("{0}")]
    Uncaught(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Assembler error: {0}")]
    Assemble(#[from] AssembleError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Running source text needs the compiler bytecode
    #[error("no bootstrap compiler configured (pass --bootstrap or set `bootstrap` in the config)")]
    MissingBootstrap,
}

/// Fatal report for an uncaught error: one block per unwound frame, most
/// recent first, then the exception itself
pub fn format_uncaught(error: &RuntimeError) -> String {
    let mut out = String::from("Exception:\n");
    for entry in &error.trace {
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "filename({}) line({}) name({}) \n{}",
            entry.filename, entry.lineno, entry.name, entry.line
        );
    }
    out.push_str(&error.to_string());
    out
}
