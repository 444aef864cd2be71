//! Bytecode format
//!
//! Opcode numbering and instruction decoding, plus an assembler and a
//! disassembler for instruction streams.

pub mod assembler;
pub mod disasm;
pub mod instruction;
pub mod opcode;

pub use assembler::{AssembleError, Assembler, Label};
pub use disasm::{disassemble, render, DisasmItem};
pub use instruction::Instruction;
pub use opcode::OpCode;
