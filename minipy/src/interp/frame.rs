//! Activation records
//!
//! Each call gets a `Frame`: its own register file, the globals dict it was
//! defined against, a cursor into its bytecode and the diagnostic fields
//! reported in tracebacks. Frames live on a `CallStack` owned by the
//! interpreter.

use super::dict::DictRef;
use super::value::Value;
use std::rc::Rc;

/// Register file; grows on first write past the end
#[derive(Debug, Default)]
pub struct Registers {
    slots: Vec<Value>,
}

impl Registers {
    pub fn new() -> Self {
        Registers::default()
    }

    /// Registers `0..inputs.len()` preloaded
    pub fn with_inputs(inputs: Vec<Value>) -> Self {
        Registers { slots: inputs }
    }

    /// Unwritten registers read as None
    pub fn get(&self, index: usize) -> Value {
        self.slots.get(index).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, index: usize, value: Value) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, Value::None);
        }
        self.slots[index] = value;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Where a frame's result goes when it is popped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Into a register of the calling frame
    Register(u8),
    /// Back to the host driver that pushed it
    Host,
}

/// One activation record
pub struct Frame {
    pub code: Rc<[u8]>,
    /// Byte offset of the next instruction
    pub cursor: usize,
    /// Installed by SETJMP; consumed by the first error that reaches this frame
    pub resume_at: Option<usize>,
    pub regs: Registers,
    pub globals: DictRef,
    pub filename: String,
    pub name: String,
    pub line: String,
    pub lineno: u16,
    pub dest: Continuation,
}

impl Frame {
    pub fn new(code: Rc<[u8]>, globals: DictRef, regs: Registers, dest: Continuation) -> Self {
        Frame {
            code,
            cursor: 0,
            resume_at: None,
            regs,
            globals,
            filename: "?".to_string(),
            name: "?".to_string(),
            line: String::new(),
            lineno: 0,
            dest,
        }
    }
}

/// Stack of active frames, innermost last
#[derive(Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Current depth
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
