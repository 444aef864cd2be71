//! Bytecode assembler
//!
//! Builds instruction streams by hand: jump labels are patched when the
//! stream is finished, literal payloads are padded to word boundaries, and
//! function bodies are nested as already-assembled blocks.

use super::instruction::{string_block_len, Instruction, NUMBER_PAYLOAD, WORD};
use super::opcode::OpCode;
use thiserror::Error;

/// Assembly failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("label {0} was never bound")]
    UnboundLabel(usize),
    #[error("label {0} bound twice")]
    ReboundLabel(usize),
    #[error("jump offset {0} does not fit in 16 bits")]
    OffsetOverflow(i64),
    #[error("string literal of {0} bytes is too long")]
    StringTooLong(usize),
    #[error("function body of {0} bytes is not word aligned")]
    MisalignedBody(usize),
    #[error("function body of {0} bytes is too long")]
    BodyTooLong(usize),
    #[error("source line of {0} bytes is too long")]
    LineTooLong(usize),
}

/// Forward or backward jump target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Debug, Clone, Copy)]
struct Fixup {
    /// Word index of the JUMP/SETJMP instruction
    word: usize,
    label: Label,
}

/// Instruction stream under construction
#[derive(Debug, Default)]
pub struct Assembler {
    code: Vec<u8>,
    labels: Vec<Option<usize>>,
    fixups: Vec<Fixup>,
    error: Option<AssembleError>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position in words
    pub fn position(&self) -> usize {
        self.code.len() / WORD
    }

    /// Emit a plain instruction
    pub fn op(&mut self, op: OpCode, a: u8, b: u8, c: u8) -> &mut Self {
        let ins = Instruction { op: op as u8, a, b, c };
        self.code.extend_from_slice(&ins.encode());
        self
    }

    /// Emit an instruction whose `b`/`c` bytes form a 16-bit immediate
    pub fn op_imm(&mut self, op: OpCode, a: u8, imm: u16) -> &mut Self {
        self.op(op, a, (imm >> 8) as u8, (imm & 0xFF) as u8)
    }

    /// `regs[reg] = value`
    pub fn number(&mut self, reg: u8, value: f64) -> &mut Self {
        self.op(OpCode::Number, reg, 0, 0);
        let bytes = value.to_le_bytes();
        debug_assert_eq!(bytes.len(), NUMBER_PAYLOAD);
        self.code.extend_from_slice(&bytes);
        self
    }

    /// `regs[reg] = "text"`
    pub fn string(&mut self, reg: u8, text: impl AsRef<[u8]>) -> &mut Self {
        let text = text.as_ref();
        let Ok(len) = u16::try_from(text.len()) else {
            self.fail(AssembleError::StringTooLong(text.len()));
            return self;
        };
        self.op_imm(OpCode::String, reg, len);
        let start = self.code.len();
        self.code.extend_from_slice(text);
        self.code.resize(start + string_block_len(text.len()), 0);
        self
    }

    /// `regs[reg] = None`
    pub fn none(&mut self, reg: u8) -> &mut Self {
        self.op(OpCode::None, reg, 0, 0)
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Pin `label` to the next instruction
    pub fn bind(&mut self, label: Label) -> &mut Self {
        let here = self.position();
        match self.labels.get_mut(label.0) {
            Some(slot @ None) => *slot = Some(here),
            Some(Some(_)) => self.fail(AssembleError::ReboundLabel(label.0)),
            None => self.fail(AssembleError::UnboundLabel(label.0)),
        }
        self
    }

    pub fn jump(&mut self, label: Label) -> &mut Self {
        self.fixup(OpCode::Jump, label)
    }

    /// Install the frame's resume point at `label`
    pub fn setjmp(&mut self, label: Label) -> &mut Self {
        self.fixup(OpCode::SetJmp, label)
    }

    /// Drop the frame's resume point
    pub fn clear_setjmp(&mut self) -> &mut Self {
        self.op_imm(OpCode::SetJmp, 0, 0)
    }

    /// `regs[reg] = function(body)` where `body` is a finished stream
    pub fn def(&mut self, reg: u8, body: &[u8]) -> &mut Self {
        if body.len() % WORD != 0 {
            self.fail(AssembleError::MisalignedBody(body.len()));
            return self;
        }
        let Ok(words) = u16::try_from(body.len() / WORD + 1) else {
            self.fail(AssembleError::BodyTooLong(body.len()));
            return self;
        };
        self.op_imm(OpCode::Def, reg, words);
        self.code.extend_from_slice(body);
        self
    }

    /// Record a source line for diagnostics
    pub fn line(&mut self, lineno: u16, text: &str) -> &mut Self {
        let padded = text.len() + (WORD - text.len() % WORD);
        let Ok(words) = u8::try_from(padded / WORD) else {
            self.fail(AssembleError::LineTooLong(text.len()));
            return self;
        };
        self.op_imm(OpCode::Line, words, lineno);
        let start = self.code.len();
        self.code.extend_from_slice(text.as_bytes());
        self.code.resize(start + padded, 0);
        self
    }

    /// Patch labels and return the byte stream
    pub fn finish(self) -> Result<Vec<u8>, AssembleError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut code = self.code;
        for fixup in &self.fixups {
            let target = self.labels[fixup.label.0].ok_or(AssembleError::UnboundLabel(fixup.label.0))?;
            let delta = target as i64 - fixup.word as i64;
            let offset = i16::try_from(delta).map_err(|_| AssembleError::OffsetOverflow(delta))?;
            let at = fixup.word * WORD;
            let [hi, lo] = offset.to_be_bytes();
            code[at + 2] = hi;
            code[at + 3] = lo;
        }
        Ok(code)
    }

    fn fixup(&mut self, op: OpCode, label: Label) -> &mut Self {
        self.fixups.push(Fixup {
            word: self.position(),
            label,
        });
        self.op(op, 0, 0, 0)
    }

    fn fail(&mut self, err: AssembleError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}
