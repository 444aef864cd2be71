//! Raw instruction decoding
//!
//! Every instruction is a 4-byte word `[op, a, b, c]`. Some opcodes read
//! `b` and `c` together as a 16-bit immediate, and a few carry a payload in
//! the words that follow them (NUMBER, STRING, LINE, DEF).

/// Width of one instruction word in bytes
pub const WORD: usize = 4;

/// Size of the double that trails a NUMBER instruction
pub const NUMBER_PAYLOAD: usize = 8;

/// One decoded instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: u8,
    pub a: u8,
    pub b: u8,
    pub c: u8,
}

impl Instruction {
    /// Read the word at `offset`; `None` once the stream is exhausted
    pub fn decode(code: &[u8], offset: usize) -> Option<Self> {
        let word = code.get(offset..offset + WORD)?;
        Some(Instruction {
            op: word[0],
            a: word[1],
            b: word[2],
            c: word[3],
        })
    }

    /// `(b << 8) + c` read as an unsigned length
    pub fn immediate(&self) -> u16 {
        ((self.b as u16) << 8) | self.c as u16
    }

    /// `(b << 8) + c` read as a two's-complement word offset
    pub fn offset(&self) -> i16 {
        self.immediate() as i16
    }

    pub fn encode(&self) -> [u8; WORD] {
        [self.op, self.a, self.b, self.c]
    }
}

/// Bytes occupied by a STRING payload of `len` bytes.
///
/// The block always ends with at least one NUL, so an exact multiple of four
/// still gets a whole padding word.
pub fn string_block_len(len: usize) -> usize {
    (len / WORD + 1) * WORD
}

/// Resolve `cursor + (offset - 1) * 4` for JUMP/SETJMP/DEF style operands.
/// `cursor` is already past the instruction itself.
pub fn relative_target(cursor: usize, offset: i64) -> Option<usize> {
    let target = cursor as i64 + (offset - 1) * WORD as i64;
    usize::try_from(target).ok()
}
