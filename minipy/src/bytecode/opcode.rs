//! Opcode table
//!
//! Numbering is part of the bytecode format: the bootstrap compiler emits
//! these exact values, so they must never be reordered.

/// Instruction selector (first byte of every 4-byte instruction)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Eof = 0,
    Add = 1,
    Sub = 2,
    Mul = 3,
    Div = 4,
    Pow = 5,
    BitAnd = 6,
    BitOr = 7,
    Cmp = 8,
    Get = 9,
    Set = 10,
    Number = 11,
    String = 12,
    GGet = 13,
    GSet = 14,
    Move = 15,
    Def = 16,
    Pass = 17,
    Jump = 18,
    Call = 19,
    Return = 20,
    If = 21,
    Debug = 22,
    Eq = 23,
    Le = 24,
    Lt = 25,
    Dict = 26,
    List = 27,
    None = 28,
    Len = 29,
    Line = 30,
    Params = 31,
    IGet = 32,
    File = 33,
    Name = 34,
    Ne = 35,
    Has = 36,
    Raise = 37,
    SetJmp = 38,
    Mod = 39,
    Lsh = 40,
    Rsh = 41,
    Iter = 42,
    Del = 43,
    Regs = 44,
    BitXor = 45,
    IfN = 46,
    Not = 47,
    BitNot = 48,
}

const TABLE: [OpCode; 49] = [
    OpCode::Eof,
    OpCode::Add,
    OpCode::Sub,
    OpCode::Mul,
    OpCode::Div,
    OpCode::Pow,
    OpCode::BitAnd,
    OpCode::BitOr,
    OpCode::Cmp,
    OpCode::Get,
    OpCode::Set,
    OpCode::Number,
    OpCode::String,
    OpCode::GGet,
    OpCode::GSet,
    OpCode::Move,
    OpCode::Def,
    OpCode::Pass,
    OpCode::Jump,
    OpCode::Call,
    OpCode::Return,
    OpCode::If,
    OpCode::Debug,
    OpCode::Eq,
    OpCode::Le,
    OpCode::Lt,
    OpCode::Dict,
    OpCode::List,
    OpCode::None,
    OpCode::Len,
    OpCode::Line,
    OpCode::Params,
    OpCode::IGet,
    OpCode::File,
    OpCode::Name,
    OpCode::Ne,
    OpCode::Has,
    OpCode::Raise,
    OpCode::SetJmp,
    OpCode::Mod,
    OpCode::Lsh,
    OpCode::Rsh,
    OpCode::Iter,
    OpCode::Del,
    OpCode::Regs,
    OpCode::BitXor,
    OpCode::IfN,
    OpCode::Not,
    OpCode::BitNot,
];

impl OpCode {
    /// Decode a raw opcode byte
    pub fn from_u8(byte: u8) -> Option<Self> {
        TABLE.get(byte as usize).copied()
    }

    /// Upper-case mnemonic used by the disassembler
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Eof => "EOF",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Pow => "POW",
            OpCode::BitAnd => "BITAND",
            OpCode::BitOr => "BITOR",
            OpCode::Cmp => "CMP",
            OpCode::Get => "GET",
            OpCode::Set => "SET",
            OpCode::Number => "NUMBER",
            OpCode::String => "STRING",
            OpCode::GGet => "GGET",
            OpCode::GSet => "GSET",
            OpCode::Move => "MOVE",
            OpCode::Def => "DEF",
            OpCode::Pass => "PASS",
            OpCode::Jump => "JUMP",
            OpCode::Call => "CALL",
            OpCode::Return => "RETURN",
            OpCode::If => "IF",
            OpCode::Debug => "DEBUG",
            OpCode::Eq => "EQ",
            OpCode::Le => "LE",
            OpCode::Lt => "LT",
            OpCode::Dict => "DICT",
            OpCode::List => "LIST",
            OpCode::None => "NONE",
            OpCode::Len => "LEN",
            OpCode::Line => "LINE",
            OpCode::Params => "PARAMS",
            OpCode::IGet => "IGET",
            OpCode::File => "FILE",
            OpCode::Name => "NAME",
            OpCode::Ne => "NE",
            OpCode::Has => "HAS",
            OpCode::Raise => "RAISE",
            OpCode::SetJmp => "SETJMP",
            OpCode::Mod => "MOD",
            OpCode::Lsh => "LSH",
            OpCode::Rsh => "RSH",
            OpCode::Iter => "ITER",
            OpCode::Del => "DEL",
            OpCode::Regs => "REGS",
            OpCode::BitXor => "BITXOR",
            OpCode::IfN => "IFN",
            OpCode::Not => "NOT",
            OpCode::BitNot => "BITNOT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_discriminants() {
        for (i, op) in TABLE.iter().enumerate() {
            assert_eq!(*op as usize, i, "{} is out of place", op.mnemonic());
        }
    }

    #[test]
    fn test_from_u8() {
        assert_eq!(OpCode::from_u8(0), Some(OpCode::Eof));
        assert_eq!(OpCode::from_u8(19), Some(OpCode::Call));
        assert_eq!(OpCode::from_u8(48), Some(OpCode::BitNot));
        assert_eq!(OpCode::from_u8(49), None);
        assert_eq!(OpCode::from_u8(0xFF), None);
    }

    #[test]
    fn test_mnemonic() {
        assert_eq!(OpCode::SetJmp.mnemonic(), "SETJMP");
        assert_eq!(OpCode::IGet.mnemonic(), "IGET");
    }
}
