//! Bytecode disassembler
//!
//! Walks an instruction stream linearly. Literal payloads are consumed and
//! summarised; DEF bodies are not skipped, so nested functions are listed
//! inline after their DEF.

use super::instruction::{relative_target, string_block_len, Instruction, NUMBER_PAYLOAD, WORD};
use super::opcode::OpCode;
use crate::util::format_number;
use serde::Serialize;

/// One decoded instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisasmItem {
    pub offset: usize,
    pub opcode: &'static str,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Decode every instruction in `code`
pub fn disassemble(code: &[u8]) -> Vec<DisasmItem> {
    let mut items = Vec::new();
    let mut cursor = 0;

    while let Some(ins) = Instruction::decode(code, cursor) {
        let offset = cursor;
        cursor += WORD;

        let op = OpCode::from_u8(ins.op);
        let mut detail = None;
        match op {
            Some(OpCode::Number) => {
                let Some(bytes) = code.get(cursor..cursor + NUMBER_PAYLOAD) else {
                    push(&mut items, offset, op, ins, Some("<truncated>".to_string()));
                    break;
                };
                let mut raw = [0u8; NUMBER_PAYLOAD];
                raw.copy_from_slice(bytes);
                detail = Some(format_number(f64::from_le_bytes(raw)));
                cursor += NUMBER_PAYLOAD;
            }
            Some(OpCode::String) => {
                let len = ins.immediate() as usize;
                let text = code.get(cursor..cursor + len).unwrap_or(&[]);
                detail = Some(format!("{:?}", String::from_utf8_lossy(text)));
                cursor += string_block_len(len);
            }
            Some(OpCode::Line) => {
                let words = ins.a as usize * WORD;
                let end = (cursor + words).min(code.len());
                let text = code.get(cursor..end).unwrap_or(&[]);
                let text = text.split(|b| *b == 0).next().unwrap_or(&[]);
                detail = Some(format!("{}: {}", ins.immediate(), String::from_utf8_lossy(text)));
                cursor += words;
            }
            Some(OpCode::Jump) | Some(OpCode::SetJmp) => {
                let imm = ins.offset();
                detail = if op == Some(OpCode::SetJmp) && imm == 0 {
                    Some("clear".to_string())
                } else {
                    relative_target(cursor, imm as i64).map(|t| format!("-> {t:04}"))
                };
            }
            Some(OpCode::Def) => {
                let body = (ins.immediate() as usize).saturating_sub(1) * WORD;
                detail = Some(format!("body {:04}..{:04}", cursor, cursor + body));
            }
            None => detail = Some("invalid".to_string()),
            _ => {}
        }
        push(&mut items, offset, op, ins, detail);
    }

    items
}

fn push(
    items: &mut Vec<DisasmItem>,
    offset: usize,
    op: Option<OpCode>,
    ins: Instruction,
    detail: Option<String>,
) {
    items.push(DisasmItem {
        offset,
        opcode: op.map(OpCode::mnemonic).unwrap_or("???"),
        a: ins.a,
        b: ins.b,
        c: ins.c,
        detail,
    });
}

/// One line per instruction: `offset MNEMONIC a b c [; detail]`
pub fn render(items: &[DisasmItem]) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|item| {
            let head = format!(
                "{:04} {:<7} {} {} {}",
                item.offset, item.opcode, item.a, item.b, item.c
            );
            match &item.detail {
                Some(detail) => format!("{head} ; {detail}"),
                None => head,
            }
        })
        .collect();
    lines.join("\n")
}
