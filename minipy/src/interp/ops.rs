//! Arithmetic and bitwise operators
//!
//! Bitwise operators truncate both operands to `i64` first.

use super::error::{InterpResult, RuntimeError};
use super::value::Value;
use crate::bytecode::OpCode;

/// Largest string MUL may build
pub const MAX_REPEAT_BYTES: usize = 1 << 30;

/// `a <op> b` for the binary arithmetic opcodes
pub fn binary(op: OpCode, a: &Value, b: &Value) -> InterpResult<Value> {
    match (op, a, b) {
        (OpCode::Add, Value::Number(x), Value::Number(y)) => Ok(Value::Number(x + y)),
        (OpCode::Add, Value::Str(x), Value::Str(y)) => {
            let mut joined = Vec::with_capacity(x.len() + y.len());
            joined.extend_from_slice(x);
            joined.extend_from_slice(y);
            Ok(Value::str(joined))
        }
        (OpCode::Add, Value::List(x), Value::List(y)) => {
            let mut items = x.borrow().clone();
            items.extend(y.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (OpCode::Mul, Value::Number(x), Value::Number(y)) => Ok(Value::Number(x * y)),
        (OpCode::Mul, Value::Str(s), Value::Number(n)) | (OpCode::Mul, Value::Number(n), Value::Str(s)) => {
            let times = (*n as i64).max(0) as usize;
            match s.len().checked_mul(times) {
                Some(total) if total <= MAX_REPEAT_BYTES => Ok(Value::str(s.repeat(times))),
                _ => Err(RuntimeError::value_error(format!(
                    "string repeat of {} bytes by {times} is too large",
                    s.len()
                ))),
            }
        }
        (OpCode::Sub, Value::Number(x), Value::Number(y)) => Ok(Value::Number(x - y)),
        (OpCode::Div, Value::Number(x), Value::Number(y)) => Ok(Value::Number(x / y)),
        (OpCode::Pow, Value::Number(x), Value::Number(y)) => Ok(Value::Number(x.powf(*y))),
        (_, Value::Number(x), Value::Number(y)) => integer(op, *x as i64, *y as i64),
        _ => Err(unsupported(op, a, b)),
    }
}

fn integer(op: OpCode, x: i64, y: i64) -> InterpResult<Value> {
    let n = match op {
        OpCode::BitAnd => x & y,
        OpCode::BitOr => x | y,
        OpCode::BitXor => x ^ y,
        OpCode::Lsh => x.wrapping_shl(y as u32),
        OpCode::Rsh => x.wrapping_shr(y as u32),
        OpCode::Mod => {
            if y == 0 {
                return Err(RuntimeError::value_error("integer modulo by zero"));
            }
            x.wrapping_rem(y)
        }
        other => {
            return Err(RuntimeError::runtime(format!(
                "{} is not a binary operator",
                other.mnemonic()
            )))
        }
    };
    Ok(Value::Number(n as f64))
}

/// `~a`
pub fn bit_not(a: &Value) -> InterpResult<Value> {
    match a {
        Value::Number(n) => Ok(Value::Number(!(*n as i64) as f64)),
        other => Err(RuntimeError::type_error(format!(
            "bad operand type for ~: {}",
            other.type_name()
        ))),
    }
}

fn unsupported(op: OpCode, a: &Value, b: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand type(s) for {}: {} and {}",
        op.mnemonic(),
        a.type_name(),
        b.type_name()
    ))
}
