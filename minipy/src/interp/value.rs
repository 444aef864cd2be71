//! Runtime values

use super::dict::{Dict, DictRef};
use super::error::{InterpResult, RuntimeError};
use super::eval::Interpreter;
use crate::util::format_number;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable list storage
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Host function signature: engine context plus the argument list
pub type NativeFn = fn(&mut Interpreter, Vec<Value>) -> InterpResult<Value>;

/// Nesting limit for printing, hashing and comparing self-referencing lists
const MAX_NESTING: usize = 32;

/// Runtime value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Number(f64),
    Str(Rc<[u8]>),
    List(ListRef),
    Dict(DictRef),
    Function(Rc<Function>),
}

/// Callable value
#[derive(Clone)]
pub struct Function {
    pub kind: FunctionKind,
    /// Prepended to the arguments when set (bound method)
    pub receiver: Option<Value>,
}

#[derive(Clone)]
pub enum FunctionKind {
    Native { name: &'static str, func: NativeFn },
    /// Body bytes plus the globals of the frame that defined it
    Bytecode { code: Rc<[u8]>, globals: DictRef },
}

impl Function {
    /// Same callable with a new receiver
    pub fn bind(&self, receiver: Value) -> Function {
        Function {
            kind: self.kind.clone(),
            receiver: Some(receiver),
        }
    }

    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

impl Value {
    pub fn number(n: impl Into<f64>) -> Value {
        Value::Number(n.into())
    }

    pub fn bool(b: bool) -> Value {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    pub fn str(s: impl AsRef<[u8]>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// Empty plain dict
    pub fn dict() -> Value {
        Value::Dict(Dict::new().into_ref())
    }

    /// Empty object instance
    pub fn object() -> Value {
        Value::Dict(Dict::object().into_ref())
    }

    pub fn native(name: &'static str, func: NativeFn) -> Value {
        Value::Function(Rc::new(Function {
            kind: FunctionKind::Native { name, func },
            receiver: None,
        }))
    }

    /// Native function already bound to `receiver`
    pub fn method(name: &'static str, func: NativeFn, receiver: Value) -> Value {
        Value::Function(Rc::new(Function {
            kind: FunctionKind::Native { name, func },
            receiver: Some(receiver),
        }))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Dict(d) if d.borrow().is_object() => "object",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Value::None => false,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.borrow().is_empty(),
            Value::Dict(d) => !d.borrow().is_empty(),
            Value::Function(_) => true,
        }
    }

    pub fn len(&self) -> InterpResult<usize> {
        match self {
            Value::Str(s) => Ok(s.len()),
            Value::List(l) => Ok(l.borrow().len()),
            Value::Dict(d) => Ok(d.borrow().len()),
            other => Err(RuntimeError::type_error(format!(
                "len() of unsized {}",
                other.type_name()
            ))),
        }
    }

    /// Byte form used by `str()` and `print`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_bytes(&mut out, 0);
        out
    }

    fn write_bytes(&self, out: &mut Vec<u8>, depth: usize) {
        match self {
            Value::None => out.extend_from_slice(b"None"),
            Value::Number(n) => out.extend_from_slice(format_number(*n).as_bytes()),
            Value::Str(s) => out.extend_from_slice(s),
            Value::List(_) if depth >= MAX_NESTING => out.extend_from_slice(b"[...]"),
            Value::List(l) => {
                out.push(b'[');
                for (i, item) in l.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    item.write_bytes(out, depth + 1);
                }
                out.push(b']');
            }
            Value::Dict(d) => {
                let tag = if d.borrow().is_object() { "object" } else { "dict" };
                out.extend_from_slice(format!("<{tag} 0x{:x}>", self.address()).as_bytes());
            }
            Value::Function(_) => {
                out.extend_from_slice(format!("<function 0x{:x}>", self.address()).as_bytes());
            }
        }
    }

    /// Identity of shared values; zero for immediates
    pub fn address(&self) -> usize {
        match self {
            Value::List(l) => Rc::as_ptr(l) as *const u8 as usize,
            Value::Dict(d) => Rc::as_ptr(d) as *const u8 as usize,
            Value::Function(f) => Rc::as_ptr(f) as *const u8 as usize,
            _ => 0,
        }
    }

    /// Key hash; dict entries are identified by this value alone
    pub fn compute_hash(&self) -> i32 {
        self.hash_at(0)
    }

    fn hash_at(&self, depth: usize) -> i32 {
        match self {
            Value::None => 0,
            Value::Number(n) => hash_bytes(&n.to_le_bytes()),
            Value::Str(s) => hash_bytes(s),
            Value::List(_) if depth >= MAX_NESTING => 0,
            Value::List(l) => l
                .borrow()
                .iter()
                .fold(0i32, |acc, item| acc.wrapping_add(item.hash_at(depth + 1))),
            Value::Dict(_) | Value::Function(_) => hash_bytes(&self.address().to_le_bytes()),
        }
    }

    /// Structural clone: fresh container, shared elements
    pub fn copy(&self) -> Value {
        match self {
            Value::List(l) => Value::list(l.borrow().clone()),
            Value::Dict(d) => Value::Dict(d.borrow().copy().into_ref()),
            Value::Function(f) => Value::Function(Rc::new((**f).clone())),
            other => other.clone(),
        }
    }
}

/// Rolling hash over raw bytes, seeded with the length and the first word
fn hash_bytes(bytes: &[u8]) -> i32 {
    let len = bytes.len();
    let mut ret = len as i32;
    if len >= 4 {
        ret = ret.wrapping_add(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
    }
    let step = (len >> 5) + 1;
    let mut i = len;
    while i >= step {
        let mixed = ret
            .wrapping_shl(5)
            .wrapping_add(ret >> 2)
            .wrapping_add(bytes[i - 1] as i32);
        ret ^= mixed;
        i -= step;
    }
    ret
}

/// Ordering between two values of the same kind.
///
/// Lists compare element-wise then by length. Dicts and functions order by
/// identity. Different kinds do not compare.
pub fn compare(a: &Value, b: &Value) -> InterpResult<Ordering> {
    compare_at(a, b, 0)
}

fn compare_at(a: &Value, b: &Value, depth: usize) -> InterpResult<Ordering> {
    match (a, b) {
        (Value::None, Value::None) => Ok(Ordering::Equal),
        (Value::Number(x), Value::Number(y)) => Ok(x.partial_cmp(y).unwrap_or(Ordering::Equal)),
        (Value::Str(x), Value::Str(y)) => Ok(x.as_ref().cmp(y.as_ref())),
        (Value::List(x), Value::List(y)) => {
            if Rc::ptr_eq(x, y) {
                return Ok(Ordering::Equal);
            }
            if depth >= MAX_NESTING {
                return Err(RuntimeError::runtime("maximum comparison depth exceeded"));
            }
            let (x, y) = (x.borrow(), y.borrow());
            for (p, q) in x.iter().zip(y.iter()) {
                let ord = compare_at(p, q, depth + 1)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(x.len().cmp(&y.len()))
        }
        (Value::Dict(_), Value::Dict(_)) | (Value::Function(_), Value::Function(_)) => {
            Ok(a.address().cmp(&b.address()))
        }
        _ => Err(RuntimeError::type_error(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Equality used by EQ/NE, HAS and `index`; values of different kinds are unequal
pub fn equals(a: &Value, b: &Value) -> bool {
    matches!(compare(a, b), Ok(Ordering::Equal))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        equals(self, other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", String::from_utf8_lossy(s)),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match &self.kind {
            FunctionKind::Native { name, .. } => *name,
            FunctionKind::Bytecode { .. } => "<bytecode>",
        };
        f.debug_struct("Function")
            .field("name", &name)
            .field("bound", &self.receiver.is_some())
            .finish()
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
