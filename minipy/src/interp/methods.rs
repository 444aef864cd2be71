//! Primitive attribute surface
//!
//! Indexing, slicing and the bound methods of strings and lists, plus the
//! typed argument accessors shared by every native function.

use super::dict::DictRef;
use super::error::{InterpResult, RuntimeError};
use super::eval::Interpreter;
use super::value::{compare, equals, Function, ListRef, Value};
use crate::util::{find_bytes, replace_bytes, split_bytes, trim_bytes};
use std::rc::Rc;
use tracing::trace;

// ============================================================================
// Argument accessors
// ============================================================================

pub fn arg(args: &[Value], index: usize) -> InterpResult<&Value> {
    args.get(index)
        .ok_or_else(|| RuntimeError::type_error(format!("missing argument {index}")))
}

fn unexpected(index: usize, expected: &str, got: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "argument {index}: expected {expected}, got {}",
        got.type_name()
    ))
}

pub fn number_at(args: &[Value], index: usize) -> InterpResult<f64> {
    match arg(args, index)? {
        Value::Number(n) => Ok(*n),
        other => Err(unexpected(index, "number", other)),
    }
}

pub fn str_at(args: &[Value], index: usize) -> InterpResult<Rc<[u8]>> {
    match arg(args, index)? {
        Value::Str(s) => Ok(Rc::clone(s)),
        other => Err(unexpected(index, "string", other)),
    }
}

pub fn list_at(args: &[Value], index: usize) -> InterpResult<ListRef> {
    match arg(args, index)? {
        Value::List(l) => Ok(Rc::clone(l)),
        other => Err(unexpected(index, "list", other)),
    }
}

pub fn dict_at(args: &[Value], index: usize) -> InterpResult<DictRef> {
    match arg(args, index)? {
        Value::Dict(d) => Ok(Rc::clone(d)),
        other => Err(unexpected(index, "dict", other)),
    }
}

pub fn function_at(args: &[Value], index: usize) -> InterpResult<Rc<Function>> {
    match arg(args, index)? {
        Value::Function(f) => Ok(Rc::clone(f)),
        other => Err(unexpected(index, "function", other)),
    }
}

// ============================================================================
// Indexing and slicing
// ============================================================================

/// Normalize a possibly negative index against `len`
fn index_in(n: f64, len: usize) -> Option<usize> {
    let mut i = n as i64;
    if i < 0 {
        i += len as i64;
    }
    (0..len as i64).contains(&i).then_some(i as usize)
}

/// Clamp a `[start, stop]` key to a half-open range over `len` items.
/// None endpoints default to the whole sequence.
pub fn slice_bounds(key: &ListRef, len: usize) -> InterpResult<(usize, usize)> {
    let key = key.borrow();
    let bound = |i: usize, default: i64| -> InterpResult<i64> {
        match key.get(i) {
            Some(Value::Number(n)) => Ok(*n as i64),
            Some(Value::None) | None => Ok(default),
            Some(_) => Err(RuntimeError::type_error("slice indices must be numbers")),
        }
    };

    let l = len as i64;
    let start = bound(0, 0)?;
    let stop = bound(1, l)?;
    let start = (if start < 0 { l + start } else { start }).clamp(0, l);
    let stop = (if stop < 0 { l + stop } else { stop }).min(l).max(start);
    Ok((start as usize, stop as usize))
}

// ============================================================================
// Strings
// ============================================================================

/// `s[key]` for strings
pub fn string_get(s: &Rc<[u8]>, key: &Value) -> InterpResult<Value> {
    match key {
        Value::Number(n) => match index_in(*n, s.len()) {
            Some(i) => Ok(Value::str(&s[i..=i])),
            None => Err(RuntimeError::key_error(format!(
                "string index {} out of range",
                key
            ))),
        },
        Value::Str(name) => {
            let this = Value::Str(Rc::clone(s));
            let method = match name.as_ref() {
                b"join" => Value::method("join", str_join, this),
                b"split" => Value::method("split", str_split, this),
                b"index" => Value::method("index", str_index, this),
                b"strip" => Value::method("strip", str_strip, this),
                b"replace" => Value::method("replace", str_replace, this),
                _ => {
                    return Err(RuntimeError::type_error(format!(
                        "string has no attribute {key}"
                    )))
                }
            };
            Ok(method)
        }
        Value::List(range) => {
            let (start, stop) = slice_bounds(range, s.len())?;
            Ok(Value::str(&s[start..stop]))
        }
        other => Err(RuntimeError::type_error(format!(
            "string indices must be numbers, got {}",
            other.type_name()
        ))),
    }
}

fn str_join(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let delim = str_at(&args, 0)?;
    let items = list_at(&args, 1)?;
    let mut out = Vec::new();
    for (i, item) in items.borrow().iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(&delim);
        }
        out.extend_from_slice(&item.to_bytes());
    }
    Ok(Value::str(out))
}

fn str_split(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let s = str_at(&args, 0)?;
    let sep = str_at(&args, 1)?;
    if sep.is_empty() {
        return Err(RuntimeError::value_error("empty separator"));
    }
    let pieces = split_bytes(&s, &sep).into_iter().map(Value::str).collect();
    Ok(Value::list(pieces))
}

fn str_index(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let s = str_at(&args, 0)?;
    let needle = str_at(&args, 1)?;
    find_bytes(&s, &needle)
        .map(|at| Value::Number(at as f64))
        .ok_or_else(|| RuntimeError::value_error("substring not found"))
}

fn str_strip(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let s = str_at(&args, 0)?;
    Ok(Value::str(trim_bytes(&s)))
}

fn str_replace(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let s = str_at(&args, 0)?;
    let from = str_at(&args, 1)?;
    let to = str_at(&args, 2)?;
    Ok(Value::str(replace_bytes(&s, &from, &to)))
}

// ============================================================================
// Lists
// ============================================================================

/// `list[key]` for lists
pub fn list_get(list: &ListRef, key: &Value) -> InterpResult<Value> {
    match key {
        Value::Number(n) => {
            let items = list.borrow();
            match index_in(*n, items.len()) {
                Some(i) => Ok(items[i].clone()),
                None => Err(RuntimeError::key_error(format!(
                    "list index {key} out of range"
                ))),
            }
        }
        Value::Str(name) if name.as_ref() == b"*" => {
            // Reading "*" hands over the contents and empties the list
            let items = std::mem::take(&mut *list.borrow_mut());
            trace!(len = items.len(), "list drained");
            Ok(Value::list(items))
        }
        Value::Str(name) => {
            let this = Value::List(Rc::clone(list));
            let method = match name.as_ref() {
                b"append" => Value::method("append", list_append, this),
                b"pop" => Value::method("pop", list_pop, this),
                b"index" => Value::method("index", list_index, this),
                b"sort" => Value::method("sort", list_sort, this),
                b"extend" => Value::method("extend", list_extend, this),
                _ => {
                    return Err(RuntimeError::type_error(format!(
                        "list has no attribute {key}"
                    )))
                }
            };
            Ok(method)
        }
        Value::None => {
            let mut items = list.borrow_mut();
            if items.is_empty() {
                return Err(RuntimeError::key_error("pop from empty list"));
            }
            Ok(items.remove(0))
        }
        Value::List(range) => {
            let items = list.borrow();
            let (start, stop) = slice_bounds(range, items.len())?;
            Ok(Value::list(items[start..stop].to_vec()))
        }
        other => Err(RuntimeError::type_error(format!(
            "list indices must be numbers, got {}",
            other.type_name()
        ))),
    }
}

/// `list[key] = value`
pub fn list_set(list: &ListRef, key: &Value, value: Value) -> InterpResult<()> {
    match key {
        Value::Number(n) => {
            let mut items = list.borrow_mut();
            let len = items.len();
            match index_in(*n, len) {
                Some(i) => {
                    items[i] = value;
                    Ok(())
                }
                None => Err(RuntimeError::key_error(format!(
                    "list assignment index {key} out of range"
                ))),
            }
        }
        Value::None => {
            list.borrow_mut().push(value);
            Ok(())
        }
        Value::Str(name) if name.as_ref() == b"*" => {
            if let Value::List(other) = &value {
                let extra = other.borrow().clone();
                list.borrow_mut().extend(extra);
            }
            Ok(())
        }
        other => Err(RuntimeError::type_error(format!(
            "list does not support item assignment with {} keys",
            other.type_name()
        ))),
    }
}

/// Membership test used by HAS on lists
pub fn list_contains(list: &ListRef, value: &Value) -> bool {
    list.borrow().iter().any(|item| equals(item, value))
}

fn list_append(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let list = list_at(&args, 0)?;
    let value = arg(&args, 1)?.clone();
    list.borrow_mut().push(value);
    Ok(Value::None)
}

fn list_pop(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let list = list_at(&args, 0)?;
    let popped = list.borrow_mut().pop();
    popped.ok_or_else(|| RuntimeError::key_error("pop from empty list"))
}

fn list_index(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let list = list_at(&args, 0)?;
    let what = arg(&args, 1)?;
    let position = list.borrow().iter().position(|item| equals(item, what));
    match position {
        Some(i) => Ok(Value::Number(i as f64)),
        None => Err(RuntimeError::value_error(format!(
            "list {} does not contain {what}",
            Value::List(Rc::clone(&list))
        ))),
    }
}

fn list_sort(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let list = list_at(&args, 0)?;
    let mut items = std::mem::take(&mut *list.borrow_mut());
    let mut failure = None;
    items.sort_by(|a, b| {
        compare(a, b).unwrap_or_else(|err| {
            failure.get_or_insert(err);
            std::cmp::Ordering::Equal
        })
    });
    *list.borrow_mut() = items;
    match failure {
        Some(err) => Err(err),
        None => Ok(Value::None),
    }
}

fn list_extend(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let list = list_at(&args, 0)?;
    let other = list_at(&args, 1)?;
    let extra = other.borrow().clone();
    list.borrow_mut().extend(extra);
    Ok(Value::None)
}
