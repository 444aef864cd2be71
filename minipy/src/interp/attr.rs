//! Attribute protocol
//!
//! GET/SET/DEL/HAS/IGET/ITER dispatch on the receiver's variant. Object
//! instances consult their `__get__`/`__set__` hooks before plain map access.

use super::dict::{lookup, DictRef};
use super::error::{InterpResult, RuntimeError};
use super::eval::Interpreter;
use super::methods::{list_contains, list_get, list_set, string_get};
use super::value::Value;
use crate::util::find_bytes;
use std::rc::Rc;

impl Interpreter {
    /// `obj[key]`
    pub fn get_attr(&mut self, obj: &Value, key: &Value) -> InterpResult<Value> {
        match obj {
            Value::Str(s) => string_get(s, key),
            Value::List(l) => list_get(l, key),
            Value::Dict(d) => self.dict_get(d, key),
            other => Err(RuntimeError::type_error(format!(
                "{} is not subscriptable",
                other.type_name()
            ))),
        }
    }

    fn dict_get(&mut self, dict: &DictRef, key: &Value) -> InterpResult<Value> {
        if let Some(hook) = self.hook(dict, "__get__")? {
            return self.call(&hook, vec![key.clone()]);
        }
        if let Some(value) = lookup(dict, key)? {
            return Ok(value);
        }
        let keys: Vec<String> = dict.borrow().keys().iter().map(Value::to_string).collect();
        Err(RuntimeError::key_error(format!(
            "{key} not in {{{}}}",
            keys.join(",")
        )))
    }

    /// `obj[key] = value`
    pub fn set_attr(&mut self, obj: &Value, key: &Value, value: Value) -> InterpResult<()> {
        match obj {
            Value::Dict(d) => {
                if let Some(hook) = self.hook(d, "__set__")? {
                    self.call(&hook, vec![key.clone(), value])?;
                    return Ok(());
                }
                let merge_from = match (key, &value) {
                    (Value::Str(name), Value::Dict(source)) if name.as_ref() == b"*" => {
                        Some(Rc::clone(source))
                    }
                    _ => None,
                };
                match merge_from {
                    Some(source) => {
                        let entries = source.borrow().entries();
                        let mut target = d.borrow_mut();
                        for (k, v) in entries {
                            target.insert(k, v);
                        }
                    }
                    None => d.borrow_mut().insert(key.clone(), value),
                }
                Ok(())
            }
            Value::List(l) => list_set(l, key, value),
            other => Err(RuntimeError::type_error(format!(
                "{} does not support item assignment",
                other.type_name()
            ))),
        }
    }

    /// `del obj[key]`
    pub fn del_attr(&mut self, obj: &Value, key: &Value) -> InterpResult<()> {
        match obj {
            Value::Dict(d) => {
                let removed = d.borrow_mut().remove(key);
                match removed {
                    Some(_) => Ok(()),
                    None => Err(RuntimeError::key_error(key.to_string())),
                }
            }
            other => Err(RuntimeError::type_error(format!(
                "{} does not support item deletion",
                other.type_name()
            ))),
        }
    }

    /// `key in obj`; dicts only check their own entries
    pub fn has_attr(&mut self, obj: &Value, key: &Value) -> InterpResult<bool> {
        match obj {
            Value::Str(s) => Ok(match key {
                Value::Str(needle) => find_bytes(s, needle).is_some(),
                _ => false,
            }),
            Value::List(l) => Ok(list_contains(l, key)),
            Value::Dict(d) => Ok(d.borrow().contains(key)),
            other => Err(RuntimeError::type_error(format!(
                "argument of type {} is not iterable",
                other.type_name()
            ))),
        }
    }

    /// GET that yields nothing for a dict missing the key or an empty list
    pub fn iget_attr(&mut self, obj: &Value, key: &Value) -> InterpResult<Option<Value>> {
        match obj {
            Value::Dict(d) if !d.borrow().contains(key) => Ok(None),
            Value::List(l) if l.borrow().is_empty() => Ok(None),
            _ => self.get_attr(obj, key).map(Some),
        }
    }

    /// Element `index` of a sequence, or `None` once it is exhausted.
    /// Dicts yield their keys in hash order.
    pub fn iter_next(&mut self, seq: &Value, index: &Value) -> InterpResult<Option<Value>> {
        let Value::Number(n) = index else {
            return Err(RuntimeError::type_error("iteration index must be a number"));
        };
        let position = *n as usize;
        if *n < 0.0 || position >= seq.len()? {
            return Ok(None);
        }
        match seq {
            Value::List(_) | Value::Str(_) => self.get_attr(seq, index).map(Some),
            Value::Dict(d) => Ok(d.borrow().nth_key(position)),
            other => Err(RuntimeError::type_error(format!(
                "iteration over non-sequence {}",
                other.type_name()
            ))),
        }
    }

    /// Hook reachable from an object instance; plain dicts have none
    fn hook(&self, dict: &DictRef, name: &str) -> InterpResult<Option<Value>> {
        if !dict.borrow().is_object() {
            return Ok(None);
        }
        lookup(dict, &Value::str(name))
    }
}
