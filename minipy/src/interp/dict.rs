//! Dictionaries and the prototype chain
//!
//! A dict maps keys to values, ordered by key hash. An optional `meta` link
//! points at a parent dict, which is how classes and inheritance work:
//! `lookup` walks the chain, `get` only looks at local entries.

use super::error::{InterpResult, RuntimeError};
use super::value::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Shared reference to a dict
pub type DictRef = Rc<RefCell<Dict>>;

/// Longest meta chain `lookup` will follow
pub const MAX_LOOKUP_DEPTH: usize = 8;

/// Key/value mapping with an optional prototype
#[derive(Clone, Default)]
pub struct Dict {
    /// Entries keyed by the key's hash; two keys with equal hashes are the same key
    entries: BTreeMap<i32, (Value, Value)>,
    /// Object instance rather than a plain namespace
    is_object: bool,
    /// Prototype consulted by `lookup` on a local miss
    pub meta: Option<DictRef>,
}

impl Dict {
    /// Create an empty plain dict
    pub fn new() -> Self {
        Dict::default()
    }

    /// Create an empty object instance
    pub fn object() -> Self {
        Dict {
            is_object: true,
            ..Dict::default()
        }
    }

    /// Create an object instance whose prototype is `meta`
    pub fn instance_of(meta: DictRef) -> Self {
        Dict {
            is_object: true,
            meta: Some(meta),
            ..Dict::default()
        }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> DictRef {
        Rc::new(RefCell::new(self))
    }

    pub fn is_object(&self) -> bool {
        self.is_object
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Local entry only; the meta chain is not consulted
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries.get(&key.compute_hash()).map(|(_, v)| v.clone())
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.entries.contains_key(&key.compute_hash())
    }

    /// Insert or replace; an existing entry keeps its original key
    pub fn insert(&mut self, key: Value, value: Value) {
        self.entries
            .entry(key.compute_hash())
            .and_modify(|entry| entry.1 = value.clone())
            .or_insert((key, value));
    }

    /// Convenience for string keys
    pub fn set(&mut self, name: &str, value: Value) {
        self.insert(Value::str(name), value);
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.entries.remove(&key.compute_hash()).map(|(_, v)| v)
    }

    /// Keys in hash order
    pub fn keys(&self) -> Vec<Value> {
        self.entries.values().map(|(k, _)| k.clone()).collect()
    }

    /// The `n`th key in hash order (ITER over a dict)
    pub fn nth_key(&self, n: usize) -> Option<Value> {
        self.entries.values().nth(n).map(|(k, _)| k.clone())
    }

    /// Entries in hash order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.values().map(|(k, v)| (k, v))
    }

    /// Snapshot of all entries, for merges that may alias the target
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.entries.values().cloned().collect()
    }

    /// Fresh dict with the same entries and a copied prototype chain
    pub fn copy(&self) -> Dict {
        self.copy_at(0)
    }

    fn copy_at(&self, depth: usize) -> Dict {
        let meta = match &self.meta {
            Some(meta) if depth + 1 < MAX_LOOKUP_DEPTH => {
                Some(meta.borrow().copy_at(depth + 1).into_ref())
            }
            Some(meta) => Some(Rc::clone(meta)),
            None => None,
        };
        Dict {
            entries: self.entries.clone(),
            is_object: self.is_object,
            meta,
        }
    }
}

impl fmt::Debug for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dict")
            .field("len", &self.entries.len())
            .field("is_object", &self.is_object)
            .field("has_meta", &self.meta.is_some())
            .finish()
    }
}

/// Resolve `key` through `dict` and its meta chain.
///
/// A function found in an ancestor is rebound to the nearest object
/// instance between the querying dict and the dict that holds it, so
/// methods found through a class receive the instance. Local hits are
/// returned as stored.
pub fn lookup(dict: &DictRef, key: &Value) -> InterpResult<Option<Value>> {
    let mut visited: Vec<DictRef> = Vec::new();
    let mut current = Rc::clone(dict);

    loop {
        let (found, meta) = {
            let d = current.borrow();
            (d.get(key), d.meta.clone())
        };

        if let Some(value) = found {
            return Ok(Some(rebind(value, &visited)));
        }

        visited.push(current);
        let Some(meta) = meta else {
            return Ok(None);
        };
        if visited.len() >= MAX_LOOKUP_DEPTH {
            return Err(RuntimeError::runtime("maximum lookup depth exceeded"));
        }
        current = meta;
    }
}

fn rebind(value: Value, below: &[DictRef]) -> Value {
    let Value::Function(func) = &value else {
        return value;
    };
    match below.iter().find(|d| d.borrow().is_object()) {
        Some(instance) => Value::Function(Rc::new(func.bind(Value::Dict(Rc::clone(instance))))),
        None => value,
    }
}
