//! Builtin namespace
//!
//! Everything GGET falls back to when a name is missing from the frame's
//! globals: the native functions below, the `object` root prototype, the
//! `MODULES`/`BUILTINS` registries and the `sys` module.

use super::dict::{lookup, Dict};
use super::error::{InterpResult, RuntimeError};
use super::eval::{Interpreter, BOOTSTRAP_MODULE};
use super::methods::{arg, dict_at, function_at, number_at, str_at};
use super::value::{compare, Value};
use std::cmp::Ordering;
use std::path::Path;
use std::rc::Rc;
use std::time::UNIX_EPOCH;

/// Populate `interp`'s builtins and module registries
pub fn register(interp: &mut Interpreter) {
    interp.add_builtin("print", builtin_print);
    interp.add_builtin("range", builtin_range);
    interp.add_builtin("min", builtin_min);
    interp.add_builtin("max", builtin_max);
    interp.add_builtin("bind", builtin_bind);
    interp.add_builtin("copy", builtin_copy);
    interp.add_builtin("import", builtin_import);
    interp.add_builtin("len", builtin_len);
    interp.add_builtin("assert", builtin_assert);
    interp.add_builtin("str", builtin_str);
    interp.add_builtin("float", builtin_number);
    interp.add_builtin("number", builtin_number);
    interp.add_builtin("int", builtin_int);
    interp.add_builtin("abs", builtin_abs);
    interp.add_builtin("round", builtin_round);
    interp.add_builtin("istype", builtin_istype);
    interp.add_builtin("chr", builtin_chr);
    interp.add_builtin("ord", builtin_ord);
    interp.add_builtin("bool", builtin_bool);
    interp.add_builtin("fpack", builtin_fpack);

    // Files
    interp.add_builtin("loadFile", builtin_load_file);
    interp.add_builtin("saveFile", builtin_save_file);
    interp.add_builtin("exists", builtin_exists);
    interp.add_builtin("mtime", builtin_mtime);

    interp.add_builtin("exec", builtin_exec);
    interp.add_builtin("merge", builtin_merge);
    interp.add_builtin("setmeta", builtin_setmeta);
    interp.add_builtin("getmeta", builtin_getmeta);

    interp.set_builtin("object", object_root());

    let builtins = interp.builtins();
    let modules = interp.modules();
    interp.set_builtin("MODULES", Value::Dict(Rc::clone(&modules)));
    interp.set_builtin("BUILTINS", Value::Dict(Rc::clone(&builtins)));
    modules.borrow_mut().set("BUILTINS", Value::Dict(builtins));

    let argv = interp.config().argv.iter().map(Value::str).collect();
    let mut sys = Dict::new();
    sys.set("__name__", Value::str("sys"));
    sys.set("version", Value::str("tinypy"));
    sys.set("argv", Value::list(argv));
    interp.add_module("sys", sys.into_ref());
}

// ============================================================================
// Core
// ============================================================================

fn builtin_print(interp: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let mut out = Vec::new();
    for (i, value) in args.iter().enumerate() {
        if i > 0 {
            out.push(b' ');
        }
        out.extend_from_slice(&value.to_bytes());
    }
    out.push(b'\n');
    interp.write_output(&out)?;
    Ok(Value::None)
}

/// `range(stop)`, `range(start, stop)` or `range(start, stop, step)`
fn builtin_range(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let (start, stop, step) = match args.len() {
        1 => (0, number_at(&args, 0)? as i64, 1),
        2 => (number_at(&args, 0)? as i64, number_at(&args, 1)? as i64, 1),
        3 => (
            number_at(&args, 0)? as i64,
            number_at(&args, 1)? as i64,
            number_at(&args, 2)? as i64,
        ),
        n => {
            return Err(RuntimeError::type_error(format!(
                "range expected 1 to 3 arguments, got {n}"
            )))
        }
    };
    if step == 0 {
        return Err(RuntimeError::value_error("range() step must not be zero"));
    }

    let mut items = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        items.push(Value::Number(i as f64));
        // Stepping past the i64 range ends the sequence
        let Some(next) = i.checked_add(step) else {
            break;
        };
        i = next;
    }
    Ok(Value::list(items))
}

fn pick(args: &[Value], keep: Ordering) -> InterpResult<Value> {
    let mut best = arg(args, 0)?.clone();
    for value in &args[1..] {
        if compare(value, &best)? == keep {
            best = value.clone();
        }
    }
    Ok(best)
}

fn builtin_min(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    pick(&args, Ordering::Less)
}

fn builtin_max(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    pick(&args, Ordering::Greater)
}

/// `bind(f, receiver)`: copy of `f` with a new receiver
fn builtin_bind(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let func = function_at(&args, 0)?;
    let receiver = arg(&args, 1)?.clone();
    Ok(Value::Function(Rc::new(func.bind(receiver))))
}

fn builtin_copy(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    Ok(arg(&args, 0)?.copy())
}

/// Registered modules first, then the bootstrap compiler's `importModule`
fn builtin_import(interp: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let name = str_at(&args, 0)?;
    let key = Value::Str(Rc::clone(&name));
    if let Some(module) = interp.modules().borrow().get(&key) {
        return Ok(module);
    }
    if interp.module(BOOTSTRAP_MODULE).is_none() {
        return Err(RuntimeError::key_error(format!("no module named {key}")));
    }
    interp.call_function_in_module(BOOTSTRAP_MODULE, "importModule", vec![key])
}

fn builtin_len(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let n = arg(&args, 0)?.len()?;
    Ok(Value::Number(n as f64))
}

fn builtin_assert(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    if arg(&args, 0)?.to_bool() {
        Ok(Value::None)
    } else {
        Err(RuntimeError::assertion_failed())
    }
}

fn builtin_str(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    Ok(Value::str(arg(&args, 0)?.to_bytes()))
}

fn builtin_bool(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    Ok(Value::bool(arg(&args, 0)?.to_bool()))
}

// ============================================================================
// Numbers
// ============================================================================

/// Numbers pass through; strings are parsed
fn to_number(args: &[Value]) -> InterpResult<f64> {
    match arg(args, 0)? {
        Value::Number(n) => Ok(*n),
        Value::Str(s) => {
            let text = String::from_utf8_lossy(s);
            text.trim().parse::<f64>().map_err(|_| {
                RuntimeError::value_error(format!("could not convert string to number: {text}"))
            })
        }
        other => Err(RuntimeError::type_error(format!(
            "cannot convert {} to number",
            other.type_name()
        ))),
    }
}

fn builtin_number(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    Ok(Value::Number(to_number(&args)?))
}

fn builtin_int(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    Ok(Value::Number(to_number(&args)?.trunc()))
}

fn builtin_abs(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    Ok(Value::Number(to_number(&args)?.abs()))
}

/// Half away from zero
fn builtin_round(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    Ok(Value::Number(to_number(&args)?.round()))
}

/// `istype(value, name)` for name in string/list/dict/number/fnc/method
fn builtin_istype(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let value = arg(&args, 0)?;
    let name = str_at(&args, 1)?;
    let matches = match name.as_ref() {
        b"string" => matches!(value, Value::Str(_)),
        b"list" => matches!(value, Value::List(_)),
        b"dict" => matches!(value, Value::Dict(_)),
        b"number" => matches!(value, Value::Number(_)),
        b"fnc" => matches!(value, Value::Function(f) if !f.is_method()),
        b"method" => matches!(value, Value::Function(f) if f.is_method()),
        other => {
            return Err(RuntimeError::type_error(format!(
                "istype: unknown type name {}",
                String::from_utf8_lossy(other)
            )))
        }
    };
    Ok(Value::bool(matches))
}

fn builtin_chr(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let code = number_at(&args, 0)? as i64 as u8;
    Ok(Value::str([code]))
}

fn builtin_ord(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    match str_at(&args, 0)?.as_ref() {
        [byte] => Ok(Value::Number(*byte as f64)),
        _ => Err(RuntimeError::type_error("ord() expected a character")),
    }
}

/// The 8 bytes of a double, as NUMBER payloads store them
fn builtin_fpack(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    Ok(Value::str(number_at(&args, 0)?.to_le_bytes()))
}

// ============================================================================
// Files
// ============================================================================

fn path_at(args: &[Value], index: usize) -> InterpResult<String> {
    Ok(String::from_utf8_lossy(&str_at(args, index)?).into_owned())
}

fn builtin_load_file(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let path = path_at(&args, 0)?;
    std::fs::read(&path)
        .map(Value::str)
        .map_err(|e| RuntimeError::io_error(format!("cannot read {path}: {e}")))
}

fn builtin_save_file(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let path = path_at(&args, 0)?;
    let content = str_at(&args, 1)?;
    std::fs::write(&path, &content)
        .map_err(|e| RuntimeError::io_error(format!("cannot write {path}: {e}")))?;
    Ok(Value::None)
}

fn builtin_exists(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let path = path_at(&args, 0)?;
    Ok(Value::bool(Path::new(&path).exists()))
}

/// Modification time in seconds since the epoch
fn builtin_mtime(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let path = path_at(&args, 0)?;
    let modified = std::fs::metadata(&path)
        .and_then(|meta| meta.modified())
        .map_err(|e| RuntimeError::io_error(format!("cannot stat {path}: {e}")))?;
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Ok(Value::Number(secs as f64))
}

// ============================================================================
// Dicts and prototypes
// ============================================================================

/// `exec(code, globals)`: run a bytecode string in a fresh frame
fn builtin_exec(interp: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let code = str_at(&args, 0)?;
    let globals = dict_at(&args, 1)?;
    interp.run(code, Vec::new(), globals)
}

/// `merge(target, source)`: copy every entry of `source` into `target`
fn builtin_merge(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let target = dict_at(&args, 0)?;
    let entries = dict_at(&args, 1)?.borrow().entries();
    let mut target = target.borrow_mut();
    for (key, value) in entries {
        target.insert(key, value);
    }
    Ok(Value::None)
}

fn builtin_setmeta(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let dict = dict_at(&args, 0)?;
    let meta = dict_at(&args, 1)?;
    dict.borrow_mut().meta = Some(meta);
    Ok(Value::None)
}

fn builtin_getmeta(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let dict = dict_at(&args, 0)?;
    let meta = dict.borrow().meta.clone();
    Ok(meta.map(Value::Dict).unwrap_or_default())
}

/// Root prototype every class chains to
fn object_root() -> Value {
    let mut root = Dict::object();
    root.set("__call__", Value::native("__call__", object_call));
    root.set("__new__", Value::native("__new__", object_new));
    Value::Dict(root.into_ref())
}

/// `object()` or `object(fields)`: a new instance, optionally pre-filled
fn object_call(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let mut instance = Dict::object();
    if !args.is_empty() {
        for (key, value) in dict_at(&args, 0)?.borrow().entries() {
            instance.insert(key, value);
        }
    }
    Ok(Value::Dict(instance.into_ref()))
}

/// `Class(*args)`: instance with `meta = Class`, then `__init__(*args)`
fn object_new(interp: &mut Interpreter, mut args: Vec<Value>) -> InterpResult<Value> {
    let class = dict_at(&args, 0)?;
    args.remove(0);
    let instance = Dict::instance_of(class).into_ref();
    if let Some(init) = lookup(&instance, &Value::str("__init__"))? {
        interp.call(&init, args)?;
    }
    Ok(Value::Dict(instance))
}
