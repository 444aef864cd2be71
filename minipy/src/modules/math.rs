//! `math` module
//!
//! Thin bindings over `f64`. A finite input that produces a NaN or infinite
//! result is reported as a ValueError, the way a C library reports EDOM or
//! ERANGE.

use crate::interp::{number_at, Dict, InterpResult, Interpreter, NativeFn, RuntimeError, Value};
use crate::util::format_number;
use std::f64::consts::{E, PI};

/// Register the module under `math`
pub fn register(interp: &mut Interpreter) {
    let mut module = Dict::new();
    module.set("__name__", Value::str("math"));
    module.set("pi", Value::Number(PI));
    module.set("e", Value::Number(E));

    for &(name, func) in FUNCTIONS {
        module.set(name, Value::native(name, func));
    }
    interp.add_module("math", module.into_ref());
}

const FUNCTIONS: &[(&'static str, NativeFn)] = &[
    ("acos", math_acos),
    ("asin", math_asin),
    ("atan", math_atan),
    ("ceil", math_ceil),
    ("cos", math_cos),
    ("cosh", math_cosh),
    ("degrees", math_degrees),
    ("exp", math_exp),
    ("fabs", math_fabs),
    ("floor", math_floor),
    ("log10", math_log10),
    ("radians", math_radians),
    ("sin", math_sin),
    ("sinh", math_sinh),
    ("sqrt", math_sqrt),
    ("tan", math_tan),
    ("tanh", math_tanh),
    ("atan2", math_atan2),
    ("fmod", math_fmod),
    ("hypot", math_hypot),
    ("ldexp", math_ldexp),
    ("pow", math_pow),
    ("frexp", math_frexp),
    ("modf", math_modf),
    ("log", math_log),
];

fn checked(name: &str, inputs: &[f64], result: f64) -> InterpResult<Value> {
    if !result.is_finite() && inputs.iter().all(|x| x.is_finite()) {
        let shown: Vec<String> = inputs.iter().map(|x| format_number(*x)).collect();
        return Err(RuntimeError::value_error(format!(
            "{name}({}) out of range",
            shown.join(", ")
        )));
    }
    Ok(Value::Number(result))
}

macro_rules! unary {
    ($($fn_name:ident => $name:literal, $op:expr;)*) => {
        $(
            fn $fn_name(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
                let x = number_at(&args, 0)?;
                let op: fn(f64) -> f64 = $op;
                checked($name, &[x], op(x))
            }
        )*
    };
}

macro_rules! binary {
    ($($fn_name:ident => $name:literal, $op:expr;)*) => {
        $(
            fn $fn_name(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
                let x = number_at(&args, 0)?;
                let y = number_at(&args, 1)?;
                let op: fn(f64, f64) -> f64 = $op;
                checked($name, &[x, y], op(x, y))
            }
        )*
    };
}

unary! {
    math_acos => "acos", f64::acos;
    math_asin => "asin", f64::asin;
    math_atan => "atan", f64::atan;
    math_ceil => "ceil", f64::ceil;
    math_cos => "cos", f64::cos;
    math_cosh => "cosh", f64::cosh;
    math_degrees => "degrees", f64::to_degrees;
    math_exp => "exp", f64::exp;
    math_fabs => "fabs", f64::abs;
    math_floor => "floor", f64::floor;
    math_log10 => "log10", f64::log10;
    math_radians => "radians", f64::to_radians;
    math_sin => "sin", f64::sin;
    math_sinh => "sinh", f64::sinh;
    math_sqrt => "sqrt", f64::sqrt;
    math_tan => "tan", f64::tan;
    math_tanh => "tanh", f64::tanh;
}

binary! {
    math_atan2 => "atan2", f64::atan2;
    math_fmod => "fmod", |x, y| x % y;
    math_hypot => "hypot", f64::hypot;
    math_ldexp => "ldexp", ldexp;
    math_pow => "pow", f64::powf;
}

fn ldexp(x: f64, exp: f64) -> f64 {
    x * 2f64.powi(exp as i32)
}

/// Split into mantissa in `[0.5, 1)` and a power of two
fn frexp(x: f64) -> (f64, i32) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }
    let bits = x.to_bits();
    let exp = ((bits >> 52) & 0x7ff) as i32;
    if exp == 0 {
        // Subnormal: scale into the normal range first
        let (m, e) = frexp(x * 2f64.powi(54));
        return (m, e - 54);
    }
    let mantissa = f64::from_bits((bits & !(0x7ffu64 << 52)) | (1022u64 << 52));
    (mantissa, exp - 1022)
}

/// `frexp(x)` -> `[mantissa, exponent]`
fn math_frexp(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let (mantissa, exp) = frexp(number_at(&args, 0)?);
    Ok(Value::list(vec![Value::Number(mantissa), Value::Number(exp as f64)]))
}

/// `modf(x)` -> `[fraction, integer]`
fn math_modf(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let x = number_at(&args, 0)?;
    Ok(Value::list(vec![Value::Number(x.fract()), Value::Number(x.trunc())]))
}

/// `log(x[, base])`, natural by default
fn math_log(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    let x = number_at(&args, 0)?;
    let base = if args.len() >= 2 { number_at(&args, 1)? } else { E };
    checked("log", &[x, base], x.log10() / base.log10())
}
