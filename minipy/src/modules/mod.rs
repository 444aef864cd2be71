//! Host modules importable from scripts

pub mod math;

use crate::interp::Interpreter;

/// Register every host module with `interp`
pub fn register_all(interp: &mut Interpreter) {
    math::register(interp);
}
