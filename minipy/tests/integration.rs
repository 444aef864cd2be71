//! Integration tests for the minipy engine
//!
//! Programs are built with the bytecode assembler and run end to end:
//! - Arithmetic, comparisons and control flow
//! - Function definition, calls and recursion limits
//! - Resume points and uncaught traces
//! - Prototype-based objects and builtins

use minipy::bytecode::{disassemble, render, Assembler, OpCode};
use minipy::interp::{compare, lookup, Dict, ErrorKind, InterpResult};
use minipy::{format_uncaught, EngineConfig, Interpreter, Value};
use proptest::prelude::*;
use std::rc::Rc;

/// Helper to run an assembled program against fresh globals
fn run(asm: Assembler) -> InterpResult<Value> {
    let mut interp = Interpreter::new();
    run_in(&mut interp, asm)
}

fn run_in(interp: &mut Interpreter, asm: Assembler) -> InterpResult<Value> {
    let code = asm.finish().expect("program assembles");
    interp.run(code, Vec::new(), Dict::new().into_ref())
}

/// Body that raises `message` after tagging its frame
fn raising_body(filename: &str, name: &str, lineno: u16, message: &str) -> Vec<u8> {
    let mut body = Assembler::new();
    body.string(0, filename)
        .op(OpCode::File, 0, 0, 0)
        .string(0, name)
        .op(OpCode::Name, 0, 0, 0)
        .line(lineno, &format!("raise '{message}'"))
        .string(1, message)
        .op(OpCode::Raise, 1, 0, 0);
    body.finish().expect("body assembles")
}

// ============================================================================
// Expressions and control flow
// ============================================================================

#[test]
fn test_arithmetic_program() {
    // (2 + 3) * 4 - 1
    let mut asm = Assembler::new();
    asm.number(0, 2.0)
        .number(1, 3.0)
        .number(2, 4.0)
        .number(3, 1.0)
        .op(OpCode::Add, 4, 0, 1)
        .op(OpCode::Mul, 4, 4, 2)
        .op(OpCode::Sub, 4, 4, 3)
        .op(OpCode::Return, 4, 0, 0);
    assert_eq!(run(asm).unwrap(), Value::Number(19.0));
}

#[test]
fn test_string_concat_and_len() {
    let mut asm = Assembler::new();
    asm.string(0, "mini")
        .string(1, "py")
        .op(OpCode::Add, 2, 0, 1)
        .op(OpCode::Len, 3, 2, 0)
        .op(OpCode::List, 4, 2, 2)
        .op(OpCode::Return, 4, 0, 0);
    assert_eq!(run(asm).unwrap().to_string(), "[minipy,6]");
}

#[test]
fn test_iter_sums_list() {
    let mut asm = Assembler::new();
    let top = asm.new_label();
    let done = asm.new_label();
    asm.number(5, 1.0)
        .number(6, 2.0)
        .number(7, 3.0)
        .op(OpCode::List, 1, 5, 3)
        .number(0, 0.0)
        .number(2, 0.0);
    asm.bind(top)
        .op(OpCode::Iter, 3, 1, 2)
        .jump(done)
        .op(OpCode::Add, 0, 0, 3)
        .jump(top)
        .bind(done)
        .op(OpCode::Return, 0, 0, 0);
    assert_eq!(run(asm).unwrap(), Value::Number(6.0));
}

#[test]
fn test_iter_over_dict_yields_keys() {
    let mut asm = Assembler::new();
    let top = asm.new_label();
    let done = asm.new_label();
    asm.string(5, "k")
        .number(6, 1.0)
        .op(OpCode::Dict, 1, 5, 2)
        .op(OpCode::List, 0, 0, 0)
        .number(2, 0.0)
        .none(4);
    asm.bind(top)
        .op(OpCode::Iter, 3, 1, 2)
        .jump(done)
        .op(OpCode::Set, 0, 4, 3)
        .jump(top)
        .bind(done)
        .op(OpCode::Return, 0, 0, 0);
    assert_eq!(run(asm).unwrap().to_string(), "[k]");
}

#[test]
fn test_dict_literal_and_has() {
    let mut asm = Assembler::new();
    asm.string(1, "a")
        .number(2, 1.0)
        .string(3, "b")
        .number(4, 2.0)
        .op(OpCode::Dict, 0, 1, 4)
        .op(OpCode::Has, 5, 0, 3)
        .op(OpCode::Del, 0, 3, 0)
        .op(OpCode::Has, 6, 0, 3)
        .op(OpCode::Len, 7, 0, 0)
        .op(OpCode::List, 8, 5, 3)
        .op(OpCode::Return, 8, 0, 0);
    assert_eq!(run(asm).unwrap().to_string(), "[1,0,1]");
}

#[test]
fn test_iget_leaves_destination_untouched() {
    let mut asm = Assembler::new();
    asm.op(OpCode::Dict, 0, 0, 0)
        .string(1, "missing")
        .string(2, "default")
        .op(OpCode::IGet, 2, 0, 1)
        .op(OpCode::Return, 2, 0, 0);
    assert_eq!(run(asm).unwrap(), Value::str("default"));
}

#[test]
fn test_index_and_slice_scenarios() {
    let mut interp = Interpreter::new();
    let list = Value::list(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);

    let last = interp.get_attr(&list, &Value::Number(-1.0)).unwrap();
    assert_eq!(last, Value::Number(3.0));

    let tail = Value::list(vec![Value::Number(1.0), Value::None]);
    let sliced = interp.get_attr(&list, &tail).unwrap();
    assert_eq!(sliced.to_string(), "[2,3]");

    let err = interp
        .set_attr(&list, &Value::Number(5.0), Value::str("v"))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::KeyError);
    assert_eq!(list.len().unwrap(), 3);
}

#[test]
fn test_list_star_read_drains() {
    let mut interp = Interpreter::new();
    let list = Value::list(vec![Value::Number(1.0), Value::Number(2.0)]);
    let moved = interp.get_attr(&list, &Value::str("*")).unwrap();
    assert_eq!(moved.len().unwrap(), 2);
    assert_eq!(list.len().unwrap(), 0);
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_def_and_call() {
    // def add(a, b): return a + b
    let mut body = Assembler::new();
    body.number(3, 0.0)
        .op(OpCode::Get, 1, 0, 3)
        .number(3, 1.0)
        .op(OpCode::Get, 2, 0, 3)
        .op(OpCode::Add, 4, 1, 2)
        .op(OpCode::Return, 4, 0, 0);
    let body = body.finish().unwrap();

    let mut asm = Assembler::new();
    asm.def(0, &body)
        .number(1, 2.0)
        .number(2, 3.0)
        .op(OpCode::List, 3, 1, 2)
        .op(OpCode::Call, 4, 0, 3)
        .number(5, 10.0)
        .op(OpCode::Add, 4, 4, 5)
        .op(OpCode::Return, 4, 0, 0);
    assert_eq!(run(asm).unwrap(), Value::Number(15.0));
}

#[test]
fn test_function_sees_defining_globals() {
    // counter = 41; def bump(): return counter + 1
    let mut body = Assembler::new();
    body.string(1, "counter")
        .op(OpCode::GGet, 2, 1, 0)
        .number(3, 1.0)
        .op(OpCode::Add, 2, 2, 3)
        .op(OpCode::Return, 2, 0, 0);
    let body = body.finish().unwrap();

    let mut asm = Assembler::new();
    asm.string(0, "counter")
        .number(1, 41.0)
        .op(OpCode::GSet, 0, 1, 0)
        .def(2, &body)
        .op(OpCode::Return, 2, 0, 0);

    let mut interp = Interpreter::new();
    let bump = run_in(&mut interp, asm).unwrap();
    assert_eq!(interp.call(&bump, vec![]).unwrap(), Value::Number(42.0));
}

#[test]
fn test_recursion_depth_is_configurable() {
    // def down(n): return 0 if n == 0 else down(n - 1)
    let mut body = Assembler::new();
    let recurse = body.new_label();
    body.number(1, 0.0)
        .op(OpCode::Get, 2, 0, 1)
        .op(OpCode::Eq, 3, 2, 1)
        .op(OpCode::If, 3, 0, 0)
        .jump(recurse)
        .op(OpCode::Return, 1, 0, 0)
        .bind(recurse)
        .number(4, 1.0)
        .op(OpCode::Sub, 5, 2, 4)
        .op(OpCode::List, 6, 5, 1)
        .string(7, "down")
        .op(OpCode::GGet, 8, 7, 0)
        .op(OpCode::Call, 9, 8, 6)
        .op(OpCode::Return, 9, 0, 0);
    let body = body.finish().unwrap();

    let program = |depth: f64| {
        let mut asm = Assembler::new();
        asm.def(0, &body)
            .string(1, "down")
            .op(OpCode::GSet, 1, 0, 0)
            .number(2, depth)
            .op(OpCode::List, 3, 2, 1)
            .op(OpCode::Call, 4, 0, 3)
            .op(OpCode::Return, 4, 0, 0);
        asm
    };

    let config = EngineConfig {
        max_call_depth: 100,
        ..EngineConfig::default()
    };
    let mut interp = Interpreter::with_config(config);
    assert_eq!(run_in(&mut interp, program(50.0)).unwrap(), Value::Number(0.0));

    let err = run_in(&mut interp, program(500.0)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("maximum call depth exceeded"));
    assert_eq!(interp.depth(), 0);

    // Default limit handles deep recursion without exhausting the host stack
    let mut interp = Interpreter::new();
    assert_eq!(run_in(&mut interp, program(3000.0)).unwrap(), Value::Number(0.0));
}

// ============================================================================
// Exceptions
// ============================================================================

#[test]
fn test_setjmp_recovers_in_same_frame() {
    let mut asm = Assembler::new();
    let handler = asm.new_label();
    asm.setjmp(handler)
        .string(0, "boom")
        .op(OpCode::Raise, 0, 0, 0)
        .string(1, "not reached")
        .op(OpCode::Return, 1, 0, 0)
        .bind(handler)
        .string(1, "recovered")
        .op(OpCode::Return, 1, 0, 0);
    assert_eq!(run(asm).unwrap(), Value::str("recovered"));
}

#[test]
fn test_setjmp_discards_callee_frames() {
    let body = raising_body("lib.py", "fail", 1, "deep");
    let mut asm = Assembler::new();
    let handler = asm.new_label();
    asm.setjmp(handler)
        .def(1, &body)
        .op(OpCode::List, 2, 0, 0)
        .op(OpCode::Call, 3, 1, 2)
        .string(4, "not reached")
        .op(OpCode::Return, 4, 0, 0)
        .bind(handler)
        .string(4, "caught")
        .op(OpCode::Return, 4, 0, 0);

    let mut interp = Interpreter::new();
    assert_eq!(run_in(&mut interp, asm).unwrap(), Value::str("caught"));
    assert_eq!(interp.depth(), 0);
}

#[test]
fn test_resume_point_is_consumed() {
    let mut asm = Assembler::new();
    let handler = asm.new_label();
    asm.setjmp(handler)
        .string(0, "first")
        .op(OpCode::Raise, 0, 0, 0)
        .bind(handler)
        .string(0, "second")
        .op(OpCode::Raise, 0, 0, 0);
    let err = run(asm).unwrap_err();
    assert_eq!(err.exception_value(), Value::str("second"));
}

#[test]
fn test_cleared_resume_point() {
    let mut asm = Assembler::new();
    let handler = asm.new_label();
    asm.setjmp(handler)
        .clear_setjmp()
        .string(0, "boom")
        .op(OpCode::Raise, 0, 0, 0)
        .bind(handler)
        .op(OpCode::Return, 0, 0, 0);
    let err = run(asm).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Raised);
}

#[test]
fn test_engine_errors_are_recoverable() {
    // A KeyError from a missing dict key is caught like a raised value
    let mut asm = Assembler::new();
    let handler = asm.new_label();
    asm.setjmp(handler)
        .op(OpCode::Dict, 0, 0, 0)
        .string(1, "nope")
        .op(OpCode::Get, 2, 0, 1)
        .bind(handler)
        .string(2, "handled")
        .op(OpCode::Return, 2, 0, 0);
    assert_eq!(run(asm).unwrap(), Value::str("handled"));
}

#[test]
fn test_uncaught_trace_lists_frames_innermost_first() {
    let body = raising_body("lib.py", "f", 2, "bad");
    let mut asm = Assembler::new();
    asm.string(0, "main.py")
        .op(OpCode::File, 0, 0, 0)
        .string(0, "<module>")
        .op(OpCode::Name, 0, 0, 0)
        .def(1, &body)
        .line(5, "f()")
        .op(OpCode::List, 2, 0, 0)
        .op(OpCode::Call, 3, 1, 2)
        .op(OpCode::Return, 3, 0, 0);

    let mut interp = Interpreter::new();
    let err = run_in(&mut interp, asm).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Raised);
    assert_eq!(err.trace.len(), 2);
    assert_eq!(interp.depth(), 0);
    assert_eq!(
        format_uncaught(&err),
        "Exception:\n\
         filename(lib.py) line(2) name(f) \nraise 'bad'\n\
         filename(main.py) line(5) name(<module>) \nf()\n\
         bad"
    );
}

#[test]
fn test_failure_inside_host_call_propagates() {
    let body = raising_body("cb.py", "callback", 1, "from callback");
    let mut asm = Assembler::new();
    asm.def(0, &body).op(OpCode::Return, 0, 0, 0);

    let mut interp = Interpreter::new();
    let callback = run_in(&mut interp, asm).unwrap();
    let err = interp.call(&callback, vec![]).unwrap_err();
    assert_eq!(err.exception_value(), Value::str("from callback"));
    assert_eq!(err.trace.len(), 1);
    assert_eq!(interp.depth(), 0);
}

// ============================================================================
// Objects and prototypes
// ============================================================================

#[test]
fn test_class_emulation() {
    // def __init__(self, x): self.x = x
    let mut init = Assembler::new();
    init.number(1, 0.0)
        .op(OpCode::Get, 2, 0, 1)
        .number(1, 1.0)
        .op(OpCode::Get, 3, 0, 1)
        .string(4, "x")
        .op(OpCode::Set, 2, 4, 3)
        .none(5)
        .op(OpCode::Return, 5, 0, 0);
    let init = init.finish().unwrap();

    // def get(self): return self.x
    let mut get = Assembler::new();
    get.number(1, 0.0)
        .op(OpCode::Get, 2, 0, 1)
        .string(3, "x")
        .op(OpCode::Get, 4, 2, 3)
        .op(OpCode::Return, 4, 0, 0);
    let get = get.finish().unwrap();

    let mut asm = Assembler::new();
    asm.op(OpCode::Dict, 10, 0, 0)
        .string(1, "setmeta")
        .op(OpCode::GGet, 2, 1, 0)
        .string(1, "object")
        .op(OpCode::GGet, 11, 1, 0)
        .op(OpCode::List, 3, 10, 2)
        .op(OpCode::Call, 4, 2, 3)
        .def(5, &init)
        .string(1, "__init__")
        .op(OpCode::Set, 10, 1, 5)
        .def(5, &get)
        .string(1, "get")
        .op(OpCode::Set, 10, 1, 5)
        .number(12, 5.0)
        .op(OpCode::List, 3, 12, 1)
        .op(OpCode::Call, 6, 10, 3)
        .string(1, "get")
        .op(OpCode::Get, 7, 6, 1)
        .op(OpCode::List, 3, 0, 0)
        .op(OpCode::Call, 8, 7, 3)
        .op(OpCode::List, 9, 6, 3)
        .op(OpCode::Return, 9, 0, 0);

    let result = run(asm).unwrap();
    let Value::List(items) = &result else {
        panic!("expected list, got {result:?}");
    };
    let items = items.borrow();
    assert_eq!(items[0].type_name(), "object");
    assert!(matches!(&items[1], Value::Function(f) if f.is_method()));
    assert_eq!(items[2], Value::Number(5.0));
}

#[test]
fn test_meta_key_visible_to_lookup_not_has() {
    let mut interp = Interpreter::new();
    let mut parent = Dict::new();
    parent.set("x", Value::Number(1.0));
    let parent = parent.into_ref();
    let child = Dict::new().into_ref();
    child.borrow_mut().meta = Some(Rc::clone(&parent));

    let key = Value::str("x");
    assert!(!interp.has_attr(&Value::Dict(Rc::clone(&child)), &key).unwrap());
    assert_eq!(lookup(&child, &key).unwrap(), Some(Value::Number(1.0)));
}

fn hook_get(_: &mut Interpreter, args: Vec<Value>) -> InterpResult<Value> {
    // args: [instance, key]
    let mut name = b"hooked:".to_vec();
    name.extend_from_slice(&args[1].to_bytes());
    Ok(Value::str(name))
}

#[test]
fn test_get_hook_replaces_lookup() {
    let mut interp = Interpreter::new();
    let mut proto = Dict::new();
    proto.set("__get__", Value::native("__get__", hook_get));
    let instance = Value::Dict(Dict::instance_of(proto.into_ref()).into_ref());
    let value = interp.get_attr(&instance, &Value::str("anything")).unwrap();
    assert_eq!(value, Value::str("hooked:anything"));
}

// ============================================================================
// Builtins and modules
// ============================================================================

#[test]
fn test_print_goes_to_capture_buffer() {
    let mut asm = Assembler::new();
    asm.string(0, "print")
        .op(OpCode::GGet, 1, 0, 0)
        .string(2, "x =")
        .number(3, 1000000.0)
        .op(OpCode::List, 4, 2, 2)
        .op(OpCode::Call, 5, 1, 4);

    let mut interp = Interpreter::new();
    interp.capture_output();
    run_in(&mut interp, asm).unwrap();
    assert_eq!(String::from_utf8(interp.take_output()).unwrap(), "x = 1e+06\n");
}

#[test]
fn test_join_method() {
    let mut asm = Assembler::new();
    asm.string(0, "-")
        .string(1, "join")
        .op(OpCode::Get, 2, 0, 1)
        .string(3, "a")
        .string(4, "b")
        .string(5, "c")
        .op(OpCode::List, 6, 3, 3)
        .op(OpCode::List, 7, 6, 1)
        .op(OpCode::Call, 8, 2, 7)
        .op(OpCode::Return, 8, 0, 0);
    assert_eq!(run(asm).unwrap(), Value::str("a-b-c"));
}

#[test]
fn test_range_with_step() {
    let mut asm = Assembler::new();
    asm.string(0, "range")
        .op(OpCode::GGet, 1, 0, 0)
        .number(2, 0.0)
        .number(3, 5.0)
        .number(4, 2.0)
        .op(OpCode::List, 5, 2, 3)
        .op(OpCode::Call, 6, 1, 5)
        .op(OpCode::Return, 6, 0, 0);
    assert_eq!(run(asm).unwrap().to_string(), "[0,2,4]");
}

#[test]
fn test_import_math() {
    let mut asm = Assembler::new();
    asm.string(0, "import")
        .op(OpCode::GGet, 1, 0, 0)
        .string(2, "math")
        .op(OpCode::List, 3, 2, 1)
        .op(OpCode::Call, 4, 1, 3)
        .string(5, "sqrt")
        .op(OpCode::Get, 6, 4, 5)
        .number(7, 81.0)
        .op(OpCode::List, 8, 7, 1)
        .op(OpCode::Call, 9, 6, 8)
        .op(OpCode::Return, 9, 0, 0);
    assert_eq!(run(asm).unwrap(), Value::Number(9.0));
}

#[test]
fn test_exec_runs_against_given_globals() {
    let mut inner = Assembler::new();
    inner.string(0, "answer").number(1, 42.0).op(OpCode::GSet, 0, 1, 0);
    let inner = inner.finish().unwrap();

    let mut asm = Assembler::new();
    asm.string(0, "exec")
        .op(OpCode::GGet, 1, 0, 0)
        .string(2, &inner)
        .op(OpCode::Dict, 3, 0, 0)
        .op(OpCode::List, 4, 2, 2)
        .op(OpCode::Call, 5, 1, 4)
        .string(6, "answer")
        .op(OpCode::Get, 7, 3, 6)
        .op(OpCode::Return, 7, 0, 0);
    assert_eq!(run(asm).unwrap(), Value::Number(42.0));
}

#[test]
fn test_sys_argv_from_config() {
    let config = EngineConfig {
        argv: vec!["script.py".to_string(), "--flag".to_string()],
        ..EngineConfig::default()
    };
    let interp = Interpreter::with_config(config);
    let sys = interp.module("sys").unwrap();
    let argv = sys.borrow().get(&Value::str("argv")).unwrap();
    assert_eq!(argv.to_string(), "[script.py,--flag]");
}

#[test]
fn test_compile_without_bootstrap_fails() {
    let mut interp = Interpreter::new();
    let err = interp.compile(b"print(1)", "main.py").unwrap_err();
    assert_eq!(err.kind, ErrorKind::KeyError);
}

#[test]
fn test_bootstrap_module_compiles_and_imports() {
    // A stand-in compiler: compileFile returns canned bytecode,
    // importModule returns a fresh dict
    let mut payload = Assembler::new();
    payload.string(0, "compiled").op(OpCode::Return, 0, 0, 0);
    let payload = payload.finish().unwrap();

    let mut compile_file = Assembler::new();
    compile_file.string(0, &payload).op(OpCode::Return, 0, 0, 0);
    let compile_file = compile_file.finish().unwrap();

    let mut import_module = Assembler::new();
    import_module
        .number(1, 0.0)
        .op(OpCode::Get, 4, 0, 1)
        .string(3, "__name__")
        .op(OpCode::Dict, 5, 3, 2)
        .op(OpCode::Return, 5, 0, 0);
    let import_module = import_module.finish().unwrap();

    let mut boot = Assembler::new();
    boot.string(0, "compileFile")
        .def(1, &compile_file)
        .op(OpCode::GSet, 0, 1, 0)
        .string(0, "importModule")
        .def(1, &import_module)
        .op(OpCode::GSet, 0, 1, 0);
    let boot = boot.finish().unwrap();

    let mut interp = Interpreter::new();
    interp.load_bootstrap(&boot).unwrap();
    assert_eq!(interp.compile(b"ignored", "x.py").unwrap(), payload);

    let result = interp
        .run_source(b"ignored", Dict::new().into_ref(), "x.py")
        .unwrap();
    assert_eq!(result, Value::str("compiled"));

    let module = interp
        .call_function_in_module("bootstrap", "importModule", vec![Value::str("util")])
        .unwrap();
    let name = interp.get_attr(&module, &Value::str("__name__")).unwrap();
    assert_eq!(name, Value::str("util"));
}

// ============================================================================
// Disassembly
// ============================================================================

#[test]
fn test_disassemble_function_program() {
    let mut body = Assembler::new();
    body.op(OpCode::Return, 0, 0, 0);
    let body = body.finish().unwrap();

    let mut asm = Assembler::new();
    asm.def(0, &body).number(1, 2.5).op(OpCode::Return, 1, 0, 0);
    let code = asm.finish().unwrap();

    let items = disassemble(&code);
    let opcodes: Vec<&str> = items.iter().map(|item| item.opcode).collect();
    assert_eq!(opcodes, ["DEF", "RETURN", "NUMBER", "RETURN"]);
    assert!(render(&items).contains("; 2.5"));
}

// ============================================================================
// Properties
// ============================================================================

fn finite() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |x| x.is_finite())
}

proptest! {
    #[test]
    fn prop_number_compare_antisymmetric(a in finite(), b in finite()) {
        let (x, y) = (Value::Number(a), Value::Number(b));
        prop_assert_eq!(compare(&x, &y).unwrap(), compare(&y, &x).unwrap().reverse());
    }

    #[test]
    fn prop_string_compare_antisymmetric(
        a in prop::collection::vec(any::<u8>(), 0..8),
        b in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let (x, y) = (Value::str(&a), Value::str(&b));
        prop_assert_eq!(compare(&x, &y).unwrap(), compare(&y, &x).unwrap().reverse());
        prop_assert_eq!(compare(&x, &y).unwrap(), a.cmp(&b));
    }

    #[test]
    fn prop_list_compare_antisymmetric(
        a in prop::collection::vec(any::<i8>(), 0..6),
        b in prop::collection::vec(any::<i8>(), 0..6),
    ) {
        let to_list = |items: &[i8]| Value::list(items.iter().map(|n| Value::Number(*n as f64)).collect());
        let (x, y) = (to_list(&a), to_list(&b));
        prop_assert_eq!(compare(&x, &y).unwrap(), compare(&y, &x).unwrap().reverse());
        prop_assert_eq!(compare(&x, &x).unwrap(), std::cmp::Ordering::Equal);
        prop_assert_eq!(compare(&x, &y).unwrap(), a.cmp(&b));
    }

    #[test]
    fn prop_slices_clamp_to_half_open_range(
        bytes in prop::collection::vec(any::<u8>(), 0..16),
        start in -20i64..20,
        stop in -20i64..20,
    ) {
        let mut interp = Interpreter::new();
        let key = Value::list(vec![Value::Number(start as f64), Value::Number(stop as f64)]);
        let text = Value::str(&bytes);
        let list = Value::list(bytes.iter().map(|b| Value::Number(*b as f64)).collect());

        // Negative bounds count from the end; an index is kept when it lies in [start, stop)
        let len = bytes.len() as i64;
        let norm = |i: i64| if i < 0 { i + len } else { i };
        let kept: Vec<u8> = (0..len)
            .filter(|i| norm(start) <= *i && *i < norm(stop))
            .map(|i| bytes[i as usize])
            .collect();

        prop_assert_eq!(interp.get_attr(&text, &key).unwrap(), Value::str(&kept));
        let expected: Vec<Value> = kept.iter().map(|b| Value::Number(*b as f64)).collect();
        prop_assert_eq!(interp.get_attr(&list, &key).unwrap(), Value::list(expected));
    }
}
