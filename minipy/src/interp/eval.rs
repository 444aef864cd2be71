//! Bytecode evaluator
//!
//! The driver loop repeatedly runs `step`, which executes instructions of
//! the top frame until it calls, returns or fails. CALL to a bytecode
//! function pushes a frame and yields back to the driver instead of
//! recursing. Native code that needs to call back into bytecode (hooks,
//! `exec`, `import`) starts a nested driver that only runs and unwinds the
//! frames it pushed.

use super::builtins;
use super::dict::{lookup, Dict, DictRef, MAX_LOOKUP_DEPTH};
use super::error::{InterpResult, RuntimeError, TraceEntry};
use super::frame::{CallStack, Continuation, Frame, Registers};
use super::ops;
use super::value::{compare, equals, Function, FunctionKind, Value};
use crate::bytecode::instruction::{
    relative_target, string_block_len, Instruction, NUMBER_PAYLOAD, WORD,
};
use crate::bytecode::OpCode;
use crate::config::EngineConfig;
use std::cmp::Ordering;
use std::io::Write;
use std::rc::Rc;
use tracing::{debug, trace};

/// Stack growth parameters for nested drivers
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Name the compiler module is registered under
pub const BOOTSTRAP_MODULE: &str = "bootstrap";

/// Where `print` and DEBUG write
#[derive(Debug)]
enum Output {
    Stdout,
    Buffer(Vec<u8>),
}

/// Outcome of starting a call
enum Invocation {
    /// Native callee finished immediately
    Done(Value),
    /// A bytecode frame was pushed; the driver will finish it
    Pushed,
}

/// The interpreter
pub struct Interpreter {
    config: EngineConfig,
    /// Global fallback namespace consulted by GGET
    builtins: DictRef,
    /// Module registry consulted by `import`
    modules: DictRef,
    stack: CallStack,
    /// Result of the last frame popped with a host continuation
    returned: Option<Value>,
    output: Output,
}

impl Interpreter {
    /// Create an interpreter with the default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an interpreter with builtins and host modules registered
    pub fn with_config(config: EngineConfig) -> Self {
        let mut interp = Interpreter {
            config,
            builtins: Dict::new().into_ref(),
            modules: Dict::new().into_ref(),
            stack: CallStack::new(),
            returned: None,
            output: Output::Stdout,
        };
        builtins::register(&mut interp);
        crate::modules::register_all(&mut interp);
        interp
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn builtins(&self) -> DictRef {
        Rc::clone(&self.builtins)
    }

    pub fn modules(&self) -> DictRef {
        Rc::clone(&self.modules)
    }

    /// Current call depth
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Register a native function in the builtins namespace
    pub fn add_builtin(&mut self, name: &'static str, func: super::value::NativeFn) {
        self.builtins.borrow_mut().set(name, Value::native(name, func));
    }

    /// Bind any value in the builtins namespace
    pub fn set_builtin(&mut self, name: &str, value: Value) {
        self.builtins.borrow_mut().set(name, value);
    }

    /// Register a module so `import` finds it without the compiler
    pub fn add_module(&mut self, name: &str, module: DictRef) {
        debug!(module = name, "registering module");
        self.modules.borrow_mut().set(name, Value::Dict(module));
    }

    pub fn module(&self, name: &str) -> Option<DictRef> {
        match self.modules.borrow().get(&Value::str(name)) {
            Some(Value::Dict(d)) => Some(d),
            _ => None,
        }
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Send `print` output to an internal buffer instead of stdout
    pub fn capture_output(&mut self) {
        if matches!(self.output, Output::Stdout) {
            self.output = Output::Buffer(Vec::new());
        }
    }

    /// Drain the capture buffer
    pub fn take_output(&mut self) -> Vec<u8> {
        match &mut self.output {
            Output::Buffer(buf) => std::mem::take(buf),
            Output::Stdout => Vec::new(),
        }
    }

    pub(crate) fn write_output(&mut self, bytes: &[u8]) -> InterpResult<()> {
        match &mut self.output {
            Output::Buffer(buf) => {
                buf.extend_from_slice(bytes);
                Ok(())
            }
            Output::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(bytes)
                    .and_then(|_| out.flush())
                    .map_err(|e| RuntimeError::io_error(e.to_string()))
            }
        }
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Run `code` in a fresh frame until it returns.
    ///
    /// `regs` preloads registers from 0. An error no resume point claims
    /// comes back with the trace of every frame it unwound.
    pub fn run(
        &mut self,
        code: impl Into<Rc<[u8]>>,
        regs: Vec<Value>,
        globals: DictRef,
    ) -> InterpResult<Value> {
        let base = self.stack.len();
        let frame = Frame::new(code.into(), globals, Registers::with_inputs(regs), Continuation::Host);
        self.push_frame(frame)?;
        self.drive(base)?;
        Ok(self.returned.take().unwrap_or_default())
    }

    /// Call any callable value from the host
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> InterpResult<Value> {
        let base = self.stack.len();
        match self.invoke(callee.clone(), args, Continuation::Host)? {
            Invocation::Done(value) => Ok(value),
            Invocation::Pushed => {
                self.drive(base)?;
                Ok(self.returned.take().unwrap_or_default())
            }
        }
    }

    /// `modules[module][function](*args)`
    pub fn call_function_in_module(
        &mut self,
        module: &str,
        function: &str,
        args: Vec<Value>,
    ) -> InterpResult<Value> {
        let Some(dict) = self.module(module) else {
            return Err(RuntimeError::key_error(format!("module {module} is not loaded")));
        };
        let callee = self.get_attr(&Value::Dict(dict), &Value::str(function))?;
        self.call(&callee, args)
    }

    /// Run the compiler program and register it as the `bootstrap` module
    pub fn load_bootstrap(&mut self, code: &[u8]) -> InterpResult<Value> {
        debug!(bytes = code.len(), "loading bootstrap module");
        let module = Dict::new().into_ref();
        {
            let mut m = module.borrow_mut();
            m.set("__name__", Value::str(BOOTSTRAP_MODULE));
            m.set("__code__", Value::str(code));
            m.set("__dict__", Value::Dict(Rc::clone(&module)));
        }
        self.add_module(BOOTSTRAP_MODULE, Rc::clone(&module));
        self.run(code, Vec::new(), module)
    }

    /// Source text to bytecode through the bootstrap module's `compileFile`
    pub fn compile(&mut self, source: &[u8], filename: &str) -> InterpResult<Vec<u8>> {
        let result = self.call_function_in_module(
            BOOTSTRAP_MODULE,
            "compileFile",
            vec![Value::str(source), Value::str(filename)],
        )?;
        match result {
            Value::Str(code) => Ok(code.to_vec()),
            other => Err(RuntimeError::type_error(format!(
                "compileFile returned {}, expected string",
                other.type_name()
            ))),
        }
    }

    /// Compile and run `source` against `globals`
    pub fn run_source(
        &mut self,
        source: &[u8],
        globals: DictRef,
        filename: &str,
    ) -> InterpResult<Value> {
        let code = self.compile(source, filename)?;
        self.run(code, Vec::new(), globals)
    }

    // ========================================================================
    // Calls and frames
    // ========================================================================

    /// Start a call. Natives run to completion here; bytecode functions get a
    /// frame whose result goes to `dest`.
    fn invoke(
        &mut self,
        callee: Value,
        mut args: Vec<Value>,
        dest: Continuation,
    ) -> InterpResult<Invocation> {
        let mut callee = callee;
        // Dict hooks may resolve to further dicts; bound like a meta chain
        for _ in 0..MAX_LOOKUP_DEPTH {
            match callee {
                Value::Function(func) => {
                    if let Some(receiver) = &func.receiver {
                        args.insert(0, receiver.clone());
                    }
                    return match &func.kind {
                        FunctionKind::Native { func: native, .. } => {
                            Ok(Invocation::Done(native(self, args)?))
                        }
                        FunctionKind::Bytecode { code, globals } => {
                            let regs = Registers::with_inputs(vec![Value::list(args)]);
                            let frame = Frame::new(Rc::clone(code), Rc::clone(globals), regs, dest);
                            self.push_frame(frame)?;
                            Ok(Invocation::Pushed)
                        }
                    };
                }
                Value::Dict(dict) => {
                    let is_object = dict.borrow().is_object();
                    let hook_name = if is_object { "__call__" } else { "__new__" };
                    let Some(hook) = lookup(&dict, &Value::str(hook_name))? else {
                        return Err(RuntimeError::type_error(format!(
                            "{} is not callable",
                            Value::Dict(dict).type_name()
                        )));
                    };
                    if !is_object {
                        args.insert(0, Value::Dict(dict));
                    }
                    callee = hook;
                }
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "{} is not callable",
                        other.type_name()
                    )))
                }
            }
        }
        Err(RuntimeError::runtime("maximum lookup depth exceeded"))
    }

    fn push_frame(&mut self, frame: Frame) -> InterpResult<()> {
        if self.stack.len() >= self.config.max_call_depth {
            return Err(RuntimeError::runtime("maximum call depth exceeded"));
        }
        self.stack.push(frame);
        trace!(depth = self.stack.len(), "push frame");
        Ok(())
    }

    /// Pop the top frame and deliver its result
    fn pop_frame(&mut self, value: Value) -> InterpResult<()> {
        let frame = self.stack.pop().ok_or_else(empty_stack)?;
        trace!(name = %frame.name, depth = self.stack.len(), "pop frame");
        match frame.dest {
            Continuation::Register(r) => self.set_reg(r as usize, value),
            Continuation::Host => {
                self.returned = Some(value);
                Ok(())
            }
        }
    }

    /// Run frames above `base` until they are all gone
    fn drive(&mut self, base: usize) -> InterpResult<()> {
        // Grow stack if we're running low
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            while self.stack.len() > base {
                if let Err(err) = self.step() {
                    self.unwind(base, err)?;
                }
            }
            Ok(())
        })
    }

    /// Resume at the innermost marker above `base`, or discard every frame
    /// above `base` and hand the error back with their trace
    fn unwind(&mut self, base: usize, mut err: RuntimeError) -> InterpResult<()> {
        while self.stack.len() > base {
            if let Some(frame) = self.stack.top_mut() {
                if let Some(target) = frame.resume_at.take() {
                    debug!(frame = %frame.name, target, error = %err, "resuming at marker");
                    frame.cursor = target;
                    return Ok(());
                }
            }
            if let Some(frame) = self.stack.pop() {
                err.trace.push(TraceEntry::from(&frame));
            }
        }
        debug!(error = %err, frames = err.trace.len(), "error left driver");
        Err(err)
    }

    // ========================================================================
    // Registers
    // ========================================================================

    fn frame(&self) -> InterpResult<&Frame> {
        self.stack.top().ok_or_else(empty_stack)
    }

    fn frame_mut(&mut self) -> InterpResult<&mut Frame> {
        self.stack.top_mut().ok_or_else(empty_stack)
    }

    fn reg(&self, index: usize) -> InterpResult<Value> {
        Ok(self.frame()?.regs.get(index))
    }

    fn set_reg(&mut self, index: usize, value: Value) -> InterpResult<()> {
        self.frame_mut()?.regs.set(index, value);
        Ok(())
    }

    /// Payload bytes following the current instruction
    fn payload(&self, len: usize) -> InterpResult<Rc<[u8]>> {
        let frame = self.frame()?;
        frame
            .code
            .get(frame.cursor..frame.cursor + len)
            .map(Rc::from)
            .ok_or_else(|| RuntimeError::runtime("instruction payload runs past end of code"))
    }

    fn skip(&mut self, bytes: usize) -> InterpResult<()> {
        self.frame_mut()?.cursor += bytes;
        Ok(())
    }

    fn jump(&mut self, offset: i16) -> InterpResult<()> {
        let frame = self.frame_mut()?;
        frame.cursor = relative_target(frame.cursor, offset as i64)
            .ok_or_else(|| RuntimeError::runtime("jump before start of code"))?;
        Ok(())
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Execute the top frame until it calls, returns, exhausts or fails
    fn step(&mut self) -> InterpResult<()> {
        loop {
            let ins = {
                let frame = self.frame_mut()?;
                match Instruction::decode(&frame.code, frame.cursor) {
                    Some(ins) => {
                        frame.cursor += WORD;
                        ins
                    }
                    // Running off the end behaves like EOF
                    None => return self.pop_frame(Value::None),
                }
            };
            let Some(op) = OpCode::from_u8(ins.op) else {
                return Err(RuntimeError::runtime(format!(
                    "invalid instruction {}",
                    ins.op
                )));
            };
            let (a, b, c) = (ins.a as usize, ins.b as usize, ins.c as usize);

            match op {
                OpCode::Eof => return self.pop_frame(Value::None),

                OpCode::Add
                | OpCode::Sub
                | OpCode::Mul
                | OpCode::Div
                | OpCode::Pow
                | OpCode::BitAnd
                | OpCode::BitOr
                | OpCode::BitXor
                | OpCode::Mod
                | OpCode::Lsh
                | OpCode::Rsh => {
                    let value = ops::binary(op, &self.reg(b)?, &self.reg(c)?)?;
                    self.set_reg(a, value)?;
                }

                OpCode::Cmp => {
                    let n = match compare(&self.reg(b)?, &self.reg(c)?)? {
                        Ordering::Less => -1.0,
                        Ordering::Equal => 0.0,
                        Ordering::Greater => 1.0,
                    };
                    self.set_reg(a, Value::Number(n))?;
                }
                OpCode::Eq | OpCode::Ne => {
                    let same = equals(&self.reg(b)?, &self.reg(c)?);
                    self.set_reg(a, Value::bool(same == (op == OpCode::Eq)))?;
                }
                OpCode::Le => {
                    let ord = compare(&self.reg(b)?, &self.reg(c)?)?;
                    self.set_reg(a, Value::bool(ord != Ordering::Greater))?;
                }
                OpCode::Lt => {
                    let ord = compare(&self.reg(b)?, &self.reg(c)?)?;
                    self.set_reg(a, Value::bool(ord == Ordering::Less))?;
                }

                OpCode::Not => {
                    let v = !self.reg(b)?.to_bool();
                    self.set_reg(a, Value::bool(v))?;
                }
                OpCode::BitNot => {
                    let v = ops::bit_not(&self.reg(b)?)?;
                    self.set_reg(a, v)?;
                }

                OpCode::Pass | OpCode::Regs => {}

                OpCode::If => {
                    if self.reg(a)?.to_bool() {
                        self.skip(WORD)?;
                    }
                }
                OpCode::IfN => {
                    if !self.reg(a)?.to_bool() {
                        self.skip(WORD)?;
                    }
                }
                OpCode::Jump => self.jump(ins.offset())?,
                OpCode::SetJmp => {
                    let offset = ins.offset();
                    let frame = self.frame_mut()?;
                    frame.resume_at = if offset == 0 {
                        None
                    } else {
                        Some(
                            relative_target(frame.cursor, offset as i64)
                                .ok_or_else(|| RuntimeError::runtime("resume point before start of code"))?,
                        )
                    };
                }

                OpCode::Get => {
                    let (obj, key) = (self.reg(b)?, self.reg(c)?);
                    let v = self.get_attr(&obj, &key)?;
                    self.set_reg(a, v)?;
                }
                OpCode::IGet => {
                    let (obj, key) = (self.reg(b)?, self.reg(c)?);
                    if let Some(v) = self.iget_attr(&obj, &key)? {
                        self.set_reg(a, v)?;
                    }
                }
                OpCode::Set => {
                    let (obj, key, value) = (self.reg(a)?, self.reg(b)?, self.reg(c)?);
                    self.set_attr(&obj, &key, value)?;
                }
                OpCode::Del => {
                    let (obj, key) = (self.reg(a)?, self.reg(b)?);
                    self.del_attr(&obj, &key)?;
                }
                OpCode::Has => {
                    let (obj, key) = (self.reg(b)?, self.reg(c)?);
                    let found = self.has_attr(&obj, &key)?;
                    self.set_reg(a, Value::bool(found))?;
                }
                OpCode::Iter => {
                    let (seq, index) = (self.reg(b)?, self.reg(c)?);
                    if let Some(item) = self.iter_next(&seq, &index)? {
                        self.set_reg(a, item)?;
                        let Value::Number(n) = index else {
                            return Err(RuntimeError::type_error("iteration index must be a number"));
                        };
                        self.set_reg(c, Value::Number(n + 1.0))?;
                        self.skip(WORD)?;
                    }
                }
                OpCode::Len => {
                    let n = self.reg(b)?.len()?;
                    self.set_reg(a, Value::Number(n as f64))?;
                }

                OpCode::Move => {
                    let v = self.reg(b)?;
                    self.set_reg(a, v)?;
                }
                OpCode::None => self.set_reg(a, Value::None)?,
                OpCode::Number => {
                    let bytes = self.payload(NUMBER_PAYLOAD)?;
                    let mut raw = [0u8; NUMBER_PAYLOAD];
                    raw.copy_from_slice(&bytes);
                    self.skip(NUMBER_PAYLOAD)?;
                    self.set_reg(a, Value::Number(f64::from_le_bytes(raw)))?;
                }
                OpCode::String => {
                    let len = ins.immediate() as usize;
                    let text = self.payload(len)?;
                    self.skip(string_block_len(len))?;
                    self.set_reg(a, Value::Str(text))?;
                }
                OpCode::Dict => {
                    let mut dict = Dict::new();
                    for i in (0..c).step_by(2) {
                        dict.insert(self.reg(b + i)?, self.reg(b + i + 1)?);
                    }
                    self.set_reg(a, Value::Dict(dict.into_ref()))?;
                }
                OpCode::List | OpCode::Params => {
                    let items = (b..b + c).map(|r| self.reg(r)).collect::<InterpResult<Vec<_>>>()?;
                    self.set_reg(a, Value::list(items))?;
                }

                OpCode::GGet => {
                    let key = self.reg(b)?;
                    let globals = Rc::clone(&self.frame()?.globals);
                    let local = globals.borrow().get(&key);
                    let value = match local {
                        Some(v) => v,
                        None => {
                            let builtins = Value::Dict(self.builtins());
                            self.get_attr(&builtins, &key)?
                        }
                    };
                    self.set_reg(a, value)?;
                }
                OpCode::GSet => {
                    let globals = Rc::clone(&self.frame()?.globals);
                    let (key, value) = (self.reg(a)?, self.reg(b)?);
                    self.set_attr(&Value::Dict(globals), &key, value)?;
                }
                OpCode::Def => {
                    let body_len = (ins.immediate() as usize).saturating_sub(1) * WORD;
                    let code = self.payload(body_len)?;
                    self.skip(body_len)?;
                    let globals = Rc::clone(&self.frame()?.globals);
                    let func = Function {
                        kind: FunctionKind::Bytecode { code, globals },
                        receiver: None,
                    };
                    self.set_reg(a, Value::Function(Rc::new(func)))?;
                }

                OpCode::Call => {
                    let callee = self.reg(b)?;
                    let args = match self.reg(c)? {
                        Value::List(l) => l.borrow().clone(),
                        other => {
                            return Err(RuntimeError::type_error(format!(
                                "call arguments must be a list, got {}",
                                other.type_name()
                            )))
                        }
                    };
                    if let Invocation::Done(v) =
                        self.invoke(callee, args, Continuation::Register(ins.a))?
                    {
                        self.set_reg(a, v)?;
                    }
                    return Ok(());
                }
                OpCode::Return => {
                    let v = self.reg(a)?;
                    return self.pop_frame(v);
                }
                OpCode::Raise => return Err(RuntimeError::raised(self.reg(a)?)),

                OpCode::Debug => {
                    let text = format!("DEBUG: {a} {}\n", self.reg(a)?);
                    self.write_output(text.as_bytes())?;
                }
                OpCode::Line => {
                    let words = a * WORD;
                    let text = self.payload(words)?;
                    self.skip(words)?;
                    let text = text.split(|byte| *byte == 0).next().unwrap_or(&[]);
                    let line = String::from_utf8_lossy(text).into_owned();
                    let frame = self.frame_mut()?;
                    frame.line = line;
                    frame.lineno = ins.immediate();
                }
                OpCode::File => {
                    let name = self.reg(a)?.to_string();
                    self.frame_mut()?.filename = name;
                }
                OpCode::Name => {
                    let name = self.reg(a)?.to_string();
                    self.frame_mut()?.name = name;
                }
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_stack() -> RuntimeError {
    RuntimeError::runtime("call stack is empty")
}
