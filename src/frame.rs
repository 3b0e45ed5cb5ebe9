// Per-call activation record: local slots, the operand stack, and the
// captured-variable map a closure's body sees. Each call gets its own
// stack, since a call recurses into a nested `execute()` rather than
// jumping within one shared stack.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{RunError, RunResult};
use crate::value::{FunctionData, Value};

pub struct Frame {
    locals: Vec<Value>,
    operand_stack: Vec<Value>,
    captures: Option<Rc<RefCell<HashMap<String, Value>>>>,
    /// Scratch slot a conditional jump's `eval` leaves its popped
    /// condition in, for the matching `do_jump` call to consume.
    branch_cond: Option<bool>,
}

impl Frame {
    pub fn new(symbol_size: usize) -> Self {
        Frame {
            locals: vec![Value::Null; symbol_size],
            operand_stack: Vec::new(),
            captures: None,
            branch_cond: None,
        }
    }

    /// Builds the callee's frame: binds `args` to the first positional
    /// local slots (one per parameter, in declared order), leaves every
    /// other local unset (`Value::Null`), and wires up the function's
    /// captured-variable map if it has one.
    pub fn for_call(function: &FunctionData, args: &[Value], symbol_size: usize) -> Self {
        let mut locals = vec![Value::Null; symbol_size];
        for (slot, arg) in args.iter().enumerate() {
            if slot >= locals.len() {
                break;
            }
            locals[slot] = arg.clone();
        }
        Frame {
            locals,
            operand_stack: Vec::new(),
            captures: function.captures.clone(),
            branch_cond: None,
        }
    }

    pub fn read_local(&self, slot: u16) -> RunResult<Value> {
        self.locals
            .get(slot as usize)
            .cloned()
            .ok_or(RunError::BadSlot(slot))
    }

    pub fn write_local(&mut self, slot: u16, value: Value) -> RunResult<()> {
        let cell = self.locals.get_mut(slot as usize).ok_or(RunError::BadSlot(slot))?;
        *cell = value;
        Ok(())
    }

    pub fn declare_local(&mut self, slot: u16) -> RunResult<()> {
        self.write_local(slot, Value::Null)
    }

    pub fn push(&mut self, value: Value) {
        self.operand_stack.push(value);
    }

    pub fn pop(&mut self) -> RunResult<Value> {
        self.operand_stack.pop().ok_or(RunError::StackUnderflow)
    }

    pub fn peek(&self) -> RunResult<&Value> {
        self.operand_stack.last().ok_or(RunError::StackUnderflow)
    }

    pub fn captures(&self) -> Option<&Rc<RefCell<HashMap<String, Value>>>> {
        self.captures.as_ref()
    }

    pub fn set_branch_cond(&mut self, cond: bool) {
        self.branch_cond = Some(cond);
    }

    pub fn take_branch_cond(&mut self) -> RunResult<bool> {
        self.branch_cond.take().ok_or(RunError::StackUnderflow)
    }
}
