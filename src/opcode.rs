// The instruction set. Each opcode implements `eval`, and jump opcodes
// additionally implement `do_jump`. Opcodes are a closed `enum` matched
// in `eval`/`do_jump` rather than one `dyn Trait` object per instruction.

use std::rc::Rc;

use crate::bytecode::Bytecode;
use crate::error::{RunError, RunResult};
use crate::frame::Frame;
use crate::sink::PrintSink;
use crate::value::{self, FunctionData, Value};

/// Bundles everything an opcode's `eval` needs besides the current
/// `Frame`: the output sink `PRINT` writes through.
pub struct ExecContext<'a> {
    pub sink: &'a mut dyn PrintSink,
}

/// Identifies an emitted opcode's position in a [`crate::bytecode::BytecodeBuilder`]
/// so its jump target can be patched in once known (forward jumps for
/// `if`/`while` are emitted before their target pc exists yet).
#[derive(Debug, Clone, Copy)]
pub struct OpcodeHandle(pub usize);

/// One piece of a `LOAD_STRING` literal: either a literal run of text, or
/// an interpolated placeholder that reads a local variable and optionally
/// indexes into it once per bracket. Each index is itself a local slot
/// read in the *same* frame (the AST-to-bytecode compiler that would
/// otherwise lower an arbitrary index expression down to such a slot is
/// out of this crate's scope, so placeholders carry the already-resolved
/// slot directly).
#[derive(Debug, Clone)]
pub enum StringPart {
    Literal(Rc<str>),
    Interp {
        var_slot: u16,
        index_slots: Vec<u16>,
    },
}

#[derive(Debug, Clone)]
pub struct CaptureBinding {
    pub name: Rc<str>,
    pub slot: u16,
}

#[derive(Debug, Clone)]
pub enum Opcode {
    LoadNull,
    LoadBool(bool),
    LoadInt(i64),
    LoadFloat(f64),
    LoadString(Vec<StringPart>),
    LoadVar(u16),
    StoreVar(u16),
    DeclareVar(u16),
    LoadArrayElem,
    StoreArrayElem,
    BuildArray(u16),
    BuildList(u16),
    BuildFunction {
        name: Rc<str>,
        body: Rc<Bytecode>,
        captures: Vec<CaptureBinding>,
    },
    Call(u16),
    Return,
    Print,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Inc(u16),
    Dec(u16),
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Neq,
    Jump(usize),
    JumpIfFalse(usize),
    JumpIfTrue(usize),
}

impl Opcode {
    pub fn is_jump(&self) -> bool {
        matches!(self, Opcode::Jump(_) | Opcode::JumpIfFalse(_) | Opcode::JumpIfTrue(_))
    }

    /// Patches a forward jump's target once it becomes known. Only valid
    /// on jump opcodes; used by `BytecodeBuilder::patch_target`.
    pub fn set_jump_target(&mut self, target_pc: usize) {
        match self {
            Opcode::Jump(t) | Opcode::JumpIfFalse(t) | Opcode::JumpIfTrue(t) => *t = target_pc,
            _ => {}
        }
    }

    /// Executes this opcode's effect: pops/pushes operands on `frame`'s
    /// stack, mutates locals, performs the `PRINT` side effect. Returns
    /// `Some(value)` only for `RETURN`, signaling the dispatch loop to
    /// stop early.
    pub fn eval(&self, frame: &mut Frame, ctx: &mut ExecContext) -> RunResult<Option<Value>> {
        match self {
            Opcode::LoadNull => frame.push(Value::Null),
            Opcode::LoadBool(b) => frame.push(Value::Bool(*b)),
            Opcode::LoadInt(i) => frame.push(Value::Int(*i)),
            Opcode::LoadFloat(f) => frame.push(Value::Float(*f)),
            Opcode::LoadString(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        StringPart::Literal(s) => out.push_str(s),
                        StringPart::Interp { var_slot, index_slots } => {
                            let mut current = frame.read_local(*var_slot)?;
                            for index_slot in index_slots {
                                let index_value = frame.read_local(*index_slot)?;
                                current = current.get(&index_value)?;
                            }
                            out.push_str(&current.str());
                        }
                    }
                }
                frame.push(Value::str_value(out));
            }
            Opcode::LoadVar(slot) => {
                let v = frame.read_local(*slot)?;
                frame.push(v);
            }
            Opcode::StoreVar(slot) => {
                let v = frame.pop()?;
                frame.write_local(*slot, v)?;
            }
            Opcode::DeclareVar(slot) => frame.declare_local(*slot)?,
            Opcode::LoadArrayElem => {
                let index = frame.pop()?;
                let container = frame.pop()?;
                frame.push(container.get(&index)?);
            }
            Opcode::StoreArrayElem => {
                let value = frame.pop()?;
                let index = frame.pop()?;
                let container = frame.pop()?;
                container.put(index, value)?;
            }
            Opcode::BuildArray(count) => {
                let mut values = Vec::with_capacity(*count as usize);
                for _ in 0..*count {
                    values.push(frame.pop()?);
                }
                values.reverse();
                frame.push(Value::array_from_values(values));
            }
            Opcode::BuildList(count) => {
                let mut values = Vec::with_capacity(*count as usize);
                for _ in 0..*count {
                    values.push(frame.pop()?);
                }
                values.reverse();
                frame.push(Value::List(Rc::new(values)));
            }
            Opcode::BuildFunction { name, body, captures } => {
                let captured = if captures.is_empty() {
                    None
                } else {
                    let mut map = std::collections::HashMap::new();
                    for binding in captures {
                        map.insert(binding.name.to_string(), frame.read_local(binding.slot)?);
                    }
                    Some(Rc::new(std::cell::RefCell::new(map)))
                };
                frame.push(Value::Function(Rc::new(FunctionData {
                    name: name.to_string(),
                    body: body.clone(),
                    captures: captured,
                })));
            }
            Opcode::Call(argc) => {
                let mut args = Vec::with_capacity(*argc as usize);
                for _ in 0..*argc {
                    args.push(frame.pop()?);
                }
                args.reverse();
                let callee = frame.pop()?;
                let result = match &callee {
                    Value::Function(f) => {
                        let mut callee_frame = Frame::for_call(f, &args, f.body.symbol_size());
                        crate::executor::execute(&f.body, &mut callee_frame, ctx)?
                    }
                    other => return Err(RunError::NotCallable(other.type_name())),
                };
                frame.push(result);
            }
            Opcode::Return => {
                let v = frame.pop()?;
                return Ok(Some(v));
            }
            Opcode::Print => {
                let v = frame.pop()?;
                ctx.sink.print(&v.str());
            }
            Opcode::Add => binop(frame, |a, b| Ok(value::plus(a, b)))?,
            Opcode::Sub => binop(frame, |a, b| Ok(value::sub(a, b)))?,
            Opcode::Mul => binop(frame, |a, b| Ok(value::mult(a, b)))?,
            Opcode::Div => binop(frame, |a, b| Ok(value::division(a, b)))?,
            Opcode::Mod => binop(frame, value::modulo)?,
            Opcode::Inc(slot) => {
                let v = frame.read_local(*slot)?;
                let new_v = value::increment(&v, 1);
                frame.write_local(*slot, new_v.clone())?;
                frame.push(new_v);
            }
            Opcode::Dec(slot) => {
                let v = frame.read_local(*slot)?;
                let new_v = value::decrement(&v, 1);
                frame.write_local(*slot, new_v.clone())?;
                frame.push(new_v);
            }
            Opcode::Gt => binop(frame, |a, b| Ok(Value::Bool(value::compare_gt(a, b))))?,
            Opcode::Ge => binop(frame, |a, b| Ok(Value::Bool(value::compare_ge(a, b))))?,
            Opcode::Lt => binop(frame, |a, b| Ok(Value::Bool(value::compare_lt(a, b))))?,
            Opcode::Le => binop(frame, |a, b| Ok(Value::Bool(value::compare_le(a, b))))?,
            Opcode::Eq => binop(frame, |a, b| Ok(Value::Bool(value::compare_eq(a, b))))?,
            Opcode::Neq => binop(frame, |a, b| Ok(Value::Bool(value::compare_neq(a, b))))?,
            Opcode::Jump(_) => {}
            Opcode::JumpIfFalse(_) | Opcode::JumpIfTrue(_) => {
                let cond = frame.pop()?;
                frame.set_branch_cond(cond.is_true());
            }
        }
        Ok(None)
    }

    /// Computes the next `pc` for a jump opcode. Unconditional jumps
    /// always take their target; conditional jumps consult the branch
    /// condition `eval` left behind, falling through to `pc + 1` when the
    /// condition doesn't match.
    pub fn do_jump(&self, frame: &mut Frame, pc: usize) -> RunResult<usize> {
        match self {
            Opcode::Jump(target) => Ok(*target),
            Opcode::JumpIfFalse(target) => {
                if frame.take_branch_cond()? {
                    Ok(pc + 1)
                } else {
                    Ok(*target)
                }
            }
            Opcode::JumpIfTrue(target) => {
                if frame.take_branch_cond()? {
                    Ok(*target)
                } else {
                    Ok(pc + 1)
                }
            }
            _ => Err(RunError::BadPc(pc)),
        }
    }
}

fn binop(
    frame: &mut Frame,
    f: impl FnOnce(&Value, &Value) -> RunResult<Value>,
) -> RunResult<()> {
    let right = frame.pop()?;
    let left = frame.pop()?;
    frame.push(f(&left, &right)?);
    Ok(())
}
