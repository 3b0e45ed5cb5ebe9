// The compiled program object: an append-only list during compilation,
// frozen into an immutable, randomly-addressable opcode vector by
// `compile()`. Fetching an out-of-range pc errors rather than panics.

use std::rc::Rc;

use crate::error::{RunError, RunResult};
use crate::opcode::{Opcode, OpcodeHandle};

/// Accumulates opcodes during compilation. Append-only; `compile()`
/// consumes it and produces the frozen [`Bytecode`].
pub struct BytecodeBuilder {
    opcodes: Vec<Opcode>,
    parameters: Vec<Rc<str>>,
    variables: Vec<Rc<str>>,
    symbol_size: usize,
}

impl BytecodeBuilder {
    /// `symbol_size` is the authoritative local-slot count for the frame
    /// this bytecode runs in, as reported by the symbol table. It may
    /// exceed `parameters.len() + variables.len()` when the symbol table
    /// also allocates slots for compiler-internal temporaries, so it is
    /// carried through untouched rather than re-derived.
    pub fn new(parameters: Vec<Rc<str>>, variables: Vec<Rc<str>>, symbol_size: usize) -> Self {
        BytecodeBuilder {
            opcodes: Vec::new(),
            parameters,
            variables,
            symbol_size,
        }
    }

    /// Appends `opcode` and returns a handle identifying its position, so
    /// callers can patch jump targets once they know them (e.g. an `if`'s
    /// `JUMP_IF_FALSE` target, unknown until the `else` branch is emitted).
    pub fn emit(&mut self, opcode: Opcode) -> OpcodeHandle {
        self.opcodes.push(opcode);
        OpcodeHandle(self.opcodes.len() - 1)
    }

    pub fn patch_target(&mut self, handle: OpcodeHandle, target_pc: usize) {
        self.opcodes[handle.0].set_jump_target(target_pc);
    }

    pub fn next_pc(&self) -> usize {
        self.opcodes.len()
    }

    /// Freezes the builder into an immutable [`Bytecode`].
    pub fn compile(self) -> Bytecode {
        Bytecode {
            opcodes: self.opcodes,
            parameters: self.parameters,
            variables: self.variables,
            symbol_size: self.symbol_size,
        }
    }
}

/// A frozen, immutable, randomly-addressable opcode vector plus the
/// symbol-table metadata a `Frame` needs to size its local slots.
#[derive(Debug)]
pub struct Bytecode {
    opcodes: Vec<Opcode>,
    parameters: Vec<Rc<str>>,
    variables: Vec<Rc<str>>,
    symbol_size: usize,
}

impl Bytecode {
    /// Pure and cacheable: the same `pc` always yields the same opcode
    /// for the lifetime of this (immutable) `Bytecode`.
    pub fn get_opcode(&self, pc: usize) -> RunResult<&Opcode> {
        self.opcodes.get(pc).ok_or(RunError::BadPc(pc))
    }

    pub fn opcode_count(&self) -> usize {
        self.opcodes.len()
    }

    pub fn parameters(&self) -> &[Rc<str>] {
        &self.parameters
    }

    pub fn variables(&self) -> &[Rc<str>] {
        &self.variables
    }

    pub fn symbol_size(&self) -> usize {
        self.symbol_size
    }
}
