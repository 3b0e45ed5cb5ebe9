// Glue between an AST root (out of this crate's scope -- the caller
// supplies one) and the execution core's `Bytecode`: build a fresh
// `Bytecode` from the symbol table, ask the AST to emit itself into it,
// finalize.

use std::rc::Rc;

use crate::bytecode::{Bytecode, BytecodeBuilder};
use crate::opcode::Opcode;

/// What an AST root (or AST node) must provide to be compiled: the
/// ability to emit its own opcodes into a builder. The AST's own shape
/// -- its node kinds, the per-statement-kind walk that calls this -- is
/// out of scope here; this is the seam it plugs into.
pub trait CompileInto {
    fn compile_into(&self, bc: &mut BytecodeBuilder);
}

/// What the compiler needs from a symbol table: how many local slots a
/// frame needs, and the parameter/variable names occupying the first
/// slots in declaration order. Name resolution itself (identifier ->
/// slot index) happens before this interface is reached.
pub trait SymbolTable {
    fn size(&self) -> usize;
    fn variables(&self) -> &[Rc<str>];
    fn parameters(&self) -> &[Rc<str>];
}

/// Builds a fresh `Bytecode` for `ast` against `symbols`: an empty
/// builder sized from the symbol table, the AST emitting into it, then
/// frozen with `compile()`.
pub fn compile_ast(ast: &dyn CompileInto, symbols: &dyn SymbolTable) -> Bytecode {
    let mut builder = BytecodeBuilder::new(
        symbols.parameters().to_vec(),
        symbols.variables().to_vec(),
        symbols.size(),
    );
    ast.compile_into(&mut builder);
    builder.compile()
}

/// A plain list of already-built opcodes treated as an AST root. Stands
/// in for the real AST in tests, which hand-assemble programs directly
/// rather than parsing source text (parsing is out of this crate's
/// scope).
pub struct OpcodeList(pub Vec<Opcode>);

impl CompileInto for OpcodeList {
    fn compile_into(&self, bc: &mut BytecodeBuilder) {
        for op in &self.0 {
            bc.emit(op.clone());
        }
    }
}

/// A symbol table with a fixed, pre-known set of parameter/variable
/// names, for use alongside [`OpcodeList`] in tests and small embeddings.
pub struct FixedSymbolTable {
    pub parameters: Vec<Rc<str>>,
    pub variables: Vec<Rc<str>>,
}

impl SymbolTable for FixedSymbolTable {
    fn size(&self) -> usize {
        self.parameters.len() + self.variables.len()
    }

    fn variables(&self) -> &[Rc<str>] {
        &self.variables
    }

    fn parameters(&self) -> &[Rc<str>] {
        &self.parameters
    }
}
