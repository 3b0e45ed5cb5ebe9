//! Execution core for a dynamically-typed, PHP-family scripting language:
//! the `Value` domain, string-literal interpolation, the bytecode format,
//! and the dispatch loop that runs it. The parser, the AST, the
//! AST-to-bytecode compiler's statement walk, and the CLI all live
//! upstream of this crate -- see [`compile`] for the seam they plug into.

pub mod bytecode;
pub mod compile;
pub mod error;
pub mod executor;
pub mod frame;
pub mod opcode;
pub mod sink;
pub mod string_lit;
pub mod value;

pub use bytecode::{Bytecode, BytecodeBuilder};
pub use compile::{compile_ast, CompileInto, FixedSymbolTable, OpcodeList, SymbolTable};
pub use error::{RunError, RunResult};
pub use executor::execute;
pub use frame::Frame;
pub use opcode::{CaptureBinding, ExecContext, Opcode, OpcodeHandle, StringPart};
pub use sink::{CapturingSink, PrintSink, StdoutSink};
pub use string_lit::{unescape, unquote, Placeholder};
pub use value::{ArrayKey, FunctionData, IteratorState, Value};
