// Runtime error type for the execution core.
//
// Covers malformed literals, missing array keys, type/arity mismatches on
// call, and internal invariants (stack underflow, bad pc). There is no
// catch mechanism in the core -- errors propagate with `?` and unwind
// through every enclosing `execute` call.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error("\\ at end of string")]
    TrailingBackslash,

    #[error("mismatched quotes in string literal")]
    QuoteMismatch,

    #[error("division by zero")]
    DivisionByZero,

    #[error("key {key} not found in {container}")]
    MissingKey { key: String, container: &'static str },

    #[error("value of type {0} is not callable")]
    NotCallable(&'static str),

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("invalid program counter {0}")]
    BadPc(usize),

    #[error("local slot {0} out of range")]
    BadSlot(u16),
}

pub type RunResult<T> = Result<T, RunError>;
