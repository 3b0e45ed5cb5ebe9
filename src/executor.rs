// The bytecode dispatch loop: a single merge point at the top of the
// loop, and a "may enter JIT" hint fired only on backward jumps. Neither
// hint does anything in a non-tracing build; they're emitted as `tracing`
// events so the loop *shape* -- what marks a JIT trace boundary, even in
// an interpreter that never JITs -- stays visible in the code and in any
// attached subscriber.

use tracing::trace;

use crate::bytecode::Bytecode;
use crate::frame::Frame;
use crate::opcode::ExecContext;
use crate::value::Value;
use crate::error::RunResult;

/// Runs `bytecode` against `frame`, returning its result. An empty
/// bytecode object returns `Value::Null` without entering the loop at
/// all. `ctx` carries the output sink shared by every nested call.
pub fn execute(bytecode: &Bytecode, frame: &mut Frame, ctx: &mut ExecContext) -> RunResult<Value> {
    if bytecode.opcode_count() == 0 {
        return Ok(Value::Null);
    }

    let mut pc = 0usize;
    loop {
        // Merge point: every iteration re-enters here regardless of how
        // it got here (straight-line advance, forward jump, or backward
        // jump). `bytecode` is loop-invariant ("green"); `frame` and `pc`
        // vary per iteration ("red").
        trace!(pc, "merge point");

        if pc >= bytecode.opcode_count() {
            return Ok(Value::Null);
        }

        let op = bytecode.get_opcode(pc)?;
        if let Some(result) = op.eval(frame, ctx)? {
            return Ok(result);
        }

        if op.is_jump() {
            let new_pc = op.do_jump(frame, pc)?;
            if new_pc < pc {
                trace!(from = pc, to = new_pc, "can enter jit (back-edge)");
            }
            pc = new_pc;
        } else {
            pc += 1;
        }
    }
}
