//! The IL machine: the method registry behind the load/invoke/reset
//! boundary and the fetch-decode-execute loop that runs one frame chain to
//! completion. An invocation runs synchronously from entry to a terminal
//! state; a fault aborts the whole chain and yields no value.

use std::fmt::{Display, Formatter};

use prettytable::Table;

use crate::bytecode::{
  decode_opcode, read_i8, read_u32, MethodToken, Opcode, OperandEncoding, Word
};
use crate::error::{Fault, LoadError};
use crate::frame::{Frame, TABLE_DISPLAY_FORMAT};
use crate::registry::{MethodHeader, MethodRecord, MethodRegistry};

/// Upper bound on the frame chain. Frames are stack-allocated activation
/// records on a device with no memory slack, so runaway recursion must
/// fault instead of growing.
pub const MAX_CALL_DEPTH: usize = 10;

/// Outcome of executing one instruction in the active frame. The loop
/// applies the transition to the frame chain; the step function itself
/// never touches any frame but the active one.
enum Transition {
  /// Move the program counter to the next instruction boundary.
  Advance(usize),
  /// Set the program counter to an absolute destination. The destination is
  /// not bounds-checked here; an out-of-range pc faults on the next fetch.
  Branch(i64),
  /// Resolve `token`, pop the callee's arguments, and activate a new frame.
  /// The caller resumes at `resume` once the callee returns.
  Call { token: MethodToken, resume: usize, site: usize },
  /// Destroy the active frame, yielding `value` to the caller frame or, for
  /// the outermost frame, to the invoker.
  Return(Word),
}

pub struct IlMachine {
  registry: MethodRegistry
}

impl IlMachine {

  // region Load / reset boundary

  pub fn new() -> IlMachine {
    IlMachine { registry: MethodRegistry::new() }
  }

  pub fn with_capacity(max_methods: usize) -> IlMachine {
    IlMachine { registry: MethodRegistry::with_capacity(max_methods) }
  }

  /**
    Registers a method assembled by the loader. The header is validated
    against the supplied buffer here and nowhere else; a method that loads
    is trusted completely by the interpreter.
  */
  pub fn load(&mut self, header: MethodHeader, code: Vec<u8>) -> Result<(), LoadError> {
    let record = MethodRecord::new(header, code)?;
    self.registry.register(record)
  }

  pub fn registry(&self) -> &MethodRegistry {
    &self.registry
  }

  /// Discards all loaded methods. Idempotent; there is no partial reset.
  pub fn reset(&mut self) {
    self.registry.reset();
  }

  // endregion

  // region Invocation boundary

  /**
    Executes the method loaded under `reference` with the supplied argument
    words, running the interpreter loop to a terminal state. Returns the
    single result word, or the fault that aborted the chain. An argument
    count differing from the record's declaration is a caller error reported
    before any instruction executes.

    Taking `&mut self` makes an invocation exclusive: a second one cannot
    begin while this one is in flight on the same registry state.
  */
  pub fn execute(&mut self, reference: u8, args: &[Word]) -> Result<Word, Fault> {
    let record = self
      .registry
      .lookup(reference)
      .ok_or(Fault::UnknownMethod { reference })?;
    check_argument_count(record, args.len())?;
    run(&self.registry, record, args.to_vec())
  }

  /// As `execute`, but addresses the method by its loader-assigned token.
  pub fn execute_token(&mut self, token: MethodToken, args: &[Word]) -> Result<Word, Fault> {
    let record = self
      .registry
      .resolve_token(token)
      .ok_or(Fault::UnresolvedToken { offset: 0, token })?;
    check_argument_count(record, args.len())?;
    run(&self.registry, record, args.to_vec())
  }

  // endregion
}

impl Default for IlMachine {
  fn default() -> IlMachine {
    IlMachine::new()
  }
}

fn check_argument_count(record: &MethodRecord, supplied: usize) -> Result<(), Fault> {
  if supplied != record.num_args() {
    return Err(Fault::ArgumentCountMismatch {
      reference: record.reference(),
      declared:  record.num_args(),
      supplied,
    });
  }
  Ok(())
}

// region Interpreter loop

/**
  Runs a frame chain rooted at `record` to a terminal state. The chain is an
  explicit vector: the last element is the only active frame, every other
  frame is suspended awaiting a return value, and a callee never outlives
  its caller.
*/
fn run<'m>(
    registry : &'m MethodRegistry,
    record   : &'m MethodRecord,
    args     : Vec<Word>
  ) -> Result<Word, Fault>
{
  let mut frames: Vec<Frame<'m>> = Vec::with_capacity(MAX_CALL_DEPTH);
  frames.push(Frame::new(record, args));

  loop {
    let transition = {
      let frame = match frames.last_mut() {
        Some(frame) => frame,
        // `Return` either resumes a caller or exits the loop, so one frame
        // is always active here.
        None => unreachable!("empty frame chain while running"),
      };
      step(frame)?
    };

    match transition {

      Transition::Advance(next) => {
        if let Some(frame) = frames.last_mut() {
          frame.pc = next;
        }
      }

      Transition::Branch(dest) => {
        if let Some(frame) = frames.last_mut() {
          let code_length = frame.record.code().len();
          // A negative destination lands past the end so that the next
          // fetch reports the fault; there is never an out-of-bounds read.
          frame.pc = match dest < 0 {
            true  => code_length,
            false => dest as usize
          };
        }
      }

      Transition::Call { token, resume, site } => {
        let callee = registry
          .resolve_token(token)
          .ok_or(Fault::UnresolvedToken { offset: site, token })?;
        if frames.len() >= MAX_CALL_DEPTH {
          return Err(Fault::CallDepthExceeded { offset: site });
        }

        let mut call_args = vec![0 as Word; callee.num_args()];
        if let Some(caller) = frames.last_mut() {
          caller.pc = resume;
          // Arguments were pushed left to right: the rightmost is on top.
          for slot in call_args.iter_mut().rev() {
            *slot = caller
              .stack
              .pop()
              .map_err(|kind| Fault::OperandStackFault { offset: site, kind })?;
          }
        }

        #[cfg(feature = "trace_computation")]
        println!("call -> method {} (token {:#010X})", callee.reference(), token);

        frames.push(Frame::new(callee, call_args));
      }

      Transition::Return(value) => {
        #[cfg(feature = "trace_computation")]
        println!("ret {}", value);

        frames.pop();
        match frames.last_mut() {
          Some(caller) => {
            let offset = caller.pc;
            caller
              .stack
              .push(value)
              .map_err(|kind| Fault::OperandStackFault { offset, kind })?;
          }
          None => return Ok(value),
        }
      }

    }
  }
}

/**
  Fetches, decodes, and executes the instruction at the active frame's
  program counter, producing the transition to apply to the chain. Dispatch
  is on the operand-encoding class first and the opcode within it second;
  every combination outside the implemented set is an explicit fault at the
  instruction's starting offset.
*/
fn step(frame: &mut Frame<'_>) -> Result<Transition, Fault> {
  let record = frame.record;
  let code   = record.code();
  let start  = frame.pc;

  // Well-formed programs terminate via an explicit return; running off the
  // end means truncated code or a decode miscount.
  if start >= code.len() {
    return Err(Fault::UnterminatedProgram { offset: start });
  }

  let decoded = decode_opcode(code, start).ok_or(Fault::DecodeFailure { offset: start })?;
  let after = start + decoded.length;

  #[cfg(feature = "trace_computation")]
  {
    println!("PC: {}  {} [{}]", start, decoded.opcode, decoded.opcode.encoding());
    if let Some(top) = frame.stack.peek() {
      println!("Top of Stack: {}", top);
    }
    println!("{}", frame);
  }

  match decoded.opcode.encoding() {

    OperandEncoding::InlineNone => step_inline_none(frame, decoded.opcode, start, after),

    OperandEncoding::ShortInlineBrTarget => {
      match decoded.opcode {

        Opcode::BrS => {
          let offset =
            read_i8(code, after).ok_or(Fault::DecodeFailure { offset: start })? as i64;
          // The destination is relative to the byte after the operand.
          Ok(Transition::Branch(after as i64 + 1 + offset))
        }

        opcode => Err(Fault::UnimplementedOpcode { offset: start, opcode })
      }
    }

    OperandEncoding::InlineMethod => {
      match decoded.opcode {

        Opcode::Call => {
          let token =
            read_u32(code, after).ok_or(Fault::DecodeFailure { offset: start })?;
          Ok(Transition::Call { token, resume: after + 4, site: start })
        }

        opcode => Err(Fault::UnimplementedOpcode { offset: start, opcode })
      }
    }

    // Reserved operand-encoding classes: recognized, never executed.
    _ => Err(Fault::UnimplementedOpcode { offset: start, opcode: decoded.opcode })
  }
}

/// The no-operand opcodes: stack-neutral, constants, variable access,
/// arithmetic, and return.
fn step_inline_none(
    frame  : &mut Frame<'_>,
    opcode : Opcode,
    start  : usize,
    after  : usize
  ) -> Result<Transition, Fault>
{
  match opcode {

    Opcode::Nop => {}

    Opcode::Ret => {
      let value = pop(frame, start)?;
      return Ok(Transition::Return(value));
    }

    // No exception or unwind model exists; a throw is exactly as fatal as
    // any other unimplemented opcode.
    Opcode::Throw => {
      return Err(Fault::UnimplementedOpcode { offset: start, opcode });
    }

    Opcode::Ldarg0 => load_argument(frame, start, 0)?,
    Opcode::Ldarg1 => load_argument(frame, start, 1)?,
    Opcode::Ldarg2 => load_argument(frame, start, 2)?,
    Opcode::Ldarg3 => load_argument(frame, start, 3)?,

    Opcode::Ldloc0 => load_local(frame, start, 0)?,
    Opcode::Ldloc1 => load_local(frame, start, 1)?,
    Opcode::Ldloc2 => load_local(frame, start, 2)?,
    Opcode::Ldloc3 => load_local(frame, start, 3)?,

    Opcode::Stloc0 => store_local(frame, start, 0)?,
    Opcode::Stloc1 => store_local(frame, start, 1)?,
    Opcode::Stloc2 => store_local(frame, start, 2)?,
    Opcode::Stloc3 => store_local(frame, start, 3)?,

    Opcode::LdcI4M1 => push(frame, start, -1)?,
    Opcode::LdcI40  => push(frame, start, 0)?,
    Opcode::LdcI41  => push(frame, start, 1)?,
    Opcode::LdcI42  => push(frame, start, 2)?,
    Opcode::LdcI43  => push(frame, start, 3)?,
    Opcode::LdcI44  => push(frame, start, 4)?,
    Opcode::LdcI45  => push(frame, start, 5)?,
    Opcode::LdcI46  => push(frame, start, 6)?,
    Opcode::LdcI47  => push(frame, start, 7)?,
    Opcode::LdcI48  => push(frame, start, 8)?,

    Opcode::Dup => {
      let value = pop(frame, start)?;
      push(frame, start, value)?;
      push(frame, start, value)?;
    }

    Opcode::Pop => {
      pop(frame, start)?;
    }

    Opcode::Add => binary_op(frame, start, |lhs, rhs| lhs.wrapping_add(rhs))?,
    Opcode::Sub => binary_op(frame, start, |lhs, rhs| lhs.wrapping_sub(rhs))?,
    Opcode::Mul => binary_op(frame, start, |lhs, rhs| lhs.wrapping_mul(rhs))?,
    Opcode::And => binary_op(frame, start, |lhs, rhs| lhs & rhs)?,
    Opcode::Or  => binary_op(frame, start, |lhs, rhs| lhs | rhs)?,
    Opcode::Xor => binary_op(frame, start, |lhs, rhs| lhs ^ rhs)?,

    opcode => {
      return Err(Fault::UnimplementedOpcode { offset: start, opcode });
    }

  }

  Ok(Transition::Advance(after))
}

// endregion

// region Frame access helpers

fn push(frame: &mut Frame<'_>, offset: usize, value: Word) -> Result<(), Fault> {
  frame
    .stack
    .push(value)
    .map_err(|kind| Fault::OperandStackFault { offset, kind })
}

fn pop(frame: &mut Frame<'_>, offset: usize) -> Result<Word, Fault> {
  frame
    .stack
    .pop()
    .map_err(|kind| Fault::OperandStackFault { offset, kind })
}

fn binary_op<F>(frame: &mut Frame<'_>, offset: usize, op: F) -> Result<(), Fault>
  where F: Fn(Word, Word) -> Word
{
  let rhs = pop(frame, offset)?;
  let lhs = pop(frame, offset)?;
  push(frame, offset, op(lhs, rhs))
}

fn load_argument(frame: &mut Frame<'_>, offset: usize, index: usize) -> Result<(), Fault> {
  let limit = frame.args.len();
  let value = *frame
    .args
    .get(index)
    .ok_or(Fault::IndexFault { offset, index, limit })?;
  push(frame, offset, value)
}

fn load_local(frame: &mut Frame<'_>, offset: usize, index: usize) -> Result<(), Fault> {
  let limit = frame.locals.len();
  let value = *frame
    .locals
    .get(index)
    .ok_or(Fault::IndexFault { offset, index, limit })?;
  push(frame, offset, value)
}

fn store_local(frame: &mut Frame<'_>, offset: usize, index: usize) -> Result<(), Fault> {
  let value = pop(frame, offset)?;
  let limit = frame.locals.len();
  let slot = frame
    .locals
    .get_mut(index)
    .ok_or(Fault::IndexFault { offset, index, limit })?;
  *slot = value;
  Ok(())
}

// endregion

impl Display for IlMachine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(
      row![ub->"Ref", ub->"Token", ub->"Flags", ub->"Code Bytes", ub->"Args", ub->"Locals", ub->"Stack"]
    );

    for record in self.registry.records() {
      table.add_row(row![
        r->record.reference(),
        format!("{:#010X}", record.token()),
        record.flags(),
        record.code().len(),
        record.num_args(),
        record.max_locals(),
        record.max_stack()
      ]);
    }

    write!(
      f,
      "Methods loaded: {} of {}\n{}",
      self.registry.used(),
      self.registry.capacity(),
      table
    )
  }
}


#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::error::StackFaultKind;
  use crate::registry::MethodFlags;

  const ADD_TOKEN: MethodToken = 0x0600_0002;

  fn header(reference: u8, token: MethodToken, num_args: u8, code_length: usize) -> MethodHeader {
    MethodHeader {
      reference,
      flags: MethodFlags::STATIC,
      code_length: code_length as u16,
      max_locals: 2,
      max_stack: 4,
      num_args,
      token,
    }
  }

  fn load(machine: &mut IlMachine, reference: u8, token: MethodToken, num_args: u8, code: Vec<u8>) {
    let header = header(reference, token, num_args, code.len());
    machine.load(header, code).unwrap();
  }

  // Scenario: ldarg.0, ldarg.1, add, ret
  #[test]
  fn ldarg_add_ret_returns_the_sum() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 2, vec![0x02, 0x03, 0x58, 0x2A]);
    assert_eq!(machine.execute(0, &[7, 255]), Ok(262));
  }

  // The original device self-test program:
  // nop, ldarg.0, ldarg.1, add, stloc.0, br.s +0, ldloc.0, ret
  #[test]
  fn branch_and_locals_round_trip() {
    let mut machine = IlMachine::new();
    load(
      &mut machine,
      0,
      0x0600_0001,
      2,
      vec![0x00, 0x02, 0x03, 0x58, 0x0A, 0x2B, 0x00, 0x06, 0x2A],
    );
    assert_eq!(machine.execute(0, &[255, 7]), Ok(262));
  }

  // Scenario: ret with nothing on the stack is a pop from empty, not 0.
  #[test]
  fn ret_on_empty_stack_underflows() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x2A]);
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::OperandStackFault { offset: 0, kind: StackFaultKind::Underflow })
    );
  }

  // Scenario: nop never affects stack depth.
  #[test]
  fn nops_do_not_change_stack_depth() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x00, 0x00, 0x00, 0x2A]);
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::OperandStackFault { offset: 3, kind: StackFaultKind::Underflow })
    );
  }

  // Scenario: a short branch past the end faults on the next fetch.
  #[test]
  fn branch_out_of_range_faults_on_next_fetch() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x2B, 0x7F, 0x2A]);
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::UnterminatedProgram { offset: 129 })
    );
  }

  #[test]
  fn branch_before_the_start_faults_on_next_fetch() {
    // Offset -128 from position 2.
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x2B, 0x80, 0x2A]);
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::UnterminatedProgram { offset: 3 })
    );
  }

  #[test]
  fn a_backward_branch_executes() {
    // ldc.i4.3, ldc.i4.4, br.s +1, ret (dead), add, br.s -4 (to ret)
    let mut machine = IlMachine::new();
    load(
      &mut machine,
      0,
      0x0600_0001,
      0,
      vec![0x19, 0x1A, 0x2B, 0x01, 0x2A, 0x58, 0x2B, 0xFC],
    );
    assert_eq!(machine.execute(0, &[]), Ok(7));
  }

  // Scenario: declared length exceeding the buffer is malformed and the
  // registry stays unchanged.
  #[test]
  fn loading_a_truncated_record_is_malformed() {
    let mut machine = IlMachine::new();
    let result = machine.load(
      header(0, 0x0600_0001, 2, 12),
      vec![0x00, 0x02, 0x03, 0x58, 0x0A, 0x2B, 0x00, 0x06, 0x2A],
    );
    assert!(matches!(result, Err(LoadError::MalformedRecord { reference: 0, .. })));
    assert_eq!(machine.registry().used(), 0);
  }

  #[test]
  fn falling_off_the_end_is_a_fault() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x00]);
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::UnterminatedProgram { offset: 1 })
    );
  }

  #[test]
  fn unknown_opcodes_are_decode_failures() {
    let mut machine = IlMachine::new();
    // 0x24 is unassigned; 0xFF is a reserved prefix.
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x24, 0x2A]);
    load(&mut machine, 1, 0x0600_0002, 0, vec![0xFF, 0x2A]);
    assert_eq!(machine.execute(0, &[]), Err(Fault::DecodeFailure { offset: 0 }));
    assert_eq!(machine.execute(1, &[]), Err(Fault::DecodeFailure { offset: 0 }));
  }

  #[test]
  fn throw_aborts_the_chain() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x16, 0x7A, 0x2A]);
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::UnimplementedOpcode { offset: 1, opcode: Opcode::Throw })
    );
  }

  #[test]
  fn reserved_encoding_classes_fault_at_the_instruction_start() {
    let mut machine = IlMachine::new();
    // ldstr with a string token: InlineString is a reserved class.
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x72, 0x01, 0x00, 0x00, 0x70, 0x2A]);
    // ldc.i4.s: ShortInlineI is a reserved class.
    load(&mut machine, 1, 0x0600_0002, 0, vec![0x1F, 0x2A, 0x2A]);
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::UnimplementedOpcode { offset: 0, opcode: Opcode::Ldstr })
    );
    assert_eq!(
      machine.execute(1, &[]),
      Err(Fault::UnimplementedOpcode { offset: 0, opcode: Opcode::LdcI4S })
    );
  }

  #[test]
  fn argument_count_mismatch_is_reported_before_execution() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 2, vec![0x02, 0x03, 0x58, 0x2A]);
    assert_eq!(
      machine.execute(0, &[7]),
      Err(Fault::ArgumentCountMismatch { reference: 0, declared: 2, supplied: 1 })
    );
  }

  #[test]
  fn invoking_an_unloaded_reference_fails() {
    let mut machine = IlMachine::new();
    assert_eq!(machine.execute(9, &[]), Err(Fault::UnknownMethod { reference: 9 }));
  }

  #[test]
  fn pushing_past_the_declared_stack_depth_overflows() {
    let mut machine = IlMachine::new();
    let mut shallow = header(0, 0x0600_0001, 0, 3);
    shallow.max_stack = 1;
    machine.load(shallow, vec![0x16, 0x17, 0x2A]).unwrap();
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::OperandStackFault { offset: 1, kind: StackFaultKind::Overflow })
    );
  }

  #[test]
  fn local_index_out_of_declared_range_faults() {
    // stloc.2 with two declared locals.
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x16, 0x0C, 0x2A]);
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::IndexFault { offset: 1, index: 2, limit: 2 })
    );
  }

  #[test]
  fn argument_index_out_of_declared_range_faults() {
    // ldarg.0 in a method declaring no arguments.
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x02, 0x2A]);
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::IndexFault { offset: 0, index: 0, limit: 0 })
    );
  }

  #[test]
  fn nested_call_returns_through_the_frame_chain() {
    let mut machine = IlMachine::new();
    load(&mut machine, 1, ADD_TOKEN, 2, vec![0x02, 0x03, 0x58, 0x2A]);
    // ldarg.0, ldarg.1, call <ADD_TOKEN>, ret
    load(
      &mut machine,
      0,
      0x0600_0001,
      2,
      vec![0x02, 0x03, 0x28, 0x02, 0x00, 0x00, 0x06, 0x2A],
    );
    assert_eq!(machine.execute(0, &[200, 62]), Ok(262));
  }

  #[test]
  fn an_unresolved_call_token_faults_at_the_call_site() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x28, 0xEF, 0xBE, 0xAD, 0xDE, 0x2A]);
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::UnresolvedToken { offset: 0, token: 0xDEAD_BEEF })
    );
  }

  #[test]
  fn runaway_recursion_is_bounded() {
    // A zero-argument method that calls itself.
    let mut machine = IlMachine::new();
    load(
      &mut machine,
      0,
      0x0600_0001,
      0,
      vec![0x28, 0x01, 0x00, 0x00, 0x06, 0x2A],
    );
    assert_eq!(
      machine.execute(0, &[]),
      Err(Fault::CallDepthExceeded { offset: 0 })
    );
  }

  #[test]
  fn a_truncated_call_token_is_a_decode_failure() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x28, 0x02]);
    assert_eq!(machine.execute(0, &[]), Err(Fault::DecodeFailure { offset: 0 }));
  }

  #[test]
  fn a_truncated_branch_offset_is_a_decode_failure() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x2B]);
    assert_eq!(machine.execute(0, &[]), Err(Fault::DecodeFailure { offset: 0 }));
  }

  #[test]
  fn reset_clears_loaded_methods_and_is_idempotent() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 2, vec![0x02, 0x03, 0x58, 0x2A]);
    machine.reset();
    assert_eq!(machine.registry().used(), 0);
    machine.reset();
    assert_eq!(machine.registry().used(), 0);
    assert_eq!(machine.execute(0, &[7, 255]), Err(Fault::UnknownMethod { reference: 0 }));
  }

  #[test]
  fn execute_by_token_resolves_and_runs() {
    let mut machine = IlMachine::new();
    load(&mut machine, 1, ADD_TOKEN, 2, vec![0x02, 0x03, 0x58, 0x2A]);
    assert_eq!(machine.execute_token(ADD_TOKEN, &[1, 2]), Ok(3));
    assert_eq!(
      machine.execute_token(0xDEAD_BEEF, &[]),
      Err(Fault::UnresolvedToken { offset: 0, token: 0xDEAD_BEEF })
    );
  }

  #[test]
  fn arithmetic_and_stack_manipulation() {
    let mut machine = IlMachine::new();
    // ldc.i4.8, ldc.i4.1, sub, ret
    load(&mut machine, 0, 0x0600_0001, 0, vec![0x1E, 0x17, 0x59, 0x2A]);
    // ldc.i4.2, ldc.i4.3, mul, ret
    load(&mut machine, 1, 0x0600_0002, 0, vec![0x18, 0x19, 0x5A, 0x2A]);
    // ldc.i4.1, dup, add, ret
    load(&mut machine, 2, 0x0600_0003, 0, vec![0x17, 0x25, 0x58, 0x2A]);
    // ldc.i4.1, ldc.i4.0, pop, ret
    load(&mut machine, 3, 0x0600_0004, 0, vec![0x17, 0x16, 0x26, 0x2A]);
    // ldc.i4.6, ldc.i4.3, xor, ret
    load(&mut machine, 4, 0x0600_0005, 0, vec![0x1C, 0x19, 0x61, 0x2A]);
    assert_eq!(machine.execute(0, &[]), Ok(7));
    assert_eq!(machine.execute(1, &[]), Ok(6));
    assert_eq!(machine.execute(2, &[]), Ok(2));
    assert_eq!(machine.execute(3, &[]), Ok(1));
    assert_eq!(machine.execute(4, &[]), Ok(5));
  }

  #[test]
  fn addition_wraps_rather_than_overflowing() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 2, vec![0x02, 0x03, 0x58, 0x2A]);
    assert_eq!(
      machine.execute(0, &[Word::max_value(), 1]),
      Ok(Word::min_value())
    );
  }

  #[test]
  fn machine_state_renders_the_registry() {
    let mut machine = IlMachine::new();
    load(&mut machine, 0, 0x0600_0001, 2, vec![0x02, 0x03, 0x58, 0x2A]);
    let rendered = format!("{}", machine);
    assert!(rendered.contains("Methods loaded: 1 of 10"));
    assert!(rendered.contains("0x06000001"));
  }
}
