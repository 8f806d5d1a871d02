//! One activation record of a running method: program counter, operand
//! stack, locals, and arguments, all sized once at construction from the
//! record's declared maxima. Frames are owned by the machine's call-stack
//! vector, so a callee frame never outlives its caller.

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};

use crate::bytecode::Word;
use crate::registry::MethodRecord;
use crate::stack::OperandStack;

pub struct Frame<'m> {
  /// The registered record being executed. The registry outlives the run,
  /// so the interpreter borrows rather than copies the code.
  pub(crate) record: &'m MethodRecord,
  /// Offset of the next instruction, within `[0, code.len())` while running.
  pub(crate) pc:     usize,
  pub(crate) stack:  OperandStack,
  pub(crate) locals: Vec<Word>,
  pub(crate) args:   Vec<Word>,
}

impl<'m> Frame<'m> {
  /// Builds a frame at pc 0. `args` must already match the record's
  /// declared argument count; both entry paths check it before construction.
  pub fn new(record: &'m MethodRecord, args: Vec<Word>) -> Frame<'m> {
    debug_assert_eq!(args.len(), record.num_args());
    Frame {
      record,
      pc:     0,
      stack:  OperandStack::with_capacity(record.max_stack()),
      locals: vec![0; record.max_locals()],
      args,
    }
  }

  pub fn pc(&self) -> usize {
    self.pc
  }

  pub fn stack(&self) -> &OperandStack {
    &self.stack
  }

  // region Display methods

  fn make_value_table(name: &str, values: &[Word], highlight: Option<usize>) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Slot", ubl->"Contents"]);

    for (i, value) in values.iter().enumerate() {
      match Some(i) == highlight {

        true  => {
          table.add_row(row![r->format!("* --> {}[{}] =", name, i), format!("{}", value)]);
        }

        false => {
          table.add_row(row![r->format!("{}[{}] =", name, i), format!("{}", value)]);
        }

      }
    }
    table
  }

  // endregion
}

lazy_static! {
  pub(crate) static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl<'m> Display for Frame<'m> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let top = self.stack.depth().checked_sub(1);
    let s_table = Frame::make_value_table("S", self.stack.cells(), top);
    let l_table = Frame::make_value_table("L", &self.locals, None);
    let a_table = Frame::make_value_table("A", &self.args, None);

    let mut combined_table = table!([s_table, l_table, a_table]);

    combined_table.set_titles(row![ub->"Stack", ub->"Locals", ub->"Arguments"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(
      f,
      "Method {} (token {:#010X}), PC: {}\n{}",
      self.record.reference(),
      self.record.token(),
      self.pc,
      combined_table
    )
  }
}


#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::registry::{MethodFlags, MethodHeader};

  fn record() -> MethodRecord {
    MethodRecord::new(
      MethodHeader {
        reference:   0,
        flags:       MethodFlags::STATIC,
        code_length: 1,
        max_locals:  3,
        max_stack:   2,
        num_args:    2,
        token:       0x0600_0001,
      },
      vec![0x2A],
    )
    .unwrap()
  }

  #[test]
  fn frames_start_at_pc_zero_with_zeroed_locals() {
    let record = record();
    let frame = Frame::new(&record, vec![7, 255]);
    assert_eq!(frame.pc(), 0);
    assert_eq!(frame.locals, vec![0, 0, 0]);
    assert_eq!(frame.args, vec![7, 255]);
    assert_eq!(frame.stack().capacity(), 2);
    assert!(frame.stack().is_empty());
  }

  #[test]
  fn frame_state_renders() {
    let record = record();
    let mut frame = Frame::new(&record, vec![7, 255]);
    frame.stack.push(262).unwrap();
    let rendered = format!("{}", frame);
    assert!(rendered.contains("PC: 0"));
    assert!(rendered.contains("262"));
  }
}
