//! The per-frame operand stack: a fixed-capacity LIFO of machine words.
//! Capacity is set once at frame creation from the owning method's declared
//! maximum stack depth and never changes; the backing storage is allocated
//! up front so the hot loop never allocates.

use crate::bytecode::Word;
use crate::error::StackFaultKind;

pub struct OperandStack {
  cells:    Vec<Word>,
  capacity: usize
}

impl OperandStack {
  pub fn with_capacity(capacity: usize) -> OperandStack {
    OperandStack {
      cells: Vec::with_capacity(capacity),
      capacity
    }
  }

  pub fn push(&mut self, word: Word) -> Result<(), StackFaultKind> {
    if self.cells.len() == self.capacity {
      return Err(StackFaultKind::Overflow);
    }
    self.cells.push(word);
    Ok(())
  }

  pub fn pop(&mut self) -> Result<Word, StackFaultKind> {
    self.cells.pop().ok_or(StackFaultKind::Underflow)
  }

  /// Top of the stack without popping. For diagnostics only; control
  /// decisions always go through `pop`.
  pub fn peek(&self) -> Option<Word> {
    self.cells.last().copied()
  }

  pub fn depth(&self) -> usize {
    self.cells.len()
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  /// The stack contents bottom-first, for state rendering.
  pub fn cells(&self) -> &[Word] {
    &self.cells
  }
}
