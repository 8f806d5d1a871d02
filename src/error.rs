//! Fault types. A `Fault` aborts the entire call chain immediately: there is
//! no local recovery, no partial return value, and no resumption. Execution
//! faults carry the starting offset of the failing instruction; load and
//! invoke faults carry the supplied record or argument identifier instead.

use strum_macros::Display as StrumDisplay;
use thiserror::Error;

use crate::bytecode::{MethodToken, Opcode};

/// Whether an operand-stack fault was a push past capacity or a pop from an
/// empty stack.
#[derive(StrumDisplay, Copy, Clone, Eq, PartialEq, Debug, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum StackFaultKind {
  Overflow,
  Underflow
}

/// An unrecoverable execution or invocation error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Fault {
  #[error("unknown or reserved opcode at offset {offset}")]
  DecodeFailure { offset: usize },

  #[error("operand stack {kind} at offset {offset}")]
  OperandStackFault { offset: usize, kind: StackFaultKind },

  #[error("index {index} exceeds the declared count {limit} at offset {offset}")]
  IndexFault { offset: usize, index: usize, limit: usize },

  #[error("token {token:#010X} does not resolve to a loaded method (call site offset {offset})")]
  UnresolvedToken { offset: usize, token: MethodToken },

  #[error("opcode {opcode} at offset {offset} is recognized but not implemented")]
  UnimplementedOpcode { offset: usize, opcode: Opcode },

  #[error("reached offset {offset} without executing a return")]
  UnterminatedProgram { offset: usize },

  #[error("method {reference} declares {declared} arguments but {supplied} were supplied")]
  ArgumentCountMismatch { reference: u8, declared: usize, supplied: usize },

  #[error("no method is loaded under reference {reference}")]
  UnknownMethod { reference: u8 },

  #[error("call depth limit reached at offset {offset}")]
  CallDepthExceeded { offset: usize },
}

/// A load-time error. Registration leaves the registry unchanged when it
/// fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
  #[error("method registry is full, cannot load reference {reference}")]
  RegistryFull { reference: u8 },

  #[error("malformed record for reference {reference}: {reason}")]
  MalformedRecord { reference: u8, reason: String },
}
