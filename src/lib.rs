/*!

  A bounded-memory IL bytecode interpreter for microcontroller-class hosts.

  An external loader hands the machine a pre-verified method record (header
  plus code bytes) keyed by a reference id and a resolution token; an
  invocation request supplies argument words and runs the fetch-decode-
  execute loop synchronously until a return unwinds the outermost frame
  (yielding one result word) or a fault aborts the whole call chain
  (yielding a diagnosable reason and the failing offset). All memory is
  sized up front: the registry has a fixed slot count, every frame is sized
  from its method's declared maxima, and the frame chain has a hard depth
  limit. The hot loop never allocates and never recovers: there is no
  exception model, no partial result, and no retry.

  Transport framing, chunked transfer reassembly, and 7-bit packing of the
  host link live outside this crate; `load`, `execute`, and `reset` are the
  whole boundary.

*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod bytecode;
pub mod error;
pub mod frame;
pub mod machine;
pub mod registry;
pub mod stack;

pub use crate::bytecode::{MethodToken, Word};
pub use crate::error::{Fault, LoadError, StackFaultKind};
pub use crate::machine::{IlMachine, MAX_CALL_DEPTH};
pub use crate::registry::{
  MethodFlags, MethodHeader, MethodRecord, MethodRegistry, DEFAULT_MAX_METHODS
};
