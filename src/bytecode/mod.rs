/*!

  Bytecode-level definitions: the opcode table, the operand-encoding
  classification, and the bytewise decoder.

  The code stream is byte-oriented. An instruction starts with a one-byte
  opcode, except that the lead byte `0xFE` selects a second 256-entry opcode
  space from the byte that follows it. Folding the two spaces together, an
  opcode is a 16 bit value: single-byte opcodes keep their byte value, and a
  two-byte opcode `0xFE 0xNN` becomes `0x100 + 0xNN`. The lead bytes between
  `0xF8` and `0xFD` and the byte `0xFF` are reserved prefixes and never
  decode.

  The bytes following the opcode are determined by its operand-encoding
  class, not by the opcode itself. The decoder only identifies instruction
  boundaries; reading and interpreting operand bytes is the interpreter's
  job, dispatched first on the class and then on the opcode within it.

*/

mod decode;
mod opcode;

pub use decode::{decode_opcode, read_i8, read_u32, DecodedOpcode};
pub use opcode::{Opcode, OpcodeValue, OperandEncoding, OPCODE_PREFIX1, TWO_BYTE_BASE};

/// The machine word. The operand stack, locals, and arguments hold untyped
/// 32 bit words; wider and typed values are outside the implemented opcode
/// set and fault rather than truncate.
pub type Word = i32;

/// A token embedded in the code stream that names a loaded method. Tokens
/// are assigned by the loader and resolved against the method registry.
pub type MethodToken = u32;
