/*!
  This module is responsible for identifying instruction boundaries in the
  code stream. Decoding is total: every byte at a valid boundary either
  yields a specific opcode together with its encoded length, or yields
  nothing. No semantic validation of operands happens here.
*/

use std::convert::TryFrom;

use super::opcode::{Opcode, OpcodeValue, OPCODE_PREFIX1, TWO_BYTE_BASE};

/// A decoded opcode together with the number of bytes it occupies in the
/// code stream. The length counts opcode bytes only; operand bytes follow
/// according to the opcode's encoding class.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DecodedOpcode {
  pub opcode: Opcode,
  pub length: usize
}

/**
  Decodes the opcode starting at `offset`. Returns `None` on a reserved
  prefix byte, a value outside the opcode table, a `0xFE` lead byte with no
  selector byte after it, or an offset past the end of the buffer.
*/
pub fn decode_opcode(code: &[u8], offset: usize) -> Option<DecodedOpcode> {
  let lead = *code.get(offset)?;

  match lead {

    OPCODE_PREFIX1 => {
      let selector = *code.get(offset + 1)?;
      let opcode = Opcode::try_from(TWO_BYTE_BASE + selector as OpcodeValue).ok()?;
      Some(DecodedOpcode { opcode, length: 2 })
    }

    // Reserved prefixes never decode.
    0xF8..=0xFD | 0xFF => None,

    _ => {
      let opcode = Opcode::try_from(lead as OpcodeValue).ok()?;
      Some(DecodedOpcode { opcode, length: 1 })
    }

  }
}

/// Reads a one-byte signed operand, e.g. a short branch offset.
pub fn read_i8(code: &[u8], offset: usize) -> Option<i8> {
  code.get(offset).map(|byte| *byte as i8)
}

/// Reads a four-byte little-endian operand, e.g. a method token.
pub fn read_u32(code: &[u8], offset: usize) -> Option<u32> {
  let bytes = code.get(offset..offset + 4)?;
  Some(
    (bytes[0] as u32)
      | ((bytes[1] as u32) << 8)
      | ((bytes[2] as u32) << 16)
      | ((bytes[3] as u32) << 24)
  )
}
