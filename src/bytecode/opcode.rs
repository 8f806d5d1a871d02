/*!

  The opcode table of the virtual machine.

  Rust stores enum variants as consecutive natural numbers unless explicit
  discriminants are given. Here every variant carries its wire value so that
  an opcode's operand-encoding class can be determined with trivial range
  comparisons on the discriminant, exactly as the table is laid out in the
  IL opcode listing. Gaps in the numbering are unassigned opcode values;
  converting such a value from a primitive fails, which is the decoder's
  failure path.

  Single-byte opcodes occupy `0x00..=0xE0`. Two-byte opcodes, selected by
  the reserved lead byte `0xFE`, are folded into `0x100 + second byte`.

*/

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The numeric type an opcode inhabits once the two-byte space is folded in.
pub type OpcodeValue = u16;

/// Lead byte selecting the second 256-entry opcode space.
pub const OPCODE_PREFIX1: u8 = 0xFE;

/// Folded base value of the two-byte opcode space.
pub const TWO_BYTE_BASE: OpcodeValue = 0x100;

#[derive(
StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,  Debug,            Hash
)]
#[repr(u16)]
pub enum Opcode {
  // Single-byte opcodes //

  // Stack-neutral and short-form variable access, no operand
  Nop      = 0x00,
  Break    = 0x01,
  Ldarg0   = 0x02,
  Ldarg1   = 0x03,
  Ldarg2   = 0x04,
  Ldarg3   = 0x05,
  Ldloc0   = 0x06,
  Ldloc1   = 0x07,
  Ldloc2   = 0x08,
  Ldloc3   = 0x09,
  Stloc0   = 0x0A,
  Stloc1   = 0x0B,
  Stloc2   = 0x0C,
  Stloc3   = 0x0D,

  // Short-form variable access, one-byte index operand
  LdargS   = 0x0E,
  LdargaS  = 0x0F,
  StargS   = 0x10,
  LdlocS   = 0x11,
  LdlocaS  = 0x12,
  StlocS   = 0x13,

  // Constants
  Ldnull   = 0x14,
  LdcI4M1  = 0x15,
  LdcI40   = 0x16,
  LdcI41   = 0x17,
  LdcI42   = 0x18,
  LdcI43   = 0x19,
  LdcI44   = 0x1A,
  LdcI45   = 0x1B,
  LdcI46   = 0x1C,
  LdcI47   = 0x1D,
  LdcI48   = 0x1E,
  LdcI4S   = 0x1F,
  LdcI4    = 0x20,
  LdcI8    = 0x21,
  LdcR4    = 0x22,
  LdcR8    = 0x23,

  Dup      = 0x25,
  Pop      = 0x26,

  // Calls and return
  Jmp      = 0x27,
  Call     = 0x28,
  Calli    = 0x29,
  Ret      = 0x2A,

  // Short-form branches, one signed byte offset
  BrS      = 0x2B,
  BrfalseS = 0x2C,
  BrtrueS  = 0x2D,
  BeqS     = 0x2E,
  BgeS     = 0x2F,
  BgtS     = 0x30,
  BleS     = 0x31,
  BltS     = 0x32,
  BneUnS   = 0x33,
  BgeUnS   = 0x34,
  BgtUnS   = 0x35,
  BleUnS   = 0x36,
  BltUnS   = 0x37,

  // Long-form branches, four-byte offset
  Br       = 0x38,
  Brfalse  = 0x39,
  Brtrue   = 0x3A,
  Beq      = 0x3B,
  Bge      = 0x3C,
  Bgt      = 0x3D,
  Ble      = 0x3E,
  Blt      = 0x3F,
  BneUn    = 0x40,
  BgeUn    = 0x41,
  BgtUn    = 0x42,
  BleUn    = 0x43,
  BltUn    = 0x44,
  Switch   = 0x45,

  // Indirect loads and stores
  LdindI1  = 0x46,
  LdindU1  = 0x47,
  LdindI2  = 0x48,
  LdindU2  = 0x49,
  LdindI4  = 0x4A,
  LdindU4  = 0x4B,
  LdindI8  = 0x4C,
  LdindI   = 0x4D,
  LdindR4  = 0x4E,
  LdindR8  = 0x4F,
  LdindRef = 0x50,
  StindRef = 0x51,
  StindI1  = 0x52,
  StindI2  = 0x53,
  StindI4  = 0x54,
  StindI8  = 0x55,
  StindR4  = 0x56,
  StindR8  = 0x57,

  // Arithmetic and bitwise, two operands popped, one pushed
  Add      = 0x58,
  Sub      = 0x59,
  Mul      = 0x5A,
  Div      = 0x5B,
  DivUn    = 0x5C,
  Rem      = 0x5D,
  RemUn    = 0x5E,
  And      = 0x5F,
  Or       = 0x60,
  Xor      = 0x61,
  Shl      = 0x62,
  Shr      = 0x63,
  ShrUn    = 0x64,
  Neg      = 0x65,
  Not      = 0x66,

  // Conversions
  ConvI1   = 0x67,
  ConvI2   = 0x68,
  ConvI4   = 0x69,
  ConvI8   = 0x6A,
  ConvR4   = 0x6B,
  ConvR8   = 0x6C,
  ConvU4   = 0x6D,
  ConvU8   = 0x6E,

  // Object model
  Callvirt  = 0x6F,
  Cpobj     = 0x70,
  Ldobj     = 0x71,
  Ldstr     = 0x72,
  Newobj    = 0x73,
  Castclass = 0x74,
  Isinst    = 0x75,
  ConvRUn   = 0x76,
  Unbox     = 0x79,
  Throw     = 0x7A,
  Ldfld     = 0x7B,
  Ldflda    = 0x7C,
  Stfld     = 0x7D,
  Ldsfld    = 0x7E,
  Ldsflda   = 0x7F,
  Stsfld    = 0x80,
  Stobj     = 0x81,

  // Overflow-checked unsigned conversions
  ConvOvfI1Un = 0x82,
  ConvOvfI2Un = 0x83,
  ConvOvfI4Un = 0x84,
  ConvOvfI8Un = 0x85,
  ConvOvfU1Un = 0x86,
  ConvOvfU2Un = 0x87,
  ConvOvfU4Un = 0x88,
  ConvOvfU8Un = 0x89,
  ConvOvfIUn  = 0x8A,
  ConvOvfUUn  = 0x8B,

  // Arrays
  Box       = 0x8C,
  Newarr    = 0x8D,
  Ldlen     = 0x8E,
  Ldelema   = 0x8F,
  LdelemI1  = 0x90,
  LdelemU1  = 0x91,
  LdelemI2  = 0x92,
  LdelemU2  = 0x93,
  LdelemI4  = 0x94,
  LdelemU4  = 0x95,
  LdelemI8  = 0x96,
  LdelemI   = 0x97,
  LdelemR4  = 0x98,
  LdelemR8  = 0x99,
  LdelemRef = 0x9A,
  StelemI   = 0x9B,
  StelemI1  = 0x9C,
  StelemI2  = 0x9D,
  StelemI4  = 0x9E,
  StelemI8  = 0x9F,
  StelemR4  = 0xA0,
  StelemR8  = 0xA1,
  StelemRef = 0xA2,
  Ldelem    = 0xA3,
  Stelem    = 0xA4,
  UnboxAny  = 0xA5,

  // Overflow-checked signed conversions
  ConvOvfI1 = 0xB3,
  ConvOvfU1 = 0xB4,
  ConvOvfI2 = 0xB5,
  ConvOvfU2 = 0xB6,
  ConvOvfI4 = 0xB7,
  ConvOvfU4 = 0xB8,
  ConvOvfI8 = 0xB9,
  ConvOvfU8 = 0xBA,

  Refanyval = 0xC2,
  Ckfinite  = 0xC3,
  Mkrefany  = 0xC6,
  Ldtoken   = 0xD0,

  ConvU2    = 0xD1,
  ConvU1    = 0xD2,
  ConvI     = 0xD3,
  ConvOvfI  = 0xD4,
  ConvOvfU  = 0xD5,
  AddOvf    = 0xD6,
  AddOvfUn  = 0xD7,
  MulOvf    = 0xD8,
  MulOvfUn  = 0xD9,
  SubOvf    = 0xDA,
  SubOvfUn  = 0xDB,

  Endfinally = 0xDC,
  Leave      = 0xDD,
  LeaveS     = 0xDE,
  StindI     = 0xDF,
  ConvU      = 0xE0,

  // Two-byte opcodes, folded as 0x100 + second byte //

  Arglist    = 0x100,
  Ceq        = 0x101,
  Cgt        = 0x102,
  CgtUn      = 0x103,
  Clt        = 0x104,
  CltUn      = 0x105,
  Ldftn      = 0x106,
  Ldvirtftn  = 0x107,

  // Long-form variable access, two-byte index operand
  Ldarg      = 0x109,
  Ldarga     = 0x10A,
  Starg      = 0x10B,
  Ldloc      = 0x10C,
  Ldloca     = 0x10D,
  Stloc      = 0x10E,

  Localloc   = 0x10F,
  Endfilter  = 0x111,
  Unaligned  = 0x112,
  Volatile   = 0x113,
  Tail       = 0x114,
  Initobj    = 0x115,
  Constrained = 0x116,
  Cpblk      = 0x117,
  Initblk    = 0x118,
  No         = 0x119,
  Rethrow    = 0x11A,
  Sizeof     = 0x11C,
  Refanytype = 0x11D,
  Readonly   = 0x11E,
}

/**
  The operand-encoding class of an opcode: how many and what kind of bytes
  follow it in the code stream. The interpreter dispatches on this class
  first and on the specific opcode second; classes with no implemented
  opcode are first-class variants here so that "unimplemented" is an
  explicit outcome, never a fallthrough.
*/
#[derive(StrumDisplay, IntoStaticStr, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum OperandEncoding {
  /// No operand bytes.
  InlineNone,
  /// One-byte variable or argument index.
  ShortInlineVar,
  /// Two-byte variable or argument index.
  InlineVar,
  /// One-byte signed integer.
  ShortInlineI,
  /// Four-byte signed integer.
  InlineI,
  /// Eight-byte signed integer.
  InlineI8,
  /// Four-byte floating point value.
  ShortInlineR,
  /// Eight-byte floating point value.
  InlineR,
  /// One-byte signed branch offset.
  ShortInlineBrTarget,
  /// Four-byte signed branch offset.
  InlineBrTarget,
  /// Four-byte case count followed by that many four-byte branch offsets.
  InlineSwitch,
  /// Four-byte method token.
  InlineMethod,
  /// Four-byte field token.
  InlineField,
  /// Four-byte type token.
  InlineType,
  /// Four-byte string token.
  InlineString,
  /// Four-byte signature token.
  InlineSig,
  /// Four-byte token of any table.
  InlineTok,
}

impl OperandEncoding {
  /// The fixed operand size in bytes following the opcode, or `None` when
  /// the size depends on the operand itself (switch tables).
  pub fn operand_size(&self) -> Option<usize> {
    match self {

      OperandEncoding::InlineNone => Some(0),

      | OperandEncoding::ShortInlineVar
      | OperandEncoding::ShortInlineI
      | OperandEncoding::ShortInlineBrTarget => Some(1),

      OperandEncoding::InlineVar => Some(2),

      | OperandEncoding::InlineI
      | OperandEncoding::ShortInlineR
      | OperandEncoding::InlineBrTarget
      | OperandEncoding::InlineMethod
      | OperandEncoding::InlineField
      | OperandEncoding::InlineType
      | OperandEncoding::InlineString
      | OperandEncoding::InlineSig
      | OperandEncoding::InlineTok => Some(4),

      | OperandEncoding::InlineI8
      | OperandEncoding::InlineR => Some(8),

      OperandEncoding::InlineSwitch => None,

    }
  }
}

impl Opcode {
  pub fn code(&self) -> OpcodeValue {
    Into::<OpcodeValue>::into(*self)
  }

  /// Whether the opcode is encoded as `0xFE` plus a selector byte.
  pub fn is_two_byte(&self) -> bool {
    self.code() >= TWO_BYTE_BASE
  }

  /// Number of bytes the opcode itself occupies in the code stream.
  pub fn encoded_length(&self) -> usize {
    match self.is_two_byte() {
      true  => 2,
      false => 1
    }
  }

  /// The operand-encoding class, determined by discriminant ranges.
  pub fn encoding(&self) -> OperandEncoding {
    use OperandEncoding::*;

    match self.code() {
      0x00..=0x0D   => InlineNone,          // nop..stloc.3
      0x0E..=0x13   => ShortInlineVar,      // ldarg.s..stloc.s
      0x14..=0x1E   => InlineNone,          // ldnull..ldc.i4.8
      0x1F          => ShortInlineI,        // ldc.i4.s
      0x20          => InlineI,             // ldc.i4
      0x21          => InlineI8,            // ldc.i8
      0x22          => ShortInlineR,        // ldc.r4
      0x23          => InlineR,             // ldc.r8
      0x25 | 0x26   => InlineNone,          // dup, pop
      0x27 | 0x28   => InlineMethod,        // jmp, call
      0x29          => InlineSig,           // calli
      0x2A          => InlineNone,          // ret
      0x2B..=0x37   => ShortInlineBrTarget, // br.s..blt.un.s
      0x38..=0x44   => InlineBrTarget,      // br..blt.un
      0x45          => InlineSwitch,        // switch
      0x46..=0x6E   => InlineNone,          // ldind..conv.u8
      0x6F          => InlineMethod,        // callvirt
      0x70 | 0x71   => InlineType,          // cpobj, ldobj
      0x72          => InlineString,        // ldstr
      0x73          => InlineMethod,        // newobj
      0x74 | 0x75   => InlineType,          // castclass, isinst
      0x76          => InlineNone,          // conv.r.un
      0x79          => InlineType,          // unbox
      0x7A          => InlineNone,          // throw
      0x7B..=0x80   => InlineField,         // ldfld..stsfld
      0x81          => InlineType,          // stobj
      0x82..=0x8B   => InlineNone,          // conv.ovf.*.un
      0x8C | 0x8D   => InlineType,          // box, newarr
      0x8E          => InlineNone,          // ldlen
      0x8F          => InlineType,          // ldelema
      0x90..=0xA2   => InlineNone,          // ldelem.*, stelem.*
      0xA3..=0xA5   => InlineType,          // ldelem, stelem, unbox.any
      0xB3..=0xBA   => InlineNone,          // conv.ovf.*
      0xC2          => InlineType,          // refanyval
      0xC3          => InlineNone,          // ckfinite
      0xC6          => InlineType,          // mkrefany
      0xD0          => InlineTok,           // ldtoken
      0xD1..=0xDC   => InlineNone,          // conv.u2..endfinally
      0xDD          => InlineBrTarget,      // leave
      0xDE          => ShortInlineBrTarget, // leave.s
      0xDF | 0xE0   => InlineNone,          // stind.i, conv.u
      0x100..=0x105 => InlineNone,          // arglist..clt.un
      0x106 | 0x107 => InlineMethod,        // ldftn, ldvirtftn
      0x109..=0x10E => InlineVar,           // ldarg..stloc
      0x10F         => InlineNone,          // localloc
      0x111         => InlineNone,          // endfilter
      0x112         => ShortInlineI,        // unaligned.
      0x113 | 0x114 => InlineNone,          // volatile., tail.
      0x115 | 0x116 => InlineType,          // initobj, constrained.
      0x117 | 0x118 => InlineNone,          // cpblk, initblk
      0x119         => ShortInlineI,        // no.
      0x11A         => InlineNone,          // rethrow
      0x11C         => InlineType,          // sizeof
      0x11D | 0x11E => InlineNone,          // refanytype, readonly.

      // Every variant's discriminant is covered by the ranges above; other
      // values cannot be constructed.
      _ => unreachable!("opcode value outside the table")
    }
  }
}
