//! The method registry: a fixed-capacity table of loaded method records,
//! addressed by a caller-assigned reference id and by the token the loader
//! assigned for call resolution. Registration is the only point where a
//! record's invariants are checked; the interpreter trusts a registered
//! record completely.

use std::fmt::{Display, Formatter};

use crate::bytecode::MethodToken;
use crate::error::LoadError;

/// Default number of registry slots. Overridable per machine through
/// `with_capacity`; exceeding whatever capacity was chosen is a load error,
/// never a silent overwrite.
pub const DEFAULT_MAX_METHODS: usize = 10;

/// Upper bounds a record's declared maxima must respect. These bound the
/// memory one frame can pin, since frames are sized from the declarations.
pub const MAX_PARAMETERS: usize = 10;
pub const MAX_LOCALS: usize = 10;
pub const MAX_STACK: usize = 10;

/// Method attribute bits from the load header: bit 0 static, bit 1 virtual,
/// bit 2 special method (ctor/cctor).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct MethodFlags(u8);

impl MethodFlags {
  pub const STATIC:  MethodFlags = MethodFlags(0b0000_0001);
  pub const VIRTUAL: MethodFlags = MethodFlags(0b0000_0010);
  pub const SPECIAL: MethodFlags = MethodFlags(0b0000_0100);

  pub fn from_bits(bits: u8) -> MethodFlags {
    MethodFlags(bits)
  }

  pub fn contains(&self, other: MethodFlags) -> bool {
    self.0 & other.0 == other.0
  }

  pub fn is_static(&self) -> bool {
    self.contains(MethodFlags::STATIC)
  }

  pub fn is_virtual(&self) -> bool {
    self.contains(MethodFlags::VIRTUAL)
  }

  pub fn is_special(&self) -> bool {
    self.contains(MethodFlags::SPECIAL)
  }
}

impl Display for MethodFlags {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}{}{}",
      if self.is_static()  { 'S' } else { '-' },
      if self.is_virtual() { 'V' } else { '-' },
      if self.is_special() { 'P' } else { '-' }
    )
  }
}

/// The declared header of a method as supplied by the loader, ahead of the
/// code bytes themselves.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MethodHeader {
  /// Caller-assigned reference id the record is addressed by.
  pub reference:   u8,
  pub flags:       MethodFlags,
  /// Declared byte length of the code. Must match the assembled buffer.
  pub code_length: u16,
  /// Declared number of local variable slots.
  pub max_locals:  u8,
  /// Declared maximum operand stack depth.
  pub max_stack:   u8,
  /// Declared argument count.
  pub num_args:    u8,
  /// Externally assigned token identifying the method for call resolution.
  pub token:       MethodToken,
}

/// One loaded program: a validated header plus the raw code bytes. Owned
/// exclusively by the registry slot it occupies.
pub struct MethodRecord {
  header: MethodHeader,
  code:   Vec<u8>
}

impl MethodRecord {
  /**
    Validates the header against the supplied buffer and the compile-time
    maxima. This is the only checkpoint: a record that exists has consistent
    declarations.
  */
  pub fn new(header: MethodHeader, code: Vec<u8>) -> Result<MethodRecord, LoadError> {
    let malformed = |reason: String| {
      LoadError::MalformedRecord { reference: header.reference, reason }
    };

    if header.code_length as usize != code.len() {
      return Err(malformed(format!(
        "declared code length {} but {} bytes were supplied",
        header.code_length,
        code.len()
      )));
    }
    if code.is_empty() {
      return Err(malformed("method has no code".to_string()));
    }
    if header.num_args as usize > MAX_PARAMETERS {
      return Err(malformed(format!(
        "declares {} arguments, limit is {}",
        header.num_args, MAX_PARAMETERS
      )));
    }
    if header.max_locals as usize > MAX_LOCALS {
      return Err(malformed(format!(
        "declares {} locals, limit is {}",
        header.max_locals, MAX_LOCALS
      )));
    }
    if header.max_stack as usize > MAX_STACK {
      return Err(malformed(format!(
        "declares stack depth {}, limit is {}",
        header.max_stack, MAX_STACK
      )));
    }

    Ok(MethodRecord { header, code })
  }

  pub fn reference(&self) -> u8 {
    self.header.reference
  }

  pub fn flags(&self) -> MethodFlags {
    self.header.flags
  }

  pub fn token(&self) -> MethodToken {
    self.header.token
  }

  pub fn code(&self) -> &[u8] {
    &self.code
  }

  pub fn num_args(&self) -> usize {
    self.header.num_args as usize
  }

  pub fn max_locals(&self) -> usize {
    self.header.max_locals as usize
  }

  pub fn max_stack(&self) -> usize {
    self.header.max_stack as usize
  }
}

/// Fixed-capacity mapping from reference id to method record. Capacity is a
/// single explicit value fixed at construction; the slot vector is allocated
/// once and never grows.
pub struct MethodRegistry {
  slots: Vec<Option<MethodRecord>>
}

impl MethodRegistry {
  pub fn new() -> MethodRegistry {
    MethodRegistry::with_capacity(DEFAULT_MAX_METHODS)
  }

  pub fn with_capacity(capacity: usize) -> MethodRegistry {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || None);
    MethodRegistry { slots }
  }

  /**
    Registers a record under its reference id. A record already loaded under
    the same id is replaced (the loader may redefine a method); a new id
    takes a free slot, and `RegistryFull` is returned when none remains. On
    error the registry is unchanged.
  */
  pub fn register(&mut self, record: MethodRecord) -> Result<(), LoadError> {
    let reference = record.reference();

    if let Some(slot) = self
      .slots
      .iter_mut()
      .find(|slot| matches!(slot, Some(existing) if existing.reference() == reference))
    {
      *slot = Some(record);
      return Ok(());
    }

    match self.slots.iter_mut().find(|slot| slot.is_none()) {
      Some(slot) => {
        *slot = Some(record);
        Ok(())
      }
      None => Err(LoadError::RegistryFull { reference })
    }
  }

  /// Looks a record up by its caller-assigned reference id.
  pub fn lookup(&self, reference: u8) -> Option<&MethodRecord> {
    self.records().find(|record| record.reference() == reference)
  }

  /**
    Resolves a token embedded in a call instruction to the record it
    denotes. Resolution is deterministic and total over the tokens of the
    currently registered records: records only enter the registry fully
    formed, so a partially-registered record can never be observed.
  */
  pub fn resolve_token(&self, token: MethodToken) -> Option<&MethodRecord> {
    self.records().find(|record| record.token() == token)
  }

  /// Iterates the occupied slots.
  pub fn records(&self) -> impl Iterator<Item = &MethodRecord> {
    self.slots.iter().filter_map(|slot| slot.as_ref())
  }

  pub fn used(&self) -> usize {
    self.records().count()
  }

  pub fn free(&self) -> usize {
    self.capacity() - self.used()
  }

  pub fn capacity(&self) -> usize {
    self.slots.len()
  }

  /// Discards every loaded record. There is no partial reset.
  pub fn reset(&mut self) {
    for slot in self.slots.iter_mut() {
      *slot = None;
    }
  }
}

impl Default for MethodRegistry {
  fn default() -> MethodRegistry {
    MethodRegistry::new()
  }
}
