//! NeoVM code generation.
//!
//! Lowers a [`PageQuery`] into a NeoVM script that calls the enumeration
//! entry point on the target contract, walks the returned iterator, and
//! collects one page of items.

use sha2::{Digest, Sha256};

use crate::ast::PageQuery;
use crate::{PagerError, Result};

/// NeoVM opcodes used by generated scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Push the next byte as a signed integer.
    PushInt8 = 0x00,
    PushInt16 = 0x01,
    PushInt32 = 0x02,
    PushInt64 = 0x03,
    /// Push n bytes; the length is a 1-byte prefix.
    PushData1 = 0x0c,
    /// Push n bytes; the length is a 2-byte little-endian prefix.
    PushData2 = 0x0d,
    /// Push n bytes; the length is a 4-byte little-endian prefix.
    PushData4 = 0x0e,
    PushM1 = 0x0f,
    Push0 = 0x10,
    Push1 = 0x11,
    Push16 = 0x20,
    /// Unconditional jump; 4-byte signed offset from the start of this
    /// instruction.
    JmpL = 0x23,
    /// Jump if the popped value is truthy.
    JmpIfL = 0x25,
    /// Jump if the popped value is falsy.
    JmpIfNotL = 0x27,
    Ret = 0x40,
    Syscall = 0x41,
    /// Initialize local variable and argument slots; operands are the
    /// local count and the argument count, one byte each.
    InitSlot = 0x57,
    LdLoc0 = 0x68,
    LdLoc1 = 0x69,
    LdLoc2 = 0x6a,
    StLoc0 = 0x70,
    StLoc1 = 0x71,
    StLoc2 = 0x72,
    Inc = 0x9c,
    /// Pops b then a; pushes 1 if a >= b.
    Ge = 0xb8,
    /// Pops n then n items; pushes them as an array.
    Pack = 0xc0,
    NewArray0 = 0xc2,
    Size = 0xca,
    /// Pops an item and an array; appends the item to the array.
    Append = 0xcf,
}

/// Interop services invoked via SYSCALL.
///
/// The wire encoding of a service is the first four bytes of the SHA-256
/// hash of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteropService {
    ContractCall,
    IteratorNext,
    IteratorValue,
}

impl InteropService {
    pub fn name(self) -> &'static str {
        match self {
            InteropService::ContractCall => "System.Contract.Call",
            InteropService::IteratorNext => "System.Iterator.Next",
            InteropService::IteratorValue => "System.Iterator.Value",
        }
    }

    /// Four-byte syscall hash as it appears on the wire.
    pub fn hash(self) -> [u8; 4] {
        let digest = Sha256::digest(self.name().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }
}

/// Forward-declared jump target inside a [`ScriptBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

/// Builds a NeoVM script byte by byte.
///
/// Jumps are emitted against [`Label`]s and patched in [`finish`], so
/// targets may be bound before or after the jumps that reference them.
///
/// [`finish`]: ScriptBuilder::finish
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    code: Vec<u8>,
    labels: Vec<Option<usize>>,
    fixups: Vec<(usize, Label)>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bare opcode.
    pub fn emit(&mut self, op: OpCode) -> &mut Self {
        self.code.push(op as u8);
        self
    }

    /// Append an opcode followed by its operand bytes.
    pub fn emit_with(&mut self, op: OpCode, operand: &[u8]) -> &mut Self {
        self.emit(op);
        self.code.extend_from_slice(operand);
        self
    }

    /// Push an integer using the smallest encoding that holds it.
    pub fn emit_push_int(&mut self, value: i64) -> &mut Self {
        if value == -1 {
            return self.emit(OpCode::PushM1);
        }
        if value == 0 {
            return self.emit(OpCode::Push0);
        }
        if (1..=16).contains(&value) {
            self.code.push(OpCode::Push1 as u8 + (value as u8 - 1));
            return self;
        }

        if let Ok(v) = i8::try_from(value) {
            self.emit_with(OpCode::PushInt8, &v.to_le_bytes())
        } else if let Ok(v) = i16::try_from(value) {
            self.emit_with(OpCode::PushInt16, &v.to_le_bytes())
        } else if let Ok(v) = i32::try_from(value) {
            self.emit_with(OpCode::PushInt32, &v.to_le_bytes())
        } else {
            self.emit_with(OpCode::PushInt64, &value.to_le_bytes())
        }
    }

    /// Push a byte string with a length prefix.
    pub fn emit_push_bytes(&mut self, data: &[u8]) -> Result<&mut Self> {
        if data.len() < 0x100 {
            self.emit_with(OpCode::PushData1, &[data.len() as u8]);
        } else if data.len() < 0x1_0000 {
            self.emit(OpCode::PushData2);
            self.code
                .extend_from_slice(&(data.len() as u16).to_le_bytes());
        } else if u32::try_from(data.len()).is_ok() {
            self.emit(OpCode::PushData4);
            self.code
                .extend_from_slice(&(data.len() as u32).to_le_bytes());
        } else {
            return Err(PagerError::Codegen {
                message: format!("data too large to push: {} bytes", data.len()),
            });
        }
        self.code.extend_from_slice(data);
        Ok(self)
    }

    /// Append a SYSCALL to the given interop service.
    pub fn emit_syscall(&mut self, service: InteropService) -> &mut Self {
        self.emit(OpCode::Syscall);
        self.code.extend_from_slice(&service.hash());
        self
    }

    /// Create a new, unbound label.
    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind a label to the current position.
    pub fn bind(&mut self, label: Label) {
        self.labels[label.0] = Some(self.code.len());
    }

    /// Append a long-form jump to a label; the offset is patched later.
    pub fn emit_jump(&mut self, op: OpCode, target: Label) -> &mut Self {
        self.fixups.push((self.code.len(), target));
        self.emit_with(op, &[0; 4])
    }

    /// Patch all jump offsets and return the finished script.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        for (at, label) in &self.fixups {
            let target = self.labels[label.0].ok_or_else(|| PagerError::Codegen {
                message: "jump to unbound label".to_string(),
            })?;
            let offset =
                i32::try_from(target as i64 - *at as i64).map_err(|_| PagerError::Codegen {
                    message: "jump offset out of range".to_string(),
                })?;
            self.code[at + 1..at + 5].copy_from_slice(&offset.to_le_bytes());
        }
        Ok(self.code)
    }
}

/// Generate a NeoVM script for one page of an enumeration.
///
/// The script calls `query.operation` on the contract with the owner bytes
/// as sole argument, then walks the returned iterator with a zero-based
/// counter: items are skipped while the counter is below `skip` and
/// collected into a result array until it holds `take` items. The array is
/// the script's return value.
///
/// # Arguments
///
/// * `query` - The parsed page query to lower
///
/// # Returns
///
/// The script bytes or a codegen error
pub fn generate(query: &PageQuery) -> Result<Vec<u8>> {
    let skip = i64::try_from(query.skip).map_err(|_| PagerError::Codegen {
        message: format!("skip count out of range: {}", query.skip),
    })?;
    let take = i64::try_from(query.take).map_err(|_| PagerError::Codegen {
        message: format!("take count out of range: {}", query.take),
    })?;

    let mut b = ScriptBuilder::new();
    let loop_top = b.label();
    let skip_item = b.label();
    let done = b.label();

    // Locals: 0 = iterator, 1 = result array, 2 = item counter.
    b.emit_with(OpCode::InitSlot, &[3, 0]);

    b.emit(OpCode::NewArray0);
    b.emit(OpCode::StLoc1);

    // iterator = contract.<operation>(owner)
    // Argument array, operation name, then the script hash reversed to
    // little-endian wire order.
    b.emit_push_bytes(&query.owner)?;
    b.emit_push_int(1);
    b.emit(OpCode::Pack);
    b.emit_push_bytes(query.operation.as_bytes())?;
    let mut hash_le = query.contract.clone();
    hash_le.reverse();
    b.emit_push_bytes(&hash_le)?;
    b.emit_syscall(InteropService::ContractCall);
    b.emit(OpCode::StLoc0);

    // counter = 0
    b.emit_push_int(0);
    b.emit(OpCode::StLoc2);

    b.bind(loop_top);
    b.emit(OpCode::LdLoc0);
    b.emit_syscall(InteropService::IteratorNext);
    b.emit_jump(OpCode::JmpIfNotL, done);

    // Collect once counter >= skip.
    b.emit(OpCode::LdLoc2);
    b.emit_push_int(skip);
    b.emit(OpCode::Ge);
    b.emit_jump(OpCode::JmpIfNotL, skip_item);

    b.emit(OpCode::LdLoc1);
    b.emit(OpCode::LdLoc0);
    b.emit_syscall(InteropService::IteratorValue);
    b.emit(OpCode::Append);

    // The page is full once `take` items are collected.
    b.emit(OpCode::LdLoc1);
    b.emit(OpCode::Size);
    b.emit_push_int(take);
    b.emit(OpCode::Ge);
    b.emit_jump(OpCode::JmpIfL, done);

    b.bind(skip_item);
    b.emit(OpCode::LdLoc2);
    b.emit(OpCode::Inc);
    b.emit(OpCode::StLoc2);
    b.emit_jump(OpCode::JmpL, loop_top);

    b.bind(done);
    b.emit(OpCode::LdLoc1);
    b.emit(OpCode::Ret);

    b.finish()
}
