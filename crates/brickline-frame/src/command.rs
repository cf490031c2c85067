use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, MemoryRegion, Result};
use crate::opcode::{CommandKind, Opcode, SystemOpcode, MAX_GLOBAL_SIZE, MAX_LOCAL_SIZE};

/// Length field (2) + sequence id (2) + kind (1).
pub const HEADER_SIZE: usize = 5;

/// Direct commands append two bytes of reply-buffer sizes.
pub const DIRECT_HEADER_SIZE: usize = HEADER_SIZE + 2;

/// Largest sizes the packed memory bytes can carry (10 and 6 bits).
const GLOBAL_FIELD_MAX: usize = 0x3FF;
const LOCAL_FIELD_MAX: usize = 0x3F;

const PARAM_BYTE: u8 = 0x81;
const PARAM_SHORT: u8 = 0x82;
const PARAM_INT: u8 = 0x83;
const PARAM_STRING: u8 = 0x84;
const LOCAL_INDEX_1: u8 = 0xC1;
const GLOBAL_INDEX_1: u8 = 0xE1;
const GLOBAL_INDEX_2: u8 = 0xE2;

/// An immutable, fully built command.
///
/// The sequence id is not part of the value; the session stamps it in when
/// the command is encoded for sending, so one value can be sent any number
/// of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    global_size: u16,
    local_size: u8,
    body: Bytes,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Bytes of global reply memory the brick fills in.
    pub fn global_size(&self) -> usize {
        self.global_size as usize
    }

    pub fn local_size(&self) -> usize {
        self.local_size as usize
    }

    /// The opcode stream following the header.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Total size of the encoded frame, length field included.
    pub fn wire_size(&self) -> usize {
        let header = if self.kind.is_direct() {
            DIRECT_HEADER_SIZE
        } else {
            HEADER_SIZE
        };
        header + self.body.len()
    }

    /// Encode the command into a wire frame carrying `sequence`.
    ///
    /// Wire format:
    /// ```text
    /// ┌────────────┬────────────┬──────┬───────────────────┬──────────────┐
    /// │ Length     │ Sequence   │ Kind │ Global / Local    │ Opcode       │
    /// │ (2B LE)    │ (2B LE)    │ (1B) │ (2B, direct only) │ stream       │
    /// └────────────┴────────────┴──────┴───────────────────┴──────────────┘
    /// ```
    ///
    /// `Length` counts every byte after itself. The two memory bytes pack a
    /// 10-bit global size and a 6-bit local size.
    pub fn encode(&self, sequence: u16) -> Result<Bytes> {
        let wire_size = self.wire_size();
        let len = wire_size - 2;
        if len > u16::MAX as usize {
            return Err(FrameError::FrameTooLarge {
                size: wire_size,
                max: u16::MAX as usize + 2,
            });
        }

        let mut dst = BytesMut::with_capacity(wire_size);
        dst.put_u16_le(len as u16);
        dst.put_u16_le(sequence);
        dst.put_u8(self.kind.code());
        if self.kind.is_direct() {
            dst.put_u8((self.global_size & 0xFF) as u8);
            let local = (self.local_size as u16) << 2;
            dst.put_u8((local | ((self.global_size >> 8) & 0x03)) as u8);
        }
        dst.put_slice(&self.body);
        Ok(dst.freeze())
    }
}

/// Assembles a [`Command`] from protocol operations.
///
/// Parameter methods chain; the first budget or encoding violation is kept
/// and reported by [`CommandBuilder::build`].
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    kind: CommandKind,
    global_size: usize,
    local_size: usize,
    body: BytesMut,
    error: Option<FrameError>,
}

impl CommandBuilder {
    /// Start a command with no reply memory.
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            global_size: 0,
            local_size: 0,
            body: BytesMut::new(),
            error: None,
        }
    }

    /// Start a direct command that reserves reply memory on the brick.
    ///
    /// Fails with `ParameterBudgetExceeded` if either buffer is larger than
    /// the firmware allows, and with `MemorySizeUnencodable` if a size within
    /// budget does not fit the packed header field.
    pub fn with_memory(kind: CommandKind, global_size: usize, local_size: usize) -> Result<Self> {
        check_budget(MemoryRegion::Global, global_size, MAX_GLOBAL_SIZE)?;
        check_budget(MemoryRegion::Local, local_size, MAX_LOCAL_SIZE)?;
        check_field(MemoryRegion::Global, global_size, GLOBAL_FIELD_MAX)?;
        check_field(MemoryRegion::Local, local_size, LOCAL_FIELD_MAX)?;
        Ok(Self {
            global_size,
            local_size,
            ..Self::new(kind)
        })
    }

    /// Start a direct command expecting `global_size` reply bytes.
    pub fn direct_reply(global_size: usize) -> Result<Self> {
        Self::with_memory(CommandKind::DirectReply, global_size, 0)
    }

    /// Start a fire-and-forget direct command.
    pub fn direct_no_reply() -> Self {
        Self::new(CommandKind::DirectNoReply)
    }

    /// Start a system command that expects a status reply.
    pub fn system_reply() -> Self {
        Self::new(CommandKind::SystemReply)
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Append a direct opcode (one byte, or opcode + sub-command).
    pub fn opcode(&mut self, opcode: Opcode) -> &mut Self {
        let code = opcode.code();
        if code > 0xFF {
            self.body.put_u8((code >> 8) as u8);
        }
        self.body.put_u8((code & 0xFF) as u8);
        self
    }

    /// Append a system opcode.
    pub fn system_opcode(&mut self, opcode: SystemOpcode) -> &mut Self {
        self.body.put_u8(opcode.code());
        self
    }

    /// Append a one-byte constant parameter.
    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.body.put_u8(PARAM_BYTE);
        self.body.put_u8(value);
        self
    }

    /// Append a two-byte constant parameter.
    pub fn short(&mut self, value: i16) -> &mut Self {
        self.body.put_u8(PARAM_SHORT);
        self.body.put_i16_le(value);
        self
    }

    /// Append a four-byte constant parameter.
    pub fn int(&mut self, value: i32) -> &mut Self {
        self.body.put_u8(PARAM_INT);
        self.body.put_i32_le(value);
        self
    }

    /// Append a four-byte constant parameter from an unsigned count.
    pub fn uint(&mut self, value: u32) -> &mut Self {
        self.body.put_u8(PARAM_INT);
        self.body.put_u32_le(value);
        self
    }

    /// Append a NUL-terminated string constant parameter.
    pub fn string(&mut self, value: &str) -> &mut Self {
        if self.reject_nul(value) {
            return self;
        }
        self.body.put_u8(PARAM_STRING);
        self.body.put_slice(value.as_bytes());
        self.body.put_u8(0x00);
        self
    }

    /// Append a reply parameter pointing at `offset` in the global buffer.
    pub fn global_reply(&mut self, offset: usize) -> &mut Self {
        if offset >= self.global_size {
            self.fail(FrameError::ParameterBudgetExceeded {
                region: MemoryRegion::Global,
                requested: offset + 1,
                max: self.global_size,
            });
            return self;
        }
        if offset <= 0xFF {
            self.body.put_u8(GLOBAL_INDEX_1);
            self.body.put_u8(offset as u8);
        } else {
            self.body.put_u8(GLOBAL_INDEX_2);
            self.body.put_u16_le(offset as u16);
        }
        self
    }

    /// Append a reply parameter pointing at `offset` in the local buffer.
    pub fn local_reply(&mut self, offset: usize) -> &mut Self {
        if offset >= self.local_size {
            self.fail(FrameError::ParameterBudgetExceeded {
                region: MemoryRegion::Local,
                requested: offset + 1,
                max: self.local_size,
            });
            return self;
        }
        self.body.put_u8(LOCAL_INDEX_1);
        self.body.put_u8(offset as u8);
        self
    }

    /// Append a raw byte (system commands).
    pub fn raw_u8(&mut self, value: u8) -> &mut Self {
        self.body.put_u8(value);
        self
    }

    /// Append a raw little-endian u32 (system commands).
    pub fn raw_u32(&mut self, value: u32) -> &mut Self {
        self.body.put_u32_le(value);
        self
    }

    /// Append raw bytes whose length both sides know from context.
    pub fn raw_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.body.put_slice(data);
        self
    }

    /// Append a raw NUL-terminated path (system commands).
    pub fn raw_path(&mut self, path: &str) -> &mut Self {
        if self.reject_nul(path) {
            return self;
        }
        self.body.put_slice(path.as_bytes());
        self.body.put_u8(0x00);
        self
    }

    /// Finish the command.
    pub fn build(self) -> Result<Command> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let command = Command {
            kind: self.kind,
            global_size: self.global_size as u16,
            local_size: self.local_size as u8,
            body: self.body.freeze(),
        };
        let max = u16::MAX as usize + 2;
        if command.wire_size() > max {
            return Err(FrameError::FrameTooLarge {
                size: command.wire_size(),
                max,
            });
        }
        Ok(command)
    }

    fn reject_nul(&mut self, value: &str) -> bool {
        if value.as_bytes().contains(&0) {
            self.fail(FrameError::InvalidString(value.replace('\0', "\\0")));
            return true;
        }
        false
    }

    fn fail(&mut self, err: FrameError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

fn check_budget(region: MemoryRegion, requested: usize, max: usize) -> Result<()> {
    if requested > max {
        return Err(FrameError::ParameterBudgetExceeded {
            region,
            requested,
            max,
        });
    }
    Ok(())
}

fn check_field(region: MemoryRegion, size: usize, max: usize) -> Result<()> {
    if size > max {
        return Err(FrameError::MemorySizeUnencodable { region, size, max });
    }
    Ok(())
}
