//! Frame header encoding/decoding
//!
//! The frame format uses a 5-byte header:
//! - command/type code: 1 byte (u8)
//! - message id: 2 bytes (u16, big-endian)
//! - body length: 2 bytes (u16, big-endian)
//!
//! The header is always present, even for empty bodies.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::command::{Command, CommandType};
use crate::error::ProtocolError;
use crate::id::MessageId;

/// Size of the frame header in bytes
pub const HEADER_SIZE: usize = 5;

/// Maximum body size (64KB - 1, limited by the 16-bit length field)
pub const MAX_BODY_SIZE: usize = u16::MAX as usize;

/// Frame header containing the command code, correlation id and body length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Raw command/type code
    pub code: u8,
    /// Message id correlating requests with responses
    pub id: MessageId,
    /// Length of the body in bytes
    pub body_length: u16,
}

impl FrameHeader {
    /// Create a new frame header
    pub fn new(code: u8, id: MessageId, body_length: u16) -> Self {
        Self {
            code,
            id,
            body_length,
        }
    }

    /// Encode the header into a byte buffer
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_u8(self.code);
        dst.put_u16(self.id.as_u16());
        dst.put_u16(self.body_length);
    }

    /// Decode a header from a byte buffer.
    ///
    /// Returns `None` if there aren't enough bytes in the buffer yet. Every
    /// code byte is representable, so header decoding itself cannot fail;
    /// unknown codes are a dispatch concern, not a framing concern.
    pub fn decode(src: &mut BytesMut) -> Option<Self> {
        if src.len() < HEADER_SIZE {
            return None;
        }

        let code = src.get_u8();
        let id = MessageId::new(src.get_u16());
        let body_length = src.get_u16();

        Some(Self {
            code,
            id,
            body_length,
        })
    }
}

/// One complete wire-protocol message: header plus body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw command/type code
    pub code: u8,
    /// Message id
    pub id: MessageId,
    /// Raw body bytes (may be empty)
    pub body: Bytes,
}

impl Frame {
    /// Create a frame from raw parts
    pub fn new(code: u8, id: MessageId, body: Bytes) -> Self {
        Self { code, id, body }
    }

    /// Build the outgoing frame for a structured command
    pub fn from_command(id: MessageId, command: &Command) -> Self {
        Self {
            code: command.command_type().as_u8(),
            id,
            body: command.encode_body(),
        }
    }

    /// Map the raw code to a known command type, if any
    pub fn command_type(&self) -> Option<CommandType> {
        CommandType::from_u8(self.code)
    }

    /// Encode the frame (header + body) into a byte buffer
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let body_len = self.body.len();
        if body_len > MAX_BODY_SIZE {
            return Err(ProtocolError::BodyTooLarge {
                size: body_len,
                max: MAX_BODY_SIZE,
            });
        }

        let header = FrameHeader::new(self.code, self.id, body_len as u16);
        header.encode(dst);
        dst.extend_from_slice(&self.body);
        Ok(())
    }

    /// Parse one complete buffered frame.
    ///
    /// The caller must have already delivered exactly one logical frame;
    /// stream re-framing is handled by [`crate::codec::FrameCodec`]. Short
    /// buffers are rejected rather than indexed out of bounds.
    pub fn parse(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < HEADER_SIZE {
            return Err(ProtocolError::TruncatedHeader {
                expected: HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let code = buf[0];
        let id = MessageId::new(u16::from_be_bytes([buf[1], buf[2]]));
        let body_length = u16::from_be_bytes([buf[3], buf[4]]) as usize;

        let available = buf.len() - HEADER_SIZE;
        if available < body_length {
            return Err(ProtocolError::TruncatedBody {
                expected: body_length,
                actual: available,
            });
        }

        Ok(Self {
            code,
            id,
            body: Bytes::copy_from_slice(&buf[HEADER_SIZE..HEADER_SIZE + body_length]),
        })
    }
}
