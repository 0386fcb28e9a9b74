//! The 16-byte message header shared by all nine opcodes.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

pub const HEADER_LEN: usize = 16;

/// One of the nine wire-protocol operations this crate understands.
///
/// `REPLY` is the only opcode a client ever decodes from the wire under
/// normal operation, but the scatter/gather/swab machinery treats every
/// opcode symmetrically so that, e.g., tests can round-trip a `KILL_CURSORS`
/// message without a server in the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Reply = 1,
    Update = 2001,
    Insert = 2002,
    Query = 2004,
    GetMore = 2005,
    Delete = 2006,
    KillCursors = 2007,
    Compressed = 2012,
    Msg = 2013,
}

impl OpCode {
    pub fn from_i32(value: i32) -> Result<OpCode> {
        Ok(match value {
            1 => OpCode::Reply,
            2001 => OpCode::Update,
            2002 => OpCode::Insert,
            2004 => OpCode::Query,
            2005 => OpCode::GetMore,
            2006 => OpCode::Delete,
            2007 => OpCode::KillCursors,
            2012 => OpCode::Compressed,
            2013 => OpCode::Msg,
            other => return Err(Error::UnknownOpcode(other)),
        })
    }
}

/// The common 16-byte header. `msg_len` is recomputed by `gather` every time
/// a message is serialized, so constructors always start it at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub msg_len: i32,
    pub request_id: i32,
    pub response_to: i32,
    pub opcode: OpCode,
}

impl Header {
    pub fn new(opcode: OpCode, request_id: i32, response_to: i32) -> Header {
        Header {
            msg_len: 0,
            request_id,
            response_to,
            opcode,
        }
    }

    /// Parses the leading 16 bytes of `buf`, returning the header and the
    /// remainder of the buffer for the opcode-specific scatter step.
    pub fn decode(buf: &[u8]) -> Result<(Header, &[u8])> {
        if buf.len() < HEADER_LEN {
            return Err(Error::TruncatedHeader);
        }

        let mut cursor = &buf[..HEADER_LEN];
        let msg_len = cursor
            .read_i32::<LittleEndian>()
            .expect("fixed 16-byte slice has room for four i32s");
        let request_id = cursor
            .read_i32::<LittleEndian>()
            .expect("fixed 16-byte slice has room for four i32s");
        let response_to = cursor
            .read_i32::<LittleEndian>()
            .expect("fixed 16-byte slice has room for four i32s");
        let opcode_raw = cursor
            .read_i32::<LittleEndian>()
            .expect("fixed 16-byte slice has room for four i32s");
        let opcode = OpCode::from_i32(opcode_raw)?;

        Ok((
            Header {
                msg_len,
                request_id,
                response_to,
                opcode,
            },
            &buf[HEADER_LEN..],
        ))
    }

    /// Appends the header's 16-byte wire form to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.write_i32::<LittleEndian>(self.msg_len)
            .expect("writing to a Vec<u8> cannot fail");
        out.write_i32::<LittleEndian>(self.request_id)
            .expect("writing to a Vec<u8> cannot fail");
        out.write_i32::<LittleEndian>(self.response_to)
            .expect("writing to a Vec<u8> cannot fail");
        out.write_i32::<LittleEndian>(self.opcode as i32)
            .expect("writing to a Vec<u8> cannot fail");
    }
}
