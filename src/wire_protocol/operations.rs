//! `Message`: the tagged union over the nine wire-protocol opcodes, and the
//! scatter/gather/swab machinery that moves it to and from bytes.

use std::borrow::Cow;
use std::fmt;
use std::io::IoSlice;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::wire_protocol::field::{read_i32, read_i64, read_u8, BsonArrayTail, Cstring, RawBson, RawTail};
use crate::wire_protocol::flags::{OpDeleteFlags, OpInsertFlags, OpQueryFlags, OpReplyFlags, OpUpdateFlags};
use crate::wire_protocol::header::{Header, OpCode, HEADER_LEN};

/// The document-bearing tail of an `OP_INSERT`/`OP_UPDATE`/`OP_QUERY` body.
///
/// `Scattered` is how a caller hands a large batch of pre-encoded documents
/// to `gather` without copying them into one contiguous buffer first, which
/// is the whole point of vectored I/O. `Tail` is how `scatter` hands back a
/// decoded message, where the documents necessarily occupy one contiguous
/// slice of the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Documents<'a> {
    Scattered(&'a [&'a [u8]]),
    Tail(BsonArrayTail<'a>),
}

impl<'a> Documents<'a> {
    fn iter_slices(&self) -> Box<dyn Iterator<Item = &'a [u8]> + 'a> {
        match *self {
            Documents::Scattered(docs) => Box::new(docs.iter().copied()),
            Documents::Tail(tail) => Box::new(std::iter::once(tail.as_bytes())),
        }
    }

    fn byte_len(&self) -> usize {
        match *self {
            Documents::Scattered(docs) => docs.iter().map(|d| d.len()).sum(),
            Documents::Tail(tail) => tail.as_bytes().len(),
        }
    }
}

/// The opcode-specific body of a [`Message`]. Scalar fields and cstrings are
/// stored by value; document-bearing fields borrow from either the caller's
/// buffers (encode side) or the receive buffer (decode side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<'a> {
    Reply {
        flags: OpReplyFlags,
        cursor_id: i64,
        starting_from: i32,
        number_returned: i32,
        documents: BsonArrayTail<'a>,
    },
    Update {
        full_collection_name: Cstring<'a>,
        flags: OpUpdateFlags,
        selector: RawBson<'a>,
        update: RawBson<'a>,
    },
    Insert {
        flags: OpInsertFlags,
        full_collection_name: Cstring<'a>,
        documents: Documents<'a>,
    },
    Query {
        flags: OpQueryFlags,
        full_collection_name: Cstring<'a>,
        number_to_skip: i32,
        number_to_return: i32,
        query: RawBson<'a>,
        return_fields_selector: Option<RawBson<'a>>,
    },
    GetMore {
        full_collection_name: Cstring<'a>,
        number_to_return: i32,
        cursor_id: i64,
    },
    Delete {
        full_collection_name: Cstring<'a>,
        flags: OpDeleteFlags,
        selector: RawBson<'a>,
    },
    KillCursors {
        /// Owned on decode because the array of little-endian `i64`s is not
        /// naturally aligned inside the receive buffer; borrowed on encode,
        /// where the caller already has an `i64` slice in hand. This is the
        /// one field in this crate that is not zero-copy on decode.
        cursor_ids: Cow<'a, [i64]>,
    },
    Compressed {
        original_opcode: OpCode,
        uncompressed_size: i32,
        compressor_id: u8,
        compressed_message: RawTail<'a>,
    },
    Msg {
        flag_bits: u32,
        sections: RawTail<'a>,
    },
}

/// A decoded or about-to-be-encoded wire-protocol message: a header plus its
/// opcode-specific body.
///
/// `header.msg_len` on a freshly-constructed outbound `Message` is a
/// placeholder (`0`); the authoritative length lives in the bytes
/// [`Message::gather`] produces, not in this struct, since computing it
/// requires walking the payload's document/tail fields anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<'a> {
    pub header: Header,
    pub payload: Payload<'a>,
}

/// The fields of `OP_REPLY` a caller needs before deciding whether to
/// decode the rest of the message: returned by [`Message::scatter_reply_header_only`]
/// without touching the document bytes at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeaderView {
    pub flags: OpReplyFlags,
    pub cursor_id: i64,
    pub starting_from: i32,
    pub number_returned: i32,
}

/// The result of [`Message::gather`]: an owned scratch buffer for the
/// message's fixed-size prefix, plus the borrowed document/tail slices that
/// follow it. Kept separate from `Message` so `gather` only ever needs a
/// shared reference to the message it is serializing.
#[derive(Debug)]
pub struct Gathered<'a> {
    scratch: Vec<u8>,
    tail: Vec<&'a [u8]>,
}

impl<'a> Gathered<'a> {
    /// The vectored write: one `IoSlice` over the scratch prefix, followed
    /// by one per document/tail field, in wire order. Nothing here copies;
    /// the tail slices still point at the caller's or the receive buffer's
    /// original bytes.
    pub fn io_slices(&self) -> Vec<IoSlice<'_>> {
        let mut out = Vec::with_capacity(1 + self.tail.len());
        out.push(IoSlice::new(&self.scratch));
        out.extend(self.tail.iter().map(|slice| IoSlice::new(slice)));
        out
    }

    /// Total length of the gathered message, header included. Matches the
    /// `msg_len` baked into `scratch`.
    pub fn message_len(&self) -> usize {
        self.scratch.len() + self.tail.iter().map(|s| s.len()).sum::<usize>()
    }
}

impl<'a> Message<'a> {
    fn new(header: Header, payload: Payload<'a>) -> Message<'a> {
        Message { header, payload }
    }

    pub fn new_update(
        request_id: i32,
        full_collection_name: &'a str,
        flags: OpUpdateFlags,
        selector: RawBson<'a>,
        update: RawBson<'a>,
    ) -> Message<'a> {
        Message::new(
            Header::new(OpCode::Update, request_id, 0),
            Payload::Update {
                full_collection_name: Cstring::new(full_collection_name.as_bytes()),
                flags,
                selector,
                update,
            },
        )
    }

    pub fn new_insert(
        request_id: i32,
        flags: OpInsertFlags,
        full_collection_name: &'a str,
        documents: Documents<'a>,
    ) -> Message<'a> {
        Message::new(
            Header::new(OpCode::Insert, request_id, 0),
            Payload::Insert {
                flags,
                full_collection_name: Cstring::new(full_collection_name.as_bytes()),
                documents,
            },
        )
    }

    pub fn new_query(
        request_id: i32,
        full_collection_name: &'a str,
        number_to_skip: i32,
        number_to_return: i32,
        query: RawBson<'a>,
        return_fields_selector: Option<RawBson<'a>>,
        flags: OpQueryFlags,
    ) -> Message<'a> {
        Message::new(
            Header::new(OpCode::Query, request_id, 0),
            Payload::Query {
                flags,
                full_collection_name: Cstring::new(full_collection_name.as_bytes()),
                number_to_skip,
                number_to_return,
                query,
                return_fields_selector,
            },
        )
    }

    pub fn new_get_more(
        request_id: i32,
        full_collection_name: &'a str,
        number_to_return: i32,
        cursor_id: i64,
    ) -> Message<'a> {
        Message::new(
            Header::new(OpCode::GetMore, request_id, 0),
            Payload::GetMore {
                full_collection_name: Cstring::new(full_collection_name.as_bytes()),
                number_to_return,
                cursor_id,
            },
        )
    }

    pub fn new_delete(
        request_id: i32,
        full_collection_name: &'a str,
        flags: OpDeleteFlags,
        selector: RawBson<'a>,
    ) -> Message<'a> {
        Message::new(
            Header::new(OpCode::Delete, request_id, 0),
            Payload::Delete {
                full_collection_name: Cstring::new(full_collection_name.as_bytes()),
                flags,
                selector,
            },
        )
    }

    pub fn new_kill_cursors(request_id: i32, cursor_ids: &'a [i64]) -> Message<'a> {
        Message::new(
            Header::new(OpCode::KillCursors, request_id, 0),
            Payload::KillCursors {
                cursor_ids: Cow::Borrowed(cursor_ids),
            },
        )
    }

    /// Wraps pre-compressed bytes in an `OP_COMPRESSED` envelope. Used by
    /// [`crate::wire_protocol::compression::wrap`]; exposed here because it
    /// is plain opcode-union construction, not a compression concern.
    pub fn new_compressed(
        request_id: i32,
        original_opcode: OpCode,
        uncompressed_size: i32,
        compressor_id: u8,
        compressed_message: &'a [u8],
    ) -> Message<'a> {
        Message::new(
            Header::new(OpCode::Compressed, request_id, 0),
            Payload::Compressed {
                original_opcode,
                uncompressed_size,
                compressor_id,
                compressed_message: RawTail::new(compressed_message),
            },
        )
    }

    /// Builds the vectored write for this message. The returned
    /// [`Gathered`] owns the fixed-size prefix (header, flags, scalars,
    /// cstrings); its document/tail fields still borrow the buffers the
    /// caller or the receive buffer already owns, so gathering never copies
    /// a document.
    ///
    /// Every opcode this crate models places its scalar and cstring fields
    /// before its document/tail fields, so exactly one scratch-backed
    /// `IoSlice` followed by zero or more borrowed-slice `IoSlice`s suffices.
    pub fn gather(&self) -> Result<Gathered<'a>> {
        let mut scratch = Vec::new();
        self.header.write_to(&mut scratch);

        let mut tail: Vec<&'a [u8]> = Vec::new();

        match &self.payload {
            Payload::Reply { .. } => {
                return Err(Error::ArgumentError(
                    "OP_REPLY is only ever produced by a server; this crate only decodes it"
                        .to_string(),
                ));
            }
            Payload::Update {
                full_collection_name,
                flags,
                selector,
                update,
            } => {
                scratch
                    .write_i32::<LittleEndian>(0)
                    .expect("writing to a Vec<u8> cannot fail"); // ZERO, reserved
                scratch.extend_from_slice(full_collection_name.as_bytes());
                scratch.push(0);
                scratch
                    .write_i32::<LittleEndian>(flags.bits())
                    .expect("writing to a Vec<u8> cannot fail");
                tail.push(selector.as_bytes());
                tail.push(update.as_bytes());
            }
            Payload::Insert {
                flags,
                full_collection_name,
                documents,
            } => {
                scratch
                    .write_i32::<LittleEndian>(flags.bits())
                    .expect("writing to a Vec<u8> cannot fail");
                scratch.extend_from_slice(full_collection_name.as_bytes());
                scratch.push(0);
                tail.extend(documents.iter_slices());
            }
            Payload::Query {
                flags,
                full_collection_name,
                number_to_skip,
                number_to_return,
                query,
                return_fields_selector,
            } => {
                scratch
                    .write_i32::<LittleEndian>(flags.bits())
                    .expect("writing to a Vec<u8> cannot fail");
                scratch.extend_from_slice(full_collection_name.as_bytes());
                scratch.push(0);
                scratch
                    .write_i32::<LittleEndian>(*number_to_skip)
                    .expect("writing to a Vec<u8> cannot fail");
                scratch
                    .write_i32::<LittleEndian>(*number_to_return)
                    .expect("writing to a Vec<u8> cannot fail");
                tail.push(query.as_bytes());
                if let Some(selector) = return_fields_selector {
                    tail.push(selector.as_bytes());
                }
            }
            Payload::GetMore {
                full_collection_name,
                number_to_return,
                cursor_id,
            } => {
                scratch
                    .write_i32::<LittleEndian>(0)
                    .expect("writing to a Vec<u8> cannot fail"); // ZERO, reserved
                scratch.extend_from_slice(full_collection_name.as_bytes());
                scratch.push(0);
                scratch
                    .write_i32::<LittleEndian>(*number_to_return)
                    .expect("writing to a Vec<u8> cannot fail");
                scratch
                    .write_i64::<LittleEndian>(*cursor_id)
                    .expect("writing to a Vec<u8> cannot fail");
            }
            Payload::Delete {
                full_collection_name,
                flags,
                selector,
            } => {
                scratch
                    .write_i32::<LittleEndian>(0)
                    .expect("writing to a Vec<u8> cannot fail"); // ZERO, reserved
                scratch.extend_from_slice(full_collection_name.as_bytes());
                scratch.push(0);
                scratch
                    .write_i32::<LittleEndian>(flags.bits())
                    .expect("writing to a Vec<u8> cannot fail");
                tail.push(selector.as_bytes());
            }
            Payload::KillCursors { cursor_ids } => {
                scratch
                    .write_i32::<LittleEndian>(0)
                    .expect("writing to a Vec<u8> cannot fail"); // ZERO, reserved
                scratch
                    .write_i32::<LittleEndian>(cursor_ids.len() as i32)
                    .expect("writing to a Vec<u8> cannot fail");
                for id in cursor_ids.iter() {
                    scratch
                        .write_i64::<LittleEndian>(*id)
                        .expect("writing to a Vec<u8> cannot fail");
                }
            }
            Payload::Compressed {
                original_opcode,
                uncompressed_size,
                compressor_id,
                compressed_message,
            } => {
                scratch
                    .write_i32::<LittleEndian>(*original_opcode as i32)
                    .expect("writing to a Vec<u8> cannot fail");
                scratch
                    .write_i32::<LittleEndian>(*uncompressed_size)
                    .expect("writing to a Vec<u8> cannot fail");
                scratch.push(*compressor_id);
                tail.push(compressed_message.as_bytes());
            }
            Payload::Msg { flag_bits, sections } => {
                scratch
                    .write_u32::<LittleEndian>(*flag_bits)
                    .expect("writing to a Vec<u8> cannot fail");
                tail.push(sections.as_bytes());
            }
        }

        let total_len = scratch.len() + tail.iter().map(|s| s.len()).sum::<usize>();
        scratch[0..4].copy_from_slice(&(total_len as i32).to_le_bytes());

        Ok(Gathered { scratch, tail })
    }

    /// Parses `buf` (header and body) into a `Message` that borrows from it.
    pub fn scatter(buf: &'a [u8]) -> Result<Message<'a>> {
        let (header, mut body) = Header::decode(buf)?;
        if header.msg_len as usize != buf.len() {
            return Err(Error::ProtocolInvalidReply(format!(
                "header declared msg_len {} but buffer holds {} bytes",
                header.msg_len,
                buf.len()
            )));
        }

        let payload = match header.opcode {
            OpCode::Reply => {
                let flags = OpReplyFlags::from_bits_truncate(read_i32(&mut body, "flags")?);
                let cursor_id = read_i64(&mut body, "cursor_id")?;
                let starting_from = read_i32(&mut body, "starting_from")?;
                let number_returned = read_i32(&mut body, "number_returned")?;
                Payload::Reply {
                    flags,
                    cursor_id,
                    starting_from,
                    number_returned,
                    documents: BsonArrayTail::new(body),
                }
            }
            OpCode::Update => {
                let _zero = read_i32(&mut body, "ZERO")?;
                let full_collection_name = Cstring::decode(&mut body, "full_collection_name")?;
                let flags = OpUpdateFlags::from_bits_truncate(read_i32(&mut body, "flags")?);
                let selector = RawBson::decode(&mut body)?;
                let update = RawBson::decode(&mut body)?;
                Payload::Update {
                    full_collection_name,
                    flags,
                    selector,
                    update,
                }
            }
            OpCode::Insert => {
                let flags = OpInsertFlags::from_bits_truncate(read_i32(&mut body, "flags")?);
                let full_collection_name = Cstring::decode(&mut body, "full_collection_name")?;
                Payload::Insert {
                    flags,
                    full_collection_name,
                    documents: Documents::Tail(BsonArrayTail::new(body)),
                }
            }
            OpCode::Query => {
                let flags = OpQueryFlags::from_bits_truncate(read_i32(&mut body, "flags")?);
                let full_collection_name = Cstring::decode(&mut body, "full_collection_name")?;
                let number_to_skip = read_i32(&mut body, "number_to_skip")?;
                let number_to_return = read_i32(&mut body, "number_to_return")?;
                let query = RawBson::decode(&mut body)?;
                let return_fields_selector = if body.is_empty() {
                    None
                } else {
                    Some(RawBson::decode(&mut body)?)
                };
                Payload::Query {
                    flags,
                    full_collection_name,
                    number_to_skip,
                    number_to_return,
                    query,
                    return_fields_selector,
                }
            }
            OpCode::GetMore => {
                let _zero = read_i32(&mut body, "ZERO")?;
                let full_collection_name = Cstring::decode(&mut body, "full_collection_name")?;
                let number_to_return = read_i32(&mut body, "number_to_return")?;
                let cursor_id = read_i64(&mut body, "cursor_id")?;
                Payload::GetMore {
                    full_collection_name,
                    number_to_return,
                    cursor_id,
                }
            }
            OpCode::Delete => {
                let _zero = read_i32(&mut body, "ZERO")?;
                let full_collection_name = Cstring::decode(&mut body, "full_collection_name")?;
                let flags = OpDeleteFlags::from_bits_truncate(read_i32(&mut body, "flags")?);
                let selector = RawBson::decode(&mut body)?;
                Payload::Delete {
                    full_collection_name,
                    flags,
                    selector,
                }
            }
            OpCode::KillCursors => {
                let _zero = read_i32(&mut body, "ZERO")?;
                let number_of_cursor_ids = read_i32(&mut body, "number_of_cursor_ids")?;
                if number_of_cursor_ids < 0 {
                    return Err(Error::ProtocolInvalidReply(
                        "negative number_of_cursor_ids".to_string(),
                    ));
                }
                let mut cursor_ids = Vec::with_capacity(number_of_cursor_ids as usize);
                for _ in 0..number_of_cursor_ids {
                    cursor_ids.push(read_i64(&mut body, "cursor_ids")?);
                }
                Payload::KillCursors {
                    cursor_ids: Cow::Owned(cursor_ids),
                }
            }
            OpCode::Compressed => {
                let original_opcode = OpCode::from_i32(read_i32(&mut body, "original_opcode")?)?;
                let uncompressed_size = read_i32(&mut body, "uncompressed_size")?;
                let compressor_id = read_u8(&mut body, "compressor_id")?;
                Payload::Compressed {
                    original_opcode,
                    uncompressed_size,
                    compressor_id,
                    compressed_message: RawTail::new(body),
                }
            }
            OpCode::Msg => {
                let flag_bits = {
                    let mut cursor = body;
                    let v = byteorder::ReadBytesExt::read_u32::<LittleEndian>(&mut cursor)
                        .map_err(|_| Error::TruncatedField("flag_bits"))?;
                    body = cursor;
                    v
                };
                Payload::Msg {
                    flag_bits,
                    sections: RawTail::new(body),
                }
            }
        };

        Ok(Message::new(header, payload))
    }

    /// Reads only the fixed-size prefix of an `OP_REPLY`, without validating
    /// or borrowing the document bytes that follow. Used by callers that
    /// need to check `cursor_id`/`flags` before committing to a full decode.
    pub fn scatter_reply_header_only(buf: &[u8]) -> Result<ReplyHeaderView> {
        let (header, mut body) = Header::decode(buf)?;
        if header.opcode != OpCode::Reply {
            return Err(Error::ProtocolInvalidReply(format!(
                "expected OP_REPLY, got opcode {}",
                header.opcode as i32
            )));
        }
        let flags = OpReplyFlags::from_bits_truncate(read_i32(&mut body, "flags")?);
        let cursor_id = read_i64(&mut body, "cursor_id")?;
        let starting_from = read_i32(&mut body, "starting_from")?;
        let number_returned = read_i32(&mut body, "number_returned")?;
        Ok(ReplyHeaderView {
            flags,
            cursor_id,
            starting_from,
            number_returned,
        })
    }
}

/// Normalizes a message's multi-byte fields to little-endian host
/// representation after reading it off the wire.
///
/// This is a deliberate no-op: every scalar field in this crate is read and
/// written exclusively through [`byteorder::LittleEndian`] or
/// `to_le_bytes`/`from_le_bytes`, so the in-memory representation is always
/// already correct regardless of host endianness. There is no intermediate
/// host-native representation for this function to fix up. It exists so the
/// gather/scatter pipeline has an explicit seam at the place the wire format
/// historically required a byte-swap, and so `swab_to_le` composed with
/// `swab_from_le` is trivially the identity.
pub fn swab_to_le(msg: Message<'_>) -> Message<'_> {
    msg
}

/// See [`swab_to_le`].
pub fn swab_from_le(msg: Message<'_>) -> Message<'_> {
    msg
}

fn hex_dump(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    const MAX: usize = 64;
    let shown = &bytes[..bytes.len().min(MAX)];
    for b in shown {
        write!(f, "{:02x}", b)?;
    }
    if bytes.len() > MAX {
        write!(f, "...({} bytes total)", bytes.len())?;
    }
    Ok(())
}

fn fmt_bson(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match RawBson::new(bytes).to_document() {
        Ok(doc) => write!(f, "{}", doc),
        Err(_) => {
            write!(f, "<invalid bson, ")?;
            hex_dump(bytes, f)?;
            write!(f, ">")
        }
    }
}

impl<'a> fmt::Display for Message<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:?} request_id={} response_to={} len={}",
            self.header.opcode, self.header.request_id, self.header.response_to, self.header.msg_len
        )?;
        match &self.payload {
            Payload::Reply {
                flags,
                cursor_id,
                starting_from,
                number_returned,
                documents,
            } => {
                writeln!(
                    f,
                    "  flags={:?} cursor_id={} starting_from={} number_returned={}",
                    flags, cursor_id, starting_from, number_returned
                )?;
                for doc in documents.iter() {
                    match doc {
                        Ok(doc) => {
                            write!(f, "  doc: ")?;
                            fmt_bson(doc.as_bytes(), f)?;
                            writeln!(f)?;
                        }
                        Err(e) => writeln!(f, "  <malformed document: {}>", e)?,
                    }
                }
                Ok(())
            }
            Payload::Update {
                full_collection_name,
                flags,
                selector,
                update,
            } => {
                writeln!(
                    f,
                    "  ns={} flags={:?}",
                    full_collection_name.to_string_lossy(),
                    flags
                )?;
                write!(f, "  selector: ")?;
                fmt_bson(selector.as_bytes(), f)?;
                writeln!(f)?;
                write!(f, "  update: ")?;
                fmt_bson(update.as_bytes(), f)?;
                writeln!(f)
            }
            Payload::Insert {
                flags,
                full_collection_name,
                documents,
            } => {
                writeln!(
                    f,
                    "  ns={} flags={:?} documents={} bytes",
                    full_collection_name.to_string_lossy(),
                    flags,
                    documents.byte_len()
                )
            }
            Payload::Query {
                flags,
                full_collection_name,
                number_to_skip,
                number_to_return,
                query,
                return_fields_selector,
            } => {
                writeln!(
                    f,
                    "  ns={} flags={:?} skip={} return={}",
                    full_collection_name.to_string_lossy(),
                    flags,
                    number_to_skip,
                    number_to_return
                )?;
                write!(f, "  query: ")?;
                fmt_bson(query.as_bytes(), f)?;
                writeln!(f)?;
                if let Some(selector) = return_fields_selector {
                    write!(f, "  fields: ")?;
                    fmt_bson(selector.as_bytes(), f)?;
                    writeln!(f)?;
                }
                Ok(())
            }
            Payload::GetMore {
                full_collection_name,
                number_to_return,
                cursor_id,
            } => writeln!(
                f,
                "  ns={} return={} cursor_id={}",
                full_collection_name.to_string_lossy(),
                number_to_return,
                cursor_id
            ),
            Payload::Delete {
                full_collection_name,
                flags,
                selector,
            } => {
                writeln!(
                    f,
                    "  ns={} flags={:?}",
                    full_collection_name.to_string_lossy(),
                    flags
                )?;
                write!(f, "  selector: ")?;
                fmt_bson(selector.as_bytes(), f)?;
                writeln!(f)
            }
            Payload::KillCursors { cursor_ids } => {
                writeln!(f, "  cursor_ids={:?}", cursor_ids)
            }
            Payload::Compressed {
                original_opcode,
                uncompressed_size,
                compressor_id,
                compressed_message,
            } => writeln!(
                f,
                "  original_opcode={:?} uncompressed_size={} compressor_id={} compressed_len={}",
                original_opcode,
                uncompressed_size,
                compressor_id,
                compressed_message.as_bytes().len()
            ),
            Payload::Msg { flag_bits, sections } => {
                write!(f, "  flag_bits={:#010x} sections: ", flag_bits)?;
                hex_dump(sections.as_bytes(), f)?;
                writeln!(f)
            }
        }
    }
}
