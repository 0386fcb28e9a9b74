//! Field primitives shared by every opcode's scatter/gather code: cstrings,
//! self-framed BSON blobs, BSON-array tails, and raw tails. Every decoded
//! type here borrows from the buffer it was read out of -- nothing is
//! copied except the scalar integers the caller reads off of them.

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Reads a little-endian `i32` off the front of `*buf`, advancing `*buf`
/// past it. `name` is attributed to `Error::TruncatedField` on failure.
pub fn read_i32<'a>(buf: &mut &'a [u8], name: &'static str) -> Result<i32> {
    if buf.len() < 4 {
        return Err(Error::TruncatedField(name));
    }
    let mut cursor = *buf;
    let value = cursor
        .read_i32::<LittleEndian>()
        .expect("length already checked");
    *buf = cursor;
    Ok(value)
}

/// Reads a little-endian `i64` off the front of `*buf`, advancing `*buf`
/// past it.
pub fn read_i64<'a>(buf: &mut &'a [u8], name: &'static str) -> Result<i64> {
    if buf.len() < 8 {
        return Err(Error::TruncatedField(name));
    }
    let mut cursor = *buf;
    let value = cursor
        .read_i64::<LittleEndian>()
        .expect("length already checked");
    *buf = cursor;
    Ok(value)
}

/// Reads a single byte off the front of `*buf`, advancing `*buf` past it.
pub fn read_u8<'a>(buf: &mut &'a [u8], name: &'static str) -> Result<u8> {
    if buf.is_empty() {
        return Err(Error::TruncatedField(name));
    }
    let value = buf[0];
    *buf = &buf[1..];
    Ok(value)
}

/// A NUL-terminated byte string, borrowed without its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cstring<'a>(&'a [u8]);

impl<'a> Cstring<'a> {
    pub fn new(bytes: &'a [u8]) -> Cstring<'a> {
        Cstring(bytes)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    /// Lossily decodes the collection name for display; on the wire this is
    /// documented as ASCII/UTF-8, but a debug formatter must never panic on
    /// a malformed peer.
    pub fn to_string_lossy(&self) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(self.0)
    }

    /// Locates the first NUL in `*buf`, splitting it into the cstring (sans
    /// terminator) and the remainder. Advances `*buf` past the terminator.
    pub fn decode(buf: &mut &'a [u8], name: &'static str) -> Result<Cstring<'a>> {
        let nul_at = buf
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::UnterminatedCString(name))?;
        let s = Cstring(&buf[..nul_at]);
        *buf = &buf[nul_at + 1..];
        Ok(s)
    }

    /// Appends the string's bytes followed by a NUL terminator to `out`.
    pub fn encode(s: &str, out: &mut Vec<u8>) {
        out.extend_from_slice(s.as_bytes());
        out.push(0);
    }
}

/// A self-framed BSON document, borrowed in its raw on-wire form. This crate
/// treats BSON mostly as an opaque length-prefixed blob; only the reply
/// classifier and the debug formatter ever decode the bytes for real.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBson<'a>(&'a [u8]);

impl<'a> RawBson<'a> {
    /// Wraps an already-framed document. The caller (the BSON library) is
    /// trusted to have produced a correct length prefix.
    pub fn new(bytes: &'a [u8]) -> RawBson<'a> {
        debug_assert!(bytes.len() >= 5, "a BSON document is at least 5 bytes");
        RawBson(bytes)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn declared_len(&self) -> i32 {
        i32::from_le_bytes(self.0[..4].try_into().expect("4-byte prefix"))
    }

    /// Reads the 4-byte length prefix off the front of `*buf`, validates
    /// `5 <= len <= buf.len()`, and splits the document off.
    pub fn decode(buf: &mut &'a [u8]) -> Result<RawBson<'a>> {
        if buf.len() < 4 {
            return Err(Error::BadBsonLength);
        }
        let len = i32::from_le_bytes(buf[..4].try_into().expect("checked above"));
        if len < 5 || (len as usize) > buf.len() {
            return Err(Error::BadBsonLength);
        }
        let (doc, rest) = buf.split_at(len as usize);
        *buf = rest;
        Ok(RawBson(doc))
    }

    pub fn to_document(&self) -> Result<bson::Document> {
        Ok(bson::Document::from_reader(&mut std::io::Cursor::new(self.0))?)
    }
}

/// Zero or more concatenated BSON documents occupying the remainder of a
/// message (`OP_REPLY.documents`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonArrayTail<'a>(&'a [u8]);

impl<'a> BsonArrayTail<'a> {
    pub fn new(bytes: &'a [u8]) -> BsonArrayTail<'a> {
        BsonArrayTail(bytes)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> BsonArrayIter<'a> {
        BsonArrayIter(self.0)
    }

    /// The first document in the tail, if any -- used by the reply
    /// classifier, which only ever needs to look at one document.
    pub fn first(&self) -> Option<RawBson<'a>> {
        self.iter().next().and_then(std::result::Result::ok)
    }
}

pub struct BsonArrayIter<'a>(&'a [u8]);

impl<'a> Iterator for BsonArrayIter<'a> {
    type Item = Result<RawBson<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            return None;
        }
        let mut cursor = self.0;
        let result = RawBson::decode(&mut cursor);
        match result {
            Ok(doc) => {
                self.0 = cursor;
                Some(Ok(doc))
            }
            Err(e) => {
                // Poison the iterator so a malformed element doesn't loop.
                self.0 = &[];
                Some(Err(e))
            }
        }
    }
}

/// Opaque bytes running to the end of the message (`OP_COMPRESSED`'s
/// `compressed_message`, `OP_MSG`'s `sections`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTail<'a>(&'a [u8]);

impl<'a> RawTail<'a> {
    pub fn new(bytes: &'a [u8]) -> RawTail<'a> {
        RawTail(bytes)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cstring_decode_finds_nul() {
        let mut buf: &[u8] = b"test.test\0rest";
        let s = Cstring::decode(&mut buf, "collection").unwrap();
        assert_eq!(s.as_bytes(), b"test.test");
        assert_eq!(buf, b"rest");
    }

    #[test]
    fn cstring_decode_without_nul_fails() {
        let mut buf: &[u8] = b"no terminator here";
        match Cstring::decode(&mut buf, "collection") {
            Err(Error::UnterminatedCString("collection")) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn raw_bson_rejects_short_length() {
        let mut buf: &[u8] = &[4, 0, 0, 0, 0, 0];
        match RawBson::decode(&mut buf) {
            Err(Error::BadBsonLength) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn raw_bson_rejects_length_past_buffer() {
        let mut buf: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0, 0];
        match RawBson::decode(&mut buf) {
            Err(Error::BadBsonLength) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn bson_array_tail_iterates_concatenated_docs() {
        let empty = bson::Document::new();
        let mut bytes = Vec::new();
        empty.to_writer(&mut bytes).unwrap();
        let mut both = bytes.clone();
        both.extend_from_slice(&bytes);

        let tail = BsonArrayTail::new(&both);
        let docs: Vec<_> = tail.iter().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(docs.len(), 2);
    }
}
