//! `OP_COMPRESSED` envelope handling: wrapping an outbound message's gathered
//! bytes in a compressed envelope, and unwrapping an inbound one back into
//! its original opcode.
//!
//! Compressor implementations are feature-gated so a caller only pays for
//! the codecs it asked for; `Noop` is always available since the wire
//! protocol allows a peer to "compress" with no-op at any time.

use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::wire_protocol::header::OpCode;
use crate::wire_protocol::operations::Message;

/// A compression algorithm usable in an `OP_COMPRESSED` envelope.
pub trait CompressionBackend {
    /// The wire `compressor_id` byte.
    fn id(&self) -> u8;
    fn name(&self) -> &'static str;
    fn compress(&self, level: i32, input: &[u8]) -> Result<Vec<u8>>;
    fn decompress(&self, input: &[u8], uncompressed_size: usize) -> Result<Vec<u8>>;
}

/// `compressor_id = 0`: passthrough. Always compiled in, matching the
/// protocol's requirement that a peer be able to advertise "no compression"
/// through the same envelope used by real codecs.
pub struct Noop;

impl CompressionBackend for Noop {
    fn id(&self) -> u8 {
        0
    }

    fn name(&self) -> &'static str {
        "noop"
    }

    fn compress(&self, _level: i32, input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }

    fn decompress(&self, input: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        if input.len() != uncompressed_size {
            return Err(Error::DecompressionFailed);
        }
        Ok(input.to_vec())
    }
}

#[cfg(feature = "snappy-compression")]
pub struct Snappy;

#[cfg(feature = "snappy-compression")]
impl CompressionBackend for Snappy {
    fn id(&self) -> u8 {
        1
    }

    fn name(&self) -> &'static str {
        "snappy"
    }

    fn compress(&self, _level: i32, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = snap::raw::Encoder::new();
        encoder
            .compress_vec(input)
            .map_err(|e| Error::OperationError(e.to_string()))
    }

    fn decompress(&self, input: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        let mut decoder = snap::raw::Decoder::new();
        let out = decoder
            .decompress_vec(input)
            .map_err(|_| Error::DecompressionFailed)?;
        if out.len() != uncompressed_size {
            return Err(Error::DecompressionFailed);
        }
        Ok(out)
    }
}

#[cfg(feature = "zlib-compression")]
pub struct Zlib;

#[cfg(feature = "zlib-compression")]
impl CompressionBackend for Zlib {
    fn id(&self) -> u8 {
        2
    }

    fn name(&self) -> &'static str {
        "zlib"
    }

    fn compress(&self, level: i32, input: &[u8]) -> Result<Vec<u8>> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let level = if level < 0 { 6 } else { level as u32 };
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
        encoder.write_all(input)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, input: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let mut decoder = ZlibDecoder::new(input);
        let mut out = Vec::with_capacity(uncompressed_size);
        decoder
            .read_to_end(&mut out)
            .map_err(|_| Error::DecompressionFailed)?;
        if out.len() != uncompressed_size {
            return Err(Error::DecompressionFailed);
        }
        Ok(out)
    }
}

#[cfg(feature = "zstd-compression")]
pub struct Zstd;

#[cfg(feature = "zstd-compression")]
impl CompressionBackend for Zstd {
    fn id(&self) -> u8 {
        3
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, level: i32, input: &[u8]) -> Result<Vec<u8>> {
        let level = if level < 0 { 0 } else { level };
        zstd::encode_all(input, level).map_err(Error::from)
    }

    fn decompress(&self, input: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        let out = zstd::decode_all(input).map_err(|_| Error::DecompressionFailed)?;
        if out.len() != uncompressed_size {
            return Err(Error::DecompressionFailed);
        }
        Ok(out)
    }
}

/// Resolves a `compressor_id` byte to the backend that handles it.
pub fn backend_for_id(id: u8) -> Result<Box<dyn CompressionBackend>> {
    match id {
        0 => Ok(Box::new(Noop)),
        #[cfg(feature = "snappy-compression")]
        1 => Ok(Box::new(Snappy)),
        #[cfg(feature = "zlib-compression")]
        2 => Ok(Box::new(Zlib)),
        #[cfg(feature = "zstd-compression")]
        3 => Ok(Box::new(Zstd)),
        other => Err(Error::OperationError(format!(
            "no compressor available for compressor_id {}",
            other
        ))),
    }
}

/// Compresses `gathered` (the flattened bytes of an already-gathered
/// message, header included) and wraps it in a new `OP_COMPRESSED` message.
///
/// `original_opcode` and `request_id` identify the message being wrapped;
/// `gathered` must start with that message's 16-byte header, which is
/// stripped before compression since `OP_COMPRESSED` only compresses the
/// body.
pub fn wrap(
    request_id: i32,
    original_opcode: OpCode,
    gathered: &[u8],
    backend: &dyn CompressionBackend,
    level: i32,
) -> Result<Vec<u8>> {
    use crate::wire_protocol::header::HEADER_LEN;

    if gathered.len() < HEADER_LEN {
        return Err(Error::TruncatedHeader);
    }
    let body = &gathered[HEADER_LEN..];
    let uncompressed_size = body.len() as i32;
    let compressed = backend.compress(level, body)?;

    debug!(
        "compressed {} body bytes to {} with {}",
        body.len(),
        compressed.len(),
        backend.name()
    );

    let msg = Message::new_compressed(
        request_id,
        original_opcode,
        uncompressed_size,
        backend.id(),
        &compressed,
    );
    let gathered = msg.gather()?;
    let mut out = Vec::new();
    for slice in &gathered.io_slices() {
        out.extend_from_slice(slice);
    }
    Ok(out)
}

/// Decompresses an `OP_COMPRESSED` message's body and returns the bytes of
/// the original message it wrapped (header included), ready for
/// [`Message::scatter`].
///
/// The original C driver wrote the reconstructed length prefix straight from
/// a `size_t`, which on a big-endian or 32/64-bit-mismatched host could
/// truncate silently. This always goes through `i32::to_le_bytes`, so an
/// oversized `uncompressed_size` is rejected instead of wrapping around.
pub fn unwrap(msg: &Message<'_>) -> Result<Vec<u8>> {
    use crate::wire_protocol::header::HEADER_LEN;
    use crate::wire_protocol::operations::Payload;

    let (original_opcode, uncompressed_size, compressor_id, compressed_message) = match &msg.payload
    {
        Payload::Compressed {
            original_opcode,
            uncompressed_size,
            compressor_id,
            compressed_message,
        } => (*original_opcode, *uncompressed_size, *compressor_id, *compressed_message),
        _ => {
            return Err(Error::ArgumentError(
                "unwrap called on a non-OP_COMPRESSED message".to_string(),
            ))
        }
    };

    if uncompressed_size < 0 {
        warn!("rejecting OP_COMPRESSED with negative uncompressed_size");
        return Err(Error::DecompressionFailed);
    }

    let backend = backend_for_id(compressor_id)?;
    let body = backend.decompress(compressed_message.as_bytes(), uncompressed_size as usize)?;

    let total_len = HEADER_LEN + body.len();
    let mut out = Vec::with_capacity(total_len);
    out.write_i32::<LittleEndian>(total_len as i32)?;
    out.write_i32::<LittleEndian>(msg.header.request_id)?;
    out.write_i32::<LittleEndian>(msg.header.response_to)?;
    out.write_i32::<LittleEndian>(original_opcode as i32)?;
    out.extend_from_slice(&body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_round_trips() {
        let backend = Noop;
        let data = b"hello wire protocol";
        let compressed = backend.compress(0, data).unwrap();
        let decompressed = backend.decompress(&compressed, data.len()).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn noop_rejects_length_mismatch() {
        let backend = Noop;
        match backend.decompress(b"abc", 10) {
            Err(Error::DecompressionFailed) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn wrap_then_unwrap_round_trips_get_more() {
        let _ = env_logger::try_init();
        let msg = Message::new_get_more(1, "test.coll", 100, 42);
        let gathered_msg = msg.gather().unwrap();
        let mut gathered = Vec::new();
        for s in &gathered_msg.io_slices() {
            gathered.extend_from_slice(s);
        }

        let wrapped = wrap(1, OpCode::GetMore, &gathered, &Noop, 0).unwrap();
        let decoded = Message::scatter(&wrapped).unwrap();
        let unwrapped_bytes = unwrap(&decoded).unwrap();
        assert_eq!(unwrapped_bytes, gathered);
    }

    #[test]
    fn unwrap_rejects_negative_uncompressed_size() {
        let _ = env_logger::try_init();
        let msg = Message::new_compressed(1, OpCode::GetMore, -1, 0, b"");
        match unwrap(&msg) {
            Err(Error::DecompressionFailed) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }
}
