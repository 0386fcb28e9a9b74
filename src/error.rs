//! Crate-wide error type.
//!
//! This predates `thiserror` in the driver's history, so errors are spelled
//! out by hand the way the rest of the wire protocol code does.

use std::fmt;
use std::io;

/// Which side populated a classified server error, per the error API version
/// the caller negotiated with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDomain {
    Server,
    Query,
}

/// All errors produced by this crate.
#[derive(Debug)]
pub enum Error {
    /// A buffer handed to `scatter` was shorter than the 16-byte header.
    TruncatedHeader,
    /// A fixed-width field ran past the end of the remaining buffer.
    TruncatedField(&'static str),
    /// A cstring field had no NUL byte before the buffer ran out.
    UnterminatedCString(&'static str),
    /// A BSON length prefix was outside `[5, remaining]`.
    BadBsonLength,
    /// The header named an opcode outside the nine known values.
    UnknownOpcode(i32),
    /// A compression backend failed, or returned an implausible length.
    DecompressionFailed,
    /// The reply shape was not what a command/query response requires.
    ProtocolInvalidReply(String),
    /// The first document of a reply could not be decoded as BSON.
    BsonInvalid,
    /// The server reported a query failure; `domain` records which API
    /// version classified it.
    QueryFailure {
        domain: ErrorDomain,
        code: i32,
        message: String,
    },
    /// `OP_REPLY.flags` carried `CURSOR_NOT_FOUND`.
    CursorInvalidOrExpired,
    /// Caller passed a value that violates a precondition of this crate's
    /// public API (e.g. writing an `OP_REPLY`, which only a server sends).
    ArgumentError(String),
    /// A lower-level I/O or backend operation failed.
    OperationError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::TruncatedHeader => write!(f, "buffer shorter than the 16-byte message header"),
            Error::TruncatedField(name) => write!(f, "field '{}' ran past the end of the buffer", name),
            Error::UnterminatedCString(name) => {
                write!(f, "cstring field '{}' has no NUL terminator in the remaining buffer", name)
            }
            Error::BadBsonLength => write!(f, "BSON length prefix out of bounds"),
            Error::UnknownOpcode(code) => write!(f, "unknown opcode {}", code),
            Error::DecompressionFailed => write!(f, "failed to decompress OP_COMPRESSED message"),
            Error::ProtocolInvalidReply(ref msg) => write!(f, "{}", msg),
            Error::BsonInvalid => write!(f, "failed to decode document from the server"),
            Error::QueryFailure { code, ref message, .. } => write!(f, "{} (code {})", message, code),
            Error::CursorInvalidOrExpired => write!(f, "the cursor is invalid or has expired"),
            Error::ArgumentError(ref msg) => write!(f, "{}", msg),
            Error::OperationError(ref msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::OperationError(err.to_string())
    }
}

impl From<bson::de::Error> for Error {
    fn from(_err: bson::de::Error) -> Error {
        Error::BsonInvalid
    }
}

pub type Result<T> = std::result::Result<T, Error>;
