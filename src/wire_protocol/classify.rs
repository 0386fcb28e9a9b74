//! Reply classification: deciding whether an `OP_REPLY` represents success
//! or failure, and extracting the server's error out of it when it doesn't.
//!
//! Mirrors the split the server itself uses: before wire protocol API
//! version 2, errors came back shaped like `{ok: 0, errmsg, code}` in a
//! command reply, or `{$err, code}` in a legacy query reply. `domain` on
//! [`ReplyError`] records which shape was used, since callers above this
//! crate use it to decide how to log/retry.

use crate::error::{Error, ErrorDomain, Result};
use crate::wire_protocol::flags::{OpQueryFlags, OpReplyFlags};
use crate::wire_protocol::header::OpCode;
use crate::wire_protocol::operations::{Message, Payload};
use crate::write_concern::WriteConcern;

/// The server first returned numeric codes (as opposed to only string
/// messages) starting with this wire protocol API version. Below it, only
/// the legacy `$err`/`errmsg` shape is reliable.
const API_VERSION_WITH_DOMAIN: i32 = 2;

/// The code the server used to use for "no such command", which newer
/// servers report as a query-domain error even though it is really a
/// command-domain failure.
const PROTOCOL_ERROR: i32 = 13390;
const QUERY_COMMAND_NOT_FOUND: i32 = 59;

/// A classified server-side failure, not yet converted to the crate's
/// [`Error`] type. Kept separate from `Error` so a caller that wants to
/// inspect `domain`/`code` before deciding how to surface the failure
/// doesn't have to match on `Error::QueryFailure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyError {
    pub domain: ErrorDomain,
    pub code: i32,
    pub message: String,
}

impl ReplyError {
    pub fn into_error(self) -> Error {
        Error::QueryFailure {
            domain: self.domain,
            code: self.code,
            message: self.message,
        }
    }
}

/// Returns the first document of an `OP_REPLY`'s document array, decoded as
/// BSON. `None` if the reply carried zero documents (a legal shape for a
/// cursor that only ever needed its `cursor_id`).
pub fn get_first_document(msg: &Message<'_>) -> Result<Option<bson::Document>> {
    match &msg.payload {
        Payload::Reply { documents, .. } => match documents.first() {
            Some(doc) => Ok(Some(doc.to_document()?)),
            None => Ok(None),
        },
        _ => Err(Error::ArgumentError(
            "get_first_document called on a non-OP_REPLY message".to_string(),
        )),
    }
}

/// True if the reply's flags or first document indicate a failure.
pub fn is_failure(msg: &Message<'_>) -> Result<bool> {
    match &msg.payload {
        Payload::Reply { flags, .. } => {
            if flags.contains(OpReplyFlags::QUERY_FAILURE) {
                return Ok(true);
            }
            match get_first_document(msg)? {
                Some(doc) => Ok(matches!(doc.get_i32("ok"), Ok(0)) || doc.contains_key("$err")),
                None => Ok(false),
            }
        }
        _ => Err(Error::ArgumentError(
            "is_failure called on a non-OP_REPLY message".to_string(),
        )),
    }
}

fn domain_for(api_version: i32) -> ErrorDomain {
    if api_version >= API_VERSION_WITH_DOMAIN {
        ErrorDomain::Server
    } else {
        ErrorDomain::Query
    }
}

fn command_error_from_doc(doc: &bson::Document, api_version: i32) -> ReplyError {
    let mut code = doc.get_i32("code").unwrap_or(-1);
    let message = doc
        .get_str("errmsg")
        .map(str::to_string)
        .unwrap_or_else(|_| "unknown command failure".to_string());

    if code == PROTOCOL_ERROR {
        code = QUERY_COMMAND_NOT_FOUND;
    }

    ReplyError {
        domain: domain_for(api_version),
        code,
        message,
    }
}

fn query_error_from_doc(doc: &bson::Document, _api_version: i32) -> ReplyError {
    let mut code = doc.get_i32("code").unwrap_or(-1);
    let message = doc
        .get_str("$err")
        .map(str::to_string)
        .unwrap_or_else(|_| "unknown query failure".to_string());

    if code == PROTOCOL_ERROR {
        code = QUERY_COMMAND_NOT_FOUND;
    }

    ReplyError {
        domain: ErrorDomain::Query,
        code,
        message,
    }
}

/// Parses a command-reply-shaped failure: `{ok: 0, errmsg, code}`.
///
/// Rejects a non-`OP_REPLY` message and a reply carrying anything other than
/// exactly one document -- a command response is defined to carry exactly
/// one, and a caller that got more or fewer has a protocol-level bug, not a
/// command-level failure.
pub fn parse_command_error(msg: &Message<'_>, api_version: i32) -> Result<ReplyError> {
    let number_returned = match &msg.payload {
        Payload::Reply { number_returned, .. } => *number_returned,
        _ => {
            return Err(Error::ProtocolInvalidReply(
                "Received rpc other than OP_REPLY".to_string(),
            ))
        }
    };
    if number_returned != 1 {
        return Err(Error::ProtocolInvalidReply(format!(
            "Expected only one reply document, got {}",
            number_returned
        )));
    }
    let doc = get_first_document(msg)?.ok_or(Error::BsonInvalid)?;
    Ok(command_error_from_doc(&doc, api_version))
}

/// Parses a legacy query-reply-shaped failure: `{$err, code}`.
///
/// Same non-`OP_REPLY` rejection as [`parse_command_error`], but without the
/// single-document requirement -- a legacy query reply can carry any number
/// of documents, and this path only ever inspects the first one (or falls
/// back to an empty document via [`is_failure`]'s flag-based logic).
pub fn parse_query_error(msg: &Message<'_>, api_version: i32) -> Result<ReplyError> {
    if !matches!(&msg.payload, Payload::Reply { .. }) {
        return Err(Error::ProtocolInvalidReply(
            "Received rpc other than OP_REPLY".to_string(),
        ));
    }
    let doc = get_first_document(msg)?.unwrap_or_default();
    Ok(query_error_from_doc(&doc, api_version))
}

/// Full classification: `Ok(doc)` if the reply succeeded, or the server's
/// error translated into this crate's [`Error`] otherwise. `doc` is the
/// reply's first document, or an empty document if it carried none.
pub fn check_reply(msg: &Message<'_>, api_version: i32) -> Result<bson::Document> {
    let flags = match &msg.payload {
        Payload::Reply { flags, .. } => *flags,
        _ => {
            return Err(Error::ProtocolInvalidReply(
                "Received rpc other than OP_REPLY".to_string(),
            ))
        }
    };
    if flags.contains(OpReplyFlags::CURSOR_NOT_FOUND) {
        return Err(Error::CursorInvalidOrExpired);
    }

    if !is_failure(msg)? {
        return Ok(get_first_document(msg)?.unwrap_or_default());
    }

    let doc = get_first_document(msg)?.unwrap_or_default();
    let reply_error = if doc.contains_key("$err") {
        parse_query_error(msg, api_version)?
    } else {
        parse_command_error(msg, api_version)?
    };
    Err(reply_error.into_error())
}

/// Whether a write needs a trailing `getLastError` to surface errors: true
/// for the legacy write opcodes when the caller asked for acknowledgement
/// (`w != 0`), false for opcodes that already get a reply (queries,
/// `OP_MSG`) or that the server never acknowledges (`OP_KILL_CURSORS`).
pub fn needs_gle(msg: &Message<'_>, write_concern: &WriteConcern) -> bool {
    match msg.header.opcode {
        OpCode::Insert | OpCode::Update | OpCode::Delete => write_concern.w != 0,
        OpCode::KillCursors => false,
        _ => false,
    }
}

/// Builds an `OP_QUERY` against `{db}.$cmd` carrying `command` as the query
/// document -- the shape every pre-`OP_MSG` command request takes. `flags`
/// is masked down to its `SLAVE_OK` bit; every other bit is forbidden on a
/// command-typed query and is silently dropped rather than rejected.
pub fn prep_command<'a>(
    request_id: i32,
    db: &'a str,
    command: crate::wire_protocol::field::RawBson<'a>,
    flags: OpQueryFlags,
) -> Message<'a> {
    // `db` outlives the returned Message, but the concatenated namespace
    // does not exist in any caller-owned buffer, so it must be leaked into
    // one that does. Callers build commands rarely enough that this is
    // simpler than threading a scratch arena through the public API.
    let namespace: &'a str = Box::leak(format!("{}.$cmd", db).into_boxed_str());

    Message::new_query(
        request_id,
        namespace,
        0,
        -1,
        command,
        None,
        flags & OpQueryFlags::SLAVE_OK,
    )
}
