//! Binary message format shared by every MongoDB client/server exchange.

pub mod classify;
pub mod compression;
pub mod field;
pub mod flags;
pub mod header;
pub mod operations;

pub use classify::{check_reply, needs_gle, prep_command, ReplyError};
pub use header::{Header, OpCode};
pub use operations::{Documents, Message, Payload, ReplyHeaderView};
