//! Per-opcode bit vectors. Bit layouts are the ones the wire protocol has
//! used unchanged since `OP_QUERY` was introduced.

use bitflags::bitflags;

bitflags! {
    /// Bits for `OP_INSERT.flags`.
    pub struct OpInsertFlags: i32 {
        const CONTINUE_ON_ERROR = 0b0000_0001;
    }
}

impl OpInsertFlags {
    pub fn no_flags() -> OpInsertFlags {
        OpInsertFlags::empty()
    }
}

bitflags! {
    /// Bits for `OP_UPDATE.flags`.
    pub struct OpUpdateFlags: i32 {
        const UPSERT = 0b0000_0001;
        const MULTI_UPDATE = 0b0000_0010;
    }
}

impl OpUpdateFlags {
    pub fn no_flags() -> OpUpdateFlags {
        OpUpdateFlags::empty()
    }
}

bitflags! {
    /// Bits for `OP_QUERY.flags`. Bit 0 is reserved and must be zero.
    pub struct OpQueryFlags: i32 {
        const TAILABLE_CURSOR  = 0b0000_0010;
        const SLAVE_OK         = 0b0000_0100;
        const OPLOG_REPLAY     = 0b0000_1000;
        const NO_CURSOR_TIMEOUT = 0b0001_0000;
        const AWAIT_DATA       = 0b0010_0000;
        const EXHAUST          = 0b0100_0000;
        const PARTIAL          = 0b1000_0000;
    }
}

impl OpQueryFlags {
    pub fn no_flags() -> OpQueryFlags {
        OpQueryFlags::empty()
    }
}

bitflags! {
    /// Bits for `OP_DELETE.flags`.
    pub struct OpDeleteFlags: i32 {
        const SINGLE_REMOVE = 0b0000_0001;
    }
}

impl OpDeleteFlags {
    pub fn no_flags() -> OpDeleteFlags {
        OpDeleteFlags::empty()
    }
}

bitflags! {
    /// Bits for `OP_REPLY.flags`.
    pub struct OpReplyFlags: i32 {
        const CURSOR_NOT_FOUND   = 0b0000_0001;
        const QUERY_FAILURE      = 0b0000_0010;
        const SHARD_CONFIG_STALE = 0b0000_0100;
        const AWAIT_CAPABLE      = 0b0000_1000;
    }
}
