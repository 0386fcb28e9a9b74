//! The one piece of `common.rs` the wire protocol codec actually needs:
//! `WriteConcern.w` drives `classify::needs_gle`. The rest of the original
//! driver's `common` module (`ReadConcern`, `ReadPreference`, ...) belongs to
//! server selection, which is out of scope for this crate.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteConcern {
    /// Write replication. Zero means "fire and forget".
    pub w: i32,
    /// Used in conjunction with `w`. Propagation timeout in ms.
    pub w_timeout: i32,
    /// If true, block until write operations have been committed to the journal.
    pub j: bool,
    /// If true and the server is not journaling, block until all data files are synced to disk.
    pub fsync: bool,
}

impl WriteConcern {
    pub fn new() -> WriteConcern {
        WriteConcern {
            w: 1,
            w_timeout: 0,
            j: false,
            fsync: false,
        }
    }
}

impl Default for WriteConcern {
    fn default() -> Self {
        WriteConcern::new()
    }
}
