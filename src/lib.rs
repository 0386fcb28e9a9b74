//! Wire-protocol codec for a native MongoDB driver.
//!
//! This crate owns the binary message format shared by every MongoDB
//! client/server exchange: building outbound requests into a gather-write
//! vector, parsing inbound replies out of a receive buffer, normalizing
//! byte order, wrapping/unwrapping `OP_COMPRESSED`, and classifying a reply
//! as success or error. It does not open sockets, select servers, retry, or
//! authenticate -- those are the job of the cluster/session object that
//! owns a `Message` for the duration of one round trip.

pub mod error;
pub mod wire_protocol;
pub mod write_concern;

pub use error::{Error, ErrorDomain, Result};
pub use write_concern::WriteConcern;
