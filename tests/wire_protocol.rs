//! Integration tests for the wire-protocol codec: round trips through
//! gather/scatter for every opcode this crate builds, boundary behavior on
//! truncated/malformed input, and the OP_COMPRESSED envelope.

use mongodb_wire_protocol::wire_protocol::flags::{
    OpDeleteFlags, OpInsertFlags, OpQueryFlags, OpUpdateFlags,
};
use mongodb_wire_protocol::wire_protocol::header::OpCode;
use mongodb_wire_protocol::wire_protocol::operations::{Documents, Message, Payload};
use mongodb_wire_protocol::wire_protocol::field::RawBson;
use mongodb_wire_protocol::wire_protocol::compression;
use mongodb_wire_protocol::Error;

fn doc_bytes(doc: bson::Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.to_writer(&mut bytes).unwrap();
    bytes
}

fn flatten(slices: &[std::io::IoSlice<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    for s in slices {
        out.extend_from_slice(s);
    }
    out
}

#[test]
fn query_round_trips_with_return_fields_selector() {
    let query = doc_bytes(bson::doc! { "name": "alice" });
    let fields = doc_bytes(bson::doc! { "_id": 0 });

    let msg = Message::new_query(
        7,
        "test.users",
        5,
        100,
        RawBson::new(&query),
        Some(RawBson::new(&fields)),
        OpQueryFlags::SLAVE_OK,
    );
    let gathered = flatten(&msg.gather().unwrap().io_slices());

    let decoded = Message::scatter(&gathered).unwrap();
    assert_eq!(decoded.header.opcode, OpCode::Query);
    match decoded.payload {
        Payload::Query {
            full_collection_name,
            number_to_skip,
            number_to_return,
            return_fields_selector,
            flags,
            ..
        } => {
            assert_eq!(full_collection_name.as_bytes(), b"test.users");
            assert_eq!(number_to_skip, 5);
            assert_eq!(number_to_return, 100);
            assert_eq!(flags, OpQueryFlags::SLAVE_OK);
            assert!(return_fields_selector.is_some());
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn query_round_trips_without_return_fields_selector() {
    let query = doc_bytes(bson::doc! { "name": "bob" });
    let msg = Message::new_query(
        1,
        "test.users",
        0,
        0,
        RawBson::new(&query),
        None,
        OpQueryFlags::no_flags(),
    );
    let gathered = flatten(&msg.gather().unwrap().io_slices());
    let decoded = Message::scatter(&gathered).unwrap();
    match decoded.payload {
        Payload::Query {
            return_fields_selector,
            ..
        } => assert!(return_fields_selector.is_none()),
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn delete_round_trips() {
    let selector = doc_bytes(bson::doc! { "status": "archived" });
    let msg = Message::new_delete(
        3,
        "test.logs",
        OpDeleteFlags::SINGLE_REMOVE,
        RawBson::new(&selector),
    );
    let gathered = flatten(&msg.gather().unwrap().io_slices());
    let decoded = Message::scatter(&gathered).unwrap();
    match decoded.payload {
        Payload::Delete {
            full_collection_name,
            flags,
            ..
        } => {
            assert_eq!(full_collection_name.as_bytes(), b"test.logs");
            assert_eq!(flags, OpDeleteFlags::SINGLE_REMOVE);
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn get_more_round_trips() {
    let msg = Message::new_get_more(4, "test.coll", 50, 99887766);
    let gathered = flatten(&msg.gather().unwrap().io_slices());
    let decoded = Message::scatter(&gathered).unwrap();
    match decoded.payload {
        Payload::GetMore {
            cursor_id,
            number_to_return,
            ..
        } => {
            assert_eq!(cursor_id, 99887766);
            assert_eq!(number_to_return, 50);
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn update_round_trips_with_multi_and_upsert() {
    let selector = doc_bytes(bson::doc! { "_id": 1 });
    let update = doc_bytes(bson::doc! { "$inc": { "count": 1 } });
    let msg = Message::new_update(
        2,
        "test.counters",
        OpUpdateFlags::UPSERT | OpUpdateFlags::MULTI_UPDATE,
        RawBson::new(&selector),
        RawBson::new(&update),
    );
    let gathered = flatten(&msg.gather().unwrap().io_slices());
    let decoded = Message::scatter(&gathered).unwrap();
    match decoded.payload {
        Payload::Update { flags, .. } => {
            assert!(flags.contains(OpUpdateFlags::UPSERT));
            assert!(flags.contains(OpUpdateFlags::MULTI_UPDATE));
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn insert_with_continue_on_error_round_trips() {
    let doc1 = doc_bytes(bson::doc! { "a": 1 });
    let docs: Vec<&[u8]> = vec![&doc1];
    let msg = Message::new_insert(
        1,
        OpInsertFlags::CONTINUE_ON_ERROR,
        "test.coll",
        Documents::Scattered(&docs),
    );
    let gathered_msg = msg.gather().unwrap();
    let gathered = flatten(&gathered_msg.io_slices());
    assert_eq!(gathered_msg.message_len(), gathered.len());

    let decoded = Message::scatter(&gathered).unwrap();
    assert_eq!(decoded.header.msg_len as usize, gathered.len());
    match decoded.payload {
        Payload::Insert { flags, .. } => assert!(flags.contains(OpInsertFlags::CONTINUE_ON_ERROR)),
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn scatter_rejects_truncated_header() {
    match Message::scatter(&[0u8; 10]) {
        Err(Error::TruncatedHeader) => {}
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn scatter_rejects_unterminated_cstring() {
    use mongodb_wire_protocol::wire_protocol::header::Header;

    // GET_MORE body: ZERO(4) + collection name with no NUL terminator at all.
    let header = Header::new(OpCode::GetMore, 1, 0);
    let mut bytes = Vec::new();
    header.write_to(&mut bytes);
    bytes.extend_from_slice(&[0, 0, 0, 0]); // ZERO
    bytes.extend_from_slice(b"test.coll"); // no NUL terminator
    let len = bytes.len() as i32;
    bytes[0..4].copy_from_slice(&len.to_le_bytes());

    match Message::scatter(&bytes) {
        Err(Error::UnterminatedCString("full_collection_name")) => {}
        other => panic!("expected UnterminatedCString, got {:?}", other),
    }
}

#[test]
fn scatter_rejects_bson_length_past_buffer() {
    let selector = doc_bytes(bson::doc! { "_id": 1 });
    let update = doc_bytes(bson::doc! { "$set": { "x": 1 } });
    let msg = Message::new_update(
        1,
        "test.coll",
        OpUpdateFlags::no_flags(),
        RawBson::new(&selector),
        RawBson::new(&update),
    );
    let mut gathered = flatten(&msg.gather().unwrap().io_slices());
    let len = gathered.len();
    // Truncate the final byte so the trailing document's length prefix
    // claims more bytes than remain.
    gathered.truncate(len - 1);
    match Message::scatter(&gathered) {
        Err(_) => {}
        other => panic!("expected an error, got {:?}", other),
    }
}

#[test]
fn scatter_reply_header_only_does_not_require_valid_documents() {
    use byteorder::{LittleEndian, WriteBytesExt};
    use mongodb_wire_protocol::wire_protocol::header::{Header, HEADER_LEN};
    use mongodb_wire_protocol::wire_protocol::flags::OpReplyFlags;

    let mut header = Header::new(OpCode::Reply, 1, 1);
    header.msg_len = (HEADER_LEN + 16 + 4) as i32;
    let mut bytes = Vec::new();
    header.write_to(&mut bytes);
    bytes.write_i32::<LittleEndian>(OpReplyFlags::CURSOR_NOT_FOUND.bits()).unwrap();
    bytes.write_i64::<LittleEndian>(555).unwrap();
    bytes.write_i32::<LittleEndian>(0).unwrap();
    bytes.write_i32::<LittleEndian>(1).unwrap();
    bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]); // garbage "document"

    let view = Message::scatter_reply_header_only(&bytes).unwrap();
    assert_eq!(view.cursor_id, 555);
    assert!(view.flags.contains(OpReplyFlags::CURSOR_NOT_FOUND));
}

#[test]
fn compressed_envelope_round_trips_a_query() {
    let query = doc_bytes(bson::doc! { "ping": 1 });
    let msg = Message::new_query(
        1,
        "admin.$cmd",
        0,
        -1,
        RawBson::new(&query),
        None,
        OpQueryFlags::no_flags(),
    );
    let gathered = flatten(&msg.gather().unwrap().io_slices());

    let wrapped = compression::wrap(
        1,
        OpCode::Query,
        &gathered,
        &compression::Noop,
        0,
    )
    .unwrap();

    let decoded = Message::scatter(&wrapped).unwrap();
    assert_eq!(decoded.header.opcode, OpCode::Compressed);

    let unwrapped = compression::unwrap(&decoded).unwrap();
    assert_eq!(unwrapped, gathered);

    let original = Message::scatter(&unwrapped).unwrap();
    assert_eq!(original.header.opcode, OpCode::Query);
}
