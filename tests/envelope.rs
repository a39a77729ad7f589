//! End-to-end transport envelope behavior.

use bytes::Bytes;
use protodyn::envelope::{Envelope, Payload, PayloadCodec};
use protodyn::{decode, encode, EncodeError, FieldDescriptor, FieldType, Record, ScalarKind, Value};

fn frame_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new(1, "payloadType", FieldType::Scalar(ScalarKind::Uint32)).required(),
        FieldDescriptor::new(2, "payload", FieldType::Scalar(ScalarKind::Bytes)),
        FieldDescriptor::new(3, "clientMsgId", FieldType::Scalar(ScalarKind::String)),
    ]
}

fn quote_fields() -> Vec<FieldDescriptor> {
    vec![FieldDescriptor::new(1, "x", FieldType::Scalar(ScalarKind::Int32))]
}

#[test]
fn test_frame_schema_vector() {
    // The envelope's outer frame through the raw engines.
    let fields = frame_fields();
    let record = Record::new()
        .with("payloadType", Value::U32(1))
        .with("payload", Value::Bytes(Bytes::from_static(&[1, 1])))
        .with("clientMsgId", Value::String("1".into()));

    let bytes = encode(&fields, &record).unwrap();
    assert_eq!(bytes, [8, 1, 18, 2, 1, 1, 26, 1, 49]);

    assert_eq!(decode(&fields, &bytes).unwrap(), record);
}

#[test]
fn test_registered_payload_roundtrip() {
    let mut codec = PayloadCodec::new();
    codec.register(1, quote_fields());

    let envelope = Envelope {
        payload_type: 1,
        payload: Payload::Decoded(Record::new().with("x", Value::I32(1))),
        client_msg_id: Some("1".into()),
    };

    let bytes = codec.encode(&envelope).unwrap();
    // payload bytes are the inner encoding [8, 1]
    assert_eq!(bytes, [8, 1, 18, 2, 8, 1, 26, 1, 49]);

    assert_eq!(codec.decode(&bytes).unwrap(), envelope);
}

#[test]
fn test_unknown_payload_type_surfaces_raw() {
    let codec = PayloadCodec::new();

    // Encoded by a peer that knows payload type 9; we don't.
    let bytes = [8, 9, 18, 2, 8, 1];
    let envelope = codec.decode(&bytes).unwrap();

    assert_eq!(envelope.payload_type, 9);
    assert_eq!(envelope.payload, Payload::Raw(Bytes::from_static(&[8, 1])));
    assert_eq!(envelope.client_msg_id, None);
}

#[test]
fn test_raw_payload_passes_through_encode() {
    let codec = PayloadCodec::new();

    let envelope = Envelope {
        payload_type: 9,
        payload: Payload::Raw(Bytes::from_static(&[8, 1])),
        client_msg_id: None,
    };

    let bytes = codec.encode(&envelope).unwrap();
    assert_eq!(bytes, [8, 9, 18, 2, 8, 1]);
}

#[test]
fn test_decoded_payload_requires_registration() {
    let codec = PayloadCodec::new();

    let envelope = Envelope {
        payload_type: 5,
        payload: Payload::Decoded(Record::new()),
        client_msg_id: None,
    };

    assert_eq!(
        codec.encode(&envelope),
        Err(EncodeError::UnknownPayloadType { payload_type: 5 })
    );
}

#[test]
fn test_empty_payload() {
    let mut codec = PayloadCodec::new();
    codec.register(7, quote_fields());

    let envelope = Envelope {
        payload_type: 7,
        payload: Payload::Empty,
        client_msg_id: None,
    };

    let bytes = codec.encode(&envelope).unwrap();
    assert_eq!(bytes, [8, 7]);
    assert_eq!(codec.decode(&bytes).unwrap(), envelope);
}

#[test]
fn test_re_registration_replaces_schema() {
    let mut codec = PayloadCodec::new();
    codec.register(1, quote_fields());
    codec.register(
        1,
        vec![FieldDescriptor::new(1, "y", FieldType::Scalar(ScalarKind::Uint32))],
    );

    let envelope = codec.decode(&[8, 1, 18, 2, 8, 3]).unwrap();
    assert_eq!(
        envelope.payload,
        Payload::Decoded(Record::new().with("y", Value::U32(3)))
    );
}

#[test]
fn test_nested_payload_schema() {
    // A payload schema with composite fields decodes through the same engine.
    let mut codec = PayloadCodec::new();
    codec.register(
        4,
        vec![
            FieldDescriptor::new(2, "symbolId", FieldType::Scalar(ScalarKind::Int64)),
            FieldDescriptor::new(
                3,
                "newQuotes",
                FieldType::RepeatedSimple(Box::new(FieldType::Message(vec![
                    FieldDescriptor::new(1, "id", FieldType::Scalar(ScalarKind::Int64)),
                    FieldDescriptor::new(4, "bid", FieldType::Scalar(ScalarKind::Uint64)),
                ]))),
            ),
        ],
    );

    let payload = Record::new()
        .with("symbolId", Value::I64(92))
        .with(
            "newQuotes",
            Value::List(vec![Value::Message(
                Record::new()
                    .with("id", Value::I64(11))
                    .with("bid", Value::U64(2246000)),
            )]),
        );

    let envelope = Envelope {
        payload_type: 4,
        payload: Payload::Decoded(payload),
        client_msg_id: None,
    };

    let bytes = codec.encode(&envelope).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap(), envelope);
}
