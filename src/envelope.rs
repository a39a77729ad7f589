//! Transport envelope adapter.
//!
//! The transport wraps every message in a fixed three-field outer frame and
//! dispatches on its numeric payload type to pick the inner schema:
//!
//! ```text
//! message Frame {
//!     uint32 payloadType = 1;  // required
//!     bytes  payload     = 2;
//!     string clientMsgId = 3;
//! }
//! ```
//!
//! [`PayloadCodec`] holds the `payload_type → descriptor table` registry and
//! calls the core engines twice per message: once for the outer frame, once
//! for the inner payload. An unregistered payload type is not fatal on
//! decode; the payload is surfaced undecoded for caller inspection.

use std::collections::HashMap;
use std::sync::OnceLock;

use bytes::Bytes;

use crate::codec::{decode, encode};
use crate::descriptor::{FieldDescriptor, FieldType, ScalarKind};
use crate::error::{DecodeError, EncodeError};
use crate::value::{Record, Value};

/// Descriptor table of the outer frame, built once and shared.
fn frame_fields() -> &'static [FieldDescriptor] {
    static FIELDS: OnceLock<Vec<FieldDescriptor>> = OnceLock::new();
    FIELDS.get_or_init(|| {
        vec![
            FieldDescriptor::new(1, "payloadType", FieldType::Scalar(ScalarKind::Uint32))
                .required(),
            FieldDescriptor::new(2, "payload", FieldType::Scalar(ScalarKind::Bytes)),
            FieldDescriptor::new(3, "clientMsgId", FieldType::Scalar(ScalarKind::String)),
        ]
    })
}

/// One transport message.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub payload_type: u32,
    pub payload: Payload,
    /// Client-side correlation id, if the sender attached one.
    pub client_msg_id: Option<String>,
}

/// Inner payload of an [`Envelope`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Decoded through the schema registered for the payload type.
    Decoded(Record),
    /// No schema was registered; the raw bytes are surfaced for inspection.
    Raw(Bytes),
    /// The payload field was absent from the wire.
    Empty,
}

/// Registry mapping payload types to their inner descriptor tables.
#[derive(Debug, Default)]
pub struct PayloadCodec {
    tables: HashMap<u32, Vec<FieldDescriptor>>,
}

impl PayloadCodec {
    pub fn new() -> Self {
        PayloadCodec::default()
    }

    /// Registers the inner schema for a payload type, replacing any earlier
    /// registration.
    pub fn register(&mut self, payload_type: u32, fields: Vec<FieldDescriptor>) -> &mut Self {
        self.tables.insert(payload_type, fields);
        self
    }

    /// Encodes an envelope: the inner payload first, then the outer frame.
    ///
    /// Encoding a [`Payload::Decoded`] record requires a registered schema
    /// for its payload type; raw and empty payloads pass through unchanged.
    pub fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, EncodeError> {
        let payload = match &envelope.payload {
            Payload::Decoded(record) => {
                let fields = self.tables.get(&envelope.payload_type).ok_or(
                    EncodeError::UnknownPayloadType {
                        payload_type: envelope.payload_type,
                    },
                )?;
                Some(Bytes::from(encode(fields, record)?))
            }
            Payload::Raw(bytes) => Some(bytes.clone()),
            Payload::Empty => None,
        };

        let mut frame = Record::new().with("payloadType", Value::U32(envelope.payload_type));
        if let Some(payload) = payload {
            frame.insert("payload", Value::Bytes(payload));
        }
        if let Some(client_msg_id) = &envelope.client_msg_id {
            frame.insert("clientMsgId", Value::String(client_msg_id.clone()));
        }
        encode(frame_fields(), &frame)
    }

    /// Decodes the outer frame, then the payload through the registered
    /// schema.
    pub fn decode(&self, bytes: &[u8]) -> Result<Envelope, DecodeError> {
        let mut frame = decode(frame_fields(), bytes)?;

        let payload_type = match frame.remove("payloadType") {
            Some(Value::U32(v)) => v,
            _ => 0,
        };
        let client_msg_id = match frame.remove("clientMsgId") {
            Some(Value::String(v)) => Some(v),
            _ => None,
        };
        let payload = match frame.remove("payload") {
            Some(Value::Bytes(raw)) => match self.tables.get(&payload_type) {
                Some(fields) => Payload::Decoded(decode(fields, &raw)?),
                None => Payload::Raw(raw),
            },
            _ => Payload::Empty,
        };

        Ok(Envelope {
            payload_type,
            payload,
            client_msg_id,
        })
    }
}
