//! Schema-driven codec for the [protobuf](https://protobuf.dev) wire format.
//!
//! Instead of generated per-message code, a table of [`FieldDescriptor`]s
//! drives a single recursive encode routine and a single recursive decode
//! routine, so any message shape can be handled at runtime:
//!
//! ```
//! use protodyn::{decode, encode, FieldDescriptor, FieldType, Record, ScalarKind, Value};
//!
//! let fields = vec![
//!     FieldDescriptor::new(1, "id", FieldType::Scalar(ScalarKind::Uint32)).required(),
//!     FieldDescriptor::new(2, "name", FieldType::Scalar(ScalarKind::String)),
//! ];
//!
//! let record = Record::new()
//!     .with("id", Value::U32(7))
//!     .with("name", Value::String("quux".into()));
//!
//! let bytes = encode(&fields, &record).unwrap();
//! assert_eq!(decode(&fields, &bytes).unwrap(), record);
//! ```
//!
//! Decoded messages are plain [`Record`] mappings with no fixed schema class.
//! Wire fields whose tag is not in the table are skipped, absent `required`
//! fields are backfilled with defaults, and absent optional fields are simply
//! omitted.

pub mod codec;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod leb128;
pub mod value;
pub mod wire;

pub use codec::{decode, encode, encode_into};
pub use descriptor::{FieldDescriptor, FieldGroup, FieldType, ScalarKind};
pub use error::{DecodeError, EncodeError};
pub use value::{GroupValue, MapKey, Record, Value};

/// Upper bound on message nesting (and group skip-chain) depth.
///
/// Untrusted input could otherwise drive the recursive decoder to a stack
/// overflow; exceeding the limit fails with
/// [`DecodeError::DepthLimitExceeded`].
pub const MAX_NESTING_DEPTH: u32 = 100;
