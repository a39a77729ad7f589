//! Field descriptor tables: the schema representation consumed by both
//! engines.
//!
//! A message's shape is an ordered `Vec<FieldDescriptor>`. Tables are built
//! once per message type, own no mutable state, and may be shared freely
//! across concurrent encode/decode calls.

/// Primitive field kinds with a direct wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Enum,
}

/// Wire-level shape of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Scalar(ScalarKind),
    /// Zero or more occurrences, each carrying its own field key.
    RepeatedSimple(Box<FieldType>),
    /// One length-delimited occurrence holding concatenated raw scalar
    /// encodings, without per-element keys.
    RepeatedPacked(Box<FieldType>),
    /// Encoded as repeated `{1: key, 2: value}` entry messages; decode merges
    /// the entries into a single mapping.
    Map(ScalarKind, Box<FieldType>),
    /// A scalar framed exactly like a single-field nested message.
    Wrapper(ScalarKind),
    /// Nested message with its own descriptor table.
    Message(Vec<FieldDescriptor>),
}

/// Tagged-union grouping axis for a field.
///
/// At most one member of a group is populated at a time. After decode the
/// populated member lives under the group's key as a
/// [`GroupValue`](crate::value::GroupValue); the member's own key never
/// appears in the final record. `Oneof` and `Anyof` have identical
/// mechanics and differ only in which grouping axis they name, so both axes
/// can coexist in one table without conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldGroup {
    Oneof(String),
    Anyof(String),
}

impl FieldGroup {
    /// Key the group's discriminant/value pair is stored under.
    pub fn key(&self) -> &str {
        match self {
            FieldGroup::Oneof(name) | FieldGroup::Anyof(name) => name,
        }
    }
}

/// One field of a message schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Wire field number; unique within one descriptor table.
    pub tag: u32,
    /// Key the value is stored under in a decoded record.
    pub name: String,
    pub ty: FieldType,
    /// Absent required fields receive a type-appropriate default after
    /// decode.
    pub required: bool,
    /// Tagged-union group this field belongs to, if any. A field belongs to
    /// at most one group axis.
    pub group: Option<FieldGroup>,
}

impl FieldDescriptor {
    /// Creates an optional, ungrouped descriptor.
    pub fn new(tag: u32, name: impl Into<String>, ty: FieldType) -> Self {
        FieldDescriptor {
            tag,
            name: name.into(),
            ty,
            required: false,
            group: None,
        }
    }

    /// Marks the field as required: absent on the wire means "default value".
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Places the field in a oneof group stored under `key`.
    pub fn oneof(mut self, key: impl Into<String>) -> Self {
        self.group = Some(FieldGroup::Oneof(key.into()));
        self
    }

    /// Places the field in an anyof group stored under `key`.
    pub fn anyof(mut self, key: impl Into<String>) -> Self {
        self.group = Some(FieldGroup::Anyof(key.into()));
        self
    }
}

/// Synthetic descriptor table for one map entry.
///
/// Maps are sugar for `repeated Entry { K key = 1; V value = 2; }`. The
/// engines recurse through this table so entries are framed like any other
/// nested message; both fields are required so absent halves decode to their
/// defaults.
pub(crate) fn map_entry_fields(key: ScalarKind, value: FieldType) -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new(1, "key", FieldType::Scalar(key)).required(),
        FieldDescriptor::new(2, "value", value).required(),
    ]
}

/// Synthetic descriptor table for a wrapped scalar.
pub(crate) fn wrapper_fields(kind: ScalarKind) -> Vec<FieldDescriptor> {
    vec![FieldDescriptor::new(1, "value", FieldType::Scalar(kind)).required()]
}
