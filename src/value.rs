//! Dynamically typed values: what the engines read from and decode into.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::descriptor::{FieldType, ScalarKind};
use crate::error::DecodeError;

/// A dynamically typed field value.
///
/// The numeric variant a scalar kind maps to is fixed: `double`→[`F64`],
/// `float`→[`F32`], `int32`/`sint32`/`sfixed32`→[`I32`],
/// `int64`/`sint64`/`sfixed64`→[`I64`], `uint32`/`fixed32`/`enum`→[`U32`],
/// `uint64`/`fixed64`→[`U64`].
///
/// [`F64`]: Value::F64
/// [`F32`]: Value::F32
/// [`I32`]: Value::I32
/// [`I64`]: Value::I64
/// [`U32`]: Value::U32
/// [`U64`]: Value::U64
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Bytes),
    /// Ordered sequence accumulated by repeated fields.
    List(Vec<Value>),
    /// Mapping merged from map entry messages; keys are unique, last write
    /// wins.
    Map(BTreeMap<MapKey, Value>),
    /// Nested decoded message.
    Message(Record),
    /// Discriminant/value pair stored under a oneof/anyof group key.
    Group(GroupValue),
}

impl Value {
    /// Short name of the variant, for diagnostics.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Message(_) => "message",
            Value::Group(_) => "group",
        }
    }

    /// Converts a decoded entry key into a [`MapKey`].
    ///
    /// Map keys follow the protobuf rules: integral types, bool, and string
    /// only; float, double, bytes, and message values are rejected.
    pub(crate) fn into_map_key(self) -> Result<MapKey, DecodeError> {
        match self {
            Value::Bool(v) => Ok(MapKey::Bool(v)),
            Value::I32(v) => Ok(MapKey::I32(v)),
            Value::I64(v) => Ok(MapKey::I64(v)),
            Value::U32(v) => Ok(MapKey::U32(v)),
            Value::U64(v) => Ok(MapKey::U64(v)),
            Value::String(v) => Ok(MapKey::String(v)),
            other => Err(DecodeError::InvalidMapKey { kind: other.kind() }),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

/// Discriminant/value pair held under a group key.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupValue {
    /// Name of the populated member field.
    pub field: String,
    pub value: Box<Value>,
}

impl GroupValue {
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        GroupValue {
            field: field.into(),
            value: Box::new(value),
        }
    }
}

/// Keys admissible in a map field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    String(String),
}

impl MapKey {
    /// The key as a plain value, for encoding through the entry table.
    pub(crate) fn to_value(&self) -> Value {
        match self {
            MapKey::Bool(v) => Value::Bool(*v),
            MapKey::I32(v) => Value::I32(*v),
            MapKey::I64(v) => Value::I64(*v),
            MapKey::U32(v) => Value::U32(*v),
            MapKey::U64(v) => Value::U64(*v),
            MapKey::String(v) => Value::String(v.clone()),
        }
    }
}

impl From<&str> for MapKey {
    fn from(v: &str) -> Self {
        MapKey::String(v.to_owned())
    }
}

/// A decoded (or to-be-encoded) message: an ordered name→value mapping with
/// no fixed schema class.
///
/// Absence of a key is the "absent" state; there is no null value. Encoding
/// skips fields whose key is missing, and decoding only inserts keys that
/// were populated from the wire or backfilled as required defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Builder-style insert, for literal record construction.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Type-appropriate zero value injected for absent required fields.
///
/// Nested messages have no default: a required sub-message absent from the
/// wire stays absent.
pub fn default_value(ty: &FieldType) -> Option<Value> {
    let value = match ty {
        FieldType::Scalar(kind) | FieldType::Wrapper(kind) => scalar_default(*kind),
        FieldType::RepeatedSimple(_) | FieldType::RepeatedPacked(_) => Value::List(Vec::new()),
        FieldType::Map(_, _) => Value::Map(BTreeMap::new()),
        FieldType::Message(_) => return None,
    };
    Some(value)
}

/// Zero value of a scalar kind.
pub(crate) fn scalar_default(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::Double => Value::F64(0.0),
        ScalarKind::Float => Value::F32(0.0),
        ScalarKind::Int32 | ScalarKind::Sint32 | ScalarKind::Sfixed32 => Value::I32(0),
        ScalarKind::Int64 | ScalarKind::Sint64 | ScalarKind::Sfixed64 => Value::I64(0),
        ScalarKind::Uint32 | ScalarKind::Fixed32 | ScalarKind::Enum => Value::U32(0),
        ScalarKind::Uint64 | ScalarKind::Fixed64 => Value::U64(0),
        ScalarKind::Bool => Value::Bool(false),
        ScalarKind::String => Value::String(String::new()),
        ScalarKind::Bytes => Value::Bytes(Bytes::new()),
    }
}
