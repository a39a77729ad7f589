//! The reflective encode engine.

use bytes::BufMut;

use super::scalar;
use crate::descriptor::{map_entry_fields, wrapper_fields, FieldDescriptor, FieldType};
use crate::error::EncodeError;
use crate::leb128::LebCodec;
use crate::value::{Record, Value};
use crate::wire::{self, WireType};

/// Encodes `record` through `fields` into a fresh byte vector.
///
/// Descriptors are walked in table order. Fields whose key is absent from
/// the record are omitted entirely (never an error); a present value whose
/// variant does not match its descriptor fails with
/// [`EncodeError::TypeMismatch`].
pub fn encode(fields: &[FieldDescriptor], record: &Record) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    encode_into(fields, record, &mut buf)?;
    Ok(buf)
}

/// Encodes `record` through `fields`, appending to an existing buffer.
pub fn encode_into<B: BufMut>(
    fields: &[FieldDescriptor],
    record: &Record,
    buf: &mut B,
) -> Result<(), EncodeError> {
    for field in fields {
        if let Some(value) = resolve_value(field, record) {
            encode_value(&field.name, field.tag, &field.ty, value, buf)?;
        }
    }
    Ok(())
}

/// Looks up the value a descriptor should encode.
///
/// Grouped fields read from their group's discriminant wrapper when it names
/// this field, falling back to the record's own key.
fn resolve_value<'a>(field: &FieldDescriptor, record: &'a Record) -> Option<&'a Value> {
    if let Some(group) = &field.group {
        if let Some(Value::Group(group_value)) = record.get(group.key()) {
            if group_value.field == field.name {
                return Some(&group_value.value);
            }
        }
    }
    record.get(&field.name)
}

fn encode_value<B: BufMut>(
    name: &str,
    tag: u32,
    ty: &FieldType,
    value: &Value,
    buf: &mut B,
) -> Result<(), EncodeError> {
    match ty {
        FieldType::Scalar(kind) => {
            wire::encode_key(scalar::wire_type(*kind), tag, buf);
            scalar::encode_scalar(name, *kind, value, buf)?;
        }
        FieldType::RepeatedSimple(element) => {
            let Value::List(items) = value else {
                return Err(type_mismatch(name, "list"));
            };
            if matches!(
                **element,
                FieldType::RepeatedSimple(_) | FieldType::RepeatedPacked(_) | FieldType::Map(..)
            ) {
                return Err(EncodeError::InvalidRepeatedElement);
            }
            // One fully keyed occurrence per element.
            for item in items {
                encode_value(name, tag, element, item, buf)?;
            }
        }
        FieldType::RepeatedPacked(element) => {
            let Value::List(items) = value else {
                return Err(type_mismatch(name, "list"));
            };
            let FieldType::Scalar(kind) = **element else {
                return Err(EncodeError::InvalidPackedElement);
            };
            if scalar::wire_type(kind) == WireType::Len {
                return Err(EncodeError::InvalidPackedElement);
            }
            let mut packed = Vec::new();
            for item in items {
                scalar::encode_scalar(name, kind, item, &mut packed)?;
            }
            wire::encode_key(WireType::Len, tag, buf);
            splice(&packed, buf);
        }
        FieldType::Map(key_kind, value_ty) => {
            let Value::Map(entries) = value else {
                return Err(type_mismatch(name, "map"));
            };
            let entry_fields = map_entry_fields(*key_kind, (**value_ty).clone());
            let [key_field, value_field] = &entry_fields[..] else {
                unreachable!("map entry tables have two fields");
            };
            for (entry_key, entry_value) in entries {
                let key_value = entry_key.to_value();
                let mut entry = Vec::new();
                encode_value(&key_field.name, key_field.tag, &key_field.ty, &key_value, &mut entry)?;
                encode_value(
                    &value_field.name,
                    value_field.tag,
                    &value_field.ty,
                    entry_value,
                    &mut entry,
                )?;
                wire::encode_key(WireType::Len, tag, buf);
                splice(&entry, buf);
            }
        }
        FieldType::Wrapper(kind) => {
            let wrapped = wrapper_fields(*kind);
            let mut body = Vec::new();
            encode_value(&wrapped[0].name, wrapped[0].tag, &wrapped[0].ty, value, &mut body)?;
            wire::encode_key(WireType::Len, tag, buf);
            splice(&body, buf);
        }
        FieldType::Message(nested) => {
            let Value::Message(nested_record) = value else {
                return Err(type_mismatch(name, "message"));
            };
            // Sub-messages are fully materialized first: the parent has to
            // know the byte length before it can write the prefix.
            let body = encode(nested, nested_record)?;
            wire::encode_key(WireType::Len, tag, buf);
            splice(&body, buf);
        }
    }
    Ok(())
}

/// Writes a materialized sub-message as a length-delimited payload.
fn splice<B: BufMut>(body: &[u8], buf: &mut B) {
    (body.len() as u64).encode_leb128(buf);
    buf.put_slice(body);
}

fn type_mismatch(field: &str, expected: &'static str) -> EncodeError {
    EncodeError::TypeMismatch {
        field: field.to_owned(),
        expected,
    }
}
