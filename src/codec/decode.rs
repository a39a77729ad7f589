//! The reflective decode engine.

use std::collections::BTreeMap;

use super::scalar;
use crate::descriptor::{map_entry_fields, wrapper_fields, FieldDescriptor, FieldType, ScalarKind};
use crate::error::DecodeError;
use crate::value::{default_value, scalar_default, GroupValue, MapKey, Record, Value};
use crate::wire::{self, WireType};
use crate::MAX_NESTING_DEPTH;

/// Decodes wire bytes through `fields` into a record.
///
/// Tags absent from the table are skipped by wire type and discarded;
/// `required` fields absent from the wire are backfilled with defaults. Hard
/// parse failures propagate immediately; no partial record is returned.
pub fn decode(fields: &[FieldDescriptor], bytes: &[u8]) -> Result<Record, DecodeError> {
    let mut buf = bytes;
    decode_fields(fields, &mut buf, MAX_NESTING_DEPTH)
}

/// Decodes one message range; `buf` must span exactly the message body.
fn decode_fields(
    fields: &[FieldDescriptor],
    buf: &mut &[u8],
    depth: u32,
) -> Result<Record, DecodeError> {
    let mut record = Record::new();

    while !buf.is_empty() {
        let (wire_type, tag) = wire::decode_key(buf)?;
        let before = buf.len();

        if let Some(field) = fields.iter().find(|field| field.tag == tag) {
            decode_field(field, wire_type, buf, &mut record, depth)?;
            finish_group(field, &mut record);
        }

        // Unknown tags, and defensively any recognized field that consumed
        // nothing, are skipped by wire type so the scan always advances.
        if buf.len() == before {
            wire::skip_field(wire_type, buf)?;
        }
    }

    apply_defaults(fields, &mut record);
    Ok(record)
}

fn decode_field(
    field: &FieldDescriptor,
    wire_type: WireType,
    buf: &mut &[u8],
    record: &mut Record,
    depth: u32,
) -> Result<(), DecodeError> {
    match &field.ty {
        FieldType::Scalar(kind) => {
            let value = scalar::decode_scalar(*kind, buf)?;
            record.insert(field.name.as_str(), value);
        }
        FieldType::RepeatedSimple(element) => {
            // A length-delimited payload for a non-length-delimited scalar
            // is a packed run; parsers accept both forms.
            if let FieldType::Scalar(kind) = **element {
                if wire_type == WireType::Len && scalar::wire_type(kind) != WireType::Len {
                    let values = decode_packed_run(kind, buf)?;
                    extend_list(record, &field.name, values);
                    return Ok(());
                }
            }
            let value = decode_element(element, buf, depth)?;
            extend_list(record, &field.name, vec![value]);
        }
        FieldType::RepeatedPacked(element) => {
            let FieldType::Scalar(kind) = **element else {
                return Err(DecodeError::InvalidPackedElement);
            };
            let values = if wire_type == WireType::Len {
                decode_packed_run(kind, buf)?
            } else {
                // A lone keyed occurrence outside any packed payload.
                vec![scalar::decode_scalar(kind, buf)?]
            };
            extend_list(record, &field.name, values);
        }
        FieldType::Map(key_kind, value_ty) => {
            let entry_fields = map_entry_fields(*key_kind, (**value_ty).clone());
            let mut body = sub_range(buf)?;
            let mut entry = decode_at_depth(&entry_fields, &mut body, depth)?;

            let key = entry
                .remove("key")
                .unwrap_or_else(|| scalar_default(*key_kind))
                .into_map_key()?;
            let value = match entry.remove("value") {
                Some(value) => value,
                // Only message-typed values escape the required backfill.
                None => Value::Message(Record::new()),
            };
            merge_map(record, &field.name, key, value);
        }
        FieldType::Wrapper(kind) => {
            let wrapped = wrapper_fields(*kind);
            let mut body = sub_range(buf)?;
            let mut inner = decode_at_depth(&wrapped, &mut body, depth)?;
            let value = inner.remove("value").unwrap_or_else(|| scalar_default(*kind));
            record.insert(field.name.as_str(), value);
        }
        FieldType::Message(nested) => {
            let mut body = sub_range(buf)?;
            let message = decode_at_depth(nested, &mut body, depth)?;
            record.insert(field.name.as_str(), Value::Message(message));
        }
    }
    Ok(())
}

/// Decodes one element of a repeated-simple field.
fn decode_element(element: &FieldType, buf: &mut &[u8], depth: u32) -> Result<Value, DecodeError> {
    match element {
        FieldType::Scalar(kind) => scalar::decode_scalar(*kind, buf),
        FieldType::Wrapper(kind) => {
            let wrapped = wrapper_fields(*kind);
            let mut body = sub_range(buf)?;
            let mut inner = decode_at_depth(&wrapped, &mut body, depth)?;
            Ok(inner.remove("value").unwrap_or_else(|| scalar_default(*kind)))
        }
        FieldType::Message(nested) => {
            let mut body = sub_range(buf)?;
            Ok(Value::Message(decode_at_depth(nested, &mut body, depth)?))
        }
        FieldType::RepeatedSimple(_) | FieldType::RepeatedPacked(_) | FieldType::Map(..) => {
            Err(DecodeError::InvalidRepeatedElement)
        }
    }
}

/// Reads a length-delimited run of raw scalar encodings.
fn decode_packed_run(kind: ScalarKind, buf: &mut &[u8]) -> Result<Vec<Value>, DecodeError> {
    let mut body = sub_range(buf)?;
    let mut values = Vec::new();
    while !body.is_empty() {
        values.push(scalar::decode_scalar(kind, &mut body)?);
    }
    Ok(values)
}

/// Splits off the length-prefixed sub-range a nested message occupies.
fn sub_range<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], DecodeError> {
    let len = wire::decode_len(buf)?;
    if buf.len() < len {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    let (body, rest) = buf.split_at(len);
    *buf = rest;
    Ok(body)
}

fn decode_at_depth(
    fields: &[FieldDescriptor],
    buf: &mut &[u8],
    depth: u32,
) -> Result<Record, DecodeError> {
    if depth == 0 {
        return Err(DecodeError::DepthLimitExceeded {
            limit: MAX_NESTING_DEPTH,
        });
    }
    decode_fields(fields, buf, depth - 1)
}

/// Appends into the ordered sequence under `name`, creating it on first use.
fn extend_list(record: &mut Record, name: &str, values: Vec<Value>) {
    match record.get_mut(name) {
        Some(Value::List(items)) => items.extend(values),
        _ => {
            record.insert(name, Value::List(values));
        }
    }
}

/// Merges one decoded entry into the mapping under `name`; a duplicate key
/// keeps the last decoded value.
fn merge_map(record: &mut Record, name: &str, key: MapKey, value: Value) {
    match record.get_mut(name) {
        Some(Value::Map(entries)) => {
            entries.insert(key, value);
        }
        _ => {
            let mut entries = BTreeMap::new();
            entries.insert(key, value);
            record.insert(name, Value::Map(entries));
        }
    }
}

/// Moves a freshly decoded group member under its group key.
///
/// Only the group key survives in the final record; populating a second
/// member of the same group replaces the first.
fn finish_group(field: &FieldDescriptor, record: &mut Record) {
    let Some(group) = &field.group else { return };
    if let Some(value) = record.remove(&field.name) {
        record.insert(
            group.key(),
            Value::Group(GroupValue::new(field.name.clone(), value)),
        );
    }
}

/// Backfills type-appropriate defaults for required fields the scan did not
/// populate.
fn apply_defaults(fields: &[FieldDescriptor], record: &mut Record) {
    for field in fields {
        if !field.required {
            continue;
        }
        match &field.group {
            Some(group) => {
                // Grouped defaults only apply while no member of the group
                // made it onto the wire.
                if record.contains(group.key()) {
                    continue;
                }
                if let Some(value) = default_value(&field.ty) {
                    record.insert(
                        group.key(),
                        Value::Group(GroupValue::new(field.name.clone(), value)),
                    );
                }
            }
            None => {
                if record.contains(&field.name) {
                    continue;
                }
                if let Some(value) = default_value(&field.ty) {
                    record.insert(field.name.as_str(), value);
                }
            }
        }
    }
}
