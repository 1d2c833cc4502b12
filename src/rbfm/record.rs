/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! External <-> on-page record encoding.
//!
//! External format: concatenation of attribute values in descriptor
//! order, `VarChar` prefixed by a 4-byte length (see
//! [`crate::types::Value::encode`]).
//!
//! On-page format: `[tombFlag: i16][offset_1: u16]..[offset_N:
//! u16][field_1 bytes]..[field_N bytes]`, where `tombFlag` is `0` for
//! an ordinary record and each `offset_i` is the end of field *i*
//! measured from the start of the field-data region (so field *i*
//! occupies `data[offset_{i-1}..offset_i]`, with `offset_0 = 0`).

use crate::error::{EngineError, Result};
use crate::types::{AttrType, Attribute, Value};

pub const SMALLEST_RECORD_LENGTH: usize = 10;
const TOMBSTONE_FLAG: i16 = -1;

/// Encode external field bytes into the on-page layout, returning a
/// buffer whose length is `encoded_len(...)` (padded up to
/// [`SMALLEST_RECORD_LENGTH`] when necessary).
pub fn encode_record(descriptor: &[Attribute], values: &[Value]) -> Result<Vec<u8>> {
    if descriptor.len() != values.len() {
        return Err(EngineError::argument(
            "value count does not match record descriptor",
        ));
    }
    let header_len = 2 + 2 * descriptor.len();
    let mut field_bytes = Vec::new();
    let mut offsets = Vec::with_capacity(descriptor.len());
    for (attr, value) in descriptor.iter().zip(values.iter()) {
        if let Some(vt) = value.attr_type() {
            if vt != attr.attr_type {
                return Err(EngineError::argument(format!(
                    "attribute {} expected {:?}, got {:?}",
                    attr.name, attr.attr_type, vt
                )));
            }
        }
        let encoded = value.encode();
        field_bytes.extend_from_slice(&encoded);
        offsets.push(field_bytes.len() as u16);
    }

    let mut out = Vec::with_capacity(header_len + field_bytes.len());
    out.extend_from_slice(&0i16.to_le_bytes());
    for off in offsets {
        out.extend_from_slice(&off.to_le_bytes());
    }
    out.extend_from_slice(&field_bytes);

    if out.len() < SMALLEST_RECORD_LENGTH {
        out.resize(SMALLEST_RECORD_LENGTH, 0);
    }
    Ok(out)
}

pub fn decode_record(descriptor: &[Attribute], bytes: &[u8]) -> Result<Vec<Value>> {
    if bytes.len() < 2 {
        return Err(EngineError::state("record too short to contain a header"));
    }
    let flag = i16::from_le_bytes(bytes[0..2].try_into().unwrap());
    if flag == TOMBSTONE_FLAG {
        return Err(EngineError::state(
            "attempted to decode a tombstone as a record",
        ));
    }
    let n = descriptor.len();
    let header_len = 2 + 2 * n;
    if bytes.len() < header_len {
        return Err(EngineError::state("record header truncated"));
    }
    let mut offsets = Vec::with_capacity(n);
    for i in 0..n {
        let start = 2 + 2 * i;
        offsets.push(u16::from_le_bytes(bytes[start..start + 2].try_into().unwrap()) as usize);
    }
    let field_region = &bytes[header_len..];
    let mut values = Vec::with_capacity(n);
    let mut prev = 0usize;
    for (attr, &end) in descriptor.iter().zip(offsets.iter()) {
        if end < prev || end > field_region.len() {
            return Err(EngineError::state("corrupt field offset in record"));
        }
        let slice = &field_region[prev..end];
        let value = if slice.is_empty() && attr.attr_type != AttrType::VarChar {
            Value::Null
        } else {
            Value::decode(attr.attr_type, slice)?
        };
        values.push(value);
        prev = end;
    }
    Ok(values)
}

/// Reads a single attribute's raw (external-format) bytes out of an
/// on-page record without decoding the others.
pub fn read_attribute_bytes(
    descriptor: &[Attribute],
    bytes: &[u8],
    attr_index: usize,
) -> Result<Vec<u8>> {
    let n = descriptor.len();
    let header_len = 2 + 2 * n;
    if bytes.len() < header_len {
        return Err(EngineError::state("record header truncated"));
    }
    let mut prev = 0usize;
    let mut result = Vec::new();
    for i in 0..=attr_index {
        let start = 2 + 2 * i;
        let end = u16::from_le_bytes(bytes[start..start + 2].try_into().unwrap()) as usize;
        if i == attr_index {
            let field_region = &bytes[header_len..];
            if end > field_region.len() || prev > end {
                return Err(EngineError::state("corrupt field offset in record"));
            }
            // `field_region[prev..end]` is exactly this field's
            // `Value::encode()` output (for `VarChar` that already
            // includes its own 4-byte length prefix), so no
            // type-specific reassembly is needed here.
            result = field_region[prev..end].to_vec();
        }
        prev = end;
    }
    Ok(result)
}

pub fn is_tombstone(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && i16::from_le_bytes(bytes[0..2].try_into().unwrap()) == TOMBSTONE_FLAG
}

/// Encodes a 10-byte tombstone stub pointing at `(page_num, slot_num)`.
pub fn encode_tombstone(page_num: u32, slot_num: u32) -> [u8; SMALLEST_RECORD_LENGTH] {
    let mut out = [0u8; SMALLEST_RECORD_LENGTH];
    out[0..2].copy_from_slice(&TOMBSTONE_FLAG.to_le_bytes());
    out[2..6].copy_from_slice(&page_num.to_le_bytes());
    out[6..10].copy_from_slice(&slot_num.to_le_bytes());
    out
}

/// Decodes a tombstone stub back into the forwarding `(page_num, slot_num)`.
pub fn decode_tombstone(bytes: &[u8]) -> Result<(u32, u32)> {
    if !is_tombstone(bytes) || bytes.len() < SMALLEST_RECORD_LENGTH {
        return Err(EngineError::state("not a tombstone record"));
    }
    let page_num = u32::from_le_bytes(bytes[2..6].try_into().unwrap());
    let slot_num = u32::from_le_bytes(bytes[6..10].try_into().unwrap());
    Ok((page_num, slot_num))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> Vec<Attribute> {
        vec![
            Attribute::new("id", AttrType::Int, 4),
            Attribute::new("name", AttrType::VarChar, 20),
        ]
    }

    #[test]
    fn round_trip() {
        let d = descriptor();
        let values = vec![Value::Int(1), Value::VarChar("alice".to_string())];
        let encoded = encode_record(&d, &values).unwrap();
        let decoded = decode_record(&d, &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn tombstone_round_trip() {
        let stub = encode_tombstone(3, 7);
        assert!(is_tombstone(&stub));
        assert_eq!(decode_tombstone(&stub).unwrap(), (3, 7));
    }

    #[test]
    fn read_single_attribute() {
        let d = descriptor();
        let values = vec![Value::Int(42), Value::VarChar("bob".to_string())];
        let encoded = encode_record(&d, &values).unwrap();
        let raw = read_attribute_bytes(&d, &encoded, 0).unwrap();
        assert_eq!(i32::from_le_bytes(raw.try_into().unwrap()), 42);
    }

    #[test]
    fn read_varchar_attribute_is_length_prefixed() {
        let d = descriptor();
        let values = vec![Value::Int(42), Value::VarChar("bob".to_string())];
        let encoded = encode_record(&d, &values).unwrap();
        let raw = read_attribute_bytes(&d, &encoded, 1).unwrap();
        assert_eq!(Value::decode(AttrType::VarChar, &raw).unwrap(), values[1]);
    }
}
