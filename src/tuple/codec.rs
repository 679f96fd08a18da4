//! Fixed-width tuple codec.
//!
//! Shared by the heap page (online path) and the bulk encoder (offline
//! path), so both produce identical bytes for the same tuple.
//!
//! Field layout:
//! ```text
//! INT   4 bytes, big-endian two's complement
//! TEXT  4-byte big-endian length, then STRING_LEN bytes (data + zero padding)
//! ```

use crate::error::{DbError, Result};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{Field, Type, STRING_LEN};
use std::sync::Arc;

/// Longest prefix of `s` that fits in a text field without splitting a char
pub fn truncate_text(s: &str) -> &str {
    if s.len() <= STRING_LEN {
        return s;
    }
    let mut end = STRING_LEN;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Encode one field into `out`, which must be exactly `field_type().byte_len()` long
pub fn encode_field(field: &Field, out: &mut [u8]) {
    match field {
        Field::Int(v) => out[..4].copy_from_slice(&v.to_be_bytes()),
        Field::Text(s) => {
            let s = truncate_text(s);
            out[..4].copy_from_slice(&(s.len() as u32).to_be_bytes());
            out[4..4 + s.len()].copy_from_slice(s.as_bytes());
            out[4 + s.len()..4 + STRING_LEN].fill(0);
        }
    }
}

/// Decode one field of type `ty` from the front of `bytes`
pub fn decode_field(ty: Type, bytes: &[u8]) -> Result<Field> {
    if bytes.len() < ty.byte_len() {
        return Err(DbError::corruption("field extends past end of slot"));
    }
    let prefix = [bytes[0], bytes[1], bytes[2], bytes[3]];
    match ty {
        Type::Int => Ok(Field::Int(i32::from_be_bytes(prefix))),
        Type::Text => {
            let len = u32::from_be_bytes(prefix) as usize;
            if len > STRING_LEN {
                return Err(DbError::corruption(format!(
                    "text length {} exceeds maximum {}",
                    len, STRING_LEN
                )));
            }
            let text = std::str::from_utf8(&bytes[4..4 + len])
                .map_err(|e| DbError::corruption(format!("invalid utf-8 in text field: {}", e)))?;
            Ok(Field::Text(text.to_string()))
        }
    }
}

/// Encode a full row into `out` (at least `desc.byte_size()` bytes)
pub fn encode_fields(desc: &TupleDesc, fields: &[Field], out: &mut [u8]) -> Result<()> {
    let conforms = fields.len() == desc.num_fields()
        && fields.iter().zip(desc.types()).all(|(f, t)| f.field_type() == t);
    if !conforms {
        let found = TupleDesc::unnamed(&fields.iter().map(Field::field_type).collect::<Vec<_>>());
        return Err(DbError::schema_mismatch(desc, found));
    }
    let mut offset = 0;
    for field in fields {
        let len = field.field_type().byte_len();
        encode_field(field, &mut out[offset..offset + len]);
        offset += len;
    }
    Ok(())
}

/// Decode a full row from `bytes`
pub fn decode_tuple(desc: &Arc<TupleDesc>, bytes: &[u8]) -> Result<Tuple> {
    let mut fields = Vec::with_capacity(desc.num_fields());
    let mut offset = 0;
    for ty in desc.types() {
        fields.push(decode_field(ty, &bytes[offset..])?);
        offset += ty.byte_len();
    }
    Tuple::new(Arc::clone(desc), fields)
}
