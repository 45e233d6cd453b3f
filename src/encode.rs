//! The streaming encoder.
//!
//! Encoding is two passes: a sizing pass that computes every sub-message
//! body length bottom-up and rejects caller-input errors before a single
//! byte is written, then one forward write pass. All multi-byte integers are
//! big-endian.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::message::{Envelope, Field, Message};
use crate::mutf8;
use crate::prefix::{FieldPrefix, VarWidth};
use crate::registry::TypeRegistry;
use crate::taxonomy::Taxonomy;
use crate::types::FieldType;
use crate::value::Value;
use crate::ENVELOPE_HEADER_SIZE;

/// Encode one envelope to a fresh buffer.
pub fn encode_envelope(
    envelope: &Envelope,
    registry: &TypeRegistry,
    taxonomy: Option<&Taxonomy>,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_envelope(&mut buf, envelope, registry, taxonomy)?;
    Ok(buf)
}

/// Encode one envelope onto the end of `buf`. Validation happens in the
/// sizing pass, so on error `buf` is untouched.
pub fn write_envelope(
    buf: &mut Vec<u8>,
    envelope: &Envelope,
    registry: &TypeRegistry,
    taxonomy: Option<&Taxonomy>,
) -> Result<()> {
    let body = message_len(&envelope.message, registry, taxonomy)?;
    let total = body
        .checked_add(ENVELOPE_HEADER_SIZE)
        .filter(|&t| t <= u32::MAX as usize)
        .ok_or(Error::SizeTooLarge(body))?;
    buf.push(envelope.directives);
    buf.push(envelope.version);
    buf.extend_from_slice(&envelope.taxonomy_id.to_be_bytes());
    buf.extend_from_slice(&(total as u32).to_be_bytes());
    write_message(buf, &envelope.message, registry, taxonomy)
}

/// Encoded byte length of a message body: the flat field sequence, no
/// envelope header. Doubles as the validation pass; every caller-input
/// error surfaces here.
pub fn message_len(
    msg: &Message,
    registry: &TypeRegistry,
    taxonomy: Option<&Taxonomy>,
) -> Result<usize> {
    let mut total = 0usize;
    for field in msg {
        total = total
            .checked_add(field_len(field, registry, taxonomy)?)
            .ok_or(Error::SizeTooLarge(usize::MAX))?;
    }
    Ok(total)
}

// Resolves the descriptor a field encodes under: its declared type id, with
// unregistered ids (captured unknown payloads) memoized as opaque types.
fn descriptor(field: &Field, registry: &TypeRegistry) -> Arc<FieldType> {
    match registry.by_id(field.type_id()) {
        Some(ty) => ty,
        None => registry.unknown_type(field.type_id()),
    }
}

// The name that actually goes on the wire: elided when the taxonomy already
// maps the field's ordinal to the same name.
fn wire_name<'f>(field: &'f Field, taxonomy: Option<&Taxonomy>) -> Option<&'f str> {
    let name = field.name()?;
    if let (Some(ordinal), Some(tax)) = (field.ordinal(), taxonomy) {
        if tax.name_of(ordinal) == Some(name) {
            return None;
        }
    }
    Some(name)
}

fn field_len(
    field: &Field,
    registry: &TypeRegistry,
    taxonomy: Option<&Taxonomy>,
) -> Result<usize> {
    let ty = descriptor(field, registry);
    let payload = payload_len(field.value(), registry, taxonomy)?;
    if let Some(fixed) = ty.fixed_size() {
        if payload != fixed as usize {
            return Err(Error::FixedSizeMismatch {
                type_id: ty.type_id(),
                expected: fixed,
                actual: payload,
            });
        }
    }

    // prefix + type id
    let mut len = 2usize;
    if field.ordinal().is_some() {
        len += 2;
    }
    if let Some(name) = wire_name(field, taxonomy) {
        let name_len = mutf8::encoded_len(name);
        if name_len > u8::MAX as usize {
            return Err(Error::NameTooLong(name_len));
        }
        len += 1 + name_len;
    }
    if !ty.is_fixed_width() {
        len += VarWidth::for_len(payload)?.byte_count();
    }
    Ok(len + payload)
}

fn payload_len(
    value: &Value,
    registry: &TypeRegistry,
    taxonomy: Option<&Taxonomy>,
) -> Result<usize> {
    Ok(match value {
        Value::Indicator => 0,
        Value::Bool(_) | Value::I8(_) => 1,
        Value::I16(_) => 2,
        Value::I32(_) | Value::F32(_) => 4,
        Value::I64(_) | Value::F64(_) => 8,
        Value::Bytes(v) => v.len(),
        Value::I16Array(v) => v.len() * 2,
        Value::I32Array(v) => v.len() * 4,
        Value::F32Array(v) => v.len() * 4,
        Value::I64Array(v) => v.len() * 8,
        Value::F64Array(v) => v.len() * 8,
        Value::Str(v) => mutf8::encoded_len(v),
        Value::Message(m) => message_len(m, registry, taxonomy)?,
        Value::Unknown { bytes, .. } => bytes.len(),
    })
}

// The write pass only recomputes lengths the sizing pass already validated.
fn write_message(
    buf: &mut Vec<u8>,
    msg: &Message,
    registry: &TypeRegistry,
    taxonomy: Option<&Taxonomy>,
) -> Result<()> {
    for field in msg {
        write_field(buf, field, registry, taxonomy)?;
    }
    Ok(())
}

fn write_field(
    buf: &mut Vec<u8>,
    field: &Field,
    registry: &TypeRegistry,
    taxonomy: Option<&Taxonomy>,
) -> Result<()> {
    let ty = descriptor(field, registry);
    let payload = payload_len(field.value(), registry, taxonomy)?;
    let name = wire_name(field, taxonomy);

    let prefix = if ty.is_fixed_width() {
        FieldPrefix::fixed(field.ordinal().is_some(), name.is_some())
    } else {
        let width = VarWidth::for_len(payload)?;
        FieldPrefix::variable(field.ordinal().is_some(), name.is_some(), width)
    };
    buf.push(prefix.to_u8());
    buf.push(ty.type_id());
    if let Some(ordinal) = field.ordinal() {
        buf.extend_from_slice(&ordinal.to_be_bytes());
    }
    if let Some(name) = name {
        buf.push(mutf8::encoded_len(name) as u8);
        mutf8::encode_into(buf, name);
    }
    if !ty.is_fixed_width() {
        match prefix.var_width {
            VarWidth::Zero => {}
            VarWidth::One => buf.push(payload as u8),
            VarWidth::Two => buf.extend_from_slice(&(payload as u16).to_be_bytes()),
            VarWidth::Four => buf.extend_from_slice(&(payload as u32).to_be_bytes()),
        }
    }
    write_payload(buf, field.value(), registry, taxonomy)
}

fn write_payload(
    buf: &mut Vec<u8>,
    value: &Value,
    registry: &TypeRegistry,
    taxonomy: Option<&Taxonomy>,
) -> Result<()> {
    match value {
        Value::Indicator => {}
        Value::Bool(v) => buf.push(*v as u8),
        Value::I8(v) => buf.push(*v as u8),
        Value::I16(v) => buf.extend_from_slice(&v.to_be_bytes()),
        Value::I32(v) => buf.extend_from_slice(&v.to_be_bytes()),
        Value::I64(v) => buf.extend_from_slice(&v.to_be_bytes()),
        Value::F32(v) => buf.extend_from_slice(&v.to_be_bytes()),
        Value::F64(v) => buf.extend_from_slice(&v.to_be_bytes()),
        Value::Bytes(v) => buf.extend_from_slice(v),
        Value::I16Array(v) => {
            for e in v {
                buf.extend_from_slice(&e.to_be_bytes());
            }
        }
        Value::I32Array(v) => {
            for e in v {
                buf.extend_from_slice(&e.to_be_bytes());
            }
        }
        Value::I64Array(v) => {
            for e in v {
                buf.extend_from_slice(&e.to_be_bytes());
            }
        }
        Value::F32Array(v) => {
            for e in v {
                buf.extend_from_slice(&e.to_be_bytes());
            }
        }
        Value::F64Array(v) => {
            for e in v {
                buf.extend_from_slice(&e.to_be_bytes());
            }
        }
        Value::Str(v) => mutf8::encode_into(buf, v),
        Value::Message(m) => write_message(buf, m, registry, taxonomy)?,
        Value::Unknown { bytes, .. } => buf.extend_from_slice(bytes),
    }
    Ok(())
}
