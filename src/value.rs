use crate::message::Message;
use crate::types::{type_id, WireKind, FIXED_BYTE_ARRAYS};

/// A single field's payload value.
///
/// Each variant corresponds to one payload shape of the wire format. An
/// [`Unknown`](Value::Unknown) value preserves the original type id and raw
/// bytes of a field whose type had no registered meaning, so it re-encodes
/// byte-for-byte. Pass-through is exact for canonical input, where the size
/// field uses the minimal width for the payload length; a wider-than-needed
/// size field re-encodes at the minimal width.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Indicator,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
    I16Array(Vec<i16>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
    Str(String),
    Message(Message),
    Unknown { type_id: u8, bytes: Vec<u8> },
}

impl Value {
    pub fn kind(&self) -> WireKind {
        match self {
            Value::Indicator => WireKind::Indicator,
            Value::Bool(_) => WireKind::Bool,
            Value::I8(_) => WireKind::I8,
            Value::I16(_) => WireKind::I16,
            Value::I32(_) => WireKind::I32,
            Value::I64(_) => WireKind::I64,
            Value::F32(_) => WireKind::F32,
            Value::F64(_) => WireKind::F64,
            Value::Bytes(_) => WireKind::Bytes,
            Value::I16Array(_) => WireKind::I16Array,
            Value::I32Array(_) => WireKind::I32Array,
            Value::I64Array(_) => WireKind::I64Array,
            Value::F32Array(_) => WireKind::F32Array,
            Value::F64Array(_) => WireKind::F64Array,
            Value::Str(_) => WireKind::Str,
            Value::Message(_) => WireKind::Message,
            Value::Unknown { .. } => WireKind::Unknown,
        }
    }

    /// The wire type id [`best_match`](crate::TypeRegistry::best_match)
    /// selects for this value's shape.
    pub(crate) fn natural_type_id(&self) -> u8 {
        match self {
            Value::Indicator => type_id::INDICATOR,
            Value::Bool(_) => type_id::BOOLEAN,
            Value::I8(_) => type_id::BYTE,
            Value::I16(_) => type_id::SHORT,
            Value::I32(_) => type_id::INT,
            Value::I64(_) => type_id::LONG,
            Value::F32(_) => type_id::FLOAT,
            Value::F64(_) => type_id::DOUBLE,
            Value::Bytes(v) => FIXED_BYTE_ARRAYS
                .iter()
                .find(|&&(_, len)| len as usize == v.len())
                .map(|&(id, _)| id)
                .unwrap_or(type_id::BYTE_ARRAY),
            Value::I16Array(_) => type_id::SHORT_ARRAY,
            Value::I32Array(_) => type_id::INT_ARRAY,
            Value::I64Array(_) => type_id::LONG_ARRAY,
            Value::F32Array(_) => type_id::FLOAT_ARRAY,
            Value::F64Array(_) => type_id::DOUBLE_ARRAY,
            Value::Str(_) => type_id::STRING,
            Value::Message(_) => type_id::MESSAGE,
            Value::Unknown { type_id, .. } => *type_id,
        }
    }

    pub fn is_indicator(&self) -> bool {
        matches!(self, Value::Indicator)
    }

    pub fn is_message(&self) -> bool {
        matches!(self, Value::Message(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        if let Value::I8(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        if let Value::I16(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        if let Value::I32(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        if let Value::I64(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        if let Value::F32(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        if let Value::F64(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Value::Bytes(ref v) = *self {
            Some(v.as_slice())
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Str(ref v) = *self {
            Some(v.as_str())
        } else {
            None
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        if let Value::Message(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn into_message(self) -> Option<Message> {
        if let Value::Message(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::I8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
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
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<i16>> for Value {
    fn from(v: Vec<i16>) -> Self {
        Value::I16Array(v)
    }
}

impl From<Vec<i32>> for Value {
    fn from(v: Vec<i32>) -> Self {
        Value::I32Array(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::I64Array(v)
    }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self {
        Value::F32Array(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::F64Array(v)
    }
}

impl From<Message> for Value {
    fn from(v: Message) -> Self {
        Value::Message(v)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn natural_ids_for_byte_arrays() {
        assert_eq!(Value::Bytes(vec![0; 20]).natural_type_id(), 20);
        assert_eq!(Value::Bytes(vec![0; 21]).natural_type_id(), type_id::BYTE_ARRAY);
        assert_eq!(Value::Bytes(vec![0; 512]).natural_type_id(), 25);
        assert_eq!(Value::Bytes(Vec::new()).natural_type_id(), type_id::BYTE_ARRAY);
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::from(7i32).as_i32(), Some(7));
        assert_eq!(Value::from(7i32).as_i64(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::Indicator.is_indicator());
    }
}
