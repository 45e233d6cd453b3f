//! Wire type identifiers and field type descriptors.
//!
//! Every field on the wire carries a one-byte type id. The built-in
//! assignments below follow the Fudge encoding specification; ids outside
//! this set are open for runtime registration through the
//! [`TypeRegistry`](crate::TypeRegistry).

/// The built-in Fudge wire type ids.
pub mod type_id {
    pub const INDICATOR: u8 = 0;
    pub const BOOLEAN: u8 = 1;
    pub const BYTE: u8 = 2;
    pub const SHORT: u8 = 3;
    pub const INT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const BYTE_ARRAY: u8 = 6;
    pub const SHORT_ARRAY: u8 = 7;
    pub const INT_ARRAY: u8 = 8;
    pub const LONG_ARRAY: u8 = 9;
    pub const FLOAT: u8 = 10;
    pub const FLOAT_ARRAY: u8 = 11;
    pub const DOUBLE: u8 = 12;
    pub const DOUBLE_ARRAY: u8 = 13;
    pub const STRING: u8 = 14;
    pub const MESSAGE: u8 = 15;
    pub const BYTE_ARRAY_4: u8 = 17;
    pub const BYTE_ARRAY_8: u8 = 18;
    pub const BYTE_ARRAY_16: u8 = 19;
    pub const BYTE_ARRAY_20: u8 = 20;
    pub const BYTE_ARRAY_32: u8 = 21;
    pub const BYTE_ARRAY_64: u8 = 22;
    pub const BYTE_ARRAY_128: u8 = 23;
    pub const BYTE_ARRAY_256: u8 = 24;
    pub const BYTE_ARRAY_512: u8 = 25;
}

/// The fixed-length byte array variants, `(type id, payload length)`.
pub const FIXED_BYTE_ARRAYS: [(u8, u32); 9] = [
    (type_id::BYTE_ARRAY_4, 4),
    (type_id::BYTE_ARRAY_8, 8),
    (type_id::BYTE_ARRAY_16, 16),
    (type_id::BYTE_ARRAY_20, 20),
    (type_id::BYTE_ARRAY_32, 32),
    (type_id::BYTE_ARRAY_64, 64),
    (type_id::BYTE_ARRAY_128, 128),
    (type_id::BYTE_ARRAY_256, 256),
    (type_id::BYTE_ARRAY_512, 512),
];

/// The shape of a wire type's payload. This is the closed dispatch set the
/// decoder and encoder switch on; new wire types extend it here and in the
/// registry's built-in table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireKind {
    /// Zero-byte payload with a single sentinel value.
    Indicator,
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// Raw byte payload, covering the variable-length byte array and all
    /// fixed-length variants.
    Bytes,
    I16Array,
    I32Array,
    I64Array,
    F32Array,
    F64Array,
    /// Modified UTF-8 string payload.
    Str,
    /// Nested flat field sequence, no inner envelope header.
    Message,
    /// Opaque payload for type ids with no registered meaning.
    Unknown,
}

impl WireKind {
    /// Element width in bytes for array kinds, `None` otherwise.
    pub fn element_width(self) -> Option<usize> {
        match self {
            WireKind::I16Array => Some(2),
            WireKind::I32Array | WireKind::F32Array => Some(4),
            WireKind::I64Array | WireKind::F64Array => Some(8),
            _ => None,
        }
    }
}

/// Descriptor for one wire type: its id, whether its payload width is implied
/// by the id alone, and the payload shape used for dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldType {
    type_id: u8,
    fixed_size: Option<u32>,
    kind: WireKind,
}

impl FieldType {
    /// A fixed-width type: every payload is exactly `size` bytes and no
    /// explicit length is encoded.
    pub fn fixed(type_id: u8, size: u32, kind: WireKind) -> Self {
        Self {
            type_id,
            fixed_size: Some(size),
            kind,
        }
    }

    /// A variable-width type: each field carries its payload length
    /// explicitly.
    pub fn variable(type_id: u8, kind: WireKind) -> Self {
        Self {
            type_id,
            fixed_size: None,
            kind,
        }
    }

    pub fn type_id(&self) -> u8 {
        self.type_id
    }

    pub fn is_fixed_width(&self) -> bool {
        self.fixed_size.is_some()
    }

    /// The implied payload size. `None` for variable-width types.
    pub fn fixed_size(&self) -> Option<u32> {
        self.fixed_size
    }

    pub fn kind(&self) -> WireKind {
        self.kind
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scalar_widths() {
        assert_eq!(WireKind::I16Array.element_width(), Some(2));
        assert_eq!(WireKind::I32Array.element_width(), Some(4));
        assert_eq!(WireKind::F32Array.element_width(), Some(4));
        assert_eq!(WireKind::I64Array.element_width(), Some(8));
        assert_eq!(WireKind::F64Array.element_width(), Some(8));
        assert_eq!(WireKind::Bytes.element_width(), None);
        assert_eq!(WireKind::Str.element_width(), None);
    }

    #[test]
    fn descriptor_shape() {
        let t = FieldType::fixed(type_id::INT, 4, WireKind::I32);
        assert!(t.is_fixed_width());
        assert_eq!(t.fixed_size(), Some(4));
        let t = FieldType::variable(type_id::STRING, WireKind::Str);
        assert!(!t.is_fixed_width());
        assert_eq!(t.fixed_size(), None);
    }
}
