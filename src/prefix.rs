//! The one-byte field prefix.
//!
//! Bit layout, most significant first:
//!
//! ```text
//! 7        6 5        4        3        2 1 0
//! fixed    var width  ordinal  name     (unused)
//! ```
//!
//! The two var-width bits hold the byte count of the explicit size field:
//! 0, 1, or 2 directly, with 3 standing for 4 bytes. A fixed-width field
//! never carries an explicit size, and a variable-width field with width 0
//! has an implicit zero-length payload.

use crate::error::{Error, Result};

const FIXED_WIDTH: u8 = 0x80;
const VAR_WIDTH_MASK: u8 = 0x60;
const VAR_WIDTH_SHIFT: u32 = 5;
const HAS_ORDINAL: u8 = 0x10;
const HAS_NAME: u8 = 0x08;

/// Byte count of a field's explicit size field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarWidth {
    Zero,
    One,
    Two,
    Four,
}

impl VarWidth {
    /// Number of bytes the explicit size occupies on the wire.
    pub fn byte_count(self) -> usize {
        match self {
            VarWidth::Zero => 0,
            VarWidth::One => 1,
            VarWidth::Two => 2,
            VarWidth::Four => 4,
        }
    }

    /// Inverse of [`byte_count`](Self::byte_count). Only 0, 1, 2, and 4 are
    /// legal widths.
    pub fn from_byte_count(count: usize) -> Result<Self> {
        match count {
            0 => Ok(VarWidth::Zero),
            1 => Ok(VarWidth::One),
            2 => Ok(VarWidth::Two),
            4 => Ok(VarWidth::Four),
            other => Err(Error::BadSizeWidth(other)),
        }
    }

    /// The smallest width able to hold a payload length.
    pub fn for_len(len: usize) -> Result<Self> {
        if len == 0 {
            Ok(VarWidth::Zero)
        } else if len <= u8::MAX as usize {
            Ok(VarWidth::One)
        } else if len <= u16::MAX as usize {
            Ok(VarWidth::Two)
        } else if len <= u32::MAX as usize {
            Ok(VarWidth::Four)
        } else {
            Err(Error::SizeTooLarge(len))
        }
    }

    fn bits(self) -> u8 {
        match self {
            VarWidth::Zero => 0,
            VarWidth::One => 1,
            VarWidth::Two => 2,
            VarWidth::Four => 3,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => VarWidth::Zero,
            1 => VarWidth::One,
            2 => VarWidth::Two,
            _ => VarWidth::Four,
        }
    }
}

/// Decoded form of the field prefix byte. `var_width` is meaningful only when
/// `fixed_width` is false.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldPrefix {
    pub fixed_width: bool,
    pub has_ordinal: bool,
    pub has_name: bool,
    pub var_width: VarWidth,
}

impl FieldPrefix {
    pub fn fixed(has_ordinal: bool, has_name: bool) -> Self {
        Self {
            fixed_width: true,
            has_ordinal,
            has_name,
            var_width: VarWidth::Zero,
        }
    }

    pub fn variable(has_ordinal: bool, has_name: bool, var_width: VarWidth) -> Self {
        Self {
            fixed_width: false,
            has_ordinal,
            has_name,
            var_width,
        }
    }

    /// Every byte decodes to some prefix; the low three bits are reserved and
    /// ignored.
    pub fn from_u8(byte: u8) -> Self {
        Self {
            fixed_width: byte & FIXED_WIDTH != 0,
            has_ordinal: byte & HAS_ORDINAL != 0,
            has_name: byte & HAS_NAME != 0,
            var_width: VarWidth::from_bits((byte & VAR_WIDTH_MASK) >> VAR_WIDTH_SHIFT),
        }
    }

    pub fn to_u8(self) -> u8 {
        let mut byte = 0u8;
        if self.fixed_width {
            byte |= FIXED_WIDTH;
        } else {
            byte |= self.var_width.bits() << VAR_WIDTH_SHIFT;
        }
        if self.has_ordinal {
            byte |= HAS_ORDINAL;
        }
        if self.has_name {
            byte |= HAS_NAME;
        }
        byte
    }
}

impl From<u8> for FieldPrefix {
    fn from(val: u8) -> FieldPrefix {
        FieldPrefix::from_u8(val)
    }
}

impl From<FieldPrefix> for u8 {
    fn from(val: FieldPrefix) -> u8 {
        val.to_u8()
    }
}
