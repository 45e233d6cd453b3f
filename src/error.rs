use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// Input ended before the current decode step could complete. This is an
    /// I/O-class failure: the transport may retry with a complete buffer, but
    /// the decoder that raised it must be discarded.
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// A field used a type id with no registered meaning while its prefix
    /// declared a fixed width, so its payload size cannot be inferred and the
    /// stream cannot be skipped past it.
    UnknownFixedType(u8),
    /// A variable-size field width other than 0, 1, 2, or 4 bytes.
    BadSizeWidth(usize),
    /// A message frame closed with a consumed byte count that does not equal
    /// the size declared in its field prefix.
    FrameSizeMismatch { declared: u32, consumed: u64 },
    /// Modified UTF-8 string payload failed to decode.
    BadString(String),
    /// An array payload whose byte length is not a multiple of its element
    /// width.
    BadArrayLength { type_id: u8, len: usize },
    /// Caller supplied a value for a fixed-width type whose payload length
    /// disagrees with the declared fixed size.
    FixedSizeMismatch {
        type_id: u8,
        expected: u32,
        actual: usize,
    },
    /// A field name whose modified UTF-8 encoding exceeds 255 bytes.
    NameTooLong(usize),
    /// A payload or envelope larger than a u32 size field can describe.
    SizeTooLarge(usize),
    /// A type id was registered twice with conflicting descriptors.
    DuplicateType(u8),
    /// Malformed encoding not covered by a more specific variant.
    BadEncode(String),
    /// Underlying byte source failure.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::LengthTooShort {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected data length {}, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::UnknownFixedType(id) => {
                write!(f, "Unrecognized type id {} declared as fixed-width", id)
            }
            Error::BadSizeWidth(w) => write!(
                f,
                "Variable-size field width must be 0, 1, 2, or 4 bytes, got {}",
                w
            ),
            Error::FrameSizeMismatch { declared, consumed } => write!(
                f,
                "Message frame declared {} bytes but consumed {}",
                declared, consumed
            ),
            Error::BadString(ref err) => write!(f, "Bad modified UTF-8 string: {}", err),
            Error::BadArrayLength { type_id, len } => write!(
                f,
                "Array payload of type {} has length {} not divisible by element width",
                type_id, len
            ),
            Error::FixedSizeMismatch {
                type_id,
                expected,
                actual,
            } => write!(
                f,
                "Fixed-width type {} requires a {}-byte payload, value has {}",
                type_id, expected, actual
            ),
            Error::NameTooLong(len) => {
                write!(f, "Field name encodes to {} bytes, limit is 255", len)
            }
            Error::SizeTooLarge(len) => {
                write!(f, "Size {} does not fit in a u32 size field", len)
            }
            Error::DuplicateType(id) => write!(
                f,
                "Type id {} is already registered with a different descriptor",
                id
            ),
            Error::BadEncode(ref err) => write!(f, "Basic data encoding failure: {}", err),
            Error::Io(ref err) => write!(f, "I/O failure: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
