//! fudge-wire is a streaming encoder/decoder for the Fudge binary message
//! format: compact, self-describing, hierarchical key/value messages with a
//! one-byte type tag per field. It plays the same role as Protocol Buffers
//! or BSON, with two twists:
//!
//! - Fields may be addressed by name, by a small signed ordinal, or both,
//!   and a shared *taxonomy* can substitute ordinals for names on the wire.
//! - The type set is open: unrecognized variable-width types decode to
//!   opaque values that re-encode byte-for-byte, and new types can be
//!   registered at runtime.
//!
//! Encoding walks a [`Message`] tree, computing every sub-message length
//! bottom-up so the output is a single forward pass. Decoding is a
//! pull-parser: [`Decoder`] emits one structural event at a time while an
//! explicit stack of frames checks each nested message's declared byte
//! count, so arbitrarily deep messages decode without recursion.
//!
//! ```
//! use fudge_wire::{decode_envelope, encode_envelope, Envelope, Message, TypeRegistry};
//!
//! let mut msg = Message::new();
//! msg.add_by_name("name", "EURUSD");
//! msg.add_full("price", 2, 1.0843f64);
//!
//! let registry = TypeRegistry::global();
//! let bytes = encode_envelope(&Envelope::new(msg), registry, None).unwrap();
//! let back = decode_envelope(&bytes, registry, None).unwrap();
//! assert_eq!(back.message.field_by_name("price").unwrap().value().as_f64(), Some(1.0843));
//! ```

mod error;
mod message;
mod mutf8;
mod prefix;
mod registry;
mod taxonomy;
mod types;
mod value;

pub mod decode;
pub mod encode;

pub use self::decode::{decode_envelope, DecodeEvent, Decoder};
pub use self::encode::{encode_envelope, message_len, write_envelope};
pub use self::error::{Error, Result};
pub use self::message::{Envelope, Field, Message};
pub use self::prefix::{FieldPrefix, VarWidth};
pub use self::registry::TypeRegistry;
pub use self::taxonomy::{MapResolver, Taxonomy, TaxonomyResolver};
pub use self::types::{type_id, FieldType, WireKind, FIXED_BYTE_ARRAYS};
pub use self::value::Value;

/// Byte length of the envelope header: processing directives, schema
/// version, taxonomy id, and the total envelope size.
pub const ENVELOPE_HEADER_SIZE: usize = 8;
