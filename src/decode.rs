//! The streaming pull decoder.
//!
//! [`Decoder`] walks raw bytes and emits one structural event per call:
//! the envelope header, a simple field, or the start or end of a nested
//! sub-message. Nesting is tracked with an explicit stack of frames, one per
//! open message, each holding the byte count its field prefix declared
//! against the bytes consumed so far. No recursion and no buffering of
//! sub-message bodies.

use byteorder::{BigEndian, ReadBytesExt};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::message::{Envelope, Field, Message};
use crate::mutf8;
use crate::prefix::{FieldPrefix, VarWidth};
use crate::registry::TypeRegistry;
use crate::taxonomy::{Taxonomy, TaxonomyResolver};
use crate::types::{type_id, WireKind};
use crate::value::Value;
use crate::ENVELOPE_HEADER_SIZE;

/// One structural step of a decode.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeEvent {
    /// The 8-byte envelope header. `size` is the declared total length,
    /// header included.
    Envelope {
        directives: u8,
        version: u8,
        taxonomy_id: i16,
        size: u32,
    },
    /// A field whose value is complete.
    Field(Field),
    /// A sub-message field opened; its fields follow as further events.
    SubMessageStart {
        name: Option<String>,
        ordinal: Option<i16>,
    },
    /// The matching close for the most recent unmatched
    /// [`SubMessageStart`](DecodeEvent::SubMessageStart).
    SubMessageEnd,
}

// Bookkeeping for one open message. `consumed` is u64 so malformed declared
// sizes can overshoot without wrapping.
#[derive(Clone, Copy, Debug)]
struct Frame {
    declared: u32,
    consumed: u64,
}

/// Pull-parser over one encoded envelope.
///
/// Holds mutable per-message state and must not be shared across concurrent
/// decodes; [`reset`](Decoder::reset) reuses the allocation for the next
/// stream. After any error the decoder is fused and must be reset or
/// discarded.
pub struct Decoder<'a> {
    data: &'a [u8],
    registry: &'a TypeRegistry,
    resolver: Option<&'a dyn TaxonomyResolver>,
    taxonomy: Option<&'a Taxonomy>,
    stack: SmallVec<[Frame; 8]>,
    errored: bool,
    done: bool,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8], registry: &'a TypeRegistry) -> Self {
        Self {
            data,
            registry,
            resolver: None,
            taxonomy: None,
            stack: SmallVec::new(),
            errored: false,
            done: false,
        }
    }

    /// A decoder that resolves elided field names through `resolver`, queried
    /// once per envelope with the header's taxonomy id.
    pub fn with_resolver(
        data: &'a [u8],
        registry: &'a TypeRegistry,
        resolver: &'a dyn TaxonomyResolver,
    ) -> Self {
        Self {
            resolver: Some(resolver),
            ..Self::new(data, registry)
        }
    }

    /// Point the decoder at a new stream, discarding all per-message state.
    pub fn reset(&mut self, data: &'a [u8]) {
        self.data = data;
        self.taxonomy = None;
        self.stack.clear();
        self.errored = false;
        self.done = false;
    }

    /// True while the envelope has events left: the header itself, unconsumed
    /// root bytes, or any open sub-message awaiting its end event.
    pub fn has_next(&self) -> bool {
        if self.errored || self.done {
            return false;
        }
        match self.stack.len() {
            0 => true,
            1 => self.stack[0].consumed < self.stack[0].declared as u64,
            _ => true,
        }
    }

    /// Produce the next structural event.
    pub fn next(&mut self) -> Result<DecodeEvent> {
        if self.errored {
            return Err(Error::BadEncode(
                "decode continued after a failure".to_string(),
            ));
        }
        if !self.has_next() {
            self.errored = true;
            return Err(Error::BadEncode(
                "decode continued past end of envelope".to_string(),
            ));
        }
        match self.step() {
            Ok(event) => {
                self.update_done();
                Ok(event)
            }
            Err(e) => {
                self.errored = true;
                Err(e)
            }
        }
    }

    /// Verify the envelope closed cleanly: declared sizes all matched and no
    /// sub-message frame was left open.
    pub fn finish(self) -> Result<()> {
        if self.errored {
            return Err(Error::BadEncode("decoder previously failed".to_string()));
        }
        if let Some(frame) = self.stack.get(1) {
            return Err(Error::FrameSizeMismatch {
                declared: frame.declared,
                consumed: frame.consumed,
            });
        }
        if !self.done {
            return Err(Error::BadEncode(
                "envelope not fully decoded".to_string(),
            ));
        }
        Ok(())
    }

    /// Input bytes past the decoded envelope, for callers decoding several
    /// envelopes off one buffer. Meaningful once `has_next` is false.
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    fn update_done(&mut self) {
        if self.stack.len() == 1 && self.stack[0].consumed >= self.stack[0].declared as u64 {
            self.done = true;
        }
    }

    fn step(&mut self) -> Result<DecodeEvent> {
        if self.stack.is_empty() {
            return self.read_envelope();
        }

        // Close any sub-message whose declared size has been consumed.
        if self.stack.len() > 1 {
            let top = self.stack[self.stack.len() - 1];
            if top.consumed >= top.declared as u64 {
                if top.consumed > top.declared as u64 {
                    return Err(Error::FrameSizeMismatch {
                        declared: top.declared,
                        consumed: top.consumed,
                    });
                }
                self.stack.pop();
                let Some(parent) = self.stack.last_mut() else {
                    return Err(Error::BadEncode("no open frame".to_string()));
                };
                // A closed sub-message counts against its parent once, prefix
                // through payload, exactly as a simple field would.
                parent.consumed += top.consumed;
                if parent.consumed > parent.declared as u64 {
                    return Err(Error::FrameSizeMismatch {
                        declared: parent.declared,
                        consumed: parent.consumed,
                    });
                }
                return Ok(DecodeEvent::SubMessageEnd);
            }
        }

        self.consume_field()
    }

    fn read_envelope(&mut self) -> Result<DecodeEvent> {
        let directives = read_u8(&mut self.data, "envelope directives")?;
        let version = read_u8(&mut self.data, "envelope schema version")?;
        let taxonomy_id = read_i16(&mut self.data, "envelope taxonomy id")?;
        let size = read_u32(&mut self.data, "envelope size")?;
        if (size as usize) < ENVELOPE_HEADER_SIZE {
            return Err(Error::BadEncode(format!(
                "envelope size {} is smaller than its own header",
                size
            )));
        }
        if let Some(resolver) = self.resolver {
            self.taxonomy = resolver.resolve(taxonomy_id);
        }
        self.stack.push(Frame {
            declared: size,
            consumed: ENVELOPE_HEADER_SIZE as u64,
        });
        Ok(DecodeEvent::Envelope {
            directives,
            version,
            taxonomy_id,
            size,
        })
    }

    fn consume_field(&mut self) -> Result<DecodeEvent> {
        let before = self.data.len();
        let prefix = FieldPrefix::from_u8(read_u8(&mut self.data, "field prefix")?);
        let ty_id = read_u8(&mut self.data, "field type id")?;
        let ordinal = if prefix.has_ordinal {
            Some(read_i16(&mut self.data, "field ordinal")?)
        } else {
            None
        };
        let name = if prefix.has_name {
            let len = read_u8(&mut self.data, "field name length")? as usize;
            let raw = take(&mut self.data, len, "field name")?;
            Some(mutf8::decode(raw)?)
        } else {
            // No explicit name: recover one from the envelope's taxonomy if
            // the ordinal maps. A miss is not an error.
            ordinal
                .and_then(|o| self.taxonomy.and_then(|t| t.name_of(o)))
                .map(str::to_string)
        };

        let (kind, fixed_size) = self.resolve_type(ty_id, prefix)?;

        let size = if prefix.fixed_width {
            fixed_size.ok_or_else(|| {
                Error::BadEncode(format!(
                    "type {} is variable-width but prefix declares fixed",
                    ty_id
                ))
            })? as usize
        } else {
            match prefix.var_width {
                VarWidth::Zero => 0,
                VarWidth::One => read_u8(&mut self.data, "field size")? as usize,
                VarWidth::Two => read_u16(&mut self.data, "field size")? as usize,
                VarWidth::Four => read_u32(&mut self.data, "field size")? as usize,
            }
        };

        // Everything up to the payload counts against the open frame before
        // the payload is read.
        let header = (before - self.data.len()) as u64;
        let Some(frame) = self.stack.last_mut() else {
            return Err(Error::BadEncode("no open frame".to_string()));
        };
        frame.consumed += header;
        if frame.consumed > frame.declared as u64 {
            return Err(Error::FrameSizeMismatch {
                declared: frame.declared,
                consumed: frame.consumed,
            });
        }

        if kind == WireKind::Message {
            self.stack.push(Frame {
                declared: size as u32,
                consumed: 0,
            });
            return Ok(DecodeEvent::SubMessageStart { name, ordinal });
        }

        let raw = take(&mut self.data, size, "field payload")?;
        let value = parse_payload(kind, ty_id, raw)?;
        let Some(frame) = self.stack.last_mut() else {
            return Err(Error::BadEncode("no open frame".to_string()));
        };
        frame.consumed += size as u64;
        if frame.consumed > frame.declared as u64 {
            return Err(Error::FrameSizeMismatch {
                declared: frame.declared,
                consumed: frame.consumed,
            });
        }
        Ok(DecodeEvent::Field(Field::from_wire(
            name, ordinal, ty_id, value,
        )))
    }

    // Type resolution with the scalar fast path: the seven primitive scalars
    // skip registry dispatch entirely.
    fn resolve_type(&self, ty_id: u8, prefix: FieldPrefix) -> Result<(WireKind, Option<u32>)> {
        if let Some(scalar) = scalar_type(ty_id) {
            return Ok(scalar);
        }
        match self.registry.by_id(ty_id) {
            Some(ty) => Ok((ty.kind(), ty.fixed_size())),
            // A fixed-width unknown cannot be sized, so the stream cannot be
            // skipped past it; a variable-width unknown degrades to an
            // opaque blob.
            None if prefix.fixed_width => Err(Error::UnknownFixedType(ty_id)),
            None => {
                self.registry.unknown_type(ty_id);
                Ok((WireKind::Unknown, None))
            }
        }
    }
}

fn scalar_type(ty_id: u8) -> Option<(WireKind, Option<u32>)> {
    match ty_id {
        type_id::BOOLEAN => Some((WireKind::Bool, Some(1))),
        type_id::BYTE => Some((WireKind::I8, Some(1))),
        type_id::SHORT => Some((WireKind::I16, Some(2))),
        type_id::INT => Some((WireKind::I32, Some(4))),
        type_id::LONG => Some((WireKind::I64, Some(8))),
        type_id::FLOAT => Some((WireKind::F32, Some(4))),
        type_id::DOUBLE => Some((WireKind::F64, Some(8))),
        _ => None,
    }
}

fn check_len(raw: &[u8], expected: usize, ty_id: u8) -> Result<()> {
    if raw.len() != expected {
        return Err(Error::BadEncode(format!(
            "type {} payload must be {} bytes, got {}",
            ty_id,
            expected,
            raw.len()
        )));
    }
    Ok(())
}

fn parse_payload(kind: WireKind, ty_id: u8, mut raw: &[u8]) -> Result<Value> {
    Ok(match kind {
        WireKind::Indicator => {
            check_len(raw, 0, ty_id)?;
            Value::Indicator
        }
        WireKind::Bool => {
            check_len(raw, 1, ty_id)?;
            Value::Bool(raw[0] != 0)
        }
        WireKind::I8 => {
            check_len(raw, 1, ty_id)?;
            Value::I8(raw[0] as i8)
        }
        WireKind::I16 => {
            check_len(raw, 2, ty_id)?;
            Value::I16(raw.read_i16::<BigEndian>()?)
        }
        WireKind::I32 => {
            check_len(raw, 4, ty_id)?;
            Value::I32(raw.read_i32::<BigEndian>()?)
        }
        WireKind::I64 => {
            check_len(raw, 8, ty_id)?;
            Value::I64(raw.read_i64::<BigEndian>()?)
        }
        WireKind::F32 => {
            check_len(raw, 4, ty_id)?;
            Value::F32(raw.read_f32::<BigEndian>()?)
        }
        WireKind::F64 => {
            check_len(raw, 8, ty_id)?;
            Value::F64(raw.read_f64::<BigEndian>()?)
        }
        WireKind::Bytes => Value::Bytes(raw.to_vec()),
        WireKind::I16Array => {
            let mut v = Vec::with_capacity(array_count(raw, 2, ty_id)?);
            while !raw.is_empty() {
                v.push(raw.read_i16::<BigEndian>()?);
            }
            Value::I16Array(v)
        }
        WireKind::I32Array => {
            let mut v = Vec::with_capacity(array_count(raw, 4, ty_id)?);
            while !raw.is_empty() {
                v.push(raw.read_i32::<BigEndian>()?);
            }
            Value::I32Array(v)
        }
        WireKind::I64Array => {
            let mut v = Vec::with_capacity(array_count(raw, 8, ty_id)?);
            while !raw.is_empty() {
                v.push(raw.read_i64::<BigEndian>()?);
            }
            Value::I64Array(v)
        }
        WireKind::F32Array => {
            let mut v = Vec::with_capacity(array_count(raw, 4, ty_id)?);
            while !raw.is_empty() {
                v.push(raw.read_f32::<BigEndian>()?);
            }
            Value::F32Array(v)
        }
        WireKind::F64Array => {
            let mut v = Vec::with_capacity(array_count(raw, 8, ty_id)?);
            while !raw.is_empty() {
                v.push(raw.read_f64::<BigEndian>()?);
            }
            Value::F64Array(v)
        }
        WireKind::Str => Value::Str(mutf8::decode(raw)?),
        WireKind::Message => {
            // Sub-messages open a frame instead of parsing a payload.
            return Err(Error::BadEncode(
                "sub-message type cannot be parsed as a payload".to_string(),
            ));
        }
        WireKind::Unknown => Value::Unknown {
            type_id: ty_id,
            bytes: raw.to_vec(),
        },
    })
}

// Element count of an array payload, rejecting sizes that split an element.
fn array_count(raw: &[u8], width: usize, ty_id: u8) -> Result<usize> {
    if raw.len() % width != 0 {
        return Err(Error::BadArrayLength {
            type_id: ty_id,
            len: raw.len(),
        });
    }
    Ok(raw.len() / width)
}

/// Decode one complete envelope into the in-memory message model.
pub fn decode_envelope(
    data: &[u8],
    registry: &TypeRegistry,
    resolver: Option<&dyn TaxonomyResolver>,
) -> Result<Envelope> {
    let mut decoder = match resolver {
        Some(r) => Decoder::with_resolver(data, registry, r),
        None => Decoder::new(data, registry),
    };
    let (directives, version, taxonomy_id) = match decoder.next()? {
        DecodeEvent::Envelope {
            directives,
            version,
            taxonomy_id,
            ..
        } => (directives, version, taxonomy_id),
        _ => {
            return Err(Error::BadEncode(
                "first decode event was not an envelope".to_string(),
            ))
        }
    };

    // One entry per open message, with the name/ordinal its field carried.
    let mut open: Vec<(Option<String>, Option<i16>, Message)> = vec![(None, None, Message::new())];
    while decoder.has_next() {
        match decoder.next()? {
            DecodeEvent::Field(field) => {
                let Some((_, _, msg)) = open.last_mut() else {
                    return Err(Error::BadEncode("message stack underflow".to_string()));
                };
                msg.push(field);
            }
            DecodeEvent::SubMessageStart { name, ordinal } => {
                open.push((name, ordinal, Message::new()));
            }
            DecodeEvent::SubMessageEnd => {
                let Some((name, ordinal, msg)) = open.pop() else {
                    return Err(Error::BadEncode("message stack underflow".to_string()));
                };
                let Some((_, _, parent)) = open.last_mut() else {
                    return Err(Error::BadEncode("message stack underflow".to_string()));
                };
                parent.push(Field::from_wire(
                    name,
                    ordinal,
                    type_id::MESSAGE,
                    Value::Message(msg),
                ));
            }
            DecodeEvent::Envelope { .. } => {
                return Err(Error::BadEncode(
                    "nested envelope header inside a message".to_string(),
                ))
            }
        }
    }
    decoder.finish()?;
    let Some((_, _, message)) = open.pop() else {
        return Err(Error::BadEncode("message stack underflow".to_string()));
    };
    if !open.is_empty() {
        return Err(Error::BadEncode(
            "sub-message left open at end of envelope".to_string(),
        ));
    }
    Ok(Envelope {
        directives,
        version,
        taxonomy_id,
        message,
    })
}

fn read_u8(data: &mut &[u8], step: &'static str) -> Result<u8> {
    let actual = data.len();
    data.read_u8().map_err(|_| Error::LengthTooShort {
        step,
        actual,
        expected: 1,
    })
}

fn read_u16(data: &mut &[u8], step: &'static str) -> Result<u16> {
    let actual = data.len();
    data.read_u16::<BigEndian>()
        .map_err(|_| Error::LengthTooShort {
            step,
            actual,
            expected: 2,
        })
}

fn read_i16(data: &mut &[u8], step: &'static str) -> Result<i16> {
    let actual = data.len();
    data.read_i16::<BigEndian>()
        .map_err(|_| Error::LengthTooShort {
            step,
            actual,
            expected: 2,
        })
}

fn read_u32(data: &mut &[u8], step: &'static str) -> Result<u32> {
    let actual = data.len();
    data.read_u32::<BigEndian>()
        .map_err(|_| Error::LengthTooShort {
            step,
            actual,
            expected: 4,
        })
}

fn take<'a>(data: &mut &'a [u8], len: usize, step: &'static str) -> Result<&'a [u8]> {
    if len > data.len() {
        return Err(Error::LengthTooShort {
            step,
            actual: data.len(),
            expected: len,
        });
    }
    let (head, tail) = data.split_at(len);
    *data = tail;
    Ok(head)
}
