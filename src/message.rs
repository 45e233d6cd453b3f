//! The in-memory message model.
//!
//! A [`Message`] is an ordered list of [`Field`]s. Fields may repeat names
//! and ordinals freely; insertion order is preserved and is part of a
//! message's identity. A field's value may itself be a nested message, owned
//! exclusively by its parent field.

use crate::value::Value;

/// One field: optional name, optional 16-bit ordinal, wire type id, value.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    name: Option<String>,
    ordinal: Option<i16>,
    type_id: u8,
    value: Value,
}

impl Field {
    /// Build a field, selecting the wire type id from the value's shape.
    pub fn new(name: Option<String>, ordinal: Option<i16>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let type_id = value.natural_type_id();
        Self {
            name,
            ordinal,
            type_id,
            value,
        }
    }

    /// A field decoded off the wire, keeping the type id it arrived under.
    pub(crate) fn from_wire(
        name: Option<String>,
        ordinal: Option<i16>,
        type_id: u8,
        value: Value,
    ) -> Self {
        Self {
            name,
            ordinal,
            type_id,
            value,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ordinal(&self) -> Option<i16> {
        self.ordinal
    }

    pub fn type_id(&self) -> u8 {
        self.type_id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

/// An ordered sequence of fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    fields: Vec<Field>,
}

impl Message {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Append an anonymous field.
    pub fn add(&mut self, value: impl Into<Value>) {
        self.push(Field::new(None, None, value));
    }

    pub fn add_by_name(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.push(Field::new(Some(name.into()), None, value));
    }

    pub fn add_by_ordinal(&mut self, ordinal: i16, value: impl Into<Value>) {
        self.push(Field::new(None, Some(ordinal), value));
    }

    pub fn add_full(
        &mut self,
        name: impl Into<String>,
        ordinal: i16,
        value: impl Into<Value>,
    ) {
        self.push(Field::new(Some(name.into()), Some(ordinal), value));
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// First field carrying `name`. Later duplicates are reachable through
    /// [`iter`](Self::iter).
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == Some(name))
    }

    /// First field carrying `ordinal`.
    pub fn field_by_ordinal(&self, ordinal: i16) -> Option<&Field> {
        self.fields.iter().find(|f| f.ordinal() == Some(ordinal))
    }
}

impl IntoIterator for Message {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<Field> for Message {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// The outer wrapper of one encoded unit: two header bytes passed through
/// unopinionated, the taxonomy id used for name resolution, and the
/// top-level message. The on-wire size field is computed at encode time and
/// validated at decode time rather than stored here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Envelope {
    pub directives: u8,
    pub version: u8,
    pub taxonomy_id: i16,
    pub message: Message,
}

impl Envelope {
    pub fn new(message: Message) -> Self {
        Self {
            directives: 0,
            version: 0,
            taxonomy_id: 0,
            message,
        }
    }

    pub fn with_taxonomy(message: Message, taxonomy_id: i16) -> Self {
        Self {
            directives: 0,
            version: 0,
            taxonomy_id,
            message,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::type_id;

    #[test]
    fn insertion_order_and_duplicates() {
        let mut msg = Message::new();
        msg.add_by_name("x", 1i32);
        msg.add_by_name("x", 2i32);
        msg.add_by_ordinal(7, 3i32);
        msg.add_by_ordinal(7, "dup");
        assert_eq!(msg.len(), 4);
        assert_eq!(msg.field_by_name("x").unwrap().value().as_i32(), Some(1));
        assert_eq!(msg.field_by_ordinal(7).unwrap().value().as_i32(), Some(3));
        let values: Vec<_> = msg.iter().map(|f| f.value().clone()).collect();
        assert_eq!(values[1].as_i32(), Some(2));
        assert_eq!(values[3].as_str(), Some("dup"));
    }

    #[test]
    fn type_id_tracks_value_shape() {
        let f = Field::new(None, None, vec![0u8; 20]);
        assert_eq!(f.type_id(), type_id::BYTE_ARRAY_20);
        let f = Field::new(None, None, vec![0u8; 21]);
        assert_eq!(f.type_id(), type_id::BYTE_ARRAY);
        let f = Field::new(None, None, 1i64);
        assert_eq!(f.type_id(), type_id::LONG);
    }

    #[test]
    fn nested_message_ownership() {
        let mut inner = Message::new();
        inner.add_by_name("a", true);
        let mut outer = Message::new();
        outer.add_by_name("sub", inner.clone());
        let got = outer
            .field_by_name("sub")
            .and_then(|f| f.value().as_message())
            .unwrap();
        assert_eq!(*got, inner);
    }
}
