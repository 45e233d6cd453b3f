//! The open field type registry.
//!
//! Maps one-byte type ids to [`FieldType`] descriptors and native value
//! shapes to the best-fitting descriptor for encoding. Lookups vastly
//! outnumber registrations, so the table sits behind a read/write lock with
//! insert-if-absent semantics: the first writer wins and readers only ever
//! observe complete entries.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::types::{type_id, FieldType, WireKind, FIXED_BYTE_ARRAYS};
use crate::value::Value;

static GLOBAL: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

pub struct TypeRegistry {
    types: RwLock<HashMap<u8, Arc<FieldType>>>,
}

impl TypeRegistry {
    /// A registry populated with the built-in primitive, array, string,
    /// sub-message, and indicator descriptors.
    pub fn new() -> Self {
        let mut types = HashMap::new();
        let builtin = [
            FieldType::fixed(type_id::INDICATOR, 0, WireKind::Indicator),
            FieldType::fixed(type_id::BOOLEAN, 1, WireKind::Bool),
            FieldType::fixed(type_id::BYTE, 1, WireKind::I8),
            FieldType::fixed(type_id::SHORT, 2, WireKind::I16),
            FieldType::fixed(type_id::INT, 4, WireKind::I32),
            FieldType::fixed(type_id::LONG, 8, WireKind::I64),
            FieldType::fixed(type_id::FLOAT, 4, WireKind::F32),
            FieldType::fixed(type_id::DOUBLE, 8, WireKind::F64),
            FieldType::variable(type_id::BYTE_ARRAY, WireKind::Bytes),
            FieldType::variable(type_id::SHORT_ARRAY, WireKind::I16Array),
            FieldType::variable(type_id::INT_ARRAY, WireKind::I32Array),
            FieldType::variable(type_id::LONG_ARRAY, WireKind::I64Array),
            FieldType::variable(type_id::FLOAT_ARRAY, WireKind::F32Array),
            FieldType::variable(type_id::DOUBLE_ARRAY, WireKind::F64Array),
            FieldType::variable(type_id::STRING, WireKind::Str),
            FieldType::variable(type_id::MESSAGE, WireKind::Message),
        ];
        for ty in builtin {
            types.insert(ty.type_id(), Arc::new(ty));
        }
        for (id, len) in FIXED_BYTE_ARRAYS {
            types.insert(id, Arc::new(FieldType::fixed(id, len, WireKind::Bytes)));
        }
        Self {
            types: RwLock::new(types),
        }
    }

    /// The process-wide registry with the built-in types, shared by encode
    /// and decode paths that don't carry their own.
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    pub fn by_id(&self, type_id: u8) -> Option<Arc<FieldType>> {
        self.types.read().get(&type_id).cloned()
    }

    /// Register an additional descriptor. Re-registering an identical
    /// descriptor is a no-op; a conflicting one is rejected.
    pub fn register(&self, ty: FieldType) -> Result<()> {
        let mut types = self.types.write();
        match types.get(&ty.type_id()) {
            Some(existing) if **existing == ty => Ok(()),
            Some(_) => Err(Error::DuplicateType(ty.type_id())),
            None => {
                types.insert(ty.type_id(), Arc::new(ty));
                Ok(())
            }
        }
    }

    /// The memoized opaque descriptor for a type id with no registered
    /// meaning. Safe under concurrent first use: both racers end up holding
    /// the same entry.
    pub fn unknown_type(&self, type_id: u8) -> Arc<FieldType> {
        if let Some(ty) = self.by_id(type_id) {
            return ty;
        }
        let mut types = self.types.write();
        types
            .entry(type_id)
            .or_insert_with(|| Arc::new(FieldType::variable(type_id, WireKind::Unknown)))
            .clone()
    }

    /// The most specific descriptor for a native value's shape: exact
    /// fixed-length byte array variants before the generic variable-length
    /// one, and the memoized opaque descriptor for unknown values.
    pub fn best_match(&self, value: &Value) -> Arc<FieldType> {
        let id = value.natural_type_id();
        match self.by_id(id) {
            Some(ty) => ty,
            None => self.unknown_type(id),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
