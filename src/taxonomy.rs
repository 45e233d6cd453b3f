//! Ordinal/name substitution.
//!
//! A taxonomy is an immutable bidirectional mapping between small field
//! ordinals and field names, selected per envelope through its taxonomy id.
//! The encoder uses it to elide names the receiver can reconstruct; the
//! decoder uses it to restore them. Both directions are pure lookups.

use std::collections::HashMap;

/// Immutable ordinal↔name mapping.
#[derive(Clone, Debug, Default)]
pub struct Taxonomy {
    by_ordinal: HashMap<i16, String>,
    by_name: HashMap<String, i16>,
}

impl Taxonomy {
    /// Build from `(ordinal, name)` pairs. A repeated ordinal or name keeps
    /// the last pair.
    pub fn from_pairs<S, I>(pairs: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (i16, S)>,
    {
        let mut by_ordinal = HashMap::new();
        let mut by_name = HashMap::new();
        for (ordinal, name) in pairs {
            let name = name.into();
            by_name.insert(name.clone(), ordinal);
            by_ordinal.insert(ordinal, name);
        }
        Self {
            by_ordinal,
            by_name,
        }
    }

    pub fn name_of(&self, ordinal: i16) -> Option<&str> {
        self.by_ordinal.get(&ordinal).map(String::as_str)
    }

    pub fn ordinal_of(&self, name: &str) -> Option<i16> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_ordinal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ordinal.is_empty()
    }
}

/// Selects a taxonomy by id at envelope-decode time. Returning `None` for an
/// unknown id is not an error; names simply stay unresolved.
pub trait TaxonomyResolver {
    fn resolve(&self, taxonomy_id: i16) -> Option<&Taxonomy>;
}

/// The common case: a fixed id→taxonomy table built once at startup.
#[derive(Clone, Debug, Default)]
pub struct MapResolver {
    taxonomies: HashMap<i16, Taxonomy>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, taxonomy_id: i16, taxonomy: Taxonomy) {
        self.taxonomies.insert(taxonomy_id, taxonomy);
    }
}

impl TaxonomyResolver for MapResolver {
    fn resolve(&self, taxonomy_id: i16) -> Option<&Taxonomy> {
        self.taxonomies.get(&taxonomy_id)
    }
}

impl FromIterator<(i16, Taxonomy)> for MapResolver {
    fn from_iter<T: IntoIterator<Item = (i16, Taxonomy)>>(iter: T) -> Self {
        Self {
            taxonomies: iter.into_iter().collect(),
        }
    }
}
