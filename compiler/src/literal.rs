use indexmap::IndexSet;
use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Per-class pool of interned strings: selectors, string constants,
/// global names and debug file names.
///
/// A string's index is the position at which it was first interned.
#[derive(Debug, Clone, Default)]
pub struct LiteralTable {
    strings: IndexSet<String>,
}

impl LiteralTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `s`, appending it if it is not in the table yet.
    pub fn intern(&mut self, s: &str) -> usize {
        match self.strings.get_index_of(s) {
            Some(index) => index,
            None => self.strings.insert_full(s.to_owned()).0,
        }
    }

    pub fn index_of(&self, s: &str) -> Option<usize> {
        self.strings.get_index_of(s)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get_index(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.strings.iter().map(String::as_str)
    }
}

/// Tables are equal when they hold the same strings at the same indices.
impl PartialEq for LiteralTable {
    fn eq(&self, other: &Self) -> bool {
        self.strings.iter().eq(other.strings.iter())
    }
}

impl Eq for LiteralTable {}

impl Serialize for LiteralTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for s in &self.strings {
            seq.serialize_element(s)?;
        }
        seq.end()
    }
}
