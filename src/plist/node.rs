use chrono::{DateTime, Utc};

/// A decoded property-list value.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestNode {
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Data(Vec<u8>),
    Array(Vec<ManifestNode>),
    Dictionary(Dictionary),
}

impl ManifestNode {
    pub fn kind(&self) -> &'static str {
        match self {
            ManifestNode::String(_) => "string",
            ManifestNode::Integer(_) => "integer",
            ManifestNode::Real(_) => "real",
            ManifestNode::Boolean(_) => "boolean",
            ManifestNode::Date(_) => "date",
            ManifestNode::Data(_) => "data",
            ManifestNode::Array(_) => "array",
            ManifestNode::Dictionary(_) => "dictionary",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ManifestNode::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            ManifestNode::Dictionary(d) => Some(d),
            _ => None,
        }
    }
}

/// String-keyed mapping that remembers the order keys were first seen.
///
/// Keys are unique: inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: Vec<(String, ManifestNode)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: String, value: ManifestNode) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ManifestNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// String value under `key`, if present and actually a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ManifestNode::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ManifestNode)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (String, ManifestNode)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}
