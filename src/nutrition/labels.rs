//! Insertion-ordered label sets
//!
//! Vitamins and minerals arrive as comma-separated strings or lists. They are
//! kept as a duplicate-free set that remembers first-seen order, so the
//! rendered string is deterministic.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Separator used when rendering a label set for display
pub const LABEL_SEPARATOR: &str = ", ";

/// Duplicate-free labels in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list, trimming and dropping empty pieces
    pub fn parse(text: &str) -> Self {
        let mut set = Self::new();
        for piece in text.split(',') {
            set.insert(piece);
        }
        set
    }

    /// Insert a label after trimming. Returns false for blanks and repeats.
    pub fn insert(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.contains(label) {
            return false;
        }
        self.seen.insert(label.to_string());
        self.order.push(label.to_string());
        true
    }

    /// Union in place, keeping existing order and appending new labels
    pub fn extend_from(&mut self, other: &LabelSet) {
        for label in &other.order {
            self.insert(label);
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.seen.contains(label.trim())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Render as `"A, C, D"`; empty set renders as `""`
    pub fn joined(&self) -> String {
        self.order.join(LABEL_SEPARATOR)
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl<'a> FromIterator<&'a str> for LabelSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = Self::new();
        for label in iter {
            set.insert(label);
        }
        set
    }
}

impl Serialize for LabelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.joined())
    }
}

impl<'de> Deserialize<'de> for LabelSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_drops_blanks() {
        let set = LabelSet::parse(" C,  Fiber ,, ,B1");
        assert_eq!(set.joined(), "C, Fiber, B1");
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut set = LabelSet::parse("A, C");
        assert!(!set.insert("C"));
        assert!(!set.insert("  A "));
        assert!(set.insert("D"));
        assert_eq!(set.to_string(), "A, C, D");
    }

    #[test]
    fn test_union_preserves_first_seen_order() {
        let mut left = LabelSet::parse("A, C");
        left.extend_from(&LabelSet::parse("C, D, A"));
        assert_eq!(left.joined(), "A, C, D");
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let set = LabelSet::parse("Iron, iron");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_serializes_as_joined_string() {
        let set: LabelSet = ["Calcium", "Iron"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "\"Calcium, Iron\"");
        let back: LabelSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_empty_set_renders_empty_string() {
        assert_eq!(LabelSet::new().joined(), "");
    }
}
