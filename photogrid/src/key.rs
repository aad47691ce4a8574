//! Grid position keys.
//!
//! A [`PositionKey`] identifies one slot of the photo grid. It is the key of
//! the in-flight table, so it must stay stable for the lifetime of the record
//! it names: it is tied to list position, never to content.

use std::fmt;

/// Identifier for a grid slot: a (section, item) pair.
///
/// Ordering is lexicographic (section first), which gives deterministic
/// iteration when keys are collected and sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionKey {
    /// Section index (the grid has a single section in practice)
    pub section: u32,
    /// Item index within the section
    pub item: u32,
}

impl PositionKey {
    /// Creates a key from a section and item index.
    pub const fn new(section: u32, item: u32) -> Self {
        Self { section, item }
    }

    /// Creates a key for an item in section 0.
    pub const fn item(item: u32) -> Self {
        Self::new(0, item)
    }

    /// Returns the item index as a `usize` for indexing into record lists.
    pub fn index(&self) -> usize {
        self.item as usize
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.section, self.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ordering_is_section_then_item() {
        let mut keys = vec![
            PositionKey::new(1, 0),
            PositionKey::new(0, 5),
            PositionKey::new(0, 1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                PositionKey::new(0, 1),
                PositionKey::new(0, 5),
                PositionKey::new(1, 0)
            ]
        );
    }

    #[test]
    fn test_equal_keys_hash_equal() {
        let mut set = HashSet::new();
        set.insert(PositionKey::new(3, 0));
        assert!(!set.insert(PositionKey::new(3, 0)));
        assert!(set.insert(PositionKey::new(0, 3)));
    }

    #[test]
    fn test_item_constructor_uses_section_zero() {
        let key = PositionKey::item(42);
        assert_eq!(key.section, 0);
        assert_eq!(key.index(), 42);
    }

    #[test]
    fn test_display() {
        assert_eq!(PositionKey::new(1, 0).to_string(), "(1, 0)");
    }
}
