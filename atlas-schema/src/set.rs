//! Insertion-ordered string sets used for column bookkeeping.

use indexmap::IndexSet;

/// A set of names that iterates in first-insertion order.
///
/// Column lists compiled from a `Set` are therefore stable across runs,
/// which keeps generated SQL and its positional values deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Set {
    items: IndexSet<String>,
}

impl Set {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single name. Returns `false` if it was already present.
    pub fn add(&mut self, item: impl Into<String>) -> bool {
        self.items.insert(item.into())
    }

    /// Add every name from an iterator.
    pub fn add_all<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into));
    }

    /// Remove a name, preserving the order of the rest.
    pub fn remove(&mut self, item: &str) -> bool {
        self.items.shift_remove(item)
    }

    /// Check membership.
    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    /// The names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.items.iter().cloned().collect()
    }

    /// Iterate over the names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Names in `self` followed by names only in `other`.
    pub fn union(&self, other: &Set) -> Set {
        let mut items = self.items.clone();
        items.extend(other.items.iter().cloned());
        Set { items }
    }

    /// Names in `self` that are not in `other`.
    pub fn difference(&self, other: &Set) -> Set {
        Set {
            items: self.items.difference(&other.items).cloned().collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Set {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Set::new();
        set.add_all(iter);
        set
    }
}

impl<'a> IntoIterator for &'a Set {
    type Item = &'a String;
    type IntoIter = indexmap::set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_keeps_first_insertion_order() {
        let mut set = Set::new();
        assert!(set.add("b"));
        assert!(set.add("a"));
        assert!(!set.add("b"));
        assert_eq!(set.keys(), vec!["b", "a"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_union_and_difference() {
        let left: Set = ["a", "b", "c"].into_iter().collect();
        let right: Set = ["c", "d"].into_iter().collect();

        assert_eq!(left.union(&right).keys(), vec!["a", "b", "c", "d"]);
        assert_eq!(left.difference(&right).keys(), vec!["a", "b"]);
        assert!(right.difference(&right).is_empty());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut set: Set = ["x", "y", "z"].into_iter().collect();
        assert!(set.remove("y"));
        assert!(!set.remove("missing"));
        assert!(!set.contains("y"));
        assert_eq!(set.keys(), vec!["x", "z"]);
    }
}
