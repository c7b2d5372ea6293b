use std::collections::HashSet;
use std::hash::Hash;

/// Insertion-ordered set: a sequence plus a membership index.
///
/// Used to flatten per-descriptor lists into one distinct list while keeping
/// the first-seen position of every element.
#[derive(Clone, Debug)]
pub struct OrderedSet<T> {
    items: Vec<T>,
    seen: HashSet<T>,
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` unless already present. Returns true if it was appended.
    pub fn insert(&mut self, item: T) -> bool {
        if self.seen.contains(&item) {
            return false;
        }
        self.seen.insert(item.clone());
        self.items.push(item);
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.seen.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Eq + Hash + Clone> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        set.extend(iter);
        set
    }
}
