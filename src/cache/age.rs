//! Age Index Module
//!
//! Orders live keys by insertion so the oldest entry can be evicted without
//! scanning the whole map.

use std::collections::BTreeMap;

// == Age Index ==
/// Tracks keys by the generation they were inserted with.
///
/// Every put stamps the entry with a new, strictly increasing generation, so
/// the smallest generation is always the entry with the oldest `created_at`.
/// Reads never touch the index.
#[derive(Debug, Default)]
pub struct AgeIndex {
    /// generation -> key
    order: BTreeMap<u64, String>,
    /// Next generation to hand out
    next_generation: u64,
}

impl AgeIndex {
    // == Constructor ==
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Stamp ==
    /// Records `key` as the newest entry and returns its generation.
    ///
    /// `previous` is the generation of the entry being replaced, if any.
    pub fn stamp(&mut self, key: &str, previous: Option<u64>) -> u64 {
        if let Some(generation) = previous {
            self.order.remove(&generation);
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.order.insert(generation, key.to_string());
        generation
    }

    // == Remove ==
    /// Forgets a generation, returning the key it belonged to.
    pub fn remove(&mut self, generation: u64) -> Option<String> {
        self.order.remove(&generation)
    }

    // == Pop Oldest ==
    /// Removes and returns the oldest key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_first().map(|(_, key)| key)
    }

    // == Clear ==
    /// Drops every tracked key. Generations keep increasing.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_new() {
        let index = AgeIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_oldest_is_first_inserted() {
        let mut index = AgeIndex::new();
        index.stamp("a", None);
        index.stamp("b", None);
        index.stamp("c", None);

        assert_eq!(index.len(), 3);
        assert_eq!(index.pop_oldest(), Some("a".to_string()));
        assert_eq!(index.pop_oldest(), Some("b".to_string()));
    }

    #[test]
    fn test_restamp_moves_key_to_newest() {
        let mut index = AgeIndex::new();
        let a = index.stamp("a", None);
        index.stamp("b", None);

        // Re-putting "a" makes it the youngest
        index.stamp("a", Some(a));

        assert_eq!(index.len(), 2);
        assert_eq!(index.pop_oldest(), Some("b".to_string()));
        assert_eq!(index.pop_oldest(), Some("a".to_string()));
    }

    #[test]
    fn test_remove_generation() {
        let mut index = AgeIndex::new();
        let a = index.stamp("a", None);
        index.stamp("b", None);

        assert_eq!(index.remove(a), Some("a".to_string()));
        assert_eq!(index.remove(a), None);
        assert_eq!(index.pop_oldest(), Some("b".to_string()));
        assert!(index.is_empty());
    }

    #[test]
    fn test_generations_survive_clear() {
        let mut index = AgeIndex::new();
        let first = index.stamp("a", None);
        index.clear();
        let second = index.stamp("a", None);

        assert!(index.len() == 1);
        assert!(second > first);
    }

    #[test]
    fn test_pop_empty() {
        let mut index = AgeIndex::new();
        assert_eq!(index.pop_oldest(), None);
    }
}
